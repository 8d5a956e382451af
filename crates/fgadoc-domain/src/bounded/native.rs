//! Native structured form of an authorization model.
//!
//! Mirrors the JSON model shape, except that the two recursive grammars
//! (usersets and condition parameter types) are plain optional slots. A node
//! at [`MAX_RECURSION_DEPTH`] is empty, which is how a cut-off expression
//! looks. Empty nodes anywhere else are rejected by
//! [`check_native_model`](super::check_native_model).
//!
//! [`MAX_RECURSION_DEPTH`]: super::MAX_RECURSION_DEPTH

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ConditionMetadata, Metadata, ObjectRelation, TypeName, Wildcard};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeAuthorizationModel {
    pub schema_version: String,
    pub type_definitions: Vec<NativeTypeDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeMap<String, NativeCondition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeTypeDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<BTreeMap<String, NativeUserset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// A userset node with one optional slot per variant.
///
/// A well-formed node sets exactly one slot; an empty node stands for an
/// expression that was cut off at the depth bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeUserset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub this: Option<Wildcard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_userset: Option<ObjectRelation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuple_to_userset: Option<NativeTupleToUserset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub union: Option<NativeUsersets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersection: Option<NativeUsersets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<Box<NativeDifference>>,
}

impl NativeUserset {
    /// Whether no slot is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeTupleToUserset {
    pub tupleset: ObjectRelation,
    pub computed_userset: ObjectRelation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeUsersets {
    pub child: Vec<NativeUserset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeDifference {
    pub base: NativeUserset,
    pub subtract: NativeUserset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeCondition {
    pub name: String,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, NativeParamTypeRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConditionMetadata>,
}

/// A parameter type node. Empty (no `type_name`) only at the depth bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeParamTypeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<TypeName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_types: Option<Vec<NativeParamTypeRef>>,
}
