//! Core type definitions for the authorization model.
//!
//! These types mirror the OpenFGA JSON wire format field for field. Presence
//! is preserved as parsed (`None` versus an empty collection); collapsing the
//! two is the job of the canonical view, not of the model.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An authorization model defining types, their relations and conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationModel {
    /// Server-assigned identifier. Never part of the canonical document.
    #[serde(default)]
    pub id: Option<String>,
    /// Schema version (e.g., "1.1").
    #[serde(default)]
    pub schema_version: String,
    /// Type definitions in declaration order.
    #[serde(default)]
    pub type_definitions: Vec<TypeDefinition>,
    /// Named conditions usable in type restrictions.
    #[serde(default)]
    pub conditions: Option<HashMap<String, Condition>>,
}

impl AuthorizationModel {
    /// Creates an empty model with the given schema version.
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            ..Default::default()
        }
    }

    /// Looks up a type definition by name.
    pub fn type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|td| td.type_name == type_name)
    }
}

/// A type definition within the authorization model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDefinition {
    /// The type name (e.g., "document", "folder").
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Relations defined on this type, keyed by relation name.
    #[serde(default)]
    pub relations: Option<HashMap<String, Userset>>,
    /// Direct-assignment restrictions and provenance.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl TypeDefinition {
    /// Creates a type definition without relations.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// Returns the rewrite of `relation`, if defined.
    pub fn relation(&self, relation: &str) -> Option<&Userset> {
        self.relations.as_ref().and_then(|r| r.get(relation))
    }
}

/// Metadata attached to a type definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<HashMap<String, RelationMetadata>>,
    /// Module that declared the type (modular models only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
}

/// Metadata attached to a single relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationMetadata {
    /// User types that may be assigned to the relation directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directly_related_user_types: Option<Vec<RelationReference>>,
    /// Module that contributed the relation through `extend type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
}

/// A directly related user type, e.g. `user`, `user:*`, `group#member`
/// or `user with condition`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationReference {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<Wildcard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl RelationReference {
    /// A plain type reference (`user`).
    pub fn direct(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// A userset reference (`group#member`).
    pub fn userset(type_name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relation: Some(relation.into()),
            ..Default::default()
        }
    }

    /// A public wildcard reference (`user:*`).
    pub fn wildcard(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            wildcard: Some(Wildcard {}),
            ..Default::default()
        }
    }

    /// Attaches a condition (`... with condition`).
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

impl fmt::Display for RelationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        if self.wildcard.is_some() {
            write!(f, ":*")?;
        } else if let Some(relation) = self.relation.as_deref().filter(|r| !r.is_empty()) {
            write!(f, "#{relation}")?;
        }
        if let Some(condition) = self.condition.as_deref().filter(|c| !c.is_empty()) {
            write!(f, " with {condition}")?;
        }
        Ok(())
    }
}

/// Marker for a public wildcard (`{}` on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wildcard {}

/// Source file provenance for modular models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl SourceInfo {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
        }
    }
}

/// An `(object, relation)` pair referenced by computed usersets and
/// tuple-to-userset rewrites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectRelation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl ObjectRelation {
    /// Creates a reference to `relation` on the same object.
    pub fn relation(relation: impl Into<String>) -> Self {
        Self {
            object: None,
            relation: Some(relation.into()),
        }
    }

    /// The relation name, or `""` when unset.
    pub fn relation_name(&self) -> &str {
        self.relation.as_deref().unwrap_or_default()
    }
}

/// A userset defines how a relation is computed.
///
/// Exactly one variant is populated per node. On the wire each node is an
/// object with exactly one of the keys `this`, `computed_userset`,
/// `tuple_to_userset`, `union`, `intersection` or `difference`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "UsersetRepr")]
pub enum Userset {
    /// Direct assignment (this).
    This,
    /// Computed userset from another relation.
    ComputedUserset(ObjectRelation),
    /// Tuple to userset (relation from parent).
    TupleToUserset {
        tupleset: ObjectRelation,
        computed_userset: ObjectRelation,
    },
    /// Union of multiple usersets.
    Union { children: Vec<Userset> },
    /// Intersection of multiple usersets.
    Intersection { children: Vec<Userset> },
    /// Difference (base but not subtract).
    Difference {
        base: Box<Userset>,
        subtract: Box<Userset>,
    },
}

impl Userset {
    /// `relation` on the same object.
    pub fn computed(relation: impl Into<String>) -> Self {
        Self::ComputedUserset(ObjectRelation::relation(relation))
    }

    /// `computed from tupleset`.
    pub fn tuple_to_userset(tupleset: impl Into<String>, computed: impl Into<String>) -> Self {
        Self::TupleToUserset {
            tupleset: ObjectRelation::relation(tupleset),
            computed_userset: ObjectRelation::relation(computed),
        }
    }

    /// `base but not subtract`.
    pub fn difference(base: Userset, subtract: Userset) -> Self {
        Self::Difference {
            base: Box::new(base),
            subtract: Box::new(subtract),
        }
    }

    /// Number of levels in the expression tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::This | Self::ComputedUserset(_) | Self::TupleToUserset { .. } => 1,
            Self::Union { children } | Self::Intersection { children } => {
                1 + children.iter().map(Userset::depth).max().unwrap_or(0)
            }
            Self::Difference { base, subtract } => 1 + base.depth().max(subtract.depth()),
        }
    }
}

/// Wire representation of a [`Userset`] node before the exactly-one-of check.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UsersetRepr {
    #[serde(default)]
    this: Option<Wildcard>,
    #[serde(default)]
    computed_userset: Option<ObjectRelation>,
    #[serde(default)]
    tuple_to_userset: Option<TupleToUsersetRepr>,
    #[serde(default)]
    union: Option<UsersetsRepr>,
    #[serde(default)]
    intersection: Option<UsersetsRepr>,
    #[serde(default)]
    difference: Option<DifferenceRepr>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TupleToUsersetRepr {
    tupleset: ObjectRelation,
    computed_userset: ObjectRelation,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UsersetsRepr {
    child: Vec<Userset>,
}

impl UsersetsRepr {
    fn into_children(self, operator: &str) -> Result<Vec<Userset>, String> {
        if self.child.is_empty() {
            return Err(format!("{operator} must have at least one child"));
        }
        Ok(self.child)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DifferenceRepr {
    base: Box<Userset>,
    subtract: Box<Userset>,
}

impl TryFrom<UsersetRepr> for Userset {
    type Error = String;

    fn try_from(repr: UsersetRepr) -> Result<Self, Self::Error> {
        let mut variants = Vec::with_capacity(1);
        if repr.this.is_some() {
            variants.push(Userset::This);
        }
        if let Some(computed) = repr.computed_userset {
            variants.push(Userset::ComputedUserset(computed));
        }
        if let Some(ttu) = repr.tuple_to_userset {
            variants.push(Userset::TupleToUserset {
                tupleset: ttu.tupleset,
                computed_userset: ttu.computed_userset,
            });
        }
        if let Some(union) = repr.union {
            variants.push(Userset::Union {
                children: union.into_children("union")?,
            });
        }
        if let Some(intersection) = repr.intersection {
            variants.push(Userset::Intersection {
                children: intersection.into_children("intersection")?,
            });
        }
        if let Some(difference) = repr.difference {
            variants.push(Userset::Difference {
                base: difference.base,
                subtract: difference.subtract,
            });
        }

        match variants.len() {
            1 => Ok(variants.remove(0)),
            n => Err(format!(
                "userset must set exactly one of this, computed_userset, tuple_to_userset, \
                 union, intersection or difference (found {n})"
            )),
        }
    }
}

/// A named boolean expression gating relationship tuples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub parameters: Option<HashMap<String, ConditionParamTypeRef>>,
    #[serde(default)]
    pub metadata: Option<ConditionMetadata>,
}

/// Provenance of a condition in a modular model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
}

/// The declared type of a condition parameter. Generic types carry their
/// element type(s) (`list<string>`, `map<int>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionParamTypeRef {
    #[serde(default)]
    pub type_name: TypeName,
    #[serde(default)]
    pub generic_types: Option<Vec<ConditionParamTypeRef>>,
}

impl ConditionParamTypeRef {
    /// A non-generic parameter type.
    pub fn scalar(type_name: TypeName) -> Self {
        Self {
            type_name,
            generic_types: None,
        }
    }

    /// A generic parameter type such as `list<string>`.
    pub fn generic(type_name: TypeName, generic_types: Vec<ConditionParamTypeRef>) -> Self {
        Self {
            type_name,
            generic_types: Some(generic_types),
        }
    }

    /// Number of levels in the type tree; a scalar has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .generic_types
            .iter()
            .flatten()
            .map(ConditionParamTypeRef::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Condition parameter type names as spelled on the wire.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TypeName {
    #[default]
    #[serde(rename = "TYPE_NAME_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "TYPE_NAME_ANY")]
    Any,
    #[serde(rename = "TYPE_NAME_BOOL")]
    Bool,
    #[serde(rename = "TYPE_NAME_STRING")]
    String,
    #[serde(rename = "TYPE_NAME_INT")]
    Int,
    #[serde(rename = "TYPE_NAME_UINT")]
    Uint,
    #[serde(rename = "TYPE_NAME_DOUBLE")]
    Double,
    #[serde(rename = "TYPE_NAME_DURATION")]
    Duration,
    #[serde(rename = "TYPE_NAME_TIMESTAMP")]
    Timestamp,
    #[serde(rename = "TYPE_NAME_MAP")]
    Map,
    #[serde(rename = "TYPE_NAME_LIST")]
    List,
    #[serde(rename = "TYPE_NAME_IPADDRESS")]
    IpAddress,
}

impl TypeName {
    /// All type names, in wire enum order.
    pub const ALL: [TypeName; 12] = [
        TypeName::Unspecified,
        TypeName::Any,
        TypeName::Bool,
        TypeName::String,
        TypeName::Int,
        TypeName::Uint,
        TypeName::Double,
        TypeName::Duration,
        TypeName::Timestamp,
        TypeName::Map,
        TypeName::List,
        TypeName::IpAddress,
    ];

    /// The wire spelling (`TYPE_NAME_INT`).
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Unspecified => "TYPE_NAME_UNSPECIFIED",
            TypeName::Any => "TYPE_NAME_ANY",
            TypeName::Bool => "TYPE_NAME_BOOL",
            TypeName::String => "TYPE_NAME_STRING",
            TypeName::Int => "TYPE_NAME_INT",
            TypeName::Uint => "TYPE_NAME_UINT",
            TypeName::Double => "TYPE_NAME_DOUBLE",
            TypeName::Duration => "TYPE_NAME_DURATION",
            TypeName::Timestamp => "TYPE_NAME_TIMESTAMP",
            TypeName::Map => "TYPE_NAME_MAP",
            TypeName::List => "TYPE_NAME_LIST",
            TypeName::IpAddress => "TYPE_NAME_IPADDRESS",
        }
    }

    /// Parses the wire spelling.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// The DSL keyword (`int`), if the type can be written in the DSL.
    pub fn dsl_keyword(self) -> Option<&'static str> {
        match self {
            TypeName::Unspecified => None,
            TypeName::Any => Some("any"),
            TypeName::Bool => Some("bool"),
            TypeName::String => Some("string"),
            TypeName::Int => Some("int"),
            TypeName::Uint => Some("uint"),
            TypeName::Double => Some("double"),
            TypeName::Duration => Some("duration"),
            TypeName::Timestamp => Some("timestamp"),
            TypeName::Map => Some("map"),
            TypeName::List => Some("list"),
            TypeName::IpAddress => Some("ipaddress"),
        }
    }

    /// Parses a DSL keyword.
    pub fn from_dsl_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.dsl_keyword() == Some(keyword))
    }

    /// Whether the type takes a generic argument.
    pub fn is_generic(self) -> bool {
        matches!(self, TypeName::Map | TypeName::List)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
