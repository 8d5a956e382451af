//! Sanitized model view: the serializable projection of a model.
//!
//! The view borrows from the model, leaves out the model id and spells out
//! every default, so "absent" and "empty" serialize identically. Maps are
//! `BTreeMap`s and struct fields are declared in key order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{
    AuthorizationModel, Condition, ConditionMetadata, ConditionParamTypeRef, Metadata,
    ObjectRelation, RelationMetadata, RelationReference, SourceInfo, TypeDefinition, TypeName,
    Userset,
};

/// A model without its id, with `conditions` always present.
#[derive(Debug, Serialize)]
pub struct SanitizedModel<'a> {
    conditions: BTreeMap<&'a str, ConditionView<'a>>,
    schema_version: &'a str,
    type_definitions: Vec<TypeDefinitionView<'a>>,
}

impl<'a> SanitizedModel<'a> {
    pub fn new(model: &'a AuthorizationModel) -> Self {
        Self {
            conditions: model
                .conditions
                .iter()
                .flatten()
                .map(|(name, condition)| (name.as_str(), ConditionView::new(condition)))
                .collect(),
            schema_version: &model.schema_version,
            type_definitions: model
                .type_definitions
                .iter()
                .map(TypeDefinitionView::new)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TypeDefinitionView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<MetadataView<'a>>,
    relations: BTreeMap<&'a str, UsersetView<'a>>,
    #[serde(rename = "type")]
    type_name: &'a str,
}

impl<'a> TypeDefinitionView<'a> {
    fn new(type_def: &'a TypeDefinition) -> Self {
        Self {
            metadata: type_def.metadata.as_ref().map(MetadataView::new),
            relations: type_def
                .relations
                .iter()
                .flatten()
                .map(|(name, rewrite)| (name.as_str(), UsersetView::new(rewrite)))
                .collect(),
            type_name: &type_def.type_name,
        }
    }
}

#[derive(Debug, Serialize)]
struct MetadataView<'a> {
    module: &'a str,
    relations: BTreeMap<&'a str, RelationMetadataView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_info: Option<SourceInfoView<'a>>,
}

impl<'a> MetadataView<'a> {
    fn new(metadata: &'a Metadata) -> Self {
        Self {
            module: metadata.module.as_deref().unwrap_or_default(),
            relations: metadata
                .relations
                .iter()
                .flatten()
                .map(|(name, relation)| (name.as_str(), RelationMetadataView::new(relation)))
                .collect(),
            source_info: metadata.source_info.as_ref().map(SourceInfoView::new),
        }
    }
}

#[derive(Debug, Serialize)]
struct RelationMetadataView<'a> {
    directly_related_user_types: Vec<RelationReferenceView<'a>>,
    module: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_info: Option<SourceInfoView<'a>>,
}

impl<'a> RelationMetadataView<'a> {
    fn new(metadata: &'a RelationMetadata) -> Self {
        Self {
            directly_related_user_types: metadata
                .directly_related_user_types
                .iter()
                .flatten()
                .map(RelationReferenceView::new)
                .collect(),
            module: metadata.module.as_deref().unwrap_or_default(),
            source_info: metadata.source_info.as_ref().map(SourceInfoView::new),
        }
    }
}

#[derive(Debug, Serialize)]
struct RelationReferenceView<'a> {
    condition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    relation: Option<&'a str>,
    #[serde(rename = "type")]
    type_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wildcard: Option<EmptyView>,
}

impl<'a> RelationReferenceView<'a> {
    fn new(reference: &'a RelationReference) -> Self {
        Self {
            condition: reference.condition.as_deref().unwrap_or_default(),
            relation: reference.relation.as_deref(),
            type_name: &reference.type_name,
            wildcard: reference.wildcard.map(|_| EmptyView {}),
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Serialize)]
struct EmptyView {}

#[derive(Debug, Serialize)]
struct SourceInfoView<'a> {
    file: &'a str,
}

impl<'a> SourceInfoView<'a> {
    fn new(source_info: &'a SourceInfo) -> Self {
        Self {
            file: source_info.file.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ObjectRelationView<'a> {
    object: &'a str,
    relation: &'a str,
}

impl<'a> ObjectRelationView<'a> {
    fn new(target: &'a ObjectRelation) -> Self {
        Self {
            object: target.object.as_deref().unwrap_or_default(),
            relation: target.relation_name(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum UsersetView<'a> {
    This(EmptyView),
    ComputedUserset(ObjectRelationView<'a>),
    TupleToUserset {
        computed_userset: ObjectRelationView<'a>,
        tupleset: ObjectRelationView<'a>,
    },
    Union {
        child: Vec<UsersetView<'a>>,
    },
    Intersection {
        child: Vec<UsersetView<'a>>,
    },
    Difference {
        base: Box<UsersetView<'a>>,
        subtract: Box<UsersetView<'a>>,
    },
}

impl<'a> UsersetView<'a> {
    fn new(userset: &'a Userset) -> Self {
        let children = |children: &'a [Userset]| -> Vec<UsersetView<'a>> {
            children.iter().map(UsersetView::new).collect()
        };

        match userset {
            Userset::This => UsersetView::This(EmptyView {}),
            Userset::ComputedUserset(target) => {
                UsersetView::ComputedUserset(ObjectRelationView::new(target))
            }
            Userset::TupleToUserset {
                tupleset,
                computed_userset,
            } => UsersetView::TupleToUserset {
                computed_userset: ObjectRelationView::new(computed_userset),
                tupleset: ObjectRelationView::new(tupleset),
            },
            Userset::Union { children: c } => UsersetView::Union { child: children(c) },
            Userset::Intersection { children: c } => UsersetView::Intersection { child: children(c) },
            Userset::Difference { base, subtract } => UsersetView::Difference {
                base: Box::new(UsersetView::new(base)),
                subtract: Box::new(UsersetView::new(subtract)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ConditionView<'a> {
    expression: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ConditionMetadataView<'a>>,
    name: &'a str,
    parameters: BTreeMap<&'a str, ParamTypeView>,
}

impl<'a> ConditionView<'a> {
    fn new(condition: &'a Condition) -> Self {
        Self {
            expression: &condition.expression,
            metadata: condition.metadata.as_ref().map(ConditionMetadataView::new),
            name: &condition.name,
            parameters: condition
                .parameters
                .iter()
                .flatten()
                .map(|(name, param)| (name.as_str(), ParamTypeView::new(param)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ConditionMetadataView<'a> {
    module: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_info: Option<SourceInfoView<'a>>,
}

impl<'a> ConditionMetadataView<'a> {
    fn new(metadata: &'a ConditionMetadata) -> Self {
        Self {
            module: metadata.module.as_deref().unwrap_or_default(),
            source_info: metadata.source_info.as_ref().map(SourceInfoView::new),
        }
    }
}

#[derive(Debug, Serialize)]
struct ParamTypeView {
    generic_types: Vec<ParamTypeView>,
    type_name: TypeName,
}

impl ParamTypeView {
    fn new(param: &ConditionParamTypeRef) -> Self {
        Self {
            generic_types: param
                .generic_types
                .iter()
                .flatten()
                .map(ParamTypeView::new)
                .collect(),
            type_name: param.type_name,
        }
    }
}
