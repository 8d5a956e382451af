//! Conversion between the recursive model and its depth-bounded native form.
//!
//! Encoding never fails. Nodes at depth [`MAX_RECURSION_DEPTH`] are emitted
//! empty, so anything nested deeper is dropped. Decoding never fails either:
//! empty nodes decode to no expression and their parents shrink accordingly.
//! Input that did not come from [`encode_model`] goes through
//! [`check_native_model`] first.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{DomainError, DomainResult};
use crate::model::{
    AuthorizationModel, Condition, ConditionParamTypeRef, TypeDefinition, Userset,
};

use super::native::{
    NativeAuthorizationModel, NativeCondition, NativeDifference, NativeParamTypeRef,
    NativeTupleToUserset, NativeTypeDefinition, NativeUserset, NativeUsersets,
};
use super::MAX_RECURSION_DEPTH;

/// Encodes `userset` as a native node sitting at `depth`.
pub fn encode_userset(userset: &Userset, depth: usize) -> NativeUserset {
    if depth >= MAX_RECURSION_DEPTH {
        return NativeUserset::default();
    }

    let children = |children: &[Userset]| NativeUsersets {
        child: children
            .iter()
            .map(|child| encode_userset(child, depth + 1))
            .collect(),
    };

    match userset {
        Userset::This => NativeUserset {
            this: Some(Default::default()),
            ..Default::default()
        },
        Userset::ComputedUserset(target) => NativeUserset {
            computed_userset: Some(target.clone()),
            ..Default::default()
        },
        Userset::TupleToUserset {
            tupleset,
            computed_userset,
        } => NativeUserset {
            tuple_to_userset: Some(NativeTupleToUserset {
                tupleset: tupleset.clone(),
                computed_userset: computed_userset.clone(),
            }),
            ..Default::default()
        },
        Userset::Union { children: c } => NativeUserset {
            union: Some(children(c)),
            ..Default::default()
        },
        Userset::Intersection { children: c } => NativeUserset {
            intersection: Some(children(c)),
            ..Default::default()
        },
        Userset::Difference { base, subtract } => NativeUserset {
            difference: Some(Box::new(NativeDifference {
                base: encode_userset(base, depth + 1),
                subtract: encode_userset(subtract, depth + 1),
            })),
            ..Default::default()
        },
    }
}

/// Decodes a native node. Returns `None` for an empty node.
///
/// When several slots are set the first one in declaration order wins; use
/// [`check_native_model`] to reject such input up front.
pub fn decode_userset(native: &NativeUserset) -> Option<Userset> {
    if native.this.is_some() {
        return Some(Userset::This);
    }
    if let Some(target) = &native.computed_userset {
        return Some(Userset::ComputedUserset(target.clone()));
    }
    if let Some(ttu) = &native.tuple_to_userset {
        return Some(Userset::TupleToUserset {
            tupleset: ttu.tupleset.clone(),
            computed_userset: ttu.computed_userset.clone(),
        });
    }
    if let Some(union) = &native.union {
        let children = decode_children(&union.child)?;
        return Some(Userset::Union { children });
    }
    if let Some(intersection) = &native.intersection {
        let children = decode_children(&intersection.child)?;
        return Some(Userset::Intersection { children });
    }
    if let Some(difference) = &native.difference {
        let base = decode_userset(&difference.base)?;
        let subtract = decode_userset(&difference.subtract)?;
        return Some(Userset::difference(base, subtract));
    }
    None
}

fn decode_children(children: &[NativeUserset]) -> Option<Vec<Userset>> {
    let decoded: Vec<_> = children.iter().filter_map(decode_userset).collect();
    (!decoded.is_empty()).then_some(decoded)
}

/// Encodes a parameter type as a native node sitting at `depth`.
pub fn encode_param_type(param: &ConditionParamTypeRef, depth: usize) -> NativeParamTypeRef {
    if depth >= MAX_RECURSION_DEPTH {
        return NativeParamTypeRef::default();
    }

    NativeParamTypeRef {
        type_name: Some(param.type_name),
        generic_types: param.generic_types.as_ref().map(|generics| {
            generics
                .iter()
                .map(|generic| encode_param_type(generic, depth + 1))
                .collect()
        }),
    }
}

/// Decodes a native parameter type. Returns `None` for an empty node.
pub fn decode_param_type(native: &NativeParamTypeRef) -> Option<ConditionParamTypeRef> {
    Some(ConditionParamTypeRef {
        type_name: native.type_name?,
        generic_types: native
            .generic_types
            .as_ref()
            .map(|generics| generics.iter().filter_map(decode_param_type).collect()),
    })
}

/// Encodes a whole model. The model id is not part of the native form.
pub fn encode_model(model: &AuthorizationModel) -> NativeAuthorizationModel {
    NativeAuthorizationModel {
        schema_version: model.schema_version.clone(),
        type_definitions: model.type_definitions.iter().map(encode_type).collect(),
        conditions: model.conditions.as_ref().map(|conditions| {
            conditions
                .iter()
                .map(|(name, condition)| (name.clone(), encode_condition(condition)))
                .collect()
        }),
    }
}

fn encode_type(type_def: &TypeDefinition) -> NativeTypeDefinition {
    NativeTypeDefinition {
        type_name: type_def.type_name.clone(),
        relations: type_def.relations.as_ref().map(|relations| {
            relations
                .iter()
                .map(|(name, rewrite)| {
                    if rewrite.depth() > MAX_RECURSION_DEPTH {
                        warn!(
                            type_name = %type_def.type_name,
                            relation = %name,
                            depth = rewrite.depth(),
                            max_depth = MAX_RECURSION_DEPTH,
                            "Relation rewrite exceeds native nesting limit and will be truncated"
                        );
                    }
                    (name.clone(), encode_userset(rewrite, 0))
                })
                .collect()
        }),
        metadata: type_def.metadata.clone(),
    }
}

fn encode_condition(condition: &Condition) -> NativeCondition {
    NativeCondition {
        name: condition.name.clone(),
        expression: condition.expression.clone(),
        parameters: condition.parameters.as_ref().map(|parameters| {
            parameters
                .iter()
                .map(|(name, param)| {
                    if param.depth() > MAX_RECURSION_DEPTH {
                        warn!(
                            condition = %condition.name,
                            parameter = %name,
                            depth = param.depth(),
                            max_depth = MAX_RECURSION_DEPTH,
                            "Parameter type exceeds native nesting limit and will be truncated"
                        );
                    }
                    (name.clone(), encode_param_type(param, 0))
                })
                .collect()
        }),
        metadata: condition.metadata.clone(),
    }
}

/// Decodes a whole model.
///
/// Relations and parameters whose top-level node is empty are left out.
pub fn decode_model(native: &NativeAuthorizationModel) -> AuthorizationModel {
    AuthorizationModel {
        id: None,
        schema_version: native.schema_version.clone(),
        type_definitions: native.type_definitions.iter().map(decode_type).collect(),
        conditions: native.conditions.as_ref().map(|conditions| {
            conditions
                .iter()
                .map(|(name, condition)| (name.clone(), decode_condition(condition)))
                .collect()
        }),
    }
}

fn decode_type(native: &NativeTypeDefinition) -> TypeDefinition {
    TypeDefinition {
        type_name: native.type_name.clone(),
        relations: native.relations.as_ref().map(|relations| {
            relations
                .iter()
                .filter_map(|(name, rewrite)| {
                    let decoded = decode_userset(rewrite);
                    if decoded.is_none() {
                        warn!(type_name = %native.type_name, relation = %name, "Dropping empty relation rewrite");
                    }
                    Some((name.clone(), decoded?))
                })
                .collect::<HashMap<_, _>>()
        }),
        metadata: native.metadata.clone(),
    }
}

fn decode_condition(native: &NativeCondition) -> Condition {
    Condition {
        name: native.name.clone(),
        expression: native.expression.clone(),
        parameters: native.parameters.as_ref().map(|parameters| {
            parameters
                .iter()
                .filter_map(|(name, param)| Some((name.clone(), decode_param_type(param)?)))
                .collect()
        }),
        metadata: native.metadata.clone(),
    }
}

/// Rejects native input that encoding could not have produced.
///
/// Every userset node above [`MAX_RECURSION_DEPTH`] sets exactly one slot,
/// and union and intersection nodes list at least one child. Every parameter
/// type node above the bound names its type. Nodes at the bound are empty.
pub fn check_native_model(native: &NativeAuthorizationModel) -> DomainResult<()> {
    for type_def in &native.type_definitions {
        for (name, rewrite) in type_def.relations.iter().flatten() {
            check_userset(rewrite, 0).map_err(|message| {
                DomainError::parse(format!(
                    "unable to transform model: {}#{}: {message}",
                    type_def.type_name, name
                ))
            })?;
        }
    }
    for (name, condition) in native.conditions.iter().flatten() {
        for (param_name, param) in condition.parameters.iter().flatten() {
            check_param_type(param, 0).map_err(|message| {
                DomainError::parse(format!(
                    "unable to transform model: condition {name}({param_name}): {message}"
                ))
            })?;
        }
    }
    Ok(())
}

fn check_userset(native: &NativeUserset, depth: usize) -> Result<(), String> {
    if depth >= MAX_RECURSION_DEPTH {
        if native.is_empty() {
            return Ok(());
        }
        return Err(format!(
            "userset nested deeper than {MAX_RECURSION_DEPTH} levels"
        ));
    }

    let populated = [
        native.this.is_some(),
        native.computed_userset.is_some(),
        native.tuple_to_userset.is_some(),
        native.union.is_some(),
        native.intersection.is_some(),
        native.difference.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if populated != 1 {
        return Err(format!(
            "userset must set exactly one of this, computed_userset, tuple_to_userset, \
             union, intersection or difference (found {populated})"
        ));
    }

    for (operator, children) in [("union", &native.union), ("intersection", &native.intersection)] {
        if let Some(children) = children {
            if children.child.is_empty() {
                return Err(format!("{operator} must have at least one child"));
            }
            for child in &children.child {
                check_userset(child, depth + 1)?;
            }
        }
    }
    if let Some(difference) = &native.difference {
        check_userset(&difference.base, depth + 1)?;
        check_userset(&difference.subtract, depth + 1)?;
    }
    Ok(())
}

fn check_param_type(native: &NativeParamTypeRef, depth: usize) -> Result<(), String> {
    if depth >= MAX_RECURSION_DEPTH {
        if native == &NativeParamTypeRef::default() {
            return Ok(());
        }
        return Err(format!(
            "parameter type nested deeper than {MAX_RECURSION_DEPTH} levels"
        ));
    }
    if native.type_name.is_none() {
        return Err("parameter type must set type_name".to_string());
    }
    for generic in native.generic_types.iter().flatten() {
        check_param_type(generic, depth + 1)?;
    }
    Ok(())
}
