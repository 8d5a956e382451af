//! Property-based tests and strategies for model types.
//!
//! The strategies only generate models the DSL can express, so they double
//! as inputs for the printer, the bounded encoder and the canonicalizer.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;

use crate::model::{
    AuthorizationModel, Condition, ConditionParamTypeRef, Metadata, RelationMetadata,
    RelationReference, TypeDefinition, TypeName, Userset,
};

const RESERVED: &[&str] = &[
    "model", "schema", "module", "extend", "type", "relations", "define", "condition", "or",
    "and", "but", "not", "from", "with",
];

/// Strategy to generate identifiers that are not DSL keywords
pub(crate) fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("reserved keyword", |s| !RESERVED.contains(&s.as_str()))
}

/// Strategy to generate a userset without direct assignment.
///
/// Unions and intersections always have at least two children, which is
/// what the DSL produces for an operator chain.
pub(crate) fn arb_rewrite() -> impl Strategy<Value = Userset> {
    let leaf = prop_oneof![
        identifier().prop_map(Userset::computed),
        (identifier(), identifier()).prop_map(|(t, c)| Userset::tuple_to_userset(t, c)),
    ];
    leaf.prop_recursive(5, 32, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|children| Userset::Union { children }),
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|children| Userset::Intersection { children }),
            (inner.clone(), inner).prop_map(|(base, subtract)| Userset::difference(base, subtract)),
        ]
    })
}

fn arb_relation_reference() -> impl Strategy<Value = RelationReference> {
    let reference = prop_oneof![
        identifier().prop_map(RelationReference::direct),
        identifier().prop_map(RelationReference::wildcard),
        (identifier(), identifier()).prop_map(|(t, r)| RelationReference::userset(t, r)),
    ];
    (reference, proptest::option::of(identifier())).prop_map(|(reference, condition)| {
        match condition {
            Some(condition) => reference.with_condition(condition),
            None => reference,
        }
    })
}

/// A relation rewrite plus its directly related user types.
fn arb_relation() -> impl Strategy<Value = (Userset, Vec<RelationReference>)> {
    (
        0..3u8,
        arb_rewrite(),
        prop::collection::vec(arb_relation_reference(), 1..3),
    )
        .prop_map(|(kind, rewrite, direct)| match kind {
            0 => (Userset::This, direct),
            1 => (
                Userset::Union {
                    children: vec![Userset::This, rewrite],
                },
                direct,
            ),
            _ => (rewrite, Vec::new()),
        })
}

fn arb_type_definition(type_name: String) -> impl Strategy<Value = TypeDefinition> {
    prop::collection::btree_map(identifier(), arb_relation(), 0..4).prop_map(move |relations| {
        if relations.is_empty() {
            return TypeDefinition::new(type_name.clone());
        }
        let mut rewrites = HashMap::new();
        let mut metadata = HashMap::new();
        for (name, (rewrite, direct)) in relations {
            metadata.insert(
                name.clone(),
                RelationMetadata {
                    directly_related_user_types: Some(direct),
                    ..Default::default()
                },
            );
            rewrites.insert(name, rewrite);
        }
        TypeDefinition {
            type_name: type_name.clone(),
            relations: Some(rewrites),
            metadata: Some(Metadata {
                relations: Some(metadata),
                ..Default::default()
            }),
        }
    })
}

/// Strategy to generate condition parameter types, up to `list<map<...>>`
/// nesting of four levels.
pub(crate) fn arb_param_type() -> impl Strategy<Value = ConditionParamTypeRef> {
    let scalar = prop::sample::select(
        TypeName::ALL
            .into_iter()
            .filter(|t| t.dsl_keyword().is_some() && !t.is_generic())
            .collect::<Vec<_>>(),
    )
    .prop_map(ConditionParamTypeRef::scalar);
    scalar.prop_recursive(4, 8, 1, |inner| {
        (prop::sample::select(vec![TypeName::List, TypeName::Map]), inner)
            .prop_map(|(type_name, generic)| ConditionParamTypeRef::generic(type_name, vec![generic]))
    })
}

fn arb_condition(name: String) -> impl Strategy<Value = Condition> {
    (
        prop::collection::hash_map(identifier(), arb_param_type(), 1..3),
        "[a-z]{1,5} < [a-z]{1,5}",
    )
        .prop_map(move |(parameters, expression)| Condition {
            name: name.clone(),
            expression,
            parameters: Some(parameters),
            metadata: None,
        })
}

/// Strategy to generate complete DSL-expressible models
pub(crate) fn arb_model() -> impl Strategy<Value = AuthorizationModel> {
    let types = prop::collection::btree_set(identifier(), 1..4).prop_flat_map(|names| {
        names
            .into_iter()
            .map(arb_type_definition)
            .collect::<Vec<_>>()
    });
    let conditions = prop::collection::btree_set(identifier(), 0..3).prop_flat_map(|names| {
        names.into_iter().map(arb_condition).collect::<Vec<_>>()
    });
    (types, conditions).prop_map(|(type_definitions, conditions)| {
        let conditions: BTreeMap<_, _> = conditions
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        AuthorizationModel {
            id: None,
            schema_version: "1.1".to_string(),
            type_definitions,
            conditions: (!conditions.is_empty()).then(|| conditions.into_iter().collect()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse, print_dsl};

    proptest! {
        #[test]
        fn test_print_then_parse_round_trips(model in arb_model()) {
            let dsl = print_dsl(&model).unwrap();
            let reparsed = parse(&dsl);
            prop_assert!(reparsed.is_ok(), "failed to reparse:\n{}\n{:?}", dsl, reparsed.err());
            prop_assert_eq!(reparsed.unwrap(), model);
        }

        #[test]
        fn test_userset_depth_is_positive(userset in arb_rewrite()) {
            prop_assert!(userset.depth() >= 1);
        }

        #[test]
        fn test_generated_identifiers_parse_as_type_names(name in identifier()) {
            let model = parse(&format!("model\n  schema 1.1\ntype {name}\n"));
            prop_assert!(model.is_ok(), "failed for type name: {}", name);
            prop_assert_eq!(&model.unwrap().type_definitions[0].type_name, &name);
        }
    }
}
