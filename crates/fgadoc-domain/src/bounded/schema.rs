//! Static attribute schema of the native model form.
//!
//! Schema-driven tooling cannot describe a recursive type, so the recursive
//! parts are unrolled by depth. A userset or parameter type node at depth
//! [`MAX_RECURSION_DEPTH`] has no attributes.

use std::collections::BTreeMap;

use serde::Serialize;

use super::MAX_RECURSION_DEPTH;

/// Kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    /// A single nested object.
    Object,
    /// A list of nested objects.
    List,
    /// A string-keyed map of nested objects.
    Map,
}

/// One attribute of the native form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    pub kind: AttributeKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attributes of the nested object; empty for strings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<&'static str, AttributeSchema>,
}

type Attributes = BTreeMap<&'static str, AttributeSchema>;

impl AttributeSchema {
    fn string(required: bool) -> Self {
        Self {
            kind: AttributeKind::String,
            required,
            description: None,
            attributes: BTreeMap::new(),
        }
    }

    fn nested(kind: AttributeKind, required: bool, attributes: Attributes) -> Self {
        Self {
            kind,
            required,
            description: None,
            attributes,
        }
    }

    fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Attribute schema of [`NativeAuthorizationModel`](super::NativeAuthorizationModel).
pub fn native_model_schema() -> AttributeSchema {
    AttributeSchema::nested(
        AttributeKind::Object,
        true,
        BTreeMap::from([
            ("schema_version", AttributeSchema::string(true)),
            (
                "type_definitions",
                AttributeSchema::nested(AttributeKind::List, true, type_definition_attributes()),
            ),
            (
                "conditions",
                AttributeSchema::nested(AttributeKind::Map, false, condition_attributes()),
            ),
        ]),
    )
}

fn type_definition_attributes() -> Attributes {
    BTreeMap::from([
        ("type", AttributeSchema::string(true)),
        (
            "relations",
            AttributeSchema::nested(AttributeKind::Map, false, userset_attributes(0)).describe(
                format!(
                    "Relation rewrites. Expressions are unrolled to {MAX_RECURSION_DEPTH} levels; \
                     deeper nodes have no attributes and cannot be represented."
                ),
            ),
        ),
        (
            "metadata",
            AttributeSchema::nested(AttributeKind::Object, false, metadata_attributes()),
        ),
    ])
}

fn metadata_attributes() -> Attributes {
    BTreeMap::from([
        (
            "relations",
            AttributeSchema::nested(AttributeKind::Map, false, relation_metadata_attributes()),
        ),
        ("module", AttributeSchema::string(false)),
        (
            "source_info",
            AttributeSchema::nested(AttributeKind::Object, false, source_info_attributes()),
        ),
    ])
}

fn relation_metadata_attributes() -> Attributes {
    BTreeMap::from([
        (
            "directly_related_user_types",
            AttributeSchema::nested(AttributeKind::List, false, relation_reference_attributes()),
        ),
        ("module", AttributeSchema::string(false)),
        (
            "source_info",
            AttributeSchema::nested(AttributeKind::Object, false, source_info_attributes()),
        ),
    ])
}

fn relation_reference_attributes() -> Attributes {
    BTreeMap::from([
        ("type", AttributeSchema::string(true)),
        ("relation", AttributeSchema::string(false)),
        (
            "wildcard",
            AttributeSchema::nested(AttributeKind::Object, false, BTreeMap::new()),
        ),
        ("condition", AttributeSchema::string(false)),
    ])
}

fn userset_attributes(depth: usize) -> Attributes {
    if depth >= MAX_RECURSION_DEPTH {
        return BTreeMap::new();
    }

    let children = |kind| {
        AttributeSchema::nested(
            AttributeKind::Object,
            false,
            BTreeMap::from([(
                "child",
                AttributeSchema::nested(kind, true, userset_attributes(depth + 1)),
            )]),
        )
    };

    BTreeMap::from([
        (
            "this",
            AttributeSchema::nested(AttributeKind::Object, false, BTreeMap::new()),
        ),
        (
            "computed_userset",
            AttributeSchema::nested(AttributeKind::Object, false, object_relation_attributes()),
        ),
        (
            "tuple_to_userset",
            AttributeSchema::nested(AttributeKind::Object, false, tuple_to_userset_attributes()),
        ),
        ("union", children(AttributeKind::List)),
        ("intersection", children(AttributeKind::List)),
        (
            "difference",
            AttributeSchema::nested(
                AttributeKind::Object,
                false,
                BTreeMap::from([
                    (
                        "base",
                        AttributeSchema::nested(
                            AttributeKind::Object,
                            true,
                            userset_attributes(depth + 1),
                        ),
                    ),
                    (
                        "subtract",
                        AttributeSchema::nested(
                            AttributeKind::Object,
                            true,
                            userset_attributes(depth + 1),
                        ),
                    ),
                ]),
            ),
        ),
    ])
}

fn object_relation_attributes() -> Attributes {
    BTreeMap::from([
        ("object", AttributeSchema::string(false)),
        ("relation", AttributeSchema::string(false)),
    ])
}

fn tuple_to_userset_attributes() -> Attributes {
    BTreeMap::from([
        (
            "tupleset",
            AttributeSchema::nested(AttributeKind::Object, true, object_relation_attributes()),
        ),
        (
            "computed_userset",
            AttributeSchema::nested(AttributeKind::Object, true, object_relation_attributes()),
        ),
    ])
}

fn condition_attributes() -> Attributes {
    BTreeMap::from([
        ("name", AttributeSchema::string(true)),
        ("expression", AttributeSchema::string(true)),
        (
            "parameters",
            AttributeSchema::nested(AttributeKind::Map, false, param_type_attributes(0)).describe(
                format!(
                    "Parameter types. Generic types are unrolled to {MAX_RECURSION_DEPTH} levels; \
                     deeper nodes have no attributes and cannot be represented."
                ),
            ),
        ),
        (
            "metadata",
            AttributeSchema::nested(
                AttributeKind::Object,
                false,
                BTreeMap::from([
                    ("module", AttributeSchema::string(false)),
                    (
                        "source_info",
                        AttributeSchema::nested(
                            AttributeKind::Object,
                            false,
                            source_info_attributes(),
                        ),
                    ),
                ]),
            ),
        ),
    ])
}

fn param_type_attributes(depth: usize) -> Attributes {
    if depth >= MAX_RECURSION_DEPTH {
        return BTreeMap::new();
    }

    BTreeMap::from([
        ("type_name", AttributeSchema::string(true)),
        (
            "generic_types",
            AttributeSchema::nested(AttributeKind::List, false, param_type_attributes(depth + 1)),
        ),
    ])
}

fn source_info_attributes() -> Attributes {
    BTreeMap::from([("file", AttributeSchema::string(false))])
}
