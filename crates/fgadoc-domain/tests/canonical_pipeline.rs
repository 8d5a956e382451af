mod common;

use anyhow::Result;
use common::{DOCUMENT_CANONICAL, DOCUMENT_DSL};
use fgadoc_domain::bounded::{encode_model, NativeAuthorizationModel};
use fgadoc_domain::model::parse_dsl;
use fgadoc_domain::{canonicalize_source, DocumentSource, DomainError, OpenFgaTransformer};
use serde_json::json;

// ============================================================================
// Canonical Pipeline Tests
// ============================================================================
//
// Every input form of the same model must produce byte-identical output.
//
// ============================================================================

fn canonical(source: &DocumentSource) -> Result<String> {
    Ok(canonicalize_source(source, &OpenFgaTransformer)?)
}

/// Test: DSL, JSON and native object forms canonicalize identically
#[test]
fn test_all_input_forms_agree() -> Result<()> {
    let json = json!({
        "id": "01HVMMBCMGZNT3SED4Z17ECXCA",
        "schema_version": "1.1",
        "type_definitions": [
            { "type": "user", "relations": {} },
            {
                "type": "document",
                "relations": { "viewer": { "this": {} } },
                "metadata": {
                    "relations": {
                        "viewer": { "directly_related_user_types": [{ "type": "user", "condition": "" }] }
                    }
                }
            }
        ],
        "conditions": {
            "larger_than": {
                "name": "larger_than",
                "expression": "a > b",
                "parameters": {
                    "b": { "type_name": "TYPE_NAME_INT", "generic_types": [] },
                    "a": { "type_name": "TYPE_NAME_INT" }
                }
            }
        }
    });

    let native = encode_model(&parse_dsl(DOCUMENT_DSL)?);

    assert_eq!(canonical(&DocumentSource::from_dsl(DOCUMENT_DSL))?, DOCUMENT_CANONICAL);
    assert_eq!(
        canonical(&DocumentSource::from_json(json.to_string()))?,
        DOCUMENT_CANONICAL
    );
    assert_eq!(canonical(&DocumentSource::from_model(native))?, DOCUMENT_CANONICAL);
    Ok(())
}

/// Test: Output is stable across repeated calls
#[test]
fn test_output_is_deterministic() -> Result<()> {
    let source = DocumentSource::from_dsl(DOCUMENT_DSL);
    let first = canonical(&source)?;
    for _ in 0..10 {
        assert_eq!(canonical(&source)?, first);
    }
    Ok(())
}

/// Test: Relation and condition order in the source does not matter
#[test]
fn test_declaration_order_does_not_matter() -> Result<()> {
    let a = r#"model
  schema 1.1
type user
type doc
  relations
    define owner: [user]
    define editor: [user] or owner
    define viewer: editor
condition x(a: int) {
  a > 1
}
condition y(b: string) {
  b == "y"
}
"#;
    let b = r#"model
  schema 1.1
type user
type doc
  relations
    define viewer: editor
    define editor: [user] or owner
    define owner: [user]
condition y(b: string) {
  b == "y"
}
condition x(a: int) {
  a > 1
}
"#;
    assert_eq!(
        canonical(&DocumentSource::from_dsl(a))?,
        canonical(&DocumentSource::from_dsl(b))?
    );
    Ok(())
}

/// Test: Native object input arrives through serde from any format
#[test]
fn test_native_object_from_json_value() -> Result<()> {
    let native: NativeAuthorizationModel = serde_json::from_value(json!({
        "schema_version": "1.1",
        "type_definitions": [
            { "type": "user" },
            {
                "type": "document",
                "relations": { "viewer": { "this": {} } },
                "metadata": {
                    "relations": {
                        "viewer": { "directly_related_user_types": [{ "type": "user" }] }
                    }
                }
            }
        ],
        "conditions": {
            "larger_than": {
                "name": "larger_than",
                "expression": "a > b",
                "parameters": {
                    "a": { "type_name": "TYPE_NAME_INT" },
                    "b": { "type_name": "TYPE_NAME_INT" }
                }
            }
        }
    }))?;

    assert_eq!(canonical(&DocumentSource::from_model(native))?, DOCUMENT_CANONICAL);
    Ok(())
}

/// Test: No input and several inputs are both rejected
#[test]
fn test_exactly_one_input_is_enforced() {
    let none = canonicalize_source(&DocumentSource::default(), &OpenFgaTransformer);
    assert!(matches!(none, Err(DomainError::InvalidInput { .. })));

    let both = DocumentSource {
        dsl: Some(DOCUMENT_DSL.to_string()),
        json: Some("{}".to_string()),
        ..Default::default()
    };
    let err = canonicalize_source(&both, &OpenFgaTransformer).unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput { .. }));
    assert!(err.to_string().contains("dsl, json"), "{err}");
}

/// Test: Parse failures surface as parse errors and produce no output
#[test]
fn test_parse_failures_fail_closed() {
    let dsl = "model\n  schema 1.1\ntype doc\n  relations\n    define viewer: a or b and c\n";
    let err = canonicalize_source(&DocumentSource::from_dsl(dsl), &OpenFgaTransformer).unwrap_err();
    assert!(matches!(err, DomainError::ModelParseError { .. }));

    let err = canonicalize_source(
        &DocumentSource::from_json(r#"{"schema_version":"1.1","type_definitions":[{"type":"doc","relations":{"viewer":{}}}]}"#),
        &OpenFgaTransformer,
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::ModelParseError { .. }));
}

/// Test: Native input that encoding could not produce is rejected, not trimmed
#[test]
fn test_malformed_native_object_fails_closed() -> Result<()> {
    let document = |viewer: serde_json::Value| {
        json!({
            "schema_version": "1.1",
            "type_definitions": [
                { "type": "user" },
                { "type": "document", "relations": { "viewer": viewer } }
            ]
        })
    };

    let missing_side = document(json!({ "difference": { "base": { "this": {} } } }));
    assert!(serde_json::from_value::<NativeAuthorizationModel>(missing_side).is_err());

    for viewer in [
        json!({}),
        json!({ "union": { "child": [] } }),
        json!({ "difference": { "base": { "this": {} }, "subtract": {} } }),
    ] {
        let native: NativeAuthorizationModel = serde_json::from_value(document(viewer.clone()))?;
        let err = canonicalize_source(&DocumentSource::from_model(native), &OpenFgaTransformer)
            .unwrap_err();
        assert!(matches!(err, DomainError::ModelParseError { .. }), "{viewer}: {err}");
        assert!(err.to_string().contains("document#viewer"), "{err}");
    }
    Ok(())
}

/// Test: An empty union in a programmatic model fails validation
#[test]
fn test_empty_union_fails_validation() {
    use fgadoc_domain::model::{AuthorizationModel, TypeDefinition, Userset};

    let mut document = TypeDefinition::new("document");
    document.relations = Some(
        [("viewer".to_string(), Userset::Union { children: vec![] })]
            .into_iter()
            .collect(),
    );
    let mut model = AuthorizationModel::new("1.1");
    model.type_definitions.push(document);

    let err = fgadoc_domain::validation::validate_model(&model).unwrap_err();
    assert!(err.to_string().contains("without operands"), "{err}");
}
