//! DSL printer: renders an AuthorizationModel back into OpenFGA DSL text.
//!
//! Relations, conditions and condition parameters are printed in name order,
//! so printing is deterministic for a given model. Parsing the printed text
//! yields a model equal to the input (up to provenance metadata, which the
//! single-file DSL cannot express).

use std::collections::BTreeMap;

use crate::error::{DomainError, DomainResult};

use super::{AuthorizationModel, Condition, ConditionParamTypeRef, RelationReference, Userset};

const INDENT: &str = "  ";

/// Print a model as DSL text.
pub fn print(model: &AuthorizationModel) -> DomainResult<String> {
    let mut lines = vec![
        "model".to_string(),
        format!("{INDENT}schema {}", model.schema_version),
    ];

    for type_def in &model.type_definitions {
        lines.push(String::new());
        lines.push(format!("type {}", type_def.type_name));

        let relations: BTreeMap<_, _> = type_def.relations.iter().flatten().collect();
        if relations.is_empty() {
            continue;
        }

        lines.push(format!("{INDENT}relations"));
        for (name, rewrite) in relations {
            let direct = type_def
                .metadata
                .as_ref()
                .and_then(|m| m.relations.as_ref())
                .and_then(|r| r.get(name))
                .and_then(|r| r.directly_related_user_types.as_deref());

            let expr = print_userset(rewrite, direct, true).map_err(|message| {
                DomainError::encoding(format!(
                    "unable to print DSL: {}#{}: {}",
                    type_def.type_name, name, message
                ))
            })?;
            lines.push(format!("{INDENT}{INDENT}define {name}: {expr}"));
        }
    }

    let conditions: BTreeMap<_, _> = model.conditions.iter().flatten().collect();
    for (name, condition) in conditions {
        lines.push(String::new());
        lines.extend(print_condition(name, condition)?);
    }

    lines.push(String::new());
    Ok(lines.join("\n"))
}

fn print_userset(
    userset: &Userset,
    direct: Option<&[RelationReference]>,
    top_level: bool,
) -> Result<String, String> {
    let joined = |children: &[Userset], operator: &str| -> Result<String, String> {
        let parts = children
            .iter()
            .map(|child| print_userset(child, direct, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(operator))
    };

    let (text, composite) = match userset {
        Userset::This => {
            let references = direct
                .filter(|refs| !refs.is_empty())
                .ok_or("direct assignment without type restrictions")?;
            let references: Vec<String> = references.iter().map(ToString::to_string).collect();
            (format!("[{}]", references.join(", ")), false)
        }
        Userset::ComputedUserset(target) => {
            if target.object.as_deref().is_some_and(|o| !o.is_empty()) {
                return Err("computed usersets on other objects cannot be expressed in the DSL".into());
            }
            (target.relation_name().to_string(), false)
        }
        Userset::TupleToUserset {
            tupleset,
            computed_userset,
        } => (
            format!(
                "{} from {}",
                computed_userset.relation_name(),
                tupleset.relation_name()
            ),
            false,
        ),
        Userset::Union { children } => (joined(children, " or ")?, children.len() > 1),
        Userset::Intersection { children } => (joined(children, " and ")?, children.len() > 1),
        Userset::Difference { base, subtract } => (
            format!(
                "{} but not {}",
                print_userset(base, direct, false)?,
                print_userset(subtract, direct, false)?
            ),
            true,
        ),
    };

    if composite && !top_level {
        Ok(format!("({text})"))
    } else {
        Ok(text)
    }
}

fn print_param_type(param: &ConditionParamTypeRef) -> DomainResult<String> {
    let keyword = param.type_name.dsl_keyword().ok_or_else(|| {
        DomainError::encoding(format!(
            "unable to print DSL: parameter type {} cannot be expressed in the DSL",
            param.type_name
        ))
    })?;

    match param.generic_types.as_deref() {
        Some([generic]) => Ok(format!("{keyword}<{}>", print_param_type(generic)?)),
        _ => Ok(keyword.to_string()),
    }
}

fn print_condition(name: &str, condition: &Condition) -> DomainResult<Vec<String>> {
    let parameters: BTreeMap<_, _> = condition.parameters.iter().flatten().collect();
    let parameters = parameters
        .into_iter()
        .map(|(param, param_type)| Ok(format!("{param}: {}", print_param_type(param_type)?)))
        .collect::<DomainResult<Vec<_>>>()?;

    let mut lines = vec![format!("condition {name}({}) {{", parameters.join(", "))];
    lines.extend(
        condition
            .expression
            .lines()
            .map(|line| format!("{INDENT}{}", line.trim())),
    );
    lines.push("}".to_string());
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse;

    const MODEL: &str = r#"model
  schema 1.1

type user

type group
  relations
    define member: [user, group#member]

type document
  relations
    define blocked: [user]
    define editor: [user with non_expired] and member from owner_group
    define owner_group: [group]
    define viewer: ([user, user:*] or editor) but not blocked

condition non_expired(expires_at: timestamp, now: timestamp) {
  now < expires_at
}
"#;

    #[test]
    fn test_print_reproduces_sorted_dsl() {
        let model = parse(MODEL).unwrap();
        assert_eq!(print(&model).unwrap(), MODEL);
    }

    #[test]
    fn test_print_then_parse_yields_equal_model() {
        let model = parse(MODEL).unwrap();
        let reparsed = parse(&print(&model).unwrap()).unwrap();
        assert_eq!(reparsed, model);
    }

    #[test]
    fn test_print_rejects_this_without_type_restrictions() {
        let mut model = AuthorizationModel::new("1.1");
        let mut doc = crate::model::TypeDefinition::new("document");
        doc.relations = Some([("viewer".to_string(), Userset::This)].into_iter().collect());
        model.type_definitions.push(doc);

        let err = print(&model).unwrap_err();
        assert!(matches!(err, DomainError::EncodingError { .. }), "{err}");
        assert!(err.to_string().contains("document#viewer"), "{err}");
    }

    #[test]
    fn test_print_rejects_unspecified_parameter_type() {
        let mut model = AuthorizationModel::new("1.1");
        let condition = Condition {
            name: "cond".to_string(),
            expression: "x".to_string(),
            parameters: Some(
                [(
                    "x".to_string(),
                    ConditionParamTypeRef::scalar(crate::model::TypeName::Unspecified),
                )]
                .into_iter()
                .collect(),
            ),
            metadata: None,
        };
        model.conditions = Some([("cond".to_string(), condition)].into_iter().collect());

        let err = print(&model).unwrap_err();
        assert!(matches!(err, DomainError::EncodingError { .. }), "{err}");
        assert!(err.to_string().contains("unable to print DSL"), "{err}");
    }
}
