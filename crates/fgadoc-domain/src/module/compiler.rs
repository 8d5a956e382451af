//! Multi-file model compiler.
//!
//! Combines module files into one [`AuthorizationModel`]. Type definitions
//! keep file order. `extend type` blocks are applied after every file has
//! been read, so a module may extend a type declared in a later file.
//! Everything a module contributes carries its provenance: the module name
//! and the file it came from.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::model::{
    parse_module, AuthorizationModel, Condition, ConditionMetadata, Metadata, SourceInfo,
    TypeDefinition,
};

use super::ModuleFile;

/// An `extend type` block waiting for its base type.
struct PendingExtension<'f> {
    file: &'f str,
    module: String,
    definition: TypeDefinition,
}

/// Compiles module files into a single model with the given schema version.
pub fn compile_modules(
    files: &[ModuleFile],
    schema_version: &str,
) -> DomainResult<AuthorizationModel> {
    let mut type_definitions: Vec<TypeDefinition> = Vec::new();
    let mut declared: HashMap<String, usize> = HashMap::new();
    let mut conditions: HashMap<String, Condition> = HashMap::new();
    let mut extensions = Vec::new();

    for file in files {
        let document = parse_module(&file.contents)
            .map_err(|e| DomainError::parse(format!("{}: {}", file.name, e)))?;
        debug!(
            file = %file.name,
            module = %document.module,
            types = document.types.len(),
            conditions = document.conditions.len(),
            "Parsed module file"
        );

        for type_def in document.types {
            if type_def.extends {
                extensions.push(PendingExtension {
                    file: &file.name,
                    module: document.module.clone(),
                    definition: type_def.definition,
                });
                continue;
            }

            let mut definition = type_def.definition;
            if declared.contains_key(&definition.type_name) {
                return Err(DomainError::parse(format!(
                    "{}: duplicate type definition '{}'",
                    file.name, definition.type_name
                )));
            }

            let metadata = definition.metadata.get_or_insert_with(Metadata::default);
            metadata.module = Some(document.module.clone());
            metadata.source_info = Some(SourceInfo::file(&file.name));

            declared.insert(definition.type_name.clone(), type_definitions.len());
            type_definitions.push(definition);
        }

        for mut condition in document.conditions {
            if conditions.contains_key(&condition.name) {
                return Err(DomainError::parse(format!(
                    "{}: duplicate condition '{}'",
                    file.name, condition.name
                )));
            }
            condition.metadata = Some(ConditionMetadata {
                module: Some(document.module.clone()),
                source_info: Some(SourceInfo::file(&file.name)),
            });
            conditions.insert(condition.name.clone(), condition);
        }
    }

    for extension in extensions {
        let type_name = &extension.definition.type_name;
        let index = declared.get(type_name).copied().ok_or_else(|| {
            DomainError::parse(format!(
                "{}: extended type '{}' is not declared in any module",
                extension.file, type_name
            ))
        })?;
        apply_extension(&mut type_definitions[index], extension)?;
    }

    Ok(AuthorizationModel {
        id: None,
        schema_version: schema_version.to_string(),
        type_definitions,
        conditions: Some(conditions),
    })
}

fn apply_extension(target: &mut TypeDefinition, extension: PendingExtension<'_>) -> DomainResult<()> {
    let PendingExtension {
        file,
        module,
        definition,
    } = extension;

    let mut relation_metadata = definition
        .metadata
        .and_then(|m| m.relations)
        .unwrap_or_default();

    for (name, rewrite) in definition.relations.into_iter().flatten() {
        let relations = target.relations.get_or_insert_with(HashMap::new);
        if relations.contains_key(&name) {
            return Err(DomainError::parse(format!(
                "{}: relation '{}' already exists on type '{}'",
                file, name, target.type_name
            )));
        }
        relations.insert(name.clone(), rewrite);

        let mut metadata = relation_metadata.remove(&name).unwrap_or_default();
        metadata.module = Some(module.clone());
        metadata.source_info = Some(SourceInfo::file(file));
        target
            .metadata
            .get_or_insert_with(Metadata::default)
            .relations
            .get_or_insert_with(HashMap::new)
            .insert(name, metadata);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationReference, Userset};

    fn file(name: &str, contents: &str) -> ModuleFile {
        ModuleFile {
            name: name.to_string(),
            contents: contents.to_string(),
        }
    }

    fn core() -> ModuleFile {
        file(
            "core.fga",
            r#"module core

type user

type organization
  relations
    define member: [user]
    define admin: [user with in_office]

condition in_office(ip: ipaddress) {
  ip.in_cidr("10.0.0.0/8")
}
"#,
        )
    }

    fn tracker() -> ModuleFile {
        file(
            "tracker/projects.fga",
            r#"module issue-tracker

extend type organization
  relations
    define can_create_project: admin or member

type project
  relations
    define organization: [organization]
    define viewer: member from organization
"#,
        )
    }

    #[test]
    fn test_compile_merges_types_in_file_order() {
        let model = compile_modules(&[core(), tracker()], "1.2").unwrap();

        assert_eq!(model.schema_version, "1.2");
        let names: Vec<_> = model
            .type_definitions
            .iter()
            .map(|t| t.type_name.as_str())
            .collect();
        assert_eq!(names, vec!["user", "organization", "project"]);
    }

    #[test]
    fn test_compile_records_type_provenance() {
        let model = compile_modules(&[core(), tracker()], "1.2").unwrap();

        let project = model.type_definition("project").unwrap();
        let metadata = project.metadata.as_ref().unwrap();
        assert_eq!(metadata.module.as_deref(), Some("issue-tracker"));
        assert_eq!(
            metadata.source_info,
            Some(SourceInfo::file("tracker/projects.fga"))
        );

        // types without relations still carry provenance
        let user = model.type_definition("user").unwrap();
        assert_eq!(
            user.metadata.as_ref().unwrap().module.as_deref(),
            Some("core")
        );
    }

    #[test]
    fn test_compile_applies_extension_with_relation_provenance() {
        let model = compile_modules(&[core(), tracker()], "1.2").unwrap();

        let org = model.type_definition("organization").unwrap();
        assert_eq!(
            org.relation("can_create_project"),
            Some(&Userset::Union {
                children: vec![Userset::computed("admin"), Userset::computed("member")]
            })
        );

        let relations = org.metadata.as_ref().unwrap().relations.as_ref().unwrap();
        let extended = &relations["can_create_project"];
        assert_eq!(extended.module.as_deref(), Some("issue-tracker"));
        assert_eq!(
            extended.source_info,
            Some(SourceInfo::file("tracker/projects.fga"))
        );

        let own = &relations["member"];
        assert_eq!(own.module, None);
        assert_eq!(
            own.directly_related_user_types,
            Some(vec![RelationReference::direct("user")])
        );
    }

    #[test]
    fn test_compile_allows_extension_before_declaration() {
        let model = compile_modules(&[tracker(), core()], "1.2").unwrap();
        let org = model.type_definition("organization").unwrap();
        assert!(org.relation("can_create_project").is_some());
    }

    #[test]
    fn test_compile_records_condition_provenance() {
        let model = compile_modules(&[core()], "1.2").unwrap();
        let conditions = model.conditions.unwrap();
        let metadata = conditions["in_office"].metadata.clone().unwrap();
        assert_eq!(metadata.module.as_deref(), Some("core"));
        assert_eq!(metadata.source_info, Some(SourceInfo::file("core.fga")));
    }

    #[test]
    fn test_compile_rejects_conflicts() {
        let duplicate_type = file("dup.fga", "module dup\n\ntype user\n");
        let err = compile_modules(&[core(), duplicate_type], "1.2").unwrap_err();
        assert!(err.to_string().contains("duplicate type definition 'user'"), "{err}");

        let undeclared = file(
            "ext.fga",
            "module ext\n\nextend type team\n  relations\n    define member: [user]\n",
        );
        let err = compile_modules(&[core(), undeclared], "1.2").unwrap_err();
        assert!(err.to_string().contains("extended type 'team'"), "{err}");

        let clash = file(
            "ext.fga",
            "module ext\n\nextend type organization\n  relations\n    define member: [user]\n",
        );
        let err = compile_modules(&[core(), clash], "1.2").unwrap_err();
        assert!(err.to_string().contains("relation 'member' already exists"), "{err}");

        let duplicate_condition = file(
            "cond.fga",
            "module cond\n\ncondition in_office(ip: ipaddress) {\n  true\n}\n",
        );
        let err = compile_modules(&[core(), duplicate_condition], "1.2").unwrap_err();
        assert!(err.to_string().contains("duplicate condition 'in_office'"), "{err}");
    }

    #[test]
    fn test_compile_requires_module_declaration() {
        let plain = file("plain.fga", "model\n  schema 1.1\n\ntype user\n");
        let err = compile_modules(&[plain], "1.2").unwrap_err();
        assert!(err.to_string().contains("plain.fga"), "{err}");
        assert!(err.to_string().contains("module"), "{err}");
    }
}
