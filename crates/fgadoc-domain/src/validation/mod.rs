//! Authorization model validation.
//!
//! Validates the structural invariants every model must satisfy before it
//! is canonicalized:
//! - The schema version is set
//! - Type names are non-empty and unique
//! - Unions and intersections have at least one operand
//! - Relation metadata only describes relations that exist
//! - Conditions referenced by type restrictions are declared

use std::collections::HashSet;

use crate::error::DomainError;
use crate::model::{AuthorizationModel, TypeDefinition, Userset};

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The model carries no schema version
    MissingSchemaVersion,
    /// A type definition has an empty name
    EmptyTypeName { index: usize },
    /// Two type definitions share a name
    DuplicateType { type_name: String },
    /// A union or intersection in a relation rewrite has no operands
    EmptyOperands {
        type_name: String,
        relation_name: String,
    },
    /// Metadata describes a relation the type does not define
    MetadataForUndefinedRelation {
        type_name: String,
        relation_name: String,
    },
    /// Condition referenced in a type restriction does not exist
    UndefinedCondition {
        type_name: String,
        relation_name: String,
        condition_name: String,
    },
    /// A condition is stored under a key different from its name
    ConditionNameMismatch { key: String, name: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingSchemaVersion => write!(f, "schema version must be set"),
            ValidationError::EmptyTypeName { index } => {
                write!(f, "type definition #{} has an empty type name", index)
            }
            ValidationError::DuplicateType { type_name } => {
                write!(f, "type '{}' is defined more than once", type_name)
            }
            ValidationError::EmptyOperands {
                type_name,
                relation_name,
            } => write!(
                f,
                "relation {}#{} has a union or intersection without operands",
                type_name, relation_name
            ),
            ValidationError::MetadataForUndefinedRelation {
                type_name,
                relation_name,
            } => write!(
                f,
                "metadata references relation '{}' which is not defined on type '{}'",
                relation_name, type_name
            ),
            ValidationError::UndefinedCondition {
                type_name,
                relation_name,
                condition_name,
            } => write!(
                f,
                "undefined condition '{}' referenced in {}#{}",
                condition_name, type_name, relation_name
            ),
            ValidationError::ConditionNameMismatch { key, name } => write!(
                f,
                "condition stored under '{}' is named '{}'",
                key, name
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

/// Model validator
#[derive(Debug)]
pub struct ModelValidator {
    /// All defined conditions in the model
    defined_conditions: HashSet<String>,
}

impl ModelValidator {
    /// Create a new validator for the given model
    pub fn new(model: &AuthorizationModel) -> Self {
        let defined_conditions = model
            .conditions
            .iter()
            .flat_map(|conditions| conditions.keys().cloned())
            .collect();

        Self { defined_conditions }
    }

    /// Validate the model and return every error found
    pub fn validate(&self, model: &AuthorizationModel) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if model.schema_version.trim().is_empty() {
            errors.push(ValidationError::MissingSchemaVersion);
        }

        let mut seen_types = HashSet::new();
        for (index, type_def) in model.type_definitions.iter().enumerate() {
            if type_def.type_name.is_empty() {
                errors.push(ValidationError::EmptyTypeName { index });
            } else if !seen_types.insert(type_def.type_name.as_str()) {
                errors.push(ValidationError::DuplicateType {
                    type_name: type_def.type_name.clone(),
                });
            }
            self.validate_type_definition(type_def, &mut errors);
        }

        for (key, condition) in model.conditions.iter().flatten() {
            if !condition.name.is_empty() && condition.name != *key {
                errors.push(ValidationError::ConditionNameMismatch {
                    key: key.clone(),
                    name: condition.name.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate the rewrites and metadata of a single type definition
    fn validate_type_definition(
        &self,
        type_def: &TypeDefinition,
        errors: &mut Vec<ValidationError>,
    ) {
        for (relation_name, rewrite) in type_def.relations.iter().flatten() {
            if has_empty_operands(rewrite) {
                errors.push(ValidationError::EmptyOperands {
                    type_name: type_def.type_name.clone(),
                    relation_name: relation_name.clone(),
                });
            }
        }

        let Some(relation_metadata) = type_def
            .metadata
            .as_ref()
            .and_then(|m| m.relations.as_ref())
        else {
            return;
        };

        for (relation_name, metadata) in relation_metadata {
            if type_def.relation(relation_name).is_none() {
                errors.push(ValidationError::MetadataForUndefinedRelation {
                    type_name: type_def.type_name.clone(),
                    relation_name: relation_name.clone(),
                });
            }

            let conditions = metadata
                .directly_related_user_types
                .iter()
                .flatten()
                .filter_map(|r| r.condition.as_deref())
                .filter(|c| !c.is_empty());
            for condition_name in conditions {
                if !self.defined_conditions.contains(condition_name) {
                    errors.push(ValidationError::UndefinedCondition {
                        type_name: type_def.type_name.clone(),
                        relation_name: relation_name.clone(),
                        condition_name: condition_name.to_string(),
                    });
                }
            }
        }
    }
}

fn has_empty_operands(userset: &Userset) -> bool {
    match userset {
        Userset::This | Userset::ComputedUserset(_) | Userset::TupleToUserset { .. } => false,
        Userset::Union { children } | Userset::Intersection { children } => {
            children.is_empty() || children.iter().any(has_empty_operands)
        }
        Userset::Difference { base, subtract } => {
            has_empty_operands(base) || has_empty_operands(subtract)
        }
    }
}

/// Validate a model, folding all violations into one [`DomainError`].
pub fn validate_model(model: &AuthorizationModel) -> Result<(), DomainError> {
    ModelValidator::new(model).validate(model).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        DomainError::parse(format!("invalid model: {}", messages.join("; ")))
    })
}
