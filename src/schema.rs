use jsonschema::JSONSchema;
use serde_json::{json, Value};

use crate::errors::{FieldError, ProfolioError, ProfolioResult};

/// Validate `instance` against `schema`, reporting each offending location.
///
/// Errors at the document root are reported under the field name `"$"`.
pub fn validate(schema: &Value, instance: &Value) -> ProfolioResult<()> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| ProfolioError::Config(format!("Invalid schema: {}", e)))?;

    let fields: Vec<FieldError> = match compiled.validate(instance) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let field = if path.is_empty() {
                    "$".to_string()
                } else {
                    path.trim_start_matches('/').replace('/', ".")
                };
                FieldError::new(field, error.to_string())
            })
            .collect(),
    };

    Err(ProfolioError::Validation { fields })
}

fn link_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "minLength": 1 },
            "url": { "type": "string", "minLength": 1 }
        },
        "required": ["title", "url"]
    })
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

pub fn technique_detail_input() -> Value {
    json!({
        "type": "object",
        "properties": {
            "technique_name": {
                "type": "string",
                "minLength": 1,
                "description": "Name of the UX technique to expand"
            }
        },
        "required": ["technique_name"]
    })
}

pub fn technique_detail_output() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overview": { "type": "string", "minLength": 1 },
            "prerequisites": string_list(),
            "execution_steps": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "step_number": { "type": "integer", "minimum": 1 },
                        "title": { "type": "string", "minLength": 1 },
                        "description": { "type": "string" }
                    },
                    "required": ["step_number", "title", "description"]
                }
            },
            "resources": {
                "type": "object",
                "properties": {
                    "creation_tools": { "type": "array", "items": link_schema() },
                    "guides": { "type": "array", "items": link_schema() }
                },
                "required": ["creation_tools", "guides"]
            },
            "time_estimate": { "type": "string" },
            "best_for": string_list(),
            "tips": string_list()
        },
        "required": ["overview", "prerequisites", "execution_steps", "resources"]
    })
}

fn checklist_entry() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": { "type": "string" },
            "checked": { "type": "boolean" }
        },
        "required": ["text", "checked"]
    })
}

pub fn full_portfolio_input() -> Value {
    json!({
        "type": "object",
        "properties": {
            "techniques": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "project_name": { "type": "string", "minLength": 1 },
                        "technique_name": { "type": "string", "minLength": 1 },
                        "date": { "type": ["string", "null"] },
                        "duration": { "type": ["string", "null"] },
                        "team_size": { "type": ["string", "null"] },
                        "role": { "type": ["string", "null"] },
                        "why": { "type": ["string", "null"] },
                        "overview": { "type": ["string", "null"] },
                        "problem_statement": { "type": ["string", "null"] },
                        "prerequisites": { "type": "array", "items": checklist_entry() },
                        "execution_steps": { "type": "array", "items": checklist_entry() }
                    },
                    "required": ["project_name", "technique_name", "prerequisites", "execution_steps"]
                }
            }
        },
        "required": ["techniques"]
    })
}

pub fn full_portfolio_output() -> Value {
    json!({
        "type": "object",
        "properties": {
            "projects": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "project_name": { "type": "string", "minLength": 1 },
                        "tags": string_list(),
                        "metadata": {
                            "type": "object",
                            "properties": {
                                "date": { "type": ["string", "null"] },
                                "duration": { "type": ["string", "null"] },
                                "team_size": { "type": ["string", "null"] },
                                "role": { "type": ["string", "null"] }
                            }
                        },
                        "overview": { "type": "string" },
                        "problem_statement": { "type": "string" },
                        "why": { "type": ["string", "null"] },
                        "techniques": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "technique_name": { "type": "string", "minLength": 1 },
                                    "prerequisites": string_list(),
                                    "execution_steps": string_list()
                                },
                                "required": ["technique_name", "prerequisites", "execution_steps"]
                            }
                        },
                        "impact": { "type": "string" }
                    },
                    "required": ["project_name", "tags", "metadata", "overview", "problem_statement", "techniques", "impact"]
                }
            }
        },
        "required": ["projects"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_technique_input() {
        assert!(validate(&technique_detail_input(), &json!({ "technique_name": "Card Sorting" })).is_ok());
    }

    #[test]
    fn test_missing_required_field_reported_at_root() {
        match validate(&technique_detail_input(), &json!({})) {
            Err(ProfolioError::Validation { fields }) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "$");
                assert!(fields[0].message.contains("technique_name"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_errors_use_dotted_paths() {
        let output = json!({
            "overview": "Sort cards",
            "prerequisites": [],
            "execution_steps": [{ "step_number": 0, "title": "Recruit", "description": "" }],
            "resources": { "creation_tools": [], "guides": [] }
        });

        match validate(&technique_detail_output(), &output) {
            Err(ProfolioError::Validation { fields }) => {
                assert_eq!(fields[0].field, "execution_steps.0.step_number");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_portfolio_input_requires_a_technique() {
        assert!(validate(&full_portfolio_input(), &json!({ "techniques": [] })).is_err());
    }
}
