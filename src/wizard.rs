use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FieldError, ProfolioError, ProfolioResult};
use crate::models::Requirement;

pub const MAX_PROJECT_NAME_LEN: usize = 120;
pub const MAX_TEXT_LEN: usize = 2000;

/// Questionnaire steps in the order the wizard presents them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStepKind {
    Basics,
    Role,
    Outputs,
    Outcomes,
    Context,
    Constraints,
}

/// Answers submitted for one questionnaire step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardStep {
    Basics {
        project_name: String,
        project_date: String,
        problem_statement: String,
    },
    Role {
        role: String,
    },
    Outputs {
        output_types: Vec<String>,
    },
    Outcomes {
        outcomes: Vec<String>,
    },
    Context {
        device_types: Vec<String>,
        project_type: String,
        has_existing_users: Option<bool>,
    },
    Constraints {
        #[serde(default)]
        constraints: Vec<String>,
        #[serde(default)]
        deadline: Option<String>,
    },
}

/// Parse a user-entered date into its canonical form. Accepts ISO dates,
/// RFC 3339 timestamps and US-style `MM/DD/YYYY`.
pub fn normalize_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(input, "%m/%d/%Y").ok()
}

fn clean_list(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|v| v == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &str, max_len: usize) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if value.chars().count() > max_len {
        errors.push(FieldError::new(field, format!("must be at most {} characters", max_len)));
    }
}

fn require_list(errors: &mut Vec<FieldError>, field: &str, values: &[String]) {
    if clean_list(values).is_empty() {
        errors.push(FieldError::new(field, "select at least one option"));
    }
}

fn into_result(errors: Vec<FieldError>) -> ProfolioResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProfolioError::Validation { fields: errors })
    }
}

impl WizardStep {
    pub fn kind(&self) -> WizardStepKind {
        match self {
            WizardStep::Basics { .. } => WizardStepKind::Basics,
            WizardStep::Role { .. } => WizardStepKind::Role,
            WizardStep::Outputs { .. } => WizardStepKind::Outputs,
            WizardStep::Outcomes { .. } => WizardStepKind::Outcomes,
            WizardStep::Context { .. } => WizardStepKind::Context,
            WizardStep::Constraints { .. } => WizardStepKind::Constraints,
        }
    }

    /// Field-level validation of the step on its own
    pub fn validate(&self) -> ProfolioResult<()> {
        let mut errors = Vec::new();

        match self {
            WizardStep::Basics { project_name, project_date, problem_statement } => {
                require_text(&mut errors, "project_name", project_name, MAX_PROJECT_NAME_LEN);
                if normalize_date(project_date).is_none() {
                    errors.push(FieldError::new("project_date", "must be a valid date"));
                }
                require_text(&mut errors, "problem_statement", problem_statement, MAX_TEXT_LEN);
            }
            WizardStep::Role { role } => {
                require_text(&mut errors, "role", role, MAX_PROJECT_NAME_LEN);
            }
            WizardStep::Outputs { output_types } => {
                require_list(&mut errors, "output_types", output_types);
            }
            WizardStep::Outcomes { outcomes } => {
                require_list(&mut errors, "outcomes", outcomes);
            }
            WizardStep::Context { device_types, project_type, has_existing_users } => {
                require_list(&mut errors, "device_types", device_types);
                require_text(&mut errors, "project_type", project_type, MAX_PROJECT_NAME_LEN);
                if has_existing_users.is_none() {
                    errors.push(FieldError::new("has_existing_users", "is required"));
                }
            }
            WizardStep::Constraints { deadline, .. } => {
                if let Some(deadline) = deadline.as_deref().filter(|d| !d.trim().is_empty()) {
                    if normalize_date(deadline).is_none() {
                        errors.push(FieldError::new("deadline", "must be a valid date"));
                    }
                }
            }
        }

        into_result(errors)
    }

    /// Create a requirement from the first step
    pub fn into_requirement(self, user_id: Uuid) -> ProfolioResult<Requirement> {
        self.validate()?;

        match self {
            WizardStep::Basics { project_name, project_date, problem_statement } => {
                let date = normalize_date(&project_date)
                    .ok_or_else(|| ProfolioError::validation("project_date", "must be a valid date"))?;
                Ok(Requirement::new(
                    user_id,
                    project_name.trim().to_string(),
                    date,
                    problem_statement.trim().to_string(),
                ))
            }
            other => Err(ProfolioError::validation(
                "step",
                format!("a requirement must start with the basics step, got {:?}", other.kind()),
            )),
        }
    }

    /// Validate the step and write its answers into the requirement. The
    /// requirement is left untouched when the step is rejected.
    pub fn apply_to(self, requirement: &mut Requirement) -> ProfolioResult<()> {
        self.validate()?;
        let mut updated = requirement.clone();

        match self {
            WizardStep::Basics { project_name, project_date, problem_statement } => {
                updated.project_name = project_name.trim().to_string();
                updated.project_date = normalize_date(&project_date);
                updated.problem_statement = problem_statement.trim().to_string();
            }
            WizardStep::Role { role } => {
                updated.role = Some(role.trim().to_string());
            }
            WizardStep::Outputs { output_types } => {
                updated.output_types = clean_list(&output_types);
            }
            WizardStep::Outcomes { outcomes } => {
                updated.outcomes = clean_list(&outcomes);
            }
            WizardStep::Context { device_types, project_type, has_existing_users } => {
                updated.device_types = clean_list(&device_types);
                updated.project_type = Some(project_type.trim().to_string());
                updated.has_existing_users = has_existing_users;
            }
            WizardStep::Constraints { constraints, deadline } => {
                updated.constraints = clean_list(&constraints);
                updated.deadline = deadline
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .and_then(normalize_date);
            }
        }

        // either step can move one date past the other
        if let (Some(deadline), Some(start)) = (updated.deadline, updated.project_date) {
            if deadline < start {
                return Err(ProfolioError::validation(
                    "deadline",
                    "must not be before the project date",
                ));
            }
        }

        updated.updated_at = Utc::now();
        *requirement = updated;
        Ok(())
    }
}

/// Required fields the requirement is still missing
pub fn missing_fields(requirement: &Requirement) -> Vec<FieldError> {
    let mut missing = Vec::new();

    if requirement.project_name.trim().is_empty() {
        missing.push(FieldError::new("project_name", "is required"));
    }
    if requirement.project_date.is_none() {
        missing.push(FieldError::new("project_date", "is required"));
    }
    if requirement.problem_statement.trim().is_empty() {
        missing.push(FieldError::new("problem_statement", "is required"));
    }
    if requirement.role.as_deref().map_or(true, |r| r.trim().is_empty()) {
        missing.push(FieldError::new("role", "is required"));
    }
    if requirement.output_types.is_empty() {
        missing.push(FieldError::new("output_types", "select at least one option"));
    }
    if requirement.outcomes.is_empty() {
        missing.push(FieldError::new("outcomes", "select at least one option"));
    }
    if requirement.device_types.is_empty() {
        missing.push(FieldError::new("device_types", "select at least one option"));
    }
    if requirement.project_type.is_none() {
        missing.push(FieldError::new("project_type", "is required"));
    }
    if requirement.has_existing_users.is_none() {
        missing.push(FieldError::new("has_existing_users", "is required"));
    }

    missing
}

/// The first step whose answers are still missing, if any
pub fn next_step(requirement: &Requirement) -> Option<WizardStepKind> {
    let missing = missing_fields(requirement);
    let has = |field: &str| missing.iter().any(|f| f.field == field);

    if has("project_name") || has("project_date") || has("problem_statement") {
        Some(WizardStepKind::Basics)
    } else if has("role") {
        Some(WizardStepKind::Role)
    } else if has("output_types") {
        Some(WizardStepKind::Outputs)
    } else if has("outcomes") {
        Some(WizardStepKind::Outcomes)
    } else if has("device_types") || has("project_type") || has("has_existing_users") {
        Some(WizardStepKind::Context)
    } else {
        None
    }
}

/// Recommendations are only produced for a fully answered questionnaire
pub fn ensure_complete(requirement: &Requirement) -> ProfolioResult<()> {
    into_result(missing_fields(requirement))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basics() -> WizardStep {
        WizardStep::Basics {
            project_name: "  Checkout redesign ".to_string(),
            project_date: "2024-03-09".to_string(),
            problem_statement: "Users abandon carts at the payment step".to_string(),
        }
    }

    fn complete_requirement() -> Requirement {
        let mut requirement = basics().into_requirement(Uuid::new_v4()).unwrap();
        let steps = vec![
            WizardStep::Role { role: "Lead designer".to_string() },
            WizardStep::Outputs { output_types: vec!["Wireframe".to_string(), "UI Design".to_string()] },
            WizardStep::Outcomes { outcomes: vec!["Higher conversion".to_string()] },
            WizardStep::Context {
                device_types: vec!["Mobile".to_string()],
                project_type: "Redesign".to_string(),
                has_existing_users: Some(true),
            },
        ];
        for step in steps {
            step.apply_to(&mut requirement).unwrap();
        }
        requirement
    }

    #[test]
    fn test_normalize_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(normalize_date("2024-03-09"), Some(expected));
        assert_eq!(normalize_date("2024-03-09T10:30:00Z"), Some(expected));
        assert_eq!(normalize_date("03/09/2024"), Some(expected));
        assert_eq!(normalize_date("next tuesday"), None);
    }

    #[test]
    fn test_basics_creates_requirement() {
        let user = Uuid::new_v4();
        let requirement = basics().into_requirement(user).unwrap();

        assert_eq!(requirement.user_id, user);
        assert_eq!(requirement.project_name, "Checkout redesign");
        assert_eq!(next_step(&requirement), Some(WizardStepKind::Role));
    }

    #[test]
    fn test_requirement_must_start_with_basics() {
        let step = WizardStep::Role { role: "Researcher".to_string() };

        assert!(matches!(
            step.into_requirement(Uuid::new_v4()),
            Err(ProfolioError::Validation { .. })
        ));
    }

    #[test]
    fn test_basics_validation_lists_every_field() {
        let step = WizardStep::Basics {
            project_name: " ".to_string(),
            project_date: "soon".to_string(),
            problem_statement: String::new(),
        };

        match step.validate() {
            Err(ProfolioError::Validation { fields }) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["project_name", "project_date", "problem_statement"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_outputs_are_trimmed_and_deduplicated() {
        let mut requirement = basics().into_requirement(Uuid::new_v4()).unwrap();
        WizardStep::Outputs {
            output_types: vec![" Wireframe".to_string(), "Wireframe".to_string(), "".to_string()],
        }
        .apply_to(&mut requirement)
        .unwrap();

        assert_eq!(requirement.output_types, vec!["Wireframe"]);
    }

    #[test]
    fn test_deadline_cannot_precede_project_date() {
        let mut requirement = basics().into_requirement(Uuid::new_v4()).unwrap();
        let result = WizardStep::Constraints {
            constraints: vec![],
            deadline: Some("2024-01-01".to_string()),
        }
        .apply_to(&mut requirement);

        assert!(result.is_err());
        assert!(requirement.deadline.is_none());
    }

    #[test]
    fn test_moving_project_date_past_deadline_is_rejected() {
        let mut requirement = basics().into_requirement(Uuid::new_v4()).unwrap();
        WizardStep::Constraints {
            constraints: vec!["Budget".to_string()],
            deadline: Some("2024-04-01".to_string()),
        }
        .apply_to(&mut requirement)
        .unwrap();

        let result = WizardStep::Basics {
            project_name: "Checkout redesign".to_string(),
            project_date: "2024-12-01".to_string(),
            problem_statement: "Users abandon carts at the payment step".to_string(),
        }
        .apply_to(&mut requirement);

        match result {
            Err(ProfolioError::Validation { fields }) => assert_eq!(fields[0].field, "deadline"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(requirement.project_date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(requirement.deadline, NaiveDate::from_ymd_opt(2024, 4, 1));
    }

    #[test]
    fn test_complete_requirement() {
        let requirement = complete_requirement();

        assert_eq!(next_step(&requirement), None);
        assert!(ensure_complete(&requirement).is_ok());
    }

    #[test]
    fn test_incomplete_requirement_reports_missing_fields() {
        let requirement = basics().into_requirement(Uuid::new_v4()).unwrap();

        match ensure_complete(&requirement) {
            Err(ProfolioError::Validation { fields }) => {
                assert!(fields.iter().any(|f| f.field == "role"));
                assert!(fields.iter().any(|f| f.field == "output_types"));
                assert!(!fields.iter().any(|f| f.field == "project_name"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_step_payload_is_tagged() {
        let step: WizardStep = serde_json::from_str(
            r#"{"step": "constraints", "constraints": ["Budget"], "deadline": "2024-06-01"}"#,
        )
        .unwrap();

        assert_eq!(step.kind(), WizardStepKind::Constraints);
    }
}
