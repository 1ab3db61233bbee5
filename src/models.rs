use chrono::{DateTime, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::StageRecommendation;

// Table names on the hosted datastore
pub const REQUIREMENTS_TABLE: &str = "requirements";
pub const SAVED_RESULTS_TABLE: &str = "saved_results";
pub const REMIXED_TECHNIQUES_TABLE: &str = "remixed_techniques";

// Project name given to results synthesized for remixes saved without one
pub const PLACEHOLDER_PROJECT_NAME: &str = "Untitled project";

// Generate a random 6-character alphanumeric ID for list items
pub fn short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

/// Project-definition answers collected by the questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_name: String,
    pub project_date: Option<NaiveDate>,
    pub problem_statement: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub output_types: Vec<String>,
    #[serde(default)]
    pub outcomes: Vec<String>,
    #[serde(default)]
    pub device_types: Vec<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub has_existing_users: Option<bool>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requirement {
    pub fn new(user_id: Uuid, project_name: String, project_date: NaiveDate, problem_statement: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            project_name,
            project_date: Some(project_date),
            problem_statement,
            role: None,
            output_types: Vec::new(),
            outcomes: Vec::new(),
            device_types: Vec::new(),
            project_type: None,
            has_existing_users: None,
            constraints: Vec::new(),
            deadline: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Recommendation record derived from a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requirement_id: Uuid,
    pub project_name: String,
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub output_types: Vec<String>,
    /// Recommended techniques per stage, in process order
    #[serde(default)]
    pub recommendations: Vec<StageRecommendation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedResult {
    pub fn from_requirement(requirement: &Requirement, recommendations: Vec<StageRecommendation>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: requirement.user_id,
            requirement_id: requirement.id,
            project_name: requirement.project_name.clone(),
            problem_statement: requirement.problem_statement.clone(),
            role: requirement.role.clone(),
            output_types: requirement.output_types.clone(),
            recommendations,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stand-in project for a remix saved without one. The requirement
    /// reference is a fresh id that points at no requirement row.
    pub fn placeholder(user_id: Uuid, project_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            requirement_id: Uuid::new_v4(),
            project_name: project_name.unwrap_or_else(|| PLACEHOLDER_PROJECT_NAME.to_string()),
            problem_statement: String::new(),
            role: None,
            output_types: Vec::new(),
            recommendations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A checkable prerequisite or execution step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(default = "short_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: short_id(),
            text: text.into(),
            checked: false,
        }
    }
}

/// File, link or note attached to a remix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default = "short_id")]
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A user's edited elaboration of one technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemixedTechnique {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub saved_result_id: Option<Uuid>,
    pub technique_name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub team_size: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub problem_statement: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<ChecklistItem>,
    #[serde(default)]
    pub execution_steps: Vec<ChecklistItem>,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default)]
    pub links: Vec<Attachment>,
    #[serde(default)]
    pub notes: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-submitted remix; ownership and timestamps are assigned server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemixDraft {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub saved_result_id: Option<Uuid>,
    /// Only used to name a synthesized placeholder project
    #[serde(default)]
    pub project_name: Option<String>,
    pub technique_name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub team_size: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub problem_statement: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<ChecklistItem>,
    #[serde(default)]
    pub execution_steps: Vec<ChecklistItem>,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default)]
    pub links: Vec<Attachment>,
    #[serde(default)]
    pub notes: Vec<Attachment>,
}

impl RemixDraft {
    pub fn into_remix(self, id: Uuid, user_id: Uuid, saved_result_id: Uuid, created_at: DateTime<Utc>) -> RemixedTechnique {
        RemixedTechnique {
            id,
            user_id,
            saved_result_id: Some(saved_result_id),
            technique_name: self.technique_name,
            date: self.date,
            duration: self.duration,
            team_size: self.team_size,
            role: self.role,
            why: self.why,
            overview: self.overview,
            problem_statement: self.problem_statement,
            prerequisites: self.prerequisites,
            execution_steps: self.execution_steps,
            files: self.files,
            links: self.links,
            notes: self.notes,
            created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Remix joined with its parent project's display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemixWithProject {
    #[serde(flatten)]
    pub remix: RemixedTechnique,
    pub project_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_generation() {
        let id = short_id();

        assert_eq!(id.len(), 6);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, short_id());
    }

    #[test]
    fn test_checklist_item_defaults_when_deserialized() {
        let item: ChecklistItem = serde_json::from_str(r#"{"text": "Recruit participants"}"#).unwrap();

        assert_eq!(item.text, "Recruit participants");
        assert!(!item.checked);
        assert_eq!(item.id.len(), 6);
    }

    #[test]
    fn test_placeholder_result_has_unlinked_requirement() {
        let user = Uuid::new_v4();
        let placeholder = SavedResult::placeholder(user, None);

        assert_eq!(placeholder.user_id, user);
        assert_eq!(placeholder.project_name, PLACEHOLDER_PROJECT_NAME);
        assert_ne!(placeholder.requirement_id, placeholder.id);
        assert!(placeholder.recommendations.is_empty());
    }

    #[test]
    fn test_requirement_dates_serialize_as_iso() {
        let requirement = Requirement::new(
            Uuid::new_v4(),
            "Checkout redesign".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            "Users abandon carts".to_string(),
        );
        let value = serde_json::to_value(&requirement).unwrap();

        assert_eq!(value["project_date"], "2024-03-09");
    }
}
