use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::datastore::{from_rows, to_row, Datastore, Filter};
use crate::errors::{ProfolioError, ProfolioResult};
use crate::models::{Requirement, REQUIREMENTS_TABLE};

/// Owner-scoped access to questionnaire answers
#[derive(Clone)]
pub struct RequirementStore {
    store: Arc<dyn Datastore>,
}

fn owned(id: Uuid, owner: Uuid) -> [Filter; 2] {
    [Filter::eq("id", id), Filter::eq("user_id", owner)]
}

impl RequirementStore {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Insert a requirement owned by `owner`, whatever owner it claims
    pub async fn create(&self, mut requirement: Requirement, owner: Uuid) -> ProfolioResult<Requirement> {
        requirement.user_id = owner;
        let row = self.store.insert(REQUIREMENTS_TABLE, to_row(&requirement)?).await?;
        info!("Created requirement {} for {}", requirement.id, owner);
        Ok(serde_json::from_value(row)?)
    }

    pub async fn get(&self, id: Uuid, owner: Uuid) -> ProfolioResult<Requirement> {
        let rows = self.store.select(REQUIREMENTS_TABLE, &owned(id, owner)).await?;
        from_rows::<Requirement>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ProfolioError::not_found("requirement", id))
    }

    /// Newest first
    pub async fn list(&self, owner: Uuid) -> ProfolioResult<Vec<Requirement>> {
        let rows = self
            .store
            .select(REQUIREMENTS_TABLE, &[Filter::eq("user_id", owner)])
            .await?;
        let mut requirements: Vec<Requirement> = from_rows(rows)?;
        requirements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requirements)
    }

    /// Replace the whole record
    pub async fn update(&self, mut requirement: Requirement, owner: Uuid) -> ProfolioResult<Requirement> {
        requirement.user_id = owner;
        requirement.updated_at = Utc::now();

        let rows = self
            .store
            .update(REQUIREMENTS_TABLE, &owned(requirement.id, owner), to_row(&requirement)?)
            .await?;
        from_rows::<Requirement>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ProfolioError::not_found("requirement", requirement.id))
    }

    pub async fn delete(&self, id: Uuid, owner: Uuid) -> ProfolioResult<()> {
        match self.store.delete(REQUIREMENTS_TABLE, &owned(id, owner)).await? {
            0 => Err(ProfolioError::not_found("requirement", id)),
            _ => Ok(()),
        }
    }

    pub async fn delete_all(&self, owner: Uuid) -> ProfolioResult<usize> {
        self.store
            .delete(REQUIREMENTS_TABLE, &[Filter::eq("user_id", owner)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::MemoryDatastore;
    use crate::wizard::WizardStep;

    fn store() -> RequirementStore {
        RequirementStore::new(Arc::new(MemoryDatastore::new()))
    }

    fn draft(owner: Uuid) -> Requirement {
        WizardStep::Basics {
            project_name: "Checkout redesign".to_string(),
            project_date: "2024-03-09T08:00:00Z".to_string(),
            problem_statement: "Users abandon carts".to_string(),
        }
        .into_requirement(owner)
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let store = store();
        let owner = Uuid::new_v4();
        let mut requirement = draft(owner);
        requirement.output_types = vec!["Wireframe".to_string()];
        requirement.deadline = chrono::NaiveDate::from_ymd_opt(2024, 6, 1);

        let created = store.create(requirement.clone(), owner).await.unwrap();
        let fetched = store.get(created.id, owner).await.unwrap();

        assert_eq!(fetched, requirement);
        assert_eq!(
            serde_json::to_value(&fetched).unwrap()["project_date"],
            "2024-03-09"
        );
    }

    #[tokio::test]
    async fn test_create_assigns_caller_as_owner() {
        let store = store();
        let owner = Uuid::new_v4();
        let created = store.create(draft(Uuid::new_v4()), owner).await.unwrap();

        assert_eq!(created.user_id, owner);
    }

    #[tokio::test]
    async fn test_foreign_caller_sees_nothing() {
        let store = store();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let created = store.create(draft(owner), owner).await.unwrap();

        assert!(matches!(store.get(created.id, intruder).await, Err(ProfolioError::NotFound(_))));
        assert!(matches!(
            store.update(created.clone(), intruder).await,
            Err(ProfolioError::NotFound(_))
        ));
        assert!(matches!(store.delete(created.id, intruder).await, Err(ProfolioError::NotFound(_))));
        assert!(store.list(intruder).await.unwrap().is_empty());

        // the owner's record is untouched
        assert_eq!(store.get(created.id, owner).await.unwrap().project_name, "Checkout redesign");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = store();
        let owner = Uuid::new_v4();
        let mut created = store.create(draft(owner), owner).await.unwrap();

        created.role = Some("Researcher".to_string());
        let updated = store.update(created.clone(), owner).await.unwrap();
        assert_eq!(updated.role.as_deref(), Some("Researcher"));
        assert!(updated.updated_at >= created.updated_at);

        store.delete(created.id, owner).await.unwrap();
        assert!(matches!(store.get(created.id, owner).await, Err(ProfolioError::NotFound(_))));
    }
}
