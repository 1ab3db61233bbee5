use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::catalog::StageRecommendation;
use crate::datastore::{from_rows, to_row, Datastore, Filter};
use crate::errors::{ProfolioError, ProfolioResult};
use crate::models::{Requirement, SavedResult, SAVED_RESULTS_TABLE};

/// Owner-scoped access to saved recommendation results
#[derive(Clone)]
pub struct ResultStore {
    store: Arc<dyn Datastore>,
}

fn owned(id: Uuid, owner: Uuid) -> [Filter; 2] {
    [Filter::eq("id", id), Filter::eq("user_id", owner)]
}

impl ResultStore {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, id: Uuid, owner: Uuid) -> ProfolioResult<Option<SavedResult>> {
        let rows = self.store.select(SAVED_RESULTS_TABLE, &owned(id, owner)).await?;
        Ok(from_rows::<SavedResult>(rows)?.into_iter().next())
    }

    pub async fn get(&self, id: Uuid, owner: Uuid) -> ProfolioResult<SavedResult> {
        self.find(id, owner)
            .await?
            .ok_or_else(|| ProfolioError::not_found("result", id))
    }

    /// Newest first
    pub async fn list(&self, owner: Uuid) -> ProfolioResult<Vec<SavedResult>> {
        let rows = self
            .store
            .select(SAVED_RESULTS_TABLE, &[Filter::eq("user_id", owner)])
            .await?;
        let mut results: Vec<SavedResult> = from_rows(rows)?;
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    pub async fn find_by_requirement(&self, requirement_id: Uuid, owner: Uuid) -> ProfolioResult<Option<SavedResult>> {
        let rows = self
            .store
            .select(
                SAVED_RESULTS_TABLE,
                &[Filter::eq("requirement_id", requirement_id), Filter::eq("user_id", owner)],
            )
            .await?;
        Ok(from_rows::<SavedResult>(rows)?.into_iter().next())
    }

    pub async fn insert(&self, mut result: SavedResult, owner: Uuid) -> ProfolioResult<SavedResult> {
        result.user_id = owner;
        let row = self.store.insert(SAVED_RESULTS_TABLE, to_row(&result)?).await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn update(&self, mut result: SavedResult, owner: Uuid) -> ProfolioResult<SavedResult> {
        result.user_id = owner;
        result.updated_at = Utc::now();

        let rows = self
            .store
            .update(SAVED_RESULTS_TABLE, &owned(result.id, owner), to_row(&result)?)
            .await?;
        from_rows::<SavedResult>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ProfolioError::not_found("result", result.id))
    }

    /// Update the result already saved for this requirement, or insert one.
    ///
    /// This is a find-then-write sequence with no uniqueness constraint
    /// behind it: two concurrent saves for the same requirement can both miss
    /// the lookup and insert two rows. Sequential saves always converge on a
    /// single row.
    pub async fn save_or_update_for_requirement(
        &self,
        requirement: &Requirement,
        recommendations: Vec<StageRecommendation>,
        owner: Uuid,
    ) -> ProfolioResult<SavedResult> {
        let fresh = SavedResult::from_requirement(requirement, recommendations);

        match self.find_by_requirement(requirement.id, owner).await? {
            Some(existing) => {
                info!("Updating result {} for requirement {}", existing.id, requirement.id);
                let updated = SavedResult {
                    id: existing.id,
                    created_at: existing.created_at,
                    ..fresh
                };
                self.update(updated, owner).await
            }
            None => {
                info!("Saving new result for requirement {}", requirement.id);
                self.insert(fresh, owner).await
            }
        }
    }

    /// Result standing in for a project that was never defined through the wizard
    pub async fn create_placeholder(&self, owner: Uuid, project_name: Option<String>) -> ProfolioResult<SavedResult> {
        let placeholder = SavedResult::placeholder(owner, project_name);
        info!("Synthesizing placeholder result {} for {}", placeholder.id, owner);
        self.insert(placeholder, owner).await
    }

    pub async fn delete(&self, id: Uuid, owner: Uuid) -> ProfolioResult<()> {
        match self.store.delete(SAVED_RESULTS_TABLE, &owned(id, owner)).await? {
            0 => Err(ProfolioError::not_found("result", id)),
            _ => Ok(()),
        }
    }

    pub async fn delete_all(&self, owner: Uuid) -> ProfolioResult<usize> {
        self.store
            .delete(SAVED_RESULTS_TABLE, &[Filter::eq("user_id", owner)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::datastore::MemoryDatastore;
    use chrono::NaiveDate;

    fn requirement(owner: Uuid) -> Requirement {
        let mut requirement = Requirement::new(
            owner,
            "Checkout redesign".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            "Users abandon carts".to_string(),
        );
        requirement.output_types = vec!["Wireframe".to_string()];
        requirement
    }

    #[tokio::test]
    async fn test_sequential_saves_keep_one_row() {
        let datastore = Arc::new(MemoryDatastore::new());
        let store = ResultStore::new(datastore.clone());
        let owner = Uuid::new_v4();
        let mut requirement = requirement(owner);

        let first = store
            .save_or_update_for_requirement(&requirement, catalog::recommend_by_stage(&requirement.output_types), owner)
            .await
            .unwrap();

        requirement.output_types.push("UI Design".to_string());
        let second = store
            .save_or_update_for_requirement(&requirement, catalog::recommend_by_stage(&requirement.output_types), owner)
            .await
            .unwrap();

        assert_eq!(datastore.row_count(SAVED_RESULTS_TABLE), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.output_types, vec!["Wireframe", "UI Design"]);
        let stages: Vec<&str> = second.recommendations.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(stages, vec!["Define", "Ideate", "Prototype", "Test"]);
    }

    #[tokio::test]
    async fn test_other_callers_get_their_own_result() {
        let datastore = Arc::new(MemoryDatastore::new());
        let store = ResultStore::new(datastore.clone());
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let requirement = requirement(owner);

        let saved = store
            .save_or_update_for_requirement(&requirement, Vec::new(), owner)
            .await
            .unwrap();

        assert!(store.find_by_requirement(requirement.id, other).await.unwrap().is_none());
        assert!(matches!(store.get(saved.id, other).await, Err(ProfolioError::NotFound(_))));
        assert!(matches!(store.delete(saved.id, other).await, Err(ProfolioError::NotFound(_))));
        assert_eq!(datastore.row_count(SAVED_RESULTS_TABLE), 1);
    }

    #[tokio::test]
    async fn test_placeholder_is_owned_and_listed() {
        let store = ResultStore::new(Arc::new(MemoryDatastore::new()));
        let owner = Uuid::new_v4();

        let placeholder = store.create_placeholder(owner, Some("Side project".to_string())).await.unwrap();
        let listed = store.list(owner).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, placeholder.id);
        assert_eq!(listed[0].project_name, "Side project");
    }
}
