use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::datastore::{from_rows, to_row, Datastore, Filter};
use crate::errors::{ProfolioError, ProfolioResult};
use crate::models::{RemixDraft, RemixWithProject, RemixedTechnique, REMIXED_TECHNIQUES_TABLE};
use crate::result_store::ResultStore;

/// Owner-scoped access to remixed techniques
#[derive(Clone)]
pub struct RemixStore {
    store: Arc<dyn Datastore>,
    results: ResultStore,
}

fn owned(id: Uuid, owner: Uuid) -> [Filter; 2] {
    [Filter::eq("id", id), Filter::eq("user_id", owner)]
}

impl RemixStore {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            results: ResultStore::new(store.clone()),
            store,
        }
    }

    pub async fn get(&self, id: Uuid, owner: Uuid) -> ProfolioResult<RemixedTechnique> {
        let rows = self.store.select(REMIXED_TECHNIQUES_TABLE, &owned(id, owner)).await?;
        from_rows::<RemixedTechnique>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ProfolioError::not_found("remix", id))
    }

    /// Newest first
    pub async fn list(&self, owner: Uuid) -> ProfolioResult<Vec<RemixedTechnique>> {
        let rows = self
            .store
            .select(REMIXED_TECHNIQUES_TABLE, &[Filter::eq("user_id", owner)])
            .await?;
        let mut remixes: Vec<RemixedTechnique> = from_rows(rows)?;
        remixes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(remixes)
    }

    /// Remixes attached to one of the caller's results, oldest first
    pub async fn list_for_result(&self, result_id: Uuid, owner: Uuid) -> ProfolioResult<Vec<RemixedTechnique>> {
        // surfaces not-found for results the caller does not own
        self.results.get(result_id, owner).await?;

        let rows = self
            .store
            .select(
                REMIXED_TECHNIQUES_TABLE,
                &[Filter::eq("saved_result_id", result_id), Filter::eq("user_id", owner)],
            )
            .await?;
        let mut remixes: Vec<RemixedTechnique> = from_rows(rows)?;
        remixes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(remixes)
    }

    /// Every remix of the caller with its parent result's project name inlined
    pub async fn list_with_project_names(&self, owner: Uuid) -> ProfolioResult<Vec<RemixWithProject>> {
        let names: HashMap<Uuid, String> = self
            .results
            .list(owner)
            .await?
            .into_iter()
            .map(|result| (result.id, result.project_name))
            .collect();

        Ok(self
            .list(owner)
            .await?
            .into_iter()
            .map(|remix| {
                let project_name = remix.saved_result_id.and_then(|id| names.get(&id).cloned());
                RemixWithProject { remix, project_name }
            })
            .collect())
    }

    /// Insert or wholly replace a remix.
    ///
    /// A draft with no project reference is attached to a freshly synthesized
    /// placeholder result; re-saving an existing remix keeps its reference
    /// while that result still exists. Like the result upsert, the lookup and
    /// the write are separate calls with no transaction around them.
    pub async fn save_or_update(&self, draft: RemixDraft, owner: Uuid) -> ProfolioResult<RemixedTechnique> {
        if draft.technique_name.trim().is_empty() {
            return Err(ProfolioError::validation("technique_name", "is required"));
        }

        let existing = match draft.id {
            Some(id) => Some(self.get(id, owner).await?),
            None => None,
        };

        let kept_result_id = match draft.saved_result_id {
            Some(result_id) => Some(self.results.get(result_id, owner).await?.id),
            None => match existing.as_ref().and_then(|remix| remix.saved_result_id) {
                // a stale reference falls through to a new placeholder
                Some(result_id) => self.results.find(result_id, owner).await?.map(|result| result.id),
                None => None,
            },
        };

        let saved_result_id = match kept_result_id {
            Some(result_id) => result_id,
            None => {
                let project_name = draft
                    .project_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from);
                self.results.create_placeholder(owner, project_name).await?.id
            }
        };

        match existing {
            Some(existing) => {
                debug!("Replacing remix {} for {}", existing.id, owner);
                let remix = draft.into_remix(existing.id, owner, saved_result_id, existing.created_at);
                let rows = self
                    .store
                    .update(REMIXED_TECHNIQUES_TABLE, &owned(remix.id, owner), to_row(&remix)?)
                    .await?;
                from_rows::<RemixedTechnique>(rows)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProfolioError::not_found("remix", remix.id))
            }
            None => {
                let remix = draft.into_remix(Uuid::new_v4(), owner, saved_result_id, Utc::now());
                info!("Saving remix {} of {} for {}", remix.id, remix.technique_name, owner);
                let row = self.store.insert(REMIXED_TECHNIQUES_TABLE, to_row(&remix)?).await?;
                Ok(serde_json::from_value(row)?)
            }
        }
    }

    /// Delete one of the caller's results together with every remix attached to it
    pub async fn delete_result(&self, result_id: Uuid, owner: Uuid) -> ProfolioResult<usize> {
        self.results.get(result_id, owner).await?;

        let removed = self
            .store
            .delete(
                REMIXED_TECHNIQUES_TABLE,
                &[Filter::eq("saved_result_id", result_id), Filter::eq("user_id", owner)],
            )
            .await?;
        self.results.delete(result_id, owner).await?;
        info!("Deleted result {} and {} attached remixes for {}", result_id, removed, owner);

        Ok(removed)
    }

    pub async fn delete(&self, id: Uuid, owner: Uuid) -> ProfolioResult<()> {
        match self.store.delete(REMIXED_TECHNIQUES_TABLE, &owned(id, owner)).await? {
            0 => Err(ProfolioError::not_found("remix", id)),
            _ => Ok(()),
        }
    }

    pub async fn delete_all(&self, owner: Uuid) -> ProfolioResult<usize> {
        self.store
            .delete(REMIXED_TECHNIQUES_TABLE, &[Filter::eq("user_id", owner)])
            .await
    }
}
