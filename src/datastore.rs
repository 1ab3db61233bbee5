use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{ErrorContext, ProfolioError, ProfolioResult};

/// Equality filter on a column
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn matches(&self, row: &Value) -> bool {
        match row.get(&self.column) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

pub fn to_row<T: Serialize>(record: &T) -> ProfolioResult<Value> {
    Ok(serde_json::to_value(record)?)
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Value>) -> ProfolioResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ProfolioError::from))
        .collect()
}

/// Row-oriented access to the hosted relational backend
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Insert a row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> ProfolioResult<Value>;

    /// Rows matching every filter
    async fn select(&self, table: &str, filters: &[Filter]) -> ProfolioResult<Vec<Value>>;

    /// Replace every row matching the filters, returning the updated rows
    async fn update(&self, table: &str, filters: &[Filter], row: Value) -> ProfolioResult<Vec<Value>>;

    /// Delete matching rows, returning how many were removed
    async fn delete(&self, table: &str, filters: &[Filter]) -> ProfolioResult<usize>;
}

/// In-process datastore used in development mode and tests
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |rows| rows.len())
    }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn insert(&self, table: &str, row: Value) -> ProfolioResult<Value> {
        if !row.is_object() {
            return Err(ProfolioError::Upstream(format!("Rows inserted into {} must be objects", table)));
        }
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn select(&self, table: &str, filters: &[Filter]) -> ProfolioResult<Vec<Value>> {
        Ok(self
            .tables
            .read()
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, filters)).cloned().collect())
            .unwrap_or_default())
    }

    async fn update(&self, table: &str, filters: &[Filter], row: Value) -> ProfolioResult<Vec<Value>> {
        let mut tables = self.tables.write();
        let mut updated = Vec::new();

        if let Some(rows) = tables.get_mut(table) {
            for existing in rows.iter_mut().filter(|r| matches_all(r, filters)) {
                *existing = row.clone();
                updated.push(row.clone());
            }
        }

        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> ProfolioResult<usize> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|r| !matches_all(r, filters));
        Ok(before - rows.len())
    }
}

/// PostgREST-compatible client for the hosted database
pub struct RestDatastore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestDatastore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str, filters: &[Filter]) -> reqwest::RequestBuilder {
        let query: Vec<(String, String)> = filters
            .iter()
            .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
            .collect();

        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(&query)
    }

    async fn rows(&self, response: reqwest::Response, table: &str) -> ProfolioResult<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Datastore request on {} failed with {}: {}", table, status, body);
            return Err(ProfolioError::Upstream(format!("Datastore returned {} for {}: {}", status, table, body)));
        }

        response
            .json::<Vec<Value>>()
            .await
            .with_context(format!("Failed to parse rows from {}", table))
    }
}

#[async_trait]
impl Datastore for RestDatastore {
    async fn insert(&self, table: &str, row: Value) -> ProfolioResult<Value> {
        debug!("Inserting into {}", table);
        let response = self
            .request(reqwest::Method::POST, table, &[])
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .with_context(format!("Failed to insert into {}", table))?;

        self.rows(response, table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProfolioError::Upstream(format!("Insert into {} returned no row", table)))
    }

    async fn select(&self, table: &str, filters: &[Filter]) -> ProfolioResult<Vec<Value>> {
        let response = self
            .request(reqwest::Method::GET, table, filters)
            .query(&[("select", "*")])
            .send()
            .await
            .with_context(format!("Failed to query {}", table))?;

        self.rows(response, table).await
    }

    async fn update(&self, table: &str, filters: &[Filter], row: Value) -> ProfolioResult<Vec<Value>> {
        debug!("Updating {} with {} filters", table, filters.len());
        let response = self
            .request(reqwest::Method::PATCH, table, filters)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .with_context(format!("Failed to update {}", table))?;

        self.rows(response, table).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> ProfolioResult<usize> {
        let response = self
            .request(reqwest::Method::DELETE, table, filters)
            .header("Prefer", "return=representation")
            .send()
            .await
            .with_context(format!("Failed to delete from {}", table))?;

        Ok(self.rows(response, table).await?.len())
    }
}
