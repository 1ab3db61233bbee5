use std::collections::HashMap;

use actix_web::HttpRequest;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{ErrorContext, ProfolioError, ProfolioResult};

/// The authenticated user on whose behalf an operation executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves access tokens to callers
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when the token is unknown or expired
    async fn resolve(&self, access_token: &str) -> ProfolioResult<Option<Caller>>;

    /// Remove the user account itself
    async fn delete_user(&self, user_id: Uuid) -> ProfolioResult<()>;
}

/// Bearer token from the `Authorization` header; the scheme is case-insensitive
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let (scheme, token) = req.headers().get("Authorization")?.to_str().ok()?.trim().split_once(' ')?;

    Some(token.trim())
        .filter(|token| scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
}

/// Resolve the caller for a request, failing closed
pub async fn authenticate(req: &HttpRequest, identity: &dyn IdentityProvider) -> ProfolioResult<Caller> {
    let token = bearer_token(req)
        .ok_or_else(|| ProfolioError::Authentication("missing bearer token".to_string()))?;

    identity
        .resolve(token)
        .await?
        .ok_or_else(|| ProfolioError::Authentication("invalid or expired session".to_string()))
}

/// Fixed token table for development mode and tests
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    callers: RwLock<HashMap<String, Caller>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: &str, caller: Caller) -> Self {
        self.callers.write().insert(token.to_string(), caller);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, access_token: &str) -> ProfolioResult<Option<Caller>> {
        Ok(self.callers.read().get(access_token).cloned())
    }

    async fn delete_user(&self, user_id: Uuid) -> ProfolioResult<()> {
        self.callers.write().retain(|_, caller| caller.user_id != user_id);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// GoTrue-compatible client for the hosted authentication service
pub struct RestIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn resolve(&self, access_token: &str) -> ProfolioResult<Option<Caller>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .with_context("Failed to reach the authentication service")?;

        match response.status() {
            status if status.is_success() => {
                let user = response
                    .json::<AuthUser>()
                    .await
                    .with_context("Failed to parse authenticated user")?;
                debug!("Resolved caller {}", user.id);
                Ok(Some(Caller {
                    user_id: user.id,
                    email: user.email,
                }))
            }
            status if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => Ok(None),
            status => {
                warn!("Authentication service returned {}", status);
                Err(ProfolioError::Upstream(format!("Authentication service returned {}", status)))
            }
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> ProfolioResult<()> {
        let response = self
            .client
            .delete(format!("{}/auth/v1/admin/users/{}", self.base_url, user_id))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .with_context("Failed to reach the authentication service")?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProfolioError::Upstream(format!(
                "Deleting user {} returned {}",
                user_id,
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn provider(user_id: Uuid) -> StaticIdentityProvider {
        StaticIdentityProvider::new().with_token("token-a", Caller { user_id, email: None })
    }

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_bearer_scheme_ignores_case() {
        for header in ["bearer abc123", "BEARER abc123", "Bearer   abc123 "] {
            let req = TestRequest::default()
                .insert_header(("Authorization", header))
                .to_http_request();
            assert_eq!(bearer_token(&req), Some("abc123"), "{}", header);
        }

        let req = TestRequest::default()
            .insert_header(("Authorization", "bearer "))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearerabc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[actix_web::test]
    async fn test_authenticate_fails_closed() {
        let user = Uuid::new_v4();
        let identity = provider(user);

        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            authenticate(&req, &identity).await,
            Err(ProfolioError::Authentication(_))
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer unknown"))
            .to_http_request();
        assert!(matches!(
            authenticate(&req, &identity).await,
            Err(ProfolioError::Authentication(_))
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer token-a"))
            .to_http_request();
        assert_eq!(authenticate(&req, &identity).await.unwrap().user_id, user);
    }

    #[actix_web::test]
    async fn test_deleted_user_no_longer_resolves() {
        let user = Uuid::new_v4();
        let identity = provider(user);

        identity.delete_user(user).await.unwrap();
        assert_eq!(identity.resolve("token-a").await.unwrap(), None);
    }
}
