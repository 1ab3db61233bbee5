use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Result alias used by every persistence, identity and generation call
pub type ProfolioResult<T> = Result<T, ProfolioError>;

/// A single offending field reported by a validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main error type for all Profolio operations
#[derive(Debug, thiserror::Error)]
pub enum ProfolioError {
    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Validation failed: {}", summarize(.fields))]
    Validation { fields: Vec<FieldError> },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProfolioError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProfolioError::Validation {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ProfolioError::NotFound(format!("{} {}", resource, id))
    }

    /// Stable machine-readable kind, sent to clients alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            ProfolioError::Authentication(_) => "authentication",
            ProfolioError::Validation { .. } => "validation",
            ProfolioError::NotFound(_) => "not_found",
            ProfolioError::Upstream(_) => "upstream",
            ProfolioError::Generation(_) => "generation",
            ProfolioError::Config(_) => "config",
            ProfolioError::Serialization(_) => "serialization",
        }
    }
}

impl From<reqwest::Error> for ProfolioError {
    fn from(error: reqwest::Error) -> Self {
        ProfolioError::Upstream(error.to_string())
    }
}

impl ResponseError for ProfolioError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProfolioError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ProfolioError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ProfolioError::NotFound(_) => StatusCode::NOT_FOUND,
            ProfolioError::Upstream(_) | ProfolioError::Generation(_) => StatusCode::BAD_GATEWAY,
            ProfolioError::Config(_) | ProfolioError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let fields = match self {
            ProfolioError::Validation { fields } => fields.clone(),
            _ => Vec::new(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
            "fields": fields,
        }))
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_context(self, context: impl Into<String>) -> ProfolioResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_context(self, context: impl Into<String>) -> ProfolioResult<T> {
        self.map_err(|e| ProfolioError::Upstream(format!("{}: {}", context.into(), e)))
    }
}
