use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ResqError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid session secret: {0}")]
    SessionSecret(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM request error: {0}")]
    LlmRequest(#[from] reqwest::Error),

    #[error("LLM upstream status: {0}")]
    LlmStatus(StatusCode),

    #[error("unusable LLM completion: {0}")]
    LlmDecode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rejected SQL statement: {reason}")]
    RejectedSql { reason: String, sql: String },

    #[error("query failed: {message}")]
    QueryFailed { message: String, sql: String },

    #[error("empty question")]
    EmptyQuestion,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid username or password")]
    Unauthorized,

    #[error("translator error: {0}")]
    Translator(String),
}

impl IntoResponse for ResqError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            ResqError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Invalid username or password.".to_string(),
                },
            ),
            ResqError::EmptyQuestion => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "EMPTY_QUESTION".to_string(),
                    message: "Enter a question to translate.".to_string(),
                },
            ),
            ResqError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorBody {
                    code: "RATE_LIMIT".to_string(),
                    message: "Query rate limit exceeded; try again shortly.".to_string(),
                },
            ),
            ResqError::RejectedSql { reason, sql } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorBody {
                    code: "REJECTED_SQL".to_string(),
                    message: format!("{reason}: {sql}"),
                },
            ),
            ResqError::QueryFailed { message, sql } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorBody {
                    code: "QUERY_FAILED".to_string(),
                    message: format!("{message} (generated SQL: {sql})"),
                },
            ),
            ResqError::LlmRequest(_) | ResqError::UrlParse(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "The language model server is unreachable.".to_string(),
                },
            ),
            ResqError::LlmStatus(code) => (
                if code.is_client_error() || code.is_server_error() {
                    code
                } else {
                    StatusCode::BAD_GATEWAY
                },
                ApiErrorBody {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: "The language model returned an error.".to_string(),
                },
            ),
            ResqError::LlmDecode(_) | ResqError::Json(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody {
                    code: "BAD_COMPLETION".to_string(),
                    message: "The language model returned an unusable completion.".to_string(),
                },
            ),
            ResqError::Database(_)
            | ResqError::Io(_)
            | ResqError::ConfigNotFound(_)
            | ResqError::ConfigParse { .. }
            | ResqError::SessionSecret(_)
            | ResqError::Translator(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                },
            ),
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_sql_maps_to_422() {
        let resp = ResqError::RejectedSql {
            reason: "not a SELECT".to_string(),
            sql: "DROP TABLE x".to_string(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn internal_variants_do_not_leak_detail() {
        let resp = ResqError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
