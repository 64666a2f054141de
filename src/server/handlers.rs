use crate::auth::AuthedUser;
use crate::auth::session;
use crate::error::ResqError;
use crate::logging;
use crate::server::router::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Upper bound on the log tail returned to the UI panel.
const LOG_TAIL_BYTES: u64 = 64 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /health` — liveness, no auth. Suitable for load-balancer checks.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
}

/// `POST /api/login` — check the credentials against the login store and
/// mint the private session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), ResqError> {
    if !state.store.verify(&req.username, &req.password) {
        warn!(username = %req.username, "rejected login");
        return Err(ResqError::Unauthorized);
    }
    info!(username = %req.username, "login ok");
    let jar = jar.add(session::session_cookie(&req.username, &state.auth));
    Ok((
        jar,
        Json(LoginResponse {
            username: req.username,
        }),
    ))
}

/// `POST /api/logout` — drop the session cookie.
pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, StatusCode) {
    (jar.remove(session::removal_cookie()), StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// The SQL that produced the rows; shown next to the table.
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

/// `POST /api/query` — translate the question and execute the generated
/// SQL. Auth-gated and rate-limited.
pub async fn query(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ResqError> {
    if !state.admit_query() {
        return Err(ResqError::RateLimited);
    }
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ResqError::EmptyQuestion);
    }

    debug!(username = %user.0, question = %question, "processing question");
    let translation = state.translator.translate(question).await?;
    let row_count = translation.table.row_count();
    Ok(Json(QueryResponse {
        sql: translation.sql,
        columns: translation.table.columns,
        rows: translation.table.rows,
        row_count,
    }))
}

/// `GET /api/logs` — tail of the current log file, for the UI log panel.
pub async fn logs(State(state): State<AppState>, _user: AuthedUser) -> String {
    logging::read_recent(&state.logs_dir, LOG_TAIL_BYTES)
}
