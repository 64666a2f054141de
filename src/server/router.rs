use crate::auth::LoginStore;
use crate::auth::session;
use crate::config::{AuthConfig, Config};
use crate::error::ResqError;
use crate::server::{handlers, ui};
use crate::translator::TranslatorHandle;
use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum_extra::extract::cookie::Key;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub translator: TranslatorHandle,
    pub store: LoginStore,
    pub auth: AuthConfig,
    pub logs_dir: PathBuf,
    pub body_limit: usize,
    key: Key,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(
        translator: TranslatorHandle,
        store: LoginStore,
        cfg: &Config,
    ) -> Result<Self, ResqError> {
        let key = session::cookie_key(&cfg.auth)?;
        let quota = NonZeroU32::new(cfg.translator.queries_per_minute.max(1))
            .unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            translator,
            store,
            auth: cfg.auth.clone(),
            logs_dir: cfg.tracing.dir.clone(),
            body_limit: cfg.server.body_limit,
            key,
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(quota))),
        })
    }

    /// True when the per-minute query quota still has room.
    pub fn admit_query(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

impl FromRef<AppState> for LoginStore {
    fn from_ref(state: &AppState) -> LoginStore {
        state.store.clone()
    }
}

pub fn resq_router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(handlers::health))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/query", post(handlers::query))
        .route("/api/logs", get(handlers::logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
