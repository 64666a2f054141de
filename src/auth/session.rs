use crate::config::AuthConfig;
use crate::error::ResqError;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Name of the private (encrypted) session cookie.
pub const SESSION_COOKIE: &str = "resq_session";

/// Derive the private-cookie key from `auth.session_secret` (base64, at
/// least 64 decoded bytes). Without a secret, a fresh key is generated per
/// process — sessions then die with the process, which is only acceptable
/// behind `insecure_cookie` local deployments.
pub fn cookie_key(auth: &AuthConfig) -> Result<Key, ResqError> {
    match auth.session_secret.as_ref() {
        Some(secret) => {
            let bytes = BASE64
                .decode(secret.expose())
                .map_err(|e| ResqError::SessionSecret(format!("not valid base64: {e}")))?;
            if bytes.len() < 64 {
                return Err(ResqError::SessionSecret(format!(
                    "decodes to {} bytes, need at least 64",
                    bytes.len()
                )));
            }
            Ok(Key::from(&bytes))
        }
        None if auth.insecure_cookie => Ok(Key::generate()),
        None => Err(ResqError::SessionSecret(
            "auth.session_secret must be set (or auth.insecure_cookie enabled for local use)"
                .to_string(),
        )),
    }
}

/// Session cookie carrying the authenticated username.
pub fn session_cookie(username: &str, auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, username.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!auth.insecure_cookie)
        .max_age(time::Duration::hours(auth.session_ttl_hours))
        .build()
}

/// Cookie used to clear the session on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
