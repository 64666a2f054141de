use crate::auth::session::SESSION_COOKIE;
use crate::auth::store::LoginStore;
use crate::error::ResqError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::TypedHeader;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use headers::Authorization;
use headers::authorization::Basic;

/// Authenticated caller. Accepts either:
/// - the private session cookie minted by `POST /api/login`
/// - an `Authorization: Basic` header checked against the login store
///   (non-browser clients)
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
    Key: FromRef<S>,
    LoginStore: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1) session cookie
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejection.into_response())?;
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            return Ok(Self(cookie.value().to_string()));
        }

        // 2) Basic auth
        let store = LoginStore::from_ref(state);
        if let Ok(TypedHeader(Authorization(basic))) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state).await
            && store.verify(basic.username(), basic.password())
        {
            return Ok(Self(basic.username().to_string()));
        }

        Err(ResqError::Unauthorized.into_response())
    }
}
