use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::auth::jwt::TokenIssuer;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::model::User;
use crate::users::store::UserStore as _;

/// Access guard. Extracts the bearer token from the `Authorization` header or
/// the `jwt` cookie, verifies it, checks that the user still exists and that
/// the password was not changed after the token was issued, then hands the
/// resolved user to the handler.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            ApiError::Authentication("You are not logged in! Please log in to get access.".into())
        })?;

        let issuer = TokenIssuer::from_ref(state);
        let claims = issuer.verify(&token).map_err(|_| {
            warn!("invalid or expired bearer token");
            ApiError::Authentication("Invalid or expired token. Please log in again.".into())
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| ApiError::from_store(e, state.config.environment))?
            .ok_or_else(|| {
                ApiError::Authentication(
                    "The user belonging to this token no longer exists.".into(),
                )
            })?;

        if user.changed_password_after(claims.iat) {
            return Err(ApiError::Authentication(
                "User recently changed password! Please log in again.".into(),
            ));
        }

        Ok(CurrentUser(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_owned());
        }
    }
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    token_from_cookie(cookies)
}

fn token_from_cookie(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("jwt="))
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
