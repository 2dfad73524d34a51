use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::dto::PublicUser;
use crate::config::AppConfig;
use crate::users::model::User;

/// Build the standard token response: success envelope with the sanitized
/// user, plus the `jwt` cookie mirror of the bearer token.
pub fn send_token(user: &User, token: String, status: StatusCode, config: &AppConfig) -> Response {
    let cookie = jwt_cookie(&token, config);
    let body = json!({
        "status": "success",
        "token": token,
        "data": { "user": PublicUser::from(user) },
    });
    let mut response = (status, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn jwt_cookie(token: &str, config: &AppConfig) -> String {
    let max_age = config.jwt.cookie_ttl_days * 24 * 60 * 60;
    let mut cookie = format!("jwt={token}; Path=/; Max-Age={max_age}; HttpOnly");
    if config.environment.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}
