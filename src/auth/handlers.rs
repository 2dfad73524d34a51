use axum::{
    extract::{FromRef, Host, Path, State},
    http::StatusCode,
    response::Response,
    routing::{patch, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
            UpdatePasswordRequest,
        },
        extractors::CurrentUser,
        jwt::TokenIssuer,
        password,
        reset::{hash_reset_token, ResetToken},
    },
    email::Mailer as _,
    error::ApiError,
    response::send_token,
    state::AppState,
    users::model::password_changed_stamp,
    users::store::{NewUser, StoreError, UserStore as _},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:token", patch(reset_password))
        .route("/updateMyPassword", patch(update_password))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_new_password(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Please provide a password of at least 8 characters".into(),
        ));
    }
    if password != confirm {
        return Err(ApiError::Validation("Passwords are not the same".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let env = state.config.environment;
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Please tell us your name!".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid signup email");
        return Err(ApiError::Validation("Please provide a valid email".into()));
    }
    validate_new_password(&payload.password, &payload.password_confirm)?;

    if state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::from_store(e, env))?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::from_store(StoreError::DuplicateEmail, env));
    }

    let hash = password::hash_password(&payload.password)
        .await
        .map_err(|e| ApiError::internal(e, env))?;

    // The store assigns the default role; a role in the payload never lands.
    let user = state
        .users
        .create(NewUser {
            name: payload.name.trim().to_owned(),
            email: payload.email,
            password_hash: hash,
        })
        .await
        .map_err(|e| ApiError::from_store(e, env))?;

    let token = TokenIssuer::from_ref(&state)
        .sign(user.id)
        .map_err(|e| ApiError::internal(e, env))?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(send_token(&user, token, StatusCode::CREATED, &state.config))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let env = state.config.environment;
    let email = payload.email.trim().to_lowercase();

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide email and password".into(),
        ));
    }

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::from_store(e, env))?;

    let verified = match &user {
        Some(user) => password::verify_password(&payload.password, &user.password_hash)
            .await
            .map_err(|e| ApiError::internal(e, env))?,
        None => false,
    };

    // Unknown email and wrong password are indistinguishable on purpose.
    let Some(user) = user.filter(|_| verified) else {
        warn!(%email, "failed login attempt");
        return Err(ApiError::Authentication("Incorrect email or password".into()));
    };

    let token = TokenIssuer::from_ref(&state)
        .sign(user.id)
        .map_err(|e| ApiError::internal(e, env))?;

    info!(user_id = %user.id, "user logged in");
    Ok(send_token(&user, token, StatusCode::OK, &state.config))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Host(host): Host,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let env = state.config.environment;
    let email = payload.email.trim().to_lowercase();

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::from_store(e, env))?
        .ok_or_else(|| {
            ApiError::NotFound("There is no user with that email address.".into())
        })?;

    let reset = ResetToken::generate();
    state
        .users
        .set_reset_token(user.id, &reset.hash, reset.expires_at)
        .await
        .map_err(|e| ApiError::from_store(e, env))?;

    let protocol = if env.is_production() { "https" } else { "http" };
    let reset_url = format!(
        "{protocol}://{host}/api/v1/users/resetPassword/{}",
        reset.plaintext
    );
    let message = format!(
        "Forgot your password? Submit a PATCH request with your new password and \
         passwordConfirm to: {reset_url}\nIf you didn't forget your password, please \
         ignore this email."
    );

    if let Err(e) = state
        .mailer
        .send(
            &user.email,
            "Your password reset token (valid for 10 min)",
            &message,
        )
        .await
    {
        // Never leave a dangling valid reset token behind a failed email.
        error!(error = %e, user_id = %user.id, "password reset email failed");
        state
            .users
            .clear_reset_token(user.id)
            .await
            .map_err(|e| ApiError::from_store(e, env))?;
        return Err(ApiError::Operational(
            "There was an error sending the email. Try again later!".into(),
        ));
    }

    info!(user_id = %user.id, "password reset token sent");
    Ok(Json(json!({
        "status": "success",
        "message": "Token sent to email!",
    })))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let env = state.config.environment;
    validate_new_password(&payload.password, &payload.password_confirm)?;

    let hashed_token = hash_reset_token(&token);
    let user = state
        .users
        .find_by_reset_token(&hashed_token, OffsetDateTime::now_utc())
        .await
        .map_err(|e| ApiError::from_store(e, env))?
        .ok_or_else(|| ApiError::Validation("Token is invalid or has expired".into()))?;

    let hash = password::hash_password(&payload.password)
        .await
        .map_err(|e| ApiError::internal(e, env))?;

    let user = state
        .users
        .update_password(user.id, &hash, password_changed_stamp())
        .await
        .map_err(|e| ApiError::from_store(e, env))?;

    let token = TokenIssuer::from_ref(&state)
        .sign(user.id)
        .map_err(|e| ApiError::internal(e, env))?;

    info!(user_id = %user.id, "password reset");
    Ok(send_token(&user, token, StatusCode::OK, &state.config))
}

#[instrument(skip(state, user, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    let env = state.config.environment;

    let verified = password::verify_password(&payload.password_current, &user.password_hash)
        .await
        .map_err(|e| ApiError::internal(e, env))?;
    if !verified {
        return Err(ApiError::Authentication(
            "Your current password is wrong.".into(),
        ));
    }

    validate_new_password(&payload.password, &payload.password_confirm)?;

    let hash = password::hash_password(&payload.password)
        .await
        .map_err(|e| ApiError::internal(e, env))?;

    let user = state
        .users
        .update_password(user.id, &hash, password_changed_stamp())
        .await
        .map_err(|e| ApiError::from_store(e, env))?;

    let token = TokenIssuer::from_ref(&state)
        .sign(user.id)
        .map_err(|e| ApiError::internal(e, env))?;

    info!(user_id = %user.id, "password updated");
    Ok(send_token(&user, token, StatusCode::OK, &state.config))
}
