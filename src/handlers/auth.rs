use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{PublicUser, User};
use crate::services::auth::{self, MIN_PASSWORD_LEN};
use crate::services::mail::verification_mail;
use crate::state::AppState;

pub fn current_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = header.strip_prefix("Bearer ").unwrap_or("").trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized(
            "No authentication token, access denied".to_string(),
        ));
    }

    let user_id = auth::verify_token(&state.config.auth_secret, token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Invalid token, authorization denied".to_string())
    })?;

    let user = {
        let db = state.db()?;
        queries::get_user_by_id(&db, &user_id)?
    };

    match user {
        None => Err(AppError::Unauthorized("User not found".to_string())),
        Some(u) if !u.is_verified => Err(AppError::Forbidden(
            "Please verify your email to access this resource".to_string(),
        )),
        Some(u) => Ok(u),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let (Some(first_name), Some(last_name), Some(email), Some(password)) = (
        present(body.first_name),
        present(body.last_name),
        present(body.email),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let email = normalize_email(&email);
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        first_name,
        last_name,
        email,
        password_hash: auth::hash_password(&password)?,
        is_verified: false,
        verification_token: Some(auth::generate_verification_token()),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db()?;
        if queries::get_user_by_email(&db, &user.email)?.is_some() {
            return Err(AppError::validation("Email already registered"));
        }
        queries::create_user(&db, &user)?;
    }

    tracing::info!(user_id = %user.id, "user registered");

    if let Some(token) = &user.verification_token {
        let mail = verification_mail(&state.config.client_url, &user.email, &user.first_name, token);
        // Registration stands even if the mail does not go out; the user can ask for a resend.
        if let Err(e) = state.mailer.send(&mail).await {
            tracing::warn!(error = %e, email = %user.email, "failed to send verification email");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Registration successful. Please check your email to verify your account.",
            "user_id": user.id,
        })),
    ))
}

// GET /api/auth/verify/:token
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::validation("Verification token is required"));
    }

    let db = state.db()?;
    let user = queries::get_user_by_verification_token(&db, token)?
        .ok_or_else(|| AppError::validation("Invalid or expired verification token"))?;
    queries::mark_user_verified(&db, &user.id)?;

    tracing::info!(user_id = %user.id, "email verified");

    Ok(Json(serde_json::json!({
        "message": "Email verification successful. You can now log in."
    })))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (Some(email), Some(password)) = (
        present(body.email),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("Email and password are required"));
    };

    let user = {
        let db = state.db()?;
        queries::get_user_by_email(&db, &normalize_email(&email))?
    };

    let user = match user {
        Some(u) if auth::verify_password(&password, &u.password_hash) => u,
        _ => return Err(AppError::validation("Invalid email or password")),
    };

    if !user.is_verified {
        return Err(AppError::EmailNotVerified { email: user.email });
    }

    let token = auth::issue_token(
        &state.config.auth_secret,
        &user.id,
        state.config.token_ttl_hours,
    )?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(serde_json::json!({
        "token": token,
        "user": PublicUser::from(&user),
    })))
}

// POST /api/auth/resend-verification
#[derive(Deserialize)]
pub struct ResendRequest {
    pub email: Option<String>,
}

pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResendRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = present(body.email).ok_or_else(|| AppError::validation("Email is required"))?;

    let (user, token) = {
        let db = state.db()?;
        let user = queries::get_user_by_email(&db, &normalize_email(&email))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.is_verified {
            return Err(AppError::validation("Email already verified"));
        }
        let token = auth::generate_verification_token();
        queries::set_verification_token(&db, &user.id, &token)?;
        (user, token)
    };

    let mail = verification_mail(&state.config.client_url, &user.email, &user.first_name, &token);
    state.mailer.send(&mail).await.map_err(|e| {
        tracing::error!(error = %e, email = %user.email, "failed to resend verification email");
        AppError::Mail("Failed to send verification email. Please try again later.".to_string())
    })?;

    Ok(Json(serde_json::json!({
        "message": "Verification email sent successfully"
    })))
}

// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, AppError> {
    let user = current_user(&state, &headers)?;
    Ok(Json(PublicUser::from(&user)))
}
