//! Account registration, login and token inspection

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use katreview_core::{
    models::{UserResponse, UserRole},
    password::{hash_password, needs_rehash, verify_password},
    AppError,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::{AuthConfig, DbState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthData {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Envelope shared by every `/api/auth` response
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub data: AuthData,
}

impl AuthResponse {
    fn ok(message: &str, user: UserResponse, token: Option<String>) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: AuthData { user, token },
        }
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; the token is ready to use", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Registration disabled", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, auth, request), fields(operation = "register"))]
pub async fn register(
    State(db): State<DbState>,
    State(auth): State<AuthConfig>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), HttpAppError> {
    if !auth.allow_registration {
        return Err(AppError::Forbidden("Registration is disabled".to_string()).into());
    }
    request.validate().map_err(AppError::from)?;

    let username = request.username.trim();
    let email = request.email.trim().to_lowercase();

    if db.users.find_by_username(username).await?.is_some()
        || db.users.find_by_email(&email).await?.is_some()
    {
        return Err(AppError::Conflict("User already exists".to_string()).into());
    }

    let password_hash = hash_password(&request.password)?;
    let user = db
        .users
        .create(username, &email, &password_hash, UserRole::Admin)
        .await?;
    let token = auth.jwt.issue(&user)?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::ok(
            "User registered successfully",
            user.into(),
            Some(token),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, auth, request), fields(operation = "login"))]
pub async fn login(
    State(db): State<DbState>,
    State(auth): State<AuthConfig>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let mut user = db
        .users
        .find_by_username(request.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&request.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Password mismatch");
        return Err(invalid_credentials().into());
    }

    if needs_rehash(&user.password_hash) {
        let upgraded = hash_password(&request.password)?;
        match db.users.update_password_hash(user.id, &upgraded).await {
            Ok(()) => tracing::info!(user_id = user.id, "Upgraded legacy password hash"),
            Err(e) => tracing::warn!(user_id = user.id, error = %e, "Failed to upgrade password hash"),
        }
    }

    db.users.touch_last_login(user.id).await?;
    user.last_login = Some(Utc::now());

    let token = auth.jwt.issue(&user)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse::ok(
        "Login successful",
        user.into(),
        Some(token),
    )))
}

async fn current_user(db: &DbState, caller: &AuthUser) -> Result<UserResponse, AppError> {
    db.users
        .find_by_id(caller.id)
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "Token is valid", body = AuthResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn verify(
    State(db): State<DbState>,
    caller: AuthUser,
) -> Result<Json<AuthResponse>, HttpAppError> {
    let user = current_user(&db, &caller).await?;
    Ok(Json(AuthResponse::ok("Token is valid", user, None)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Profile of the caller", body = AuthResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn me(
    State(db): State<DbState>,
    caller: AuthUser,
) -> Result<Json<AuthResponse>, HttpAppError> {
    let user = current_user(&db, &caller).await?;
    Ok(Json(AuthResponse::ok("User profile", user, None)))
}
