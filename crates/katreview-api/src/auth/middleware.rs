use crate::auth::jwt::JwtService;
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use katreview_core::AppError;

/// Validate the bearer token and attach the [`AuthUser`] to the request
pub async fn auth_middleware(
    State(jwt): State<JwtService>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => {
            tracing::debug!("Missing or malformed authorization header");
            return HttpAppError(AppError::Unauthorized(
                "Missing or malformed authorization header".to_string(),
            ))
            .into_response();
        }
    };

    match jwt.verify(&token) {
        Ok(claims) => {
            tracing::debug!(user_id = claims.id, role = %claims.role, "Request authenticated");
            request.extensions_mut().insert(AuthUser::from(claims));
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

/// Reject callers that may not change content. Runs after [`auth_middleware`].
pub async fn require_editor(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.can_write() => next.run(request).await,
        Some(user) => {
            tracing::warn!(user_id = user.id, role = %user.role, "Write access denied");
            HttpAppError(AppError::Forbidden(
                "Editor or admin role required".to_string(),
            ))
            .into_response()
        }
        None => HttpAppError(AppError::Unauthorized(
            "Authentication required".to_string(),
        ))
        .into_response(),
    }
}
