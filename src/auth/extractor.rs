use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::jwt::{JwtConfig, TokenIdentity};
use crate::auth::models::User;
use crate::error::ApiError;
use crate::AppState;

const UNAUTHENTICATED: ApiError = ApiError::Unauthenticated("Unauthenticated.");

/// The authenticated caller of a protected route.
///
/// Requires a valid bearer access token whose session has not been logged
/// out or expired.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub session_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = extract_identity(&state.jwt, &parts.headers)?;

        let now = Utc::now().naive_utc();
        let session = state
            .users
            .find_session(identity.session_id)
            .await?
            .filter(|s| s.user_id == identity.user_id && !s.is_expired(now))
            .ok_or(UNAUTHENTICATED)?;

        let user = state
            .users
            .find_by_id(identity.user_id)
            .await?
            .ok_or(UNAUTHENTICATED)?;

        Ok(AuthUser {
            user,
            session_id: session.id,
        })
    }
}

// Helper: extract token identity from Authorization header
fn extract_identity(jwt: &JwtConfig, headers: &header::HeaderMap) -> Result<TokenIdentity, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(UNAUTHENTICATED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(UNAUTHENTICATED)?;

    jwt.validate_access_token(token.trim())
        .map_err(|_| UNAUTHENTICATED)
}
