use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use tracing::info;

use crate::auth::{
    extractor::AuthUser,
    jwt::JwtConfig,
    models::{
        AuthResponse, LoginRequest, NewRefreshToken, NewUser, RefreshRequest, RegisterRequest,
        TokenResponse, User, UserResponse,
    },
};
use crate::db::RepoError;
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extract::JsonBody;
use crate::response::{DataResponse, MessageResponse};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_FIELD_LEN: usize = 255;

// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_registration(&req)?;

    // Hash password with Argon2
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .to_string();

    let new_user = NewUser {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash,
    };

    let user = state.users.create_user(new_user).await.map_err(|e| match e {
        RepoError::Conflict(_) => {
            ValidationErrors::single("email", "The email has already been taken.")
        }
        other => other.into(),
    })?;

    info!(user_id = %user.id, "User registered");

    let (token, refresh_token) = create_tokens(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            data: user.into(),
            token,
            refresh_token,
            message: "User registered successfully",
        }),
    ))
}

// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let mut errors = ValidationErrors::new();
    if req.email.trim().is_empty() {
        errors.add("email", "The email field is required.");
    }
    if req.password.is_empty() {
        errors.add("password", "The password field is required.");
    }
    errors.check()?;

    let invalid = || ApiError::Unauthenticated("Invalid credentials");

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    // Verify password
    let parsed_hash =
        PasswordHash::new(&user.password_hash).map_err(|e| ApiError::Internal(e.to_string()))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    let (token, refresh_token) = create_tokens(&state, &user).await?;

    Ok(Json(AuthResponse {
        data: user.into(),
        token,
        refresh_token,
        message: "Login successful",
    }))
}

// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token_hash = JwtConfig::hash_refresh_token(&req.refresh_token);

    let session = state
        .users
        .find_session_by_hash(&token_hash)
        .await?
        .ok_or(ApiError::Unauthenticated("Invalid refresh token"))?;

    // Check expiration
    if session.is_expired(Utc::now().naive_utc()) {
        state.users.delete_session(session.id).await?;
        return Err(ApiError::Unauthenticated("Refresh token expired"));
    }

    let token = state
        .jwt
        .create_access_token(session.user_id, session.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(TokenResponse { token }))
}

// POST /auth/logout
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MessageResponse>> {
    // Deleting the session invalidates both tokens
    state.users.delete_session(auth.session_id).await?;

    info!(user_id = %auth.user.id, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

// GET /auth/user
pub async fn user(auth: AuthUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse::new(auth.user.into()))
}

// Helper: open a session and issue its access/refresh token pair
async fn create_tokens(state: &AppState, user: &User) -> ApiResult<(String, String)> {
    let refresh_token = JwtConfig::create_refresh_token();

    let session = state
        .users
        .create_session(NewRefreshToken {
            user_id: user.id,
            token_hash: JwtConfig::hash_refresh_token(&refresh_token),
            expires_at: state.jwt.refresh_token_expires_at(),
        })
        .await?;

    let access_token = state
        .jwt
        .create_access_token(user.id, session.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((access_token, refresh_token))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::new();

    let name = req.name.trim();
    if name.is_empty() {
        errors.add("name", "The name field is required.");
    } else if name.chars().count() > MAX_FIELD_LEN {
        errors.add("name", "The name may not be greater than 255 characters.");
    }

    let email = req.email.trim();
    if email.is_empty() {
        errors.add("email", "The email field is required.");
    } else if !is_valid_email(email) {
        errors.add("email", "The email must be a valid email address.");
    } else if email.len() > MAX_FIELD_LEN {
        errors.add("email", "The email may not be greater than 255 characters.");
    }

    if req.password.is_empty() {
        errors.add("password", "The password field is required.");
    } else {
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "The password must be at least 8 characters.");
        }
        if req.password != req.password_confirmation {
            errors.add("password", "The password confirmation does not match.");
        }
    }

    errors.check()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
