use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

use muse_types::api::{ApiResponse, ArtistRegisterRequest, AuthResponse, LoginRequest, RegisterRequest};
use muse_types::{ParticipantKind, ParticipantRef};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

const NAME_CHARS: std::ops::RangeInclusive<usize> = 3..=64;
const MIN_PASSWORD_CHARS: usize = 8;

type AuthResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<AuthResponse> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);
    validate_account(&req.name, &email, &req.password)?;

    let response = run_blocking(move || {
        // Fast path; the insert below still reports races as duplicates.
        if state.db.get_account_by_email(ParticipantKind::User, &email)?.is_some() {
            return Err(ApiError::DuplicateAccount);
        }

        let hash = hash_password(&req.password)?;
        let id = state.db.create_user(req.name.trim(), &email, &hash)?;
        let participant = ParticipantRef::User(id);

        info!("Registered {} ({})", req.name.trim(), participant);
        issue(&state, participant, req.name.trim())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("registered", response))))
}

/// Artists start out `pending` until an administrator verifies them.
pub async fn register_artist(
    State(state): State<AppState>,
    payload: Result<Json<ArtistRegisterRequest>, JsonRejection>,
) -> AuthResult<AuthResponse> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);
    validate_account(&req.name, &email, &req.password)?;
    if req.address.trim().is_empty() {
        return Err(ApiError::InvalidInput("address is required".into()));
    }

    let response = run_blocking(move || {
        // Fast path; the insert below still reports races as duplicates.
        if state.db.get_account_by_email(ParticipantKind::Artist, &email)?.is_some() {
            return Err(ApiError::DuplicateAccount);
        }

        let hash = hash_password(&req.password)?;
        let id = state
            .db
            .create_artist(req.name.trim(), &email, req.address.trim(), &hash)?;
        let participant = ParticipantRef::Artist(id);

        info!("Registered artist {} ({}), pending verification", req.name.trim(), participant);
        issue(&state, participant, req.name.trim())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("registered, pending verification", response))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<AuthResponse> {
    let Json(req) = payload?;
    login_as(state, ParticipantKind::User, req).await
}

pub async fn login_artist(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<AuthResponse> {
    let Json(req) = payload?;
    login_as(state, ParticipantKind::Artist, req).await
}

async fn login_as(state: AppState, kind: ParticipantKind, req: LoginRequest) -> AuthResult<AuthResponse> {
    let email = normalize_email(&req.email);

    let response = run_blocking(move || {
        let account = state
            .db
            .get_account_by_email(kind, &email)?
            .ok_or(ApiError::BadCredentials)?;

        let parsed_hash = PasswordHash::new(&account.password)
            .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::BadCredentials)?;

        issue(&state, ParticipantRef::new(kind, account.id), &account.name)
    })
    .await?;

    Ok((StatusCode::OK, Json(ApiResponse::ok("logged in", response))))
}

fn issue(state: &AppState, participant: ParticipantRef, name: &str) -> Result<AuthResponse, ApiError> {
    let token = state.keys.issue(participant, name)?;
    Ok(AuthResponse {
        participant,
        name: name.to_string(),
        token,
    })
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_account(name: &str, email: &str, password: &str) -> Result<(), ApiError> {
    if !NAME_CHARS.contains(&name.trim().chars().count()) {
        return Err(ApiError::InvalidInput(format!(
            "name must be {} to {} characters",
            NAME_CHARS.start(),
            NAME_CHARS.end()
        )));
    }
    if !email.contains('@') {
        return Err(ApiError::InvalidInput("email is invalid".into()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}
