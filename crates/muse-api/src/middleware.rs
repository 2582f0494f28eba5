use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use muse_chat::ChatError;
use muse_types::{ParticipantKind, ParticipantRef};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated participant behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub ParticipantRef);

/// Accept only end-user tokens.
pub async fn require_user(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    authenticate(&state, ParticipantKind::User, req, next).await
}

/// Accept only artist tokens.
pub async fn require_artist(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    authenticate(&state, ParticipantKind::Artist, req, next).await
}

async fn authenticate(
    state: &AppState,
    kind: ParticipantKind,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ChatError::Authentication)?;
    let claims = state.keys.resolve(token, kind)?;

    req.extensions_mut().insert(Caller(claims.participant()));
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
