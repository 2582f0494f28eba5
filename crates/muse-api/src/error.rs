use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use muse_chat::ChatError;
use muse_db::accounts::CreateAccountError;
use muse_types::api::ApiResponse;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid email or password")]
    BadCredentials,
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("no such conversation")]
    UnknownConversation,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Chat(ChatError::Authentication) | Self::BadCredentials => StatusCode::UNAUTHORIZED,
            Self::Chat(ChatError::Authorization(_)) => StatusCode::FORBIDDEN,
            Self::Chat(ChatError::NotFound(_)) | Self::UnknownConversation => StatusCode::NOT_FOUND,
            Self::Chat(ChatError::Validation(_)) | Self::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DuplicateAccount => StatusCode::CONFLICT,
            Self::Chat(ChatError::Unexpected(_)) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<CreateAccountError> for ApiError {
    fn from(err: CreateAccountError) -> Self {
        match err {
            CreateAccountError::DuplicateEmail => Self::DuplicateAccount,
            CreateAccountError::Db(e) => Self::Internal(e),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected conversation path: {}", rejection.body_text());
        Self::UnknownConversation
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Chat(ChatError::Unexpected(e)) | Self::Internal(e) => {
                error!("Request failed: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}
