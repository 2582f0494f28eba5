//! Direct messaging between end users and makeup artists.
//!
//! The pieces, leaf first: a [`directory::ParticipantDirectory`] that turns
//! participant references into display data, a [`store::MessageStore`] that
//! owns the message log, the [`aggregator`] that folds raw messages into
//! per-counterpart conversation digests, and the [`service::MessagingService`]
//! that checks callers and ties everything together.

pub mod aggregator;
pub mod directory;
pub mod identity;
pub mod notify;
pub mod service;
pub mod store;

use muse_types::ParticipantRef;
use muse_types::models::ValidationError;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("missing or invalid credentials")]
    Authentication,
    #[error("caller {0} is not a known participant")]
    Authorization(ParticipantRef),
    #[error("participant not found: {0}")]
    NotFound(ParticipantRef),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
