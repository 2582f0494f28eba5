pub mod api;
pub mod events;
pub mod models;
pub mod participant;

pub use participant::{AccountId, ParticipantKind, ParticipantRef};
