use std::sync::Arc;

use anyhow::Result;
use muse_db::Database;
use muse_types::ParticipantRef;
use muse_types::models::Profile;

pub type Directory = Arc<dyn ParticipantDirectory + Send + Sync>;

/// Resolves participant references to display data. `Ok(None)` means the
/// account does not exist.
pub trait ParticipantDirectory {
    fn lookup(&self, participant: &ParticipantRef) -> Result<Option<Profile>>;
}

impl ParticipantDirectory for Database {
    fn lookup(&self, participant: &ParticipantRef) -> Result<Option<Profile>> {
        self.get_profile(participant)
    }
}
