use anyhow::Result;
use rusqlite::{Params, ffi};

use muse_types::models::Profile;
use muse_types::{AccountId, ParticipantKind, ParticipantRef};

use crate::models::AccountRow;
use crate::{Database, OptionalExt};

const fn table(kind: ParticipantKind) -> &'static str {
    match kind {
        ParticipantKind::User => "users",
        ParticipantKind::Artist => "artists",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateAccountError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// The UNIQUE index on `email` is the authority on duplicates: a lookup
/// before the insert can race with a concurrent registration.
fn classify(err: anyhow::Error) -> CreateAccountError {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            CreateAccountError::DuplicateEmail
        }
        _ => CreateAccountError::Db(err),
    }
}

impl Database {
    fn insert_account(&self, sql: &str, params: impl Params) -> Result<AccountId, CreateAccountError> {
        self.with_conn(|conn| {
            conn.execute(sql, params)?;
            Ok(conn.last_insert_rowid())
        })
        .map_err(classify)
    }

    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<AccountId, CreateAccountError> {
        self.insert_account(
            "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
            (name, email, password_hash),
        )
    }

    /// New artists start in `pending` status until an admin verifies them.
    pub fn create_artist(
        &self,
        name: &str,
        email: &str,
        address: &str,
        password_hash: &str,
    ) -> Result<AccountId, CreateAccountError> {
        self.insert_account(
            "INSERT INTO artists (name, email, address, password) VALUES (?1, ?2, ?3, ?4)",
            (name, email, address, password_hash),
        )
    }

    pub fn get_account_by_email(&self, kind: ParticipantKind, email: &str) -> Result<Option<AccountRow>> {
        let sql = format!(
            "SELECT id, name, password FROM {} WHERE email = ?1",
            table(kind)
        );

        self.with_conn(|conn| {
            conn.query_row(&sql, [email], |row| {
                Ok(AccountRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    password: row.get(2)?,
                })
            })
            .optional()
        })
    }

    pub fn get_profile(&self, participant: &ParticipantRef) -> Result<Option<Profile>> {
        let sql = format!(
            "SELECT name, photo_url FROM {} WHERE id = ?1",
            table(participant.kind())
        );

        self.with_conn(|conn| {
            conn.query_row(&sql, [participant.id()], |row| {
                Ok(Profile {
                    participant: *participant,
                    display_name: row.get(0)?,
                    photo_url: row.get(1)?,
                })
            })
            .optional()
        })
    }
}
