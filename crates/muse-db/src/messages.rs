use anyhow::Result;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{Row, params};

use muse_types::models::{Message, MessageId, NewMessage};
use muse_types::{ParticipantKind, ParticipantRef};

use crate::Database;

const MESSAGE_COLUMNS: &str =
    "id, sender_kind, sender_id, receiver_kind, receiver_id, body, is_read, created_at, updated_at";

impl Database {
    /// Append a validated message. The row is written by a single INSERT.
    pub fn insert_message(&self, msg: &NewMessage) -> Result<Message> {
        // Stored with microsecond precision; truncate here so the returned
        // value equals what later reads produce.
        let created_at = msg.created_at().trunc_subsecs(6);
        let stamp = format_timestamp(&created_at);
        let sender = msg.sender();
        let receiver = msg.receiver();

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_kind, sender_id, receiver_kind, receiver_id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    sender.kind().as_str(),
                    sender.id(),
                    receiver.kind().as_str(),
                    receiver.id(),
                    msg.body(),
                    stamp,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(Message {
            id,
            sender: *sender,
            receiver: *receiver,
            body: msg.body().to_string(),
            is_read: false,
            created_at,
            updated_at: created_at,
        })
    }

    /// Flip every unread message sent by `counterpart` to `reader`.
    /// Returns the number of rows changed; 0 once everything is read.
    pub fn mark_read(&self, reader: &ParticipantRef, counterpart: &ParticipantRef) -> Result<usize> {
        let now = format_timestamp(&Utc::now());

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1, updated_at = ?5
                 WHERE receiver_kind = ?1 AND receiver_id = ?2
                   AND sender_kind = ?3 AND sender_id = ?4
                   AND is_read = 0",
                params![
                    reader.kind().as_str(),
                    reader.id(),
                    counterpart.kind().as_str(),
                    counterpart.id(),
                    now,
                ],
            )?;
            Ok(changed)
        })
    }

    /// Like [`Database::mark_read`], but leaves messages with an id above
    /// `through` untouched. Ids grow with insertion order, so anything a
    /// reader has not fetched yet stays unread.
    pub fn mark_read_through(
        &self,
        reader: &ParticipantRef,
        counterpart: &ParticipantRef,
        through: MessageId,
    ) -> Result<usize> {
        let now = format_timestamp(&Utc::now());

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1, updated_at = ?5
                 WHERE receiver_kind = ?1 AND receiver_id = ?2
                   AND sender_kind = ?3 AND sender_id = ?4
                   AND is_read = 0 AND id <= ?6",
                params![
                    reader.kind().as_str(),
                    reader.id(),
                    counterpart.kind().as_str(),
                    counterpart.id(),
                    now,
                    through,
                ],
            )?;
            Ok(changed)
        })
    }

    /// Both directions of the conversation between `a` and `b`, oldest first.
    pub fn messages_between(&self, a: &ParticipantRef, b: &ParticipantRef) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_kind = ?1 AND sender_id = ?2 AND receiver_kind = ?3 AND receiver_id = ?4)
                OR (sender_kind = ?3 AND sender_id = ?4 AND receiver_kind = ?1 AND receiver_id = ?2)
             ORDER BY created_at ASC, id ASC"
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![a.kind().as_str(), a.id(), b.kind().as_str(), b.id()],
                    message_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every message ever received by `receiver`, oldest first.
    pub fn inbound_messages(&self, receiver: &ParticipantRef) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE receiver_kind = ?1 AND receiver_id = ?2
             ORDER BY created_at ASC, id ASC"
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![receiver.kind().as_str(), receiver.id()], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_received_by(&self, receiver: &ParticipantRef) -> Result<u64> {
        let count: i64 = self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE receiver_kind = ?1 AND receiver_id = ?2",
                params![receiver.kind().as_str(), receiver.id()],
                |row| row.get(0),
            )?)
        })?;
        Ok(u64::try_from(count)?)
    }

    pub fn count_unread_from(&self, reader: &ParticipantRef, counterpart: &ParticipantRef) -> Result<u64> {
        let count: i64 = self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE receiver_kind = ?1 AND receiver_id = ?2
                   AND sender_kind = ?3 AND sender_id = ?4
                   AND is_read = 0",
                params![
                    reader.kind().as_str(),
                    reader.id(),
                    counterpart.kind().as_str(),
                    counterpart.id(),
                ],
                |row| row.get(0),
            )?)
        })?;
        Ok(u64::try_from(count)?)
    }
}

/// Fixed-width RFC 3339, so that lexical order in SQLite is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender: participant_at(row, 1)?,
        receiver: participant_at(row, 3)?,
        body: row.get(5)?,
        is_read: row.get(6)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
    })
}

/// Reads a `(kind, id)` column pair starting at `idx`.
fn participant_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ParticipantRef> {
    let kind: String = row.get(idx)?;
    let kind = kind
        .parse::<ParticipantKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?;
    Ok(ParticipantRef::new(kind, row.get(idx + 1)?))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
