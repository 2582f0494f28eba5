//! Conversation listing derived from raw messages.
//!
//! Nothing here is stored: every listing is recomputed from the inbound
//! messages of the participant at call time, so it can never go stale.
//! Conversations are discovered from *inbound* messages only. A counterpart
//! the participant wrote to but who never answered does not show up.

use std::collections::HashMap;

use muse_types::ParticipantRef;
use muse_types::models::Message;

/// One conversation as seen by its receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDigest {
    pub counterpart: ParticipantRef,
    /// Newest message received from the counterpart.
    pub latest: Message,
    /// Messages received from the counterpart, read or not.
    pub inbound_count: u64,
    pub unread_count: u64,
}

/// Latest-per-counterpart reduction over the messages `me` received.
///
/// Messages not addressed to `me` are skipped. Digests come back newest
/// first; the latest message within a group is the one with the greatest
/// `(created_at, id)`.
pub fn summarize(me: &ParticipantRef, inbound: &[Message]) -> Vec<ThreadDigest> {
    let mut groups: HashMap<ParticipantRef, ThreadDigest> = HashMap::new();

    for msg in inbound.iter().filter(|m| m.receiver == *me) {
        let unread = u64::from(!msg.is_read);

        groups
            .entry(msg.sender)
            .and_modify(|digest| {
                digest.inbound_count += 1;
                digest.unread_count += unread;
                if msg.order_key() > digest.latest.order_key() {
                    digest.latest = msg.clone();
                }
            })
            .or_insert_with(|| ThreadDigest {
                counterpart: msg.sender,
                latest: msg.clone(),
                inbound_count: 1,
                unread_count: unread,
            });
    }

    let mut digests: Vec<ThreadDigest> = groups.into_values().collect();
    digests.sort_by(|a, b| b.latest.order_key().cmp(&a.latest.order_key()));
    digests
}

/// Total unread across all conversations.
pub fn unread_total(digests: &[ThreadDigest]) -> u64 {
    digests.iter().map(|d| d.unread_count).sum()
}
