//! Note domain model.
//!
//! Notes belong to exactly one member and are immutable once written; there
//! is no edit or single-note delete operation. Deleting the owning member
//! deletes its notes.

use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a note record.
pub type NoteId = Uuid;

/// Timestamped free-text annotation owned by one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub uuid: NoteId,
    /// Owning member; cascade-deleted with it.
    pub member_uuid: MemberId,
    pub content: String,
    /// Epoch milliseconds; notes are listed newest-first.
    pub created_at: i64,
}

impl Note {
    /// Creates a note with a generated stable ID.
    pub fn new(member_uuid: MemberId, content: impl Into<String>, created_at: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            member_uuid,
            content: content.into(),
            created_at,
        }
    }
}
