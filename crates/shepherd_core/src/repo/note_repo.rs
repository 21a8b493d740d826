//! Note repository contract and SQLite implementation.
//!
//! Notes are append-only: there is no update or single-note delete. Rows
//! disappear only through the member-delete cascade enforced by the schema.

use crate::model::note::Note;
use crate::repo::{RepoError, RepoResult, SqliteDirectoryStore};
use rusqlite::params;
use uuid::Uuid;

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Appends one note owned by an existing member.
    fn insert_note(&mut self, note: &Note) -> RepoResult<()>;
    /// Loads every note row; grouping and ordering are the engine's job.
    fn load_notes(&mut self) -> RepoResult<Vec<Note>>;
}

impl NoteRepository for SqliteDirectoryStore {
    fn insert_note(&mut self, note: &Note) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO notes (uuid, member_uuid, content, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                note.uuid.to_string(),
                note.member_uuid.to_string(),
                note.content.as_str(),
                note.created_at,
            ],
        )?;
        Ok(())
    }

    fn load_notes(&mut self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn().prepare(
            "SELECT uuid, member_uuid, content, created_at
             FROM notes
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let member_text: String = row.get("member_uuid")?;
            notes.push(Note {
                uuid: parse_uuid(&uuid_text, "notes.uuid")?,
                member_uuid: parse_uuid(&member_text, "notes.member_uuid")?,
                content: row.get("content")?,
                created_at: row.get("created_at")?,
            });
        }

        Ok(notes)
    }
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
