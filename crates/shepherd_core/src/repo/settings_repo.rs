//! Key-value settings repository.
//!
//! # Responsibility
//! - Persist the global custom tag list under a single settings key, as the
//!   original app did with its user-defaults store.
//!
//! # Invariants
//! - A missing key reads as an empty list, never as an error.
//! - The stored value is a JSON string array; anything else is
//!   `InvalidData`.

use crate::repo::{RepoError, RepoResult, SqliteDirectoryStore};
use rusqlite::{params, OptionalExtension};

const CUSTOM_TAGS_KEY: &str = "custom_tags";

/// Repository interface for the settings store.
pub trait SettingsRepository {
    /// Reads the persisted global custom tag list.
    fn global_tags(&mut self) -> RepoResult<Vec<String>>;
    /// Replaces the persisted global custom tag list.
    fn set_global_tags(&mut self, tags: &[String]) -> RepoResult<()>;
}

impl SettingsRepository for SqliteDirectoryStore {
    fn global_tags(&mut self) -> RepoResult<Vec<String>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1;",
                [CUSTOM_TAGS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => serde_json::from_str::<Vec<String>>(&json).map_err(|_| {
                RepoError::InvalidData(format!(
                    "settings key `{CUSTOM_TAGS_KEY}` does not hold a JSON string array"
                ))
            }),
            None => Ok(Vec::new()),
        }
    }

    fn set_global_tags(&mut self, tags: &[String]) -> RepoResult<()> {
        let json = serde_json::to_string(tags)?;
        self.conn().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![CUSTOM_TAGS_KEY, json],
        )?;
        Ok(())
    }
}
