//! Member repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide write-through persistence for member rows and their
//!   insertion-ordered tag links.
//! - Hand raw persisted status text back to the engine for repair.
//!
//! # Invariants
//! - `update_member` replaces the row and the whole tag-link set in a single
//!   immediate transaction.
//! - Tag links are written with their list position so load paths restore
//!   insertion order exactly.

use crate::model::member::{Member, MemberId};
use crate::repo::{RepoError, RepoResult, SqliteDirectoryStore};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

const MEMBER_SELECT_SQL: &str = "SELECT
    uuid,
    first_name,
    last_name,
    email,
    phone,
    status,
    birthday_month,
    birthday_day,
    joined_at
FROM members";

/// A member row as it exists on disk. `status` is raw text that may be
/// absent or outside the closed enumeration; the engine repairs it via
/// `MemberStatus::parse_or_default` at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMember {
    pub uuid: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub birthday_month: Option<u8>,
    pub birthday_day: Option<u8>,
    pub joined_at: i64,
}

/// Repository interface for member persistence.
pub trait MemberRepository {
    /// Inserts one member row plus its tag links.
    fn insert_member(&mut self, member: &Member) -> RepoResult<()>;
    /// Replaces one member row plus its full tag-link set atomically.
    fn update_member(&mut self, member: &Member) -> RepoResult<()>;
    /// Hard-deletes one member; notes and tag links cascade.
    fn delete_member(&mut self, id: MemberId) -> RepoResult<()>;
    /// Loads every member row with raw status text and ordered tags.
    fn load_members(&mut self) -> RepoResult<Vec<PersistedMember>>;
}

impl MemberRepository for SqliteDirectoryStore {
    fn insert_member(&mut self, member: &Member) -> RepoResult<()> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO members (
                uuid,
                first_name,
                last_name,
                email,
                phone,
                status,
                birthday_month,
                birthday_day,
                joined_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                member.uuid.to_string(),
                member.first_name.as_str(),
                member.last_name.as_str(),
                member.email.as_deref(),
                member.phone.as_deref(),
                member.status.as_str(),
                member.birthday_month,
                member.birthday_day,
                member.joined_at,
            ],
        )?;

        replace_tag_links(&tx, member)?;
        tx.commit()?;
        Ok(())
    }

    fn update_member(&mut self, member: &Member) -> RepoResult<()> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE members
             SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                status = ?6,
                birthday_month = ?7,
                birthday_day = ?8
             WHERE uuid = ?1;",
            params![
                member.uuid.to_string(),
                member.first_name.as_str(),
                member.last_name.as_str(),
                member.email.as_deref(),
                member.phone.as_deref(),
                member.status.as_str(),
                member.birthday_month,
                member.birthday_day,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(member.uuid));
        }

        replace_tag_links(&tx, member)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_member(&mut self, id: MemberId) -> RepoResult<()> {
        let changed = self.conn().execute(
            "DELETE FROM members WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn load_members(&mut self) -> RepoResult<Vec<PersistedMember>> {
        let mut members = Vec::new();
        {
            let mut stmt = self
                .conn()
                .prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY joined_at ASC, uuid ASC;"))?;
            let mut rows = stmt.query([])?;

            while let Some(row) = rows.next()? {
                let uuid_text: String = row.get("uuid")?;
                let uuid = parse_uuid(&uuid_text)?;
                members.push(PersistedMember {
                    uuid,
                    first_name: row.get("first_name")?,
                    last_name: row.get("last_name")?,
                    email: row.get("email")?,
                    phone: row.get("phone")?,
                    status: row.get("status")?,
                    tags: Vec::new(),
                    birthday_month: row.get("birthday_month")?,
                    birthday_day: row.get("birthday_day")?,
                    joined_at: row.get("joined_at")?,
                });
            }
        }

        for member in &mut members {
            member.tags = load_tags_for_member(self.conn(), member.uuid)?;
        }

        Ok(members)
    }
}

fn replace_tag_links(tx: &Transaction<'_>, member: &Member) -> RepoResult<()> {
    let member_uuid = member.uuid.to_string();
    tx.execute(
        "DELETE FROM member_tags WHERE member_uuid = ?1;",
        [member_uuid.as_str()],
    )?;

    for (position, tag) in member.tags.iter().enumerate() {
        tx.execute(
            "INSERT INTO member_tags (member_uuid, position, tag) VALUES (?1, ?2, ?3);",
            params![member_uuid.as_str(), position as i64, tag.as_str()],
        )?;
    }

    Ok(())
}

fn load_tags_for_member(conn: &Connection, id: MemberId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM member_tags
         WHERE member_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

fn parse_uuid(value: &str) -> RepoResult<MemberId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in members.uuid"))
    })
}
