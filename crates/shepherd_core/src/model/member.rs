//! Member domain model.
//!
//! # Responsibility
//! - Define the canonical member record and its lifecycle status.
//! - Provide the `parse_or_default` repair constructor used at every
//!   ingestion boundary (creation and persistence load).
//!
//! # Invariants
//! - `uuid` is stable and never reused for another member.
//! - `status` is always a member of the closed enumeration.
//! - `tags` preserves insertion order and contains no duplicates.
//! - `joined_at` is set once at creation and never mutated.

use crate::model::tags::push_tag;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a member record.
pub type MemberId = Uuid;

/// Closed lifecycle status set for members.
///
/// Persisted as the canonical display text (`as_str`). Anything else found
/// in storage is treated as damage and repaired to [`MemberStatus::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Regularly engaged.
    Active,
    /// Engagement dropping, needs follow-up.
    AtRisk,
    /// About to be lost.
    Critical,
    /// No longer engaged.
    Inactive,
}

impl MemberStatus {
    /// All statuses in metric-pass order.
    pub const ALL: [MemberStatus; 4] = [
        MemberStatus::Active,
        MemberStatus::AtRisk,
        MemberStatus::Critical,
        MemberStatus::Inactive,
    ];

    /// Canonical text form used in storage and UI labels.
    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "Active",
            MemberStatus::AtRisk => "At Risk",
            MemberStatus::Critical => "Critical",
            MemberStatus::Inactive => "Inactive",
        }
    }

    /// Parses the canonical text form.
    pub fn parse(value: &str) -> Option<MemberStatus> {
        MemberStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
    }

    /// Repair constructor for ingestion boundaries.
    ///
    /// Absent or unrecognized status text maps to the default status.
    /// Callers that need to know whether repair happened should compare the
    /// input against `parse` first.
    pub fn parse_or_default(value: Option<&str>) -> MemberStatus {
        value
            .and_then(MemberStatus::parse)
            .unwrap_or(MemberStatus::Active)
    }
}

impl Default for MemberStatus {
    fn default() -> Self {
        MemberStatus::Active
    }
}

impl Display for MemberStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical member record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Stable global ID used for lookups, note ownership and cache keys.
    pub uuid: MemberId,
    /// May be empty; never null.
    pub first_name: String,
    /// May be empty; never null.
    pub last_name: String,
    /// Empty strings are normalized to `None`.
    pub email: Option<String>,
    /// Empty strings are normalized to `None`.
    pub phone: Option<String>,
    /// Lifecycle status, always from the closed set.
    pub status: MemberStatus,
    /// Insertion-ordered, duplicate-free tag list.
    pub tags: Vec<String>,
    /// 1-12, independent of `birthday_day`, not calendar-validated.
    pub birthday_month: Option<u8>,
    /// 1-31, independent of `birthday_month`, not calendar-validated.
    pub birthday_day: Option<u8>,
    /// Epoch milliseconds, set once at creation.
    pub joined_at: i64,
}

/// Field set for creating a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `None` means the default status.
    pub status: Option<MemberStatus>,
    pub tags: Vec<String>,
    pub birthday_month: Option<u8>,
    pub birthday_day: Option<u8>,
}

/// Field set for `update_member_info`; status and tags are updated through
/// their dedicated operations, `joined_at` is immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberInfoUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday_month: Option<u8>,
    pub birthday_day: Option<u8>,
}

impl Member {
    /// Creates a member from a draft with a generated stable ID.
    ///
    /// Draft tags are trimmed, blank entries dropped and duplicates removed
    /// while preserving first-seen order.
    pub fn from_draft(draft: MemberDraft, joined_at: i64) -> Self {
        let mut tags = Vec::new();
        for tag in &draft.tags {
            push_tag(&mut tags, tag);
        }

        Self {
            uuid: Uuid::new_v4(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: normalize_contact(draft.email),
            phone: normalize_contact(draft.phone),
            status: draft.status.unwrap_or_default(),
            tags,
            birthday_month: draft.birthday_month,
            birthday_day: draft.birthday_day,
            joined_at,
        }
    }

    /// Full name as displayed and searched, `"first last"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Exact-match tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }
}

/// Maps empty contact strings to absent, per record-store contract.
pub fn normalize_contact(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
