//! Domain model for the member directory.
//!
//! # Responsibility
//! - Define the canonical member/note records used by core business logic.
//! - Own the closed lifecycle-status enumeration and its repair constructor.
//!
//! # Invariants
//! - Every domain object is identified by a stable uuid.
//! - A member's tag list never contains duplicates.
//! - `MemberStatus` is a closed set; unknown persisted text is repaired to
//!   the default at ingestion, never carried into the model as raw text.

pub mod member;
pub mod note;
pub mod tags;
