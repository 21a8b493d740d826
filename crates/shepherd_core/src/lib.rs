//! Core domain logic for the Shepherd member directory.
//! This crate is the single source of truth for business invariants.

pub mod cache;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::TtlCache;
pub use events::{InvalidationBus, DirectoryChanged};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::member::{
    Member, MemberDraft, MemberId, MemberInfoUpdate, MemberStatus,
};
pub use model::note::{Note, NoteId};
pub use model::tags::{is_default_tag, sorted_default_tags, DEFAULT_TAGS};
pub use repo::{
    DirectoryBackend, MemberRepository, NoteRepository, PersistedMember, RepoError, RepoResult,
    SettingsRepository, SqliteDirectoryStore,
};
pub use service::directory::{
    DirectoryConfig, DirectoryService, MemberFilter, MutationReceipt, StatusMetrics,
    DEFAULT_TAG_CACHE_TTL,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
