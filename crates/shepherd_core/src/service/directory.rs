//! Member directory engine.
//!
//! # Responsibility
//! - Own the in-memory record set (members + notes) and write every
//!   mutation through the persistence backend before returning.
//! - Keep derived views (status metrics, tag vocabulary, per-member note
//!   lists) consistent through direct cache invalidation.
//! - Publish payload-free change signals for UI subscribers.
//!
//! # Invariants
//! - All reads and writes funnel through one mutex-guarded state; no two
//!   operations interleave against the record set.
//! - A failed write-through never rolls back the in-memory mutation; the
//!   failure is logged and surfaced in the returned [`MutationReceipt`].
//! - After `refresh_metrics`, the per-status counts sum to the member count.
//! - After a cache-invalidating tag mutation, the next `custom_tags` call
//!   reflects the change.

use crate::cache::TtlCache;
use crate::events::{InvalidationBus, DirectoryChanged};
use crate::model::member::{
    normalize_contact, Member, MemberDraft, MemberId, MemberInfoUpdate, MemberStatus,
};
use crate::model::note::{Note, NoteId};
use crate::model::tags::{is_default_tag, normalize_tag, push_tag};
use crate::repo::{DirectoryBackend, RepoError, RepoResult};
use log::{info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Freshness window for the tag vocabulary cache.
pub const DEFAULT_TAG_CACHE_TTL: Duration = Duration::from_secs(5);

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Maximum age at which the cached tag vocabulary is served without
    /// recomputation.
    pub tag_cache_ttl: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            tag_cache_ttl: DEFAULT_TAG_CACHE_TTL,
        }
    }
}

/// Outcome of a best-effort mutation.
///
/// The in-memory mutation always stands once applied; this receipt tells the
/// caller whether the operation targeted an existing record and whether the
/// write-through reached durable storage.
#[derive(Debug)]
#[must_use = "inspect the receipt to learn whether the write-through persisted"]
pub struct MutationReceipt {
    matched: bool,
    persist_error: Option<RepoError>,
}

impl MutationReceipt {
    fn applied() -> Self {
        Self {
            matched: true,
            persist_error: None,
        }
    }

    fn unmatched() -> Self {
        Self {
            matched: false,
            persist_error: None,
        }
    }

    /// Whether the operation targeted an existing record (or created one).
    /// `false` means the operation had no effect at all.
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Whether the in-memory mutation also reached durable storage.
    pub fn is_durable(&self) -> bool {
        self.matched && self.persist_error.is_none()
    }

    /// The write-through failure, when one occurred.
    pub fn persist_error(&self) -> Option<&RepoError> {
        self.persist_error.as_ref()
    }
}

/// Per-status member counts from one integrity-repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMetrics {
    counts: HashMap<MemberStatus, usize>,
    total: usize,
    repaired: usize,
}

impl StatusMetrics {
    /// Member count for one status. Every closed-set status is present,
    /// zero included.
    pub fn count(&self, status: MemberStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Total member count; always equals the sum of per-status counts.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Records whose status was repaired and persisted during this pass.
    pub fn repaired(&self) -> usize {
        self.repaired
    }
}

/// Conjunctive member query. `None` on an axis means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Status equality.
    pub status: Option<MemberStatus>,
    /// Tag-set membership, exact match.
    pub tag: Option<String>,
    /// Case-insensitive substring over `"first last"`.
    pub search: Option<String>,
}

struct DirectoryState<B> {
    backend: B,
    members: HashMap<MemberId, Member>,
    notes: HashMap<MemberId, Vec<Note>>,
    /// Persisted global custom tag list, written through on mutation.
    global_tags: Vec<String>,
    /// Members whose status was repaired at load and not yet persisted.
    pending_repairs: Vec<MemberId>,
    tag_cache: TtlCache<Vec<String>>,
    note_cache: HashMap<MemberId, Vec<Note>>,
}

/// The directory engine. One instance owns the whole record set; all
/// operations serialize on its internal lock.
pub struct DirectoryService<B: DirectoryBackend> {
    state: Mutex<DirectoryState<B>>,
    bus: InvalidationBus,
}

impl<B: DirectoryBackend> DirectoryService<B> {
    /// Loads the full record set from the backend with default config.
    pub fn load(backend: B) -> RepoResult<Self> {
        Self::load_with_config(backend, DirectoryConfig::default())
    }

    /// Loads the full record set from the backend.
    ///
    /// Status repair runs here, at the ingestion boundary: rows whose status
    /// text is absent or outside the closed set come up as `Active` and are
    /// queued for persistence on the next `refresh_metrics` pass.
    pub fn load_with_config(mut backend: B, config: DirectoryConfig) -> RepoResult<Self> {
        let persisted = backend.load_members()?;
        let mut members = HashMap::with_capacity(persisted.len());
        let mut pending_repairs = Vec::new();

        for row in persisted {
            let needs_repair = !matches!(
                row.status.as_deref().map(MemberStatus::parse),
                Some(Some(_))
            );
            let status = MemberStatus::parse_or_default(row.status.as_deref());
            if needs_repair {
                pending_repairs.push(row.uuid);
            }

            let mut tags = Vec::new();
            for tag in &row.tags {
                push_tag(&mut tags, tag);
            }

            members.insert(
                row.uuid,
                Member {
                    uuid: row.uuid,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: normalize_contact(row.email),
                    phone: normalize_contact(row.phone),
                    status,
                    tags,
                    birthday_month: row.birthday_month,
                    birthday_day: row.birthday_day,
                    joined_at: row.joined_at,
                },
            );
        }

        let mut notes: HashMap<MemberId, Vec<Note>> = HashMap::new();
        for note in backend.load_notes()? {
            notes.entry(note.member_uuid).or_default().push(note);
        }

        let global_tags = backend.global_tags()?;

        info!(
            "event=directory_load module=directory status=ok members={} notes={} repairs_pending={}",
            members.len(),
            notes.values().map(Vec::len).sum::<usize>(),
            pending_repairs.len()
        );

        Ok(Self {
            state: Mutex::new(DirectoryState {
                backend,
                members,
                notes,
                global_tags,
                pending_repairs,
                tag_cache: TtlCache::new(config.tag_cache_ttl),
                note_cache: HashMap::new(),
            }),
            bus: InvalidationBus::new(),
        })
    }

    // --- member CRUD ---

    /// Creates a member; `joined_at` is stamped here and never changes.
    pub fn add_member(&self, draft: MemberDraft) -> (MemberId, MutationReceipt) {
        let mut state = self.lock_state();
        let member = Member::from_draft(draft, now_epoch_ms());
        let id = member.uuid;

        let receipt = write_through("member_add", id, state.backend.insert_member(&member));
        state.members.insert(id, member);
        state.notes.insert(id, Vec::new());
        (id, receipt)
    }

    /// Updates identity/contact/birthday fields. Status, tags and
    /// `joined_at` are untouched.
    pub fn update_member_info(&self, id: MemberId, update: MemberInfoUpdate) -> MutationReceipt {
        let mut state = self.lock_state();
        let Some(member) = state.members.get_mut(&id) else {
            return MutationReceipt::unmatched();
        };

        member.first_name = update.first_name;
        member.last_name = update.last_name;
        member.email = normalize_contact(update.email);
        member.phone = normalize_contact(update.phone);
        member.birthday_month = update.birthday_month;
        member.birthday_day = update.birthday_day;

        let member = member.clone();
        write_through("member_update", id, state.backend.update_member(&member))
    }

    /// Status-update shorthand.
    pub fn update_member_status(&self, id: MemberId, status: MemberStatus) -> MutationReceipt {
        let mut state = self.lock_state();
        let Some(member) = state.members.get_mut(&id) else {
            return MutationReceipt::unmatched();
        };

        member.status = status;
        let member = member.clone();
        write_through("status_update", id, state.backend.update_member(&member))
    }

    /// Deletes a member, cascading its notes and evicting its note-cache
    /// entry.
    pub fn delete_member(&self, id: MemberId) -> MutationReceipt {
        let mut state = self.lock_state();
        if state.members.remove(&id).is_none() {
            return MutationReceipt::unmatched();
        }

        state.notes.remove(&id);
        state.note_cache.remove(&id);
        state.pending_repairs.retain(|pending| *pending != id);
        write_through("member_delete", id, state.backend.delete_member(id))
    }

    /// Gets one member; absence is a normal outcome.
    pub fn member(&self, id: MemberId) -> Option<Member> {
        self.lock_state().members.get(&id).cloned()
    }

    /// All members in base ordering (first name ascending).
    pub fn members(&self) -> Vec<Member> {
        let state = self.lock_state();
        let mut members: Vec<Member> = state.members.values().cloned().collect();
        members.sort_by(base_ordering);
        members
    }

    pub fn member_count(&self) -> usize {
        self.lock_state().members.len()
    }

    /// Exact first/last name lookup; the most recently joined match wins.
    pub fn find_member_by_name(&self, first_name: &str, last_name: &str) -> Option<Member> {
        let state = self.lock_state();
        state
            .members
            .values()
            .filter(|member| member.first_name == first_name && member.last_name == last_name)
            .max_by(|a, b| {
                a.joined_at
                    .cmp(&b.joined_at)
                    .then_with(|| a.uuid.cmp(&b.uuid))
            })
            .cloned()
    }

    // --- per-member tags ---

    /// Attaches a tag; duplicate or blank input is a no-op.
    ///
    /// Does not invalidate the vocabulary cache: the freshness window covers
    /// per-member tag churn by design.
    pub fn add_tag(&self, id: MemberId, tag: &str) -> MutationReceipt {
        let mut state = self.lock_state();
        let Some(member) = state.members.get_mut(&id) else {
            return MutationReceipt::unmatched();
        };

        if !push_tag(&mut member.tags, tag) {
            return MutationReceipt::applied();
        }

        let member = member.clone();
        write_through("tag_add", id, state.backend.update_member(&member))
    }

    /// Detaches a tag; absence is a no-op.
    pub fn remove_tag(&self, id: MemberId, tag: &str) -> MutationReceipt {
        let mut state = self.lock_state();
        let Some(member) = state.members.get_mut(&id) else {
            return MutationReceipt::unmatched();
        };

        let before = member.tags.len();
        member.tags.retain(|existing| existing != tag);
        if member.tags.len() == before {
            return MutationReceipt::applied();
        }

        let member = member.clone();
        write_through("tag_remove", id, state.backend.update_member(&member))
    }

    /// Number of members currently carrying the tag.
    pub fn count_members_with_tag(&self, tag: &str) -> usize {
        let state = self.lock_state();
        state
            .members
            .values()
            .filter(|member| member.has_tag(tag))
            .count()
    }

    // --- global tags + vocabulary ---

    /// Adds a tag to the persisted global list.
    ///
    /// Idempotent: a tag already present leaves the list, the cache and the
    /// bus untouched. Otherwise the vocabulary cache is invalidated and a
    /// change signal published.
    pub fn add_global_tag(&self, tag: &str) -> MutationReceipt {
        let Some(tag) = normalize_tag(tag) else {
            return MutationReceipt::unmatched();
        };

        let receipt = {
            let mut state = self.lock_state();
            if state.global_tags.contains(&tag) {
                return MutationReceipt::applied();
            }

            state.global_tags.push(tag);
            let snapshot = state.global_tags.clone();
            let receipt = write_through_settings(state.backend.set_global_tags(&snapshot));
            state.tag_cache.invalidate();
            receipt
        };

        self.bus.publish();
        receipt
    }

    /// Removes a tag from the persisted global list and strips it from
    /// every member carrying it, persisting each affected member.
    ///
    /// Stripping runs even when the tag was only member-attached and never
    /// in the global list. A tag found nowhere is a no-op.
    pub fn remove_global_tag(&self, tag: &str) -> MutationReceipt {
        let Some(tag) = normalize_tag(tag) else {
            return MutationReceipt::unmatched();
        };
        let tag = tag.as_str();

        let receipt = {
            let mut state = self.lock_state();
            let had_global = state.global_tags.iter().any(|existing| existing == tag);
            state.global_tags.retain(|existing| existing != tag);

            let affected: Vec<MemberId> = state
                .members
                .values()
                .filter(|member| member.has_tag(tag))
                .map(|member| member.uuid)
                .collect();

            if !had_global && affected.is_empty() {
                return MutationReceipt::unmatched();
            }

            let mut receipt = if had_global {
                let snapshot = state.global_tags.clone();
                write_through_settings(state.backend.set_global_tags(&snapshot))
            } else {
                MutationReceipt::applied()
            };

            for id in &affected {
                if let Some(member) = state.members.get_mut(id) {
                    member.tags.retain(|existing| existing != tag);
                    let member = member.clone();
                    let step = write_through("tag_strip", *id, state.backend.update_member(&member));
                    if receipt.persist_error.is_none() {
                        receipt.persist_error = step.persist_error;
                    }
                }
            }

            info!(
                "event=global_tag_remove module=directory status=ok stripped_members={}",
                affected.len()
            );
            state.tag_cache.invalidate();
            receipt
        };

        self.bus.publish();
        receipt
    }

    /// The custom tag vocabulary: union of the persisted global list and
    /// every member-attached tag, minus built-in default tags, sorted
    /// lexicographically. Served from cache within the freshness window.
    pub fn custom_tags(&self) -> Vec<String> {
        let mut state = self.lock_state();
        let now = Instant::now();
        if let Some(cached) = state.tag_cache.get(now) {
            return cached.clone();
        }

        let mut vocabulary = BTreeSet::new();
        for tag in &state.global_tags {
            if !is_default_tag(tag) {
                vocabulary.insert(tag.clone());
            }
        }
        for member in state.members.values() {
            for tag in &member.tags {
                if !is_default_tag(tag) {
                    vocabulary.insert(tag.clone());
                }
            }
        }

        let computed: Vec<String> = vocabulary.into_iter().collect();
        state.tag_cache.fill(computed.clone(), now);
        computed
    }

    // --- notes ---

    /// Appends an immutable note to a member, evicts that member's note
    /// cache entry and publishes a change signal. Returns `None` when the
    /// member does not exist.
    pub fn add_note(&self, id: MemberId, content: &str) -> (Option<NoteId>, MutationReceipt) {
        let result = {
            let mut state = self.lock_state();
            if !state.members.contains_key(&id) {
                return (None, MutationReceipt::unmatched());
            }

            let note = Note::new(id, content, now_epoch_ms());
            let note_id = note.uuid;
            let receipt = write_through("note_add", id, state.backend.insert_note(&note));
            state.notes.entry(id).or_default().push(note);
            state.note_cache.remove(&id);
            (Some(note_id), receipt)
        };

        self.bus.publish();
        result
    }

    /// A member's notes, newest first. Cached per member until the next
    /// note write or member delete; an unknown member yields an empty list.
    pub fn notes_for(&self, id: MemberId) -> Vec<Note> {
        let mut state = self.lock_state();
        if let Some(cached) = state.note_cache.get(&id) {
            return cached.clone();
        }

        let Some(owned) = state.notes.get(&id) else {
            return Vec::new();
        };

        let mut sorted = owned.clone();
        sorted.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.uuid.cmp(&b.uuid))
        });
        state.note_cache.insert(id, sorted.clone());
        sorted
    }

    // --- metrics ---

    /// Persists any pending status repairs, then counts members per status
    /// in a single pass. Never cached: this doubles as the integrity-repair
    /// pass. Post-condition: the counts sum to the member count.
    pub fn refresh_metrics(&self) -> StatusMetrics {
        let mut state = self.lock_state();

        let pending = std::mem::take(&mut state.pending_repairs);
        let mut repaired = 0usize;
        for id in pending {
            let Some(member) = state.members.get(&id) else {
                continue;
            };
            let member = member.clone();
            info!(
                "event=status_repaired module=directory id={} status={}",
                id, member.status
            );
            // Best effort: a failed repair write is logged by write_through
            // and not retried; the in-memory status is already valid.
            let _ = write_through("status_repair", id, state.backend.update_member(&member));
            repaired += 1;
        }

        let mut counts: HashMap<MemberStatus, usize> = MemberStatus::ALL
            .into_iter()
            .map(|status| (status, 0))
            .collect();
        for member in state.members.values() {
            if let Some(count) = counts.get_mut(&member.status) {
                *count += 1;
            }
        }

        let total = state.members.len();
        info!(
            "event=metrics_refresh module=directory status=ok total={total} repaired={repaired}"
        );

        StatusMetrics {
            counts,
            total,
            repaired,
        }
    }

    // --- queries ---

    /// Conjunctive filtering over the base ordering; filters only remove,
    /// never reorder.
    pub fn filter_members(&self, filter: &MemberFilter) -> Vec<Member> {
        let search = filter
            .search
            .as_ref()
            .map(|text| text.to_lowercase())
            .filter(|text| !text.is_empty());

        let mut members = self.members();
        members.retain(|member| {
            if let Some(status) = filter.status {
                if member.status != status {
                    return false;
                }
            }
            if let Some(tag) = &filter.tag {
                if !member.has_tag(tag) {
                    return false;
                }
            }
            if let Some(needle) = &search {
                if !member.full_name().to_lowercase().contains(needle) {
                    return false;
                }
            }
            true
        });
        members
    }

    /// Email addresses of members matching the filters; members without an
    /// email are skipped.
    pub fn filtered_emails(&self, status: Option<MemberStatus>, tag: Option<&str>) -> Vec<String> {
        self.filter_members(&MemberFilter {
            status,
            tag: tag.map(str::to_string),
            search: None,
        })
        .into_iter()
        .filter_map(|member| member.email)
        .collect()
    }

    /// Phone numbers of members matching the filters; members without a
    /// phone are skipped.
    pub fn filtered_phone_numbers(
        &self,
        status: Option<MemberStatus>,
        tag: Option<&str>,
    ) -> Vec<String> {
        self.filter_members(&MemberFilter {
            status,
            tag: tag.map(str::to_string),
            search: None,
        })
        .into_iter()
        .filter_map(|member| member.phone)
        .collect()
    }

    // --- observers ---

    /// Subscribes to the payload-free change signal, published on tag
    /// vocabulary mutations and note writes. Subscribers re-read state;
    /// lost or duplicated signals are tolerated.
    pub fn subscribe_changes(&self) -> Receiver<DirectoryChanged> {
        self.bus.subscribe()
    }

    // A poisoned lock means a prior operation panicked mid-mutation; the
    // record set is still structurally sound, so recover rather than turning
    // every later call into a panic.
    fn lock_state(&self) -> MutexGuard<'_, DirectoryState<B>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_through(op: &'static str, id: MemberId, result: RepoResult<()>) -> MutationReceipt {
    match result {
        Ok(()) => MutationReceipt::applied(),
        Err(err) => {
            warn!("event=persist_failed module=directory op={op} id={id} error={err}");
            MutationReceipt {
                matched: true,
                persist_error: Some(err),
            }
        }
    }
}

fn write_through_settings(result: RepoResult<()>) -> MutationReceipt {
    match result {
        Ok(()) => MutationReceipt::applied(),
        Err(err) => {
            warn!("event=persist_failed module=directory op=global_tags error={err}");
            MutationReceipt {
                matched: true,
                persist_error: Some(err),
            }
        }
    }
}

fn base_ordering(a: &Member, b: &Member) -> Ordering {
    a.first_name
        .cmp(&b.first_name)
        .then_with(|| a.last_name.cmp(&b.last_name))
        .then_with(|| a.uuid.cmp(&b.uuid))
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
