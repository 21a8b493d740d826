use shepherd_core::db::{open_db, open_db_in_memory};
use shepherd_core::{DirectoryService, MemberStatus, SqliteDirectoryStore};

const SEED_MIXED_STATUSES: &str = "INSERT INTO members (uuid, first_name, last_name, status, joined_at) VALUES
    ('0b0a8a3e-8f3e-4f0c-9a3b-000000000001', 'Ana', 'Reyes', 'Active', 1000),
    ('0b0a8a3e-8f3e-4f0c-9a3b-000000000002', 'Ben', 'Okafor', 'At Risk', 1001),
    ('0b0a8a3e-8f3e-4f0c-9a3b-000000000003', 'Cal', 'Ito', 'Critical', 1002),
    ('0b0a8a3e-8f3e-4f0c-9a3b-000000000004', 'Dee', 'Nur', 'Inactive', 1003),
    ('0b0a8a3e-8f3e-4f0c-9a3b-000000000005', 'Eve', 'Hart', 'retired', 1004),
    ('0b0a8a3e-8f3e-4f0c-9a3b-000000000006', 'Fay', 'Lund', NULL, 1005);";

#[test]
fn metrics_sum_matches_member_count_with_garbage_statuses_on_disk() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(SEED_MIXED_STATUSES).unwrap();

    let directory = DirectoryService::load(SqliteDirectoryStore::new(conn)).unwrap();
    let metrics = directory.refresh_metrics();

    let sum: usize = MemberStatus::ALL
        .into_iter()
        .map(|status| metrics.count(status))
        .sum();
    assert_eq!(sum, metrics.total());
    assert_eq!(metrics.total(), 6);
    assert_eq!(metrics.repaired(), 2);

    // Repaired records count under the default status.
    assert_eq!(metrics.count(MemberStatus::Active), 3);
    assert_eq!(metrics.count(MemberStatus::AtRisk), 1);
    assert_eq!(metrics.count(MemberStatus::Critical), 1);
    assert_eq!(metrics.count(MemberStatus::Inactive), 1);
}

#[test]
fn every_member_carries_a_closed_set_status_after_load() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(SEED_MIXED_STATUSES).unwrap();

    let directory = DirectoryService::load(SqliteDirectoryStore::new(conn)).unwrap();
    for member in directory.members() {
        assert!(MemberStatus::ALL.contains(&member.status));
    }
}

#[test]
fn status_repairs_are_persisted_by_the_metrics_pass() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shepherd.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO members (uuid, first_name, last_name, status, joined_at)
             VALUES ('0b0a8a3e-8f3e-4f0c-9a3b-000000000007', 'Gus', 'Wren', 'bogus', 1000);",
        )
        .unwrap();
        let directory = DirectoryService::load(SqliteDirectoryStore::new(conn)).unwrap();
        let metrics = directory.refresh_metrics();
        assert_eq!(metrics.repaired(), 1);
    }

    // A fresh load sees the repaired text; nothing left to repair.
    let conn = open_db(&path).unwrap();
    let reloaded = DirectoryService::load(SqliteDirectoryStore::new(conn)).unwrap();
    let metrics = reloaded.refresh_metrics();
    assert_eq!(metrics.repaired(), 0);
    assert_eq!(metrics.count(MemberStatus::Active), 1);
}

#[test]
fn refresh_is_recomputed_after_each_mutation() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO members (uuid, first_name, last_name, status, joined_at)
         VALUES ('0b0a8a3e-8f3e-4f0c-9a3b-000000000008', 'Ida', 'Voss', 'Active', 1000);",
    )
    .unwrap();
    let directory = DirectoryService::load(SqliteDirectoryStore::new(conn)).unwrap();
    let id = directory.members()[0].uuid;

    assert_eq!(directory.refresh_metrics().count(MemberStatus::Active), 1);

    let receipt = directory.update_member_status(id, MemberStatus::Inactive);
    assert!(receipt.is_durable());

    let metrics = directory.refresh_metrics();
    assert_eq!(metrics.count(MemberStatus::Active), 0);
    assert_eq!(metrics.count(MemberStatus::Inactive), 1);
    assert_eq!(metrics.total(), 1);
}
