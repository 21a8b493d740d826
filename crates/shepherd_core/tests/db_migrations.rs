use rusqlite::Connection;
use shepherd_core::db::migrations::latest_version;
use shepherd_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "members");
    assert_table_exists(&conn, "member_tags");
    assert_table_exists(&conn, "notes");
    assert_table_exists(&conn, "settings");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shepherd.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "members");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_member_row_cascades_tag_links_and_notes() {
    let conn = open_db_in_memory().unwrap();

    conn.execute_batch(
        "INSERT INTO members (uuid, first_name, last_name, status, joined_at)
         VALUES ('0b0a8a3e-8f3e-4f0c-9a3b-111111111111', 'Ana', 'Reyes', 'Active', 1000);
         INSERT INTO member_tags (member_uuid, position, tag)
         VALUES ('0b0a8a3e-8f3e-4f0c-9a3b-111111111111', 0, 'Choir');
         INSERT INTO notes (uuid, member_uuid, content, created_at)
         VALUES ('0b0a8a3e-8f3e-4f0c-9a3b-222222222222',
                 '0b0a8a3e-8f3e-4f0c-9a3b-111111111111', 'first visit', 2000);",
    )
    .unwrap();

    conn.execute(
        "DELETE FROM members WHERE uuid = '0b0a8a3e-8f3e-4f0c-9a3b-111111111111';",
        [],
    )
    .unwrap();

    let tag_links: i64 = conn
        .query_row("SELECT COUNT(*) FROM member_tags;", [], |row| row.get(0))
        .unwrap();
    let notes: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_links, 0);
    assert_eq!(notes, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
