//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `shepherd_core` linkage.
//! - Bootstrap file logging so the core's `event=` lines land somewhere.

use shepherd_core::db::open_db_in_memory;
use shepherd_core::{
    default_log_level, init_logging, logging_status, DirectoryService, MemberDraft,
    SqliteDirectoryStore,
};

fn main() {
    let log_dir = std::env::temp_dir().join("shepherd-logs");
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("shepherd_cli logging init failed: {err}");
    }
    if let Some((level, dir)) = logging_status() {
        println!("shepherd_cli logging level={level} dir={}", dir.display());
    }

    println!("shepherd_core ping={}", shepherd_core::ping());
    println!("shepherd_core version={}", shepherd_core::core_version());

    // Exercise the full stack once against a throwaway in-memory directory.
    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("shepherd_core db bootstrap failed: {err}");
            std::process::exit(1);
        }
    };

    let directory = match DirectoryService::load(SqliteDirectoryStore::new(conn)) {
        Ok(directory) => directory,
        Err(err) => {
            eprintln!("shepherd_core directory load failed: {err}");
            std::process::exit(1);
        }
    };

    let (_, receipt) = directory.add_member(MemberDraft {
        first_name: "Smoke".to_string(),
        last_name: "Test".to_string(),
        ..MemberDraft::default()
    });
    let metrics = directory.refresh_metrics();
    println!(
        "shepherd_core smoke members={} durable={}",
        metrics.total(),
        receipt.is_durable()
    );
}
