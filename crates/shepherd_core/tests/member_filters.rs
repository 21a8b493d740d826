use shepherd_core::db::open_db_in_memory;
use shepherd_core::{
    DirectoryService, MemberDraft, MemberFilter, MemberStatus, SqliteDirectoryStore,
};

fn seeded_directory() -> DirectoryService<SqliteDirectoryStore> {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::load(SqliteDirectoryStore::new(conn)).unwrap();

    directory.add_member(MemberDraft {
        first_name: "Ana".to_string(),
        last_name: "Reyes".to_string(),
        email: Some("ana@example.com".to_string()),
        status: Some(MemberStatus::Active),
        tags: vec!["Leader".to_string()],
        ..MemberDraft::default()
    });
    directory.add_member(MemberDraft {
        first_name: "Ben".to_string(),
        last_name: "Okafor".to_string(),
        phone: Some("+15550002".to_string()),
        status: Some(MemberStatus::Active),
        ..MemberDraft::default()
    });
    directory.add_member(MemberDraft {
        first_name: "Cal".to_string(),
        last_name: "Ito".to_string(),
        email: Some("cal@example.com".to_string()),
        phone: Some("+15550003".to_string()),
        status: Some(MemberStatus::Inactive),
        tags: vec!["Leader".to_string()],
        ..MemberDraft::default()
    });

    directory
}

#[test]
fn status_and_tag_filters_compose_conjunctively() {
    let directory = seeded_directory();

    let matched = directory.filter_members(&MemberFilter {
        status: Some(MemberStatus::Active),
        tag: Some("Leader".to_string()),
        search: None,
    });

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].first_name, "Ana");
}

#[test]
fn empty_filter_returns_everyone_in_base_order() {
    let directory = seeded_directory();

    let all = directory.filter_members(&MemberFilter::default());
    let names: Vec<String> = all.into_iter().map(|member| member.first_name).collect();
    assert_eq!(names, vec!["Ana", "Ben", "Cal"]);
}

#[test]
fn search_matches_full_name_case_insensitively() {
    let directory = seeded_directory();

    let matched = directory.filter_members(&MemberFilter {
        search: Some("okaf".to_string()),
        ..MemberFilter::default()
    });
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].first_name, "Ben");

    // Substring spanning the first/last name boundary.
    let spanning = directory.filter_members(&MemberFilter {
        search: Some("na rey".to_string()),
        ..MemberFilter::default()
    });
    assert_eq!(spanning.len(), 1);
    assert_eq!(spanning[0].first_name, "Ana");
}

#[test]
fn filters_only_remove_and_never_reorder() {
    let directory = seeded_directory();

    let actives = directory.filter_members(&MemberFilter {
        status: Some(MemberStatus::Active),
        ..MemberFilter::default()
    });
    let names: Vec<String> = actives.into_iter().map(|member| member.first_name).collect();
    assert_eq!(names, vec!["Ana", "Ben"]);
}

#[test]
fn filtered_emails_require_a_non_empty_address() {
    let directory = seeded_directory();

    let all_emails = directory.filtered_emails(None, None);
    assert_eq!(
        all_emails,
        vec!["ana@example.com".to_string(), "cal@example.com".to_string()]
    );

    let active_leader_emails =
        directory.filtered_emails(Some(MemberStatus::Active), Some("Leader"));
    assert_eq!(active_leader_emails, vec!["ana@example.com".to_string()]);
}

#[test]
fn filtered_phone_numbers_require_a_non_empty_number() {
    let directory = seeded_directory();

    let numbers = directory.filtered_phone_numbers(Some(MemberStatus::Active), None);
    assert_eq!(numbers, vec!["+15550002".to_string()]);

    let leader_numbers = directory.filtered_phone_numbers(None, Some("Leader"));
    assert_eq!(leader_numbers, vec!["+15550003".to_string()]);
}
