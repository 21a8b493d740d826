//! Tag vocabulary rules.
//!
//! # Responsibility
//! - Define the fixed built-in default tag set.
//! - Normalize free-form tag input before it reaches a member's tag list.
//!
//! # Invariants
//! - The custom-tag vocabulary never includes a default-tag name.
//! - Tag comparison is exact; case is significant ("Leader" != "leader").

/// Built-in tag names shipped with the app. They can be attached to members
/// like any other tag but are excluded from the user-visible custom
/// vocabulary.
pub const DEFAULT_TAGS: [&str; 4] = ["Leader", "New Member", "Prayer Warrior", "Volunteer"];

/// Whether the given name belongs to the built-in default set.
pub fn is_default_tag(tag: &str) -> bool {
    DEFAULT_TAGS.contains(&tag)
}

/// Default tag names sorted lexicographically, for filter chip rows.
pub fn sorted_default_tags() -> Vec<&'static str> {
    let mut tags = DEFAULT_TAGS.to_vec();
    tags.sort_unstable();
    tags
}

/// Trims one tag value; blank input yields `None`.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Appends a normalized tag unless it is blank or already present.
/// Returns whether the list changed.
pub fn push_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    match normalize_tag(tag) {
        Some(value) if !tags.contains(&value) => {
            tags.push(value);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_default_tag, normalize_tag, push_tag, sorted_default_tags};

    #[test]
    fn default_tag_membership_is_exact() {
        assert!(is_default_tag("Leader"));
        assert!(!is_default_tag("leader"));
        assert!(!is_default_tag("Youth"));
    }

    #[test]
    fn sorted_default_tags_are_lexicographic() {
        let tags = sorted_default_tags();
        let mut expected = tags.clone();
        expected.sort_unstable();
        assert_eq!(tags, expected);
    }

    #[test]
    fn normalize_trims_and_rejects_blank() {
        assert_eq!(normalize_tag("  Choir "), Some("Choir".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn push_tag_skips_duplicates_and_keeps_order() {
        let mut tags = Vec::new();
        assert!(push_tag(&mut tags, "Choir"));
        assert!(push_tag(&mut tags, "Youth"));
        assert!(!push_tag(&mut tags, "Choir "));
        assert_eq!(tags, vec!["Choir".to_string(), "Youth".to_string()]);
    }
}
