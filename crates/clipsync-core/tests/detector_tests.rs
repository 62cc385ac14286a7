use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;

use clipsync_core::analysis::DuplicateDetector;
use clipsync_core::matching::{Algorithm, FuzzyMatcher, MatchType, TitleCandidates};
use clipsync_core::{Inventory, InventoryEntry};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn make_inventory(items: &[(&str, NaiveDateTime)]) -> Inventory {
    items
        .iter()
        .map(|(name, modified_at)| InventoryEntry {
            name: name.to_string(),
            modified_at: *modified_at,
            subfolder: String::new(),
            full_path: PathBuf::from(format!("/volume/clips/{}.mp4", name)),
        })
        .collect()
}

#[test]
fn test_copy_suffix_grouped_with_original_and_newest_kept() {
    let inventory = make_inventory(&[("Test Video", at(2, 0)), ("Test Video (1)", at(1, 0))]);
    let groups = DuplicateDetector::new(0.90).find_duplicates(&inventory, None);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].recommended, "Test Video");
    assert_eq!(groups[0].to_delete, vec!["Test Video (1)".to_string()]);
}

#[test]
fn test_newer_copy_is_kept_over_original() {
    let inventory = make_inventory(&[("Test Video", at(1, 0)), ("Test Video (1)", at(1, 5))]);
    let groups = DuplicateDetector::new(0.90).find_duplicates(&inventory, None);

    assert_eq!(groups[0].recommended, "Test Video (1)");
    assert_eq!(groups[0].to_delete, vec!["Test Video".to_string()]);
}

#[test]
fn test_distinct_titles_produce_no_groups() {
    let inventory = make_inventory(&[
        ("Video One", at(1, 0)),
        ("Video Two", at(2, 0)),
        ("Video Three", at(3, 0)),
    ]);
    assert!(DuplicateDetector::new(0.95)
        .find_duplicates(&inventory, None)
        .is_empty());
}

#[test]
fn test_members_join_through_anchor_only() {
    // anchor~a and anchor~b score 16/18; a~b scores 16/20.
    let inventory = make_inventory(&[
        ("abcdefgh", at(1, 0)),
        ("abcdefghij", at(2, 0)),
        ("xyabcdefgh", at(3, 0)),
    ]);
    let groups = DuplicateDetector::new(0.85).find_duplicates(&inventory, None);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(groups[0].recommended, "xyabcdefgh");
}

#[test]
fn test_anchor_order_changes_grouping() {
    // Same three names, but the first anchor now only reaches one of them.
    let inventory = make_inventory(&[
        ("abcdefghij", at(1, 0)),
        ("abcdefgh", at(2, 0)),
        ("xyabcdefgh", at(3, 0)),
    ]);
    let groups = DuplicateDetector::new(0.85).find_duplicates(&inventory, None);

    assert_eq!(groups.len(), 1);
    let names: Vec<&str> = groups[0].members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["abcdefghij", "abcdefgh"]);
}

#[test]
fn test_claimed_members_are_not_reused_as_anchors() {
    let inventory = make_inventory(&[
        ("Final Table", at(1, 0)),
        ("Final Table (1)", at(2, 0)),
        ("Final Table_copy", at(3, 0)),
        ("Heads Up", at(1, 0)),
        ("Heads Up [duplicate]", at(2, 0)),
    ]);
    let groups = DuplicateDetector::default().find_duplicates(&inventory, None);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(groups[0].recommended, "Final Table_copy");
    assert_eq!(groups[1].recommended, "Heads Up [duplicate]");
}

#[test]
fn test_backend_swap_keeps_detector_contract() {
    let inventory = make_inventory(&[("Test Video", at(2, 0)), ("Test Video (1)", at(1, 0))]);
    let detector = DuplicateDetector::new(0.90).with_algorithm(Algorithm::EditDistance);

    assert_eq!(detector.algorithm_name(), "edit_distance");
    assert_eq!(detector.find_duplicates(&inventory, None).len(), 1);
}

#[test]
fn test_title_matching_against_spreadsheet_rows() {
    let candidates = TitleCandidates::from_titles([
        ("Test Video", 2),
        ("Amazing Poker Hand", 3),
        ("Hero Call On The River", 4),
    ]);
    let matcher = FuzzyMatcher::new(0.85);
    let results = matcher.batch_find_matches(
        &[
            "Test Video",
            "Amazing Poker Hand (1)",
            "Hero Call On The Rivr",
            "Something Else Entirely",
        ],
        &candidates,
    );

    assert_eq!(results[0].match_type, MatchType::Exact);
    assert_eq!(results[0].matched_row, Some(2));
    assert_eq!(results[1].match_type, MatchType::NormalizedAggressive);
    assert_eq!(results[1].matched_row, Some(3));
    assert_eq!(results[2].match_type, MatchType::Fuzzy);
    assert_eq!(results[2].matched_row, Some(4));
    assert!(!results[3].matched);
    assert_eq!(results[3].matched_row, None);
}
