use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};

use super::truncate;
use crate::inventory::{FileSizes, Inventory};
use crate::matching::{normalize_aggressive, Algorithm, FuzzyMatcher};

pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub name: String,
    pub full_path: PathBuf,
    pub modified_at: NaiveDateTime,
    /// 0 when the size is unknown.
    pub size: u64,
}

/// Files judged to be copies of one another. Always has two or more members.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub canonical_name: String,
    pub members: Vec<GroupMember>,
    /// Score of each member against the anchor; the anchor itself scores 1.0.
    pub similarity_scores: Vec<f64>,
    pub recommended: String,
    pub to_delete: Vec<String>,
}

impl DuplicateGroup {
    /// Returns `None` for fewer than two members. The newest member is kept;
    /// on a tie the earliest one in member order wins.
    pub fn new(
        canonical_name: String,
        members: Vec<GroupMember>,
        similarity_scores: Vec<f64>,
    ) -> Option<Self> {
        if members.len() < 2 || members.len() != similarity_scores.len() {
            return None;
        }

        let mut keeper = 0;
        for (idx, member) in members.iter().enumerate().skip(1) {
            if member.modified_at > members[keeper].modified_at {
                keeper = idx;
            }
        }

        let recommended = members[keeper].name.clone();
        let to_delete = members
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != keeper)
            .map(|(_, member)| member.name.clone())
            .collect();

        Some(Self {
            canonical_name,
            members,
            similarity_scores,
            recommended,
            to_delete,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn keeper(&self) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.name == self.recommended)
    }

    pub fn score_of(&self, name: &str) -> Option<f64> {
        self.members
            .iter()
            .zip(&self.similarity_scores)
            .find(|(member, _)| member.name == name)
            .map(|(_, score)| *score)
    }

    pub fn members_with_scores(&self) -> impl Iterator<Item = (&GroupMember, f64)> {
        self.members.iter().zip(self.similarity_scores.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateStatistics {
    pub total_groups: usize,
    pub total_files_in_groups: usize,
    pub total_duplicates: usize,
    pub files_to_keep: usize,
}

/// Groups inventory entries whose copy-suffix-insensitive names are similar.
///
/// Grouping is anchor-based: each unclaimed entry is compared only against
/// the anchor that opened the group, never against the other members, so
/// two members of one group need not be similar to each other.
#[derive(Debug)]
pub struct DuplicateDetector {
    threshold: f64,
    matcher: FuzzyMatcher,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_THRESHOLD)
    }
}

impl DuplicateDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            matcher: FuzzyMatcher::new(threshold),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.matcher = self.matcher.with_algorithm(algorithm);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.matcher.algorithm_name()
    }

    /// Partition the inventory into duplicate groups, in inventory order.
    pub fn find_duplicates(&self, inventory: &Inventory, sizes: Option<&FileSizes>) -> Vec<DuplicateGroup> {
        let entries: Vec<_> = inventory.iter().map(|(_, entry)| entry).collect();
        let cores: Vec<String> = entries
            .iter()
            .map(|entry| normalize_aggressive(&entry.name))
            .collect();
        let size_of = |name: &str| sizes.and_then(|s| s.get(name)).copied().unwrap_or(0);

        let mut claimed = vec![false; entries.len()];
        let mut groups = Vec::new();

        for i in 0..entries.len() {
            if claimed[i] {
                continue;
            }

            let anchor = entries[i];
            let mut members = vec![GroupMember {
                name: anchor.name.clone(),
                full_path: anchor.full_path.clone(),
                modified_at: anchor.modified_at,
                size: size_of(&anchor.name),
            }];
            let mut scores = vec![1.0];

            for j in (i + 1)..entries.len() {
                if claimed[j] {
                    continue;
                }

                let score = self.matcher.similarity(&cores[i], &cores[j]);
                if score >= self.threshold {
                    let other = entries[j];
                    members.push(GroupMember {
                        name: other.name.clone(),
                        full_path: other.full_path.clone(),
                        modified_at: other.modified_at,
                        size: size_of(&other.name),
                    });
                    scores.push(score);
                    claimed[j] = true;
                }
            }

            if let Some(group) = DuplicateGroup::new(cores[i].clone(), members, scores) {
                claimed[i] = true;
                debug!(
                    "Duplicate group '{}': {} files, keeping '{}'",
                    group.canonical_name,
                    group.len(),
                    group.recommended
                );
                groups.push(group);
            }
        }

        info!(
            "Found {} duplicate groups among {} files (threshold {:.2})",
            groups.len(),
            entries.len(),
            self.threshold
        );
        groups
    }

    /// Every non-keeper name across all groups.
    pub fn get_duplicates_to_mark(&self, inventory: &Inventory) -> BTreeSet<String> {
        self.find_duplicates(inventory, None)
            .into_iter()
            .flat_map(|group| group.to_delete)
            .collect()
    }

    pub fn generate_report(&self, groups: &[DuplicateGroup]) -> String {
        if groups.is_empty() {
            return "No duplicate files found.".to_string();
        }

        let mut lines = vec!["=".repeat(60)];
        lines.push(format!("Duplicate report: {} groups found", groups.len()));
        lines.push("=".repeat(60));
        lines.push(String::new());

        let total_duplicates: usize = groups.iter().map(|g| g.to_delete.len()).sum();
        lines.push(format!("Total duplicate files: {}", total_duplicates));
        lines.push(String::new());

        for (i, group) in groups.iter().enumerate() {
            lines.push(format!("Group {}: {}...", i + 1, truncate(&group.canonical_name, 50)));
            lines.push("-".repeat(40));

            for (member, score) in group.members_with_scores() {
                let marker = if member.name == group.recommended {
                    "[KEEP]"
                } else {
                    "[DUPLICATE]"
                };
                lines.push(format!("  - {}", truncate(&member.name, 60)));
                lines.push(format!(
                    "    date: {}, similarity: {:.2} {}",
                    member.modified_at.format("%Y-%m-%d"),
                    score,
                    marker
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    pub fn get_statistics(&self, groups: &[DuplicateGroup]) -> DuplicateStatistics {
        let total_files_in_groups: usize = groups.iter().map(|g| g.len()).sum();
        let total_duplicates: usize = groups.iter().map(|g| g.to_delete.len()).sum();

        DuplicateStatistics {
            total_groups: groups.len(),
            total_files_in_groups,
            total_duplicates,
            files_to_keep: total_files_in_groups - total_duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryEntry;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn inventory(items: &[(&str, u32)]) -> Inventory {
        items
            .iter()
            .map(|(name, day)| InventoryEntry {
                name: name.to_string(),
                modified_at: at(*day),
                subfolder: String::new(),
                full_path: PathBuf::from(format!("/media/{}.mp4", name)),
            })
            .collect()
    }

    #[test]
    fn test_group_keeps_newest() {
        let inv = inventory(&[("Test Video", 2), ("Test Video (1)", 1)]);
        let groups = DuplicateDetector::new(0.90).find_duplicates(&inv, None);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].recommended, "Test Video");
        assert_eq!(groups[0].to_delete, vec!["Test Video (1)".to_string()]);
        assert_eq!(groups[0].canonical_name, "testvideo");
        assert_eq!(groups[0].similarity_scores, vec![1.0, 1.0]);
    }

    #[test]
    fn test_keeper_tie_prefers_anchor() {
        let inv = inventory(&[("Clip", 3), ("Clip_copy", 3)]);
        let groups = DuplicateDetector::default().find_duplicates(&inv, None);

        assert_eq!(groups[0].recommended, "Clip");
    }

    #[test]
    fn test_distinct_titles_do_not_group() {
        let inv = inventory(&[("Video One", 1), ("Video Two", 2), ("Video Three", 3)]);
        let groups = DuplicateDetector::new(0.95).find_duplicates(&inv, None);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_new_rejects_singletons() {
        let member = GroupMember {
            name: "solo".to_string(),
            full_path: PathBuf::from("/solo.mp4"),
            modified_at: at(1),
            size: 0,
        };
        assert!(DuplicateGroup::new("solo".to_string(), vec![member], vec![1.0]).is_none());
    }

    #[test]
    fn test_sizes_attached_to_members() {
        let inv = inventory(&[("Hand", 1), ("Hand (1)", 2)]);
        let mut sizes = FileSizes::new();
        sizes.insert("Hand".to_string(), 500);

        let groups = DuplicateDetector::default().find_duplicates(&inv, Some(&sizes));
        assert_eq!(groups[0].members[0].size, 500);
        assert_eq!(groups[0].members[1].size, 0);
        assert_eq!(groups[0].keeper().unwrap().name, "Hand (1)");
    }

    #[test]
    fn test_duplicates_to_mark_and_statistics() {
        let inv = inventory(&[
            ("Alpha", 1),
            ("Alpha (1)", 2),
            ("Alpha (2)", 3),
            ("Bravo", 1),
            ("Bravo_copy", 2),
            ("Charlie", 1),
        ]);
        let detector = DuplicateDetector::default();

        let marked = detector.get_duplicates_to_mark(&inv);
        let expected: BTreeSet<String> = ["Alpha", "Alpha (1)", "Bravo"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(marked, expected);

        let groups = detector.find_duplicates(&inv, None);
        let stats = detector.get_statistics(&groups);
        assert_eq!(
            stats,
            DuplicateStatistics {
                total_groups: 2,
                total_files_in_groups: 5,
                total_duplicates: 3,
                files_to_keep: 2,
            }
        );
    }

    #[test]
    fn test_report_layout() {
        let detector = DuplicateDetector::default();
        assert_eq!(detector.generate_report(&[]), "No duplicate files found.");

        let inv = inventory(&[("Test Video", 2), ("Test Video (1)", 1)]);
        let report = detector.generate_report(&detector.find_duplicates(&inv, None));

        assert!(report.contains("1 groups found"));
        assert!(report.contains("Total duplicate files: 1"));
        assert!(report.contains("Group 1: testvideo..."));
        assert!(report.contains("date: 2024-05-02, similarity: 1.00 [KEEP]"));
        assert!(report.contains("[DUPLICATE]"));
    }
}
