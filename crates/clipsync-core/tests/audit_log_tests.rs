use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use clipsync_core::analysis::DeletionCandidate;
use clipsync_core::storage::{AuditAction, AuditLogDocument, DeletionAuditLog, CSV_HEADER};

fn make_candidate(name: &str, size: u64) -> DeletionCandidate {
    DeletionCandidate {
        name: name.to_string(),
        full_path: PathBuf::from(format!("/volume/clips/{}.mp4", name)),
        size,
        modified_at: NaiveDate::from_ymd_opt(2023, 11, 20)
            .unwrap()
            .and_hms_opt(18, 45, 0)
            .unwrap(),
        reason: "duplicate of 'Keeper'".to_string(),
        similarity_score: 1.0,
        size_variance: 0.01,
        kept_file: "Keeper".to_string(),
    }
}

#[test]
fn test_rotation_evicts_oldest_entries() {
    let dir = tempdir().unwrap();
    let mut log = DeletionAuditLog::open(dir.path().join("audit.json")).with_max_entries(3);

    for i in 0..5 {
        log.log_deletion(&make_candidate(&format!("clip{}", i), 10), true)
            .unwrap();
    }

    assert_eq!(log.len(), 3);
    let names: Vec<String> = log
        .get_recent_entries(10)
        .into_iter()
        .map(|e| e.filename)
        .collect();
    assert_eq!(names, vec!["clip4", "clip3", "clip2"]);
}

#[test]
fn test_entries_persist_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.json");

    {
        let mut log = DeletionAuditLog::open(&path);
        log.log_deletion(&make_candidate("kept-on-disk", 42), false)
            .unwrap();
    }

    let text = fs::read_to_string(&path).unwrap();
    let doc: AuditLogDocument = serde_json::from_str(&text).unwrap();
    assert_eq!(doc.version, "1.0");
    assert_eq!(doc.total_entries, 1);
    assert_eq!(doc.entries[0].action, AuditAction::Delete);
    assert_eq!(doc.entries[0].mtime, "2023-11-20T18:45:00.000000");
    assert!(text.contains("\"action\": \"DELETE\""));

    let reopened = DeletionAuditLog::open(&path);
    let stats = reopened.get_statistics();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.files_deleted, 1);
    assert_eq!(stats.total_bytes_freed, 42);
    assert_eq!(stats.log_created, doc.created);
}

#[test]
fn test_corrupt_log_is_replaced_with_fresh_one() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.json");
    fs::write(&path, "{ this is not json").unwrap();

    let mut log = DeletionAuditLog::open(&path);
    assert_eq!(log.get_statistics().total_entries, 0);

    log.log_error("broken", Path::new("/volume/clips/broken.mp4"), "permission denied")
        .unwrap();

    let doc: AuditLogDocument =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc.entries.len(), 1);
    assert_eq!(doc.entries[0].action, AuditAction::Error);
}

#[test]
fn test_entry_missing_fields_is_treated_as_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.json");
    fs::write(
        &path,
        r#"{"version": "1.0", "entries": [{"timestamp": "2024-01-01T00:00:00", "action": "DELETE"}]}"#,
    )
    .unwrap();

    let log = DeletionAuditLog::open(&path);
    assert!(log.is_empty());
}

#[test]
fn test_csv_export_writes_header_and_rows() {
    let dir = tempdir().unwrap();
    let mut log = DeletionAuditLog::open(dir.path().join("audit.json"));
    log.log_deletion(&make_candidate("River Bluff (1)", 1_000), true)
        .unwrap();
    log.log_error("Gone", Path::new("/volume/clips/Gone.mp4"), "file does not exist")
        .unwrap();

    let csv_path = dir.path().join("export.csv");
    let written = log.export_csv(&csv_path).unwrap();
    assert_eq!(written, 2);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, CSV_HEADER.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "DELETE");
    assert_eq!(&rows[0][2], "River Bluff (1)");
    assert_eq!(&rows[0][4], "1000");
    assert_eq!(&rows[0][10], "true");
    assert_eq!(&rows[1][1], "ERROR");
    assert_eq!(&rows[1][5], "");
}

#[test]
fn test_csv_export_of_empty_log_has_header_only() {
    let dir = tempdir().unwrap();
    let log = DeletionAuditLog::open(dir.path().join("audit.json"));

    let csv_path = dir.path().join("empty.csv");
    assert_eq!(log.export_csv(&csv_path).unwrap(), 0);

    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.trim_end(), CSV_HEADER.join(","));
}

#[test]
fn test_clear_resets_and_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.json");
    let mut log = DeletionAuditLog::open(&path);
    log.log_deletion(&make_candidate("a", 1), false).unwrap();

    log.clear().unwrap();
    assert!(log.is_empty());

    let reopened = DeletionAuditLog::open(&path);
    assert!(reopened.is_empty());
    assert_eq!(reopened.get_statistics().files_deleted, 0);
}
