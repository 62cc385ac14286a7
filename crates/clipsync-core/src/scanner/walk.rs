use chrono::{DateTime, Local, NaiveDateTime};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::inventory::{FileRecord, FileSizes, Inventory, InventoryEntry};

/// Walk `root` and collect every file whose extension is in `extensions`.
///
/// Extensions are compared case-insensitively and may be given with or
/// without the leading dot. Results are sorted by path so inventory order is
/// reproducible across runs. Unreadable entries are logged and skipped.
pub fn scan_media_folder<S: AsRef<str>>(
    root: &Path,
    extensions: &[S],
    recursive: bool,
) -> Result<Vec<FileRecord>, Error> {
    if !root.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Media folder not found: {}", root.display()),
        )));
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
        .collect();

    let mut walker = WalkDir::new(root).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut records = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let extension = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => continue,
        };
        if !wanted.contains(&extension) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Skipping {} (metadata error: {})", path.display(), err);
                continue;
            }
        };

        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                warn!("Skipping {} (name is not valid UTF-8)", path.display());
                continue;
            }
        };

        records.push(FileRecord {
            name,
            full_path: path.to_path_buf(),
            size: metadata.len(),
            modified_at: to_local(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)),
            subfolder: relative_subfolder(root, path),
        });
    }

    records.sort_by(|a, b| a.full_path.cmp(&b.full_path));
    info!("Found {} media files in {}", records.len(), root.display());
    Ok(records)
}

/// Split scanned records into the detector's two inputs.
pub fn build_inventory(records: &[FileRecord]) -> (Inventory, FileSizes) {
    let mut inventory = Inventory::new();
    let mut sizes = FileSizes::with_capacity(records.len());

    for record in records {
        inventory.add(InventoryEntry::from(record));
        sizes.insert(record.name.clone(), record.size);
    }

    debug!(
        "Built inventory: {} entries from {} files",
        inventory.len(),
        records.len()
    );
    (inventory, sizes)
}

fn to_local(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

fn relative_subfolder(root: &Path, path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path, bytes: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn test_scan_filters_by_extension_and_records_subfolder() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Top Hand.mp4"), 10);
        touch(&dir.path().join("notes.txt"), 5);
        touch(&dir.path().join("2024/March/Big Bluff.MKV"), 20);

        let records = scan_media_folder(dir.path(), &["mp4", ".mkv"], true).unwrap();

        assert_eq!(records.len(), 2);
        let bluff = records.iter().find(|r| r.name == "Big Bluff").unwrap();
        assert_eq!(bluff.subfolder, "2024/March");
        assert_eq!(bluff.size, 20);

        let top = records.iter().find(|r| r.name == "Top Hand").unwrap();
        assert_eq!(top.subfolder, "");
    }

    #[test]
    fn test_non_recursive_scan_stays_at_root() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.mp4"), 1);
        touch(&dir.path().join("nested/b.mp4"), 1);

        let records = scan_media_folder(dir.path(), &["mp4"], false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        match scan_media_folder(&missing, &["mp4"], true) {
            Err(Error::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_build_inventory_collapses_basic_collisions() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a/Test Video.mp4"), 100);
        touch(&dir.path().join("b/TestVideo.mp4"), 200);

        let records = scan_media_folder(dir.path(), &["mp4"], true).unwrap();
        let (inventory, sizes) = build_inventory(&records);

        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.get("testvideo").unwrap().name, "TestVideo");
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes["Test Video"], 100);
    }
}
