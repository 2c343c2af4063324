#![allow(dead_code)]

use datamanager_core::{DataManager, Id, NewBackup, NewFingerprint};

pub struct Catalog {
    pub manager: DataManager,
    pub file1: Id,
    pub file2: Id,
}

/// Two files: `/foo/bar/1` with fingerprints `1:f1`, `1:f2` and
/// `/foo/bar/2` with `2:f1`, `2:f2`, `2:f3`.
pub fn sample_catalog() -> Catalog {
    let manager = DataManager::open_in_memory().unwrap();
    // Registered out of path order on purpose.
    let file2 = manager
        .register_managed_file(
            "/foo/bar/2",
            &[
                NewFingerprint::new("2", "md5", "2:f3", 300),
                NewFingerprint::new("2", "md5", "2:f1", 100),
                NewFingerprint::new("2", "md5", "2:f2", 200),
            ],
        )
        .unwrap();
    let file1 = manager
        .register_managed_file(
            "/foo/bar/1",
            &[
                NewFingerprint::new("1", "md5", "1:f1", 100),
                NewFingerprint::new("1", "md5", "1:f2", 200),
            ],
        )
        .unwrap();
    manager.database().reset_counters();
    Catalog {
        manager,
        file1,
        file2,
    }
}

pub fn new_backup(label: &str, volume: u128, creation_ms: i64) -> NewBackup {
    NewBackup {
        label: label.to_string(),
        volume_id: Id::from_u128(volume),
        encrypted: volume % 2 == 0,
        base_path: format!("/backup/{label}"),
        creation_ms,
        registration_ms: creation_ms + 1_000,
        latest_check_ms: None,
    }
}
