use datamanager_core::db::migrations::latest_version;
use datamanager_core::{Database, DataManager, DbError, ManagedFileSort, NewFingerprint, SortDirection};
use rusqlite::Connection;

#[test]
fn in_memory_catalog_has_every_table() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connect().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["files", "fingerprints", "backups", "backup_files"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_a_catalog_file_keeps_its_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fingerprints.db");

    let manager = DataManager::open(&path).unwrap();
    manager
        .register_managed_file("/foo/bar/1", &[NewFingerprint::new("1", "md5", "1:f1", 1)])
        .unwrap();
    drop(manager);

    let reopened = DataManager::open(&path).unwrap();
    assert_eq!(schema_version(&reopened.database().connect().unwrap()), latest_version());
    let files = reopened
        .find_managed_files()
        .sort(ManagedFileSort::Path, SortDirection::Ascending)
        .results()
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].fingerprints().unwrap()[0].fingerprint, "1:f1");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match Database::open(&path).unwrap_err() {
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
fn connections_enforce_foreign_keys() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .connect()
        .unwrap()
        .execute(
            "INSERT INTO fingerprints (id, name, algorithm, fingerprint, timestamp, file_id)
             VALUES ('x', 'n', 'md5', 'v', 0, 'missing');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
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
