mod common;

use common::{new_backup, sample_catalog, Catalog};
use datamanager_core::{Backup, BackupSort, Id, RepoError, SortDirection};
use std::sync::Arc;

struct Fixture {
    catalog: Catalog,
    alpha: Id,
    beta: Id,
    gamma: Id,
}

/// alpha holds file 2 and file 1, beta holds file 1, gamma is empty.
fn fixture() -> Fixture {
    let catalog = sample_catalog();
    let manager = &catalog.manager;
    let gamma = manager.register_backup(&new_backup("gamma", 3, 100)).unwrap();
    let alpha = manager.register_backup(&new_backup("alpha", 1, 300)).unwrap();
    let beta = manager.register_backup(&new_backup("beta", 2, 200)).unwrap();

    manager
        .add_backup_file(alpha, catalog.file2, "/backup/alpha/foo/bar/2")
        .unwrap();
    manager
        .add_backup_file(alpha, catalog.file1, "/backup/alpha/foo/bar/1")
        .unwrap();
    manager.add_backup_file(beta, catalog.file1, "/foo/bar/1").unwrap();
    manager.database().reset_counters();

    Fixture {
        catalog,
        alpha,
        beta,
        gamma,
    }
}

fn labels(backups: &[Arc<Backup>]) -> Vec<&str> {
    backups.iter().map(|backup| backup.label()).collect()
}

#[test]
fn sorts_by_label_and_by_creation_date() {
    let fixture = fixture();
    let finder = fixture.catalog.manager.find_backups();

    let by_label = finder
        .sort(BackupSort::Label, SortDirection::Ascending)
        .results()
        .unwrap();
    assert_eq!(labels(&by_label), vec!["alpha", "beta", "gamma"]);

    let by_creation = finder
        .sort_by_name("creation_date", SortDirection::Descending)
        .unwrap()
        .results()
        .unwrap();
    assert_eq!(labels(&by_creation), vec!["alpha", "beta", "gamma"]);

    let by_registration = finder
        .sort(BackupSort::RegistrationDate, SortDirection::Ascending)
        .results()
        .unwrap();
    assert_eq!(labels(&by_registration), vec!["gamma", "beta", "alpha"]);
}

#[test]
fn filters_combine_conjunctively() {
    let fixture = fixture();
    let finder = fixture.catalog.manager.find_backups();

    let holding_file1 = finder
        .with_file_id(Some(fixture.catalog.file1))
        .sort(BackupSort::Label, SortDirection::Ascending)
        .results()
        .unwrap();
    assert_eq!(labels(&holding_file1), vec!["alpha", "beta"]);

    let narrowed = finder
        .with_file_id(Some(fixture.catalog.file1))
        .with_volume_id(Some(Id::from_u128(2)))
        .results()
        .unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].id(), fixture.beta);

    assert_eq!(finder.with_label(Some("gamma")).count().unwrap(), 1);
    assert_eq!(
        finder
            .with_label(Some("gamma"))
            .with_file_id(Some(fixture.catalog.file1))
            .count()
            .unwrap(),
        0
    );
    assert!(matches!(
        finder.with_filter("fingerprint", Some("x")),
        Err(RepoError::UnknownFilterKey { kind: "backup", .. })
    ));
}

#[test]
fn members_load_lazily_ordered_by_path_with_back_reference() {
    let fixture = fixture();
    let backups = fixture
        .catalog
        .manager
        .find_backups()
        .with_label(Some("alpha"))
        .results()
        .unwrap();
    let alpha = &backups[0];
    assert_eq!(alpha.id(), fixture.alpha);
    assert!(!alpha.backup_files_value().is_initialized());

    let members = alpha.backup_files().unwrap();
    let member_paths = members
        .iter()
        .map(|member| member.path().display().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        member_paths,
        vec!["/backup/alpha/foo/bar/1", "/backup/alpha/foo/bar/2"]
    );
    assert_eq!(members[0].managed_file().id(), fixture.catalog.file1);
    assert_eq!(members[0].backup().unwrap().id(), fixture.alpha);

    // Nested relation stays lazy until asked for.
    assert!(!members[1].managed_file().fingerprints_value().is_initialized());
    assert_eq!(members[1].managed_file().fingerprints().unwrap().len(), 3);
    assert_eq!(fixture.catalog.manager.loader_stats().relation_loads, 2);
}

#[test]
fn prefetched_members_are_resident() {
    let fixture = fixture();
    let backups = fixture
        .catalog
        .manager
        .find_backups()
        .sort(BackupSort::Label, SortDirection::Ascending)
        .prefetch_relations(true)
        .results()
        .unwrap();

    assert!(backups
        .iter()
        .all(|backup| backup.backup_files_value().is_initialized()));
    assert_eq!(backups[2].id(), fixture.gamma);
    assert!(backups[2].backup_files().unwrap().is_empty());
    assert_eq!(backups[0].backup_files().unwrap()[1].backup().unwrap().id(), fixture.alpha);
    assert_eq!(fixture.catalog.manager.loader_stats().relation_loads, 0);
}

#[test]
fn deleted_backup_members_are_not_found() {
    let fixture = fixture();
    let backups = fixture
        .catalog
        .manager
        .find_backups()
        .with_label(Some("beta"))
        .results()
        .unwrap();

    fixture.catalog.manager.delete_backup(fixture.beta).unwrap();
    assert!(matches!(
        backups[0].backup_files(),
        Err(RepoError::NotFound { entity: "backup", .. })
    ));
    assert!(matches!(
        fixture.catalog.manager.delete_backup(fixture.beta),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn deleting_a_file_drops_its_memberships() {
    let fixture = fixture();
    let manager = &fixture.catalog.manager;
    manager.delete_managed_file(fixture.catalog.file1).unwrap();

    assert_eq!(
        manager
            .find_backups()
            .with_file_id(Some(fixture.catalog.file1))
            .count()
            .unwrap(),
        0
    );
    let alpha = manager
        .find_backups()
        .with_label(Some("alpha"))
        .results()
        .unwrap();
    assert_eq!(alpha[0].backup_files().unwrap().len(), 1);
}
