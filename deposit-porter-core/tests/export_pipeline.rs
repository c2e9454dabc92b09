use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use deposit_porter_core::contract::{MockObjectStore, MockPlatformApi};
use deposit_porter_core::export::{archive_path, export_deposit};
use deposit_porter_core::model::{Author, CommunityPopulated, DepositPopulated, FileMetadata};
use deposit_porter_core::PorterError;
use mockall::Sequence;
use tempfile::tempdir;

const DEPOSIT_ID: &str = "64a09f6ce3d5ff0813586345";
const STORAGE_URL: &str = "https://storage.example/get/X.docx?sig=abc";

fn populated() -> DepositPopulated {
    DepositPopulated {
        id: Some(DEPOSIT_ID.into()),
        title: "Analytical Engines".into(),
        abstract_text: Some("A note on engines.".into()),
        authors: vec![Author {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            nickname: None,
            orcid: Some("0000-0002-1825-0097".into()),
        }],
        disciplines: vec!["Mathematics".into()],
        keywords: vec!["engine".into()],
        community_populated: CommunityPopulated {
            name: "History of Computing".into(),
        },
        publication_file: Some(FileMetadata {
            filename: "X.docx".into(),
            description: "Y.docx".into(),
            content_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                .into(),
            content_length: 10,
            tags: vec![],
        }),
    }
}

fn read_entry(archive: &Path, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut content = String::new();
    zip.by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[tokio::test]
async fn export_packs_manuscript_under_display_name_and_cleans_up() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("export1");
    let mut seq = Sequence::new();
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit()
        .withf(|id| id == DEPOSIT_ID)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(populated()));
    api.expect_file_location()
        .withf(|id, filename| id == DEPOSIT_ID && filename == "X.docx")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(STORAGE_URL.to_string()));
    store
        .expect_download_to()
        .withf(|url, destination| url == STORAGE_URL && destination.ends_with("X.docx"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, destination| {
            fs::write(destination, b"docx bytes").unwrap();
            Ok(10)
        });

    let report = export_deposit(&api, &store, DEPOSIT_ID, &dir)
        .await
        .expect("export should succeed");

    let expected = dir.join(format!("deposit_{DEPOSIT_ID}.zip"));
    assert_eq!(report.archive, expected);
    assert_eq!(report.manuscript, "Y.docx");

    let mut zip = zip::ZipArchive::new(File::open(&expected).unwrap()).unwrap();
    assert_eq!(zip.len(), 2);
    assert!(zip.by_name("X.docx").is_err());
    drop(zip);

    assert_eq!(read_entry(&expected, "Y.docx"), "docx bytes");
    let meta: serde_json::Value = serde_json::from_str(&read_entry(&expected, "meta.json")).unwrap();
    assert_eq!(meta["manuscript"]["filename"], "Y.docx");
    assert_eq!(meta["community"], "History of Computing");
    assert_eq!(meta["abstract"], "A note on engines.");
    assert_eq!(meta["authors"][0]["firstName"], "Ada");

    assert!(!dir.join("meta.json").exists());
    assert!(!dir.join("X.docx").exists());
    assert!(!dir.join("Y.docx").exists());
}

#[tokio::test]
async fn unavailable_deposit_aborts_before_writing() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("export1");
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit().times(1).returning(|_| {
        Err(PorterError::Remote {
            status: 404,
            body: "not found".into(),
        })
    });
    api.expect_file_location().never();
    store.expect_download_to().never();

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    match err {
        PorterError::Export(msg) => assert!(msg.contains("unavailable"), "got {msg}"),
        other => panic!("expected export error, got {other:?}"),
    }
    assert!(!dir.exists());
}

#[tokio::test]
async fn deposit_without_publication_file_writes_nothing() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("export1");
    let mut api = MockPlatformApi::new();
    let store = MockObjectStore::new();
    api.expect_get_deposit().returning(|_| {
        let mut deposit = populated();
        deposit.publication_file = None;
        Ok(deposit)
    });

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Export(_)), "got {err:?}");
    assert!(!dir.exists());
}

#[tokio::test]
async fn missing_redirect_cascades_into_packaging_failure() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().to_path_buf();
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit().returning(|_| Ok(populated()));
    api.expect_file_location()
        .times(1)
        .returning(|_, _| Err(PorterError::Download("expected a redirect, got 200".into())));
    store.expect_download_to().never();

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Packaging(_)), "got {err:?}");

    assert!(dir.join("meta.json").exists());
    assert!(!dir.join("X.docx").exists());
    assert!(!archive_path(&dir, DEPOSIT_ID).exists());
}

#[tokio::test]
async fn failed_storage_download_leaves_meta_in_place() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().to_path_buf();
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit().returning(|_| Ok(populated()));
    api.expect_file_location()
        .returning(|_, _| Ok(STORAGE_URL.to_string()));
    store
        .expect_download_to()
        .times(1)
        .returning(|_, _| Err(PorterError::Download("storage returned 403".into())));

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Packaging(_)), "got {err:?}");
    assert!(dir.join("meta.json").exists());
}

#[tokio::test]
async fn leftover_manuscript_is_not_packed_when_download_fails() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().to_path_buf();
    fs::write(dir.join("X.docx"), b"bytes from an earlier run").unwrap();
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit().returning(|_| Ok(populated()));
    api.expect_file_location()
        .times(1)
        .returning(|_, _| Err(PorterError::Download("expected a redirect, got 200".into())));
    store.expect_download_to().never();

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Packaging(_)), "got {err:?}");
    assert!(!dir.join("X.docx").exists());
    assert!(!archive_path(&dir, DEPOSIT_ID).exists());
}

#[tokio::test]
async fn display_name_with_directories_matches_archive_entry() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().to_path_buf();
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit().returning(|_| {
        let mut deposit = populated();
        if let Some(file) = deposit.publication_file.as_mut() {
            file.description = "drafts/Y.docx".into();
        }
        Ok(deposit)
    });
    api.expect_file_location()
        .returning(|_, _| Ok(STORAGE_URL.to_string()));
    store.expect_download_to().returning(|_, destination| {
        fs::write(destination, b"docx bytes").unwrap();
        Ok(10)
    });

    let report = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap();
    assert_eq!(report.manuscript, "Y.docx");

    let meta: serde_json::Value =
        serde_json::from_str(&read_entry(&report.archive, "meta.json")).unwrap();
    assert_eq!(meta["manuscript"]["filename"], "Y.docx");
    assert_eq!(read_entry(&report.archive, "Y.docx"), "docx bytes");
}

#[tokio::test]
async fn unusable_display_name_aborts_before_writing() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("export1");
    let mut api = MockPlatformApi::new();
    let store = MockObjectStore::new();
    api.expect_get_deposit().returning(|_| {
        let mut deposit = populated();
        if let Some(file) = deposit.publication_file.as_mut() {
            file.description = "drafts/..".into();
        }
        Ok(deposit)
    });
    api.expect_file_location().never();

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Export(_)), "got {err:?}");
    assert!(!dir.exists());
}

#[tokio::test]
async fn stored_name_colliding_with_metadata_is_rejected() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("export1");
    let mut api = MockPlatformApi::new();
    let store = MockObjectStore::new();
    api.expect_get_deposit().returning(|_| {
        let mut deposit = populated();
        if let Some(file) = deposit.publication_file.as_mut() {
            file.filename = "meta.json".into();
        }
        Ok(deposit)
    });
    api.expect_file_location().never();

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Export(_)), "got {err:?}");
    assert!(!dir.exists());
}

#[tokio::test]
async fn failed_archive_write_keeps_both_loose_files() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().to_path_buf();
    let archive = archive_path(&dir, DEPOSIT_ID);
    fs::create_dir(&archive).unwrap();
    let mut api = MockPlatformApi::new();
    let mut store = MockObjectStore::new();

    api.expect_get_deposit().returning(|_| Ok(populated()));
    api.expect_file_location()
        .returning(|_, _| Ok(STORAGE_URL.to_string()));
    store.expect_download_to().returning(|_, destination| {
        fs::write(destination, b"docx bytes").unwrap();
        Ok(10)
    });

    let err = export_deposit(&api, &store, DEPOSIT_ID, &dir).await.unwrap_err();
    assert!(matches!(err, PorterError::Packaging(_)), "got {err:?}");
    assert!(dir.join("meta.json").exists());
    assert_eq!(fs::read(dir.join("X.docx")).unwrap(), b"docx bytes");
    assert!(archive.is_dir());
}
