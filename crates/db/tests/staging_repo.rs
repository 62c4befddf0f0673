use std::sync::Arc;

use hoard_core::category::Category;
use hoard_core::staging::StagedFile;
use hoard_db::keys;
use hoard_db::repositories::StagingRepo;
use hoard_db::{ContentStore, MemoryStore};

#[tokio::test]
async fn staged_files_survive_reload() {
    let store = Arc::new(MemoryStore::new());
    let mut repo = StagingRepo::load(store.clone()).await.unwrap();
    let ids = repo
        .add_all(vec![
            StagedFile::read("a.txt", "text/plain", "alpha".into(), 1),
            StagedFile::read("b.txt", "text/plain", "beta".into(), 1),
        ])
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2]);
    repo.set_category(2, Category::Talents).await.unwrap();

    let restored = StagingRepo::load(store).await.unwrap();
    assert!(restored.has_pending());
    assert_eq!(restored.staging().file_id_counter, 2);
    assert_eq!(restored.staging().dragged_files[1].selected_category, Category::Talents);
}

#[tokio::test]
async fn duplicate_source_is_not_restaged() {
    let store = Arc::new(MemoryStore::new());
    let mut repo = StagingRepo::load(store).await.unwrap();
    let file = StagedFile::read("a.txt", "text/plain", "alpha".into(), 7);
    repo.add_all(vec![file.clone()]).await.unwrap();
    assert!(repo.add_all(vec![file]).await.unwrap().is_empty());
    assert_eq!(repo.stats().count, 1);
}

#[tokio::test]
async fn clear_removes_persisted_key() {
    let store = Arc::new(MemoryStore::new());
    let mut repo = StagingRepo::load(store.clone()).await.unwrap();
    repo.add_all(vec![StagedFile::read("a.txt", "", "x".into(), 0)])
        .await
        .unwrap();
    repo.clear().await.unwrap();
    assert!(!repo.has_pending());
    assert_eq!(store.get(keys::PENDING_IMPORT_STAGING).await.unwrap(), None);
}

#[tokio::test]
async fn failed_clear_keeps_memory_and_store_in_step() {
    let store = Arc::new(MemoryStore::new());
    let mut repo = StagingRepo::load(store.clone()).await.unwrap();
    repo.add_all(vec![StagedFile::read("a.txt", "", "x".into(), 0)])
        .await
        .unwrap();

    store.fail_writes(true);
    assert!(repo.clear().await.is_err());
    store.fail_writes(false);

    assert!(repo.has_pending());
    let restored = StagingRepo::load(store).await.unwrap();
    assert_eq!(restored.stats().count, 1);
}

#[tokio::test]
async fn malformed_staging_is_discarded() {
    let store = Arc::new(MemoryStore::new());
    store.set(keys::PENDING_IMPORT_STAGING, "[1,2").await.unwrap();
    let repo = StagingRepo::load(store).await.unwrap();
    assert!(!repo.has_pending());
}

#[tokio::test]
async fn remove_single_file() {
    let mut repo = StagingRepo::load(Arc::new(MemoryStore::new())).await.unwrap();
    repo.add_all(vec![
        StagedFile::read("a.txt", "", "x".into(), 0),
        StagedFile::read("b.txt", "", "y".into(), 0),
    ])
    .await
    .unwrap();
    assert_eq!(repo.remove(1).await.unwrap().unwrap().name, "a.txt");
    assert!(repo.remove(1).await.unwrap().is_none());
    assert_eq!(repo.stats().count, 1);
}
