use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use lesson_core::model::{CompletionRecord, LessonId, StartTimeEntry};
use lesson_core::time::fixed_now;
use storage::repository::{CompletionStore, Storage};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_start_time_is_last_write_wins() {
    let repo = connect("memdb_start_times").await;
    let id = LessonId::new("5");
    let t1 = fixed_now();
    let t2 = t1 + Duration::seconds(45);

    repo.mark_started(&id, t1).await.unwrap();
    repo.mark_started(&id, t2).await.unwrap();

    assert_eq!(repo.get_start_time(&id).await.unwrap(), Some(t2));
    assert_eq!(
        repo.list_start_times().await.unwrap(),
        vec![StartTimeEntry::new(id, t2)]
    );
    assert_eq!(
        repo.get_start_time(&LessonId::new("missing")).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn sqlite_completion_replaces_previous_record() {
    let repo = connect("memdb_completion_replace").await;
    let id = LessonId::new("9");
    let now = fixed_now();

    repo.save_completion(&CompletionRecord::new(id.clone(), now, now + Duration::seconds(5)))
        .await
        .unwrap();
    let latest = CompletionRecord::new(
        id.clone(),
        now + Duration::minutes(1),
        now + Duration::minutes(2),
    );
    repo.save_completion(&latest).await.unwrap();

    assert_eq!(repo.list_completions().await.unwrap(), vec![latest]);
}

#[tokio::test]
async fn sqlite_completed_ids_round_trip() {
    let repo = connect("memdb_completed_ids").await;
    let t = |ms: i64| DateTime::<Utc>::from_timestamp_millis(ms).unwrap();

    repo.save_completion(&CompletionRecord::new(LessonId::new("A"), t(1000), t(2000)))
        .await
        .unwrap();
    repo.save_completion(&CompletionRecord::new(LessonId::new("B"), t(2000), t(3000)))
        .await
        .unwrap();

    let ids = repo.get_completed_ids().await.unwrap();
    assert_eq!(ids, HashSet::from([LessonId::new("A"), LessonId::new("B")]));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.mark_started(&LessonId::new("1"), fixed_now())
        .await
        .unwrap();

    repo.migrate().await.expect("second migrate");

    assert_eq!(
        repo.get_start_time(&LessonId::new("1")).await.unwrap(),
        Some(fixed_now())
    );
}

#[tokio::test]
async fn storage_sqlite_builds_a_working_store() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_ctor?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage
        .completions
        .mark_started(&LessonId::new("3"), fixed_now())
        .await
        .unwrap();
    assert!(storage.completions.get_completed_ids().await.unwrap().is_empty());
    assert_eq!(storage.completions.list_start_times().await.unwrap().len(), 1);
}
