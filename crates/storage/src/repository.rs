use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{CompletionRecord, LessonId, StartTimeEntry};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for lesson start times and completions.
///
/// Every write is an upsert keyed by lesson id, so retried calls replace
/// rather than duplicate.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// Record when a lesson was opened, replacing any earlier start time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn mark_started(
        &self,
        lesson_id: &LessonId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch the recorded start time of a lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_start_time(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Option<DateTime<Utc>>, StorageError>;

    /// Persist a completion, replacing any earlier one for the same lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_completion(&self, record: &CompletionRecord) -> Result<(), StorageError>;

    /// Ids of every lesson with a completion record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails.
    async fn get_completed_ids(&self) -> Result<HashSet<LessonId>, StorageError>;

    /// All completion records, ordered by lesson id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails.
    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError>;

    /// All start-time entries, ordered by lesson id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails.
    async fn list_start_times(&self) -> Result<Vec<StartTimeEntry>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryCompletionStore {
    start_times: Arc<Mutex<BTreeMap<LessonId, DateTime<Utc>>>>,
    completions: Arc<Mutex<BTreeMap<LessonId, CompletionRecord>>>,
}

impl InMemoryCompletionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionStore for InMemoryCompletionStore {
    async fn mark_started(
        &self,
        lesson_id: &LessonId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .start_times
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(lesson_id.clone(), started_at);
        Ok(())
    }

    async fn get_start_time(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let guard = self
            .start_times
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(lesson_id).copied())
    }

    async fn save_completion(&self, record: &CompletionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.lesson_id.clone(), record.clone());
        Ok(())
    }

    async fn get_completed_ids(&self) -> Result<HashSet<LessonId>, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.keys().cloned().collect())
    }

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }

    async fn list_start_times(&self) -> Result<Vec<StartTimeEntry>, StorageError> {
        let guard = self
            .start_times
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .map(|(id, at)| StartTimeEntry::new(id.clone(), *at))
            .collect())
    }
}

/// Completion tracking behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub completions: Arc<dyn CompletionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let completions: Arc<dyn CompletionStore> = Arc::new(InMemoryCompletionStore::new());
        Self { completions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lesson_core::time::fixed_now;

    fn id(raw: &str) -> LessonId {
        LessonId::new(raw)
    }

    #[tokio::test]
    async fn mark_started_keeps_latest_only() {
        let store = InMemoryCompletionStore::new();
        let t1 = fixed_now();
        let t2 = t1 + Duration::minutes(3);

        store.mark_started(&id("7"), t1).await.unwrap();
        store.mark_started(&id("7"), t2).await.unwrap();

        assert_eq!(store.get_start_time(&id("7")).await.unwrap(), Some(t2));
        let entries = store.list_start_times().await.unwrap();
        assert_eq!(entries, vec![StartTimeEntry::new(id("7"), t2)]);
    }

    #[tokio::test]
    async fn missing_start_time_is_none() {
        let store = InMemoryCompletionStore::new();
        assert_eq!(store.get_start_time(&id("nope")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_completion_replaces_previous() {
        let store = InMemoryCompletionStore::new();
        let now = fixed_now();
        let first = CompletionRecord::new(id("A"), now, now + Duration::seconds(10));
        let second = CompletionRecord::new(
            id("A"),
            now + Duration::seconds(20),
            now + Duration::seconds(40),
        );

        store.save_completion(&first).await.unwrap();
        store.save_completion(&second).await.unwrap();

        let all = store.list_completions().await.unwrap();
        assert_eq!(all, vec![second]);
    }

    #[tokio::test]
    async fn completed_ids_cover_every_saved_lesson() {
        let store = InMemoryCompletionStore::new();
        let t = |ms: i64| DateTime::<Utc>::from_timestamp_millis(ms).unwrap();

        store
            .save_completion(&CompletionRecord::new(id("A"), t(1000), t(2000)))
            .await
            .unwrap();
        store
            .save_completion(&CompletionRecord::new(id("B"), t(2000), t(3000)))
            .await
            .unwrap();

        let ids = store.get_completed_ids().await.unwrap();
        assert_eq!(ids, HashSet::from([id("A"), id("B")]));
    }

    #[tokio::test]
    async fn storage_handle_shares_one_backend() {
        let storage = Storage::in_memory();
        let clone = storage.clone();
        storage
            .completions
            .mark_started(&id("1"), fixed_now())
            .await
            .unwrap();
        assert_eq!(
            clone.completions.get_start_time(&id("1")).await.unwrap(),
            Some(fixed_now())
        );
    }
}
