use std::collections::HashSet;
use std::sync::Arc;

use lesson_core::model::{CompletionRecord, LessonId};
use storage::repository::CompletionStore;

use crate::Clock;
use crate::error::ProgressError;

/// Timestamps lesson starts and completions against a `CompletionStore`.
#[derive(Clone)]
pub struct LessonProgressService {
    clock: Clock,
    store: Arc<dyn CompletionStore>,
}

impl LessonProgressService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn CompletionStore>) -> Self {
        Self { clock, store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CompletionStore> {
        &self.store
    }

    /// Record that the lesson was opened now.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the start time cannot be stored.
    pub async fn mark_lesson_started(&self, lesson_id: &LessonId) -> Result<(), ProgressError> {
        let started_at = self.clock.now();
        self.store.mark_started(lesson_id, started_at).await?;
        Ok(())
    }

    /// Record that the lesson was solved now.
    ///
    /// Without a recorded start the completion instant doubles as the start.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the lookup or the write fails.
    pub async fn mark_lesson_completed(
        &self,
        lesson_id: &LessonId,
    ) -> Result<CompletionRecord, ProgressError> {
        let completed_at = self.clock.now();
        let started_at = self
            .store
            .get_start_time(lesson_id)
            .await?
            .unwrap_or(completed_at);

        let record = CompletionRecord::new(lesson_id.clone(), started_at, completed_at);
        self.store.save_completion(&record).await?;
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the scan fails.
    pub async fn completed_lesson_ids(&self) -> Result<HashSet<LessonId>, ProgressError> {
        Ok(self.store.get_completed_ids().await?)
    }
}
