use std::path::PathBuf;
use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::error::AppServicesError;
use crate::lesson_source::{HttpLessonSource, LessonApiConfig, LessonSource, StaticLessonSource};
use crate::lessons::{EngineHandle, ProgressionEngine};
use crate::progress_service::LessonProgressService;

/// Where lesson definitions come from.
#[derive(Clone, Debug)]
pub enum LessonOrigin {
    Api(LessonApiConfig),
    File(PathBuf),
}

/// Assembles the store, lesson source and progression engine.
#[derive(Clone)]
pub struct AppServices {
    progress: LessonProgressService,
    engine: EngineHandle,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and start the engine.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or a lessons
    /// file cannot be read or parsed.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        origin: LessonOrigin,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source = build_source(&origin)?;
        Ok(Self::from_parts(storage, clock, source))
    }

    /// Wire services from already constructed parts and start the engine.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn from_parts(storage: Storage, clock: Clock, source: Arc<dyn LessonSource>) -> Self {
        let progress = LessonProgressService::new(clock, Arc::clone(&storage.completions));
        let engine = ProgressionEngine::start(source, progress.clone());
        Self { progress, engine }
    }

    #[must_use]
    pub fn engine(&self) -> EngineHandle {
        self.engine.clone()
    }

    #[must_use]
    pub fn progress(&self) -> &LessonProgressService {
        &self.progress
    }
}

fn build_source(origin: &LessonOrigin) -> Result<Arc<dyn LessonSource>, AppServicesError> {
    match origin {
        LessonOrigin::Api(config) => {
            info!(url = %config.lessons_url(), "using lesson api");
            Ok(Arc::new(HttpLessonSource::new(config.clone())))
        }
        LessonOrigin::File(path) => {
            info!(path = %path.display(), "using lessons file");
            let json = std::fs::read_to_string(path)?;
            Ok(Arc::new(StaticLessonSource::from_json(&json)?))
        }
    }
}
