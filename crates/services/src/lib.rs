#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod lesson_source;
pub mod lessons;
pub mod progress_service;

pub use lesson_core::Clock;

pub use app_services::{AppServices, LessonOrigin};
pub use error::{AppServicesError, LessonSourceError, ProgressError};
pub use lesson_source::{HttpLessonSource, LessonApiConfig, LessonSource, StaticLessonSource};
pub use lessons::{
    EngineHandle, Effect, Intent, LessonMachine, Mode, ProgressionEngine, ProgressionState,
};
pub use progress_service::LessonProgressService;
