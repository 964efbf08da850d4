use chrono::{DateTime, Utc};
use lesson_core::model::{CompletionRecord, LessonId, StartTimeEntry};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn lesson_id_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<LessonId, StorageError> {
    let raw: String = row.try_get("lesson_id").map_err(ser)?;
    if raw.is_empty() {
        return Err(StorageError::Serialization("empty lesson_id".into()));
    }
    Ok(LessonId::new(raw))
}

pub(crate) fn map_start_time_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StartTimeEntry, StorageError> {
    let lesson_id = lesson_id_from_row(row)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    Ok(StartTimeEntry::new(lesson_id, started_at))
}

pub(crate) fn map_completion_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompletionRecord, StorageError> {
    let lesson_id = lesson_id_from_row(row)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    Ok(CompletionRecord::new(lesson_id, started_at, completed_at))
}
