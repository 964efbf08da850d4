use std::collections::HashSet;

use chrono::{DateTime, Utc};
use lesson_core::model::{CompletionRecord, LessonId, StartTimeEntry};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, lesson_id_from_row, map_completion_row, map_start_time_row, ser};
use crate::repository::{CompletionStore, StorageError};

#[async_trait::async_trait]
impl CompletionStore for SqliteRepository {
    async fn mark_started(
        &self,
        lesson_id: &LessonId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO lesson_start_times (lesson_id, started_at)
                VALUES (?1, ?2)
                ON CONFLICT(lesson_id) DO UPDATE SET
                    started_at = excluded.started_at
            ",
        )
        .bind(lesson_id.as_str())
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_start_time(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT started_at
                FROM lesson_start_times
                WHERE lesson_id = ?1
            ",
        )
        .bind(lesson_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|row| row.try_get::<DateTime<Utc>, _>("started_at").map_err(ser))
            .transpose()
    }

    async fn save_completion(&self, record: &CompletionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO lesson_completions (lesson_id, started_at, completed_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(lesson_id) DO UPDATE SET
                    started_at = excluded.started_at,
                    completed_at = excluded.completed_at
            ",
        )
        .bind(record.lesson_id.as_str())
        .bind(record.started_at)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_completed_ids(&self) -> Result<HashSet<LessonId>, StorageError> {
        let rows = sqlx::query("SELECT lesson_id FROM lesson_completions")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(lesson_id_from_row).collect()
    }

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT lesson_id, started_at, completed_at
                FROM lesson_completions
                ORDER BY lesson_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_completion_row(&row)?);
        }
        Ok(out)
    }

    async fn list_start_times(&self) -> Result<Vec<StartTimeEntry>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT lesson_id, started_at
                FROM lesson_start_times
                ORDER BY lesson_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_start_time_row(&row)?);
        }
        Ok(out)
    }
}
