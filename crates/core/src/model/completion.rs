use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;

/// When a lesson was last opened. One entry per lesson; newer writes replace older ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTimeEntry {
    pub lesson_id: LessonId,
    pub started_at: DateTime<Utc>,
}

impl StartTimeEntry {
    #[must_use]
    pub fn new(lesson_id: LessonId, started_at: DateTime<Utc>) -> Self {
        Self {
            lesson_id,
            started_at,
        }
    }
}

/// Timing of a solved lesson.
///
/// `completed_at >= started_at` is expected but not enforced: when no start
/// was recorded both timestamps are the completion instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub lesson_id: LessonId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    #[must_use]
    pub fn new(lesson_id: LessonId, started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Self {
        Self {
            lesson_id,
            started_at,
            completed_at,
        }
    }

    /// Time spent on the lesson, saturating at zero under clock skew.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        (self.completed_at - self.started_at).max(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn duration_is_non_negative() {
        let now = fixed_now();
        let skewed = CompletionRecord::new(
            LessonId::new("1"),
            now + chrono::Duration::seconds(5),
            now,
        );
        assert_eq!(skewed.duration(), chrono::Duration::zero());

        let normal = CompletionRecord::new(
            LessonId::new("1"),
            now,
            now + chrono::Duration::seconds(30),
        );
        assert_eq!(normal.duration(), chrono::Duration::seconds(30));
    }

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let now = fixed_now();
        let record = CompletionRecord::new(
            LessonId::new("42"),
            now,
            now + chrono::Duration::seconds(30),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "lesson_id": "42",
                "started_at": "2023-11-14T22:13:20Z",
                "completed_at": "2023-11-14T22:13:50Z"
            })
        );

        let entry: StartTimeEntry = serde_json::from_value(serde_json::json!({
            "lesson_id": "42",
            "started_at": "2023-11-14T22:13:20Z"
        }))
        .unwrap();
        assert_eq!(entry, StartTimeEntry::new(LessonId::new("42"), now));
    }
}
