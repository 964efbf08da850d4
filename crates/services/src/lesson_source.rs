use std::env;

use async_trait::async_trait;
use lesson_core::model::{AnswerRange, ContentSegment, ItemId, LessonItem};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LessonSourceError;

pub const DEFAULT_API_URL: &str = "https://mimochallenge.azurewebsites.net";

/// Supplies the ordered lesson list, once per load.
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// Fetch every lesson in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `LessonSourceError` if the lessons cannot be fetched or decoded.
    async fn fetch_lessons(&self) -> Result<Vec<LessonItem>, LessonSourceError>;
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
struct LessonsDocument {
    lessons: Vec<LessonDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LessonDto {
    id: u64,
    #[serde(default)]
    content: Vec<SegmentDto>,
    #[serde(default)]
    input: Option<InputDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SegmentDto {
    #[serde(default)]
    color: String,
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputDto {
    start_index: i64,
    end_index: i64,
}

impl From<LessonDto> for LessonItem {
    fn from(dto: LessonDto) -> Self {
        LessonItem::new(
            ItemId::new(dto.id),
            dto.content
                .into_iter()
                .map(|s| ContentSegment::new(s.color, s.text))
                .collect(),
            dto.input
                .map(|r| AnswerRange::new(r.start_index, r.end_index)),
        )
    }
}

/// Parse a `{"lessons": [...]}` document.
///
/// # Errors
///
/// Returns `LessonSourceError::Decode` if the JSON does not match the lesson shape.
pub fn parse_lessons_document(json: &str) -> Result<Vec<LessonItem>, LessonSourceError> {
    let doc: LessonsDocument = serde_json::from_str(json)?;
    Ok(doc.lessons.into_iter().map(LessonItem::from).collect())
}

//
// ─── HTTP SOURCE ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct LessonApiConfig {
    pub base_url: String,
}

impl LessonApiConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("LESSON_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        Self { base_url }
    }

    #[must_use]
    pub fn lessons_url(&self) -> String {
        format!("{}/api/lessons", self.base_url.trim_end_matches('/'))
    }
}

impl Default for LessonApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
        }
    }
}

/// Fetches lessons from the lesson API over HTTP.
#[derive(Clone)]
pub struct HttpLessonSource {
    client: Client,
    config: LessonApiConfig,
}

impl HttpLessonSource {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(LessonApiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: LessonApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl LessonSource for HttpLessonSource {
    async fn fetch_lessons(&self) -> Result<Vec<LessonItem>, LessonSourceError> {
        let url = self.config.lessons_url();
        debug!(%url, "requesting lessons");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "lesson request rejected");
            return Err(LessonSourceError::HttpStatus(status));
        }

        let doc: LessonsDocument = response.json().await?;
        let lessons: Vec<LessonItem> = doc.lessons.into_iter().map(LessonItem::from).collect();
        info!(count = lessons.len(), "received lessons");
        Ok(lessons)
    }
}

//
// ─── STATIC SOURCE ─────────────────────────────────────────────────────────────
//

/// Serves a fixed lesson list, or a fixed failure message.
#[derive(Clone, Debug)]
pub struct StaticLessonSource {
    lessons: Result<Vec<LessonItem>, String>,
}

impl StaticLessonSource {
    #[must_use]
    pub fn new(lessons: Vec<LessonItem>) -> Self {
        Self {
            lessons: Ok(lessons),
        }
    }

    /// A source whose every fetch fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            lessons: Err(message.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `LessonSourceError::Decode` for malformed documents.
    pub fn from_json(json: &str) -> Result<Self, LessonSourceError> {
        parse_lessons_document(json).map(Self::new)
    }
}

#[async_trait]
impl LessonSource for StaticLessonSource {
    async fn fetch_lessons(&self) -> Result<Vec<LessonItem>, LessonSourceError> {
        self.lessons
            .clone()
            .map_err(LessonSourceError::Unavailable)
    }
}
