use serde::{Deserialize, Serialize};

use crate::model::ids::ItemId;

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// A colored run of lesson text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSegment {
    pub color: String,
    pub text: String,
}

impl ContentSegment {
    #[must_use]
    pub fn new(color: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            text: text.into(),
        }
    }
}

/// Character offsets of the blank the learner has to fill in.
///
/// Offsets index the concatenated segment text and are not validated on
/// construction; out-of-range or inverted bounds are clamped by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRange {
    pub start: i64,
    pub end: i64,
}

impl AnswerRange {
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

//
// ─── LESSON ITEM ───────────────────────────────────────────────────────────────
//

/// One step of a lesson, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonItem {
    id: ItemId,
    segments: Vec<ContentSegment>,
    answer_range: Option<AnswerRange>,
}

impl LessonItem {
    #[must_use]
    pub fn new(
        id: ItemId,
        segments: Vec<ContentSegment>,
        answer_range: Option<AnswerRange>,
    ) -> Self {
        Self {
            id,
            segments,
            answer_range,
        }
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn segments(&self) -> &[ContentSegment] {
        &self.segments
    }

    #[must_use]
    pub fn answer_range(&self) -> Option<AnswerRange> {
        self.answer_range
    }

    /// True when the learner has to type something before the item is solved.
    #[must_use]
    pub fn requires_input(&self) -> bool {
        self.answer_range.is_some()
    }

    /// Ordered concatenation of all segment texts.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_concatenates_in_order() {
        let item = LessonItem::new(
            ItemId::new(1),
            vec![
                ContentSegment::new("#FFFFFF", "Hello "),
                ContentSegment::new("#FF0000", "World"),
                ContentSegment::new("#FFFFFF", "!"),
            ],
            Some(AnswerRange::new(6, 11)),
        );

        assert_eq!(item.full_text(), "Hello World!");
        assert!(item.requires_input());
    }

    #[test]
    fn item_without_range_needs_no_input() {
        let item = LessonItem::new(ItemId::new(2), vec![], None);
        assert!(!item.requires_input());
        assert_eq!(item.full_text(), "");
    }

    #[test]
    fn serializes_with_numeric_id_and_optional_range() {
        let item = LessonItem::new(
            ItemId::new(7),
            vec![ContentSegment::new("#FF0000", "World")],
            Some(AnswerRange::new(0, 5)),
        );
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 7,
                "segments": [{ "color": "#FF0000", "text": "World" }],
                "answer_range": { "start": 0, "end": 5 }
            })
        );

        let plain: LessonItem = serde_json::from_value(serde_json::json!({
            "id": 8,
            "segments": [],
            "answer_range": null
        }))
        .unwrap();
        assert_eq!(plain.id(), ItemId::new(8));
        assert!(!plain.requires_input());
    }
}
