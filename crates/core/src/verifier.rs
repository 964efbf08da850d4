//! Answer checking for fill-in-the-blank lesson items.
//!
//! Offsets count `char`s of the concatenated segment text, not bytes and not
//! UTF-16 code units. An emoji outside the BMP is one offset here. Bounds are
//! clamped into the text, so a malformed range yields a shorter (possibly
//! empty) expected answer instead of a panic.

use crate::model::{AnswerRange, LessonItem};

/// The substring the learner must type, or `None` if the item has no blank.
#[must_use]
pub fn expected_answer(item: &LessonItem, full_text: &str) -> Option<String> {
    item.answer_range()
        .map(|range| clamped_slice(full_text, range))
}

/// Exact comparison of `input` against the expected answer.
///
/// No trimming and no case folding. Items without a blank are always correct.
#[must_use]
pub fn is_correct(item: &LessonItem, full_text: &str, input: &str) -> bool {
    match expected_answer(item, full_text) {
        Some(expected) => expected == input,
        None => true,
    }
}

/// Convenience wrapper that builds the full text from the item itself.
#[must_use]
pub fn check(item: &LessonItem, input: &str) -> bool {
    is_correct(item, &item.full_text(), input)
}

fn clamped_slice(text: &str, range: AnswerRange) -> String {
    let len = text.chars().count();
    let start = clamp_offset(range.start, 0, len);
    let end = clamp_offset(range.end, start, len);
    text.chars().skip(start).take(end - start).collect()
}

fn clamp_offset(raw: i64, lower: usize, upper: usize) -> usize {
    match usize::try_from(raw) {
        Ok(v) => v.clamp(lower, upper),
        Err(_) => lower,
    }
}
