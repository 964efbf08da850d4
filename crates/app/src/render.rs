use lesson_core::model::{AnswerRange, LessonItem};
use services::ProgressionState;

const BLANK: &str = "_____";

/// Lesson text with the answer span replaced by a blank.
pub fn lesson_line(item: &LessonItem) -> String {
    let text = item.full_text();
    match item.answer_range() {
        Some(range) => with_blank(&text, range),
        None => text,
    }
}

fn with_blank(text: &str, range: AnswerRange) -> String {
    let len = text.chars().count();
    let start = usize::try_from(range.start).unwrap_or(0).min(len);
    let end = usize::try_from(range.end).unwrap_or(0).clamp(start, len);

    let mut out: String = text.chars().take(start).collect();
    out.push_str(BLANK);
    out.extend(text.chars().skip(end));
    out
}

/// "Lesson 2/5" style header for the current position.
pub fn progress_header(state: &ProgressionState) -> String {
    format!(
        "Lesson {}/{}",
        (state.current_index + 1).min(state.items.len()),
        state.items.len()
    )
}
