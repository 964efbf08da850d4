mod completion;
mod ids;
mod lesson;

pub use ids::{ItemId, LessonId, ParseIdError};

pub use completion::{CompletionRecord, StartTimeEntry};
pub use lesson::{AnswerRange, ContentSegment, LessonItem};
