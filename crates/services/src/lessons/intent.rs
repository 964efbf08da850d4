use lesson_core::model::{LessonId, LessonItem};

pub const SOLVE_FIRST_MESSAGE: &str = "Please solve the lesson first";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    LoadItems,
    Retry,
    InputChanged(String),
    CheckAnswer,
    NextLessonClicked,
    CorrectAnimationFinished,
    WrongAnimationFinished,
}

/// One-shot instruction for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    NavigateToDone,
    ShowMessage(String),
}

/// Side effect requested by a transition and carried out by the engine runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    FetchLessons,
    MarkStarted(LessonId),
    MarkCompleted(LessonId),
}

/// Outcome of applying one input to the machine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub commands: Vec<Command>,
    pub effect: Option<Effect>,
}

impl Transition {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn command(command: Command) -> Self {
        Self {
            commands: vec![command],
            effect: None,
        }
    }

    #[must_use]
    pub fn effect(effect: Effect) -> Self {
        Self {
            commands: Vec::new(),
            effect: Some(effect),
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.commands.is_empty() && self.effect.is_none()
    }
}

/// Result of a lesson fetch, fed back into the machine.
pub type LoadResult = Result<Vec<LessonItem>, String>;
