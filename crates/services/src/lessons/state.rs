use lesson_core::model::LessonItem;

/// Snapshot of the lesson flow as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    pub loading: bool,
    pub items: Vec<LessonItem>,
    pub current_index: usize,
    pub input: String,
    pub solved: bool,
    pub next_enabled: bool,
    pub correct_overlay: bool,
    pub wrong_overlay: bool,
    pub error: Option<String>,
    pub finished: bool,
}

/// Mutually exclusive behavioral modes derived from the state flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Loading,
    Error,
    Finished,
    AnimatingCorrect,
    AnimatingWrong,
    Active,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            loading: true,
            items: Vec::new(),
            current_index: 0,
            input: String::new(),
            solved: false,
            next_enabled: true,
            correct_overlay: false,
            wrong_overlay: false,
            error: None,
            finished: false,
        }
    }
}

impl ProgressionState {
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.loading {
            Mode::Loading
        } else if self.error.is_some() {
            Mode::Error
        } else if self.finished {
            Mode::Finished
        } else if self.correct_overlay {
            Mode::AnimatingCorrect
        } else if self.wrong_overlay {
            Mode::AnimatingWrong
        } else {
            Mode::Active
        }
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&LessonItem> {
        self.items.get(self.current_index)
    }

    #[must_use]
    pub fn is_last_item(&self) -> bool {
        self.current_index + 1 >= self.items.len()
    }

    /// Items still ahead of the learner, including the current one.
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.finished {
            0
        } else {
            self.items.len().saturating_sub(self.current_index)
        }
    }

    pub(crate) fn recompute_next_enabled(&mut self) {
        self.next_enabled = match self.current_item() {
            Some(item) if item.requires_input() => !self.input.is_empty(),
            _ => true,
        };
    }

    pub(crate) fn clear_overlays(&mut self) {
        self.correct_overlay = false;
        self.wrong_overlay = false;
    }
}
