use lesson_core::verifier;
use tracing::debug;

use super::intent::{Command, Effect, Intent, LoadResult, SOLVE_FIRST_MESSAGE, Transition};
use super::state::{Mode, ProgressionState};

/// Deterministic lesson progression.
///
/// Every input is applied synchronously; side effects come back as
/// [`Command`]s for the caller to execute and never feed into the state
/// except for the lesson fetch result via [`LessonMachine::apply_loaded`].
#[derive(Debug, Clone, Default)]
pub struct LessonMachine {
    state: ProgressionState,
}

impl LessonMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn apply(&mut self, intent: Intent) -> Transition {
        let mode = self.state.mode();
        match intent {
            Intent::LoadItems => self.begin_load(),
            Intent::Retry if self.state.error.is_some() => self.begin_load(),
            Intent::InputChanged(text) if mode == Mode::Active => self.input_changed(text),
            Intent::CheckAnswer if mode == Mode::Active => self.check_answer(),
            Intent::CorrectAnimationFinished if self.state.correct_overlay => {
                self.state.correct_overlay = false;
                self.advance()
            }
            Intent::WrongAnimationFinished if self.state.wrong_overlay => {
                self.state.wrong_overlay = false;
                Transition::none()
            }
            Intent::NextLessonClicked if self.can_advance_manually() => self.advance(),
            Intent::NextLessonClicked if mode == Mode::Active => {
                Transition::effect(Effect::ShowMessage(SOLVE_FIRST_MESSAGE.into()))
            }
            other => {
                debug!(intent = ?other, ?mode, "intent ignored");
                Transition::none()
            }
        }
    }

    /// Feed back the outcome of a `Command::FetchLessons`.
    pub fn apply_loaded(&mut self, result: LoadResult) -> Transition {
        match result {
            Ok(items) => {
                let first = items.first().map(|item| item.id().lesson_id());
                let finished = items.is_empty();
                self.state = ProgressionState {
                    loading: false,
                    items,
                    current_index: 0,
                    input: String::new(),
                    solved: false,
                    next_enabled: true,
                    correct_overlay: false,
                    wrong_overlay: false,
                    error: None,
                    finished,
                };
                self.state.recompute_next_enabled();
                debug!(count = self.state.items.len(), finished, "lessons loaded");
                first.map_or_else(Transition::none, |id| {
                    Transition::command(Command::MarkStarted(id))
                })
            }
            Err(message) => {
                self.state.loading = false;
                self.state.error = Some(message);
                Transition::none()
            }
        }
    }

    fn begin_load(&mut self) -> Transition {
        self.state.loading = true;
        self.state.error = None;
        self.state.clear_overlays();
        Transition::command(Command::FetchLessons)
    }

    fn input_changed(&mut self, text: String) -> Transition {
        self.state.input = text;
        self.state.error = None;
        self.state.clear_overlays();
        self.state.recompute_next_enabled();
        Transition::none()
    }

    fn check_answer(&mut self) -> Transition {
        let Some(item) = self.state.current_item() else {
            return Transition::none();
        };

        if !verifier::check(item, &self.state.input) {
            self.state.solved = false;
            self.state.wrong_overlay = true;
            return Transition::none();
        }

        let completed = Transition::command(Command::MarkCompleted(item.id().lesson_id()));
        self.state.solved = true;
        self.state.error = None;

        if self.state.is_last_item() {
            self.state.finished = true;
            self.state.clear_overlays();
            completed.with_effect(Effect::NavigateToDone)
        } else {
            self.state.correct_overlay = true;
            completed
        }
    }

    fn can_advance_manually(&self) -> bool {
        self.state.solved && !self.state.loading && !self.state.finished
    }

    fn advance(&mut self) -> Transition {
        let next = self.state.current_index + 1;
        self.state.clear_overlays();

        let Some(item) = self.state.items.get(next) else {
            self.state.finished = true;
            return Transition::effect(Effect::NavigateToDone);
        };
        let started = item.id().lesson_id();

        self.state.current_index = next;
        self.state.input.clear();
        self.state.solved = false;
        self.state.recompute_next_enabled();
        Transition::command(Command::MarkStarted(started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{AnswerRange, ContentSegment, ItemId, LessonId, LessonItem};

    fn plain(id: u64) -> LessonItem {
        LessonItem::new(
            ItemId::new(id),
            vec![ContentSegment::new("#FFFFFF", "Read me")],
            None,
        )
    }

    fn hello_world(id: u64) -> LessonItem {
        LessonItem::new(
            ItemId::new(id),
            vec![
                ContentSegment::new("#FFFFFF", "Hello "),
                ContentSegment::new("#FF0000", "World"),
                ContentSegment::new("#FFFFFF", "!"),
            ],
            Some(AnswerRange::new(6, 11)),
        )
    }

    fn loaded(items: Vec<LessonItem>) -> LessonMachine {
        let mut machine = LessonMachine::new();
        let t = machine.apply(Intent::LoadItems);
        assert_eq!(t.commands, vec![Command::FetchLessons]);
        machine.apply_loaded(Ok(items));
        machine
    }

    fn assert_overlay_invariants(state: &ProgressionState) {
        assert!(!(state.correct_overlay && state.wrong_overlay));
        if state.loading || state.finished {
            assert!(!state.correct_overlay && !state.wrong_overlay);
        }
        assert!(state.current_index <= state.items.len());
    }

    #[test]
    fn starts_in_loading_mode() {
        let machine = LessonMachine::new();
        assert_eq!(machine.mode(), Mode::Loading);
        assert!(machine.state().items.is_empty());
    }

    #[test]
    fn load_marks_first_item_started() {
        let mut machine = LessonMachine::new();
        machine.apply(Intent::LoadItems);
        assert!(machine.state().loading);

        let t = machine.apply_loaded(Ok(vec![plain(1), hello_world(2)]));

        assert_eq!(t.commands, vec![Command::MarkStarted(LessonId::new("1"))]);
        let state = machine.state();
        assert!(!state.loading);
        assert_eq!(state.current_index, 0);
        assert!(state.next_enabled);
        assert!(!state.finished);
        assert_eq!(machine.mode(), Mode::Active);
    }

    #[test]
    fn empty_load_finishes_immediately() {
        let mut machine = LessonMachine::new();
        machine.apply(Intent::LoadItems);
        let t = machine.apply_loaded(Ok(vec![]));

        assert!(t.is_noop());
        assert!(machine.state().finished);
        assert_eq!(machine.mode(), Mode::Finished);
        assert!(machine.apply(Intent::CheckAnswer).is_noop());
        assert!(machine.apply(Intent::NextLessonClicked).is_noop());
    }

    #[test]
    fn load_failure_sets_error_and_retry_reloads() {
        let mut machine = LessonMachine::new();
        machine.apply(Intent::LoadItems);
        machine.apply_loaded(Err("Network error".into()));

        assert_eq!(machine.mode(), Mode::Error);
        assert_eq!(machine.state().error.as_deref(), Some("Network error"));
        assert!(!machine.state().loading);

        let t = machine.apply(Intent::Retry);
        assert_eq!(t.commands, vec![Command::FetchLessons]);
        assert!(machine.state().loading);
        assert_eq!(machine.state().error, None);
    }

    #[test]
    fn retry_without_error_is_ignored() {
        let mut machine = loaded(vec![plain(1)]);
        let before = machine.state().clone();
        assert!(machine.apply(Intent::Retry).is_noop());
        assert_eq!(machine.state(), &before);
    }

    #[test]
    fn single_plain_item_finishes_on_check() {
        let mut machine = loaded(vec![plain(1)]);
        assert!(!machine.state().finished);
        assert_eq!(machine.state().current_index, 0);

        let t = machine.apply(Intent::CheckAnswer);

        assert_eq!(t.commands, vec![Command::MarkCompleted(LessonId::new("1"))]);
        assert_eq!(t.effect, Some(Effect::NavigateToDone));
        let state = machine.state();
        assert!(state.finished);
        assert!(state.solved);
        assert!(!state.correct_overlay && !state.wrong_overlay);
    }

    #[test]
    fn plain_item_solves_regardless_of_input() {
        let mut machine = loaded(vec![plain(1), plain(2)]);
        machine.apply(Intent::InputChanged("whatever".into()));
        let t = machine.apply(Intent::CheckAnswer);

        assert_eq!(t.commands, vec![Command::MarkCompleted(LessonId::new("1"))]);
        assert!(machine.state().solved);
        assert!(machine.state().correct_overlay);
    }

    #[test]
    fn correct_then_wrong_answers() {
        let mut machine = loaded(vec![hello_world(1), plain(2)]);
        assert!(!machine.state().next_enabled);

        machine.apply(Intent::InputChanged("World".into()));
        assert!(machine.state().next_enabled);
        let t = machine.apply(Intent::CheckAnswer);
        assert_eq!(t.commands, vec![Command::MarkCompleted(LessonId::new("1"))]);
        assert!(machine.state().correct_overlay);
        assert!(machine.state().solved);
        assert_eq!(machine.mode(), Mode::AnimatingCorrect);

        let mut machine = loaded(vec![hello_world(1), plain(2)]);
        machine.apply(Intent::InputChanged("Nope".into()));
        let t = machine.apply(Intent::CheckAnswer);
        assert!(t.is_noop());
        assert!(machine.state().wrong_overlay);
        assert!(!machine.state().solved);
        assert_eq!(machine.mode(), Mode::AnimatingWrong);
    }

    #[test]
    fn wrong_animation_returns_to_active() {
        let mut machine = loaded(vec![hello_world(1)]);
        machine.apply(Intent::InputChanged("Nope".into()));
        machine.apply(Intent::CheckAnswer);

        assert!(machine.apply(Intent::InputChanged("ignored".into())).is_noop());
        assert_eq!(machine.state().input, "Nope");

        machine.apply(Intent::WrongAnimationFinished);
        assert_eq!(machine.mode(), Mode::Active);
        assert_eq!(machine.state().current_index, 0);

        machine.apply(Intent::InputChanged("World".into()));
        let t = machine.apply(Intent::CheckAnswer);
        assert_eq!(t.effect, Some(Effect::NavigateToDone));
        assert!(machine.state().finished);
    }

    #[test]
    fn correct_animation_advances_and_resets_input() {
        let mut machine = loaded(vec![hello_world(1), hello_world(2)]);
        machine.apply(Intent::InputChanged("World".into()));
        machine.apply(Intent::CheckAnswer);

        let t = machine.apply(Intent::CorrectAnimationFinished);

        assert_eq!(t.commands, vec![Command::MarkStarted(LessonId::new("2"))]);
        assert_eq!(t.effect, None);
        let state = machine.state();
        assert_eq!(state.current_index, 1);
        assert_eq!(state.input, "");
        assert!(!state.solved);
        assert!(!state.next_enabled);
        assert!(!state.correct_overlay);
        assert_eq!(machine.mode(), Mode::Active);
    }

    #[test]
    fn next_before_solving_shows_message_once() {
        let mut machine = loaded(vec![hello_world(1), plain(2)]);
        let before = machine.state().clone();

        let t = machine.apply(Intent::NextLessonClicked);

        assert_eq!(
            t.effect,
            Some(Effect::ShowMessage(SOLVE_FIRST_MESSAGE.into()))
        );
        assert!(t.commands.is_empty());
        assert_eq!(machine.state(), &before);
    }

    #[test]
    fn next_while_solved_skips_animation_without_double_advance() {
        let mut machine = loaded(vec![plain(1), plain(2), plain(3)]);
        machine.apply(Intent::CheckAnswer);
        assert!(machine.state().correct_overlay);

        let t = machine.apply(Intent::NextLessonClicked);
        assert_eq!(t.commands, vec![Command::MarkStarted(LessonId::new("2"))]);
        assert_eq!(machine.state().current_index, 1);
        assert!(!machine.state().correct_overlay);

        assert!(machine.apply(Intent::CorrectAnimationFinished).is_noop());
        assert_eq!(machine.state().current_index, 1);
    }

    #[test]
    fn walks_every_item_in_order() {
        let items = vec![plain(10), hello_world(20), plain(30)];
        let mut machine = loaded(items);
        let mut started = vec![];
        let mut completed = vec![];
        let mut effects = vec![];

        let mut record = |t: Transition| {
            for c in t.commands {
                match c {
                    Command::MarkStarted(id) => started.push(id.into_inner()),
                    Command::MarkCompleted(id) => completed.push(id.into_inner()),
                    Command::FetchLessons => unreachable!(),
                }
            }
            effects.extend(t.effect);
        };

        record(machine.apply(Intent::CheckAnswer));
        assert_overlay_invariants(machine.state());
        record(machine.apply(Intent::CorrectAnimationFinished));
        record(machine.apply(Intent::InputChanged("World".into())));
        record(machine.apply(Intent::CheckAnswer));
        assert_overlay_invariants(machine.state());
        record(machine.apply(Intent::CorrectAnimationFinished));
        record(machine.apply(Intent::CheckAnswer));
        assert_overlay_invariants(machine.state());

        assert_eq!(started, vec!["20", "30"]);
        assert_eq!(completed, vec!["10", "20", "30"]);
        assert_eq!(effects, vec![Effect::NavigateToDone]);
        assert!(machine.state().finished);
        assert_eq!(machine.state().remaining(), 0);
    }

    #[test]
    fn reload_mid_animation_clears_overlays() {
        let mut machine = loaded(vec![plain(1), plain(2)]);
        machine.apply(Intent::CheckAnswer);
        assert!(machine.state().correct_overlay);

        machine.apply(Intent::LoadItems);
        assert_overlay_invariants(machine.state());
        assert_eq!(machine.mode(), Mode::Loading);
    }
}
