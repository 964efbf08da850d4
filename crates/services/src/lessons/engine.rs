use std::collections::VecDeque;
use std::sync::Arc;

use lesson_core::model::LessonId;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::intent::{Command, Effect, Intent};
use super::machine::LessonMachine;
use super::state::ProgressionState;
use crate::lesson_source::LessonSource;
use crate::progress_service::LessonProgressService;

const EFFECT_CAPACITY: usize = 16;

enum Message {
    Intent(Intent),
    Flush(oneshot::Sender<()>),
}

/// Async runtime around [`LessonMachine`].
///
/// A single task owns the machine and handles one intent at a time; lesson
/// fetches are awaited inline so later intents queue behind them. Start and
/// completion tracking run as detached tasks whose outcome never touches the
/// state.
pub struct ProgressionEngine {
    machine: LessonMachine,
    source: Arc<dyn LessonSource>,
    progress: LessonProgressService,
    inbox: mpsc::UnboundedReceiver<Message>,
    state_tx: watch::Sender<ProgressionState>,
    effects_tx: broadcast::Sender<Effect>,
    tracking: JoinSet<()>,
}

/// Cloneable front door to a running [`ProgressionEngine`].
#[derive(Clone)]
pub struct EngineHandle {
    inbox: mpsc::UnboundedSender<Message>,
    state_rx: watch::Receiver<ProgressionState>,
    effects_tx: broadcast::Sender<Effect>,
}

impl ProgressionEngine {
    /// Spawn the engine on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(source: Arc<dyn LessonSource>, progress: LessonProgressService) -> EngineHandle {
        let (engine, handle) = Self::new(source, progress);
        tokio::spawn(engine.run());
        handle
    }

    /// Build an engine and its handle without spawning; drive it with [`ProgressionEngine::run`].
    #[must_use]
    pub fn new(
        source: Arc<dyn LessonSource>,
        progress: LessonProgressService,
    ) -> (Self, EngineHandle) {
        let machine = LessonMachine::new();
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(machine.state().clone());
        let (effects_tx, _) = broadcast::channel(EFFECT_CAPACITY);

        let handle = EngineHandle {
            inbox: inbox_tx,
            state_rx,
            effects_tx: effects_tx.clone(),
        };
        let engine = Self {
            machine,
            source,
            progress,
            inbox,
            state_tx,
            effects_tx,
            tracking: JoinSet::new(),
        };
        (engine, handle)
    }

    /// Process messages until every handle is dropped, then wait for
    /// outstanding tracking writes.
    pub async fn run(mut self) {
        while let Some(message) = self.inbox.recv().await {
            match message {
                Message::Intent(intent) => self.process(intent).await,
                Message::Flush(done) => {
                    self.drain_tracking().await;
                    let _ = done.send(());
                }
            }
            self.reap_tracking();
        }
        self.drain_tracking().await;
        debug!("progression engine stopped");
    }

    async fn process(&mut self, intent: Intent) {
        debug!(?intent, "dispatch");
        let mut pending = VecDeque::from([self.machine.apply(intent)]);

        while let Some(transition) = pending.pop_front() {
            self.publish(transition.effect);
            for command in transition.commands {
                match command {
                    Command::FetchLessons => {
                        let result = self
                            .source
                            .fetch_lessons()
                            .await
                            .map_err(|e| e.to_string());
                        if let Err(message) = &result {
                            warn!(%message, "failed to load lessons");
                        }
                        pending.push_back(self.machine.apply_loaded(result));
                    }
                    Command::MarkStarted(id) => self.track_started(id),
                    Command::MarkCompleted(id) => self.track_completed(id),
                }
            }
        }
    }

    fn publish(&self, effect: Option<Effect>) {
        let next = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if current == next {
                false
            } else {
                current.clone_from(next);
                true
            }
        });

        if let Some(effect) = effect {
            if self.effects_tx.send(effect).is_err() {
                debug!("effect dropped, no subscribers");
            }
        }
    }

    fn track_started(&mut self, lesson_id: LessonId) {
        let progress = self.progress.clone();
        self.tracking.spawn(async move {
            if let Err(err) = progress.mark_lesson_started(&lesson_id).await {
                warn!(%lesson_id, error = %err, "failed to record lesson start");
            }
        });
    }

    fn track_completed(&mut self, lesson_id: LessonId) {
        let progress = self.progress.clone();
        self.tracking.spawn(async move {
            if let Err(err) = progress.mark_lesson_completed(&lesson_id).await {
                warn!(%lesson_id, error = %err, "failed to record lesson completion");
            }
        });
    }

    fn reap_tracking(&mut self) {
        while let Some(res) = self.tracking.try_join_next() {
            log_join(res);
        }
    }

    async fn drain_tracking(&mut self) {
        while let Some(res) = self.tracking.join_next().await {
            log_join(res);
        }
    }
}

fn log_join(res: Result<(), tokio::task::JoinError>) {
    if let Err(err) = res {
        warn!(error = %err, "tracking task failed");
    }
}

impl EngineHandle {
    /// Queue an intent. Never blocks; intents sent after shutdown are dropped.
    pub fn dispatch(&self, intent: Intent) {
        if self.inbox.send(Message::Intent(intent)).is_err() {
            warn!("progression engine is not running, intent dropped");
        }
    }

    /// Latest state snapshot.
    #[must_use]
    pub fn state(&self) -> ProgressionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that always holds the latest state and wakes on every change.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ProgressionState> {
        self.state_rx.clone()
    }

    /// Effects emitted from now on. Nothing emitted earlier is replayed.
    #[must_use]
    pub fn subscribe_effects(&self) -> broadcast::Receiver<Effect> {
        self.effects_tx.subscribe()
    }

    /// Resolves once every intent dispatched before this call has been
    /// processed and every tracking write it caused has finished.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.inbox.send(Message::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}
