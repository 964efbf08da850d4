mod engine;
mod intent;
mod machine;
mod state;

// Public API of the lesson progression subsystem.
pub use engine::{EngineHandle, ProgressionEngine};
pub use intent::{Command, Effect, Intent, LoadResult, SOLVE_FIRST_MESSAGE, Transition};
pub use machine::LessonMachine;
pub use state::{Mode, ProgressionState};
