mod classify;
mod countdown;
mod detection_loop;
mod evaluator;
mod levels;
mod session;

pub use classify::Category;
pub use detection_loop::{DetectionLoop, Feedback, LoopSettings, LoopState, TrackedObject};
pub use evaluator::{GameMode, Outcome, OutcomeKind};
pub use session::SessionState;
