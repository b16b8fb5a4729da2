//! Quiz session lifecycle: countdown, navigation, answers, scoring, finalize.

mod clock;
mod finalize;
mod navigator;
mod scorer;
mod state;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use finalize::build_attempt;
pub use scorer::{percentage, score, score_answers, ScoreReport};
pub use state::{SessionPhase, SessionSnapshot, SessionState};
pub use timer::Timer;
