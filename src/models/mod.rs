pub mod card;
pub mod clock;
pub mod due_queue;
pub mod input;
pub mod rating;
pub mod review_session;
pub mod scheduling_state;
pub mod session_log;
pub mod sm2;
pub mod stats;
pub mod study_timer;

pub use card::{Card, CardId, UserId};
pub use clock::{Clock, FixedClock, SimulatedClock, SystemClock};
pub use due_queue::{due_count, select_due};
pub use input::{Command, Dispatch, KeyMap};
pub use rating::Rating;
pub use review_session::{RateOutcome, ReviewSession, SessionPhase, SessionSummary};
pub use scheduling_state::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR, SchedulingState};
pub use session_log::SessionLogEntry;
pub use stats::{ActivityRange, RatingDistribution, StatsReport, WeeklyComparison};
pub use study_timer::StudyTimer;
