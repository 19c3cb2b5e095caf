mod error;
mod outcome;
mod public;
mod state;

pub use error::{GameError, ZoneViolation};
pub use outcome::{EndReason, Outcome};
pub use public::{HAND_SIZE, INITIAL_TALON, PublicState, follow_options};
pub use state::{Draw, GameState, Observation, Transition};

pub(crate) use public::DrawSource;
