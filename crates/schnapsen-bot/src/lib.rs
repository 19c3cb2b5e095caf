pub mod difficulty;
pub mod policy;
pub mod search;
pub mod valuation;

pub use difficulty::{Difficulty, ParseDifficultyError, SearchParams};
pub use policy::{AgentView, HeuristicPolicy, Policy, RolloutPolicy};
pub use search::{CancelToken, Decision, Ismcts, SearchError, SearchWarning};
pub use valuation::Valuation;

use rand::RngCore;
use schnapsen_core::model::moves::Move;

/// One-shot move choice for `difficulty`. Never returns an illegal move.
///
/// The cheating tier must be given [`AgentView::Full`]; every other tier
/// accepts either view and only reads what the player to move may know.
pub fn choose_move<R: RngCore + ?Sized>(
    view: AgentView<'_>,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Move, SearchError> {
    Ismcts::new(difficulty.params())
        .decide(view, rng)
        .map(|decision| decision.mv)
}
