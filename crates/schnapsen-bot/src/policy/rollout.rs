use super::HeuristicPolicy;
use rand::Rng;
use rand::seq::SliceRandom;
use schnapsen_core::game::GameState;
use schnapsen_core::model::moves::Move;
use std::fmt;
use std::str::FromStr;

/// How simulations pick moves once they leave the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RolloutPolicy {
    #[default]
    Random,
    Heuristic,
}

impl RolloutPolicy {
    pub fn pick<R: Rng + ?Sized>(self, state: &GameState, legal: &[Move], rng: &mut R) -> Option<Move> {
        match self {
            RolloutPolicy::Random => legal.choose(rng).copied(),
            RolloutPolicy::Heuristic => {
                HeuristicPolicy::pick(state.public(), state.hand(state.to_move()), legal)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RolloutPolicy::Random => "random",
            RolloutPolicy::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for RolloutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RolloutPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(RolloutPolicy::Random),
            "heuristic" => Ok(RolloutPolicy::Heuristic),
            other => Err(format!("unknown rollout policy '{other}'")),
        }
    }
}

/// Plays `state` forward with `policy` for at most `max_plies` moves and
/// returns how many were played. The state may still be live afterwards.
pub fn play_out<R: Rng + ?Sized>(
    state: &mut GameState,
    policy: RolloutPolicy,
    max_plies: usize,
    rng: &mut R,
) -> usize {
    let mut plies = 0;
    while plies < max_plies {
        let legal = state.legal_moves();
        let Some(mv) = policy.pick(state, &legal, rng) else {
            break;
        };
        state.apply_unchecked(mv);
        plies += 1;
    }
    plies
}
