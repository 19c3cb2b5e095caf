mod heuristic;
mod rollout;

pub use heuristic::{HeuristicPolicy, score_move};
pub use rollout::{RolloutPolicy, play_out};

use crate::search::SearchError;
use rand::rngs::StdRng;
use schnapsen_core::game::{GameState, PublicState};
use schnapsen_core::info::InformationSet;
use schnapsen_core::model::hand::Hand;
use schnapsen_core::model::moves::Move;
use schnapsen_core::model::player::PlayerId;

/// What an agent may look at when asked for a move.
#[derive(Debug, Clone, Copy)]
pub enum AgentView<'a> {
    Hidden(&'a InformationSet),
    /// The true state; only the cheating tier should be handed this.
    Full(&'a GameState),
}

impl<'a> AgentView<'a> {
    pub fn public(&self) -> &'a PublicState {
        match self {
            AgentView::Hidden(info) => info.public(),
            AgentView::Full(state) => state.public(),
        }
    }

    pub fn to_move(&self) -> PlayerId {
        self.public().turn()
    }

    /// Hand of the player to move.
    pub fn hand(&self) -> &'a Hand {
        match self {
            AgentView::Hidden(info) => info.hand(),
            AgentView::Full(state) => state.hand(state.to_move()),
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        match self {
            AgentView::Hidden(info) => info.legal_moves(),
            AgentView::Full(state) => state.legal_moves(),
        }
    }
}

/// Unified interface for move selection.
pub trait Policy: Send {
    fn choose_move(&mut self, view: AgentView<'_>, rng: &mut StdRng) -> Result<Move, SearchError>;

    /// Whether the policy must be handed [`AgentView::Full`].
    fn needs_full_state(&self) -> bool {
        false
    }

    /// Forget anything carried over from a previous game.
    fn reset(&mut self) {}
}
