#![deny(warnings)]
//! Rules engine and player knowledge model for two-player Schnapsen.

pub mod game;
pub mod info;
pub mod model;

use game::{GameError, GameState, Observation};
use info::InformationSet;
use model::deck::Deck;
use model::moves::Move;
use model::player::PlayerId;

/// Deals a new game from `seed` with [`PlayerId::One`] on lead.
pub fn new_game(seed: u64) -> (GameState, [InformationSet; 2]) {
    new_game_with_leader(seed, PlayerId::One)
}

pub fn new_game_with_leader(seed: u64, leader: PlayerId) -> (GameState, [InformationSet; 2]) {
    let state = GameState::deal(&Deck::shuffled_with_seed(seed), leader);
    let views = PlayerId::BOTH.map(|player| InformationSet::from_state(&state, player));
    (state, views)
}

pub fn legal_moves(state: &GameState) -> Vec<Move> {
    state.legal_moves()
}

/// Returns the successor state; `state` itself is never modified.
pub fn apply_move(state: &GameState, mv: Move) -> Result<GameState, GameError> {
    let mut next = state.clone();
    next.apply(mv)?;
    Ok(next)
}

pub fn is_terminal(state: &GameState) -> Option<game::Outcome> {
    state.outcome().copied()
}

pub fn update_information_set(
    info: &InformationSet,
    mv: Move,
    is_own_move: bool,
    observation: &Observation,
) -> Result<InformationSet, GameError> {
    let mut next = info.clone();
    next.update(mv, is_own_move, observation)?;
    Ok(next)
}
