use crate::model::card::Card;
use crate::model::moves::Move;
use crate::model::player::PlayerId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The move is not in the legal set; the state is left unchanged.
    IllegalMove { player: PlayerId, mv: Move },
    OutOfTurn { expected: PlayerId, actual: PlayerId },
    GameOver,
    /// An own draw happened but the observation did not carry the card.
    MissingDraw { player: PlayerId },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::IllegalMove { player, mv } => {
                write!(f, "illegal move {mv} for {player}")
            }
            GameError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to move but got {actual}")
            }
            GameError::GameOver => write!(f, "game is already over"),
            GameError::MissingDraw { player } => {
                write!(f, "observation for {player} is missing the drawn card")
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Breach of the card-conservation invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneViolation {
    CardCount { found: usize },
    Duplicate(Card),
    HandSize {
        player: PlayerId,
        recorded: usize,
        actual: usize,
    },
    TalonSize { recorded: usize, actual: usize },
}

impl fmt::Display for ZoneViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneViolation::CardCount { found } => {
                write!(f, "zones hold {found} cards instead of 20")
            }
            ZoneViolation::Duplicate(card) => write!(f, "{card} appears in more than one zone"),
            ZoneViolation::HandSize {
                player,
                recorded,
                actual,
            } => write!(
                f,
                "{player} holds {actual} cards but the table records {recorded}"
            ),
            ZoneViolation::TalonSize { recorded, actual } => write!(
                f,
                "talon holds {actual} cards but the table records {recorded}"
            ),
        }
    }
}

impl std::error::Error for ZoneViolation {}
