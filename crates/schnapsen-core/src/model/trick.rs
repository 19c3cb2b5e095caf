use crate::model::card::Card;
use crate::model::player::PlayerId;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trick {
    leader: PlayerId,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub player: PlayerId,
    pub card: Card,
}

/// A resolved trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickResult {
    pub lead: Play,
    pub reply: Play,
    pub winner: PlayerId,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickError {
    TrickComplete,
    OutOfTurn { expected: PlayerId, actual: PlayerId },
}

impl fmt::Display for TrickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrickError::TrickComplete => write!(f, "trick already complete"),
            TrickError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to play next but got {actual}")
            }
        }
    }
}

impl std::error::Error for TrickError {}

impl Trick {
    pub fn new(leader: PlayerId) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(2),
        }
    }

    pub fn leader(&self) -> PlayerId {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 2
    }

    pub fn lead_card(&self) -> Option<Card> {
        self.plays.first().map(|play| play.card)
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.lead_card().map(|card| card.suit)
    }

    pub fn play(&mut self, player: PlayerId, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        let expected = self.expected_player();
        if expected != player {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: player,
            });
        }

        self.plays.push(Play { player, card });
        Ok(())
    }

    /// Resolves a complete trick: a trump beats a plain card, otherwise the
    /// higher card of the led suit wins.
    pub fn resolve(&self, trump: Suit) -> Option<TrickResult> {
        if !self.is_complete() {
            return None;
        }
        let lead = self.plays[0];
        let reply = self.plays[1];
        let winner = if reply.card.beats(lead.card, trump) {
            reply.player
        } else {
            lead.player
        };
        Some(TrickResult {
            lead,
            reply,
            winner,
            points: self.points(),
        })
    }

    pub fn points(&self) -> u32 {
        self.plays.iter().map(|play| play.card.points()).sum()
    }

    fn expected_player(&self) -> PlayerId {
        self.plays
            .last()
            .map(|play| play.player.other())
            .unwrap_or(self.leader)
    }
}

impl TrickResult {
    pub fn loser(&self) -> PlayerId {
        self.winner.other()
    }

    pub fn cards(&self) -> [Card; 2] {
        [self.lead.card, self.reply.card]
    }
}
