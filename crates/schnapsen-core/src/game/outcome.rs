use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A player banked 66 or more.
    ReachedTarget,
    /// Every card was played; the last trick decided the game.
    LastTrick,
    /// The player who closed the talon failed to reach 66 first.
    ClosingForfeit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: PlayerId,
    /// Game points won: 1, 2 or 3.
    pub game_points: u8,
    pub reason: EndReason,
    /// Banked scores at the end; void marriages are excluded.
    pub scores: [u32; 2],
}

impl Outcome {
    pub fn loser(&self) -> PlayerId {
        self.winner.other()
    }

    /// Game points from `player`'s point of view: positive for the winner.
    pub fn signed_points(&self, player: PlayerId) -> i32 {
        if player == self.winner {
            self.game_points as i32
        } else {
            -(self.game_points as i32)
        }
    }

    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::{EndReason, Outcome};
    use crate::model::player::PlayerId;

    #[test]
    fn signed_points_flip_for_the_loser() {
        let outcome = Outcome {
            winner: PlayerId::Two,
            game_points: 2,
            reason: EndReason::LastTrick,
            scores: [20, 70],
        };
        assert_eq!(outcome.loser(), PlayerId::One);
        assert_eq!(outcome.signed_points(PlayerId::Two), 2);
        assert_eq!(outcome.signed_points(PlayerId::One), -2);
        assert_eq!(outcome.score(PlayerId::One), 20);
    }
}
