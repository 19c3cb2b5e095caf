use crate::model::player::PlayerId;

pub const WINNING_SCORE: u32 = 66;
pub const SCHNEIDER_LINE: u32 = 33;

/// Per-player card points and marriage bonuses for one game.
///
/// Marriage points stay pending until the declaring player wins a trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBoard {
    trick_points: [u32; 2],
    banked_marriages: [u32; 2],
    pending_marriages: [u32; 2],
    tricks_won: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self {
            trick_points: [0; 2],
            banked_marriages: [0; 2],
            pending_marriages: [0; 2],
            tricks_won: [0; 2],
        }
    }

    /// Credits a won trick and banks any pending marriage points.
    pub fn add_trick(&mut self, player: PlayerId, points: u32) {
        let idx = player.index();
        self.trick_points[idx] += points;
        self.tricks_won[idx] += 1;
        self.banked_marriages[idx] += std::mem::take(&mut self.pending_marriages[idx]);
    }

    pub fn declare_marriage(&mut self, player: PlayerId, points: u32) {
        self.pending_marriages[player.index()] += points;
    }

    /// Banked score: trick points plus confirmed marriages.
    pub fn score(&self, player: PlayerId) -> u32 {
        let idx = player.index();
        self.trick_points[idx] + self.banked_marriages[idx]
    }

    pub fn trick_points(&self, player: PlayerId) -> u32 {
        self.trick_points[player.index()]
    }

    pub fn pending(&self, player: PlayerId) -> u32 {
        self.pending_marriages[player.index()]
    }

    pub fn tricks_won(&self, player: PlayerId) -> u32 {
        self.tricks_won[player.index()]
    }

    pub fn standings(&self) -> [u32; 2] {
        [self.score(PlayerId::One), self.score(PlayerId::Two)]
    }

    pub fn has_reached_target(&self, player: PlayerId) -> bool {
        self.score(player) >= WINNING_SCORE
    }
}

/// Game points awarded to a winner, judged by the loser's score.
pub const fn game_points_against(loser_score: u32) -> u8 {
    if loser_score == 0 {
        3
    } else if loser_score < SCHNEIDER_LINE {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoreBoard, game_points_against};
    use crate::model::player::PlayerId;

    #[test]
    fn marriage_is_pending_until_a_trick_is_won() {
        let mut board = ScoreBoard::new();
        board.declare_marriage(PlayerId::One, 40);
        assert_eq!(board.score(PlayerId::One), 0);
        assert_eq!(board.pending(PlayerId::One), 40);

        board.add_trick(PlayerId::One, 14);
        assert_eq!(board.score(PlayerId::One), 54);
        assert_eq!(board.pending(PlayerId::One), 0);
        assert_eq!(board.tricks_won(PlayerId::One), 1);
    }

    #[test]
    fn opponent_trick_does_not_bank_marriage() {
        let mut board = ScoreBoard::new();
        board.declare_marriage(PlayerId::Two, 20);
        board.add_trick(PlayerId::One, 21);
        assert_eq!(board.score(PlayerId::Two), 0);
        assert_eq!(board.pending(PlayerId::Two), 20);
        assert_eq!(board.standings(), [21, 0]);
    }

    #[test]
    fn game_points_follow_loser_score() {
        assert_eq!(game_points_against(0), 3);
        assert_eq!(game_points_against(32), 2);
        assert_eq!(game_points_against(33), 1);
    }
}
