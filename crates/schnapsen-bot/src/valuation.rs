use schnapsen_core::game::{Outcome, PublicState};
use schnapsen_core::model::player::PlayerId;
use schnapsen_core::model::score::WINNING_SCORE;
use std::fmt;
use std::str::FromStr;

/// Turns a finished game into a search reward in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Valuation {
    /// Signed game points, rescaled from `[-3, 3]`.
    #[default]
    GamePoints,
    WinLoss,
    AtLeastTwo,
    AtLeastThree,
    /// Reward any result where the opponent takes fewer than two points.
    AvoidTwo,
    AvoidThree,
}

impl Valuation {
    pub const ALL: [Valuation; 6] = [
        Valuation::GamePoints,
        Valuation::WinLoss,
        Valuation::AtLeastTwo,
        Valuation::AtLeastThree,
        Valuation::AvoidTwo,
        Valuation::AvoidThree,
    ];

    pub fn reward(self, outcome: &Outcome, player: PlayerId) -> f64 {
        let signed = outcome.signed_points(player);
        let hit = match self {
            Valuation::GamePoints => return (signed as f64 + 3.0) / 6.0,
            Valuation::WinLoss => signed > 0,
            Valuation::AtLeastTwo => signed >= 2,
            Valuation::AtLeastThree => signed >= 3,
            Valuation::AvoidTwo => signed > -2,
            Valuation::AvoidThree => signed > -3,
        };
        if hit { 1.0 } else { 0.0 }
    }

    /// Estimate for a rollout cut off before the end: the banked score
    /// difference squashed into `[0, 1]`.
    pub fn estimate(self, public: &PublicState, player: PlayerId) -> f64 {
        let scores = public.scores();
        let mine = scores.score(player) as f64;
        let theirs = scores.score(player.other()) as f64;
        let lead = ((mine - theirs) / WINNING_SCORE as f64).clamp(-1.0, 1.0);
        0.5 + 0.5 * lead
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Valuation::GamePoints => "game_points",
            Valuation::WinLoss => "win",
            Valuation::AtLeastTwo => "at_least_2",
            Valuation::AtLeastThree => "at_least_3",
            Valuation::AvoidTwo => "avoid_2",
            Valuation::AvoidThree => "avoid_3",
        }
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Valuation {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        Valuation::ALL
            .into_iter()
            .find(|valuation| valuation.as_str() == needle)
            .ok_or_else(|| format!("unknown valuation '{raw}'"))
    }
}
