use crate::policy::RolloutPolicy;
use crate::valuation::Valuation;
use std::fmt;
use std::str::FromStr;

/// Difficulty tiers offered to players. Each maps to a fixed [`SearchParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Trivial,
    Easy,
    #[default]
    Medium,
    Hard,
    /// Searches the true game state instead of sampling hidden cards.
    Cheating,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Trivial,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Cheating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Trivial => "trivial",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Cheating => "cheating",
        }
    }

    pub fn params(self) -> SearchParams {
        SearchParams::for_difficulty(self)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError(String);

impl fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown difficulty '{}' (expected trivial, easy, medium, hard or cheating)",
            self.0
        )
    }
}

impl std::error::Error for ParseDifficultyError {}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trivial" => Ok(Difficulty::Trivial),
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "cheating" | "cheat" => Ok(Difficulty::Cheating),
            _ => Err(ParseDifficultyError(raw.to_string())),
        }
    }
}

/// Everything the search engine needs to know about how hard to think.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub iterations: u32,
    /// Sample hidden cards per iteration; `false` searches the true state.
    pub determinize: bool,
    pub rollout: RolloutPolicy,
    pub exploration: f64,
    pub valuation: Valuation,
    /// Independent root-parallel trees.
    pub workers: usize,
    pub max_rollout_plies: usize,
    /// Keep the matching subtree between decisions of one game.
    pub reuse_tree: bool,
}

impl SearchParams {
    pub const DEFAULT_EXPLORATION: f64 = 0.7;
    pub const DEFAULT_ROLLOUT_PLIES: usize = 48;

    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let base = Self {
            iterations: 1000,
            determinize: true,
            rollout: RolloutPolicy::Random,
            exploration: Self::DEFAULT_EXPLORATION,
            valuation: Valuation::GamePoints,
            workers: 1,
            max_rollout_plies: Self::DEFAULT_ROLLOUT_PLIES,
            reuse_tree: false,
        };
        match difficulty {
            Difficulty::Trivial => Self {
                iterations: 10,
                ..base
            },
            Difficulty::Easy => Self {
                iterations: 100,
                ..base
            },
            Difficulty::Medium => base,
            Difficulty::Hard => Self {
                iterations: 5000,
                rollout: RolloutPolicy::Heuristic,
                reuse_tree: true,
                ..base
            },
            Difficulty::Cheating => Self {
                iterations: 5000,
                determinize: false,
                rollout: RolloutPolicy::Heuristic,
                ..base
            },
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_valuation(mut self, valuation: Valuation) -> Self {
        self.valuation = valuation;
        self
    }

    /// Applies `SCHNAPSEN_ITERATIONS` and `SCHNAPSEN_WORKERS` from the
    /// environment, ignoring values that do not parse.
    pub fn from_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(iterations) = read("SCHNAPSEN_ITERATIONS").and_then(|raw| raw.trim().parse().ok())
        {
            self.iterations = iterations;
        }
        if let Some(workers) = read("SCHNAPSEN_WORKERS")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|workers| *workers > 0)
        {
            self.workers = workers;
        }
        self
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{Difficulty, SearchParams};
    use crate::policy::RolloutPolicy;

    #[test]
    fn labels_round_trip() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.as_str().parse::<Difficulty>(), Ok(difficulty));
        }
        assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn budgets_grow_with_difficulty() {
        let budgets: Vec<u32> = Difficulty::ALL[..4]
            .iter()
            .map(|difficulty| difficulty.params().iterations)
            .collect();
        assert!(budgets.windows(2).all(|pair| pair[0] < pair[1]));
        let cheating = Difficulty::Cheating.params();
        assert!(!cheating.determinize);
        assert_eq!(cheating.rollout, RolloutPolicy::Heuristic);
    }

    #[test]
    fn overrides_replace_budget_and_workers() {
        let params = SearchParams::for_difficulty(Difficulty::Easy).with_overrides(|key| match key {
            "SCHNAPSEN_ITERATIONS" => Some("250".to_string()),
            "SCHNAPSEN_WORKERS" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(params.iterations, 250);
        assert_eq!(params.workers, 1);
    }
}
