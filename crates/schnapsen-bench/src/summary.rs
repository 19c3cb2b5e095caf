use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("agent '{0}' appears in results but not in the configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("normal distribution unavailable: {0}")]
    Distribution(String),
}

/// Per-agent result of one finished game, as fed to [`SummaryCollector`].
#[derive(Debug, Clone)]
pub struct AgentGame {
    pub agent: String,
    pub won: bool,
    pub led_first: bool,
    /// Game points gained (positive) or conceded (negative).
    pub signed_points: i32,
    pub decisions: u32,
    pub total_ms: f64,
}

pub struct SummaryCollector {
    agents: Vec<AgentAccumulator>,
}

impl SummaryCollector {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agents: names
                .into_iter()
                .map(|name| AgentAccumulator::new(name.into()))
                .collect(),
        }
    }

    pub fn record_game(&mut self, results: &[AgentGame]) -> Result<(), SummaryError> {
        for result in results {
            let acc = self
                .agents
                .iter_mut()
                .find(|acc| acc.name == result.agent)
                .ok_or_else(|| SummaryError::UnknownAgent(result.agent.clone()))?;
            acc.record(result);
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<MatchSummary, SummaryError> {
        let reports: Vec<AgentReport> = self
            .agents
            .into_iter()
            .map(AgentAccumulator::into_report)
            .collect();
        let p_value = match reports.as_slice() {
            [a, b] => two_proportion_p_value(a.wins, a.games, b.wins, b.games)?,
            _ => 1.0,
        };
        Ok(MatchSummary {
            agents: reports,
            p_value,
        })
    }
}

struct AgentAccumulator {
    name: String,
    games: usize,
    wins: usize,
    wins_leading: usize,
    games_leading: usize,
    points_won: u32,
    points_lost: u32,
    decisions: u64,
    total_ms: f64,
}

impl AgentAccumulator {
    fn new(name: String) -> Self {
        Self {
            name,
            games: 0,
            wins: 0,
            wins_leading: 0,
            games_leading: 0,
            points_won: 0,
            points_lost: 0,
            decisions: 0,
            total_ms: 0.0,
        }
    }

    fn record(&mut self, game: &AgentGame) {
        self.games += 1;
        if game.led_first {
            self.games_leading += 1;
        }
        if game.won {
            self.wins += 1;
            if game.led_first {
                self.wins_leading += 1;
            }
        }
        if game.signed_points >= 0 {
            self.points_won += game.signed_points.unsigned_abs();
        } else {
            self.points_lost += game.signed_points.unsigned_abs();
        }
        self.decisions += u64::from(game.decisions);
        self.total_ms += game.total_ms;
    }

    fn into_report(self) -> AgentReport {
        let win_rate = ratio(self.wins, self.games);
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / self.decisions as f64
        };
        AgentReport {
            ci95: wilson_interval(self.wins, self.games),
            name: self.name,
            games: self.games,
            wins: self.wins,
            win_rate,
            wins_leading: self.wins_leading,
            games_leading: self.games_leading,
            points_won: self.points_won,
            points_lost: self.points_lost,
            average_ms_per_decision: avg_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub wins_leading: usize,
    pub games_leading: usize,
    pub points_won: u32,
    pub points_lost: u32,
    pub average_ms_per_decision: f64,
}

impl AgentReport {
    /// Net game points per game played.
    pub fn points_per_game(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            (f64::from(self.points_won) - f64::from(self.points_lost)) / self.games as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub agents: Vec<AgentReport>,
    /// Two-sided p-value for the two agents' win rates being equal.
    pub p_value: f64,
}

impl MatchSummary {
    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str("# Match Summary\n\n");
        rows.push_str("| Agent | Games | Wins | Win % | 95% CI | Wins on lead | Points won | Points lost | Points/game | Avg ms/decision |\n");
        rows.push_str("|-------|-------|------|-------|--------|--------------|------------|-------------|-------------|-----------------|\n");
        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {games} | {wins} | {win:.1}% | [{low:.3}, {high:.3}] | {lead_wins}/{lead_games} | {won} | {lost} | {ppg:+.3} | {latency:.2} |\n",
                name = agent.name,
                games = agent.games,
                wins = agent.wins,
                win = agent.win_rate * 100.0,
                low = agent.ci95.0,
                high = agent.ci95.1,
                lead_wins = agent.wins_leading,
                lead_games = agent.games_leading,
                won = agent.points_won,
                lost = agent.points_lost,
                ppg = agent.points_per_game(),
                latency = agent.average_ms_per_decision,
            ));
        }
        rows.push_str(&format!(
            "\nWin-rate difference, two-proportion z-test: p = {:.4}\n",
            self.p_value
        ));
        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), SummaryError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|e| SummaryError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Wilson score interval for `wins` successes out of `games`.
pub fn wilson_interval(wins: usize, games: usize) -> (f64, f64) {
    if games == 0 {
        return (0.0, 0.0);
    }
    let n = games as f64;
    let p = wins as f64 / n;
    let z2 = CONFIDENCE_Z * CONFIDENCE_Z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = CONFIDENCE_Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    ((center - half).max(0.0), (center + half).min(1.0))
}

/// Two-sided pooled z-test for `x1/n1` and `x2/n2` coming from the same rate.
pub fn two_proportion_p_value(
    x1: usize,
    n1: usize,
    x2: usize,
    n2: usize,
) -> Result<f64, SummaryError> {
    if n1 == 0 || n2 == 0 {
        return Ok(1.0);
    }
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let pooled = (x1 + x2) as f64 / (n1f + n2f);
    let variance = pooled * (1.0 - pooled) * (1.0 / n1f + 1.0 / n2f);
    if variance <= 0.0 {
        return Ok(1.0);
    }
    let z = (x1 as f64 / n1f - x2 as f64 / n2f) / variance.sqrt();
    let normal =
        Normal::new(0.0, 1.0).map_err(|err| SummaryError::Distribution(err.to_string()))?;
    let p = 2.0 * (1.0 - normal.cdf(z.abs()));
    Ok(p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(agent: &str, won: bool, led_first: bool, signed_points: i32) -> AgentGame {
        AgentGame {
            agent: agent.to_string(),
            won,
            led_first,
            signed_points,
            decisions: 10,
            total_ms: 5.0,
        }
    }

    #[test]
    fn wilson_interval_brackets_the_rate() {
        let (low, high) = wilson_interval(30, 100);
        assert!(low < 0.3 && 0.3 < high);
        assert!((low - 0.219).abs() < 0.005, "low {low}");
        assert!((high - 0.396).abs() < 0.005, "high {high}");
        assert_eq!(wilson_interval(0, 0), (0.0, 0.0));
        let (low, _) = wilson_interval(0, 10);
        assert_eq!(low, 0.0);
    }

    #[test]
    fn equal_rates_are_not_significant() {
        let p = two_proportion_p_value(50, 100, 50, 100).unwrap();
        assert!((p - 1.0).abs() < 1e-9);
        let p = two_proportion_p_value(80, 100, 20, 100).unwrap();
        assert!(p < 1e-6);
        assert_eq!(two_proportion_p_value(0, 0, 3, 5).unwrap(), 1.0);
        assert_eq!(two_proportion_p_value(5, 5, 5, 5).unwrap(), 1.0);
    }

    #[test]
    fn collector_tallies_both_agents() {
        let mut collector = SummaryCollector::new(["a", "b"]);
        collector
            .record_game(&[game("a", true, true, 3), game("b", false, false, -3)])
            .unwrap();
        collector
            .record_game(&[game("a", false, false, -1), game("b", true, true, 1)])
            .unwrap();
        assert!(matches!(
            collector.record_game(&[game("c", true, true, 1)]),
            Err(SummaryError::UnknownAgent(name)) if name == "c"
        ));

        let summary = collector.finalize().unwrap();
        let a = summary.agent("a").unwrap();
        assert_eq!((a.games, a.wins, a.wins_leading), (2, 1, 1));
        assert_eq!((a.points_won, a.points_lost), (3, 1));
        assert!((a.points_per_game() - 1.0).abs() < 1e-9);
        assert!((a.average_ms_per_decision - 0.5).abs() < 1e-9);
        assert!((summary.p_value - 1.0).abs() < 1e-9);

        let markdown = summary.to_markdown();
        assert!(markdown.contains("| a | 2 | 1 | 50.0% |"));
        assert!(markdown.contains("p = 1.0000"));
    }
}
