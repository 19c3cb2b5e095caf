use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use schnapsen_bot::{AgentView, HeuristicPolicy, Ismcts, Policy, SearchError, SearchParams};
use schnapsen_core::game::{EndReason, GameError, Outcome};
use schnapsen_core::info::InformationSet;
use schnapsen_core::model::player::PlayerId;
use schnapsen_core::{new_game_with_leader, update_information_set};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AGENT_COUNT, AgentConfig, AgentKind, MatchConfig, ResolvedOutputs};
use crate::summary::{AgentGame, MatchSummary, SummaryCollector, SummaryError};

const SEAT_SALT: [u64; 2] = [0x5eed_0001, 0x5eed_0002];

/// Plays a fixed number of games between the two configured agents.
pub struct MatchRunner {
    config: MatchConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub report: MatchSummary,
}

impl MatchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: MatchConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        if config.agents.len() != AGENT_COUNT {
            return Err(RunnerError::AgentCount {
                found: config.agents.len(),
            });
        }
        let agents = config
            .agents
            .iter()
            .map(AgentBlueprint::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute the match, streaming one JSONL row per game.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut policies: Vec<Box<dyn Policy>> =
            self.agents.iter().map(AgentBlueprint::spawn_policy).collect();
        let mut summary = SummaryCollector::new(self.agents.iter().map(|agent| agent.name.clone()));
        let mut rows_written = 0usize;

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            for policy in policies.iter_mut() {
                policy.reset();
            }
            let record = self.play_game(game_index, game_seed, &mut policies)?;
            summary.record_game(&record.agent_games())?;
            self.log_game(&record);

            serde_json::to_writer(&mut writer, &record.log_row(&self.config.run_id))?;
            writer.write_all(b"\n")?;
            rows_written += 1;
        }
        writer.flush()?;

        let report = summary.finalize()?;
        report.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self.logging_enabled.then(|| {
            self.outputs
                .summary_md
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("telemetry.jsonl")
        });

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
            report,
        })
    }

    /// Agent `i` always sits as seat `i`; the first lead alternates by game.
    fn play_game(
        &self,
        game_index: usize,
        game_seed: u64,
        policies: &mut [Box<dyn Policy>],
    ) -> Result<GameRecord, RunnerError> {
        let leader = if game_index % 2 == 0 {
            PlayerId::One
        } else {
            PlayerId::Two
        };
        let (mut state, views) = new_game_with_leader(game_seed, leader);
        let mut seats: Vec<SeatState> = views
            .into_iter()
            .enumerate()
            .map(|(index, view)| SeatState {
                view,
                rng: StdRng::seed_from_u64(game_seed ^ SEAT_SALT[index]),
                metrics: DecisionMetrics::default(),
            })
            .collect();
        let mut moves = 0usize;

        let outcome = loop {
            if let Some(outcome) = state.outcome() {
                break *outcome;
            }

            let mover = state.to_move();
            let index = mover.index();
            let seat = &mut seats[index];
            let policy = &mut policies[index];
            let view = if policy.needs_full_state() {
                AgentView::Full(&state)
            } else {
                AgentView::Hidden(&seat.view)
            };

            let start = Instant::now();
            let mv = policy
                .choose_move(view, &mut seat.rng)
                .map_err(|source| RunnerError::Agent {
                    agent: self.agents[index].name.clone(),
                    source,
                })?;
            let elapsed_ms = seat.metrics.record(start.elapsed());

            if self.logging_enabled && tracing::enabled!(Level::DEBUG) {
                event!(
                    target: "schnapsen_bench::move",
                    Level::DEBUG,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    agent = %self.agents[index].name,
                    seat = %mover,
                    mv = %mv,
                    elapsed_ms
                );
            }

            let transition = state.apply(mv).map_err(|source| RunnerError::Game {
                game_index,
                source,
            })?;
            moves += 1;

            for player in PlayerId::BOTH {
                let seat = &mut seats[player.index()];
                seat.view = update_information_set(
                    &seat.view,
                    mv,
                    player == mover,
                    &transition.observation(player),
                )
                .map_err(|source| RunnerError::Game { game_index, source })?;
            }
        };

        Ok(GameRecord {
            game_index,
            game_seed,
            leader,
            outcome,
            moves,
            names: [self.agents[0].name.clone(), self.agents[1].name.clone()],
            metrics: [seats[0].metrics.finalize(), seats[1].metrics.finalize()],
        })
    }

    fn log_game(&self, record: &GameRecord) {
        if !self.logging_enabled || !tracing::enabled!(Level::INFO) {
            return;
        }
        event!(
            target: "schnapsen_bench::game",
            Level::INFO,
            run_id = %self.config.run_id,
            game_index = record.game_index as u32,
            game_seed = record.game_seed,
            winner = %record.name(record.outcome.winner),
            game_points = record.outcome.game_points,
            reason = ?record.outcome.reason,
            moves = record.moves as u32
        );
    }
}

/// Everything needed to report one finished game.
struct GameRecord {
    game_index: usize,
    game_seed: u64,
    leader: PlayerId,
    outcome: Outcome,
    moves: usize,
    names: [String; 2],
    metrics: [DecisionSummary; 2],
}

impl GameRecord {
    fn name(&self, seat: PlayerId) -> &str {
        &self.names[seat.index()]
    }

    fn agent_games(&self) -> Vec<AgentGame> {
        PlayerId::BOTH
            .iter()
            .map(|&seat| {
                let metrics = &self.metrics[seat.index()];
                AgentGame {
                    agent: self.name(seat).to_string(),
                    won: self.outcome.winner == seat,
                    led_first: self.leader == seat,
                    signed_points: self.outcome.signed_points(seat),
                    decisions: metrics.decisions,
                    total_ms: metrics.total_ms,
                }
            })
            .collect()
    }

    fn log_row(&self, run_id: &str) -> GameLogRow {
        GameLogRow {
            run_id: run_id.to_string(),
            game_index: self.game_index,
            game_seed: self.game_seed,
            leader: self.name(self.leader).to_string(),
            winner: self.name(self.outcome.winner).to_string(),
            game_points: self.outcome.game_points,
            reason: self.outcome.reason,
            moves: self.moves,
            seats: PlayerId::BOTH
                .iter()
                .map(|&seat| {
                    let metrics = &self.metrics[seat.index()];
                    SeatLog {
                        agent: self.name(seat).to_string(),
                        seat: seat.to_string(),
                        score: self.outcome.score(seat),
                        decisions: metrics.decisions,
                        speed_ms_turn: metrics.avg_ms_per_decision,
                    }
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_index: usize,
    game_seed: u64,
    leader: String,
    winner: String,
    game_points: u8,
    reason: EndReason,
    moves: usize,
    seats: Vec<SeatLog>,
}

#[derive(Serialize)]
struct SeatLog {
    agent: String,
    seat: String,
    score: u32,
    decisions: u32,
    speed_ms_turn: f64,
}

struct SeatState {
    view: InformationSet,
    rng: StdRng,
    metrics: DecisionMetrics,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(&self) -> DecisionSummary {
        let total_ms = self.total.as_secs_f64() * 1000.0;
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            total_ms / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms,
        }
    }
}

#[derive(Clone)]
struct DecisionSummary {
    decisions: u32,
    avg_ms_per_decision: f64,
    total_ms: f64,
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("configuration requires exactly 2 agents but found {found}")]
    AgentCount { found: usize },
    #[error("invalid agent '{agent}': {message}")]
    InvalidAgent { agent: String, message: String },
    #[error("agent '{agent}' failed to choose a move: {source}")]
    Agent {
        agent: String,
        #[source]
        source: SearchError,
    },
    #[error("game {game_index} rejected a move: {source}")]
    Game {
        game_index: usize,
        #[source]
        source: GameError,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("summary error: {0}")]
    Summary(#[from] SummaryError),
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Search(SearchParams),
    Heuristic,
}

impl AgentBlueprint {
    fn from_config(config: &AgentConfig) -> Result<Self, RunnerError> {
        let implementation = match config.kind {
            AgentKind::Ismcts => {
                let params = config
                    .search_params()
                    .map_err(|err| RunnerError::InvalidAgent {
                        agent: config.name.clone(),
                        message: err.to_string(),
                    })?;
                AgentImplementation::Search(params)
            }
            AgentKind::Heuristic => AgentImplementation::Heuristic,
        };
        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn_policy(&self) -> Box<dyn Policy> {
        match &self.implementation {
            AgentImplementation::Search(params) => Box::new(Ismcts::new(*params)),
            AgentImplementation::Heuristic => Box::new(HeuristicPolicy::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GamesConfig, LoggingConfig, OutputsConfig};

    fn config(dir: &Path, agents: Vec<AgentConfig>) -> MatchConfig {
        MatchConfig {
            run_id: "unit".to_string(),
            games: GamesConfig {
                seed: Some(9),
                count: 4,
            },
            agents,
            outputs: OutputsConfig {
                jsonl: dir.join("games.jsonl").display().to_string(),
                summary_md: dir.join("summary.md").display().to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }

    fn agent(name: &str, kind: AgentKind, difficulty: &str) -> AgentConfig {
        AgentConfig {
            name: name.to_string(),
            kind,
            difficulty: difficulty.to_string(),
            iterations: Some(20),
            workers: None,
            valuation: None,
        }
    }

    #[test]
    fn rejects_wrong_agent_count() {
        let dir = std::env::temp_dir();
        let cfg = config(&dir, vec![agent("solo", AgentKind::Heuristic, "easy")]);
        let outputs = cfg.resolved_outputs();
        assert!(matches!(
            MatchRunner::new(cfg, outputs),
            Err(RunnerError::AgentCount { found: 1 })
        ));
    }

    #[test]
    fn every_game_is_recorded_for_both_agents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = config(
            dir.path(),
            vec![
                agent("heuristic", AgentKind::Heuristic, "easy"),
                agent("oracle", AgentKind::Ismcts, "cheating"),
            ],
        );
        let outputs = cfg.resolved_outputs();
        let summary = MatchRunner::new(cfg, outputs)
            .expect("runner")
            .run()
            .expect("match completes");

        assert_eq!(summary.games_played, 4);
        assert_eq!(summary.rows_written, 4);
        let wins: usize = summary.report.agents.iter().map(|agent| agent.wins).sum();
        assert_eq!(wins, 4);
        for report in &summary.report.agents {
            assert_eq!(report.games, 4);
            assert_eq!(report.games_leading, 2);
        }

        let rows = fs::read_to_string(&summary.jsonl_path).expect("jsonl");
        let first: serde_json::Value =
            serde_json::from_str(rows.lines().next().expect("one row")).expect("json row");
        assert_eq!(first["leader"], "heuristic");
        assert_eq!(first["seats"][1]["agent"], "oracle");
        assert!(summary.summary_path.exists());
        assert!(summary.telemetry_path.is_none());
    }
}
