//! Information-set Monte Carlo tree search.

mod tree;

pub use tree::{ChildStats, Node, NodeId, SearchTree};

use crate::difficulty::SearchParams;
use crate::policy::{AgentView, Policy, play_out};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use schnapsen_core::game::GameState;
use schnapsen_core::info::{DeterminizeError, Determinizer, InformationSet};
use schnapsen_core::model::moves::Move;
use schnapsen_core::model::player::PlayerId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{Level, event};

#[derive(Debug)]
pub enum SearchError {
    Determinize(DeterminizeError),
    /// The cancellation flag was raised; partial trees were dropped.
    Cancelled,
    NoLegalMoves,
    /// A non-determinizing search was handed a hidden view.
    FullStateRequired,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Determinize(err) => write!(f, "{err}"),
            SearchError::Cancelled => write!(f, "search cancelled"),
            SearchError::NoLegalMoves => write!(f, "no legal move for the player to act"),
            SearchError::FullStateRequired => {
                write!(f, "search without determinization needs the full game state")
            }
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Determinize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeterminizeError> for SearchError {
    fn from(err: DeterminizeError) -> Self {
        SearchError::Determinize(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchWarning {
    /// No iteration completed; the move is a uniformly random legal move.
    ExhaustedBudget,
}

/// Shared flag that stops a running search at the next iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub mv: Move,
    pub player: PlayerId,
    /// Iterations completed across all workers.
    pub iterations: u32,
    /// Merged root statistics, most visited first.
    pub children: Vec<ChildStats>,
    pub warnings: Vec<SearchWarning>,
    pub reused_visits: u32,
}

impl Decision {
    /// One line per root child, most visited first.
    pub fn summary(&self) -> String {
        self.children
            .iter()
            .map(|child| {
                format!(
                    "[M:{:<14} R/V/A: {:.3} / {:6} / {:6}]",
                    child.mv.to_string(),
                    child.mean_reward,
                    child.visits,
                    child.avails
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Where each iteration's full state comes from.
enum Root<'a> {
    Sampled(Cow<'a, InformationSet>),
    Exact(&'a GameState),
}

impl Root<'_> {
    fn state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GameState, DeterminizeError> {
        match self {
            Root::Sampled(info) => Determinizer::determinize(info, rng),
            Root::Exact(state) => Ok((*state).clone()),
        }
    }
}

struct RetainedTree {
    history: Vec<Move>,
    tree: SearchTree,
}

/// Search engine for one seat. Keep it across a game to reuse trees.
pub struct Ismcts {
    params: SearchParams,
    cancel: CancelToken,
    retained: Option<RetainedTree>,
}

impl Ismcts {
    pub fn new(params: SearchParams) -> Self {
        Self {
            params,
            cancel: CancelToken::new(),
            retained: None,
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn decide<R: RngCore + ?Sized>(
        &mut self,
        view: AgentView<'_>,
        rng: &mut R,
    ) -> Result<Decision, SearchError> {
        let started = Instant::now();
        let player = view.to_move();
        let legal = view.legal_moves();
        if legal.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }
        if let [only] = legal.as_slice() {
            return Ok(Decision {
                mv: *only,
                player,
                iterations: 0,
                children: Vec::new(),
                warnings: Vec::new(),
                reused_visits: 0,
            });
        }

        let root = match (view, self.params.determinize) {
            (AgentView::Hidden(info), true) => Root::Sampled(Cow::Borrowed(info)),
            (AgentView::Full(state), true) => {
                Root::Sampled(Cow::Owned(InformationSet::from_state(state, player)))
            }
            (AgentView::Full(state), false) => Root::Exact(state),
            (AgentView::Hidden(_), false) => return Err(SearchError::FullStateRequired),
        };

        let history = view.public().history();
        let workers = self.params.workers.max(1);
        let reuse = self.params.reuse_tree && workers == 1;
        let seeded_tree = if reuse { self.take_retained(history) } else { None };
        let reused_visits = seeded_tree
            .as_ref()
            .map(|tree| tree.node(SearchTree::ROOT).visits)
            .unwrap_or(0);

        let jobs: Vec<(u64, u32, SearchTree)> = (0..workers)
            .map(|index| {
                let budget = share(self.params.iterations, workers, index);
                (rng.next_u64(), budget, SearchTree::new())
            })
            .collect();
        let jobs = match seeded_tree {
            Some(tree) => vec![(jobs[0].0, jobs[0].1, tree)],
            None => jobs,
        };

        let params = &self.params;
        let cancel = &self.cancel;
        let root = &root;
        let results: Vec<Result<(SearchTree, u32), SearchError>> = if jobs.len() == 1 {
            jobs.into_iter()
                .map(|(seed, budget, tree)| run_worker(root, tree, budget, seed, params, cancel))
                .collect()
        } else {
            jobs.into_par_iter()
                .map(|(seed, budget, tree)| run_worker(root, tree, budget, seed, params, cancel))
                .collect()
        };

        let mut trees = Vec::with_capacity(results.len());
        let mut iterations = 0;
        for result in results {
            let (tree, completed) = result?;
            iterations += completed;
            trees.push(tree);
        }

        let children = merge_root_stats(&trees);
        let mut warnings = Vec::new();
        let mv = match best_child(&children) {
            Some(mv) if iterations > 0 => mv,
            _ => {
                warnings.push(SearchWarning::ExhaustedBudget);
                event!(
                    target: "schnapsen_bot::search",
                    Level::WARN,
                    player = %player,
                    budget = self.params.iterations,
                    "search budget exhausted before any iteration; playing a random legal move"
                );
                *legal.choose(rng).ok_or(SearchError::NoLegalMoves)?
            }
        };

        if reuse {
            if let Some(tree) = trees.pop() {
                self.retained = Some(RetainedTree {
                    history: history.to_vec(),
                    tree,
                });
            }
        }

        event!(
            target: "schnapsen_bot::search",
            Level::DEBUG,
            player = %player,
            iterations,
            workers,
            reused_visits,
            legal_count = legal.len(),
            chosen = %mv,
            elapsed_ms = started.elapsed().as_millis() as u64,
        );

        Ok(Decision {
            mv,
            player,
            iterations,
            children,
            warnings,
            reused_visits,
        })
    }

    /// Drops any retained tree, e.g. at the start of a new game.
    pub fn reset(&mut self) {
        self.retained = None;
    }

    fn take_retained(&mut self, history: &[Move]) -> Option<SearchTree> {
        let retained = self.retained.take()?;
        let suffix = history.strip_prefix(retained.history.as_slice())?;
        retained.tree.reroot(suffix)
    }
}

impl Policy for Ismcts {
    fn choose_move(&mut self, view: AgentView<'_>, rng: &mut StdRng) -> Result<Move, SearchError> {
        self.decide(view, rng).map(|decision| decision.mv)
    }

    fn needs_full_state(&self) -> bool {
        !self.params.determinize
    }

    fn reset(&mut self) {
        Ismcts::reset(self);
    }
}

/// Iterations for worker `index` when `total` is split across `workers`.
fn share(total: u32, workers: usize, index: usize) -> u32 {
    let workers = workers as u32;
    let index = index as u32;
    total / workers + u32::from(index < total % workers)
}

fn run_worker(
    root: &Root<'_>,
    mut tree: SearchTree,
    budget: u32,
    seed: u64,
    params: &SearchParams,
    cancel: &CancelToken,
) -> Result<(SearchTree, u32), SearchError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut completed = 0;
    for _ in 0..budget {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        let state = root.state(&mut rng)?;
        iterate(&mut tree, state, params, &mut rng);
        completed += 1;
    }
    Ok((tree, completed))
}

/// One determinize-select-expand-simulate-backpropagate pass.
fn iterate<R: Rng + ?Sized>(
    tree: &mut SearchTree,
    mut state: GameState,
    params: &SearchParams,
    rng: &mut R,
) {
    let mut node = SearchTree::ROOT;
    loop {
        let legal = state.legal_moves();
        if legal.is_empty() {
            break;
        }
        let untried = tree.untried(node, &legal);
        if let Some(&mv) = untried.choose(rng) {
            let actor = state.to_move();
            state.apply_unchecked(mv);
            node = tree.add_child(node, mv, actor);
            break;
        }
        let Some(child) = tree.select(node, &legal, params.exploration) else {
            break;
        };
        if let Some(mv) = tree.node(child).mv {
            state.apply_unchecked(mv);
        }
        node = child;
    }

    play_out(&mut state, params.rollout, params.max_rollout_plies, rng);
    let outcome = state.outcome().copied();
    let valuation = params.valuation;
    tree.backpropagate(node, |player| match &outcome {
        Some(outcome) => valuation.reward(outcome, player),
        None => valuation.estimate(state.public(), player),
    });
}

fn merge_root_stats(trees: &[SearchTree]) -> Vec<ChildStats> {
    let mut merged: Vec<(ChildStats, f64)> = Vec::new();
    for tree in trees {
        for stats in tree.root_stats() {
            let total = stats.mean_reward * stats.visits as f64;
            match merged.iter_mut().find(|(entry, _)| entry.mv == stats.mv) {
                Some((entry, reward)) => {
                    entry.visits += stats.visits;
                    entry.avails += stats.avails;
                    *reward += total;
                }
                None => merged.push((stats, total)),
            }
        }
    }
    let mut children: Vec<ChildStats> = merged
        .into_iter()
        .map(|(mut stats, reward)| {
            stats.mean_reward = if stats.visits == 0 {
                0.0
            } else {
                reward / stats.visits as f64
            };
            stats
        })
        .collect();
    children.sort_by(|a, b| {
        b.visits
            .cmp(&a.visits)
            .then(b.mean_reward.total_cmp(&a.mean_reward))
    });
    children
}

/// Robust child: most visits, then best mean reward.
fn best_child(children: &[ChildStats]) -> Option<Move> {
    children
        .first()
        .filter(|stats| stats.visits > 0)
        .map(|stats| stats.mv)
}

#[cfg(test)]
mod tests {
    use super::{Ismcts, SearchError, SearchWarning, share};
    use crate::difficulty::{Difficulty, SearchParams};
    use crate::policy::AgentView;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use schnapsen_core::new_game;

    #[test]
    fn budget_split_covers_every_iteration() {
        let shares: Vec<u32> = (0..3).map(|index| share(10, 3, index)).collect();
        assert_eq!(shares, vec![4, 3, 3]);
        assert_eq!(shares.iter().sum::<u32>(), 10);
    }

    #[test]
    fn zero_budget_falls_back_to_a_legal_move() {
        let (state, views) = new_game(12);
        let params = SearchParams::for_difficulty(Difficulty::Easy).with_iterations(0);
        let mut engine = Ismcts::new(params);
        let mut rng = StdRng::seed_from_u64(1);
        let decision = engine
            .decide(AgentView::Hidden(&views[0]), &mut rng)
            .unwrap();
        assert_eq!(decision.iterations, 0);
        assert_eq!(decision.warnings, vec![SearchWarning::ExhaustedBudget]);
        assert!(state.legal_moves().contains(&decision.mv));
    }

    #[test]
    fn cheating_needs_the_full_state() {
        let (state, views) = new_game(3);
        let mut engine = Ismcts::new(Difficulty::Cheating.params().with_iterations(20));
        let mut rng = StdRng::seed_from_u64(4);
        assert!(matches!(
            engine.decide(AgentView::Hidden(&views[0]), &mut rng),
            Err(SearchError::FullStateRequired)
        ));
        let decision = engine.decide(AgentView::Full(&state), &mut rng).unwrap();
        assert_eq!(decision.iterations, 20);
        assert!(state.legal_moves().contains(&decision.mv));
    }

    #[test]
    fn cancelled_search_reports_cancellation() {
        let (_, views) = new_game(6);
        let mut engine = Ismcts::new(Difficulty::Easy.params());
        engine.cancel_token().cancel();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(
            engine.decide(AgentView::Hidden(&views[0]), &mut rng),
            Err(SearchError::Cancelled)
        ));
    }

    #[test]
    fn same_seed_same_decision() {
        let (_, views) = new_game(30);
        let params = Difficulty::Easy.params().with_workers(2);
        let run = |seed| {
            let mut engine = Ismcts::new(params);
            let mut rng = StdRng::seed_from_u64(seed);
            let decision = engine.decide(AgentView::Hidden(&views[0]), &mut rng).unwrap();
            (decision.mv, decision.children.iter().map(|c| c.visits).collect::<Vec<_>>())
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn visits_add_up_to_the_budget() {
        let (_, views) = new_game(41);
        let mut engine = Ismcts::new(Difficulty::Easy.params());
        let mut rng = StdRng::seed_from_u64(7);
        let decision = engine.decide(AgentView::Hidden(&views[0]), &mut rng).unwrap();
        assert_eq!(decision.iterations, 100);
        let visits: u32 = decision.children.iter().map(|child| child.visits).sum();
        assert_eq!(visits, 100);
        assert!(decision.summary().lines().count() == decision.children.len());
    }
}
