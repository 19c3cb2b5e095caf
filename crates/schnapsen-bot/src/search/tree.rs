//! Arena-backed information-set search tree.
//!
//! A node stands for a public move sequence from the root, so statistics
//! gathered under different determinizations land on the same node.

use schnapsen_core::model::moves::Move;
use schnapsen_core::model::player::PlayerId;
use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    /// Move leading here; `None` at the root.
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    pub player_just_moved: Option<PlayerId>,
    pub children: Vec<NodeId>,
    pub visits: u32,
    /// Times this node was selectable from its parent.
    pub avails: u32,
    /// Summed reward for `player_just_moved`.
    pub reward: f64,
    /// Hash of the move sequence since the tree was first created.
    pub signature: u64,
}

impl Node {
    fn root(signature: u64) -> Self {
        Self {
            mv: None,
            parent: None,
            player_just_moved: None,
            children: Vec::new(),
            visits: 0,
            avails: 1,
            reward: 0.0,
            signature,
        }
    }

    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward / self.visits as f64
        }
    }
}

/// Root-child summary reported with a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildStats {
    pub mv: Move,
    pub visits: u32,
    pub avails: u32,
    pub mean_reward: f64,
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root(0)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn child_by_move(&self, id: NodeId, mv: Move) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[*child].mv == Some(mv))
    }

    /// Legal moves that have no child under `id` yet.
    pub fn untried(&self, id: NodeId, legal: &[Move]) -> Vec<Move> {
        legal
            .iter()
            .copied()
            .filter(|mv| self.child_by_move(id, *mv).is_none())
            .collect()
    }

    /// UCB1 over the children whose move is legal in the current sample.
    /// Every such child counts one more availability.
    pub fn select(&mut self, id: NodeId, legal: &[Move], exploration: f64) -> Option<NodeId> {
        let candidates: Vec<NodeId> = self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|child| self.nodes[*child].mv.is_some_and(|mv| legal.contains(&mv)))
            .collect();
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &candidates {
            let value = self.ucb(child, exploration);
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((child, value));
            }
        }
        for child in candidates {
            self.nodes[child].avails += 1;
        }
        best.map(|(child, _)| child)
    }

    fn ucb(&self, id: NodeId, exploration: f64) -> f64 {
        let node = &self.nodes[id];
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let visits = node.visits as f64;
        node.reward / visits + exploration * ((node.avails as f64).ln() / visits).sqrt()
    }

    pub fn add_child(&mut self, parent: NodeId, mv: Move, player: PlayerId) -> NodeId {
        let mut hasher = DefaultHasher::new();
        self.nodes[parent].signature.hash(&mut hasher);
        mv.hash(&mut hasher);
        let id = self.nodes.len();
        self.nodes.push(Node {
            mv: Some(mv),
            parent: Some(parent),
            player_just_moved: Some(player),
            children: Vec::new(),
            visits: 0,
            avails: 1,
            reward: 0.0,
            signature: hasher.finish(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Adds one visit to every node from `leaf` to the root, crediting each
    /// with the reward of the player who moved into it.
    pub fn backpropagate<F>(&mut self, leaf: NodeId, reward_for: F)
    where
        F: Fn(PlayerId) -> f64,
    {
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let node = &mut self.nodes[id];
            node.visits += 1;
            if let Some(player) = node.player_just_moved {
                node.reward += reward_for(player);
            }
            cursor = node.parent;
        }
    }

    pub fn root_stats(&self) -> Vec<ChildStats> {
        self.nodes[Self::ROOT]
            .children
            .iter()
            .filter_map(|child| {
                let node = &self.nodes[*child];
                node.mv.map(|mv| ChildStats {
                    mv,
                    visits: node.visits,
                    avails: node.avails,
                    mean_reward: node.mean_reward(),
                })
            })
            .collect()
    }

    /// Follows `moves` from the root and returns the subtree found there as
    /// a fresh tree, or `None` if the path was never expanded.
    pub fn reroot(&self, moves: &[Move]) -> Option<SearchTree> {
        let mut id = Self::ROOT;
        for mv in moves {
            id = self.child_by_move(id, *mv)?;
        }
        if id == Self::ROOT {
            return Some(self.clone());
        }

        let old_root = &self.nodes[id];
        let mut root = Node::root(old_root.signature);
        root.visits = old_root.visits;
        let mut tree = SearchTree { nodes: vec![root] };
        let mut queue: VecDeque<(NodeId, NodeId)> = VecDeque::from([(id, Self::ROOT)]);
        while let Some((old, new)) = queue.pop_front() {
            for &child in &self.nodes[old].children {
                let source = &self.nodes[child];
                let copied = tree.nodes.len();
                tree.nodes.push(Node {
                    parent: Some(new),
                    children: Vec::new(),
                    ..source.clone()
                });
                tree.nodes[new].children.push(copied);
                queue.push_back((child, copied));
            }
        }
        Some(tree)
    }

    /// Indented dump of the tree down to `max_depth`, children by visits.
    pub fn render(&self, max_depth: usize) -> String {
        let mut out = String::new();
        self.render_node(Self::ROOT, 0, max_depth, &mut out);
        out
    }

    fn render_node(&self, id: NodeId, depth: usize, max_depth: usize, out: &mut String) {
        let node = &self.nodes[id];
        let label = node
            .mv
            .map(|mv| mv.to_string())
            .unwrap_or_else(|| "root".to_string());
        let _ = writeln!(
            out,
            "{}[{label:<12} R/V/A: {:.3} / {:6} / {:6}]",
            "| ".repeat(depth),
            node.mean_reward(),
            node.visits,
            node.avails,
        );
        if depth >= max_depth {
            return;
        }
        let mut children = node.children.clone();
        children.sort_by(|a, b| self.nodes[*b].visits.cmp(&self.nodes[*a].visits));
        for child in children {
            self.render_node(child, depth + 1, max_depth, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SearchTree;
    use schnapsen_core::model::card::Card;
    use schnapsen_core::model::moves::Move;
    use schnapsen_core::model::player::PlayerId;
    use schnapsen_core::model::rank::Rank;
    use schnapsen_core::model::suit::Suit;

    fn play(rank: Rank, suit: Suit) -> Move {
        Move::PlayCard(Card::new(rank, suit))
    }

    #[test]
    fn selection_only_considers_legal_children() {
        let mut tree = SearchTree::new();
        let a = tree.add_child(SearchTree::ROOT, play(Rank::Ace, Suit::Clubs), PlayerId::One);
        let b = tree.add_child(SearchTree::ROOT, play(Rank::Ten, Suit::Clubs), PlayerId::One);
        tree.backpropagate(a, |_| 1.0);
        tree.backpropagate(b, |_| 0.0);

        let legal = [play(Rank::Ten, Suit::Clubs)];
        assert_eq!(tree.select(SearchTree::ROOT, &legal, 0.7), Some(b));
        assert_eq!(tree.node(a).avails, 1);
        assert_eq!(tree.node(b).avails, 2);
        assert_eq!(tree.untried(SearchTree::ROOT, &[play(Rank::King, Suit::Clubs)]).len(), 1);
    }

    #[test]
    fn backpropagation_credits_the_mover() {
        let mut tree = SearchTree::new();
        let mine = tree.add_child(SearchTree::ROOT, play(Rank::Ace, Suit::Clubs), PlayerId::One);
        let theirs = tree.add_child(mine, play(Rank::Jack, Suit::Clubs), PlayerId::Two);
        tree.backpropagate(theirs, |player| if player == PlayerId::One { 1.0 } else { 0.0 });
        assert_eq!(tree.node(SearchTree::ROOT).visits, 1);
        assert_eq!(tree.node(mine).reward, 1.0);
        assert_eq!(tree.node(theirs).reward, 0.0);
    }

    #[test]
    fn reroot_keeps_the_matching_subtree() {
        let mut tree = SearchTree::new();
        let first = play(Rank::Ace, Suit::Clubs);
        let reply = play(Rank::Jack, Suit::Clubs);
        let a = tree.add_child(SearchTree::ROOT, first, PlayerId::One);
        let b = tree.add_child(a, reply, PlayerId::Two);
        let c = tree.add_child(b, play(Rank::Ten, Suit::Spades), PlayerId::Two);
        tree.backpropagate(c, |_| 0.5);
        tree.add_child(SearchTree::ROOT, play(Rank::Ten, Suit::Clubs), PlayerId::One);

        let reused = tree.reroot(&[first, reply]).expect("path exists");
        assert_eq!(reused.len(), 2);
        assert_eq!(reused.node(SearchTree::ROOT).visits, 1);
        assert_eq!(reused.node(SearchTree::ROOT).signature, tree.node(b).signature);
        let stats = reused.root_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].visits, 1);
        assert!(tree.reroot(&[reply]).is_none());
    }

    #[test]
    fn render_lists_root_children() {
        let mut tree = SearchTree::new();
        let a = tree.add_child(SearchTree::ROOT, Move::CloseTalon, PlayerId::One);
        tree.backpropagate(a, |_| 1.0);
        let dump = tree.render(1);
        assert!(dump.starts_with("[root"));
        assert!(dump.contains("| [close"));
    }
}
