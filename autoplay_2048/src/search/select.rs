use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use log::debug;
use serde::Serialize;

use crate::board::Direction;

use super::tree::{NodeId, SearchTree};
use super::SearchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchMetric {
    Invalid,
    DislodgesAnchor,
    Value(f64),
}

impl BranchMetric {
    pub const INVALID_SCORE: f64 = -2.0;
    pub const DISLODGES_ANCHOR_SCORE: f64 = -1.0;

    pub fn score(self) -> f64 {
        match self {
            BranchMetric::Invalid => Self::INVALID_SCORE,
            BranchMetric::DislodgesAnchor => Self::DISLODGES_ANCHOR_SCORE,
            BranchMetric::Value(v) => v,
        }
    }
}

// f64 with a total order so it can sit in a heap.
#[derive(Debug, Clone, Copy)]
struct Sample(f64);

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Sample {}

impl PartialOrd for Sample {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sample {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// Missing samples count as zero.
fn top_average(values: impl Iterator<Item = f64>, capacity: usize) -> f64 {
    let capacity = capacity.max(1);
    let mut heap: BinaryHeap<Reverse<Sample>> = BinaryHeap::with_capacity(capacity + 1);
    for v in values {
        if heap.len() < capacity {
            heap.push(Reverse(Sample(v)));
        } else if heap.peek().is_some_and(|Reverse(min)| v > min.0) {
            heap.pop();
            heap.push(Reverse(Sample(v)));
        }
    }
    heap.iter().map(|Reverse(s)| s.0).sum::<f64>() / capacity as f64
}

pub fn branch_metrics<const N: usize>(
    tree: &SearchTree<N>,
    config: &SearchConfig,
) -> [BranchMetric; 4] {
    let root = tree.root();
    let capacity = config.top.capacity(tree.tree_size());

    Direction::ALL.map(|direction| {
        let Some(id) = root.child(direction) else {
            return BranchMetric::Invalid;
        };
        if root.heuristic > 0.0 && tree.node(id).heuristic == 0.0 {
            return BranchMetric::DislodgesAnchor;
        }
        BranchMetric::Value(subtree_top_average(tree, id, capacity))
    })
}

fn subtree_top_average<const N: usize>(tree: &SearchTree<N>, id: NodeId, capacity: usize) -> f64 {
    top_average(tree.dfs(id).map(|node| node.heuristic), capacity)
}

// Ties go to the lowest index.
pub fn pick_direction(metrics: &[BranchMetric; 4]) -> Direction {
    let scores = metrics.map(BranchMetric::score);
    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = i;
        }
    }

    let ties = scores.iter().filter(|s| **s == scores[best]).count();
    if ties > 1 && scores[best] > 0.0 {
        debug!(
            "{ties} moves tie at {}: {scores:?}, taking {}",
            scores[best],
            Direction::ALL[best]
        );
    }
    Direction::ALL[best]
}

pub fn select_best_move<const N: usize>(tree: &SearchTree<N>, config: &SearchConfig) -> Direction {
    pick_direction(&branch_metrics(tree, config))
}
