use serde::{Deserialize, Serialize};

use crate::board::{Board, Direction};
use crate::error::Result;
use crate::heuristic::{Heuristic, HeuristicKind};
use crate::random::{SplitSource, TileSource};

mod select;
mod tree;

pub use select::{branch_metrics, pick_direction, select_best_move, BranchMetric};
pub use tree::{Dfs, NodeId, SearchNode, SearchTree};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopSelection {
    Fraction(f64),
    Count(usize),
}

impl TopSelection {
    pub fn capacity(&self, tree_size: usize) -> usize {
        let raw = match *self {
            TopSelection::Fraction(f) => (tree_size as f64 * f).floor().max(0.0) as usize,
            TopSelection::Count(n) => n,
        };
        raw.max(1)
    }
}

impl Default for TopSelection {
    fn default() -> Self {
        TopSelection::Fraction(0.05)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_depth: usize,
    pub top: TopSelection,
    pub heuristic: HeuristicKind,
    pub base: f64,
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            top: TopSelection::default(),
            heuristic: HeuristicKind::default(),
            base: 2.0,
            parallel: false,
        }
    }
}

impl SearchConfig {
    pub fn heuristic(&self) -> Heuristic {
        Heuristic::new(self.heuristic, self.base)
    }

    // A recommendation needs the root's four children.
    pub fn effective_depth(&self) -> usize {
        self.max_depth.max(1)
    }

    fn for_recommendation(&self) -> SearchConfig {
        SearchConfig {
            max_depth: self.effective_depth(),
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub direction: Direction,
    pub metrics: [BranchMetric; 4],
    pub tree_size: usize,
}

impl Recommendation {
    pub fn from_tree<const N: usize>(tree: &SearchTree<N>, config: &SearchConfig) -> Self {
        let metrics = branch_metrics(tree, config);
        Self {
            direction: pick_direction(&metrics),
            metrics,
            tree_size: tree.tree_size(),
        }
    }
}

pub fn recommend<const N: usize, S: TileSource + ?Sized>(
    board: &Board<N>,
    score: u64,
    config: &SearchConfig,
    source: &mut S,
) -> Result<Recommendation> {
    let config = config.for_recommendation();
    let tree = SearchTree::build(board, score, &config, source)?;
    Ok(Recommendation::from_tree(&tree, &config))
}

pub fn recommend_par<const N: usize, S: SplitSource>(
    board: &Board<N>,
    score: u64,
    config: &SearchConfig,
    source: &mut S,
) -> Result<Recommendation> {
    let config = config.for_recommendation();
    let tree = SearchTree::build_par(board, score, &config, source)?;
    Ok(Recommendation::from_tree(&tree, &config))
}

pub fn recommend_move<const N: usize, S: TileSource + ?Sized>(
    board: &Board<N>,
    score: u64,
    config: &SearchConfig,
    source: &mut S,
) -> Result<Direction> {
    Ok(recommend(board, score, config, source)?.direction)
}
