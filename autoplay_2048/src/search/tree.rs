use log::trace;
use rayon::prelude::*;

use crate::board::{Board, Direction};
use crate::error::Result;
use crate::heuristic::Heuristic;
use crate::moves::apply_move;
use crate::random::{insert_random_tile, RandomStream, SplitSource, TileSource};

use super::SearchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode<const N: usize> {
    pub board: Board<N>,
    pub score: u64,
    pub depth: usize,
    pub heuristic: f64,
    // Indexed by direction.
    pub children: [Option<NodeId>; 4],
}

impl<const N: usize> SearchNode<N> {
    fn new(board: Board<N>, score: u64, depth: usize, heuristic: &Heuristic) -> Self {
        Self {
            heuristic: heuristic.evaluate(&board),
            board,
            score,
            depth,
            children: [None; 4],
        }
    }

    pub fn child(&self, direction: Direction) -> Option<NodeId> {
        self.children[direction.index()]
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

// Node 0 is the root.
#[derive(Debug, Clone)]
pub struct SearchTree<const N: usize> {
    nodes: Vec<SearchNode<N>>,
}

impl<const N: usize> SearchTree<N> {
    pub fn build<S: TileSource + ?Sized>(
        board: &Board<N>,
        score: u64,
        config: &SearchConfig,
        source: &mut S,
    ) -> Result<Self> {
        let heuristic = config.heuristic();
        let mut nodes = vec![SearchNode::new(*board, score, 0, &heuristic)];
        grow(&mut nodes, config.max_depth, &heuristic, source)?;
        trace!("built search tree: {} nodes, depth {}", nodes.len(), config.max_depth);
        Ok(Self { nodes })
    }

    // Worst-case draws match a sequential build.
    pub fn build_par<S: SplitSource>(
        board: &Board<N>,
        score: u64,
        config: &SearchConfig,
        source: &mut S,
    ) -> Result<Self> {
        let heuristic = config.heuristic();
        let mut nodes = vec![SearchNode::new(*board, score, 0, &heuristic)];
        if config.max_depth == 0 {
            return Ok(Self { nodes });
        }

        let per_branch = RandomStream::draws_per_search(config.max_depth - 1);
        let branches = source
            .split(Direction::ALL.len(), per_branch)?
            .into_par_iter()
            .zip(Direction::ALL.into_par_iter())
            .map(|(mut src, direction)| -> Result<Option<Vec<SearchNode<N>>>> {
                let Some(child) = expand(board, score, direction, 1, &heuristic, &mut src)? else {
                    return Ok(None);
                };
                let mut branch = vec![child];
                grow(&mut branch, config.max_depth, &heuristic, &mut src)?;
                Ok(Some(branch))
            })
            .collect::<Result<Vec<_>>>()?;

        for (direction, branch) in Direction::ALL.into_iter().zip(branches) {
            let Some(branch) = branch else { continue };
            let offset = nodes.len();
            nodes[0].children[direction.index()] = Some(NodeId(offset));
            nodes.extend(branch.into_iter().map(|mut node| {
                for child in node.children.iter_mut().flatten() {
                    child.0 += offset;
                }
                node
            }));
        }
        trace!("built search tree in parallel: {} nodes, depth {}", nodes.len(), config.max_depth);
        Ok(Self { nodes })
    }

    pub fn root(&self) -> &SearchNode<N> {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &SearchNode<N> {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[SearchNode<N>] {
        &self.nodes
    }

    pub fn tree_size(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn dfs(&self, from: NodeId) -> Dfs<'_, N> {
        Dfs {
            tree: self,
            stack: vec![from],
        }
    }

    pub fn subtree_size(&self, from: NodeId) -> usize {
        self.dfs(from).count()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

pub struct Dfs<'a, const N: usize> {
    tree: &'a SearchTree<N>,
    stack: Vec<NodeId>,
}

impl<'a, const N: usize> Iterator for Dfs<'a, N> {
    type Item = &'a SearchNode<N>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.node(self.stack.pop()?);
        self.stack.extend(node.children.iter().rev().flatten());
        Some(node)
    }
}

fn expand<const N: usize, S: TileSource + ?Sized>(
    board: &Board<N>,
    score: u64,
    direction: Direction,
    depth: usize,
    heuristic: &Heuristic,
    source: &mut S,
) -> Result<Option<SearchNode<N>>> {
    let outcome = apply_move(board, direction);
    if !outcome.valid {
        return Ok(None);
    }
    let (board, _) = insert_random_tile(&outcome.board, source)?;
    Ok(Some(SearchNode::new(
        board,
        outcome.new_score(score),
        depth,
        heuristic,
    )))
}

// Expands `nodes[0]` and everything under it, using an explicit stack.
fn grow<const N: usize, S: TileSource + ?Sized>(
    nodes: &mut Vec<SearchNode<N>>,
    max_depth: usize,
    heuristic: &Heuristic,
    source: &mut S,
) -> Result<()> {
    let mut stack = vec![0];
    while let Some(id) = stack.pop() {
        let SearchNode {
            board,
            score,
            depth,
            ..
        } = nodes[id];
        if depth >= max_depth {
            continue;
        }

        let mut children = [None; 4];
        for direction in Direction::ALL {
            if let Some(child) = expand(&board, score, direction, depth + 1, heuristic, source)? {
                children[direction.index()] = Some(NodeId(nodes.len()));
                nodes.push(child);
            }
        }
        nodes[id].children = children;
        stack.extend(children.iter().rev().flatten().map(|c| c.0));
    }
    Ok(())
}
