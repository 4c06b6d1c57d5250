use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicKind {
    EmptyTiles,
    CornerWeightedChain,
    AnyCornerChain,
    #[default]
    CornerAlignedChains,
}

impl FromStr for HeuristicKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty-tiles" | "empty" | "0" => Ok(HeuristicKind::EmptyTiles),
            "corner-weighted-chain" | "weighted" | "1" => Ok(HeuristicKind::CornerWeightedChain),
            "any-corner-chain" | "chain" | "2" => Ok(HeuristicKind::AnyCornerChain),
            "corner-aligned-chains" | "aligned" | "3" => Ok(HeuristicKind::CornerAlignedChains),
            other => Err(EngineError::Parse(format!("unknown heuristic {other:?}"))),
        }
    }
}

const EMPTY_TILE_REWARD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heuristic {
    pub kind: HeuristicKind,
    pub base: f64,
}

impl Heuristic {
    pub fn new(kind: HeuristicKind, base: f64) -> Self {
        Self { kind, base }
    }

    pub fn evaluate<const N: usize>(&self, board: &Board<N>) -> f64 {
        match self.kind {
            HeuristicKind::EmptyTiles => board.count_empty() as f64 * EMPTY_TILE_REWARD,
            HeuristicKind::CornerWeightedChain => corner_weighted_chain(board, self.base),
            HeuristicKind::AnyCornerChain => any_corner_chain(board, self.base),
            HeuristicKind::CornerAlignedChains => corner_aligned_chains(board, self.base),
        }
    }
}

// Corners holding a maximal tile.
fn anchored_corners<const N: usize>(board: &Board<N>) -> Vec<(usize, usize)> {
    board
        .max_positions()
        .into_iter()
        .filter(|&(row, col)| Board::<N>::is_corner(row, col))
        .collect()
}

// At most 2N + 1 cells, along the column first when `vertical`.
pub fn snake_path<const N: usize>(
    corner: (usize, usize),
    vertical: bool,
) -> impl Iterator<Item = (usize, usize)> {
    let len = (2 * N + 1).min(N * N);
    (0..len).map(move |k| {
        let lane = k / N;
        let within = k % N;
        let along = if lane % 2 == 0 { within } else { N - 1 - within };
        let (dr, dc) = if vertical { (along, lane) } else { (lane, along) };
        let row = if corner.0 == 0 { dr } else { N - 1 - dr };
        let col = if corner.1 == 0 { dc } else { N - 1 - dc };
        (row, col)
    })
}

fn corner_snakes<const N: usize>(
    board: &Board<N>,
) -> impl Iterator<Item = impl Iterator<Item = (usize, usize)>> {
    anchored_corners(board)
        .into_iter()
        .flat_map(|corner| [true, false].map(move |vertical| snake_path::<N>(corner, vertical)))
}

fn corner_weighted_chain<const N: usize>(board: &Board<N>, base: f64) -> f64 {
    let top = (2 * N + 2) as i32;
    corner_snakes(board)
        .map(|path| {
            let mut prev = u32::MAX;
            let mut metric = 0.0;
            for (k, (row, col)) in path.enumerate() {
                let v = board.value(row, col);
                if v == 0 || v > prev {
                    break;
                }
                metric += f64::from(v) * base.powi(top - k as i32);
                prev = v;
            }
            metric
        })
        .fold(0.0, f64::max)
}

fn corner_aligned_chains<const N: usize>(board: &Board<N>, base: f64) -> f64 {
    let top = (2 * N) as i32;
    corner_snakes(board)
        .map(|path| {
            path.enumerate()
                .map(|(k, (row, col))| f64::from(board.value(row, col)) * base.powi(top - k as i32))
                .sum::<f64>()
        })
        .fold(0.0, f64::max)
}

// Top-row cells look Left, Down, Right; every other cell looks Up, Right,
// Down, Left. The first of equal neighbours wins.
fn neighbours<const N: usize>((row, col): (usize, usize)) -> impl Iterator<Item = (usize, usize)> {
    let up = row.checked_sub(1).map(|r| (r, col));
    let left = col.checked_sub(1).map(|c| (row, c));
    let right = Some((row, col + 1));
    let down = Some((row + 1, col));
    let order = if row == 0 {
        [left, down, right, None]
    } else {
        [up, right, down, left]
    };
    order.into_iter().flatten().filter(|&(r, c)| r < N && c < N)
}

fn any_corner_chain<const N: usize>(board: &Board<N>, base: f64) -> f64 {
    let empty = board.count_empty() as f64;
    board
        .max_positions()
        .into_iter()
        .map(|start| {
            let mut chain = vec![start];
            let mut cur = start;
            for _ in 1..2 * N {
                let cur_val = board.value(cur.0, cur.1);
                let next = neighbours::<N>(cur)
                    .filter(|p| !chain.contains(p))
                    .map(|p| (p, board.value(p.0, p.1)))
                    .filter(|&(_, v)| v != 0 && v <= cur_val)
                    .fold(None, |best: Option<((usize, usize), u32)>, cand| match best {
                        Some((_, bv)) if bv >= cand.1 => best,
                        _ => Some(cand),
                    });
                match next {
                    Some((p, _)) => {
                        chain.push(p);
                        cur = p;
                    }
                    None => break,
                }
            }

            let weighted: f64 = chain
                .iter()
                .enumerate()
                .map(|(k, &(r, c))| f64::from(board.value(r, c)) * (2 * N - k) as f64)
                .sum();

            let head = &chain[..chain.len().min(N)];
            let in_corner = Board::<N>::is_corner(start.0, start.1);
            let aligned =
                head.iter().all(|p| p.0 == start.0) || head.iter().all(|p| p.1 == start.1);

            let mut metric = weighted;
            if in_corner {
                metric *= base;
                if aligned {
                    metric *= base;
                }
            }
            metric * empty
        })
        .fold(0.0, f64::max)
}
