use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, StandardUniform};

use crate::board::{Board, Tile};
use crate::error::{EngineError, Result};

pub const TWO_PROBABILITY: f64 = 0.9;

pub trait TileSource {
    fn pick_index(&mut self, len: usize) -> Result<usize>;

    fn pick_tile(&mut self) -> Result<Tile>;
}

// Hands out one source per worker, each good for `draws_each` values.
pub trait SplitSource: TileSource + Send + Sized {
    fn split(&mut self, n: usize, draws_each: usize) -> Result<Vec<Self>>;
}

impl<S: TileSource + ?Sized> TileSource for &mut S {
    fn pick_index(&mut self, len: usize) -> Result<usize> {
        (**self).pick_index(len)
    }

    fn pick_tile(&mut self) -> Result<Tile> {
        (**self).pick_tile()
    }
}

impl Distribution<Tile> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Tile {
        if rng.random_bool(TWO_PROBABILITY) {
            Tile::TWO
        } else {
            Tile::FOUR
        }
    }
}

pub fn entropy_seed() -> Result<u64> {
    Ok(getrandom::u64()?)
}

#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl RngSource<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Result<Self> {
        Ok(Self::from_seed(entropy_seed()?))
    }
}

impl<R: Rng> TileSource for RngSource<R> {
    fn pick_index(&mut self, len: usize) -> Result<usize> {
        Ok(self.rng.random_range(0..len))
    }

    fn pick_tile(&mut self) -> Result<Tile> {
        Ok(self.rng.sample(StandardUniform))
    }
}

impl<R: Rng + SeedableRng + Send> SplitSource for RngSource<R> {
    fn split(&mut self, n: usize, _draws_each: usize) -> Result<Vec<Self>> {
        Ok((0..n)
            .map(|_| RngSource::new(R::from_rng(&mut self.rng)))
            .collect())
    }
}

// Two values per inserted tile: the cell, then the value.
#[derive(Debug, Clone)]
pub struct RandomStream {
    values: Arc<[f32]>,
    cursor: usize,
    end: usize,
}

impl RandomStream {
    pub fn new(values: Vec<f32>) -> Self {
        let end = values.len();
        Self {
            values: values.into(),
            cursor: 0,
            end,
        }
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let values = (0..len).map(|_| rng.sample(StandardUniform)).collect();
        Self::new(values)
    }

    pub fn draws_per_search(max_depth: usize) -> usize {
        let nodes = (0..=max_depth).fold(0_usize, |acc, level| {
            acc.saturating_add(4_usize.saturating_pow(level as u32))
        });
        nodes.saturating_mul(2)
    }

    pub fn for_search<R: Rng + ?Sized>(rng: &mut R, max_depth: usize, moves: usize) -> Self {
        // recommendations always expand the root
        let depth = max_depth.max(1);
        let per_move = Self::draws_per_search(depth).saturating_add(2);
        Self::generate(rng, per_move.saturating_mul(moves))
    }

    pub fn remaining(&self) -> usize {
        self.end - self.cursor
    }

    fn next_unit(&mut self) -> Result<f32> {
        if self.cursor >= self.end {
            return Err(EngineError::ExhaustedRandomStream { requested: 1 });
        }
        let u = self.values[self.cursor];
        self.cursor += 1;
        Ok(u)
    }
}

impl TileSource for RandomStream {
    fn pick_index(&mut self, len: usize) -> Result<usize> {
        let u = self.next_unit()?;
        let idx = (f64::from(u) * len as f64) as usize;
        Ok(idx.min(len - 1))
    }

    fn pick_tile(&mut self) -> Result<Tile> {
        let u = self.next_unit()?;
        Ok(if f64::from(u) < TWO_PROBABILITY {
            Tile::TWO
        } else {
            Tile::FOUR
        })
    }
}

impl SplitSource for RandomStream {
    fn split(&mut self, n: usize, draws_each: usize) -> Result<Vec<Self>> {
        let needed = n.saturating_mul(draws_each);
        if needed > self.remaining() {
            return Err(EngineError::ExhaustedRandomStream {
                requested: needed - self.remaining(),
            });
        }
        let parts = (0..n)
            .map(|i| {
                let start = self.cursor + i * draws_each;
                RandomStream {
                    values: Arc::clone(&self.values),
                    cursor: start,
                    end: start + draws_each,
                }
            })
            .collect();
        self.cursor += needed;
        Ok(parts)
    }
}

// A full board comes back unchanged with no draws taken.
pub fn insert_random_tile<const N: usize, S: TileSource + ?Sized>(
    board: &Board<N>,
    source: &mut S,
) -> Result<(Board<N>, usize)> {
    let open: Vec<(usize, usize)> = board.empty_cells().collect();
    if open.is_empty() {
        return Ok((*board, 0));
    }

    let (row, col) = open[source.pick_index(open.len())?];
    let tile = source.pick_tile()?;

    let mut next = *board;
    next.set(row, col, Some(tile));
    Ok((next, open.len() - 1))
}
