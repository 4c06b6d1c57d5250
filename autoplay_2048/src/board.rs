use std::{
    fmt::{self, Display},
    num::NonZeroU32,
    str::FromStr,
};

use serde::{de, ser::SerializeSeq, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};

// which power of two. NonZero because two is the lowest
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Tile(NonZeroU32);

impl Tile {
    pub const TWO: Tile = Tile(NonZeroU32::MIN);
    pub const FOUR: Tile = Tile::TWO.double();

    pub const fn double(self) -> Tile {
        Tile(self.0.saturating_add(1))
    }

    pub fn from_value(value: u32) -> Option<Tile> {
        if value < 2 || !value.is_power_of_two() {
            return None;
        }
        NonZeroU32::new(value.trailing_zeros()).map(Tile)
    }

    pub fn value(self) -> u32 {
        1_u32 << self.0.get()
    }

    pub fn exponent(self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Direction {
        Direction::ALL[(self.index() + 1) % 4]
    }
}

impl TryFrom<u8> for Direction {
    type Error = EngineError;

    fn try_from(raw: u8) -> Result<Self> {
        Direction::ALL
            .get(raw as usize)
            .copied()
            .ok_or(EngineError::InvalidDirection(raw))
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> u8 {
        d as u8
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "u" | "up" | "0" => Ok(Direction::Up),
            "r" | "right" | "1" => Ok(Direction::Right),
            "d" | "down" | "2" => Ok(Direction::Down),
            "l" | "left" | "3" => Ok(Direction::Left),
            other => Err(EngineError::Parse(format!("unknown direction {other:?}"))),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board<const N: usize> {
    cells: [[Option<Tile>; N]; N],
}

pub type Board4 = Board<4>;

impl<const N: usize> Default for Board<N> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<const N: usize> Board<N> {
    pub const EMPTY: Self = Board {
        cells: [[None; N]; N],
    };

    pub fn from_rows(cells: [[Option<Tile>; N]; N]) -> Self {
        Board { cells }
    }

    pub fn from_values(values: [[u32; N]; N]) -> Result<Self> {
        let mut board = Self::EMPTY;
        for (row, line) in values.iter().enumerate() {
            for (col, &v) in line.iter().enumerate() {
                board.cells[row][col] = tile_from_raw(v, row, col)?;
            }
        }
        Ok(board)
    }

    pub fn rows(&self) -> &[[Option<Tile>; N]; N] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Tile> {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, tile: Option<Tile>) {
        self.cells[row][col] = tile;
    }

    pub fn value(&self, row: usize, col: usize) -> u32 {
        self.cells[row][col].map_or(0, Tile::value)
    }

    pub fn values(&self) -> [[u32; N]; N] {
        let mut out = [[0; N]; N];
        for (row, line) in self.cells.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                out[row][col] = cell.map_or(0, Tile::value);
            }
        }
        out
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_none())
                .map(move |(col, _)| (row, col))
        })
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().flatten().filter(|t| t.is_none()).count()
    }

    pub fn tiles(&self) -> impl Iterator<Item = ((usize, usize), Tile)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.map(|t| ((row, col), t)))
        })
    }

    pub fn max_tile(&self) -> Option<Tile> {
        self.cells.iter().flatten().filter_map(|t| *t).max()
    }

    pub fn max_value(&self) -> u32 {
        self.max_tile().map_or(0, Tile::value)
    }

    pub fn max_positions(&self) -> Vec<(usize, usize)> {
        let Some(max) = self.max_tile() else {
            return Vec::new();
        };
        self.tiles()
            .filter(|(_, t)| *t == max)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn is_corner(row: usize, col: usize) -> bool {
        (row == 0 || row == N - 1) && (col == 0 || col == N - 1)
    }

    // Right column becomes the top row.
    pub fn rotate_ccw(&self) -> Self {
        let mut out = Self::EMPTY;
        for row in 0..N {
            for col in 0..N {
                out.cells[row][col] = self.cells[col][N - 1 - row];
            }
        }
        out
    }

    fn print_row(f: &mut impl fmt::Write, row: &[Option<Tile>]) -> fmt::Result {
        for tile in row.iter() {
            match tile {
                Some(tile) => write!(f, "|{: ^6}", tile.value())?,
                None => write!(f, "|{: ^6}", " ")?,
            }
        }
        Ok(())
    }
}

fn tile_from_raw(v: u32, row: usize, col: usize) -> Result<Option<Tile>> {
    if v == 0 {
        return Ok(None);
    }
    Tile::from_value(v).map(Some).ok_or_else(|| {
        EngineError::InvalidBoardState(format!(
            "tile {v} at ({row}, {col}) is not a power of two"
        ))
    })
}

impl<const N: usize> Display for Board<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            Board::<N>::print_row(f, row)?;
            writeln!(f, "|")?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for Board<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values().iter()).finish()
    }
}

impl<const N: usize> Serialize for Board<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(N))?;
        for row in self.values().iter() {
            seq.serialize_element(&row[..])?;
        }
        seq.end()
    }
}

impl<'de, const N: usize> Deserialize<'de> for Board<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<u32>>::deserialize(deserializer)?;
        if rows.len() != N || rows.iter().any(|r| r.len() != N) {
            return Err(de::Error::custom(format!("expected a {N}x{N} board")));
        }
        let mut board = Board::EMPTY;
        for (row, line) in rows.iter().enumerate() {
            for (col, &v) in line.iter().enumerate() {
                board.cells[row][col] = tile_from_raw(v, row, col).map_err(de::Error::custom)?;
            }
        }
        Ok(board)
    }
}
