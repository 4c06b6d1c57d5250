use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::{EngineError, Result};

// Header `score,move_count,empty_cells,already_won,game_over`, then N rows of
// tile values. Anything after the rows is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<const N: usize> {
    pub score: u64,
    pub move_count: u64,
    pub empty_cells: usize,
    pub already_won: bool,
    pub game_over: bool,
    pub board: Board<N>,
}

impl<const N: usize> Snapshot<N> {
    pub fn validate(&self) -> Result<()> {
        let zeros = self.board.count_empty();
        if self.empty_cells != zeros {
            return Err(EngineError::InvalidBoardState(format!(
                "empty cell count {} but the board has {zeros} empty cells",
                self.empty_cells
            )));
        }
        if self.empty_cells < 2 && self.move_count < 1 {
            return Err(EngineError::InvalidBoardState(format!(
                "{} empty cells with no moves played",
                self.empty_cells
            )));
        }
        Ok(())
    }
}

impl<const N: usize> Display for Snapshot<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{},{},{},{},{}",
            self.score, self.move_count, self.empty_cells, self.already_won, self.game_over
        )?;
        for row in self.board.values().iter() {
            let line: Vec<String> = row.iter().map(u32::to_string).collect();
            writeln!(f, "{}", line.join(","))?;
        }
        Ok(())
    }
}

fn parse_field<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| EngineError::Parse(format!("bad {name} {raw:?}")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(EngineError::Parse(format!("bad {name} {raw:?}"))),
    }
}

impl<const N: usize> FromStr for Snapshot<N> {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let mut lines = s.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| EngineError::Parse("empty snapshot".into()))?;
        let fields: Vec<&str> = header.split(',').collect();
        let [score, moves, empty, won, over] = fields[..] else {
            return Err(EngineError::Parse(format!(
                "expected 5 header fields, found {}",
                fields.len()
            )));
        };

        let mut values = [[0_u32; N]; N];
        for (row, out) in values.iter_mut().enumerate() {
            let line = lines
                .next()
                .ok_or_else(|| EngineError::Parse(format!("missing board row {row}")))?;
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != N {
                return Err(EngineError::Parse(format!(
                    "row {row} has {} values, expected {N}",
                    cells.len()
                )));
            }
            for (col, raw) in cells.into_iter().enumerate() {
                let v: i64 = parse_field("tile", raw)?;
                out[col] = u32::try_from(v).map_err(|_| {
                    EngineError::InvalidBoardState(format!("tile {v} at ({row}, {col})"))
                })?;
            }
        }

        Ok(Snapshot {
            score: parse_field("score", score)?,
            move_count: parse_field("move count", moves)?,
            empty_cells: parse_field("empty cell count", empty)?,
            already_won: parse_flag("won flag", won)?,
            game_over: parse_flag("game over flag", over)?,
            board: Board::from_values(values)?,
        })
    }
}
