use log::{debug, info};

use crate::board::{Board, Direction};
use crate::error::Result;
use crate::moves::{apply_move, is_game_over, MoveOutcome};
use crate::random::{insert_random_tile, TileSource};
use crate::snapshot::Snapshot;

pub const WINNING_VALUE: u32 = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct GameSession<const N: usize> {
    board: Board<N>,
    score: u64,
    move_count: u64,
    empty_cells: usize,
    game_over: bool,
    already_won: bool,
}

impl<const N: usize> GameSession<N> {
    pub fn new<S: TileSource + ?Sized>(source: &mut S) -> Result<Self> {
        let (board, _) = insert_random_tile(&Board::EMPTY, source)?;
        let (board, empty_cells) = insert_random_tile(&board, source)?;
        Ok(Self {
            board,
            score: 0,
            move_count: 0,
            empty_cells,
            game_over: false,
            already_won: false,
        })
    }

    pub fn from_snapshot(snapshot: &Snapshot<N>) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            board: snapshot.board,
            score: snapshot.score,
            move_count: snapshot.move_count,
            empty_cells: snapshot.empty_cells,
            game_over: snapshot.game_over,
            already_won: snapshot.already_won,
        })
    }

    pub fn snapshot(&self) -> Snapshot<N> {
        Snapshot {
            score: self.score,
            move_count: self.move_count,
            empty_cells: self.empty_cells,
            already_won: self.already_won,
            game_over: self.game_over,
            board: self.board,
        }
    }

    // An invalid move changes nothing and draws nothing.
    pub fn commit_move<S: TileSource + ?Sized>(
        &mut self,
        direction: Direction,
        source: &mut S,
    ) -> Result<MoveOutcome<N>> {
        let outcome = apply_move(&self.board, direction);
        if !outcome.valid {
            debug!("ignoring invalid move {direction}");
            return Ok(outcome);
        }

        let (board, empty_cells) = insert_random_tile(&outcome.board, source)?;
        let won_now = !self.already_won && board.max_value() >= WINNING_VALUE;

        *self = Self {
            board,
            score: outcome.new_score(self.score),
            move_count: self.move_count + 1,
            empty_cells,
            game_over: empty_cells == 0 && is_game_over(&board),
            already_won: self.already_won || won_now,
        };

        if won_now {
            info!(
                "reached {WINNING_VALUE} after {} moves, score {}",
                self.move_count, self.score
            );
        }
        if self.game_over {
            info!(
                "game over after {} moves, score {}, max tile {}",
                self.move_count,
                self.score,
                self.board.max_value()
            );
        }
        Ok(outcome)
    }

    pub fn board(&self) -> &Board<N> {
        &self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    pub fn empty_cells(&self) -> usize {
        self.empty_cells
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn already_won(&self) -> bool {
        self.already_won
    }

    pub fn max_tile(&self) -> u32 {
        self.board.max_value()
    }
}
