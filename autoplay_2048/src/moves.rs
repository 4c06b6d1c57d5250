use crate::board::{Board, Direction, Tile};
use crate::error::Result;

// An invalid move carries the input board and a zero delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome<const N: usize> {
    pub valid: bool,
    pub board: Board<N>,
    pub score_delta: u64,
}

impl<const N: usize> MoveOutcome<N> {
    pub fn new_score(&self, score: u64) -> u64 {
        score + self.score_delta
    }
}

// (row, col) of the `pos`-th cell of line `line`, counting from the end the
// tiles move toward.
fn cell<const N: usize>(direction: Direction, line: usize, pos: usize) -> (usize, usize) {
    match direction {
        Direction::Up => (pos, line),
        Direction::Down => (N - 1 - pos, line),
        Direction::Left => (line, pos),
        Direction::Right => (line, N - 1 - pos),
    }
}

pub fn slide_line<const N: usize>(line: &mut [Option<Tile>; N]) -> (bool, u64) {
    let mut moved = false;
    let mut gained = 0;
    let mut place = 0;
    let mut eval = 1;

    while eval < N {
        if place == eval {
            eval += 1;
            continue;
        }
        match (line[place], line[eval]) {
            (_, None) => eval += 1,
            (None, Some(t)) => {
                line[place] = Some(t);
                line[eval] = None;
                moved = true;
                eval += 1;
            }
            (Some(a), Some(b)) if a == b => {
                let merged = a.double();
                line[place] = Some(merged);
                line[eval] = None;
                gained += u64::from(merged.value());
                moved = true;
                place += 1;
                eval += 1;
            }
            (Some(_), Some(_)) => place += 1,
        }
    }
    (moved, gained)
}

pub fn apply_move<const N: usize>(board: &Board<N>, direction: Direction) -> MoveOutcome<N> {
    let mut next = *board;
    let mut valid = false;
    let mut score_delta = 0;

    for line_idx in 0..N {
        let mut line = [None; N];
        for (pos, slot) in line.iter_mut().enumerate() {
            let (row, col) = cell::<N>(direction, line_idx, pos);
            *slot = next.get(row, col);
        }

        let (moved, gained) = slide_line(&mut line);
        if !moved {
            continue;
        }
        valid = true;
        score_delta += gained;
        for (pos, tile) in line.iter().enumerate() {
            let (row, col) = cell::<N>(direction, line_idx, pos);
            next.set(row, col, *tile);
        }
    }

    if valid {
        MoveOutcome {
            valid,
            board: next,
            score_delta,
        }
    } else {
        MoveOutcome {
            valid,
            board: *board,
            score_delta: 0,
        }
    }
}

pub fn apply_move_raw<const N: usize>(board: &Board<N>, direction: u8) -> Result<MoveOutcome<N>> {
    let direction = Direction::try_from(direction)?;
    Ok(apply_move(board, direction))
}

pub fn can_move<const N: usize>(board: &Board<N>, direction: Direction) -> bool {
    // cheaper than a full slide: any gap before a tile, or two equal
    // neighbours, makes the move valid
    (0..N).any(|line_idx| {
        let mut prev: Option<Option<Tile>> = None;
        for pos in 0..N {
            let (row, col) = cell::<N>(direction, line_idx, pos);
            let cur = board.get(row, col);
            if let Some(prev) = prev {
                if cur.is_some() && (prev.is_none() || prev == cur) {
                    return true;
                }
            }
            prev = Some(cur);
        }
        false
    })
}

pub fn is_game_over<const N: usize>(board: &Board<N>) -> bool {
    Direction::ALL.iter().all(|d| !can_move(board, *d))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Board4;

    fn row_values(board: &Board4, row: usize) -> [u32; 4] {
        board.values()[row]
    }

    #[test]
    fn single_tile_slides_left() {
        let mut values = [[0; 4]; 4];
        values[1][2] = 2;
        let b = Board4::from_values(values).unwrap();
        let out = apply_move(&b, Direction::Left);
        assert!(out.valid);
        assert_eq!(row_values(&out.board, 1), [2, 0, 0, 0]);
        assert_eq!(out.score_delta, 0);
    }

    #[test]
    fn four_equal_tiles_merge_pairwise() {
        let b = Board4::from_values([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
        let out = apply_move(&b, Direction::Left);
        assert_eq!(row_values(&out.board, 0), [4, 4, 0, 0]);
        assert_eq!(out.score_delta, 8);
        assert_eq!(out.new_score(100), 108);
    }

    #[test]
    fn merged_tile_does_not_merge_again() {
        let b = Board4::from_values([[4, 2, 2, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let out = apply_move(&b, Direction::Left);
        assert_eq!(row_values(&out.board, 0), [4, 4, 0, 0]);
        assert_eq!(out.score_delta, 4);

        let b = Board4::from_values([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let out = apply_move(&b, Direction::Right);
        assert_eq!(row_values(&out.board, 0), [0, 0, 4, 4]);
    }

    #[test]
    fn gaps_collapse_before_merge() {
        let b = Board4::from_values([[2, 0, 0, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
        let out = apply_move(&b, Direction::Left);
        assert_eq!(row_values(&out.board, 0), [4, 0, 0, 0]);
        assert_eq!(out.score_delta, 4);
    }

    #[test]
    fn columns_move_up_and_down() {
        let b = Board4::from_values([[2, 0, 0, 0], [0; 4], [2, 0, 0, 0], [4, 0, 0, 0]]).unwrap();
        let up = apply_move(&b, Direction::Up);
        assert_eq!(up.board.values().map(|r| r[0]), [4, 4, 0, 0]);
        let down = apply_move(&b, Direction::Down);
        assert_eq!(down.board.values().map(|r| r[0]), [0, 0, 4, 4]);
        assert_eq!(up.score_delta, 4);
        assert_eq!(down.score_delta, 4);
    }

    #[test]
    fn blocked_move_is_invalid_and_unchanged() {
        let b = Board4::from_values([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]).unwrap();
        let out = apply_move(&b, Direction::Left);
        assert!(!out.valid);
        assert_eq!(out.board, b);
        assert_eq!(out.score_delta, 0);
        assert!(!can_move(&b, Direction::Left));
        assert!(can_move(&b, Direction::Down));
    }

    // | 128 | 64  | 32  |  8  |
    // |  8  |  4  |  8  |  4  |
    // |     |     |     |     |
    // |     |     |     |     |
    #[test]
    fn testcase1() {
        let b = Board4::from_values([[128, 64, 32, 8], [8, 4, 8, 4], [0; 4], [0; 4]]).unwrap();
        assert!(!can_move(&b, Direction::Right));
        assert!(!apply_move(&b, Direction::Right).valid);
    }

    #[test]
    fn raw_direction_out_of_range() {
        assert!(apply_move_raw(&Board4::EMPTY, 7).is_err());
        assert!(apply_move_raw(&Board4::EMPTY, 3).is_ok());
    }

    #[test]
    fn full_board_without_pairs_is_over() {
        let b = Board4::from_values([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ])
        .unwrap();
        assert!(is_game_over(&b));

        let mut open = b;
        open.set(0, 0, Some(Tile::FOUR));
        assert!(!is_game_over(&open));
    }

    #[test]
    fn can_move_agrees_with_apply_move() {
        let b = Board4::from_values([[0, 2, 0, 2], [4, 4, 8, 16], [2, 0, 0, 0], [2, 8, 16, 32]])
            .unwrap();
        for d in Direction::ALL {
            assert_eq!(can_move(&b, d), apply_move(&b, d).valid, "{d}");
        }
    }
}
