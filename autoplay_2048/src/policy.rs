use log::{debug, info, warn};
use serde::Serialize;

use crate::board::{Board, Direction};
use crate::error::Result;
use crate::moves::{can_move, is_game_over, slide_line, MoveOutcome};
use crate::random::{SplitSource, TileSource};
use crate::search::{recommend, recommend_par, SearchConfig};
use crate::session::GameSession;

pub trait Policy<const N: usize> {
    fn choose(&mut self, board: &Board<N>, score: u64) -> Result<Option<Direction>>;
}

#[derive(Debug, Clone)]
pub struct AutoPlayer<S> {
    pub config: SearchConfig,
    source: S,
}

impl<S: SplitSource> AutoPlayer<S> {
    pub fn new(config: SearchConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn auto_move<const N: usize>(
        &mut self,
        session: &mut GameSession<N>,
    ) -> Result<Option<(Direction, MoveOutcome<N>)>> {
        let Some(direction) = self.choose(session.board(), session.score())? else {
            return Ok(None);
        };
        let outcome = session.commit_move(direction, &mut self.source)?;
        Ok(Some((direction, outcome)))
    }
}

impl<const N: usize, S: SplitSource> Policy<N> for AutoPlayer<S> {
    fn choose(&mut self, board: &Board<N>, score: u64) -> Result<Option<Direction>> {
        if is_game_over(board) {
            return Ok(None);
        }
        let rec = if self.config.parallel {
            recommend_par(board, score, &self.config, &mut self.source)?
        } else {
            recommend(board, score, &self.config, &mut self.source)?
        };
        debug!("{} over {} nodes: {:?}", rec.direction, rec.tree_size, rec.metrics);
        Ok(Some(rec.direction))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityPolicy {
    pub order: [Direction; 4],
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            order: [
                Direction::Up,
                Direction::Right,
                Direction::Left,
                Direction::Down,
            ],
        }
    }
}

fn first_valid<const N: usize>(board: &Board<N>, order: &[Direction; 4]) -> Option<Direction> {
    order.iter().copied().find(|d| can_move(board, *d))
}

impl<const N: usize> Policy<N> for PriorityPolicy {
    fn choose(&mut self, board: &Board<N>, _score: u64) -> Result<Option<Direction>> {
        Ok(first_valid(board, &self.order))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnakePolicy;

// whether row `row` would change when slid left or right
fn row_can_slide<const N: usize>(board: &Board<N>, row: usize) -> bool {
    let mut line = board.rows()[row];
    let mut reversed = line;
    reversed.reverse();
    slide_line(&mut line).0 || slide_line(&mut reversed).0
}

impl<const N: usize> Policy<N> for SnakePolicy {
    fn choose(&mut self, board: &Board<N>, _score: u64) -> Result<Option<Direction>> {
        let top_first = [
            Direction::Up,
            Direction::Left,
            Direction::Right,
            Direction::Down,
        ];
        let order = if row_can_slide(board, 0) || N < 2 || !row_can_slide(board, 1) {
            top_first
        } else {
            [
                Direction::Up,
                Direction::Right,
                Direction::Left,
                Direction::Down,
            ]
        };
        Ok(first_valid(board, &order))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub score: u64,
    pub moves: u64,
    pub max_tile: u32,
    pub won: bool,
    pub game_over: bool,
}

impl GameSummary {
    pub fn of<const N: usize>(session: &GameSession<N>) -> Self {
        Self {
            score: session.score(),
            moves: session.move_count(),
            max_tile: session.max_tile(),
            won: session.already_won(),
            game_over: session.is_game_over(),
        }
    }
}

pub fn play_game<const N: usize, P, S>(
    session: &mut GameSession<N>,
    policy: &mut P,
    source: &mut S,
    max_moves: Option<u64>,
) -> Result<GameSummary>
where
    P: Policy<N> + ?Sized,
    S: TileSource + ?Sized,
{
    let mut played = 0;
    while !session.is_game_over() && max_moves.map_or(true, |cap| played < cap) {
        let Some(direction) = policy.choose(session.board(), session.score())? else {
            break;
        };
        if !session.commit_move(direction, source)?.valid {
            warn!("policy chose {direction}, which does not move anything");
            break;
        }
        played += 1;
    }

    let summary = GameSummary::of(session);
    info!(
        "finished: {} moves, score {}, max tile {}",
        summary.moves, summary.score, summary.max_tile
    );
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Board4;
    use crate::random::{RandomStream, RngSource};
    use crate::snapshot::Snapshot;

    fn board(values: [[u32; 4]; 4]) -> Board4 {
        Board4::from_values(values).unwrap()
    }

    #[test]
    fn priority_skips_blocked_moves() {
        let b = board([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        // up and right do nothing
        assert_eq!(
            PriorityPolicy::default().choose(&b, 0).unwrap(),
            Some(Direction::Down)
        );
        let full = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert_eq!(PriorityPolicy::default().choose(&full, 0).unwrap(), None);
    }

    #[test]
    fn snake_order_follows_the_top_rows() {
        let b = board([[0, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        // row 0 slides, so left comes before right
        assert_eq!(SnakePolicy.choose(&b, 0).unwrap(), Some(Direction::Left));

        let b = board([[2, 4, 8, 16], [4, 2, 0, 0], [0; 4], [0; 4]]);
        // nothing to do vertically; row 0 is stuck, row 1 slides
        assert!(!can_move(&b, Direction::Up));
        assert_eq!(SnakePolicy.choose(&b, 0).unwrap(), Some(Direction::Right));
    }

    #[test]
    fn baseline_games_run_to_the_end() {
        let mut src = RngSource::from_seed(17);
        let mut game = GameSession::<4>::new(&mut src).unwrap();
        let summary = play_game(&mut game, &mut PriorityPolicy::default(), &mut src, None).unwrap();
        assert!(summary.game_over);
        assert!(summary.moves > 10);
        assert!(is_game_over(game.board()));
    }

    #[test]
    fn move_cap_is_respected() {
        let mut src = RngSource::from_seed(5);
        let mut game = GameSession::<4>::new(&mut src).unwrap();
        let summary = play_game(&mut game, &mut SnakePolicy, &mut src, Some(7)).unwrap();
        assert_eq!(summary.moves, 7);
        assert!(!summary.game_over);
    }

    #[test]
    fn auto_player_commits_its_recommendation() {
        let config = SearchConfig {
            max_depth: 2,
            ..SearchConfig::default()
        };
        let mut rng = RngSource::from_seed(3);
        let stream = RandomStream::for_search(rng.rng_mut(), 2, 5);
        let mut player = AutoPlayer::new(config, stream);

        let snap: Snapshot<4> = "0,0,14,false,false\n0,0,0,0\n0,0,2,0\n0,0,0,0\n0,2,0,0\n"
            .parse()
            .unwrap();
        let mut game = GameSession::from_snapshot(&snap).unwrap();
        for _ in 0..5 {
            let (_, outcome) = player.auto_move(&mut game).unwrap().unwrap();
            assert!(outcome.valid);
        }
        assert_eq!(game.move_count(), 5);
    }

    #[test]
    fn auto_player_stops_on_game_over() {
        let full = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut player = AutoPlayer::new(SearchConfig::default(), RngSource::from_seed(1));
        assert_eq!(player.choose(&full, 0).unwrap(), None);
    }

    #[test]
    fn parallel_auto_player_plays() {
        let config = SearchConfig {
            max_depth: 2,
            parallel: true,
            ..SearchConfig::default()
        };
        let mut player = AutoPlayer::new(config, RngSource::from_seed(9));
        let mut src = RngSource::from_seed(10);
        let mut game = GameSession::<4>::new(&mut src).unwrap();
        // 12 tiles at most, so the board cannot fill up
        let summary = play_game(&mut game, &mut player, &mut src, Some(10)).unwrap();
        assert_eq!(summary.moves, 10);
    }
}
