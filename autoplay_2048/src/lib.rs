//! 2048 game engine with a look-ahead autoplayer.

pub mod board;
pub mod error;
pub mod heuristic;
pub mod moves;
pub mod policy;
pub mod random;
pub mod search;
pub mod session;
pub mod snapshot;

pub use board::{Board, Board4, Direction, Tile};
pub use error::{EngineError, Result};
pub use heuristic::{Heuristic, HeuristicKind};
pub use moves::{apply_move, apply_move_raw, can_move, is_game_over, MoveOutcome};
pub use policy::{play_game, AutoPlayer, GameSummary, Policy, PriorityPolicy, SnakePolicy};
pub use random::{insert_random_tile, RandomStream, RngSource, SplitSource, TileSource};
pub use search::{recommend_move, Recommendation, SearchConfig, SearchTree, TopSelection};
pub use session::GameSession;
pub use snapshot::Snapshot;
