use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use autoplay_2048::{
    play_game, search, AutoPlayer, Board4, GameSession, GameSummary, HeuristicKind, Policy,
    PriorityPolicy, RngSource, SearchConfig, SnakePolicy, Snapshot, TopSelection,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::style::{Color, Stylize};
use log::info;
use rand::{rngs::StdRng, SeedableRng};

/// Headless 2048 autoplayer.
#[derive(Parser)]
#[command(name = "autoplay", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play whole games and report the tiles reached.
    Play {
        #[arg(short, long, value_enum, default_value_t = PolicyKind::Search)]
        policy: PolicyKind,

        /// Number of games to play.
        #[arg(short, long, default_value_t = 1)]
        games: usize,

        /// Stop each game after this many moves.
        #[arg(long)]
        max_moves: Option<u64>,

        /// Seed for every random draw. Drawn from the OS when absent.
        #[arg(long)]
        seed: Option<u64>,

        /// Print the final board of each game.
        #[arg(long)]
        show: bool,

        /// Print one JSON summary per game instead of text.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Recommend a move for a saved game.
    Recommend {
        /// Save file: a header line and the board rows.
        snapshot: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// Print the branch metrics as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyKind {
    /// Look-ahead search.
    Search,
    /// First valid of up, right, left, down.
    Priority,
    /// Priority order that follows the top rows.
    Snake,
}

/// Search settings. Flags override the JSON config file.
#[derive(Args)]
struct SearchArgs {
    /// JSON file with a search config; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    depth: Option<usize>,

    /// Share of the tree averaged per root move.
    #[arg(long, conflicts_with = "top_count")]
    top_fraction: Option<f64>,

    /// Number of samples averaged per root move.
    #[arg(long)]
    top_count: Option<usize>,

    /// empty-tiles, corner-weighted-chain, any-corner-chain or
    /// corner-aligned-chains.
    #[arg(long)]
    heuristic: Option<HeuristicKind>,

    #[arg(long)]
    base: Option<f64>,

    /// Build the root branches in parallel.
    #[arg(long)]
    parallel: bool,
}

impl SearchArgs {
    fn resolve(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SearchConfig::default(),
        };

        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(f) = self.top_fraction {
            config.top = TopSelection::Fraction(f);
        }
        if let Some(n) = self.top_count {
            config.top = TopSelection::Count(n);
        }
        if let Some(kind) = self.heuristic {
            config.heuristic = kind;
        }
        if let Some(base) = self.base {
            config.base = base;
        }
        config.parallel |= self.parallel;
        Ok(config)
    }
}

fn resolve_seed(seed: Option<u64>) -> Result<u64> {
    let seed = match seed {
        Some(seed) => seed,
        None => autoplay_2048::random::entropy_seed().context("drawing a seed")?,
    };
    info!("seed {seed}");
    Ok(seed)
}

fn styled(v: u32) -> impl fmt::Display {
    format!("{: ^6}", v).with(match v {
        2 => Color::White,
        4 => Color::Rgb {
            r: 255,
            g: 215,
            b: 0,
        }, // orange
        8 => Color::DarkYellow,
        16 => Color::Magenta,
        32 => Color::Green,
        64 => Color::Blue,
        128..=512 => Color::Cyan,
        _ => Color::Red,
    })
}

fn print_board(board: &Board4) {
    for row in board.values().iter() {
        let mut line = String::new();
        for &v in row.iter() {
            if v == 0 {
                line.push_str(&format!("|{: ^6}", " "));
            } else {
                line.push_str(&format!("|{}", styled(v)));
            }
        }
        println!("{line}|");
    }
}

fn play(
    kind: PolicyKind,
    games: usize,
    max_moves: Option<u64>,
    seed: u64,
    config: SearchConfig,
    show: bool,
    json: bool,
) -> Result<()> {
    let mut master = StdRng::seed_from_u64(seed);
    let mut max_tiles = Vec::with_capacity(games);

    for game in 0..games {
        let mut tiles = RngSource::new(StdRng::from_rng(&mut master));
        let mut policy: Box<dyn Policy<4>> = match kind {
            PolicyKind::Search => Box::new(AutoPlayer::new(
                config,
                RngSource::new(StdRng::from_rng(&mut master)),
            )),
            PolicyKind::Priority => Box::new(PriorityPolicy::default()),
            PolicyKind::Snake => Box::new(SnakePolicy),
        };

        let mut session = GameSession::<4>::new(&mut tiles)?;
        let summary = play_game(&mut session, policy.as_mut(), &mut tiles, max_moves)
            .with_context(|| format!("playing game {game}"))?;
        max_tiles.push(summary.max_tile);

        if show {
            print_board(session.board());
        }
        report(game, &summary, json)?;
    }

    // geometric mean, since tiles double
    let mean_log = max_tiles.iter().map(|t| t.ilog2()).sum::<u32>() as f64 / max_tiles.len() as f64;
    if !json && !max_tiles.is_empty() {
        println!("mean max tile over {games} games: {:.1}", 2.0_f64.powf(mean_log));
    }
    Ok(())
}

fn report(game: usize, summary: &GameSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        println!(
            "game {game}: score {}, {} moves, max tile {}{}",
            summary.score,
            summary.moves,
            summary.max_tile,
            if summary.won { " (won)" } else { "" }
        );
    }
    Ok(())
}

fn recommend(path: &Path, seed: u64, config: SearchConfig, json: bool) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: Snapshot<4> = text
        .parse()
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    let session = GameSession::from_snapshot(&snapshot)
        .with_context(|| format!("loading snapshot {}", path.display()))?;

    if autoplay_2048::is_game_over(session.board()) {
        println!("game over");
        return Ok(());
    }

    let mut source = RngSource::from_seed(seed);
    let rec = if config.parallel {
        search::recommend_par(session.board(), session.score(), &config, &mut source)?
    } else {
        search::recommend(session.board(), session.score(), &config, &mut source)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rec)?);
    } else {
        print_board(session.board());
        println!("{}", rec.direction);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Play {
            policy,
            games,
            max_moves,
            seed,
            show,
            json,
            search,
        } => play(
            policy,
            games,
            max_moves,
            resolve_seed(seed)?,
            search.resolve()?,
            show,
            json,
        ),
        Command::Recommend {
            snapshot,
            seed,
            json,
            search,
        } => recommend(&snapshot, resolve_seed(seed)?, search.resolve()?, json),
    }
}
