use autoplay_2048::{
    apply_move, insert_random_tile, search, Board4, Direction, Heuristic, HeuristicKind,
    RngSource, SearchConfig, SearchTree,
};
use criterion::{criterion_group, criterion_main, Criterion};
use rayon::ThreadPoolBuilder;
use std::hint::black_box;

fn corpus() -> Vec<Board4> {
    let mut src = RngSource::from_seed(7777);
    let mut boards = Vec::new();
    let mut b = insert_random_tile(&Board4::EMPTY, &mut src).unwrap().0;
    b = insert_random_tile(&b, &mut src).unwrap().0;
    boards.push(b);
    let seq = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
    for i in 0..48 {
        let outcome = apply_move(&b, seq[i % seq.len()]);
        if outcome.valid {
            b = insert_random_tile(&outcome.board, &mut src).unwrap().0;
        }
        boards.push(b);
    }
    boards
}

fn bench_moves(c: &mut Criterion) {
    let boards = corpus();
    c.bench_function("moves/apply_all", |bch| {
        bch.iter(|| {
            let mut acc = 0;
            for bd in &boards {
                for d in Direction::ALL {
                    acc += apply_move(bd, d).score_delta;
                }
            }
            black_box(acc)
        })
    });
}

fn bench_heuristics(c: &mut Criterion) {
    let boards = corpus();
    for kind in [
        HeuristicKind::CornerWeightedChain,
        HeuristicKind::AnyCornerChain,
        HeuristicKind::CornerAlignedChains,
    ] {
        let h = Heuristic::new(kind, 2.0);
        c.bench_function(&format!("heuristic/{kind:?}"), |bch| {
            bch.iter(|| boards.iter().map(|bd| h.evaluate(bd)).sum::<f64>())
        });
    }
}

fn bench_search(c: &mut Criterion) {
    let boards = corpus();
    let config = SearchConfig {
        max_depth: 4,
        ..SearchConfig::default()
    };

    c.bench_function("search/build_depth4", |bch| {
        bch.iter(|| {
            let mut src = RngSource::from_seed(13);
            let tree = SearchTree::build(&boards[24], 0, &config, &mut src).unwrap();
            black_box(tree.tree_size())
        })
    });

    // Pin a small pool for stability
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    c.bench_function("search/recommend_par_depth4", |bch| {
        bch.iter(|| {
            pool.install(|| {
                let mut src = RngSource::from_seed(13);
                let rec = search::recommend_par(&boards[24], 0, &config, &mut src).unwrap();
                black_box(rec.direction)
            })
        })
    });
}

criterion_group!(benches, bench_moves, bench_heuristics, bench_search);
criterion_main!(benches);
