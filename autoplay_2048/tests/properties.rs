use autoplay_2048::{
    apply_move, insert_random_tile, recommend_move, Board4, Direction, HeuristicKind,
    RandomStream, RngSource, SearchConfig, TopSelection,
};
use proptest::prelude::*;

fn tile() -> impl Strategy<Value = u32> {
    prop_oneof![
        3 => Just(0_u32),
        2 => (1_u32..=11).prop_map(|e| 1 << e),
    ]
}

fn board() -> impl Strategy<Value = Board4> {
    prop::array::uniform4(prop::array::uniform4(tile()))
        .prop_map(|values| Board4::from_values(values).unwrap())
}

fn direction() -> impl Strategy<Value = Direction> {
    (0_u8..4).prop_map(|d| Direction::try_from(d).unwrap())
}

// Straightforward model of one line sliding toward index 0.
fn merge_line(line: [u32; 4]) -> ([u32; 4], u64) {
    let tiles: Vec<u32> = line.into_iter().filter(|v| *v != 0).collect();
    let mut out = [0; 4];
    let mut gained = 0;
    let (mut i, mut w) = (0, 0);
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            out[w] = tiles[i] * 2;
            gained += u64::from(out[w]);
            i += 2;
        } else {
            out[w] = tiles[i];
            i += 1;
        }
        w += 1;
    }
    (out, gained)
}

// Lines of `values` read from the end the tiles travel toward.
fn lines(values: [[u32; 4]; 4], direction: Direction) -> [[u32; 4]; 4] {
    let mut out = [[0; 4]; 4];
    for line in 0..4 {
        for pos in 0..4 {
            out[line][pos] = match direction {
                Direction::Left => values[line][pos],
                Direction::Right => values[line][3 - pos],
                Direction::Up => values[pos][line],
                Direction::Down => values[3 - pos][line],
            };
        }
    }
    out
}

fn tile_sum(b: &Board4) -> u64 {
    b.values().iter().flatten().map(|v| u64::from(*v)).sum()
}

proptest! {
    #[test]
    fn merges_conserve_tiles(b in board(), d in direction()) {
        let outcome = apply_move(&b, d);
        prop_assume!(outcome.valid);

        let before = lines(b.values(), d);
        let after = lines(outcome.board.values(), d);
        let mut delta = 0;
        for (old, new) in before.into_iter().zip(after) {
            let (expected, gained) = merge_line(old);
            prop_assert_eq!(new, expected);
            delta += gained;
        }
        prop_assert_eq!(outcome.score_delta, delta);
        prop_assert_eq!(tile_sum(&outcome.board), tile_sum(&b));
    }

    #[test]
    fn invalid_moves_change_nothing(b in board(), d in direction()) {
        let outcome = apply_move(&b, d);
        if !outcome.valid {
            prop_assert_eq!(outcome.board, b);
            prop_assert_eq!(outcome.score_delta, 0);
        } else {
            prop_assert_ne!(outcome.board, b);
        }
    }

    #[test]
    fn directions_share_one_slide(b in board(), d in direction()) {
        let rotated = apply_move(&b.rotate_ccw(), d);
        let plain = apply_move(&b, d.next());
        prop_assert_eq!(rotated.valid, plain.valid);
        prop_assert_eq!(rotated.score_delta, plain.score_delta);
        prop_assert_eq!(rotated.board, plain.board.rotate_ccw());
    }

    #[test]
    fn only_powers_of_two_appear(
        seed in any::<u64>(),
        moves in prop::collection::vec(direction(), 1..80),
    ) {
        let mut src = RngSource::from_seed(seed);
        let (mut b, _) = insert_random_tile(&Board4::EMPTY, &mut src).unwrap();
        let mut expected_sum = tile_sum(&b);
        for d in moves {
            let outcome = apply_move(&b, d);
            if !outcome.valid {
                continue;
            }
            let (next, _) = insert_random_tile(&outcome.board, &mut src).unwrap();
            expected_sum += tile_sum(&next) - tile_sum(&outcome.board);
            b = next;
            for v in b.values().iter().flatten() {
                prop_assert!(*v == 0 || (*v >= 2 && v.is_power_of_two()), "{}", v);
            }
        }
        prop_assert_eq!(tile_sum(&b), expected_sum);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn search_is_deterministic(b in board(), seed in any::<u64>(), kind in 0_u8..4) {
        let config = SearchConfig {
            max_depth: 2,
            top: TopSelection::Fraction(0.1),
            heuristic: kind.to_string().parse::<HeuristicKind>().unwrap(),
            ..SearchConfig::default()
        };
        let mut rng = RngSource::from_seed(seed);
        let stream = RandomStream::for_search(rng.rng_mut(), 2, 1);

        let first = recommend_move(&b, 0, &config, &mut stream.clone()).unwrap();
        let second = recommend_move(&b, 0, &config, &mut stream.clone()).unwrap();
        prop_assert_eq!(first, second);
    }
}
