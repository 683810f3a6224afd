use proptest::prelude::*;

use pushbox::domain::geometry::{Coord, Direction};
use pushbox::domain::rules::StarThresholds;
use pushbox::sim::level::parse_level;
use pushbox::sim::progress::{LevelStats, ProgressionLedger};
use pushbox::sim::step::{MoveOutcome, PuzzleEngine, Rejection};

/// A walled `w`×`h` room. `cells` is a permutation of the interior: the
/// first cell holds the player, the next `boxes` hold boxes, the next
/// `boxes` hold goals.
fn room_text(w: usize, h: usize, cells: &[usize], boxes: usize) -> String {
    let mut grid = vec![vec!['-'; w + 2]; h + 2];
    for row in 0..h + 2 {
        for col in 0..w + 2 {
            if row == 0 || col == 0 || row == h + 1 || col == w + 1 {
                grid[row][col] = '#';
            }
        }
    }
    for (i, &cell) in cells.iter().take(1 + 2 * boxes).enumerate() {
        let marker = match i {
            0 => '@',
            i if i <= boxes => '$',
            _ => '*',
        };
        grid[cell / w + 1][cell % w + 1] = marker;
    }
    grid.iter().map(|r| r.iter().collect::<String>()).collect::<Vec<_>>().join("\n")
}

fn arb_room() -> impl Strategy<Value = String> {
    (3usize..7, 2usize..5, 1usize..=2)
        .prop_flat_map(|(w, h, boxes)| {
            let cells: Vec<usize> = (0..w * h).collect();
            (Just((w, h, boxes)), Just(cells).prop_shuffle())
        })
        .prop_map(|((w, h, boxes), cells)| room_text(w, h, &cells, boxes))
}

fn arb_dir() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

proptest! {
    #[test]
    fn rejected_moves_change_nothing(
        text in arb_room(),
        dirs in prop::collection::vec(arb_dir(), 0..40),
    ) {
        let mut engine = PuzzleEngine::new(parse_level(&text).unwrap());
        let box_count = engine.board().box_count();

        for dir in dirs {
            let before = engine.board().clone();
            let moves = engine.moves();
            match engine.attempt_move(dir) {
                MoveOutcome::Moved => prop_assert_eq!(engine.moves(), moves + 1),
                MoveOutcome::Rejected(_) => {
                    prop_assert_eq!(engine.board(), &before);
                    prop_assert_eq!(engine.moves(), moves);
                }
            }

            let board = engine.board();
            let player = board.player();
            prop_assert!(!board.is_wall(player));
            prop_assert!(!board.has_box(player));
            prop_assert_eq!(board.box_count(), box_count);
            prop_assert!(board.boxes().all(|b| !board.is_wall(b)));
        }
    }

    #[test]
    fn won_exactly_when_every_goal_is_covered(
        text in arb_room(),
        dirs in prop::collection::vec(arb_dir(), 0..60),
    ) {
        let mut engine = PuzzleEngine::new(parse_level(&text).unwrap());
        for dir in dirs {
            engine.attempt_move(dir);
            let board = engine.board();
            prop_assert_eq!(engine.is_won(), board.boxes_on_goals() == board.goal_count());
        }
    }

    #[test]
    fn box_cannot_be_pushed_into_another_box(gap in 0usize..6, tail in 0usize..4) {
        let text = format!("#@{}$${}**#", "-".repeat(gap), "-".repeat(tail));
        let mut engine = PuzzleEngine::new(parse_level(&text).unwrap());
        for _ in 0..gap {
            prop_assert_eq!(engine.attempt_move(Direction::Right), MoveOutcome::Moved);
        }
        let boxes: Vec<Coord> = engine.board().boxes().collect();
        prop_assert_eq!(
            engine.attempt_move(Direction::Right),
            MoveOutcome::Rejected(Rejection::Blocked)
        );
        prop_assert_eq!(engine.board().boxes().collect::<Vec<_>>(), boxes);
        prop_assert_eq!(engine.moves(), gap as u32);
    }

    #[test]
    fn stars_never_increase_with_more_moves(
        three in any::<i32>(),
        two in any::<i32>(),
        a in any::<u32>(),
        b in any::<u32>(),
    ) {
        let t = StarThresholds::new(three, two);
        let (fewer, more) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(t.stars_for(fewer) >= t.stars_for(more));
        prop_assert!((1..=3).contains(&t.stars_for(more)));
    }

    #[test]
    fn replaying_equal_or_fewer_stars_is_a_no_op(
        moves in 0u32..500,
        time in 0.0f64..1000.0,
        stars in 1u8..=3,
        replay_moves in 0u32..500,
        replay_time in 0.0f64..1000.0,
        replay_stars in 1u8..=3,
    ) {
        let mut ledger = ProgressionLedger::new();
        ledger.record_attempt(4, LevelStats::new(moves, time, stars));
        let before = ledger.clone();

        let replay = LevelStats::new(replay_moves, replay_time, replay_stars.min(stars));
        prop_assert!(!ledger.record_attempt(4, replay));
        prop_assert_eq!(&ledger, &before);

        ledger.record_attempt(4, LevelStats::new(moves, time, stars));
        prop_assert_eq!(&ledger, &before);
    }
}
