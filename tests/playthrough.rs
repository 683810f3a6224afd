use pushbox::domain::geometry::Direction::{self, Down, Left, Right, Up};
use pushbox::sim::level::{parse_level, LevelCatalog, LevelDef};
use pushbox::sim::progress::{LevelStats, ProgressionLedger, TotalStats};
use pushbox::sim::save::{load_progress, save_progress};
use pushbox::sim::session::{Advance, Session, SessionError};
use pushbox::sim::step::{MoveOutcome, Phase, PuzzleEngine, Rejection};

fn play(session: &mut Session, moves: &[Direction]) {
    for &dir in moves {
        assert_eq!(session.attempt_move(dir), MoveOutcome::Moved, "{dir:?} should move");
    }
}

#[test]
fn built_in_levels_play_through_with_three_stars() {
    let mut session = Session::new(LevelCatalog::embedded());
    session.start_new_game().unwrap();

    let solutions: [&[Direction]; 5] = [
        &[Up],
        &[Right, Right, Right],
        &[Right, Up, Right, Down],
        &[Up, Left, Down, Left, Down, Right],
        &[
            Up, Right, Right, Down, Right, Right, Right,
            Up, Left, Left, Left, Left, Left, Down,
            Right, Right, Right, Right,
        ],
    ];

    for (i, moves) in solutions.iter().enumerate() {
        assert_eq!(session.current_level(), i);
        play(&mut session, moves);
        let engine = session.engine().unwrap();
        assert_eq!(engine.phase(), Phase::Won { stars: 3 }, "level {}", i + 1);

        let advance = session.next_level().unwrap();
        if i + 1 < solutions.len() {
            assert_eq!(advance, Advance::Loaded(i + 1));
        } else {
            assert_eq!(advance, Advance::Finished(TotalStats { moves: 32, time: 0.0, stars: 15 }));
        }
    }
    assert_eq!(session.max_stars(), 15);
}

#[test]
fn adjacent_box_is_pushed_onto_its_goal_in_one_move() {
    let mut engine = PuzzleEngine::new(parse_level("#####\n#@$*#\n#####\n---\n3,5").unwrap());
    assert_eq!(engine.attempt_move(Right), MoveOutcome::Moved);
    assert_eq!(engine.phase(), Phase::Won { stars: 3 });
    assert_eq!(engine.moves(), 1);
    assert_eq!(engine.attempt_move(Right), MoveOutcome::Rejected(Rejection::Paused));
}

#[test]
fn box_one_step_away_is_solved_in_two_moves() {
    let mut engine = PuzzleEngine::new(parse_level("######\n#@-$*#\n######\n---\n3,5").unwrap());
    engine.attempt_move(Right);
    assert!(!engine.is_won());
    engine.attempt_move(Right);
    assert_eq!(engine.phase(), Phase::Won { stars: 3 });
    assert_eq!(engine.moves(), 2);
}

#[test]
fn extra_boxes_off_goals_do_not_block_the_win() {
    let mut engine = PuzzleEngine::new(parse_level("######\n#@$*$#\n######").unwrap());
    engine.attempt_move(Right);
    assert!(engine.is_won());
    assert_eq!(engine.board().box_count(), 2);
}

#[test]
fn lower_star_replay_keeps_the_first_result() {
    let mut ledger = ProgressionLedger::new();
    ledger.record_attempt(0, LevelStats::new(10, 20.0, 2));
    ledger.record_attempt(0, LevelStats::new(5, 8.0, 1));
    assert_eq!(ledger.total_stats(), TotalStats { moves: 10, time: 20.0, stars: 2 });
}

#[test]
fn skip_always_overwrites() {
    let mut ledger = ProgressionLedger::new();
    ledger.record_attempt(0, LevelStats::new(10, 20.0, 2));
    ledger.record_attempt(0, LevelStats::new(1, 1.0, 0));
    assert_eq!(ledger.get(0), Some(&LevelStats::new(1, 1.0, 0)));
    assert_eq!(ledger.total_stats(), TotalStats { moves: 1, time: 1.0, stars: 0 });
}

#[test]
fn skipping_records_zero_stars_and_advances() {
    let catalog = LevelCatalog::from_defs(vec![
        LevelDef { name: "a".into(), text: "#######\n#@-$-*#\n#######\n---\n0,0\n".into() },
        LevelDef { name: "b".into(), text: "#####\n#@$*#\n#####\n".into() },
    ]);
    let mut session = Session::new(catalog);
    session.start_new_game().unwrap();

    // Skip is offered once moves exceed twice the 2-star budget.
    assert!(!session.engine().unwrap().skip_offered());
    session.attempt_move(Right);
    assert!(session.engine().unwrap().skip_offered());

    session.tick(2.5);
    assert_eq!(session.skip_level().unwrap(), Advance::Loaded(1));
    assert_eq!(session.ledger().get(0), Some(&LevelStats::new(1, 2.5, 0)));
}

#[test]
fn pause_freezes_moves_and_time() {
    let mut session = Session::new(LevelCatalog::embedded());
    session.start_new_game().unwrap();
    session.tick(1.0);
    session.set_paused(true);
    session.tick(5.0);
    assert_eq!(session.attempt_move(Up), MoveOutcome::Rejected(Rejection::Paused));
    session.set_paused(false);
    session.tick(0.5);

    let engine = session.engine().unwrap();
    assert_eq!(engine.moves(), 0);
    assert!((engine.elapsed() - 1.5).abs() < 1e-9);
}

#[test]
fn saved_progress_resumes_at_the_next_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.dat");

    let mut session = Session::new(LevelCatalog::embedded());
    session.start_new_game().unwrap();
    play(&mut session, &[Up]);
    save_progress(&path, &session.save_data()).unwrap();

    let mut resumed = Session::new(LevelCatalog::embedded());
    resumed.resume(load_progress(&path).unwrap()).unwrap();
    assert_eq!(resumed.current_level(), 1);
    assert_eq!(resumed.ledger().get(0).map(|s| (s.moves, s.stars)), Some((1, 3)));
}

#[test]
fn broken_level_is_reported_not_loaded() {
    let catalog = LevelCatalog::from_defs(vec![LevelDef {
        name: "no player".into(),
        text: "#####\n#-$*#\n#####\n".into(),
    }]);
    let mut session = Session::new(catalog);
    let err = session.start_new_game().unwrap_err();
    assert!(matches!(err, SessionError::InvalidLevel { index: 0, .. }));
    assert!(matches!(session.engine(), Err(SessionError::NoActiveLevel)));
}
