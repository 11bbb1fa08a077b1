//! Lazy-SMP parallel search tests.

use std::str::FromStr;
use std::time::Duration;
use vantage::board::Board;
use vantage::moves::execute::{generate_legal, is_legal_move};
use vantage::moves::magic::loader::load_magic_tables;
use vantage::search::parallel::search_parallel;
use vantage::search::tt::TranspositionTable;

#[test]
fn parallel_search_returns_legal_move_for_various_thread_counts() {
    let tables = load_magic_tables();
    let board = Board::new();

    for threads in [1, 2, 4] {
        let tt = TranspositionTable::new(16);
        let result = search_parallel(&board, &tables, 3, None, threads, &tt);

        let mv = result
            .best_move
            .unwrap_or_else(|| panic!("threads={threads} should return a move"));

        let mut check_board = board.clone();
        assert!(
            is_legal_move(&mut check_board, mv, &tables),
            "threads={threads} returned an illegal move"
        );
    }
}

#[test]
fn parallel_search_solves_mate_in_two_at_every_thread_count() {
    // White to move, mate in 2: Qh5+ ... then a forced mating continuation.
    let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
    let tables = load_magic_tables();
    let board = Board::from_str(fen).expect("valid fen");

    for threads in [1, 2, 3] {
        let tt = TranspositionTable::new(16);
        let result = search_parallel(&board, &tables, 4, Some(Duration::from_millis(800)), threads, &tt);
        assert!(
            result.best_move.is_some(),
            "threads={threads} should find a move"
        );
        // A mating attack should be recognized as a large positive score
        // for the side to move well before the mate distance runs out.
        assert!(
            result.score > 200,
            "threads={threads} should evaluate the attack as winning, got {}",
            result.score
        );
    }
}

#[test]
fn parallel_search_degenerates_to_single_thread_cleanly() {
    let tables = load_magic_tables();
    let board = Board::new();
    let tt = TranspositionTable::new(16);

    let result = search_parallel(&board, &tables, 3, None, 1, &tt);
    assert!(result.best_move.is_some());
    assert!(result.depth_reached >= 1);
}

#[test]
fn parallel_search_respects_generated_legal_move_set() {
    let tables = load_magic_tables();
    let board = Board::new();
    let tt = TranspositionTable::new(16);

    let result = search_parallel(&board, &tables, 2, None, 2, &tt);
    let mv = result.best_move.expect("should find a move");

    let mut moves = Vec::with_capacity(256);
    let mut scratch = Vec::with_capacity(256);
    let mut board_copy = board.clone();
    generate_legal(&mut board_copy, &tables, &mut moves, &mut scratch);

    assert!(
        moves.iter().any(|m| m.from == mv.from && m.to == mv.to && m.promotion == mv.promotion),
        "chosen move must be a member of the generated legal move set"
    );
}
