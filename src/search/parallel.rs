//! Lazy-SMP: a best-effort parallel search layer over the single-thread
//! iterative-deepening driver.
//!
//! Every worker (the main thread plus `threads - 1` helpers) runs its own
//! iterative-deepening loop against its own `Board` clone and its own
//! killer/history tables, sharing only the transposition table. Helper
//! threads jitter their aspiration window so their move ordering diverges
//! from the main thread's, which means they populate the shared TT with
//! complementary search results rather than duplicating the main thread's
//! work outright. The main thread's last completed depth is authoritative;
//! helpers are signaled to stop as soon as it returns.

use crate::board::Board;
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::search::{TimeManager, iterative_deepening};
use crate::search::tt::TranspositionTable;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Result of a Lazy-SMP search: the main thread's authoritative outcome.
pub struct ParallelResult {
    pub score: i32,
    pub best_move: Option<Move>,
    pub depth_reached: i32,
    pub ms_spent: u128,
}

/// Run a Lazy-SMP search with `threads` workers (main thread included)
/// against a shared transposition table.
///
/// `threads == 1` degenerates to plain single-thread iterative deepening.
pub fn search_parallel(
    board: &Board,
    tables: &MagicTables,
    max_depth: i32,
    time_limit: Option<Duration>,
    threads: usize,
    tt: &TranspositionTable,
) -> ParallelResult {
    let threads = threads.max(1);
    let stop = AtomicBool::new(false);
    let start = std::time::Instant::now();

    tt.new_search();

    if threads == 1 {
        let mut main_board = board.clone();
        let mut ctx = SearchContext::new();
        let mut time = TimeManager::new_with_shared_stop(time_limit, &stop);
        let result = iterative_deepening(
            &mut main_board,
            tables,
            max_depth,
            tt,
            &mut ctx,
            &mut time,
            0,
            true,
        );
        return ParallelResult {
            score: result.score,
            best_move: result.best_move,
            depth_reached: result.depth_reached,
            ms_spent: start.elapsed().as_millis(),
        };
    }

    let main_result = std::thread::scope(|scope| {
        // Helper workers: perturbed aspiration window, silent `info` output.
        // Each helper's stack frame outlives the scope, so `join` below is
        // not optional -- `thread::scope` enforces it even on panic.
        let mut helpers = Vec::with_capacity(threads - 1);
        for worker_id in 1..threads {
            let stop_ref = &stop;
            let mut helper_board = board.clone();
            helpers.push(scope.spawn(move || {
                let mut ctx = SearchContext::new();
                let mut time = TimeManager::new_with_shared_stop(time_limit, stop_ref);
                // Vary the aspiration window per worker so helpers explore
                // slightly different lines instead of retracing the main
                // thread's search; this is the "divergence" Lazy-SMP relies
                // on since helpers share no move-ordering state.
                let jitter = (worker_id as i32) * 15;
                let _ = iterative_deepening(
                    &mut helper_board,
                    tables,
                    max_depth,
                    tt,
                    &mut ctx,
                    &mut time,
                    jitter,
                    false,
                );
            }));
        }

        let mut main_board = board.clone();
        let mut main_ctx = SearchContext::new();
        let mut main_time = TimeManager::new_with_shared_stop(time_limit, &stop);
        let result = iterative_deepening(
            &mut main_board,
            tables,
            max_depth,
            tt,
            &mut main_ctx,
            &mut main_time,
            0,
            true,
        );

        // Signal every helper to stop now that the authoritative result is in.
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        for handle in helpers {
            let _ = handle.join();
        }

        result
    });

    ParallelResult {
        score: main_result.score,
        best_move: main_result.best_move,
        depth_reached: main_result.depth_reached,
        ms_spent: start.elapsed().as_millis(),
    }
}
