//! Search API façade: the public surface a UCI front-end, a benchmark
//! harness, or a test suite drives the engine through.
//!
//! Every operation here takes a FEN and fails only on `InvalidFen`; once a
//! position has parsed, search itself never errors -- a time-limited call
//! that cannot complete a single root iteration still returns a legal
//! arbitrary move (the first one generated) rather than `None`.

use crate::board::Board;
use crate::moves::execute::generate_legal;
use crate::moves::magic::MagicTables;
use crate::moves::magic::loader::load_magic_tables;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::static_eval;
use crate::search::parallel::search_parallel;
use crate::search::search::{TimeManager, iterative_deepening};
use crate::search::tt::TranspositionTable;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HASH_MB: usize = 64;
const INF: i32 = 32000;

/// Errors surfaced at the façade boundary. The search core itself never
/// aborts on recoverable input -- by the time a search runs, its FEN has
/// already parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidFen { reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidFen { reason } => write!(f, "invalid FEN: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}

fn parse_fen(fen: &str) -> Result<Board, EngineError> {
    Board::from_str(fen).map_err(|reason| EngineError::InvalidFen { reason })
}

/// First legal move in a position, used as the fallback when a time
/// budget does not allow even one root iteration to complete.
fn first_legal_move(board: &mut Board, tables: &MagicTables) -> Option<Move> {
    let mut moves = Vec::with_capacity(256);
    let mut scratch = Vec::with_capacity(256);
    generate_legal(board, tables, &mut moves, &mut scratch);
    moves.into_iter().next()
}

/// A persistent engine instance: owns the transposition table so it
/// survives across searches (and therefore across the moves of a single
/// game), the way the lifecycle in the data model requires. Magic/attack
/// tables are process-wide and merely cloned in cheaply from the
/// one-shot initializer.
pub struct Engine {
    tables: MagicTables,
    tt: TranspositionTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            tables: load_magic_tables(),
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
        }
    }

    /// Resize the transposition table, clearing it. Only ever called
    /// between searches -- never while a search (single or parallel) is
    /// in flight.
    pub fn set_hash_size(&mut self, mb: usize) {
        let mb = mb.clamp(1, 1024);
        self.tt.resize(mb);
    }

    /// Number of logical CPUs available, used to size a default thread
    /// pool for `best_move_parallel`.
    pub fn cpu_cores() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// `best_move(fen, depth)` -- fixed-depth search, move in long algebraic.
    pub fn best_move(&self, fen: &str, depth: i32) -> Result<String, EngineError> {
        let depth = depth.clamp(1, 64);
        let mut board = parse_fen(fen)?;
        let mut ctx = SearchContext::new();
        let mut time = TimeManager::new(None);
        self.tt.new_search();
        let result =
            iterative_deepening(&mut board, &self.tables, depth, &self.tt, &mut ctx, &mut time, 0, false);
        let mv = result
            .best_move
            .or_else(|| first_legal_move(&mut board, &self.tables));
        Ok(mv.map(|m| m.to_uci()).unwrap_or_else(|| "0000".to_string()))
    }

    /// `evaluate(fen)` -- static evaluation, white-positive centipawns.
    pub fn evaluate(&self, fen: &str) -> Result<i32, EngineError> {
        let board = parse_fen(fen)?;
        let score = static_eval(&board, &self.tables, -INF, INF);
        Ok(if board.side_to_move == crate::board::Color::White {
            score
        } else {
            -score
        })
    }

    /// `search_info(fen, depth)` -- `"depth score pv_move"`.
    pub fn search_info(&self, fen: &str, depth: i32) -> Result<String, EngineError> {
        let depth = depth.clamp(1, 64);
        let mut board = parse_fen(fen)?;
        let mut ctx = SearchContext::new();
        let mut time = TimeManager::new(None);
        self.tt.new_search();
        let result =
            iterative_deepening(&mut board, &self.tables, depth, &self.tt, &mut ctx, &mut time, 0, false);
        let pv_move = result
            .best_move
            .map(|m| m.to_uci())
            .unwrap_or_else(|| "0000".to_string());
        Ok(format!("{} {} {}", result.depth_reached, result.score, pv_move))
    }

    /// `best_move_timed(fen, ms)` -- time-limited search.
    pub fn best_move_timed(&self, fen: &str, ms: u64) -> Result<(String, i32, u128), EngineError> {
        let mut board = parse_fen(fen)?;
        let mut ctx = SearchContext::new();
        let limit = Duration::from_millis(ms.max(1));
        let mut time = TimeManager::new(Some(limit));
        self.tt.new_search();
        let start = std::time::Instant::now();
        let result =
            iterative_deepening(&mut board, &self.tables, 64, &self.tt, &mut ctx, &mut time, 0, false);
        let ms_spent = start.elapsed().as_millis();
        let mv = result
            .best_move
            .or_else(|| first_legal_move(&mut board, &self.tables));
        Ok((
            mv.map(|m| m.to_uci()).unwrap_or_else(|| "0000".to_string()),
            result.depth_reached.max(0),
            ms_spent,
        ))
    }

    /// `best_move_parallel(fen, depth, threads)` -- Lazy-SMP fixed-depth search.
    pub fn best_move_parallel(
        &self,
        fen: &str,
        depth: i32,
        threads: usize,
    ) -> Result<String, EngineError> {
        let depth = depth.clamp(1, 64);
        let mut board = parse_fen(fen)?;
        let result = search_parallel(&board, &self.tables, depth, None, threads.max(1), &self.tt);
        let mv = result
            .best_move
            .or_else(|| first_legal_move(&mut board, &self.tables));
        Ok(mv.map(|m| m.to_uci()).unwrap_or_else(|| "0000".to_string()))
    }

    /// `best_move_parallel_timed(fen, ms, threads)`.
    pub fn best_move_parallel_timed(
        &self,
        fen: &str,
        ms: u64,
        threads: usize,
    ) -> Result<(String, i32, u128), EngineError> {
        let mut board = parse_fen(fen)?;
        let limit = Duration::from_millis(ms.max(1));
        let result = search_parallel(
            &board,
            &self.tables,
            64,
            Some(limit),
            threads.max(1),
            &self.tt,
        );
        let mv = result
            .best_move
            .or_else(|| first_legal_move(&mut board, &self.tables));
        Ok((
            mv.map(|m| m.to_uci()).unwrap_or_else(|| "0000".to_string()),
            result.depth_reached.max(0),
            result.ms_spent,
        ))
    }
}
