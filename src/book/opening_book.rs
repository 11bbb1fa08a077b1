//! Opening book: a JSON map from a trimmed FEN (piece placement, side to
//! move, castling rights, en passant square — move counters dropped) to a
//! weighted list of candidate moves.
//!
//! The format mirrors the original engine's `Data/opening_book.json`
//! rather than a binary format, since positions are looked up by a FEN
//! prefix, not a dedicated book hash.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::board::Board;
use crate::moves::execute::generate_legal;
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;

#[derive(Debug, Clone, Deserialize)]
struct BookMove {
    uci: String,
    weight: u32,
}

pub struct OpeningBook {
    positions: HashMap<String, Vec<BookMove>>,
}

impl OpeningBook {
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Parses a book already held in memory (e.g. embedded via `include_str!`).
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        let positions: HashMap<String, Vec<BookMove>> = serde_json::from_str(text)?;
        Ok(Self { positions })
    }

    /// The board, turn, castling, and en passant fields of a FEN, with the
    /// halfmove/fullmove counters dropped so transpositions with different
    /// move counts share a book entry.
    fn position_key(board: &Board) -> String {
        board
            .to_fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Looks up the current position and, if found, picks a move weighted
    /// by its recorded popularity. Candidate UCI strings are resolved
    /// against the position's actual legal moves, so a stale or malformed
    /// book entry never produces an illegal move.
    pub fn probe(&self, board: &Board, tables: &MagicTables) -> Option<Move> {
        let key = Self::position_key(board);
        let candidates = self.positions.get(&key)?;
        if candidates.is_empty() {
            return None;
        }

        let mut board_copy = board.clone();
        let mut legal = Vec::with_capacity(64);
        let mut scratch = Vec::with_capacity(256);
        generate_legal(&mut board_copy, tables, &mut legal, &mut scratch);

        let total_weight: u32 = candidates.iter().map(|m| m.weight).sum();
        if total_weight == 0 {
            return candidates
                .iter()
                .find_map(|m| Self::resolve(&legal, &m.uci));
        }

        let mut pick = rand::rng().random_range(0..total_weight);
        for m in candidates {
            if pick < m.weight {
                return Self::resolve(&legal, &m.uci);
            }
            pick -= m.weight;
        }
        None
    }

    fn resolve(legal: &[Move], uci: &str) -> Option<Move> {
        legal.iter().copied().find(|mv| mv.to_uci() == uci)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;
    use std::str::FromStr;

    const START_KEY: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";

    #[test]
    fn probe_returns_none_for_unknown_position() {
        let book = OpeningBook::from_json_str("{}").expect("valid json");
        let board = Board::new();
        let tables = load_magic_tables();
        assert!(book.probe(&board, &tables).is_none());
    }

    #[test]
    fn probe_picks_a_legal_move_from_a_known_position() {
        let json = format!(
            r#"{{"{START_KEY}": [{{"uci": "e2e4", "weight": 10}}, {{"uci": "d2d4", "weight": 5}}]}}"#
        );
        let book = OpeningBook::from_json_str(&json).expect("valid json");
        let board = Board::new();
        let tables = load_magic_tables();

        for _ in 0..20 {
            let mv = book.probe(&board, &tables).expect("book hit");
            assert!(mv.to_uci() == "e2e4" || mv.to_uci() == "d2d4");
        }
    }

    #[test]
    fn probe_ignores_a_candidate_that_is_not_actually_legal() {
        let json =
            format!(r#"{{"{START_KEY}": [{{"uci": "e2e5", "weight": 1}}]}}"#);
        let book = OpeningBook::from_json_str(&json).expect("valid json");
        let board = Board::new();
        let tables = load_magic_tables();
        assert!(book.probe(&board, &tables).is_none());
    }

    #[test]
    fn zero_weight_entries_fall_back_to_first_legal_candidate() {
        let json = format!(r#"{{"{START_KEY}": [{{"uci": "e2e4", "weight": 0}}]}}"#);
        let book = OpeningBook::from_json_str(&json).expect("valid json");
        let board = Board::new();
        let tables = load_magic_tables();
        let mv = book.probe(&board, &tables).expect("book hit");
        assert_eq!(mv.to_uci(), "e2e4");
    }

    #[test]
    fn position_key_drops_move_counters() {
        let a = Board::new();
        let mut b = Board::new();
        b.set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 7 12")
            .expect("valid fen");
        assert_eq!(OpeningBook::position_key(&a), OpeningBook::position_key(&b));
    }

    #[test]
    fn start_position_key_matches_expected_format() {
        let board = Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("valid fen");
        assert_eq!(OpeningBook::position_key(&board), START_KEY);
    }
}
