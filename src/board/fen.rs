// src/board/fen.rs
// FEN (Forsyth-Edwards Notation) parsing and formatting.

use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;

impl Board {
    /// Parses `fen` (six space-separated fields; halfmove/fullmove default
    /// to 0/1 when absent) and overwrites every field of `self` in place.
    /// On any malformed input, `self` is left unspecified and an `Err`
    /// describing the problem is returned.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("FEN missing piece placement field")?;
        let side = fields.next().unwrap_or("w");
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut piece_bb = [[0u64; 6]; 2];

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "expected 8 ranks in piece placement, found {}",
                ranks.len()
            ));
        }

        // FEN lists rank 8 first, rank 1 last; square indices are rank-major
        // from rank 1, so rank index 7 - i corresponds to the i-th FEN rank.
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file: u8 = 0;

            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(format!("invalid empty-square count '{c}' in rank {rank_str}"));
                    }
                    file += skip as u8;
                } else {
                    if !c.is_ascii() {
                        return Err(format!("invalid piece glyph '{c}' in rank {rank_str}"));
                    }
                    let (piece, color) = CHAR_TO_PC[c as usize]
                        .ok_or_else(|| format!("invalid piece glyph '{c}' in rank {rank_str}"))?;
                    if file >= 8 {
                        return Err(format!("rank '{rank_str}' has more than 8 files"));
                    }
                    let sq = Square::from_file_rank(file, rank);
                    piece_bb[color as usize][piece as usize] |= 1u64 << sq.index();
                    file += 1;
                }
            }

            if file != 8 {
                return Err(format!("rank '{rank_str}' does not sum to 8 files"));
            }
        }

        let side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side to move '{other}'")),
        };

        let mut castling_rights: u8 = 0;
        if castling != "-" {
            for c in castling.chars() {
                castling_rights |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(format!("invalid castling right '{other}'")),
                };
            }
        }

        let en_passant = if ep == "-" {
            None
        } else {
            let mut chars = ep.chars();
            let file_ch = chars.next().ok_or("empty en passant field")?;
            let rank_ch = chars
                .next()
                .ok_or_else(|| format!("en passant square '{ep}' missing rank"))?;
            if chars.next().is_some() {
                return Err(format!("en passant square '{ep}' too long"));
            }
            if !('a'..='h').contains(&file_ch) || !('1'..='8').contains(&rank_ch) {
                return Err(format!("invalid en passant square '{ep}'"));
            }
            let file = file_ch as u8 - b'a';
            let rank = rank_ch as u8 - b'1';
            Some(Square::from_file_rank(file, rank))
        };

        let halfmove_clock: u32 = halfmove
            .parse()
            .map_err(|_| format!("invalid halfmove clock '{halfmove}'"))?;
        let fullmove_number: u32 = fullmove
            .parse()
            .map_err(|_| format!("invalid fullmove number '{fullmove}'"))?;
        if fullmove_number == 0 {
            return Err("fullmove number must be >= 1".to_string());
        }

        *self = Board::new_empty();
        for &color in &[Color::White, Color::Black] {
            for &piece in &[
                Piece::Pawn,
                Piece::Knight,
                Piece::Bishop,
                Piece::Rook,
                Piece::Queen,
                Piece::King,
            ] {
                let bb = piece_bb[color as usize][piece as usize];
                if bb != 0 {
                    self.set_bb(color, piece, bb);
                }
            }
        }

        self.side_to_move = side_to_move;
        self.castling_rights = castling_rights;
        self.en_passant = en_passant;
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
        self.history.clear();
        self.refresh_zobrist();

        if self.pieces(Piece::King, Color::White) == 0 {
            return Err("FEN has no white king".to_string());
        }
        if self.pieces(Piece::King, Color::Black) == 0 {
            return Err("FEN has no black king".to_string());
        }

        Ok(())
    }

    /// Formats `self` as a FEN string. Round-trips through `set_fen`:
    /// `Board::from_str(&b.to_fen()).zobrist == b.zobrist` for any `b`.
    pub fn to_fen(&self) -> String {
        let mut placement = String::with_capacity(64);
        for rank in (0..8u8).rev() {
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    None => empty_run += 1,
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        placement.push(PC_TO_CHAR[idx]);
                    }
                }
            }
            if empty_run > 0 {
                placement.push((b'0' + empty_run) as char);
            }
            if rank != 0 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.has_castling(CASTLE_WK) {
            castling.push('K');
        }
        if self.has_castling(CASTLE_WQ) {
            castling.push('Q');
        }
        if self.has_castling(CASTLE_BK) {
            castling.push('k');
        }
        if self.has_castling(CASTLE_BQ) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{placement} {side} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn start_position_round_trips() {
        let b = Board::new();
        let fen = b.to_fen();
        assert_eq!(
            fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        let b2 = Board::from_str(&fen).expect("valid FEN");
        assert_eq!(b.zobrist, b2.zobrist);
        assert_eq!(b2.to_fen(), fen);
    }

    #[test]
    fn missing_halfmove_and_fullmove_default() {
        let mut b = Board::new_empty();
        b.set_fen("4k3/8/8/8/8/8/8/4K3 w - -").expect("valid FEN");
        assert_eq!(b.halfmove_clock, 0);
        assert_eq!(b.fullmove_number, 1);
    }

    #[test]
    fn en_passant_square_round_trips() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let b = Board::from_str(fen).expect("valid FEN");
        assert_eq!(b.en_passant.map(|s| s.to_string()), Some("e3".to_string()));
        assert_eq!(b.to_fen(), fen);
    }

    #[test]
    fn rejects_bad_rank_count() {
        let mut b = Board::new_empty();
        let err = b
            .set_fen("8/8/8/8/8/8/8 w - - 0 1")
            .expect_err("only 7 ranks should fail");
        assert!(err.contains("8 ranks"));
    }

    #[test]
    fn rejects_missing_king() {
        let mut b = Board::new_empty();
        let err = b
            .set_fen("8/8/8/8/8/8/8/4K3 w - - 0 1")
            .expect_err("missing black king should fail");
        assert!(err.contains("black king"));
    }

    #[test]
    fn kiwipete_round_trips() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let b = Board::from_str(fen).expect("valid FEN");
        assert_eq!(b.to_fen(), fen);
        assert_eq!(b.zobrist, b.compute_zobrist_full());
    }
}
