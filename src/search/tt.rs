//! Transposition table.
//!
//! Entries are packed into a single 64-bit word and stored alongside a
//! second word holding `key ^ data`. A reader recomputes the key from the
//! two words and only trusts the entry if it matches the probe key. This
//! is the classic lockless hashing trick used to share one table across
//! search threads without a lock: a torn write (two threads hitting the
//! same bucket at once) produces a `key`/`data` pair that fails the check
//! and is silently discarded rather than corrupting the search.
//!
//! Move fields stored in the TT are not trusted blindly either -- callers
//! must re-validate the reconstructed move against the current board
//! (pseudo-legality + legality) before playing it, since a hash collision
//! can still hand back a well-formed move for the wrong position.

use crate::board::Piece;
use crate::moves::types::Move;
use crate::square::Square;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

pub const MATE_THRESHOLD: i32 = 30000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Exact = 0,
    LowerBound = 1, // Beta cutoff (failed high)
    UpperBound = 2, // Alpha cutoff (failed low)
}

/// Decoded view of a transposition-table slot.
#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub bound: u8,
    pub generation: u8,
}

// --- bit layout of the packed `data` word -----------------------------
// [0..8)   depth
// [8..10)  bound
// [10..18) generation
// [18..34) score (i16 bit pattern)
// [34)     has_move
// [35..41) from
// [41..47) to
// [47..50) piece
// [50..53) promotion (0 = none, else Piece+1)
// [53..57) flags
const DEPTH_SHIFT: u32 = 0;
const BOUND_SHIFT: u32 = 8;
const GEN_SHIFT: u32 = 10;
const SCORE_SHIFT: u32 = 18;
const HAS_MOVE_SHIFT: u32 = 34;
const FROM_SHIFT: u32 = 35;
const TO_SHIFT: u32 = 41;
const PIECE_SHIFT: u32 = 47;
const PROMO_SHIFT: u32 = 50;
const FLAGS_SHIFT: u32 = 53;

fn piece_to_bits(p: Piece) -> u64 {
    p as u64
}

fn piece_from_bits(bits: u64) -> Piece {
    match bits & 0b111 {
        0 => Piece::Pawn,
        1 => Piece::Knight,
        2 => Piece::Bishop,
        3 => Piece::Rook,
        4 => Piece::Queen,
        _ => Piece::King,
    }
}

fn promo_to_bits(p: Option<Piece>) -> u64 {
    match p {
        None => 0,
        Some(Piece::Knight) => 1,
        Some(Piece::Bishop) => 2,
        Some(Piece::Rook) => 3,
        Some(Piece::Queen) => 4,
        Some(_) => 0,
    }
}

fn promo_from_bits(bits: u64) -> Option<Piece> {
    match bits & 0b111 {
        1 => Some(Piece::Knight),
        2 => Some(Piece::Bishop),
        3 => Some(Piece::Rook),
        4 => Some(Piece::Queen),
        _ => None,
    }
}

fn encode(mv: Option<Move>, score: i32, depth: u8, bound: u8, generation: u8) -> u64 {
    let score_i16 = score.clamp(-32000, 32000) as i16;
    let mut word: u64 = 0;
    word |= (depth as u64) << DEPTH_SHIFT;
    word |= ((bound & 0b11) as u64) << BOUND_SHIFT;
    word |= (generation as u64) << GEN_SHIFT;
    word |= ((score_i16 as u16) as u64) << SCORE_SHIFT;

    if let Some(mv) = mv {
        word |= 1u64 << HAS_MOVE_SHIFT;
        word |= (mv.from.index() as u64) << FROM_SHIFT;
        word |= (mv.to.index() as u64) << TO_SHIFT;
        word |= piece_to_bits(mv.piece) << PIECE_SHIFT;
        word |= promo_to_bits(mv.promotion) << PROMO_SHIFT;
        word |= (mv.flags as u64) << FLAGS_SHIFT;
    }

    word
}

fn decode(word: u64) -> TTEntry {
    let depth = ((word >> DEPTH_SHIFT) & 0xFF) as u8;
    let bound = ((word >> BOUND_SHIFT) & 0b11) as u8;
    let generation = ((word >> GEN_SHIFT) & 0xFF) as u8;
    let score = (((word >> SCORE_SHIFT) & 0xFFFF) as u16) as i16 as i32;

    let best_move = if (word >> HAS_MOVE_SHIFT) & 1 != 0 {
        let from = Square::from_index(((word >> FROM_SHIFT) & 0x3F) as u8);
        let to = Square::from_index(((word >> TO_SHIFT) & 0x3F) as u8);
        let piece = piece_from_bits(word >> PIECE_SHIFT);
        let promotion = promo_from_bits(word >> PROMO_SHIFT);
        let flags = ((word >> FLAGS_SHIFT) & 0xF) as u8;
        Some(Move {
            from,
            to,
            piece,
            promotion,
            flags,
        })
    } else {
        None
    };

    TTEntry {
        best_move,
        score,
        depth,
        bound,
        generation,
    }
}

struct Slot {
    /// `key ^ data`, written atomically alongside `data`.
    check: AtomicU64,
    data: AtomicU64,
}

/// Shared, lock-free transposition table.
///
/// Safe to probe and store from multiple threads concurrently (Lazy-SMP
/// workers all share one instance via `Arc`). Individual word reads/writes
/// never race in the data-race sense (each word is a single atomic), but a
/// probe racing a store to the same bucket may observe a torn combination
/// and will reject it via the `check` word instead of returning garbage.
pub struct TranspositionTable {
    slots: Vec<Slot>,
    mask: usize,
    generation: AtomicU8,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Slot>();
        let num_entries = ((size_mb.max(1)) * 1024 * 1024) / entry_size;

        let mut capacity = 1usize;
        while capacity * 2 <= num_entries.max(1) {
            capacity *= 2;
        }

        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                check: AtomicU64::new(0),
                data: AtomicU64::new(0),
            });
        }

        Self {
            slots,
            mask: capacity - 1,
            generation: AtomicU8::new(0),
        }
    }

    /// Resize and clear the table. Callers must ensure no search is
    /// concurrently in flight; this is never called mid-search (see
    /// engine-level `set_hash_size`).
    pub fn resize(&mut self, size_mb: usize) {
        *self = TranspositionTable::new(size_mb);
    }

    /// Begin a new search: bumps the replacement-priority generation.
    /// Older entries become preferentially replaceable without a full
    /// clear, so results from the previous move keep benefiting the tree.
    pub fn new_search(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot.check.get_mut() = 0;
            *slot.data.get_mut() = 0;
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn save(&self, key: u64, mv: Option<Move>, score: i32, depth: u8, bound: u8, _ply: i32) {
        let idx = self.index(key);
        let slot = &self.slots[idx];

        let generation = self.generation.load(Ordering::Relaxed);

        // Replacement: always accept a fresh generation or deeper search;
        // otherwise prefer keeping the existing entry.
        let existing = slot.data.load(Ordering::Relaxed);
        if existing != 0 {
            let prev_check = slot.check.load(Ordering::Relaxed);
            if prev_check ^ existing == key {
                let prev = decode(existing);
                if prev.generation == generation && depth < prev.depth {
                    return;
                }
            }
        }

        let mv = mv.or_else(|| {
            let prev_check = slot.check.load(Ordering::Relaxed);
            if prev_check ^ existing == key {
                decode(existing).best_move
            } else {
                None
            }
        });

        let data = encode(mv, score, depth, bound, generation);
        slot.data.store(data, Ordering::Relaxed);
        slot.check.store(key ^ data, Ordering::Relaxed);
    }

    pub fn probe(
        &self,
        key: u64,
        _depth: u8,
        _alpha: i32,
        _beta: i32,
        _ply: i32,
    ) -> Option<(Option<Move>, i32, u8, u8)> {
        let idx = self.index(key);
        let slot = &self.slots[idx];

        let data = slot.data.load(Ordering::Relaxed);
        let check = slot.check.load(Ordering::Relaxed);

        if data == 0 && check == 0 {
            return None;
        }

        if check ^ data != key {
            return None;
        }

        let entry = decode(data);
        Some((entry.best_move, entry.score, entry.depth, entry.bound))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
