// Builds magic bitboard tables for rooks and bishops from scratch.

use rand::{RngCore, SeedableRng, rngs::StdRng};

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};

#[cfg(feature = "deterministic_magic")]
const MAGIC_SEED: u64 = 0xC0FF_EE15_5EED_0042;

/// How the search RNG is seeded. `Fixed` gives reproducible tables (used by tests
/// and whenever the `deterministic_magic` feature is enabled); `Random` draws
/// fresh entropy each time the engine starts.
#[derive(Debug, Clone, Copy)]
pub enum MagicTableSeed {
    Random,
    Fixed(u64),
}

fn make_rng(seed: MagicTableSeed) -> StdRng {
    match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => {
            #[cfg(feature = "deterministic_magic")]
            {
                StdRng::seed_from_u64(MAGIC_SEED)
            }
            #[cfg(not(feature = "deterministic_magic"))]
            {
                let mut seed_bytes = [0u8; 32];
                rand::rng().fill_bytes(&mut seed_bytes);
                StdRng::from_seed(seed_bytes)
            }
        }
    }
}

fn rook_relevant_mask(square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }

    mask
}

fn bishop_relevant_mask(square: usize) -> u64 {
    let rank = square as isize / 8;
    let file = square as isize % 8;
    let mut mask = 0u64;

    let mut r = rank + 1;
    let mut f = file + 1;
    while r <= 6 && f <= 6 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    r = rank + 1;
    f = file - 1;
    while r <= 6 && f >= 1 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    r = rank - 1;
    f = file + 1;
    while r >= 1 && f <= 6 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f += 1;
    }
    r = rank - 1;
    f = file - 1;
    while r >= 1 && f >= 1 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }

    mask
}

/// Enumerates every subset of the bits set in `mask`, via the Carry-Rippler trick.
fn blocker_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones().min(20));
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_entry<R: RngCore>(
    square: usize,
    mask: u64,
    attack_fn: fn(usize, u64) -> u64,
    rng: &mut R,
) -> Result<MagicEntry, String> {
    let shift = 64 - mask.count_ones();
    let blockers = blocker_subsets(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| attack_fn(square, b)).collect();

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let table_size = 1usize << mask.count_ones();
    let mut table = vec![0u64; table_size];
    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = ((blocker.wrapping_mul(magic)) >> shift) as usize;
        table[index] = attack;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

/// Generates fresh rook and bishop magic tables for all 64 squares.
pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = make_rng(seed);

    let mut rook_entries = Vec::with_capacity(64);
    for square in 0..64 {
        let mask = rook_relevant_mask(square);
        rook_entries.push(build_entry(square, mask, rook_attacks_per_square, &mut rng)?);
    }

    let mut bishop_entries = Vec::with_capacity(64);
    for square in 0..64 {
        let mask = bishop_relevant_mask(square);
        bishop_entries.push(build_entry(
            square,
            mask,
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_mask_excludes_board_edges() {
        let mask = rook_relevant_mask(0); // a1
        assert_eq!(mask & 0x8080_8080_8080_8080, 0); // file h excluded
        assert_eq!(mask & 0xFF00_0000_0000_0000, 0); // rank 8 excluded
    }

    #[test]
    fn bishop_mask_excludes_board_edges() {
        let mask = bishop_relevant_mask(27); // d4
        assert_eq!(mask & 0x0101_0101_0101_0101, 0); // file a excluded
        assert_eq!(mask & 0xFF00_0000_0000_0000, 0); // rank 8 excluded
    }

    #[test]
    fn blocker_subsets_covers_every_combination() {
        let mask = 0b1011u64;
        let subsets = blocker_subsets(mask);
        assert_eq!(subsets.len(), 1 << mask.count_ones());
        for s in &subsets {
            assert_eq!(s & !mask, 0);
        }
    }

    #[test]
    fn fixed_seed_tables_are_deterministic() {
        let a = generate_magic_tables(MagicTableSeed::Fixed(0x45)).unwrap();
        let b = generate_magic_tables(MagicTableSeed::Fixed(0x45)).unwrap();
        assert_eq!(a.rook.entries[27].magic, b.rook.entries[27].magic);
        assert_eq!(a.bishop.entries[27].magic, b.bishop.entries[27].magic);
    }
}
