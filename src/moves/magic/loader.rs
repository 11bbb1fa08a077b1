// Produces the shared magic bitboard tables, generating them once and reusing
// the result for the lifetime of the process.

use once_cell::sync::OnceCell;

use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;

#[cfg(feature = "deterministic_magic")]
const MAGIC_SEED: u64 = 0xC0FF_EE15_5EED_0042;

#[cfg(feature = "load_magic")]
const MAGIC_TABLE_PATH: &str = "magic_tables.bin";

fn build_tables() -> MagicTables {
    #[cfg(feature = "deterministic_magic")]
    let seed = MagicTableSeed::Fixed(MAGIC_SEED);
    #[cfg(not(feature = "deterministic_magic"))]
    let seed = MagicTableSeed::Random;

    generate_magic_tables(seed).expect("magic number search exhausted its attempt budget")
}

#[cfg(feature = "load_magic")]
fn load_from_disk() -> Option<MagicTables> {
    let bytes = std::fs::read(MAGIC_TABLE_PATH).ok()?;
    bincode::deserialize(&bytes).ok()
}

#[cfg(feature = "load_magic")]
fn save_to_disk(tables: &MagicTables) {
    if let Ok(bytes) = bincode::serialize(tables) {
        let _ = std::fs::write(MAGIC_TABLE_PATH, bytes);
    }
}

fn tables() -> &'static MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(|| {
        #[cfg(feature = "load_magic")]
        {
            if let Some(loaded) = load_from_disk() {
                return loaded;
            }
            let fresh = build_tables();
            save_to_disk(&fresh);
            fresh
        }
        #[cfg(not(feature = "load_magic"))]
        {
            build_tables()
        }
    })
}

/// Returns the engine's magic bitboard tables, computing them on first use.
pub fn load_magic_tables() -> MagicTables {
    tables().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_loads_agree() {
        let a = load_magic_tables();
        let b = load_magic_tables();
        assert_eq!(a.rook.entries[27].magic, b.rook.entries[27].magic);
        assert_eq!(a.bishop.entries[27].magic, b.bishop.entries[27].magic);
    }
}
