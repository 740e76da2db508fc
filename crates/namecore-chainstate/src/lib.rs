//! Chain state storage for namecore: the UTXO set together with the name
//! registry, kept in a single RocksDB keyspace.
//!
//! ## Architecture
//!
//! - **Coins**: one entry per unspent output, keyed by outpoint
//! - **Names**: the current [`NameRecord`] of every registered name, its
//!   optional append-only [`NameHistory`], and a height index used to find
//!   names that expire at a given height
//! - **Tip markers**: the best block, and the head blocks recorded while a
//!   flush is in progress
//!
//! ## Commits
//!
//! All changes produced by a block are handed to
//! [`CoinsNameView::batch_write`] as a [`CoinsDiff`] and a [`NameDiff`] and
//! land in one atomic RocksDB write batch. Readers never observe a partial
//! combination of coins, names, height index and best block.
//!
//! ## Locking
//!
//! The view is single-writer, multiple-reader. Methods that mutate take
//! `&mut self` (or are documented to require the caller's chain-state lock),
//! reads take `&self` and only ever see committed states.

mod coin;
mod diff;
mod error;
mod fault;
mod name;
mod options;
mod storage;
mod upgrade;
mod validate;

pub use coin::Coin;
pub use diff::{CoinsDiff, NameDiff};
pub use error::Error;
pub use fault::{FaultPoint, NoFault, SimulatedCrash};
pub use name::{Name, NameHistory, NameRecord};
pub use options::{CoinsViewOptions, DEFAULT_BATCH_WRITE_BYTES, DbParams};
pub use storage::{ChainstateCursor, ChainstateEntry, CoinsNameView, NameIterator};
pub use validate::ChainState;

/// Result type for chain state operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Key prefixes of the single ordered keyspace.
mod keys {
    /// Coin of one output.
    /// Key: 'C' || txid (32) || vout (u32, big-endian)
    /// Value: Coin (serialized)
    pub const COIN: u8 = b'C';

    /// Legacy record holding every unspent output of a transaction.
    /// Key: 'c' || txid (32)
    /// Value: LegacyCoins (serialized)
    pub const LEGACY_COINS: u8 = b'c';

    /// Current record of a name.
    /// Key: 'n' || name
    /// Value: NameRecord (serialized)
    pub const NAME: u8 = b'n';

    /// Past records of a name, oldest first.
    /// Key: 'h' || name
    /// Value: NameHistory (serialized)
    pub const NAME_HISTORY: u8 = b'h';

    /// Height index entry.
    /// Key: 'x' || height (u32, big-endian) || name
    /// Value: empty
    pub const NAME_HEIGHT: u8 = b'x';

    /// Hash of the block the stored state corresponds to.
    pub const BEST_BLOCK: &[u8] = b"B";

    /// `[new, old]` best blocks of a flush that has not completed.
    pub const HEAD_BLOCKS: &[u8] = b"H";

    /// Schema version of the store.
    pub const VERSION: &[u8] = b"V";

    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Returns `prefix || body`.
    pub fn prefixed(prefix: u8, body: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + body.len());
        key.push(prefix);
        key.extend_from_slice(body);
        key
    }

    /// Returns `'x' || height || name`.
    pub fn height_index(height: u32, name: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(5 + name.len());
        key.push(NAME_HEIGHT);
        key.extend_from_slice(&height.to_be_bytes());
        key.extend_from_slice(name);
        key
    }

    /// Splits an `'x'` key into height and name.
    pub fn parse_height_index(key: &[u8]) -> Option<(u32, &[u8])> {
        let rest = key.strip_prefix(&[NAME_HEIGHT])?;
        if rest.len() < 4 {
            return None;
        }
        let (height, name) = rest.split_at(4);
        Some((u32::from_be_bytes(height.try_into().ok()?), name))
    }

    /// Exclusive upper bound of all keys starting with `prefix`.
    ///
    /// Returns `None` when no such bound exists (all bytes are 0xff).
    pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
        let mut end = prefix.to_vec();
        while let Some(last) = end.pop() {
            if last < u8::MAX {
                end.push(last + 1);
                return Some(end);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::keys;

    #[test]
    fn test_height_index_key() {
        let key = keys::height_index(258, b"d/foo");
        assert_eq!(&key[..5], &[b'x', 0, 0, 1, 2]);
        assert_eq!(keys::parse_height_index(&key), Some((258, &b"d/foo"[..])));
        assert_eq!(keys::parse_height_index(b"x\x00\x01"), None);
        assert_eq!(keys::parse_height_index(b"n\x00\x00\x00\x01"), None);

        // Heights sort numerically.
        assert!(keys::height_index(255, b"z") < keys::height_index(256, b"a"));
    }

    #[test]
    fn test_prefix_end() {
        assert_eq!(keys::prefix_end(b"n"), Some(b"o".to_vec()));
        assert_eq!(keys::prefix_end(&[b'x', 0, 0, 0xff]), Some(vec![b'x', 0, 1]));
        assert_eq!(keys::prefix_end(&[0xff, 0xff]), None);
    }
}
