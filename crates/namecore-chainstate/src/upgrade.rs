//! Detection and migration of the legacy per-transaction coin layout.

use crate::coin::{LegacyCoins, legacy_key_to_txid, outpoint_to_key};
use crate::storage::{CoinsNameView, prefix_read_options};
use crate::{Error, Result, keys};
use rocksdb::{DB, WriteBatch};

/// Whether the database holds no keys at all.
pub(crate) fn is_empty(db: &DB) -> Result<bool> {
    let mut iter = db.raw_iterator();
    iter.seek_to_first();
    let empty = !iter.valid();
    iter.status()?;
    Ok(empty)
}

fn stored_version(db: &DB) -> Result<Option<u32>> {
    match db.get_pinned(keys::VERSION)? {
        Some(bytes) => {
            let bytes: [u8; 4] = bytes.as_ref().try_into().map_err(|_| {
                Error::Corrupted(format!("schema version of {} bytes", bytes.len()))
            })?;
            Ok(Some(u32::from_le_bytes(bytes)))
        }
        None => Ok(None),
    }
}

fn has_legacy_coins(db: &DB) -> Result<bool> {
    let prefix = [keys::LEGACY_COINS];
    let mut iter = db.raw_iterator_opt(prefix_read_options(&prefix));
    iter.seek(prefix);
    let found = iter.valid();
    iter.status()?;
    Ok(found)
}

/// Whether a non-empty database must be upgraded before use.
pub(crate) fn detect(db: &DB) -> Result<bool> {
    if has_legacy_coins(db)? {
        return Ok(true);
    }
    Ok(stored_version(db)?.is_none_or(|version| version < keys::CURRENT_VERSION))
}

impl CoinsNameView {
    /// Convert legacy per-transaction coin records into per-output coins and
    /// stamp the current schema version.
    ///
    /// Records are converted in write batches of about `batch_write_bytes`.
    /// Every batch deletes the records it converted, so an interrupted
    /// upgrade resumes where it stopped. `interruption_point` is polled
    /// before each batch and cancels the upgrade by returning an error.
    pub fn upgrade(&mut self, interruption_point: &dyn Fn() -> Result<()>) -> Result<()> {
        if !self.needs_upgrade {
            return Ok(());
        }

        tracing::info!("Upgrading chain state database, this may take a while");

        let prefix = [keys::LEGACY_COINS];
        let mut converted = 0u64;

        loop {
            interruption_point()?;

            let mut batch = WriteBatch::default();
            let mut iter = self.db.raw_iterator_opt(prefix_read_options(&prefix));
            iter.seek(prefix);

            while iter.valid() {
                let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
                    break;
                };
                let txid = legacy_key_to_txid(key)
                    .ok_or_else(|| Error::Corrupted(format!("legacy coins key {key:02x?}")))?;
                let legacy: LegacyCoins = bincode::deserialize(value)?;

                for (outpoint, coin) in legacy.into_coins(txid) {
                    batch.put(outpoint_to_key(&outpoint), coin.encode_for_storage());
                }
                batch.delete(key);
                converted += 1;

                iter.next();
                if batch.size_in_bytes() >= self.options.batch_write_bytes {
                    break;
                }
            }
            iter.status()?;
            let finished = !iter.valid();
            drop(iter);

            self.db.write(batch)?;

            if finished {
                break;
            }
            tracing::info!("Upgraded {converted} legacy coin records");
        }

        self.db
            .put(keys::VERSION, keys::CURRENT_VERSION.to_le_bytes())?;
        self.needs_upgrade = false;

        tracing::info!("Chain state upgrade complete, converted {converted} legacy coin records");

        Ok(())
    }
}
