//! Coins and name registry storage implementation using RocksDB.

use crate::coin::{Coin, key_to_outpoint, outpoint_to_key};
use crate::diff::{CoinsDiff, NameDiff};
use crate::fault::{FaultPoint, SimulatedCrash};
use crate::name::{Name, NameHistory, NameRecord};
use crate::options::{CoinsViewOptions, DbParams};
use crate::{Error, Result, keys, upgrade};
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint};
use rocksdb::{
    BlockBasedOptions, Cache, DB, DBRawIterator, Env, Options, ReadOptions, WriteBatch,
    WriteOptions,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Parse a stored block hash.
pub(crate) fn decode_block_hash(bytes: &[u8]) -> Result<BlockHash> {
    BlockHash::from_slice(bytes)
        .map_err(|_| Error::Corrupted(format!("block hash of {} bytes", bytes.len())))
}

/// Read options restricting iteration to keys starting with `prefix`.
pub(crate) fn prefix_read_options(prefix: &[u8]) -> ReadOptions {
    let mut read_opts = ReadOptions::default();
    read_opts.set_iterate_lower_bound(prefix.to_vec());
    if let Some(end) = keys::prefix_end(prefix) {
        read_opts.set_iterate_upper_bound(end);
    }
    read_opts
}

fn synced_write() -> WriteOptions {
    let mut write_opts = WriteOptions::default();
    write_opts.set_sync(true);
    write_opts
}

/// The persistent coins and name registry view.
///
/// Reads may run concurrently with each other and with a commit; they always
/// observe a fully committed state. Commits must be serialized by the caller,
/// which is expected to hold its chain-state lock around
/// [`batch_write`](Self::batch_write).
pub struct CoinsNameView {
    pub(crate) db: DB,
    block_cache: Cache,
    cache_bytes: usize,
    path: Option<PathBuf>,
    pub(crate) options: CoinsViewOptions,
    fault_point: Box<dyn FaultPoint>,
    pub(crate) needs_upgrade: bool,
}

impl CoinsNameView {
    /// Open or create the view, with crash simulation configured from
    /// `options.simulate_crash_ratio`.
    pub fn open(params: &DbParams, options: CoinsViewOptions) -> Result<Self> {
        let fault_point = SimulatedCrash::from_ratio(options.simulate_crash_ratio);
        Self::open_with_fault_point(params, options, fault_point)
    }

    /// Open or create the view with an explicit fault point.
    pub fn open_with_fault_point(
        params: &DbParams,
        options: CoinsViewOptions,
        fault_point: Box<dyn FaultPoint>,
    ) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.set_write_buffer_size(params.write_buffer_bytes());
        db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        // Bloom filters for point lookups, shared resizable block cache.
        let block_cache = Cache::new_lru_cache(params.block_cache_bytes());
        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&block_cache);
        db_opts.set_block_based_table_factory(&block_opts);

        let path = if params.memory_only {
            let env = Env::mem_env()?;
            db_opts.set_env(&env);
            None
        } else {
            if params.wipe_data && params.path.exists() {
                tracing::info!("Wiping chain state at {}", params.path.display());
                DB::destroy(&db_opts, &params.path)?;
            }
            Some(params.path.clone())
        };

        let db = DB::open(&db_opts, &params.path)?;

        let needs_upgrade = if upgrade::is_empty(&db)? {
            db.put(keys::VERSION, keys::CURRENT_VERSION.to_le_bytes())?;
            false
        } else {
            upgrade::detect(&db)?
        };

        let view = Self {
            db,
            block_cache,
            cache_bytes: params.cache_bytes,
            path,
            options,
            fault_point,
            needs_upgrade,
        };

        if view.needs_upgrade {
            tracing::warn!("Chain state database uses an old layout and needs to be upgraded");
        } else {
            let head_blocks = view.get_head_blocks()?;
            if let [new, old] = head_blocks.as_slice() {
                tracing::warn!("Found interrupted flush from {old} to {new}");
            }
            tracing::info!(
                "Opened chain state at {}, best block: {}",
                view.path
                    .as_deref()
                    .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string()),
                view.get_best_block()?
            );
        }

        Ok(view)
    }

    /// Create a new in-memory view for testing.
    #[cfg(test)]
    pub(crate) fn open_temp(options: CoinsViewOptions) -> Result<Self> {
        Self::open(&DbParams::in_memory(), options)
    }

    pub(crate) fn ensure_upgraded(&self) -> Result<()> {
        if self.needs_upgrade {
            return Err(Error::NeedsUpgrade);
        }
        Ok(())
    }

    /// Get a coin by outpoint.
    pub fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        self.ensure_upgraded()?;
        self.db
            .get_pinned(outpoint_to_key(outpoint))?
            .map(|bytes| Coin::decode_from_storage(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    /// Check if a coin exists.
    pub fn have_coin(&self, outpoint: &OutPoint) -> Result<bool> {
        self.ensure_upgraded()?;
        Ok(self.db.get_pinned(outpoint_to_key(outpoint))?.is_some())
    }

    /// Hash of the block the stored state corresponds to, all zeros for a
    /// fresh store.
    pub fn get_best_block(&self) -> Result<BlockHash> {
        self.ensure_upgraded()?;
        match self.db.get_pinned(keys::BEST_BLOCK)? {
            Some(bytes) => decode_block_hash(&bytes),
            None => Ok(BlockHash::all_zeros()),
        }
    }

    /// `[new, old]` when the last flush did not complete, empty otherwise.
    pub fn get_head_blocks(&self) -> Result<Vec<BlockHash>> {
        self.ensure_upgraded()?;
        let Some(bytes) = self.db.get_pinned(keys::HEAD_BLOCKS)? else {
            return Ok(Vec::new());
        };
        if bytes.len() != 64 {
            return Err(Error::Corrupted(format!(
                "head blocks marker of {} bytes",
                bytes.len()
            )));
        }
        bytes.chunks_exact(32).map(decode_block_hash).collect()
    }

    /// Current record of a name.
    pub fn get_name(&self, name: &Name) -> Result<Option<NameRecord>> {
        self.ensure_upgraded()?;
        self.db
            .get_pinned(keys::prefixed(keys::NAME, name.as_bytes()))?
            .map(|bytes| NameRecord::decode(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    /// Past records of a name.
    ///
    /// Always `None` when history tracking is disabled. Otherwise `None` for a
    /// name without any history and a non-empty history for all others.
    pub fn get_name_history(&self, name: &Name) -> Result<Option<NameHistory>> {
        self.ensure_upgraded()?;
        if !self.options.name_history {
            return Ok(None);
        }
        Ok(self.read_history(name)?.filter(|history| !history.is_empty()))
    }

    fn read_history(&self, name: &Name) -> Result<Option<NameHistory>> {
        self.db
            .get_pinned(keys::prefixed(keys::NAME_HISTORY, name.as_bytes()))?
            .map(|bytes| NameHistory::decode(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    /// Names whose current record is anchored at `height`.
    pub fn get_names_for_height(&self, height: u32) -> Result<BTreeSet<Name>> {
        self.ensure_upgraded()?;
        let prefix = keys::height_index(height, &[]);
        let mut iter = self.db.raw_iterator_opt(prefix_read_options(&prefix));
        iter.seek(&prefix);

        let mut names = BTreeSet::new();
        while iter.valid() {
            if let Some(key) = iter.key() {
                names.insert(Name::new(&key[prefix.len()..]));
            }
            iter.next();
        }
        iter.status()?;

        Ok(names)
    }

    /// Iterate over all current name records in name order.
    ///
    /// The iterator reads from the point-in-time snapshot taken when it is
    /// created; commits made while it is alive are not visible through it.
    pub fn iterate_names(&self) -> Result<NameIterator<'_>> {
        self.ensure_upgraded()?;
        Ok(NameIterator::new(&self.db))
    }

    /// Ordered cursor over the whole store, for export.
    pub fn cursor(&self) -> Result<ChainstateCursor<'_>> {
        self.ensure_upgraded()?;
        ChainstateCursor::new(&self.db)
    }

    /// Atomically apply a coin diff, a name diff and the new best block.
    ///
    /// Either everything lands or nothing does. Before the write batch is
    /// applied the head blocks `[best_block, previous best block]` are
    /// recorded, and the write batch clears them again, so that an
    /// interrupted commit is visible through
    /// [`get_head_blocks`](Self::get_head_blocks) after reopening.
    ///
    /// The caller must not run two commits concurrently.
    pub fn batch_write(
        &self,
        coins: CoinsDiff,
        best_block: BlockHash,
        names: NameDiff,
    ) -> Result<()> {
        self.ensure_upgraded()?;

        let old_tip = self.get_best_block()?;

        let mut batch = WriteBatch::default();
        let mut progress = Progress::new(self.options.batch_write_bytes);
        let coin_count = coins.len();

        for (outpoint, coin) in coins {
            let key = outpoint_to_key(&outpoint);
            match coin {
                Some(coin) => batch.put(key, coin.encode_for_storage()),
                None => batch.delete(key),
            }
            progress.staged(&batch);
        }

        let NameDiff {
            entries,
            history,
            height_index,
        } = names;
        let name_count = entries.len();

        for (name, record) in entries {
            let key = keys::prefixed(keys::NAME, name.as_bytes());
            match record {
                Some(record) => batch.put(key, record.encode()),
                None => batch.delete(key),
            }
            progress.staged(&batch);
        }

        if self.options.name_history {
            for (name, records) in history {
                let mut stored = self.read_history(&name)?.unwrap_or_default();
                stored.extend(records);
                batch.put(
                    keys::prefixed(keys::NAME_HISTORY, name.as_bytes()),
                    stored.encode(),
                );
                progress.staged(&batch);
            }
        } else if !history.is_empty() {
            tracing::debug!(
                "Name history is disabled, dropping history of {} names",
                history.len()
            );
        }

        for ((height, name), present) in height_index {
            let key = keys::height_index(height, name.as_bytes());
            if present {
                batch.put(key, b"");
            } else {
                batch.delete(key);
            }
            progress.staged(&batch);
        }

        batch.delete(keys::HEAD_BLOCKS);
        batch.put(keys::BEST_BLOCK, best_block.to_byte_array());

        // Nothing is written before the batch is fully staged.
        let mut head_blocks = Vec::with_capacity(64);
        head_blocks.extend_from_slice(best_block.as_ref());
        head_blocks.extend_from_slice(old_tip.as_ref());
        self.db
            .put_opt(keys::HEAD_BLOCKS, head_blocks, &synced_write())?;

        self.fault_point.reached();

        let batch_size = batch.size_in_bytes();
        self.db.write_opt(batch, &synced_write())?;

        tracing::debug!(
            "Committed {coin_count} coins and {name_count} names ({batch_size} bytes), \
             best block: {best_block}"
        );

        Ok(())
    }

    /// Resize the block cache to match a new total cache budget.
    ///
    /// Requires exclusive access, which the caller's chain-state lock
    /// provides.
    pub fn resize_cache(&mut self, new_cache_bytes: usize) {
        self.block_cache.set_capacity(new_cache_bytes / 2);
        self.cache_bytes = new_cache_bytes;
        tracing::info!("Resized chain state cache to {new_cache_bytes} bytes");
    }

    /// Current total cache budget.
    pub fn cache_bytes(&self) -> usize {
        self.cache_bytes
    }

    /// Estimated size of the live data in bytes.
    pub fn estimate_size(&self) -> Result<u64> {
        Ok(self
            .db
            .property_int_value("rocksdb.estimate-live-data-size")?
            .unwrap_or_default())
    }

    /// Database directory, `None` for an in-memory view.
    pub fn storage_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the store must be upgraded before it can be used.
    pub fn needs_upgrade(&self) -> bool {
        self.needs_upgrade
    }

    /// Whether names keep their history.
    pub fn name_history_enabled(&self) -> bool {
        self.options.name_history
    }
}

/// Debug logging of large commits while they are staged.
struct Progress {
    interval: usize,
    next_report: usize,
}

impl Progress {
    fn new(interval: usize) -> Self {
        let interval = interval.max(1);
        Self {
            interval,
            next_report: interval,
        }
    }

    fn staged(&mut self, batch: &WriteBatch) {
        let size = batch.size_in_bytes();
        if size >= self.next_report {
            tracing::debug!("Staged {} MiB of chain state changes", size >> 20);
            self.next_report = size + self.interval;
        }
    }
}

/// Iterator over all current name records.
///
/// Yields `(Name, NameRecord)` pairs in name order.
pub struct NameIterator<'a> {
    iter: DBRawIterator<'a>,
    done: bool,
}

impl<'a> NameIterator<'a> {
    fn new(db: &'a DB) -> Self {
        let prefix = [keys::NAME];
        let mut iter = db.raw_iterator_opt(prefix_read_options(&prefix));
        iter.seek(prefix);
        Self { iter, done: false }
    }

    /// Continue from the first name not less than `start`.
    pub fn seek(&mut self, start: &Name) {
        self.iter.seek(keys::prefixed(keys::NAME, start.as_bytes()));
        self.done = false;
    }
}

impl Iterator for NameIterator<'_> {
    type Item = Result<(Name, NameRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.iter.valid() {
            self.done = true;
            return self.iter.status().err().map(|err| Err(err.into()));
        }

        let item = match (self.iter.key(), self.iter.value()) {
            (Some(key), Some(value)) => NameRecord::decode(value)
                .map(|record| (Name::new(&key[1..]), record))
                .map_err(Into::into),
            _ => Err(Error::Corrupted("name entry without key".to_string())),
        };
        self.iter.next();

        Some(item)
    }
}

/// An entry of the store as seen by [`ChainstateCursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainstateEntry {
    Coin(OutPoint, Coin),
    Name(Name, NameRecord),
    History(Name, NameHistory),
    HeightIndex(u32, Name),
}

/// Ordered cursor over every coin and name entry of one snapshot.
///
/// Tip markers are not yielded; the best block of the snapshot is available
/// through [`best_block`](Self::best_block).
pub struct ChainstateCursor<'a> {
    iter: DBRawIterator<'a>,
    best_block: BlockHash,
    done: bool,
}

impl<'a> ChainstateCursor<'a> {
    fn new(db: &'a DB) -> Result<Self> {
        let mut iter = db.raw_iterator();

        // Read the best block through the iterator so it matches the entries.
        iter.seek(keys::BEST_BLOCK);
        let best_block = match (iter.key(), iter.value()) {
            (Some(key), Some(value)) if key == keys::BEST_BLOCK => decode_block_hash(value)?,
            _ => BlockHash::all_zeros(),
        };
        iter.status()?;
        iter.seek_to_first();

        Ok(Self {
            iter,
            best_block,
            done: false,
        })
    }

    /// Best block of the snapshot the cursor reads from.
    pub fn best_block(&self) -> BlockHash {
        self.best_block
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<Option<ChainstateEntry>> {
        let corrupted = || Error::Corrupted(format!("unexpected key {key:02x?}"));
        let entry = match key.first().copied() {
            Some(keys::COIN) => {
                let outpoint = key_to_outpoint(key).ok_or_else(corrupted)?;
                ChainstateEntry::Coin(outpoint, Coin::decode_from_storage(value)?)
            }
            Some(keys::NAME) => {
                ChainstateEntry::Name(Name::new(&key[1..]), NameRecord::decode(value)?)
            }
            Some(keys::NAME_HISTORY) => {
                ChainstateEntry::History(Name::new(&key[1..]), NameHistory::decode(value)?)
            }
            Some(keys::NAME_HEIGHT) => {
                let (height, name) = keys::parse_height_index(key).ok_or_else(corrupted)?;
                ChainstateEntry::HeightIndex(height, Name::new(name))
            }
            _ if key == keys::BEST_BLOCK || key == keys::HEAD_BLOCKS || key == keys::VERSION => {
                return Ok(None);
            }
            _ => return Err(corrupted()),
        };
        Ok(Some(entry))
    }
}

impl Iterator for ChainstateCursor<'_> {
    type Item = Result<ChainstateEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if !self.iter.valid() {
                self.done = true;
                return self.iter.status().err().map(|err| Err(err.into()));
            }

            let decoded = match (self.iter.key(), self.iter.value()) {
                (Some(key), Some(value)) => Self::decode(key, value),
                _ => Err(Error::Corrupted("entry without key".to_string())),
            };
            self.iter.next();

            match decoded {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::Txid;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn outpoint(n: u8) -> OutPoint {
        OutPoint {
            txid: Txid::from_byte_array([n; 32]),
            vout: u32::from(n),
        }
    }

    fn block_hash(n: u8) -> BlockHash {
        BlockHash::from_byte_array([n; 32])
    }

    fn record(value: &str, height: u32) -> NameRecord {
        NameRecord::new(value.as_bytes().to_vec(), outpoint(height as u8), height)
    }

    fn with_history() -> CoinsViewOptions {
        CoinsViewOptions {
            name_history: true,
            ..Default::default()
        }
    }

    struct PanicAtCommit;

    impl FaultPoint for PanicAtCommit {
        fn reached(&self) {
            panic!("power loss");
        }
    }

    #[test]
    fn test_fresh_store() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        assert_eq!(view.get_best_block().unwrap(), BlockHash::all_zeros());
        assert!(view.get_head_blocks().unwrap().is_empty());
        assert!(!view.needs_upgrade());
        assert!(view.storage_path().is_none());
        assert!(view.iterate_names().unwrap().next().is_none());
        assert!(view.estimate_size().is_ok());
    }

    #[test]
    fn test_coins() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        let coin = Coin::new(true, 5_000_000_000, 1, vec![0x51]);

        let mut diff = CoinsDiff::new();
        diff.add(outpoint(1), coin.clone());
        view.batch_write(diff, block_hash(1), NameDiff::new()).unwrap();

        assert!(view.have_coin(&outpoint(1)).unwrap());
        assert_eq!(view.get_coin(&outpoint(1)).unwrap(), Some(coin));
        assert!(!view.have_coin(&outpoint(2)).unwrap());
        assert_eq!(view.get_best_block().unwrap(), block_hash(1));

        let mut spend = CoinsDiff::new();
        spend.spend(outpoint(1));
        view.batch_write(spend, block_hash(2), NameDiff::new()).unwrap();
        assert_eq!(view.get_coin(&outpoint(1)).unwrap(), None);
    }

    #[test]
    fn test_empty_diff_moves_best_block() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        view.batch_write(CoinsDiff::new(), block_hash(9), NameDiff::new())
            .unwrap();
        assert_eq!(view.get_best_block().unwrap(), block_hash(9));
        assert!(view.get_head_blocks().unwrap().is_empty());
    }

    #[test]
    fn test_name_lifecycle() {
        let view = CoinsNameView::open_temp(with_history()).unwrap();
        let name = Name::from("d/example");
        let first = record("{}", 10);
        let second = record("{\"ip\":\"10.0.0.1\"}", 20);

        let mut diff = NameDiff::new();
        diff.register(name.clone(), first.clone());
        view.batch_write(CoinsDiff::new(), block_hash(10), diff).unwrap();

        assert_eq!(view.get_name(&name).unwrap(), Some(first.clone()));
        assert_eq!(view.get_name_history(&name).unwrap(), None);
        assert!(view.get_names_for_height(10).unwrap().contains(&name));

        let mut diff = NameDiff::new();
        diff.update(name.clone(), second.clone(), &first, true);
        view.batch_write(CoinsDiff::new(), block_hash(20), diff).unwrap();

        assert_eq!(view.get_name(&name).unwrap(), Some(second.clone()));
        assert!(view.get_names_for_height(10).unwrap().is_empty());
        assert!(view.get_names_for_height(20).unwrap().contains(&name));
        let history = view.get_name_history(&name).unwrap().unwrap();
        assert_eq!(history.entries(), &[first.clone()]);

        let mut diff = NameDiff::new();
        diff.expire(name.clone(), &second, true);
        view.batch_write(CoinsDiff::new(), block_hash(30), diff).unwrap();

        assert_eq!(view.get_name(&name).unwrap(), None);
        assert!(view.get_names_for_height(20).unwrap().is_empty());
        let history = view.get_name_history(&name).unwrap().unwrap();
        assert_eq!(history.entries(), &[first, second]);
    }

    #[test]
    fn test_history_disabled() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        let name = Name::from("d/example");
        let mut diff = NameDiff::new();
        diff.register(name.clone(), record("{}", 1));
        diff.push_history(name.clone(), record("old", 0));
        view.batch_write(CoinsDiff::new(), block_hash(1), diff).unwrap();

        assert_eq!(view.get_name_history(&name).unwrap(), None);
        assert!(view.read_history(&name).unwrap().is_none());
    }

    #[test]
    fn test_failed_commit_leaves_no_head_blocks() {
        let view = CoinsNameView::open_temp(with_history()).unwrap();
        let name = Name::from("d/example");
        view.db
            .put(keys::prefixed(keys::NAME_HISTORY, name.as_bytes()), [0xffu8])
            .unwrap();

        let mut diff = NameDiff::new();
        diff.update(name.clone(), record("{}", 2), &record("old", 1), true);
        assert!(matches!(
            view.batch_write(CoinsDiff::new(), block_hash(2), diff),
            Err(Error::Bincode(_))
        ));

        assert!(view.get_head_blocks().unwrap().is_empty());
        assert_eq!(view.get_best_block().unwrap(), BlockHash::all_zeros());
        assert_eq!(view.get_name(&name).unwrap(), None);
    }

    #[test]
    fn test_names_for_height_excludes_neighbours() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        let mut diff = NameDiff::new();
        diff.register(Name::from("d/a"), record("", 255));
        diff.register(Name::from("d/b"), record("", 256));
        diff.register(Name::from("d/c"), record("", 256));
        view.batch_write(CoinsDiff::new(), block_hash(1), diff).unwrap();

        let names = view.get_names_for_height(256).unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec![Name::from("d/b"), Name::from("d/c")]
        );
        assert_eq!(view.get_names_for_height(255).unwrap().len(), 1);
        assert!(view.get_names_for_height(257).unwrap().is_empty());
    }

    #[test]
    fn test_iterate_names_and_seek() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        let mut diff = NameDiff::new();
        for label in ["d/c", "d/a", "id/b", "d/b"] {
            diff.register(Name::from(label), record(label, 1));
        }
        view.batch_write(CoinsDiff::new(), block_hash(1), diff).unwrap();

        let names: Vec<_> = view
            .iterate_names()
            .unwrap()
            .map(|item| item.unwrap().0)
            .collect();
        assert_eq!(
            names,
            ["d/a", "d/b", "d/c", "id/b"].map(Name::from).to_vec()
        );

        let mut iter = view.iterate_names().unwrap();
        iter.seek(&Name::from("d/bb"));
        let (name, record) = iter.next().unwrap().unwrap();
        assert_eq!(name, Name::from("d/c"));
        assert_eq!(record.value, b"d/c");
    }

    #[test]
    fn test_iteration_is_a_snapshot() {
        let view = CoinsNameView::open_temp(Default::default()).unwrap();
        let mut diff = NameDiff::new();
        diff.register(Name::from("d/a"), record("one", 1));
        diff.register(Name::from("d/b"), record("one", 1));
        view.batch_write(CoinsDiff::new(), block_hash(1), diff).unwrap();

        let mut iter = view.iterate_names().unwrap();
        let (first, _) = iter.next().unwrap().unwrap();
        assert_eq!(first, Name::from("d/a"));

        let mut diff = NameDiff::new();
        diff.set(Name::from("d/b"), record("two", 2));
        diff.register(Name::from("d/c"), record("two", 2));
        view.batch_write(CoinsDiff::new(), block_hash(2), diff).unwrap();

        let rest: Vec<_> = iter.map(|item| item.unwrap()).collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].0, Name::from("d/b"));
        assert_eq!(rest[0].1.value, b"one");

        assert_eq!(view.iterate_names().unwrap().count(), 3);
    }

    #[test]
    fn test_cursor() {
        let view = CoinsNameView::open_temp(with_history()).unwrap();
        let name = Name::from("d/x");
        let first = record("a", 3);
        let coin = Coin::new(false, 7, 3, vec![]);

        let mut coins = CoinsDiff::new();
        coins.add(outpoint(3), coin.clone());
        let mut names = NameDiff::new();
        names.register(name.clone(), first.clone());
        names.push_history(name.clone(), record("z", 1));
        view.batch_write(coins, block_hash(3), names).unwrap();

        let cursor = view.cursor().unwrap();
        assert_eq!(cursor.best_block(), block_hash(3));
        let entries: Vec<_> = cursor.map(|entry| entry.unwrap()).collect();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], ChainstateEntry::Coin(outpoint(3), coin));
        assert!(entries.contains(&ChainstateEntry::Name(name.clone(), first)));
        assert!(entries.contains(&ChainstateEntry::HeightIndex(3, name.clone())));
        assert!(
            entries
                .iter()
                .any(|entry| matches!(entry, ChainstateEntry::History(n, h) if *n == name && h.len() == 1))
        );
    }

    #[test]
    fn test_interrupted_commit_leaves_pre_commit_state() {
        let params = DbParams::in_memory();
        let view =
            CoinsNameView::open_with_fault_point(&params, Default::default(), Box::new(PanicAtCommit))
                .unwrap();

        let mut coins = CoinsDiff::new();
        coins.add(outpoint(1), Coin::new(false, 1, 1, vec![]));
        let mut names = NameDiff::new();
        names.register(Name::from("d/lost"), record("", 1));

        let result = catch_unwind(AssertUnwindSafe(|| {
            view.batch_write(coins, block_hash(1), names)
        }));
        assert!(result.is_err());

        assert_eq!(view.get_best_block().unwrap(), BlockHash::all_zeros());
        assert_eq!(
            view.get_head_blocks().unwrap(),
            vec![block_hash(1), BlockHash::all_zeros()]
        );
        assert!(!view.have_coin(&outpoint(1)).unwrap());
        assert_eq!(view.get_name(&Name::from("d/lost")).unwrap(), None);
        assert!(view.get_names_for_height(1).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_and_wipe() {
        let temp_dir = tempfile::tempdir().unwrap();
        let params = DbParams::new(temp_dir.path().join("chainstate"));

        {
            let view = CoinsNameView::open(&params, Default::default()).unwrap();
            assert_eq!(view.storage_path(), Some(params.path.as_path()));
            let mut diff = NameDiff::new();
            diff.register(Name::from("d/kept"), record("", 1));
            view.batch_write(CoinsDiff::new(), block_hash(1), diff).unwrap();
        }

        {
            let view = CoinsNameView::open(&params, Default::default()).unwrap();
            assert_eq!(view.get_best_block().unwrap(), block_hash(1));
            assert!(view.get_name(&Name::from("d/kept")).unwrap().is_some());
        }

        let wiped = DbParams {
            wipe_data: true,
            ..params.clone()
        };
        let view = CoinsNameView::open(&wiped, Default::default()).unwrap();
        assert_eq!(view.get_best_block().unwrap(), BlockHash::all_zeros());
        assert!(view.get_name(&Name::from("d/kept")).unwrap().is_none());
    }

    #[test]
    fn test_resize_cache() {
        let mut view = CoinsNameView::open_temp(Default::default()).unwrap();
        view.resize_cache(8 << 20);
        assert_eq!(view.cache_bytes(), 8 << 20);
        view.batch_write(CoinsDiff::new(), block_hash(1), NameDiff::new())
            .unwrap();
        assert_eq!(view.get_best_block().unwrap(), block_hash(1));
    }
}
