//! Pending change sets handed to [`CoinsNameView::batch_write`].
//!
//! Both diffs are mergeable: applying `a` and then `b` in two commits leaves
//! the store in the same state as applying `a.merge(b)` in one. For the same
//! key the later diff wins, history appends are concatenated in order.
//!
//! [`CoinsNameView::batch_write`]: crate::CoinsNameView::batch_write

use crate::coin::Coin;
use crate::name::{Name, NameRecord};
use bitcoin::OutPoint;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Coin changes of one or more blocks: outpoint -> new coin, or `None` when
/// spent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinsDiff {
    coins: BTreeMap<OutPoint, Option<Coin>>,
}

impl CoinsDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly created coin.
    pub fn add(&mut self, outpoint: OutPoint, coin: Coin) {
        self.coins.insert(outpoint, Some(coin));
    }

    /// Records that the coin at `outpoint` was spent.
    pub fn spend(&mut self, outpoint: OutPoint) {
        self.coins.insert(outpoint, None);
    }

    /// Pending change for `outpoint`, if any.
    pub fn get(&self, outpoint: &OutPoint) -> Option<Option<&Coin>> {
        self.coins.get(outpoint).map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Folds `other`, which happened after `self`, into this diff.
    pub fn merge(&mut self, other: CoinsDiff) {
        self.coins.extend(other.coins);
    }
}

impl IntoIterator for CoinsDiff {
    type Item = (OutPoint, Option<Coin>);
    type IntoIter = std::collections::btree_map::IntoIter<OutPoint, Option<Coin>>;

    /// Consumes the diff in outpoint order.
    fn into_iter(self) -> Self::IntoIter {
        self.coins.into_iter()
    }
}

/// Name registry changes of one or more blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameDiff {
    /// name -> new current record, or `None` to delete it.
    pub(crate) entries: BTreeMap<Name, Option<NameRecord>>,
    /// name -> records to append to its history, oldest first.
    pub(crate) history: BTreeMap<Name, Vec<NameRecord>>,
    /// (height, name) -> whether the index entry is added or removed.
    pub(crate) height_index: BTreeMap<(u32, Name), bool>,
}

impl NameDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current record of `name`.
    pub fn set(&mut self, name: Name, record: NameRecord) {
        self.entries.insert(name, Some(record));
    }

    /// Deletes the current record of `name`.
    pub fn remove(&mut self, name: Name) {
        self.entries.insert(name, None);
    }

    /// Appends a past record to the history of `name`.
    pub fn push_history(&mut self, name: Name, record: NameRecord) {
        self.history.entry(name).or_default().push(record);
    }

    pub fn add_to_height_index(&mut self, height: u32, name: Name) {
        self.height_index.insert((height, name), true);
    }

    pub fn remove_from_height_index(&mut self, height: u32, name: Name) {
        self.height_index.insert((height, name), false);
    }

    /// First registration of `name`.
    pub fn register(&mut self, name: Name, record: NameRecord) {
        self.add_to_height_index(record.height, name.clone());
        self.set(name, record);
    }

    /// Replaces `previous` with `record`, moving the index entry and, when
    /// `track_history` is set, archiving `previous`.
    pub fn update(
        &mut self,
        name: Name,
        record: NameRecord,
        previous: &NameRecord,
        track_history: bool,
    ) {
        self.remove_from_height_index(previous.height, name.clone());
        self.add_to_height_index(record.height, name.clone());
        if track_history {
            self.push_history(name.clone(), previous.clone());
        }
        self.set(name, record);
    }

    /// Deletes an expired name together with its index entry.
    pub fn expire(&mut self, name: Name, previous: &NameRecord, track_history: bool) {
        self.remove_from_height_index(previous.height, name.clone());
        if track_history {
            self.push_history(name.clone(), previous.clone());
        }
        self.remove(name);
    }

    /// Pending change of the current record of `name`, if any.
    pub fn get(&self, name: &Name) -> Option<Option<&NameRecord>> {
        self.entries.get(name).map(Option::as_ref)
    }

    /// Pending history appends of `name`.
    pub fn history_of(&self, name: &Name) -> &[NameRecord] {
        self.history.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.history.is_empty() && self.height_index.is_empty()
    }

    /// Folds `other`, which happened after `self`, into this diff.
    pub fn merge(&mut self, other: NameDiff) {
        self.entries.extend(other.entries);
        for (name, records) in other.history {
            match self.history.entry(name) {
                Entry::Occupied(mut entry) => entry.get_mut().extend(records),
                Entry::Vacant(entry) => {
                    entry.insert(records);
                }
            }
        }
        self.height_index.extend(other.height_index);
    }
}
