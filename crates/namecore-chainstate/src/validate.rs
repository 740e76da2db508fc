//! Consistency check of the name database.

use crate::coin::outpoint_to_key;
use crate::name::{Name, NameRecord};
use crate::storage::{CoinsNameView, prefix_read_options};
use crate::{Error, Result, keys};
use std::collections::{BTreeMap, BTreeSet};

/// Keys scanned between two polls of the interruption point.
const POLL_INTERVAL: u64 = 1000;

/// The parts of the active chain the name database is checked against.
pub trait ChainState {
    /// Height of the active chain tip.
    fn tip_height(&self) -> u32;

    /// Number of blocks after which a name expires, as of `height`.
    fn expiration_depth(&self, height: u32) -> u32;
}

struct Poller<'a> {
    interruption_point: &'a dyn Fn() -> Result<()>,
    scanned: u64,
}

impl Poller<'_> {
    fn tick(&mut self) -> Result<()> {
        if self.scanned % POLL_INTERVAL == 0 {
            (self.interruption_point)()?;
        }
        self.scanned += 1;
        Ok(())
    }
}

impl CoinsNameView {
    /// Check the name database against itself and the coins.
    ///
    /// Verifies that the height index holds exactly one entry per current
    /// name, at the height of its record, and that every name that has not
    /// expired at the tip is held by an unspent coin. Everything is read
    /// from one snapshot.
    ///
    /// Returns `Ok(false)` and logs every finding when the database is
    /// inconsistent; such a database must not be trusted. Returns
    /// [`Error::Interrupted`] (or whatever `interruption_point` returns) when
    /// the scan is cancelled.
    pub fn validate_name_db(
        &self,
        chain_state: &dyn ChainState,
        interruption_point: &dyn Fn() -> Result<()>,
    ) -> Result<bool> {
        self.ensure_upgraded()?;

        let tip = chain_state.tip_height();
        let expiration_depth = chain_state.expiration_depth(tip);
        let snapshot = self.db.snapshot();
        let mut poller = Poller {
            interruption_point,
            scanned: 0,
        };
        let mut consistent = true;

        // Heights expected in the index, derived from the current records.
        let mut expected = BTreeMap::<Name, u32>::new();
        let mut expired = 0u64;

        let prefix = [keys::NAME];
        let mut iter = snapshot.raw_iterator_opt(prefix_read_options(&prefix));
        iter.seek(prefix);
        while iter.valid() {
            poller.tick()?;
            let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
                return Err(Error::Corrupted("name entry without key".to_string()));
            };
            let name = Name::new(&key[1..]);
            let record = NameRecord::decode(value)?;

            if record.is_expired(tip, expiration_depth) {
                expired += 1;
            } else if snapshot.get(outpoint_to_key(&record.outpoint))?.is_none() {
                tracing::error!(
                    "Name {name} is not expired but its coin {} is spent",
                    record.outpoint
                );
                consistent = false;
            }

            expected.insert(name, record.height);
            iter.next();
        }
        iter.status()?;

        let mut indexed = BTreeSet::new();
        let prefix = [keys::NAME_HEIGHT];
        let mut iter = snapshot.raw_iterator_opt(prefix_read_options(&prefix));
        iter.seek(prefix);
        while iter.valid() {
            poller.tick()?;
            let Some((height, name)) = iter.key().and_then(keys::parse_height_index) else {
                return Err(Error::Corrupted("malformed height index key".to_string()));
            };
            let name = Name::new(name);

            match expected.get(&name) {
                Some(&expected_height) if expected_height == height => {}
                Some(expected_height) => {
                    tracing::error!(
                        "Name {name} is indexed at height {height}, its record is at {expected_height}"
                    );
                    consistent = false;
                }
                None => {
                    tracing::error!("Height index entry {height} for unknown name {name}");
                    consistent = false;
                }
            }

            if !indexed.insert(name.clone()) {
                tracing::error!("Name {name} is indexed more than once");
                consistent = false;
            }
            iter.next();
        }
        iter.status()?;

        for name in expected.keys().filter(|name| !indexed.contains(*name)) {
            tracing::error!("Name {name} is missing from the height index");
            consistent = false;
        }

        if consistent {
            tracing::info!(
                "Name database is consistent: {} names, {expired} expired",
                expected.len()
            );
        }

        Ok(consistent)
    }
}
