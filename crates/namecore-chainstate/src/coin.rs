//! Coin (unspent transaction output) records and their storage keys.

use crate::keys;
use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, TxOut, Txid};
use serde::{Deserialize, Serialize};

/// Length of a coin key: prefix || txid || vout.
pub(crate) const COIN_KEY_LEN: usize = 1 + 32 + 4;

/// Length of a legacy per-transaction coins key: prefix || txid.
pub(crate) const LEGACY_COINS_KEY_LEN: usize = 1 + 32;

/// An unspent transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Whether the coin is from a coinbase transaction.
    pub is_coinbase: bool,
    /// Transfer value in satoshis.
    pub amount: u64,
    /// Block height at which the containing transaction was included.
    pub height: u32,
    /// Spending condition of the output.
    pub script_pubkey: Vec<u8>,
}

impl Coin {
    pub fn new(is_coinbase: bool, amount: u64, height: u32, script_pubkey: Vec<u8>) -> Self {
        Self {
            is_coinbase,
            amount,
            height,
            script_pubkey,
        }
    }

    /// Creates the coin for a freshly produced output.
    pub fn from_txout(txout: &TxOut, height: u32, is_coinbase: bool) -> Self {
        Self {
            is_coinbase,
            amount: txout.value.to_sat(),
            height,
            script_pubkey: txout.script_pubkey.to_bytes(),
        }
    }

    /// Serialize to bytes for storage.
    pub fn encode_for_storage(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Coin serialization should not fail")
    }

    /// Deserialize from bytes.
    pub fn decode_from_storage(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Convert OutPoint to storage key.
///
/// Format: prefix || txid (32 bytes, raw) || vout (4 bytes, big-endian), so
/// that the outputs of a transaction are stored in order.
pub(crate) fn outpoint_to_key(outpoint: &OutPoint) -> [u8; COIN_KEY_LEN] {
    let mut key = [0u8; COIN_KEY_LEN];
    key[0] = keys::COIN;
    key[1..33].copy_from_slice(outpoint.txid.as_ref());
    key[33..].copy_from_slice(&outpoint.vout.to_be_bytes());
    key
}

/// Parse storage key back to OutPoint.
pub(crate) fn key_to_outpoint(key: &[u8]) -> Option<OutPoint> {
    if key.len() != COIN_KEY_LEN || key[0] != keys::COIN {
        return None;
    }
    let txid = Txid::from_slice(&key[1..33]).ok()?;
    let vout = u32::from_be_bytes(key[33..].try_into().ok()?);
    Some(OutPoint { txid, vout })
}

/// An output inside a legacy per-transaction coins record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LegacyOutput {
    pub amount: u64,
    pub script_pubkey: Vec<u8>,
}

/// Legacy layout storing all unspent outputs of one transaction together.
///
/// Only read by the upgrade path, which splits it into per-output coins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LegacyCoins {
    pub is_coinbase: bool,
    pub height: u32,
    /// Indexed by vout; spent outputs are `None`.
    pub outputs: Vec<Option<LegacyOutput>>,
}

impl LegacyCoins {
    /// Splits the record into the coins of its unspent outputs.
    pub fn into_coins(self, txid: Txid) -> impl Iterator<Item = (OutPoint, Coin)> {
        let Self {
            is_coinbase,
            height,
            outputs,
        } = self;
        outputs
            .into_iter()
            .enumerate()
            .filter_map(move |(vout, output)| {
                let output = output?;
                let outpoint = OutPoint {
                    txid,
                    vout: vout as u32,
                };
                let coin = Coin::new(is_coinbase, output.amount, height, output.script_pubkey);
                Some((outpoint, coin))
            })
    }
}

pub(crate) fn legacy_key(txid: &Txid) -> [u8; LEGACY_COINS_KEY_LEN] {
    let mut key = [0u8; LEGACY_COINS_KEY_LEN];
    key[0] = keys::LEGACY_COINS;
    key[1..].copy_from_slice(txid.as_ref());
    key
}

pub(crate) fn legacy_key_to_txid(key: &[u8]) -> Option<Txid> {
    if key.len() != LEGACY_COINS_KEY_LEN || key[0] != keys::LEGACY_COINS {
        return None;
    }
    Txid::from_slice(&key[1..]).ok()
}
