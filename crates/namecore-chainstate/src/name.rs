//! Name registry records.

use bitcoin::OutPoint;
use namecore_names::{NameNamespace, classify_name_bytes, encode_name_for_message};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered name. Identity is the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name(Vec<u8>);

impl Name {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Namespace the name belongs to after label validation.
    pub fn namespace(&self) -> NameNamespace {
        classify_name_bytes(&self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Name {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_name_for_message(&self.0))
    }
}

/// Current state of a registered name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    /// Value payload, JSON for domains.
    pub value: Vec<u8>,
    /// Output holding the name.
    pub outpoint: OutPoint,
    /// Height of the last registration or update.
    pub height: u32,
    /// Explicit expiration height, overriding `height + expiration depth`.
    pub expiration_height: Option<u32>,
}

impl NameRecord {
    pub fn new(value: impl Into<Vec<u8>>, outpoint: OutPoint, height: u32) -> Self {
        Self {
            value: value.into(),
            outpoint,
            height,
            expiration_height: None,
        }
    }

    /// Height at which the name expires for the given expiration depth.
    pub fn expires_at(&self, expiration_depth: u32) -> u32 {
        self.expiration_height
            .unwrap_or_else(|| self.height.saturating_add(expiration_depth))
    }

    /// Whether the name has expired once the chain reaches `tip_height`.
    pub fn is_expired(&self, tip_height: u32, expiration_depth: u32) -> bool {
        tip_height >= self.expires_at(expiration_depth)
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("NameRecord serialization should not fail")
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Past records of a name, oldest first.
///
/// Only ever extended, never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameHistory(Vec<NameRecord>);

impl NameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: NameRecord) {
        self.0.push(record);
    }

    pub fn entries(&self) -> &[NameRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn extend(&mut self, records: impl IntoIterator<Item = NameRecord>) {
        self.0.extend(records);
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("NameHistory serialization should not fail")
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

impl IntoIterator for NameHistory {
    type Item = NameRecord;
    type IntoIter = std::vec::IntoIter<NameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
