//! Snapshot encoding for handing brackets to a persistence layer.

use bincode::{
    config,
    serde::{decode_from_slice, encode_to_vec},
};

use super::structure::Bracket;
use crate::errors::SnapshotResult;

impl Bracket {
    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> SnapshotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and check the structural invariants
    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        let bracket: Bracket = serde_json::from_str(json)?;
        bracket.validate()?;
        Ok(bracket)
    }

    /// Encode as compact binary
    pub fn to_bytes(&self) -> SnapshotResult<Vec<u8>> {
        Ok(encode_to_vec(self, config::standard())?)
    }

    /// Decode from binary and check the structural invariants
    pub fn from_bytes(bytes: &[u8]) -> SnapshotResult<Self> {
        let (bracket, _): (Bracket, usize) = decode_from_slice(bytes, config::standard())?;
        bracket.validate()?;
        Ok(bracket)
    }
}
