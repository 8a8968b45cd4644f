use rmp_serde::{decode, encode};
use serde_json;
use thiserror::Error;

use crate::{CompactState, LogEntry, PlayerAction};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_state(state: &CompactState) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(state)?)
}

pub fn deserialize_state(bytes: &[u8]) -> Result<CompactState, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_action(action: &PlayerAction) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(action)?)
}

pub fn deserialize_action(bytes: &[u8]) -> Result<PlayerAction, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_log(entries: &[LogEntry]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(entries)?)
}

pub fn deserialize_log(bytes: &[u8]) -> Result<Vec<LogEntry>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_state_json(state: &CompactState) -> Result<String, WireError> {
    Ok(serde_json::to_string(state)?)
}

pub fn deserialize_state_json(json: &str) -> Result<CompactState, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_action_json(action: &PlayerAction) -> Result<String, WireError> {
    Ok(serde_json::to_string(action)?)
}

pub fn deserialize_action_json(json: &str) -> Result<PlayerAction, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic state hash for change detection and replay verification.
///
/// Hashes the MessagePack-serialized state using FNV-1a 64-bit.
pub fn state_hash(state: &CompactState) -> Result<u64, WireError> {
    let bytes = serialize_state(state)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
