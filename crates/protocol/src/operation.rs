//! Account operations
//!
//! The deterministic transition function shared by the base layer and the
//! ephemeral executor. Both layers apply the same function; only the
//! routing differs.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::LedgerError;

/// Client-issued mutation of an account payload.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Add one to the payload
    Increment,
    /// Subtract one from the payload
    Decrement,
    /// Replace the payload
    Set(u64),
    /// Derive a new payload from the current state and a client seed
    Randomize { client_seed: u8 },
}

/// Apply an operation to a payload at the given sequence.
///
/// Overflow and underflow are validation errors; a failed operation must
/// not advance the sequence. The value derived by `Randomize` is
/// deterministic but carries no guarantee of differing from the current
/// payload.
pub fn apply_operation(payload: u64, sequence: u64, op: &Operation) -> Result<u64, LedgerError> {
    match op {
        Operation::Increment => payload
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow),
        Operation::Decrement => payload
            .checked_sub(1)
            .ok_or(LedgerError::ArithmeticOverflow),
        Operation::Set(value) => Ok(*value),
        Operation::Randomize { client_seed } => {
            Ok(derive_random(payload, sequence, *client_seed))
        }
    }
}

/// Hash-derived pseudo-random payload, standing in for the oracle
/// request/callback round trip.
fn derive_random(payload: u64, sequence: u64, client_seed: u8) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&payload.to_le_bytes());
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&[client_seed]);
    let digest = hasher.finalize();

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(buf)
}
