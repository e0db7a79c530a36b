//! Protocol builders.
//!
//! Builders are pure: they turn an intent, the chain state read for it and a
//! resolved fee into an unsigned transaction. Keys are never copied into the
//! result; spending inputs reference them by position in a
//! [`KeyRing`](signer_types::KeyRing).

pub mod account;
pub mod cardano;
pub mod hathor;
pub mod ledger;
pub mod utxo;

/// Number of ledgers after the current one in which a ledger-chain
/// transaction stays valid.
pub const LEDGER_VALIDITY_HORIZON: u64 = 20;
