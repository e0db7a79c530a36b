//! Common types module for the transaction signer.
//!
//! This module defines the data types shared by every crate in the workspace:
//! protocol classification, construction intents, chain state snapshots, fee
//! shapes, unsigned transaction structures and the final signed envelope.

/// Chain state snapshots: nonces, ledger sequences and unspent outputs.
pub mod chain;
/// Remote-assisted (multi-phase) construction types.
pub mod construction;
/// Signed transaction envelope and broadcast receipt.
pub mod envelope;
/// Fee quotes, overrides and quotation request shapes.
pub mod fee;
/// Construction intents describing the desired on-chain effect.
pub mod intent;
/// Protocol identifiers and their accounting model classification.
pub mod protocol;
/// Secret string wrapper for private keys and API keys.
pub mod secret_string;
/// Unsigned transaction structures, one per protocol family.
pub mod transaction;
/// Utility functions for amounts and hex strings.
pub mod utils;

pub use chain::*;
pub use construction::*;
pub use envelope::*;
pub use fee::*;
pub use intent::*;
pub use protocol::*;
pub use secret_string::SecretString;
pub use transaction::*;
pub use utils::{
	to_base_units, to_base_units_u64, truncate_id, with_0x_prefix, without_0x_prefix, AmountError,
};
