//! Utility functions shared across the signer crates.

pub mod amounts;
pub mod formatting;
pub mod serde_helpers;

pub use amounts::{to_base_units, to_base_units_u64, AmountError};
pub use formatting::{truncate_id, with_0x_prefix, without_0x_prefix};
