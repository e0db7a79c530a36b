//! Transaction construction engine.
//!
//! This crate turns a construction [`Intent`](signer_types::Intent) into a
//! signed [`TransactionEnvelope`](signer_types::TransactionEnvelope). It reads
//! chain state and a fee quote concurrently, selects unspent outputs on
//! output-based chains, builds the protocol's unsigned transaction and signs it
//! locally with the keys carried by the intent.
//!
//! Multi-phase ledgers are built by a remote construction service and only
//! signed here.

use signer_account::SigningError;
use signer_chain::ChainError;
use signer_types::{AmountError, OperationKind, Protocol, TokenId};
use thiserror::Error;

pub mod builders;
pub mod engine;
pub mod selection;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

pub use engine::{Collaborators, TransactionCrafter};
pub use selection::{SelectedInputSet, SelectionStrategy, UtxoSelector};

/// Errors that can occur while constructing a transaction.
///
/// No partial envelope is produced when any of these is returned.
#[derive(Debug, Error)]
pub enum ConstructionError {
	/// The intent is malformed or misses a required field. Raised before any
	/// remote call.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The operation is not defined for the protocol.
	#[error("Operation {operation} is not supported on {protocol}")]
	UnsupportedProtocol {
		protocol: Protocol,
		operation: OperationKind,
	},
	/// Selection found nothing, or not enough, to spend.
	#[error("No available outputs for token {token}: required {required}, available {available}")]
	NoAvailableOutputs {
		token: TokenId,
		required: u64,
		available: u64,
	},
	/// A caller-supplied input does not reference a spendable output.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	#[error(transparent)]
	Remote(#[from] ChainError),
	#[error(transparent)]
	Signing(#[from] SigningError),
}

impl From<AmountError> for ConstructionError {
	fn from(e: AmountError) -> Self {
		ConstructionError::Validation(e.to_string())
	}
}
