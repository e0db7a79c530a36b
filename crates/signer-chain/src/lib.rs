//! Remote chain collaborators for the transaction signer.
//!
//! This module defines the interfaces the construction engine uses to read
//! chain state, obtain fee quotes, drive remote-assisted construction and
//! broadcast signed envelopes. Implementations are stateless; every call
//! reads fresh data.

use async_trait::async_trait;
use signer_types::{
	AccountInfo, BlockAnchor, BroadcastReceipt, ChainRef, CombineRequest, CombineResponse,
	FeeEstimate, FeeQuoteRequest, MetadataRequest, MetadataResponse, PayloadsRequest,
	PayloadsResponse, RawTransaction, TransactionEnvelope, UnspentOutput,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors returned by remote collaborators.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The remote API answered with a non-success status.
	#[error("Remote request failed with status {status}: {body}")]
	Request { status: u16, body: String },
	/// The request could not be sent or the response not read.
	#[error("Network error: {0}")]
	Network(String),
	/// The response body did not match the expected shape.
	#[error("Failed to decode response: {0}")]
	Decode(String),
}

/// Read access to chain state.
#[async_trait]
pub trait ChainStateClient: Send + Sync {
	/// Unspent outputs owned by `address`, in the order the API returns them.
	async fn unspent_outputs(
		&self,
		chain: ChainRef,
		address: &str,
	) -> Result<Vec<UnspentOutput>, ChainError>;

	/// Transaction by hash, including its outputs.
	async fn transaction(&self, chain: ChainRef, hash: &str)
		-> Result<RawTransaction, ChainError>;

	/// Nonce or sequence information for an address.
	async fn account(&self, chain: ChainRef, address: &str) -> Result<AccountInfo, ChainError>;

	async fn latest_block(&self, chain: ChainRef) -> Result<BlockAnchor, ChainError>;
}

/// Network fee quotation.
#[async_trait]
pub trait FeeQuotation: Send + Sync {
	async fn quote(
		&self,
		chain: ChainRef,
		request: &FeeQuoteRequest,
	) -> Result<FeeEstimate, ChainError>;
}

/// Submission of signed envelopes to the network.
#[async_trait]
pub trait BroadcastInterface: Send + Sync {
	async fn broadcast(
		&self,
		envelope: &TransactionEnvelope,
	) -> Result<BroadcastReceipt, ChainError>;
}

/// Remote construction for multi-phase ledgers.
///
/// Calls are issued in order: `metadata` for the fee, `payloads` for the
/// bytes to sign and `combine` once every payload is signed.
#[async_trait]
pub trait ConstructionInterface: Send + Sync {
	async fn metadata(
		&self,
		chain: ChainRef,
		request: &MetadataRequest,
	) -> Result<MetadataResponse, ChainError>;

	async fn payloads(
		&self,
		chain: ChainRef,
		request: &PayloadsRequest,
	) -> Result<PayloadsResponse, ChainError>;

	async fn combine(
		&self,
		chain: ChainRef,
		request: &CombineRequest,
	) -> Result<CombineResponse, ChainError>;
}
