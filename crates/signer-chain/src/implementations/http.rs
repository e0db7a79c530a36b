//! HTTP implementation of the chain collaborators.
//!
//! A single [`ApiClient`] serves chain state, fee quotes, broadcast and
//! remote construction against the wallet backend API. Every route lives
//! under `/v3/{chain}/` where `{chain}` is the protocol's path segment, and
//! testnet requests add `testnet=true` to the query.

use crate::{
	BroadcastInterface, ChainError, ChainStateClient, ConstructionInterface, FeeQuotation,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use signer_types::{
	AccountInfo, BlockAnchor, BroadcastReceipt, BroadcastRequest, ChainRef, CombineRequest,
	CombineResponse, FeeEstimate, FeeQuoteRequest, MetadataRequest, MetadataResponse,
	PayloadsRequest, PayloadsResponse, RawTransaction, SecretString, TransactionEnvelope,
	UnspentOutput,
};
use std::time::Duration;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Chain data API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
	client: reqwest::Client,
	base_url: String,
	api_key: Option<SecretString>,
}

impl ApiClient {
	/// Creates a client for `base_url`.
	///
	/// An empty `api_key` is treated as absent.
	pub fn new(
		base_url: impl Into<String>,
		api_key: Option<SecretString>,
		timeout: Duration,
	) -> Result<Self, ChainError> {
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.timeout(timeout)
			.build()
			.map_err(|e| ChainError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			api_key: api_key.filter(|k| !k.is_empty()),
		})
	}

	fn url(&self, chain: ChainRef, path: &str) -> String {
		format!(
			"{}/v3/{}/{}",
			self.base_url,
			chain.protocol.path_segment(),
			path
		)
	}

	fn prepare(&self, builder: RequestBuilder, chain: ChainRef) -> RequestBuilder {
		let builder = match &self.api_key {
			Some(key) => builder.header(API_KEY_HEADER, key.expose_secret()),
			None => builder,
		};
		if chain.testnet {
			builder.query(&[("testnet", "true")])
		} else {
			builder
		}
	}

	async fn get<T: DeserializeOwned>(&self, chain: ChainRef, path: &str) -> Result<T, ChainError> {
		let url = self.url(chain, path);
		tracing::debug!(%url, testnet = chain.testnet, "GET");

		let response = self
			.prepare(self.client.get(&url), chain)
			.send()
			.await
			.map_err(|e| ChainError::Network(e.to_string()))?;
		Self::decode(response).await
	}

	async fn post<B, T>(&self, chain: ChainRef, path: &str, body: &B) -> Result<T, ChainError>
	where
		B: Serialize + ?Sized + Sync,
		T: DeserializeOwned,
	{
		let url = self.url(chain, path);
		tracing::debug!(%url, testnet = chain.testnet, "POST");

		let response = self
			.prepare(self.client.post(&url), chain)
			.json(body)
			.send()
			.await
			.map_err(|e| ChainError::Network(e.to_string()))?;
		Self::decode(response).await
	}

	async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ChainError> {
		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| ChainError::Network(e.to_string()))?;

		if !status.is_success() {
			tracing::warn!(status = status.as_u16(), "Remote request rejected");
			return Err(ChainError::Request {
				status: status.as_u16(),
				body,
			});
		}

		serde_json::from_str(&body).map_err(|e| ChainError::Decode(e.to_string()))
	}
}

#[async_trait]
impl ChainStateClient for ApiClient {
	async fn unspent_outputs(
		&self,
		chain: ChainRef,
		address: &str,
	) -> Result<Vec<UnspentOutput>, ChainError> {
		self.get(chain, &format!("utxo/{}", address)).await
	}

	async fn transaction(
		&self,
		chain: ChainRef,
		hash: &str,
	) -> Result<RawTransaction, ChainError> {
		self.get(chain, &format!("transaction/{}", hash)).await
	}

	async fn account(&self, chain: ChainRef, address: &str) -> Result<AccountInfo, ChainError> {
		self.get(chain, &format!("account/{}", address)).await
	}

	async fn latest_block(&self, chain: ChainRef) -> Result<BlockAnchor, ChainError> {
		self.get(chain, "block/current").await
	}
}

#[async_trait]
impl FeeQuotation for ApiClient {
	async fn quote(
		&self,
		chain: ChainRef,
		request: &FeeQuoteRequest,
	) -> Result<FeeEstimate, ChainError> {
		self.post(chain, "fee", request).await
	}
}

#[async_trait]
impl BroadcastInterface for ApiClient {
	async fn broadcast(
		&self,
		envelope: &TransactionEnvelope,
	) -> Result<BroadcastReceipt, ChainError> {
		let chain = ChainRef::new(envelope.protocol(), envelope.testnet());
		let receipt: BroadcastReceipt = self
			.post(chain, "broadcast", &BroadcastRequest::from(envelope))
			.await?;
		tracing::info!(tx_id = %receipt.tx_id, protocol = %chain, "Broadcast accepted");
		Ok(receipt)
	}
}

#[async_trait]
impl ConstructionInterface for ApiClient {
	async fn metadata(
		&self,
		chain: ChainRef,
		request: &MetadataRequest,
	) -> Result<MetadataResponse, ChainError> {
		self.post(chain, "construction/metadata", request).await
	}

	async fn payloads(
		&self,
		chain: ChainRef,
		request: &PayloadsRequest,
	) -> Result<PayloadsResponse, ChainError> {
		self.post(chain, "construction/payloads", request).await
	}

	async fn combine(
		&self,
		chain: ChainRef,
		request: &CombineRequest,
	) -> Result<CombineResponse, ChainError> {
		self.post(chain, "construction/combine", request).await
	}
}
