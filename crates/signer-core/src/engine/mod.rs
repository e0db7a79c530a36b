//! Construction orchestration.
//!
//! [`TransactionCrafter`] validates an intent, dispatches it to the flow of
//! its protocol and operation, and signs the result. Every flow reads chain
//! state and the fee quote concurrently, then hands both to a pure builder.

use crate::builders::account::{EvmCall, TransferRoute};
use crate::selection::UtxoSelector;
use crate::{validation, ConstructionError};
use signer_account::LocalSigner;
use signer_chain::{BroadcastInterface, ChainStateClient, ConstructionInterface, FeeQuotation};
use signer_config::Config;
use signer_types::{
	truncate_id, BroadcastReceipt, ChainRef, FeeOverride, Intent, KeyRing, Operation, Protocol,
	TransactionEnvelope, UnsignedTransaction,
};
use std::sync::Arc;
use tracing::instrument;

mod account;
mod cardano;
mod hathor;
mod ledger;
pub mod resolve;
mod utxo;

use resolve::{FeeResolver, StateReader};

/// Remote collaborators used by the crafter.
#[derive(Clone)]
pub struct Collaborators {
	pub chain_state: Arc<dyn ChainStateClient>,
	pub fees: Arc<dyn FeeQuotation>,
	pub construction: Arc<dyn ConstructionInterface>,
	pub broadcast: Arc<dyn BroadcastInterface>,
}

impl Collaborators {
	/// Uses one client for every collaborator.
	pub fn from_client<C>(client: Arc<C>) -> Self
	where
		C: ChainStateClient + FeeQuotation + ConstructionInterface + BroadcastInterface + 'static,
	{
		Self {
			chain_state: client.clone(),
			fees: client.clone(),
			construction: client.clone(),
			broadcast: client,
		}
	}
}

/// Result of construction before local signing.
#[derive(Debug)]
pub enum Prepared<'k> {
	/// An unsigned transaction and the keys its inputs reference.
	Unsigned {
		tx: UnsignedTransaction,
		keys: KeyRing<'k>,
	},
	/// Multi-phase ledgers are signed and combined during construction.
	Signed(String),
}

/// Builds and signs transactions from intents.
///
/// The crafter holds no mutable state; concurrent calls are independent.
pub struct TransactionCrafter {
	config: Config,
	state: StateReader,
	fees: FeeResolver,
	construction: Arc<dyn ConstructionInterface>,
	broadcaster: Arc<dyn BroadcastInterface>,
	signer: LocalSigner,
	selector: UtxoSelector,
}

impl TransactionCrafter {
	pub fn new(config: Config, collaborators: Collaborators, signer: LocalSigner) -> Self {
		let selector = UtxoSelector::from_kind(config.selection.strategy);
		Self {
			config,
			state: StateReader::new(collaborators.chain_state),
			fees: FeeResolver::new(collaborators.fees),
			construction: collaborators.construction,
			broadcaster: collaborators.broadcast,
			signer,
			selector,
		}
	}

	/// Replaces the selector chosen by configuration.
	pub fn with_selector(mut self, selector: UtxoSelector) -> Self {
		self.selector = selector;
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Constructs and signs the transaction described by `intent`.
	#[instrument(skip_all, fields(protocol = %intent.protocol, kind = %intent.kind()))]
	pub async fn craft(&self, intent: Intent) -> Result<TransactionEnvelope, ConstructionError> {
		let (chain, prepared) = self.prepare(&intent).await?;
		let payload = match prepared {
			Prepared::Unsigned { tx, keys } => self.signer.sign(chain.protocol, &tx, &keys)?,
			Prepared::Signed(payload) => payload,
		};

		tracing::info!(
			testnet = chain.testnet,
			payload = %truncate_id(&payload),
			"Transaction crafted"
		);
		Ok(TransactionEnvelope::new(
			payload,
			chain.protocol,
			intent.kind(),
			chain.testnet,
		))
	}

	/// Runs every construction step except local signing.
	///
	/// Unsupported operations and malformed intents fail here before any
	/// remote call.
	pub async fn prepare<'k>(
		&self,
		intent: &'k Intent,
	) -> Result<(ChainRef, Prepared<'k>), ConstructionError> {
		validation::ensure_supported(intent.protocol, &intent.operation)?;
		validation::validate(intent)?;

		let testnet = intent
			.testnet
			.unwrap_or_else(|| self.config.default_testnet());
		let chain = ChainRef::new(intent.protocol, testnet);
		let fee = intent.fee.unwrap_or_default();
		tracing::debug!(chain = %chain, "Preparing transaction");

		let prepared = self.dispatch(chain, &intent.operation, fee).await?;
		Ok((chain, prepared))
	}

	/// Submits a signed envelope.
	#[instrument(skip_all, fields(protocol = %envelope.protocol()))]
	pub async fn broadcast(
		&self,
		envelope: &TransactionEnvelope,
	) -> Result<BroadcastReceipt, ConstructionError> {
		let receipt = self.broadcaster.broadcast(envelope).await?;
		tracing::info!(tx_id = %truncate_id(&receipt.tx_id), "Transaction broadcast");
		Ok(receipt)
	}

	async fn dispatch<'k>(
		&self,
		chain: ChainRef,
		operation: &'k Operation,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		use Protocol::*;

		match (chain.protocol, operation) {
			(Ethereum | Bsc | Polygon | Klaytn, Operation::Transfer(transfer)) => {
				let route = TransferRoute::resolve(chain.protocol, transfer, &self.config)?;
				let call = EvmCall::transfer(&route, transfer)?;
				let request = account::transfer_request(transfer, &route);
				self.account(chain, &transfer.source, call, request, fee).await
			},
			(Ethereum | Bsc | Polygon | Klaytn, Operation::ContractCall(call)) => {
				let encoded = EvmCall::contract_call(call)?;
				let request = account::contract_call_request(call);
				self.account(chain, &call.source, encoded, request, fee).await
			},
			(Ethereum | Bsc | Polygon, Operation::ContractDeploy(deploy)) => {
				let encoded = EvmCall::deploy(deploy)?;
				let request = account::deploy_request(deploy);
				self.account(chain, &deploy.source, encoded, request, fee).await
			},
			(Stellar | Xrp, Operation::Transfer(transfer)) => {
				self.ledger_transfer(chain, transfer, fee).await
			},
			(Stellar | Xrp, Operation::Trustline(trustline)) => {
				self.ledger_trustline(chain, trustline, fee).await
			},
			(Stellar, Operation::ContractDeploy(deploy)) => {
				self.stellar_deploy(chain, deploy, fee).await
			},
			(Bitcoin | Litecoin | Dogecoin, Operation::UtxoTransfer(transfer)) => {
				self.utxo_transfer(chain, transfer, fee).await
			},
			(Hathor, Operation::UtxoTransfer(transfer)) => {
				self.hathor_transfer(chain, transfer, fee).await
			},
			(Hathor, Operation::TokenMint(supply)) => self.hathor_mint(chain, supply, fee).await,
			(Hathor, Operation::TokenMelt(supply)) => self.hathor_melt(chain, supply, fee).await,
			(Cardano, Operation::UtxoTransfer(transfer)) => {
				self.cardano_transfer(chain, transfer, fee).await
			},
			(protocol, operation) => Err(ConstructionError::UnsupportedProtocol {
				protocol,
				operation: operation.kind(),
			}),
		}
	}

	/// Source address of a single-key signer, checked against the key where
	/// the family allows it.
	fn source_address(
		&self,
		protocol: Protocol,
		source: &signer_types::Signer,
	) -> Result<String, ConstructionError> {
		self.signer
			.resolve_address(protocol, &source.private_key, source.address.as_deref())?
			.ok_or_else(|| {
				ConstructionError::Validation(format!(
					"source address is required for {}",
					protocol
				))
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{crafter, evm_transfer, FakeChain, EVM_ADDRESS};
	use signer_types::{FeeEstimate, OperationKind};

	#[tokio::test]
	async fn test_unsupported_pair_fails_before_network() {
		let chain = Arc::new(FakeChain::default());
		let crafter = crafter(chain.clone());
		let mut intent = evm_transfer("1", None);
		intent.protocol = Protocol::Dogecoin;

		let result = crafter.craft(intent).await;
		assert!(matches!(
			result,
			Err(ConstructionError::UnsupportedProtocol {
				protocol: Protocol::Dogecoin,
				operation: OperationKind::Transfer,
			})
		));
		assert_eq!(chain.calls.total(), 0);
	}

	#[tokio::test]
	async fn test_envelope_carries_protocol_kind_and_network() {
		let chain = Arc::new(FakeChain::default().with_nonce(EVM_ADDRESS, 0).with_fee(
			FeeEstimate::Gas {
				gas_limit: 21_000,
				gas_price: 1_000_000_000,
				chain_id: None,
			},
		));
		let crafter = crafter(chain.clone());
		let mut intent = evm_transfer("1", None);
		intent.testnet = Some(true);

		let envelope = crafter.craft(intent).await.unwrap();
		assert_eq!(envelope.protocol(), Protocol::Ethereum);
		assert_eq!(envelope.kind(), OperationKind::Transfer);
		assert!(envelope.testnet());
		assert!(envelope.signed_payload().starts_with("0x"));
	}

	#[tokio::test]
	async fn test_network_defaults_to_configuration() {
		let chain = Arc::new(FakeChain::default().with_nonce(EVM_ADDRESS, 0).with_fee(
			FeeEstimate::Gas {
				gas_limit: 21_000,
				gas_price: 1,
				chain_id: None,
			},
		));
		let crafter = crafter(chain.clone());

		let request = evm_transfer("1", None);
		let (chain_ref, prepared) = crafter.prepare(&request).await.unwrap();
		assert!(!chain_ref.testnet);
		let Prepared::Unsigned {
			tx: UnsignedTransaction::Evm(tx),
			..
		} = prepared
		else {
			panic!("expected an EVM transaction");
		};
		assert_eq!(tx.chain_id, 1);
	}

	#[tokio::test]
	async fn test_crafting_is_idempotent() {
		let chain = Arc::new(FakeChain::default().with_nonce(EVM_ADDRESS, 7).with_fee(
			FeeEstimate::Gas {
				gas_limit: 21_000,
				gas_price: 3,
				chain_id: Some(1),
			},
		));
		let crafter = crafter(chain.clone());
		let intent = evm_transfer("0.5", None);

		let first = crafter.craft(intent.clone()).await.unwrap();
		let second = crafter.craft(intent).await.unwrap();
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_broadcast_returns_receipt() {
		let chain = Arc::new(FakeChain::default());
		let crafter = crafter(chain.clone());
		let envelope = TransactionEnvelope::new(
			"0xdead".into(),
			Protocol::Ethereum,
			OperationKind::Transfer,
			false,
		);

		let receipt = crafter.broadcast(&envelope).await.unwrap();
		assert_eq!(receipt.tx_id, "0xbroadcast");
		assert_eq!(chain.broadcasts.lock().unwrap().len(), 1);
	}
}
