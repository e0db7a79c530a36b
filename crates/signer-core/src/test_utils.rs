//! In-memory collaborators and fixtures for engine tests.

use crate::builders::cardano;
use crate::engine::{Collaborators, TransactionCrafter};
use async_trait::async_trait;
use rust_decimal::Decimal;
use signer_account::implementations::{
	ed25519::Ed25519Signer, evm::EvmSigner, secp256k1::Secp256k1Signer,
};
use signer_account::{LocalSigner, SigningError, SigningPrimitive};
use signer_chain::{
	BroadcastInterface, ChainError, ChainStateClient, ConstructionInterface, FeeQuotation,
};
use signer_config::builders::ConfigBuilder;
use signer_types::{
	AccountIdentifier, AccountInfo, Amount, BlockAnchor, BroadcastReceipt, ChainRef,
	CombineRequest, CombineResponse, DetachedSignature, FeeEstimate, FeeQuoteRequest, Intent,
	KeyRing, MetadataRequest, MetadataResponse, Operation, PayloadsRequest, PayloadsResponse,
	Protocol, RawOutput, RawTransaction, SecretString, SignatureFamily, Signer, SigningPayload,
	TokenId, TransactionEnvelope, TransferIntent, UnsignedTransaction, UnspentOutput,
	OPERATION_INPUT,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

pub const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const EVM_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const EVM_RECIPIENT: &str = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85";
pub const RELAY_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const USDC_CONTRACT: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

pub const SECP_KEY_A: &str = "0101010101010101010101010101010101010101010101010101010101010101";
pub const SECP_KEY_B: &str = "0202020202020202020202020202020202020202020202020202020202020202";
pub const ED_KEY_A: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
pub const ED_KEY_B: &str = "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb";

pub fn dec(s: &str) -> Decimal {
	Decimal::from_str(s).unwrap()
}

/// An unspent output at index 0 of `hash`, owned by `HAddress`.
pub fn utxo(hash: &str, token: &str, value: u64, authority: bool) -> UnspentOutput {
	UnspentOutput {
		tx_hash: hash.to_string(),
		index: 0,
		token: TokenId::new(token),
		value,
		authority,
		address: "HAddress".to_string(),
	}
}

/// A transaction whose outputs carry `values` at consecutive indexes.
pub fn raw_transaction(hash: &str, values: &[u64]) -> RawTransaction {
	RawTransaction {
		hash: hash.to_string(),
		hex: format!("raw-{}", hash),
		block_hash: Some(format!("block-{}", hash)),
		outputs: values
			.iter()
			.enumerate()
			.map(|(index, value)| RawOutput {
				index: index as u32,
				value: *value,
				token: TokenId::native(),
				authority: false,
				address: Some("HAddress".to_string()),
				script: Some(format!("script-{}-{}", hash, index)),
			})
			.collect(),
	}
}

/// A native EVM transfer of `amount` ETH from the test key.
pub fn evm_transfer(amount: &str, memo: Option<&str>) -> Intent {
	Intent {
		protocol: Protocol::Ethereum,
		testnet: None,
		fee: None,
		operation: Operation::Transfer(TransferIntent {
			source: Signer {
				private_key: SecretString::from(EVM_KEY),
				address: None,
			},
			to: EVM_RECIPIENT.to_string(),
			amount: dec(amount),
			currency: Some("ETH".to_string()),
			contract_address: None,
			decimals: None,
			issuer: None,
			memo: memo.map(str::to_string),
			fee_currency: None,
		}),
	}
}

pub fn config() -> signer_config::Config {
	ConfigBuilder::new()
		.relay_contract(Protocol::Ethereum, RELAY_CONTRACT)
		.token(Protocol::Ethereum, "USDC", USDC_CONTRACT, 6)
		.build()
}

pub fn crafter(chain: Arc<FakeChain>) -> TransactionCrafter {
	crafter_with(chain, LocalSigner::new())
}

pub fn crafter_with(chain: Arc<FakeChain>, signer: LocalSigner) -> TransactionCrafter {
	TransactionCrafter::new(config(), Collaborators::from_client(chain), signer)
}

/// Built-in primitives wrapped to count every signature produced.
pub fn counting_signer() -> (LocalSigner, Arc<AtomicUsize>) {
	let count = Arc::new(AtomicUsize::new(0));
	let primitives: Vec<Box<dyn SigningPrimitive>> =
		vec![Box::new(EvmSigner), Box::new(Secp256k1Signer), Box::new(Ed25519Signer)];
	let signer = primitives
		.into_iter()
		.fold(LocalSigner::empty(), |signer, inner| {
			signer.with_primitive(Box::new(CountingPrimitive {
				inner,
				count: count.clone(),
			}))
		});
	(signer, count)
}

struct CountingPrimitive {
	inner: Box<dyn SigningPrimitive>,
	count: Arc<AtomicUsize>,
}

impl SigningPrimitive for CountingPrimitive {
	fn family(&self) -> SignatureFamily {
		self.inner.family()
	}

	fn derive_address(&self, key: &SecretString) -> Result<Option<String>, SigningError> {
		self.inner.derive_address(key)
	}

	fn public_key(&self, key: &SecretString) -> Result<String, SigningError> {
		self.inner.public_key(key)
	}

	fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		keys: &KeyRing<'_>,
	) -> Result<String, SigningError> {
		self.count.fetch_add(1, Ordering::SeqCst);
		self.inner.sign_transaction(tx, keys)
	}

	fn sign_payload(
		&self,
		payload: &[u8],
		key: &SecretString,
	) -> Result<DetachedSignature, SigningError> {
		self.count.fetch_add(1, Ordering::SeqCst);
		self.inner.sign_payload(payload, key)
	}
}

/// Number of calls made to each remote operation.
#[derive(Debug, Default)]
pub struct CallLog {
	unspent: AtomicUsize,
	transactions: AtomicUsize,
	accounts: AtomicUsize,
	blocks: AtomicUsize,
	quotes: AtomicUsize,
	metadata: AtomicUsize,
	payloads: AtomicUsize,
	combines: AtomicUsize,
	broadcasts: AtomicUsize,
}

impl CallLog {
	fn hit(counter: &AtomicUsize) {
		counter.fetch_add(1, Ordering::SeqCst);
	}

	pub fn total(&self) -> usize {
		[
			&self.unspent,
			&self.transactions,
			&self.accounts,
			&self.blocks,
			&self.quotes,
			&self.metadata,
			&self.payloads,
			&self.combines,
			&self.broadcasts,
		]
		.iter()
		.map(|c| c.load(Ordering::SeqCst))
		.sum()
	}

	pub fn accounts(&self) -> usize {
		self.accounts.load(Ordering::SeqCst)
	}

	pub fn quotes(&self) -> usize {
		self.quotes.load(Ordering::SeqCst)
	}

	pub fn metadata(&self) -> usize {
		self.metadata.load(Ordering::SeqCst)
	}

	pub fn payloads(&self) -> usize {
		self.payloads.load(Ordering::SeqCst)
	}

	pub fn combines(&self) -> usize {
		self.combines.load(Ordering::SeqCst)
	}
}

/// Chain API double backed by fixed data.
pub struct FakeChain {
	pub outputs: HashMap<String, Vec<UnspentOutput>>,
	pub transactions: HashMap<String, RawTransaction>,
	pub accounts: HashMap<String, AccountInfo>,
	pub block_height: u64,
	pub fee: Option<FeeEstimate>,
	pub suggested_fee: Option<u64>,
	/// Addresses the payloads call asks signatures for on top of the inputs.
	pub extra_payload_addresses: Vec<String>,
	/// Status returned by every account read when set.
	pub account_failure: Option<u16>,
	/// Status returned by every fee quote when set.
	pub quote_failure: Option<u16>,
	/// Account reads and fee quotes wait here until both have arrived.
	pub rendezvous: Option<Barrier>,
	pub calls: CallLog,
	pub quote_requests: Mutex<Vec<FeeQuoteRequest>>,
	pub metadata_requests: Mutex<Vec<MetadataRequest>>,
	pub payload_requests: Mutex<Vec<PayloadsRequest>>,
	pub combine_requests: Mutex<Vec<CombineRequest>>,
	pub broadcasts: Mutex<Vec<TransactionEnvelope>>,
}

impl Default for FakeChain {
	fn default() -> Self {
		Self {
			outputs: HashMap::new(),
			transactions: HashMap::new(),
			accounts: HashMap::new(),
			block_height: 5_000,
			fee: None,
			suggested_fee: None,
			extra_payload_addresses: Vec::new(),
			account_failure: None,
			quote_failure: None,
			rendezvous: None,
			calls: CallLog::default(),
			quote_requests: Mutex::new(Vec::new()),
			metadata_requests: Mutex::new(Vec::new()),
			payload_requests: Mutex::new(Vec::new()),
			combine_requests: Mutex::new(Vec::new()),
			broadcasts: Mutex::new(Vec::new()),
		}
	}
}

impl FakeChain {
	pub fn with_nonce(self, address: &str, nonce: u64) -> Self {
		self.with_account(
			address,
			AccountInfo {
				nonce: Some(nonce),
				..Default::default()
			},
		)
	}

	pub fn with_account(mut self, address: &str, info: AccountInfo) -> Self {
		self.accounts.insert(address.to_string(), info);
		self
	}

	pub fn with_fee(mut self, fee: FeeEstimate) -> Self {
		self.fee = Some(fee);
		self
	}

	pub fn with_suggested_fee(mut self, fee: u64) -> Self {
		self.suggested_fee = Some(fee);
		self
	}

	pub fn with_extra_payload(mut self, address: &str) -> Self {
		self.extra_payload_addresses.push(address.to_string());
		self
	}

	pub fn failing_account(mut self, status: u16) -> Self {
		self.account_failure = Some(status);
		self
	}

	pub fn failing_quote(mut self, status: u16) -> Self {
		self.quote_failure = Some(status);
		self
	}

	/// Makes the account read and the fee quote of one construction block
	/// until the other one is in flight too.
	pub fn with_rendezvous(mut self) -> Self {
		self.rendezvous = Some(Barrier::new(2));
		self
	}

	pub fn with_transaction(mut self, raw: RawTransaction) -> Self {
		self.transactions.insert(raw.hash.clone(), raw);
		self
	}

	/// Registers `output` as unspent for its address and records it in its
	/// creating transaction.
	pub fn with_utxo(mut self, output: UnspentOutput) -> Self {
		let raw = self
			.transactions
			.entry(output.tx_hash.clone())
			.or_insert_with(|| RawTransaction {
				hash: output.tx_hash.clone(),
				hex: format!("raw-{}", output.tx_hash),
				block_hash: Some(format!("block-{}", output.tx_hash)),
				outputs: Vec::new(),
			});
		raw.outputs.push(RawOutput {
			index: output.index,
			value: output.value,
			token: output.token.clone(),
			authority: output.authority,
			address: Some(output.address.clone()),
			script: Some(format!("script-{}-{}", output.tx_hash, output.index)),
		});
		self.outputs
			.entry(output.address.clone())
			.or_default()
			.push(output);
		self
	}

	fn not_found(what: &str) -> ChainError {
		ChainError::Request {
			status: 404,
			body: format!("{} not found", what),
		}
	}

	fn unavailable(status: u16, what: &str) -> ChainError {
		ChainError::Request {
			status,
			body: format!("{} unavailable", what),
		}
	}

	async fn meet(&self) {
		if let Some(barrier) = &self.rendezvous {
			barrier.wait().await;
		}
	}
}

#[async_trait]
impl ChainStateClient for FakeChain {
	async fn unspent_outputs(
		&self,
		_chain: ChainRef,
		address: &str,
	) -> Result<Vec<UnspentOutput>, ChainError> {
		CallLog::hit(&self.calls.unspent);
		Ok(self.outputs.get(address).cloned().unwrap_or_default())
	}

	async fn transaction(
		&self,
		_chain: ChainRef,
		hash: &str,
	) -> Result<RawTransaction, ChainError> {
		CallLog::hit(&self.calls.transactions);
		self.transactions
			.get(hash)
			.cloned()
			.ok_or_else(|| Self::not_found(hash))
	}

	async fn account(&self, _chain: ChainRef, address: &str) -> Result<AccountInfo, ChainError> {
		CallLog::hit(&self.calls.accounts);
		self.meet().await;
		if let Some(status) = self.account_failure {
			return Err(Self::unavailable(status, address));
		}
		self.accounts
			.get(address)
			.cloned()
			.ok_or_else(|| Self::not_found(address))
	}

	async fn latest_block(&self, _chain: ChainRef) -> Result<BlockAnchor, ChainError> {
		CallLog::hit(&self.calls.blocks);
		Ok(BlockAnchor {
			hash: "block-latest".to_string(),
			height: self.block_height,
		})
	}
}

#[async_trait]
impl FeeQuotation for FakeChain {
	async fn quote(
		&self,
		_chain: ChainRef,
		request: &FeeQuoteRequest,
	) -> Result<FeeEstimate, ChainError> {
		CallLog::hit(&self.calls.quotes);
		self.quote_requests.lock().unwrap().push(request.clone());
		self.meet().await;
		if let Some(status) = self.quote_failure {
			return Err(Self::unavailable(status, "fee quote"));
		}
		self.fee.clone().ok_or_else(|| Self::not_found("fee quote"))
	}
}

#[async_trait]
impl ConstructionInterface for FakeChain {
	async fn metadata(
		&self,
		_chain: ChainRef,
		request: &MetadataRequest,
	) -> Result<MetadataResponse, ChainError> {
		CallLog::hit(&self.calls.metadata);
		self.metadata_requests.lock().unwrap().push(request.clone());
		Ok(MetadataResponse {
			metadata: serde_json::json!({ "ttl": self.block_height + 1_000 }),
			suggested_fee: self
				.suggested_fee
				.map(|fee| vec![Amount::new(fee as i128, cardano::currency())])
				.unwrap_or_default(),
		})
	}

	/// One payload per distinct input address, then the extra addresses.
	async fn payloads(
		&self,
		_chain: ChainRef,
		request: &PayloadsRequest,
	) -> Result<PayloadsResponse, ChainError> {
		CallLog::hit(&self.calls.payloads);
		self.payload_requests.lock().unwrap().push(request.clone());

		let mut addresses: Vec<&str> = Vec::new();
		for operation in &request.operations {
			let address = operation.account.address.as_str();
			if operation.kind == OPERATION_INPUT && !addresses.contains(&address) {
				addresses.push(address);
			}
		}
		addresses.extend(self.extra_payload_addresses.iter().map(String::as_str));
		Ok(PayloadsResponse {
			unsigned_transaction: format!("unsigned-{}", request.operations.len()),
			payloads: addresses
				.into_iter()
				.map(|address| SigningPayload {
					account_identifier: AccountIdentifier {
						address: address.to_string(),
					},
					hex_bytes: hex::encode(format!("payload-{}", address)),
					signature_type: Some(cardano::SIGNATURE_TYPE.to_string()),
				})
				.collect(),
		})
	}

	async fn combine(
		&self,
		_chain: ChainRef,
		request: &CombineRequest,
	) -> Result<CombineResponse, ChainError> {
		CallLog::hit(&self.calls.combines);
		self.combine_requests.lock().unwrap().push(request.clone());
		Ok(CombineResponse {
			signed_transaction: format!("signed:{}", request.signatures.len()),
		})
	}
}

#[async_trait]
impl BroadcastInterface for FakeChain {
	async fn broadcast(
		&self,
		envelope: &TransactionEnvelope,
	) -> Result<BroadcastReceipt, ChainError> {
		CallLog::hit(&self.calls.broadcasts);
		self.broadcasts.lock().unwrap().push(envelope.clone());
		Ok(BroadcastReceipt {
			tx_id: "0xbroadcast".to_string(),
		})
	}
}
