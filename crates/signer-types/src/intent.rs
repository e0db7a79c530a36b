//! Construction intents.
//!
//! An [`Intent`] describes the on-chain effect a caller wants: which protocol,
//! which operation, who signs and an optional fee override. Intents are
//! consumed by value by the construction engine.

use crate::{FeeOverride, OperationKind, Protocol, SecretString};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to construct and sign one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
	pub protocol: Protocol,
	/// Network selector. Falls back to the configured default when unset.
	#[serde(default)]
	pub testnet: Option<bool>,
	#[serde(default)]
	pub fee: Option<FeeOverride>,
	pub operation: Operation,
}

impl Intent {
	pub fn kind(&self) -> OperationKind {
		self.operation.kind()
	}
}

/// The operation to perform, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
	/// Value transfer on account and ledger chains.
	Transfer(TransferIntent),
	/// Value transfer on output chains.
	UtxoTransfer(UtxoTransferIntent),
	ContractCall(ContractCallIntent),
	ContractDeploy(ContractDeployIntent),
	TokenMint(TokenSupplyIntent),
	TokenMelt(TokenSupplyIntent),
	Trustline(TrustlineIntent),
}

impl Operation {
	pub fn kind(&self) -> OperationKind {
		match self {
			Operation::Transfer(_) | Operation::UtxoTransfer(_) => OperationKind::Transfer,
			Operation::ContractCall(_) => OperationKind::ContractCall,
			Operation::ContractDeploy(_) => OperationKind::ContractDeploy,
			Operation::TokenMint(_) => OperationKind::TokenMint,
			Operation::TokenMelt(_) => OperationKind::TokenMelt,
			Operation::Trustline(_) => OperationKind::Trustline,
		}
	}
}

/// Single-key signing credential for account and ledger chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
	pub private_key: SecretString,
	/// Source address. Derived from the key when absent.
	#[serde(default)]
	pub address: Option<String>,
}

/// Address whose unspent outputs may be spent, with its key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressKey {
	pub address: String,
	pub private_key: SecretString,
}

/// An explicitly chosen output to spend, with its key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputKey {
	pub tx_hash: String,
	pub index: u32,
	pub private_key: SecretString,
}

/// Where the inputs of an output-chain transaction come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UtxoSource {
	/// Discover unspent outputs owned by these addresses.
	#[serde(rename = "fromAddress")]
	Addresses(Vec<AddressKey>),
	/// Spend exactly these outputs.
	#[serde(rename = "fromUtxo")]
	Inputs(Vec<InputKey>),
}

impl UtxoSource {
	pub fn is_empty(&self) -> bool {
		match self {
			UtxoSource::Addresses(keys) => keys.is_empty(),
			UtxoSource::Inputs(keys) => keys.is_empty(),
		}
	}

	/// First source address, used as the default change address.
	pub fn first_address(&self) -> Option<&str> {
		match self {
			UtxoSource::Addresses(keys) => keys.first().map(|k| k.address.as_str()),
			UtxoSource::Inputs(_) => None,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
	pub source: Signer,
	pub to: String,
	/// Amount in display units of the transferred asset.
	pub amount: Decimal,
	/// Asset symbol. `None` or the native ticker selects the native asset.
	#[serde(default)]
	pub currency: Option<String>,
	/// Token contract on account chains.
	#[serde(default)]
	pub contract_address: Option<String>,
	/// Token decimals for `contract_address` transfers (default 18).
	#[serde(default)]
	pub decimals: Option<u32>,
	/// Issuer of a non-native asset on ledger chains.
	#[serde(default)]
	pub issuer: Option<String>,
	#[serde(default)]
	pub memo: Option<String>,
	/// Fee currency hint forwarded to the quotation service.
	#[serde(default)]
	pub fee_currency: Option<String>,
}

/// One payee of an output-chain transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
	pub address: String,
	pub amount: Decimal,
	/// Token id on multi-token ledgers. `None` means the native asset.
	#[serde(default)]
	pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoTransferIntent {
	pub source: UtxoSource,
	pub outputs: Vec<Recipient>,
	/// Defaults to the first source address.
	#[serde(default)]
	pub change_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCallIntent {
	pub source: Signer,
	pub contract_address: String,
	/// Human-readable function signature, e.g. `transfer(address,uint256)`.
	pub method: String,
	#[serde(default)]
	pub params: Vec<String>,
	/// Native value attached to the call, in display units.
	#[serde(default)]
	pub amount: Option<Decimal>,
	#[serde(default)]
	pub contract_abi: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployIntent {
	pub source: Signer,
	/// Contract code, hex encoded.
	pub bytecode: String,
	/// ABI-encoded constructor arguments, hex encoded.
	#[serde(default)]
	pub constructor_args: Option<String>,
	#[serde(default)]
	pub contract_name: Option<String>,
}

/// Mint or melt of a custom token on a multi-token ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSupplyIntent {
	pub source: UtxoSource,
	/// Token id.
	pub token: String,
	pub amount: Decimal,
	/// Receives minted tokens. Defaults to the change address.
	#[serde(default)]
	pub destination: Option<String>,
	#[serde(default)]
	pub change_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustlineIntent {
	pub source: Signer,
	/// Asset code.
	pub currency: String,
	pub issuer: String,
	/// Trust limit in display units. Unset means the ledger maximum.
	#[serde(default)]
	pub limit: Option<Decimal>,
}
