//! Unsigned transaction structures.
//!
//! Builders produce one of these from an intent, chain state and fee quote.
//! Signing inputs reference keys by position in a [`KeyRing`] so that no key
//! material is copied into the transaction itself.

use crate::{SecretString, TokenId};
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Keys borrowed from the caller's intent, indexed by signing inputs.
#[derive(Debug, Default)]
pub struct KeyRing<'k> {
	keys: Vec<&'k SecretString>,
}

impl<'k> KeyRing<'k> {
	pub fn new() -> Self {
		Self { keys: Vec::new() }
	}

	pub fn single(key: &'k SecretString) -> Self {
		Self { keys: vec![key] }
	}

	/// Adds a key and returns its index. A key already present is not added
	/// twice.
	pub fn push(&mut self, key: &'k SecretString) -> usize {
		if let Some(pos) = self.keys.iter().position(|k| *k == key) {
			return pos;
		}
		self.keys.push(key);
		self.keys.len() - 1
	}

	pub fn get(&self, index: usize) -> Option<&'k SecretString> {
		self.keys.get(index).copied()
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &'k SecretString> + '_ {
		self.keys.iter().copied()
	}
}

/// Transaction ready to be signed, one variant per protocol family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum UnsignedTransaction {
	Evm(EvmTransaction),
	Stellar(StellarTransaction),
	Xrp(XrpTransaction),
	Utxo(UtxoTransaction),
	Hathor(HathorTransaction),
}

/// Legacy (EIP-155) EVM transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransaction {
	pub chain_id: u64,
	pub nonce: u64,
	pub gas_price: u128,
	pub gas_limit: u64,
	/// `None` creates a contract.
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StellarAsset {
	Native,
	Credit { code: String, issuer: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StellarOperation {
	Payment {
		destination: String,
		asset: StellarAsset,
		/// Amount in stroops.
		amount: u64,
	},
	ChangeTrust {
		asset: StellarAsset,
		/// Trust limit in stroops; `None` means the maximum.
		limit: Option<u64>,
	},
	UploadContractWasm {
		/// Contract code, hex encoded.
		wasm: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StellarTransaction {
	pub source_account: String,
	/// Total fee in stroops.
	pub fee: u64,
	pub sequence: u64,
	/// Last ledger in which the transaction may be included.
	pub max_ledger: u64,
	pub memo: Option<String>,
	pub operations: Vec<StellarOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XrpAmount {
	/// Native amount in drops.
	Drops(u64),
	#[serde(rename_all = "camelCase")]
	Issued {
		currency: String,
		issuer: String,
		value: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "TransactionType")]
pub enum XrpOperation {
	#[serde(rename_all = "PascalCase")]
	Payment {
		destination: String,
		amount: XrpAmount,
	},
	#[serde(rename_all = "PascalCase")]
	TrustSet { limit_amount: XrpAmount },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XrpTransaction {
	pub account: String,
	/// Fee in drops.
	pub fee: u64,
	pub sequence: u64,
	pub last_ledger_sequence: u64,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub memos: Vec<String>,
	#[serde(flatten)]
	pub operation: XrpOperation,
}

/// Spent output on a native-asset output chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoInput {
	pub tx_hash: String,
	pub index: u32,
	pub value: u64,
	/// Hex encoded transaction that created the output.
	pub prev_tx_hex: String,
	pub block_hash: Option<String>,
	/// Locking script of the spent output.
	pub script: Option<String>,
	/// Position of the spending key in the [`KeyRing`].
	pub key_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoOutput {
	pub address: String,
	pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoTransaction {
	pub inputs: Vec<UtxoInput>,
	pub outputs: Vec<UtxoOutput>,
	pub fee: u64,
}

impl UtxoTransaction {
	pub fn input_total(&self) -> u64 {
		self.inputs.iter().map(|i| i.value).sum()
	}

	pub fn output_total(&self) -> u64 {
		self.outputs.iter().map(|o| o.value).sum()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HathorInput {
	pub tx_hash: String,
	pub index: u32,
	pub key_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HathorOutput {
	pub address: String,
	/// Token units, or the capability mask for authority outputs.
	pub value: u64,
	pub token: TokenId,
	pub authority: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HathorTransaction {
	pub inputs: Vec<HathorInput>,
	pub outputs: Vec<HathorOutput>,
	/// Non-native tokens referenced by the outputs, in first-seen order.
	pub tokens: Vec<TokenId>,
}

impl HathorTransaction {
	/// Collects the distinct non-native tokens of `outputs`.
	pub fn token_list(outputs: &[HathorOutput]) -> Vec<TokenId> {
		let mut tokens: Vec<TokenId> = Vec::new();
		for output in outputs {
			if !output.token.is_native() && !tokens.contains(&output.token) {
				tokens.push(output.token.clone());
			}
		}
		tokens
	}
}

/// Signature produced over a canonical transaction preimage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedSignature {
	/// Hex encoded public key.
	pub public_key: String,
	/// Hex encoded signature.
	pub signature: String,
}

/// Unsigned transaction together with its signatures, as produced by the
/// digest signers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedSignedTransaction {
	pub transaction: UnsignedTransaction,
	pub signatures: Vec<DetachedSignature>,
}
