//! Chain state snapshots.
//!
//! These types describe what the chain data API returns for an address or a
//! transaction. They are fetched fresh for every construction call and are
//! treated as point-in-time snapshots.

use crate::utils::serde_helpers::{option_u64_from_str_or_number, u64_from_str_or_number};
use crate::Protocol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a mint authority output.
pub const MINT_AUTHORITY: u64 = 0b01;
/// Value of a melt authority output.
pub const MELT_AUTHORITY: u64 = 0b10;

/// Identifies a protocol on a specific network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainRef {
	pub protocol: Protocol,
	pub testnet: bool,
}

impl ChainRef {
	pub fn new(protocol: Protocol, testnet: bool) -> Self {
		Self { protocol, testnet }
	}
}

impl fmt::Display for ChainRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.testnet {
			write!(f, "{}-testnet", self.protocol)
		} else {
			write!(f, "{}", self.protocol)
		}
	}
}

/// Token identifier on multi-token output ledgers.
///
/// The native asset is represented by the sentinel `"00"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
	pub const NATIVE: &'static str = "00";

	pub fn native() -> Self {
		Self(Self::NATIVE.to_string())
	}

	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn is_native(&self) -> bool {
		self.0 == Self::NATIVE
	}

	/// Normalizes a caller-supplied token symbol.
	///
	/// An unset or empty symbol, the protocol's ticker and the sentinel itself
	/// all map to the native asset; anything else is taken as a token id.
	pub fn normalize(symbol: Option<&str>, protocol: Protocol) -> Self {
		match symbol.map(str::trim) {
			None | Some("") => Self::native(),
			Some(s) if s == Self::NATIVE || protocol.is_native_symbol(s) => Self::native(),
			Some(s) => Self(s.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Default for TokenId {
	fn default() -> Self {
		Self::native()
	}
}

impl fmt::Display for TokenId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// An output that has not been spent yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
	/// Hash of the transaction that created this output.
	pub tx_hash: String,
	/// Position of the output in that transaction.
	pub index: u32,
	#[serde(default)]
	pub token: TokenId,
	#[serde(deserialize_with = "u64_from_str_or_number")]
	pub value: u64,
	/// Set on mint/melt capability outputs; `value` then holds the capability mask.
	#[serde(default)]
	pub authority: bool,
	pub address: String,
}

impl UnspentOutput {
	pub fn outpoint(&self) -> (&str, u32) {
		(&self.tx_hash, self.index)
	}

	pub fn is_mint_authority(&self) -> bool {
		self.authority && self.value == MINT_AUTHORITY
	}

	pub fn is_melt_authority(&self) -> bool {
		self.authority && self.value == MELT_AUTHORITY
	}
}

/// One output of a resolved transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOutput {
	pub index: u32,
	#[serde(deserialize_with = "u64_from_str_or_number")]
	pub value: u64,
	#[serde(default)]
	pub token: TokenId,
	#[serde(default)]
	pub authority: bool,
	#[serde(default)]
	pub address: Option<String>,
	/// Locking script, hex encoded.
	#[serde(default)]
	pub script: Option<String>,
}

/// Transaction context needed to spend one of its outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
	pub hash: String,
	/// Raw transaction bytes, hex encoded.
	pub hex: String,
	#[serde(default)]
	pub block_hash: Option<String>,
	pub outputs: Vec<RawOutput>,
}

impl RawTransaction {
	pub fn output(&self, index: u32) -> Option<&RawOutput> {
		self.outputs.iter().find(|o| o.index == index)
	}
}

/// Address information returned by the chain data API.
///
/// Account chains fill `nonce`; ledger chains fill `sequence` and
/// `ledger_current_index`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
	#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
	pub nonce: Option<u64>,
	#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
	pub sequence: Option<u64>,
	#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
	pub ledger_current_index: Option<u64>,
}

/// Latest block, used as a validity anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAnchor {
	pub hash: String,
	#[serde(deserialize_with = "u64_from_str_or_number")]
	pub height: u64,
}

/// Point-in-time chain state required to build one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
	Account { nonce: u64 },
	Ledger { sequence: u64, ledger_index: u64 },
	Outputs(Vec<UnspentOutput>),
}
