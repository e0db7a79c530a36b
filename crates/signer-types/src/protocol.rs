//! Protocol identifiers and their classification.
//!
//! Every supported blockchain is a variant of the closed [`Protocol`] enum.
//! Construction logic never branches on strings: it asks the protocol for its
//! [`AccountingModel`], its [`SignatureFamily`] and whether a given
//! [`OperationKind`] is declared for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported blockchain protocols.
///
/// Serialized using the ticker of the native asset (e.g. `"ETH"`), which is
/// also the key used in configuration tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
	#[serde(rename = "ETH")]
	Ethereum,
	#[serde(rename = "BSC")]
	Bsc,
	#[serde(rename = "MATIC")]
	Polygon,
	#[serde(rename = "KLAY")]
	Klaytn,
	#[serde(rename = "XLM")]
	Stellar,
	#[serde(rename = "XRP")]
	Xrp,
	#[serde(rename = "BTC")]
	Bitcoin,
	#[serde(rename = "LTC")]
	Litecoin,
	#[serde(rename = "DOGE")]
	Dogecoin,
	#[serde(rename = "HTR")]
	Hathor,
	#[serde(rename = "ADA")]
	Cardano,
}

/// How a ledger orders and authorizes transactions from one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountingModel {
	/// Strictly increasing per-address nonce.
	Account,
	/// Sequence number plus a bounded ledger validity window.
	LedgerSequence,
	/// Consumes previously unspent discrete outputs.
	UnspentOutput,
}

/// Signature scheme used by the local signing primitive for a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureFamily {
	Evm,
	Secp256k1,
	Ed25519,
}

/// Semantic type of a constructed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
	Transfer,
	ContractCall,
	ContractDeploy,
	TokenMint,
	TokenMelt,
	Trustline,
}

impl fmt::Display for OperationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OperationKind::Transfer => "TRANSFER",
			OperationKind::ContractCall => "CONTRACT_CALL",
			OperationKind::ContractDeploy => "CONTRACT_DEPLOY",
			OperationKind::TokenMint => "TOKEN_MINT",
			OperationKind::TokenMelt => "TOKEN_MELT",
			OperationKind::Trustline => "TRUSTLINE",
		};
		f.write_str(name)
	}
}

/// Error returned when a protocol identifier cannot be parsed.
#[derive(Debug, Error)]
#[error("Unknown protocol: {0}")]
pub struct UnknownProtocol(pub String);

impl Protocol {
	/// All protocols in declaration order.
	pub const ALL: [Protocol; 11] = [
		Protocol::Ethereum,
		Protocol::Bsc,
		Protocol::Polygon,
		Protocol::Klaytn,
		Protocol::Stellar,
		Protocol::Xrp,
		Protocol::Bitcoin,
		Protocol::Litecoin,
		Protocol::Dogecoin,
		Protocol::Hathor,
		Protocol::Cardano,
	];

	/// Ticker of the native asset, also used as the configuration key.
	pub fn ticker(&self) -> &'static str {
		match self {
			Protocol::Ethereum => "ETH",
			Protocol::Bsc => "BSC",
			Protocol::Polygon => "MATIC",
			Protocol::Klaytn => "KLAY",
			Protocol::Stellar => "XLM",
			Protocol::Xrp => "XRP",
			Protocol::Bitcoin => "BTC",
			Protocol::Litecoin => "LTC",
			Protocol::Dogecoin => "DOGE",
			Protocol::Hathor => "HTR",
			Protocol::Cardano => "ADA",
		}
	}

	/// Path segment used by the chain data API.
	pub fn path_segment(&self) -> &'static str {
		match self {
			Protocol::Ethereum => "ethereum",
			Protocol::Bsc => "bsc",
			Protocol::Polygon => "polygon",
			Protocol::Klaytn => "klaytn",
			Protocol::Stellar => "xlm",
			Protocol::Xrp => "xrp",
			Protocol::Bitcoin => "bitcoin",
			Protocol::Litecoin => "litecoin",
			Protocol::Dogecoin => "dogecoin",
			Protocol::Hathor => "hathor",
			Protocol::Cardano => "cardano",
		}
	}

	pub fn model(&self) -> AccountingModel {
		match self {
			Protocol::Ethereum | Protocol::Bsc | Protocol::Polygon | Protocol::Klaytn => {
				AccountingModel::Account
			},
			Protocol::Stellar | Protocol::Xrp => AccountingModel::LedgerSequence,
			Protocol::Bitcoin
			| Protocol::Litecoin
			| Protocol::Dogecoin
			| Protocol::Hathor
			| Protocol::Cardano => AccountingModel::UnspentOutput,
		}
	}

	pub fn family(&self) -> SignatureFamily {
		match self {
			Protocol::Ethereum | Protocol::Bsc | Protocol::Polygon | Protocol::Klaytn => {
				SignatureFamily::Evm
			},
			Protocol::Stellar | Protocol::Cardano => SignatureFamily::Ed25519,
			Protocol::Xrp
			| Protocol::Bitcoin
			| Protocol::Litecoin
			| Protocol::Dogecoin
			| Protocol::Hathor => SignatureFamily::Secp256k1,
		}
	}

	/// Number of decimals between the native asset's display unit and its
	/// smallest on-chain unit.
	pub fn decimals(&self) -> u32 {
		match self {
			Protocol::Ethereum | Protocol::Bsc | Protocol::Polygon | Protocol::Klaytn => 18,
			Protocol::Stellar => 7,
			Protocol::Xrp | Protocol::Cardano => 6,
			Protocol::Bitcoin | Protocol::Litecoin | Protocol::Dogecoin => 8,
			Protocol::Hathor => 2,
		}
	}

	/// Whether a symbol names this protocol's native asset.
	pub fn is_native_symbol(&self, symbol: &str) -> bool {
		symbol.eq_ignore_ascii_case(self.ticker())
	}

	/// Default EIP-155 chain id for account chains.
	pub fn default_chain_id(&self, testnet: bool) -> Option<u64> {
		let (mainnet, test) = match self {
			Protocol::Ethereum => (1, 11_155_111),
			Protocol::Bsc => (56, 97),
			Protocol::Polygon => (137, 80_002),
			Protocol::Klaytn => (8217, 1001),
			_ => return None,
		};
		Some(if testnet { test } else { mainnet })
	}

	/// Ledgers whose outputs carry a per-output token identifier.
	pub fn is_multi_token(&self) -> bool {
		matches!(self, Protocol::Hathor)
	}

	/// Ledgers built and combined by the remote construction collaborator.
	pub fn is_multi_phase(&self) -> bool {
		matches!(self, Protocol::Cardano)
	}

	/// Closed table of the operations declared for each protocol.
	pub fn supports(&self, kind: OperationKind) -> bool {
		use OperationKind::*;
		match self {
			Protocol::Ethereum | Protocol::Bsc | Protocol::Polygon => {
				matches!(kind, Transfer | ContractCall | ContractDeploy)
			},
			Protocol::Klaytn => matches!(kind, Transfer | ContractCall),
			Protocol::Stellar => matches!(kind, Transfer | Trustline | ContractDeploy),
			Protocol::Xrp => matches!(kind, Transfer | Trustline),
			Protocol::Bitcoin | Protocol::Litecoin | Protocol::Dogecoin | Protocol::Cardano => {
				kind == Transfer
			},
			Protocol::Hathor => matches!(kind, Transfer | TokenMint | TokenMelt),
		}
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.ticker())
	}
}

impl FromStr for Protocol {
	type Err = UnknownProtocol;

	/// Accepts either the ticker or the API path segment, case-insensitively.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Protocol::ALL
			.into_iter()
			.find(|p| {
				p.ticker().eq_ignore_ascii_case(s) || p.path_segment().eq_ignore_ascii_case(s)
			})
			.ok_or_else(|| UnknownProtocol(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_ticker_and_path_segment() {
		assert_eq!("eth".parse::<Protocol>().unwrap(), Protocol::Ethereum);
		assert_eq!("hathor".parse::<Protocol>().unwrap(), Protocol::Hathor);
		assert_eq!("MATIC".parse::<Protocol>().unwrap(), Protocol::Polygon);
		assert!("solana".parse::<Protocol>().is_err());
	}

	#[test]
	fn test_serde_uses_ticker() {
		let json = serde_json::to_string(&Protocol::Stellar).unwrap();
		assert_eq!(json, "\"XLM\"");
		let parsed: Protocol = serde_json::from_str("\"DOGE\"").unwrap();
		assert_eq!(parsed, Protocol::Dogecoin);
	}

	#[test]
	fn test_models_cover_every_protocol() {
		let accounts = Protocol::ALL
			.iter()
			.filter(|p| p.model() == AccountingModel::Account)
			.count();
		let ledgers = Protocol::ALL
			.iter()
			.filter(|p| p.model() == AccountingModel::LedgerSequence)
			.count();
		let outputs = Protocol::ALL
			.iter()
			.filter(|p| p.model() == AccountingModel::UnspentOutput)
			.count();
		assert_eq!(accounts + ledgers + outputs, Protocol::ALL.len());
		assert_eq!(ledgers, 2);
	}

	#[test]
	fn test_contract_deploy_declared_set() {
		let deployable: Vec<Protocol> = Protocol::ALL
			.into_iter()
			.filter(|p| p.supports(OperationKind::ContractDeploy))
			.collect();
		assert_eq!(
			deployable,
			vec![
				Protocol::Ethereum,
				Protocol::Bsc,
				Protocol::Polygon,
				Protocol::Stellar
			]
		);
	}

	#[test]
	fn test_default_chain_ids() {
		assert_eq!(Protocol::Ethereum.default_chain_id(false), Some(1));
		assert_eq!(Protocol::Bsc.default_chain_id(true), Some(97));
		assert_eq!(Protocol::Bitcoin.default_chain_id(false), None);
	}
}
