//! Types for remote-assisted construction.
//!
//! Multi-phase ledgers are built by a construction service: the client
//! submits a list of balance-changing operations, receives a suggested fee,
//! then signing payloads, and finally submits the signatures to be combined
//! into the network transaction.

use serde::{Deserialize, Serialize};

pub const OPERATION_INPUT: &str = "input";
pub const OPERATION_OUTPUT: &str = "output";
pub const COIN_SPENT: &str = "coin_spent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
	pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
	pub symbol: String,
	pub decimals: u32,
}

/// Signed amount in the smallest unit. Inputs are negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
	pub value: String,
	pub currency: Currency,
}

impl Amount {
	pub fn new(value: i128, currency: Currency) -> Self {
		Self {
			value: value.to_string(),
			currency,
		}
	}

	/// Parses the amount value, failing on anything but an integer.
	pub fn parse_value(&self) -> Option<i128> {
		self.value.trim().parse().ok()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
	pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinIdentifier {
	/// `<tx_hash>:<index>`
	pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinChange {
	pub coin_identifier: CoinIdentifier,
	pub coin_action: String,
}

/// One balance change of a construction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionOperation {
	pub operation_identifier: OperationIdentifier,
	#[serde(rename = "type")]
	pub kind: String,
	pub account: AccountIdentifier,
	pub amount: Amount,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub coin_change: Option<CoinChange>,
}

impl ConstructionOperation {
	/// Operation spending the output `tx_hash:index`.
	pub fn input(
		index: u64,
		address: &str,
		tx_hash: &str,
		output_index: u32,
		value: u64,
		currency: Currency,
	) -> Self {
		Self {
			operation_identifier: OperationIdentifier { index },
			kind: OPERATION_INPUT.to_string(),
			account: AccountIdentifier {
				address: address.to_string(),
			},
			amount: Amount::new(-(value as i128), currency),
			coin_change: Some(CoinChange {
				coin_identifier: CoinIdentifier {
					identifier: format!("{}:{}", tx_hash, output_index),
				},
				coin_action: COIN_SPENT.to_string(),
			}),
		}
	}

	pub fn output(index: u64, address: &str, value: u64, currency: Currency) -> Self {
		Self {
			operation_identifier: OperationIdentifier { index },
			kind: OPERATION_OUTPUT.to_string(),
			account: AccountIdentifier {
				address: address.to_string(),
			},
			amount: Amount::new(value as i128, currency),
			coin_change: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRequest {
	pub operations: Vec<ConstructionOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataResponse {
	#[serde(default)]
	pub metadata: serde_json::Value,
	#[serde(default)]
	pub suggested_fee: Vec<Amount>,
}

impl MetadataResponse {
	/// First suggested fee, in the smallest unit.
	pub fn fee(&self) -> Option<u64> {
		self.suggested_fee
			.first()
			.and_then(Amount::parse_value)
			.and_then(|v| u64::try_from(v).ok())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadsRequest {
	pub operations: Vec<ConstructionOperation>,
	pub metadata: serde_json::Value,
}

/// Bytes one key must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
	pub account_identifier: AccountIdentifier,
	pub hex_bytes: String,
	#[serde(default)]
	pub signature_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadsResponse {
	pub unsigned_transaction: String,
	pub payloads: Vec<SigningPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
	pub hex_bytes: String,
	pub curve_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionSignature {
	pub signing_payload: SigningPayload,
	pub public_key: PublicKey,
	pub signature_type: String,
	pub hex_bytes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineRequest {
	pub unsigned_transaction: String,
	pub signatures: Vec<ConstructionSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineResponse {
	pub signed_transaction: String,
}
