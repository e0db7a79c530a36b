//! Fee types.
//!
//! A [`FeeQuote`] is the resolved network fee for one transaction. Its shape
//! depends on the protocol: account chains pay gas, everything else pays a
//! flat fee in the smallest unit of the native asset.

use crate::utils::serde_helpers::{
	option_u128_from_str_or_number, option_u64_from_str_or_number, u128_from_str_or_number,
	u64_from_str_or_number,
};
use crate::{AccountingModel, OperationKind, Protocol};
use serde::{Deserialize, Serialize};

/// Shape of the fee a protocol charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeShape {
	Gas,
	Flat,
}

impl FeeShape {
	pub fn for_protocol(protocol: Protocol) -> Self {
		match protocol.model() {
			AccountingModel::Account => FeeShape::Gas,
			_ => FeeShape::Flat,
		}
	}
}

/// Resolved network fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum FeeQuote {
	/// Gas limit and gas price in wei.
	#[serde(rename_all = "camelCase")]
	Gas {
		gas_limit: u64,
		gas_price: u128,
		chain_id: Option<u64>,
	},
	/// Absolute fee in the smallest unit of the chain.
	Flat { fee: u64 },
}

impl FeeQuote {
	pub fn shape(&self) -> FeeShape {
		match self {
			FeeQuote::Gas { .. } => FeeShape::Gas,
			FeeQuote::Flat { .. } => FeeShape::Flat,
		}
	}

	/// Flat fee amount, zero for gas quotes.
	pub fn flat_fee(&self) -> u64 {
		match self {
			FeeQuote::Flat { fee } => *fee,
			FeeQuote::Gas { .. } => 0,
		}
	}
}

/// Caller-provided fee values.
///
/// Each field that is present replaces the corresponding field of the
/// resolved quote. Fields that do not apply to the protocol's fee shape are
/// ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOverride {
	#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
	pub gas_limit: Option<u64>,
	#[serde(default, deserialize_with = "option_u128_from_str_or_number")]
	pub gas_price: Option<u128>,
	#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
	pub fee: Option<u64>,
}

impl FeeOverride {
	/// Whether the override alone determines every field of `shape`.
	pub fn is_complete(&self, shape: FeeShape) -> bool {
		match shape {
			FeeShape::Gas => self.gas_limit.is_some() && self.gas_price.is_some(),
			FeeShape::Flat => self.fee.is_some(),
		}
	}

	/// Builds a quote from the override alone, when it is complete.
	pub fn to_quote(&self, shape: FeeShape) -> Option<FeeQuote> {
		if !self.is_complete(shape) {
			return None;
		}
		Some(match shape {
			FeeShape::Gas => FeeQuote::Gas {
				gas_limit: self.gas_limit?,
				gas_price: self.gas_price?,
				chain_id: None,
			},
			FeeShape::Flat => FeeQuote::Flat { fee: self.fee? },
		})
	}

	/// Replaces the fields of `quote` that this override sets.
	pub fn apply(&self, quote: FeeQuote) -> FeeQuote {
		match quote {
			FeeQuote::Gas {
				gas_limit,
				gas_price,
				chain_id,
			} => FeeQuote::Gas {
				gas_limit: self.gas_limit.unwrap_or(gas_limit),
				gas_price: self.gas_price.unwrap_or(gas_price),
				chain_id,
			},
			FeeQuote::Flat { fee } => FeeQuote::Flat {
				fee: self.fee.unwrap_or(fee),
			},
		}
	}
}

/// Body of a fee quotation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuoteRequest {
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<OperationKind>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	/// Amount in display units, as a decimal string.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub contract_address: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub contract_abi: Option<serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub contract_name: Option<String>,
	/// Deployment bytecode.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fee_currency: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
}

/// Fee quotation response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FeeEstimate {
	#[serde(rename_all = "camelCase")]
	Gas {
		#[serde(deserialize_with = "u64_from_str_or_number")]
		gas_limit: u64,
		#[serde(deserialize_with = "u128_from_str_or_number")]
		gas_price: u128,
		#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
		chain_id: Option<u64>,
	},
	Flat {
		#[serde(deserialize_with = "u64_from_str_or_number")]
		fee: u64,
	},
}

impl From<FeeEstimate> for FeeQuote {
	fn from(estimate: FeeEstimate) -> Self {
		match estimate {
			FeeEstimate::Gas {
				gas_limit,
				gas_price,
				chain_id,
			} => FeeQuote::Gas {
				gas_limit,
				gas_price,
				chain_id,
			},
			FeeEstimate::Flat { fee } => FeeQuote::Flat { fee },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_override_replaces_only_present_fields() {
		let quote = FeeQuote::Gas {
			gas_limit: 21_000,
			gas_price: 5_000_000_000,
			chain_id: Some(1),
		};
		let fee_override = FeeOverride {
			gas_price: Some(7),
			..Default::default()
		};
		assert_eq!(
			fee_override.apply(quote),
			FeeQuote::Gas {
				gas_limit: 21_000,
				gas_price: 7,
				chain_id: Some(1),
			}
		);
	}

	#[test]
	fn test_complete_override_matches_merged_quote() {
		let fee_override = FeeOverride {
			gas_limit: Some(60_000),
			gas_price: Some(3),
			fee: None,
		};
		assert!(fee_override.is_complete(FeeShape::Gas));
		assert!(!fee_override.is_complete(FeeShape::Flat));

		let remote = FeeQuote::Gas {
			gas_limit: 1,
			gas_price: 1,
			chain_id: None,
		};
		assert_eq!(fee_override.to_quote(FeeShape::Gas), Some(fee_override.apply(remote)));
	}

	#[test]
	fn test_flat_override() {
		let fee_override = FeeOverride {
			fee: Some(1_000),
			..Default::default()
		};
		assert_eq!(
			fee_override.apply(FeeQuote::Flat { fee: 10 }),
			FeeQuote::Flat { fee: 1_000 }
		);
		assert_eq!(FeeShape::for_protocol(Protocol::Bitcoin), FeeShape::Flat);
		assert_eq!(FeeShape::for_protocol(Protocol::Klaytn), FeeShape::Gas);
	}

	#[test]
	fn test_request_omits_absent_fields() {
		let request = FeeQuoteRequest {
			kind: Some(OperationKind::Transfer),
			from: Some("0xabc".into()),
			amount: Some("0.1".into()),
			..Default::default()
		};
		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(
			json,
			serde_json::json!({"type": "TRANSFER", "from": "0xabc", "amount": "0.1"})
		);
	}

	#[test]
	fn test_estimate_shapes() {
		let gas: FeeEstimate =
			serde_json::from_str(r#"{"gasLimit": "21000", "gasPrice": "20000000000"}"#).unwrap();
		assert_eq!(
			FeeQuote::from(gas),
			FeeQuote::Gas {
				gas_limit: 21_000,
				gas_price: 20_000_000_000,
				chain_id: None,
			}
		);

		let flat: FeeEstimate = serde_json::from_str(r#"{"fee": 1500}"#).unwrap();
		assert_eq!(FeeQuote::from(flat), FeeQuote::Flat { fee: 1_500 });
	}
}
