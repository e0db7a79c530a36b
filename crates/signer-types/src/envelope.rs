//! The signed transaction envelope.

use crate::{OperationKind, Protocol};
use serde::{Deserialize, Serialize};

/// Result of one construction call: a signed payload ready for broadcast.
///
/// The payload encoding is protocol specific (0x-hex RLP for EVM chains,
/// base64 for Stellar, hex for the rest) and is never interpreted again by
/// this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
	signed_payload: String,
	protocol: Protocol,
	#[serde(rename = "type")]
	kind: OperationKind,
	testnet: bool,
}

impl TransactionEnvelope {
	pub fn new(
		signed_payload: String,
		protocol: Protocol,
		kind: OperationKind,
		testnet: bool,
	) -> Self {
		Self {
			signed_payload,
			protocol,
			kind,
			testnet,
		}
	}

	pub fn signed_payload(&self) -> &str {
		&self.signed_payload
	}

	pub fn protocol(&self) -> Protocol {
		self.protocol
	}

	pub fn kind(&self) -> OperationKind {
		self.kind
	}

	pub fn testnet(&self) -> bool {
		self.testnet
	}
}

/// Body of a broadcast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest<'a> {
	pub signed_payload: &'a str,
	pub protocol: Protocol,
	#[serde(rename = "type")]
	pub kind: OperationKind,
}

impl<'a> From<&'a TransactionEnvelope> for BroadcastRequest<'a> {
	fn from(envelope: &'a TransactionEnvelope) -> Self {
		Self {
			signed_payload: &envelope.signed_payload,
			protocol: envelope.protocol,
			kind: envelope.kind,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReceipt {
	pub tx_id: String,
}
