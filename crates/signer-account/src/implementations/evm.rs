//! EVM signing with Alloy.
//!
//! Transactions are signed as legacy EIP-155 transactions and returned as
//! 0x-prefixed EIP-2718 bytes, ready for `eth_sendRawTransaction`.

use crate::{decode_key, SigningError, SigningPrimitive};
use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::TxKind;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use signer_types::{
	with_0x_prefix, DetachedSignature, EvmTransaction, KeyRing, SecretString, SignatureFamily,
	UnsignedTransaction,
};

/// Signing primitive for EVM account chains.
pub struct EvmSigner;

impl EvmSigner {
	fn signer(key: &SecretString) -> Result<PrivateKeySigner, SigningError> {
		let bytes = decode_key::<32>(key)?;
		PrivateKeySigner::from_slice(bytes.as_slice())
			.map_err(|e| SigningError::InvalidKey(e.to_string()))
	}

	fn legacy(tx: &EvmTransaction) -> TxLegacy {
		TxLegacy {
			chain_id: Some(tx.chain_id),
			nonce: tx.nonce,
			gas_price: tx.gas_price,
			gas_limit: tx.gas_limit,
			to: match tx.to {
				Some(address) => TxKind::Call(address),
				None => TxKind::Create,
			},
			value: tx.value,
			input: tx.data.clone(),
		}
	}
}

impl SigningPrimitive for EvmSigner {
	fn family(&self) -> SignatureFamily {
		SignatureFamily::Evm
	}

	fn derive_address(&self, key: &SecretString) -> Result<Option<String>, SigningError> {
		Ok(Some(Self::signer(key)?.address().to_checksum(None)))
	}

	fn public_key(&self, key: &SecretString) -> Result<String, SigningError> {
		let signer = Self::signer(key)?;
		let point = signer.credential().verifying_key().to_encoded_point(false);
		Ok(hex::encode(point.as_bytes()))
	}

	fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		keys: &KeyRing<'_>,
	) -> Result<String, SigningError> {
		let UnsignedTransaction::Evm(evm) = tx else {
			return Err(SigningError::UnsupportedPayload(
				"EVM signer only signs EVM transactions".into(),
			));
		};
		let key = keys
			.get(0)
			.ok_or_else(|| SigningError::InvalidKey("No signing key supplied".into()))?;
		let signer = Self::signer(key)?;

		let legacy = Self::legacy(evm);
		let signature = signer
			.sign_hash_sync(&legacy.signature_hash())
			.map_err(|e| SigningError::Failed(e.to_string()))?;
		let envelope = TxEnvelope::Legacy(legacy.into_signed(signature));

		Ok(with_0x_prefix(&hex::encode(envelope.encoded_2718())))
	}

	fn sign_payload(
		&self,
		payload: &[u8],
		key: &SecretString,
	) -> Result<DetachedSignature, SigningError> {
		let signer = Self::signer(key)?;
		let signature = signer
			.sign_message_sync(payload)
			.map_err(|e| SigningError::Failed(e.to_string()))?;
		Ok(DetachedSignature {
			public_key: self.public_key(key)?,
			signature: hex::encode(signature.as_bytes()),
		})
	}
}
