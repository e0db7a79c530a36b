//! Ed25519 signing for Stellar and Cardano.
//!
//! Stellar transactions are signed over the SHA-256 of their canonical
//! preimage and returned base64 encoded. Cardano payloads arrive already
//! hashed from the construction service and are signed as-is.

use crate::{decode_key, preimage, SigningError, SigningPrimitive};
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use signer_types::{
	DetachedSignature, DetachedSignedTransaction, KeyRing, SecretString, SignatureFamily,
	UnsignedTransaction,
};

pub struct Ed25519Signer;

impl Ed25519Signer {
	/// Keys are 32-byte seeds.
	fn signing_key(key: &SecretString) -> Result<SigningKey, SigningError> {
		let seed = decode_key::<32>(key)?;
		Ok(SigningKey::from_bytes(&seed))
	}

	fn sign_bytes(signing_key: &SigningKey, message: &[u8]) -> DetachedSignature {
		DetachedSignature {
			public_key: hex::encode(signing_key.verifying_key().to_bytes()),
			signature: hex::encode(signing_key.sign(message).to_bytes()),
		}
	}
}

impl SigningPrimitive for Ed25519Signer {
	fn family(&self) -> SignatureFamily {
		SignatureFamily::Ed25519
	}

	fn derive_address(&self, key: &SecretString) -> Result<Option<String>, SigningError> {
		Self::signing_key(key)?;
		Ok(None)
	}

	fn public_key(&self, key: &SecretString) -> Result<String, SigningError> {
		Ok(hex::encode(Self::signing_key(key)?.verifying_key().to_bytes()))
	}

	fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		keys: &KeyRing<'_>,
	) -> Result<String, SigningError> {
		let UnsignedTransaction::Stellar(_) = tx else {
			return Err(SigningError::UnsupportedPayload(
				"ed25519 signer only signs Stellar transactions".into(),
			));
		};
		let key = keys
			.get(0)
			.ok_or_else(|| SigningError::InvalidKey("No signing key supplied".into()))?;

		let hash = Sha256::digest(preimage(tx)?);
		let signed = DetachedSignedTransaction {
			transaction: tx.clone(),
			signatures: vec![Self::sign_bytes(&Self::signing_key(key)?, &hash)],
		};
		let bytes = serde_json::to_vec(&signed).map_err(|e| {
			SigningError::Failed(format!("Failed to encode signed transaction: {}", e))
		})?;
		Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
	}

	fn sign_payload(
		&self,
		payload: &[u8],
		key: &SecretString,
	) -> Result<DetachedSignature, SigningError> {
		Ok(Self::sign_bytes(&Self::signing_key(key)?, payload))
	}
}
