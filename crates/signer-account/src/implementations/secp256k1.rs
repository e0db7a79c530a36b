//! secp256k1 digest signing.
//!
//! Used by XRP, the Bitcoin family and Hathor. The canonical transaction
//! preimage is hashed twice with SHA-256 and signed once per key in the key
//! ring; signatures are DER encoded next to the compressed public key. The
//! result is hex encoded for the chain-native serializer downstream.

use crate::{decode_key, preimage, SigningError, SigningPrimitive};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use sha2::{Digest, Sha256};
use signer_types::{
	DetachedSignature, DetachedSignedTransaction, KeyRing, SecretString, SignatureFamily,
	UnsignedTransaction,
};

pub struct Secp256k1Signer;

impl Secp256k1Signer {
	fn signing_key(key: &SecretString) -> Result<SigningKey, SigningError> {
		let bytes = decode_key::<32>(key)?;
		SigningKey::from_slice(bytes.as_slice())
			.map_err(|e| SigningError::InvalidKey(e.to_string()))
	}

	fn compressed_public_key(signing_key: &SigningKey) -> String {
		hex::encode(signing_key.verifying_key().to_encoded_point(true).as_bytes())
	}

	/// ECDSA over `sha256(sha256(message))`.
	fn sign_digest(signing_key: &SigningKey, message: &[u8]) -> DetachedSignature {
		// the k256 signer applies the second SHA-256 round
		let signature: Signature = signing_key.sign(&Sha256::digest(message));
		DetachedSignature {
			public_key: Self::compressed_public_key(signing_key),
			signature: hex::encode(signature.to_der().as_bytes()),
		}
	}
}

impl SigningPrimitive for Secp256k1Signer {
	fn family(&self) -> SignatureFamily {
		SignatureFamily::Secp256k1
	}

	fn derive_address(&self, key: &SecretString) -> Result<Option<String>, SigningError> {
		Self::signing_key(key)?;
		Ok(None)
	}

	fn public_key(&self, key: &SecretString) -> Result<String, SigningError> {
		Ok(Self::compressed_public_key(&Self::signing_key(key)?))
	}

	fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		keys: &KeyRing<'_>,
	) -> Result<String, SigningError> {
		match tx {
			UnsignedTransaction::Xrp(_)
			| UnsignedTransaction::Utxo(_)
			| UnsignedTransaction::Hathor(_) => {},
			_ => {
				return Err(SigningError::UnsupportedPayload(
					"secp256k1 signer only signs XRP, UTXO and Hathor transactions".into(),
				))
			},
		}
		if keys.is_empty() {
			return Err(SigningError::InvalidKey("No signing key supplied".into()));
		}

		let message = preimage(tx)?;
		let signatures = keys
			.iter()
			.map(|key| Ok(Self::sign_digest(&Self::signing_key(key)?, &message)))
			.collect::<Result<Vec<_>, SigningError>>()?;

		let signed = DetachedSignedTransaction {
			transaction: tx.clone(),
			signatures,
		};
		let bytes = serde_json::to_vec(&signed).map_err(|e| {
			SigningError::Failed(format!("Failed to encode signed transaction: {}", e))
		})?;
		Ok(hex::encode(bytes))
	}

	fn sign_payload(
		&self,
		payload: &[u8],
		key: &SecretString,
	) -> Result<DetachedSignature, SigningError> {
		Ok(Self::sign_digest(&Self::signing_key(key)?, payload))
	}
}
