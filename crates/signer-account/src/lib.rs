//! Local signing for the transaction signer.
//!
//! This module turns unsigned transactions into signed payloads using keys
//! supplied with each request. Keys are borrowed for the duration of one
//! signing call and never leave this process.
//!
//! Signing is split by signature family: each [`SigningPrimitive`] handles
//! the transaction shapes of one family and [`LocalSigner`] routes a
//! protocol to its primitive.

use signer_types::{
	DetachedSignature, KeyRing, Protocol, SecretString, SignatureFamily, UnsignedTransaction,
};
use std::collections::HashMap;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod ed25519;
	pub mod evm;
	pub mod secp256k1;
}

/// Errors that can occur during signing.
#[derive(Debug, Error)]
pub enum SigningError {
	/// The key could not be decoded or is not valid for the curve.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The key does not control the address it is used for.
	#[error("Key does not own address {0}")]
	OwnershipMismatch(String),
	/// The transaction shape is not handled by this signature family.
	#[error("Unsupported payload: {0}")]
	UnsupportedPayload(String),
	#[error("Signing failed: {0}")]
	Failed(String),
}

/// A signature scheme able to sign the transactions of one family.
///
/// Implementations perform no I/O and hold no key material between calls.
pub trait SigningPrimitive: Send + Sync {
	fn family(&self) -> SignatureFamily;

	/// Address controlled by `key`, for families where the address is a pure
	/// function of the key. Returns `None` when the address encoding is chain
	/// specific and must be supplied by the caller.
	fn derive_address(&self, key: &SecretString) -> Result<Option<String>, SigningError>;

	/// Hex encoded public key of `key`.
	fn public_key(&self, key: &SecretString) -> Result<String, SigningError>;

	/// Signs `tx` and returns the encoded signed payload.
	fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		keys: &KeyRing<'_>,
	) -> Result<String, SigningError>;

	/// Signs raw payload bytes produced by a remote construction service.
	fn sign_payload(
		&self,
		payload: &[u8],
		key: &SecretString,
	) -> Result<DetachedSignature, SigningError>;
}

/// Routes signing requests to the primitive of each protocol's family.
pub struct LocalSigner {
	primitives: HashMap<SignatureFamily, Box<dyn SigningPrimitive>>,
}

impl Default for LocalSigner {
	fn default() -> Self {
		Self::new()
	}
}

impl LocalSigner {
	/// Creates a signer with the built-in primitives for every family.
	pub fn new() -> Self {
		Self::empty()
			.with_primitive(Box::new(implementations::evm::EvmSigner))
			.with_primitive(Box::new(implementations::secp256k1::Secp256k1Signer))
			.with_primitive(Box::new(implementations::ed25519::Ed25519Signer))
	}

	pub fn empty() -> Self {
		Self {
			primitives: HashMap::new(),
		}
	}

	/// Registers `primitive`, replacing any primitive of the same family.
	pub fn with_primitive(mut self, primitive: Box<dyn SigningPrimitive>) -> Self {
		self.primitives.insert(primitive.family(), primitive);
		self
	}

	fn primitive(&self, protocol: Protocol) -> Result<&dyn SigningPrimitive, SigningError> {
		self.primitives
			.get(&protocol.family())
			.map(|p| p.as_ref())
			.ok_or_else(|| {
				SigningError::UnsupportedPayload(format!(
					"No signing primitive registered for {}",
					protocol
				))
			})
	}

	/// Resolves the source address of a single-key signer.
	///
	/// A supplied address is checked against the key when the family can
	/// derive addresses. Returns `None` when no address was supplied and none
	/// can be derived.
	pub fn resolve_address(
		&self,
		protocol: Protocol,
		key: &SecretString,
		supplied: Option<&str>,
	) -> Result<Option<String>, SigningError> {
		let derived = self.primitive(protocol)?.derive_address(key)?;
		match (supplied, derived) {
			(Some(supplied), Some(derived)) if !supplied.eq_ignore_ascii_case(&derived) => {
				Err(SigningError::OwnershipMismatch(supplied.to_string()))
			},
			(Some(supplied), _) => Ok(Some(supplied.to_string())),
			(None, derived) => Ok(derived),
		}
	}

	pub fn public_key(
		&self,
		protocol: Protocol,
		key: &SecretString,
	) -> Result<String, SigningError> {
		self.primitive(protocol)?.public_key(key)
	}

	/// Signs an unsigned transaction with the keys it references.
	pub fn sign(
		&self,
		protocol: Protocol,
		tx: &UnsignedTransaction,
		keys: &KeyRing<'_>,
	) -> Result<String, SigningError> {
		let payload = self.primitive(protocol)?.sign_transaction(tx, keys)?;
		tracing::debug!(%protocol, keys = keys.len(), "Transaction signed");
		Ok(payload)
	}

	/// Signs a hex encoded payload from a remote construction service.
	pub fn sign_payload(
		&self,
		protocol: Protocol,
		payload_hex: &str,
		key: &SecretString,
	) -> Result<DetachedSignature, SigningError> {
		let payload = hex::decode(signer_types::without_0x_prefix(payload_hex))
			.map_err(|e| SigningError::UnsupportedPayload(format!("Payload is not hex: {}", e)))?;
		self.primitive(protocol)?.sign_payload(&payload, key)
	}
}

/// Decodes a hex key into exactly `N` bytes.
pub(crate) fn decode_key<const N: usize>(
	key: &SecretString,
) -> Result<zeroize::Zeroizing<[u8; N]>, SigningError> {
	let bytes = key
		.decode_hex()
		.map_err(|e| SigningError::InvalidKey(format!("Key is not valid hex: {}", e)))?;
	if bytes.len() != N {
		return Err(SigningError::InvalidKey(format!(
			"Expected {} key bytes, got {}",
			N,
			bytes.len()
		)));
	}
	let mut out = zeroize::Zeroizing::new([0u8; N]);
	out.copy_from_slice(&bytes);
	Ok(out)
}

/// Canonical bytes signed by the digest signers.
pub(crate) fn preimage(tx: &UnsignedTransaction) -> Result<Vec<u8>, SigningError> {
	serde_json::to_vec(tx)
		.map_err(|e| SigningError::Failed(format!("Failed to encode transaction: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;

	const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const EVM_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	#[test]
	fn test_resolve_address_derives_when_absent() {
		let signer = LocalSigner::new();
		let key = SecretString::from(EVM_KEY);
		let address = signer
			.resolve_address(Protocol::Ethereum, &key, None)
			.unwrap();
		assert_eq!(address.as_deref(), Some(EVM_ADDRESS));
	}

	#[test]
	fn test_resolve_address_rejects_foreign_address() {
		let signer = LocalSigner::new();
		let key = SecretString::from(EVM_KEY);
		let result = signer.resolve_address(
			Protocol::Polygon,
			&key,
			Some("0x0000000000000000000000000000000000000001"),
		);
		assert!(matches!(result, Err(SigningError::OwnershipMismatch(_))));

		let lowercase = EVM_ADDRESS.to_lowercase();
		let ok = signer
			.resolve_address(Protocol::Polygon, &key, Some(&lowercase))
			.unwrap();
		assert_eq!(ok.as_deref(), Some(lowercase.as_str()));
	}

	#[test]
	fn test_non_derivable_family_requires_address() {
		let signer = LocalSigner::new();
		let key = SecretString::from(EVM_KEY);
		assert_eq!(signer.resolve_address(Protocol::Xrp, &key, None).unwrap(), None);
		assert_eq!(
			signer
				.resolve_address(Protocol::Xrp, &key, Some("rAddress"))
				.unwrap()
				.as_deref(),
			Some("rAddress")
		);
	}

	#[test]
	fn test_missing_primitive() {
		let signer = LocalSigner::empty();
		let key = SecretString::from(EVM_KEY);
		assert!(matches!(
			signer.public_key(Protocol::Cardano, &key),
			Err(SigningError::UnsupportedPayload(_))
		));
	}

	#[test]
	fn test_sign_payload_rejects_non_hex() {
		let signer = LocalSigner::new();
		let key = SecretString::from(EVM_KEY);
		assert!(matches!(
			signer.sign_payload(Protocol::Cardano, "zz", &key),
			Err(SigningError::UnsupportedPayload(_))
		));
	}

	#[test]
	fn test_decode_key_length() {
		assert!(decode_key::<32>(&SecretString::from(EVM_KEY)).is_ok());
		assert!(matches!(
			decode_key::<32>(&SecretString::from("0x0102")),
			Err(SigningError::InvalidKey(_))
		));
	}
}
