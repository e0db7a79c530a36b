//! Secure string type for private keys and API credentials.
//!
//! `SecretString` zeroes its buffer on drop and never prints its content
//! through `Debug`, `Display` or `Serialize`. Intents carry private keys in
//! this type so that logging an intent can never leak key material.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// A string that is zeroed on drop and redacted in every textual output.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret as a string slice.
	///
	/// Callers must not log or persist the returned value.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Exposes the secret to a closure, limiting the scope of the borrow.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// Decodes a hex-encoded secret (with or without `0x`) into bytes that
	/// are zeroed when dropped.
	pub fn decode_hex(&self) -> Result<Zeroizing<Vec<u8>>, hex::FromHexError> {
		let trimmed = crate::without_0x_prefix(self.0.trim());
		hex::decode(trimmed).map(Zeroizing::new)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Serialization always redacts; secrets only ever flow inward.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_debug_and_display_are_redacted() {
		let secret = SecretString::from("0xdeadbeef");
		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", secret), REDACTED);
	}

	#[test]
	fn test_serialize_is_redacted() {
		let secret = SecretString::from("my-private-key");
		let json = serde_json::to_string(&secret).unwrap();
		assert!(!json.contains("my-private-key"));
	}

	#[test]
	fn test_decode_hex_accepts_prefix() {
		let with_prefix = SecretString::from("0x0a0b");
		let without_prefix = SecretString::from("0a0b");
		assert_eq!(*with_prefix.decode_hex().unwrap(), vec![0x0a, 0x0b]);
		assert_eq!(*without_prefix.decode_hex().unwrap(), vec![0x0a, 0x0b]);
		assert!(SecretString::from("zz").decode_hex().is_err());
	}

	#[test]
	fn test_with_exposed() {
		let secret = SecretString::from("abc");
		let len = secret.with_exposed(|s| s.len());
		assert_eq!(len, 3);
		assert!(SecretString::from("  ").is_empty());
	}
}
