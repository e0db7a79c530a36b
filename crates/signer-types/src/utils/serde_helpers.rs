//! Serde helpers for remote API payloads.
//!
//! The chain data API returns integers either as JSON numbers or as decimal
//! strings depending on magnitude.

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
	Number(u64),
	String(String),
}

fn parse<E: de::Error>(raw: NumberOrString) -> Result<u128, E> {
	match raw {
		NumberOrString::Number(n) => Ok(n as u128),
		NumberOrString::String(s) => s
			.trim()
			.parse::<u128>()
			.map_err(|e| E::custom(format!("invalid integer '{}': {}", s, e))),
	}
}

pub fn u128_from_str_or_number<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
	D: Deserializer<'de>,
{
	parse(NumberOrString::deserialize(deserializer)?)
}

pub fn u64_from_str_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	let value = parse::<D::Error>(NumberOrString::deserialize(deserializer)?)?;
	u64::try_from(value).map_err(|_| de::Error::custom(format!("integer {} overflows u64", value)))
}

pub fn option_u64_from_str_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<NumberOrString>::deserialize(deserializer)? {
		None => Ok(None),
		Some(raw) => {
			let value = parse::<D::Error>(raw)?;
			u64::try_from(value)
				.map(Some)
				.map_err(|_| de::Error::custom(format!("integer {} overflows u64", value)))
		},
	}
}

pub fn option_u128_from_str_or_number<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<NumberOrString>::deserialize(deserializer)?
		.map(parse::<D::Error>)
		.transpose()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Sample {
		#[serde(deserialize_with = "u128_from_str_or_number")]
		big: u128,
		#[serde(default, deserialize_with = "option_u64_from_str_or_number")]
		maybe: Option<u64>,
	}

	#[test]
	fn test_accepts_numbers_and_strings() {
		let sample: Sample = serde_json::from_str(r#"{"big": "20000000000", "maybe": 7}"#).unwrap();
		assert_eq!(sample.big, 20_000_000_000);
		assert_eq!(sample.maybe, Some(7));

		let sample: Sample = serde_json::from_str(r#"{"big": 21000}"#).unwrap();
		assert_eq!(sample.big, 21_000);
		assert_eq!(sample.maybe, None);
	}

	#[test]
	fn test_rejects_garbage() {
		assert!(serde_json::from_str::<Sample>(r#"{"big": "twenty"}"#).is_err());
	}
}
