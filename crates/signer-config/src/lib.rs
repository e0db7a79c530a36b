//! Configuration module for the transaction signer.
//!
//! This module provides structures and utilities for managing signer configuration.
//! It supports loading configuration from TOML files and provides validation to ensure
//! all required configuration values are properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(feature = "testing")]
pub mod builders;
mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use signer_types::{AccountingModel, Protocol, SecretString};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable consulted when `network.testnet` is not set.
pub const TESTNET_ENV_VAR: &str = "SIGNER_TESTNET";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the signer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain data and fee API.
	pub api: ApiConfig,
	#[serde(default)]
	pub network: NetworkConfig,
	/// Well-known contracts, keyed by protocol ticker.
	#[serde(default)]
	pub contracts: ContractsConfig,
	/// Token registry: `tokens.<TICKER>.<SYMBOL>`.
	#[serde(default)]
	pub tokens: HashMap<String, HashMap<String, TokenConfig>>,
	#[serde(default)]
	pub selection: SelectionConfig,
}

/// Configuration for the remote chain data API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	pub base_url: String,
	/// Sent as `x-api-key`. An empty value disables the header.
	#[serde(default)]
	pub api_key: Option<SecretString>,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
}

/// Returns the default API timeout in seconds.
fn default_api_timeout() -> u64 {
	30
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Default network for intents that do not choose one.
	pub testnet: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractsConfig {
	/// Message relay contract used for native transfers that carry a memo.
	#[serde(default)]
	pub relay: HashMap<String, String>,
}

/// A registered fungible token contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
	pub address: String,
	pub decimals: u32,
}

/// Input selection strategy for output chains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategyKind {
	/// First fit in discovery order.
	#[default]
	Greedy,
	/// First fit after sorting candidates by descending value.
	LargestFirst,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectionConfig {
	#[serde(default)]
	pub strategy: SelectionStrategyKind,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

/// Reads the testnet default from the environment.
fn testnet_from_env() -> bool {
	std::env::var(TESTNET_ENV_VAR)
		.map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
		.unwrap_or(false)
}

fn is_evm_address(address: &str) -> bool {
	address.len() == 42
		&& address.starts_with("0x")
		&& address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Config {
	/// Loads configuration from a file with async environment variable resolution.
	///
	/// This method supports modular configuration through include directives:
	/// - `include = ["file1.toml", "file2.toml"]` - Include specific files
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Network used when an intent does not choose one.
	pub fn default_testnet(&self) -> bool {
		self.network.testnet.unwrap_or_else(testnet_from_env)
	}

	/// Message relay contract for an account chain.
	pub fn relay_contract(&self, protocol: Protocol) -> Option<&str> {
		self.contracts
			.relay
			.get(protocol.ticker())
			.map(String::as_str)
	}

	/// Looks up a registered token by symbol, case-insensitively.
	pub fn token(&self, protocol: Protocol, symbol: &str) -> Option<&TokenConfig> {
		self.tokens
			.get(protocol.ticker())?
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(symbol))
			.map(|(_, token)| token)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - The API base URL is an http(s) URL and the timeout is within bounds
	/// - Relay contracts and tokens are keyed by account-chain tickers
	/// - Every contract address is a 20-byte hex address
	fn validate(&self) -> Result<(), ConfigError> {
		if self.api.base_url.trim().is_empty() {
			return Err(ConfigError::Validation("API base_url cannot be empty".into()));
		}
		if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
		{
			return Err(ConfigError::Validation(format!(
				"API base_url must be an http(s) URL, got '{}'",
				self.api.base_url
			)));
		}
		if self.api.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"API timeout_seconds must be greater than 0".into(),
			));
		}
		if self.api.timeout_seconds > 300 {
			return Err(ConfigError::Validation(
				"API timeout_seconds cannot exceed 300".into(),
			));
		}

		for (ticker, address) in &self.contracts.relay {
			Self::account_chain(ticker, "contracts.relay")?;
			if !is_evm_address(address) {
				return Err(ConfigError::Validation(format!(
					"Relay contract for {} is not a valid address: '{}'",
					ticker, address
				)));
			}
		}

		for (ticker, tokens) in &self.tokens {
			Self::account_chain(ticker, "tokens")?;
			for (symbol, token) in tokens {
				if !is_evm_address(&token.address) {
					return Err(ConfigError::Validation(format!(
						"Token {}.{} has an invalid address: '{}'",
						ticker, symbol, token.address
					)));
				}
				if token.decimals > 28 {
					return Err(ConfigError::Validation(format!(
						"Token {}.{} decimals cannot exceed 28",
						ticker, symbol
					)));
				}
			}
		}

		Ok(())
	}

	fn account_chain(ticker: &str, section: &str) -> Result<Protocol, ConfigError> {
		let protocol = Protocol::from_str(ticker)
			.map_err(|e| ConfigError::Validation(format!("{} in [{}]", e, section)))?;
		if protocol.model() != AccountingModel::Account {
			return Err(ConfigError::Validation(format!(
				"[{}] only applies to account chains, found {}",
				section, ticker
			)));
		}
		Ok(protocol)
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
