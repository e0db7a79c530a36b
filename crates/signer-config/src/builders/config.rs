//! Configuration builder for creating test and development configurations.

use crate::{
	ApiConfig, Config, ContractsConfig, NetworkConfig, SelectionConfig, SelectionStrategyKind,
	TokenConfig,
};
use signer_types::Protocol;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults point at a local API on mainnet with no registered contracts.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	base_url: String,
	testnet: Option<bool>,
	relay: HashMap<String, String>,
	tokens: HashMap<String, HashMap<String, TokenConfig>>,
	strategy: SelectionStrategyKind,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			base_url: "http://localhost:8080".to_string(),
			testnet: Some(false),
			relay: HashMap::new(),
			tokens: HashMap::new(),
			strategy: SelectionStrategyKind::Greedy,
		}
	}

	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();
		self
	}

	/// Sets the default network. `None` defers to the environment.
	pub fn testnet(mut self, testnet: Option<bool>) -> Self {
		self.testnet = testnet;
		self
	}

	pub fn relay_contract(mut self, protocol: Protocol, address: impl Into<String>) -> Self {
		self.relay
			.insert(protocol.ticker().to_string(), address.into());
		self
	}

	pub fn token(
		mut self,
		protocol: Protocol,
		symbol: impl Into<String>,
		address: impl Into<String>,
		decimals: u32,
	) -> Self {
		self.tokens
			.entry(protocol.ticker().to_string())
			.or_default()
			.insert(
				symbol.into(),
				TokenConfig {
					address: address.into(),
					decimals,
				},
			);
		self
	}

	pub fn strategy(mut self, strategy: SelectionStrategyKind) -> Self {
		self.strategy = strategy;
		self
	}

	pub fn build(self) -> Config {
		Config {
			api: ApiConfig {
				base_url: self.base_url,
				api_key: None,
				timeout_seconds: 5,
			},
			network: NetworkConfig {
				testnet: self.testnet,
			},
			contracts: ContractsConfig { relay: self.relay },
			tokens: self.tokens,
			selection: SelectionConfig {
				strategy: self.strategy,
			},
		}
	}
}
