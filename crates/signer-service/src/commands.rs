//! Subcommand implementations.

use serde::Serialize;
use signer_account::LocalSigner;
use signer_chain::implementations::http::ApiClient;
use signer_chain::ChainError;
use signer_config::{Config, ConfigError};
use signer_core::{Collaborators, ConstructionError, TransactionCrafter};
use signer_types::{BroadcastReceipt, Intent, TransactionEnvelope};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),
	#[error("Chain client error: {0}")]
	Client(#[from] ChainError),
	#[error("Failed to read intent {path}: {source}")]
	ReadIntent {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("Invalid intent {path}: {source}")]
	ParseIntent {
		path: PathBuf,
		source: serde_json::Error,
	},
	#[error(transparent)]
	Construction(#[from] ConstructionError),
}

/// What `craft` prints.
#[derive(Debug, Serialize)]
pub struct CraftOutput {
	pub envelope: TransactionEnvelope,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub receipt: Option<BroadcastReceipt>,
}

/// Loads configuration and wires the HTTP client into a crafter.
pub async fn build_crafter(config_path: &Path) -> Result<TransactionCrafter, CommandError> {
	let path = config_path.to_str().ok_or_else(|| {
		ConfigError::Validation(format!("Invalid path: {}", config_path.display()))
	})?;
	let config = Config::from_file(path).await?;
	tracing::info!(base_url = %config.api.base_url, "Loaded configuration");

	let client = ApiClient::new(
		config.api.base_url.clone(),
		config.api.api_key.clone(),
		Duration::from_secs(config.api.timeout_seconds),
	)?;
	Ok(TransactionCrafter::new(
		config,
		Collaborators::from_client(Arc::new(client)),
		LocalSigner::new(),
	))
}

pub async fn load_intent(path: &Path) -> Result<Intent, CommandError> {
	let contents =
		tokio::fs::read_to_string(path)
			.await
			.map_err(|source| CommandError::ReadIntent {
				path: path.to_path_buf(),
				source,
			})?;
	serde_json::from_str(&contents).map_err(|source| CommandError::ParseIntent {
		path: path.to_path_buf(),
		source,
	})
}

/// Crafts the intent at `intent_path` and optionally broadcasts it.
pub async fn craft(
	crafter: &TransactionCrafter,
	intent_path: &Path,
	broadcast: bool,
) -> Result<CraftOutput, CommandError> {
	let intent = load_intent(intent_path).await?;
	let envelope = crafter.craft(intent).await?;

	let receipt = if broadcast {
		Some(crafter.broadcast(&envelope).await?)
	} else {
		None
	};
	Ok(CraftOutput { envelope, receipt })
}
