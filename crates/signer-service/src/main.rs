//! Command-line entry point for the transaction signer.
//!
//! `signer craft --intent intent.json` constructs and signs the transaction
//! described by the intent file and prints the envelope as JSON. With
//! `--broadcast` the envelope is also submitted and the receipt printed.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Command-line arguments for the signer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Construct and sign a transaction from an intent file
	Craft {
		/// Path to the JSON intent
		#[arg(short, long)]
		intent: PathBuf,

		/// Submit the signed envelope after construction
		#[arg(long)]
		broadcast: bool,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	// Logs go to stderr so stdout only carries the JSON result
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let crafter = commands::build_crafter(&args.config).await?;

	match args.command {
		Command::Craft { intent, broadcast } => {
			let output = commands::craft(&crafter, &intent, broadcast).await?;
			println!("{}", serde_json::to_string_pretty(&output)?);
		},
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_craft_arguments() {
		let args = Args::parse_from([
			"signer",
			"--log-level",
			"debug",
			"craft",
			"--intent",
			"transfer.json",
			"--broadcast",
		]);

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "debug");
		match args.command {
			Command::Craft { intent, broadcast } => {
				assert_eq!(intent, PathBuf::from("transfer.json"));
				assert!(broadcast);
			},
		}
	}

	#[test]
	fn test_broadcast_defaults_off() {
		let args = Args::parse_from(["signer", "-c", "custom.toml", "craft", "-i", "a.json"]);

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert!(matches!(args.command, Command::Craft { broadcast: false, .. }));
	}

	#[test]
	fn test_intent_is_required() {
		assert!(Args::try_parse_from(["signer", "craft"]).is_err());
	}
}
