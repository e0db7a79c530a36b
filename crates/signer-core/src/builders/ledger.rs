//! Ledger-sequence transactions (Stellar and XRP).

use super::LEDGER_VALIDITY_HORIZON;
use crate::ConstructionError;
use rust_decimal::Decimal;
use signer_chain::ChainError;
use signer_types::{
	to_base_units_u64, without_0x_prefix, ContractDeployIntent, Protocol, StellarAsset,
	StellarOperation, StellarTransaction, TransferIntent, TrustlineIntent, XrpAmount,
	XrpOperation, XrpTransaction,
};

/// Trust limit set when a trustline intent leaves it open.
pub const XRP_MAX_TRUST_LIMIT: &str = "9999999999999999e80";

/// Chain state and fee for one ledger-chain transaction.
#[derive(Debug, Clone, Copy)]
pub struct LedgerContext<'a> {
	pub source: &'a str,
	/// Current account sequence.
	pub sequence: u64,
	pub ledger_index: u64,
	/// Flat fee per operation.
	pub fee: u64,
}

impl LedgerContext<'_> {
	fn last_ledger(&self) -> u64 {
		self.ledger_index.saturating_add(LEDGER_VALIDITY_HORIZON)
	}

	/// Sequence number of the next Stellar transaction.
	fn next_sequence(&self) -> Result<u64, ConstructionError> {
		self.sequence.checked_add(1).ok_or_else(|| {
			ConstructionError::Remote(ChainError::Decode(format!(
				"Account sequence {} of {} cannot be incremented",
				self.sequence, self.source
			)))
		})
	}
}

pub fn stellar_payment(
	ctx: &LedgerContext<'_>,
	transfer: &TransferIntent,
) -> Result<StellarTransaction, ConstructionError> {
	let asset = stellar_asset(transfer.currency.as_deref(), transfer.issuer.as_deref())?;
	let payment = StellarOperation::Payment {
		destination: transfer.to.clone(),
		asset,
		amount: to_base_units_u64(transfer.amount, Protocol::Stellar.decimals())?,
	};
	stellar(ctx, transfer.memo.clone(), vec![payment])
}

pub fn stellar_trustline(
	ctx: &LedgerContext<'_>,
	trustline: &TrustlineIntent,
) -> Result<StellarTransaction, ConstructionError> {
	let change = StellarOperation::ChangeTrust {
		asset: StellarAsset::Credit {
			code: trustline.currency.clone(),
			issuer: trustline.issuer.clone(),
		},
		limit: trustline
			.limit
			.map(|limit| to_base_units_u64(limit, Protocol::Stellar.decimals()))
			.transpose()?,
	};
	stellar(ctx, None, vec![change])
}

/// Uploads contract code. The code is stored lowercase hex without prefix.
pub fn stellar_upload(
	ctx: &LedgerContext<'_>,
	deploy: &ContractDeployIntent,
) -> Result<StellarTransaction, ConstructionError> {
	let upload = StellarOperation::UploadContractWasm {
		wasm: without_0x_prefix(&deploy.bytecode).to_ascii_lowercase(),
	};
	stellar(ctx, None, vec![upload])
}

fn stellar_asset(
	currency: Option<&str>,
	issuer: Option<&str>,
) -> Result<StellarAsset, ConstructionError> {
	match currency {
		None => Ok(StellarAsset::Native),
		Some(code) if Protocol::Stellar.is_native_symbol(code) => Ok(StellarAsset::Native),
		Some(code) => Ok(StellarAsset::Credit {
			code: code.to_string(),
			issuer: require_issuer(issuer)?,
		}),
	}
}

fn stellar(
	ctx: &LedgerContext<'_>,
	memo: Option<String>,
	operations: Vec<StellarOperation>,
) -> Result<StellarTransaction, ConstructionError> {
	Ok(StellarTransaction {
		source_account: ctx.source.to_string(),
		fee: ctx.fee.saturating_mul(operations.len() as u64),
		sequence: ctx.next_sequence()?,
		max_ledger: ctx.last_ledger(),
		memo,
		operations,
	})
}

pub fn xrp_payment(
	ctx: &LedgerContext<'_>,
	transfer: &TransferIntent,
) -> Result<XrpTransaction, ConstructionError> {
	let amount = match transfer.currency.as_deref() {
		Some(currency) if !Protocol::Xrp.is_native_symbol(currency) => XrpAmount::Issued {
			currency: currency.to_string(),
			issuer: require_issuer(transfer.issuer.as_deref())?,
			value: issued_value(transfer.amount),
		},
		_ => XrpAmount::Drops(to_base_units_u64(transfer.amount, Protocol::Xrp.decimals())?),
	};
	let operation = XrpOperation::Payment {
		destination: transfer.to.clone(),
		amount,
	};
	Ok(xrp(ctx, transfer.memo.iter().cloned().collect(), operation))
}

pub fn xrp_trustline(ctx: &LedgerContext<'_>, trustline: &TrustlineIntent) -> XrpTransaction {
	let limit_amount = XrpAmount::Issued {
		currency: trustline.currency.clone(),
		issuer: trustline.issuer.clone(),
		value: trustline
			.limit
			.map(issued_value)
			.unwrap_or_else(|| XRP_MAX_TRUST_LIMIT.to_string()),
	};
	xrp(ctx, Vec::new(), XrpOperation::TrustSet { limit_amount })
}

fn xrp(ctx: &LedgerContext<'_>, memos: Vec<String>, operation: XrpOperation) -> XrpTransaction {
	XrpTransaction {
		account: ctx.source.to_string(),
		fee: ctx.fee,
		sequence: ctx.sequence,
		last_ledger_sequence: ctx.last_ledger(),
		memos,
		operation,
	}
}

/// Issued amounts travel as decimal strings without trailing zeros.
fn issued_value(amount: Decimal) -> String {
	amount.normalize().to_string()
}

fn require_issuer(issuer: Option<&str>) -> Result<String, ConstructionError> {
	issuer
		.filter(|i| !i.is_empty())
		.map(str::to_string)
		.ok_or_else(|| ConstructionError::Validation("issuer is required for issued assets".into()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use signer_types::{SecretString, Signer};
	use std::str::FromStr;

	const CTX: LedgerContext<'static> = LedgerContext {
		source: "source",
		sequence: 41,
		ledger_index: 1000,
		fee: 100,
	};

	fn transfer(currency: Option<&str>, issuer: Option<&str>) -> TransferIntent {
		TransferIntent {
			source: Signer {
				private_key: SecretString::from("01"),
				address: Some("source".into()),
			},
			to: "dest".into(),
			amount: Decimal::from_str("12.50").unwrap(),
			currency: currency.map(str::to_string),
			contract_address: None,
			decimals: None,
			issuer: issuer.map(str::to_string),
			memo: Some("invoice".into()),
			fee_currency: None,
		}
	}

	#[test]
	fn test_stellar_sequence_and_window() {
		let tx = stellar_payment(&CTX, &transfer(None, None)).unwrap();
		assert_eq!(tx.sequence, 42);
		assert_eq!(tx.max_ledger, 1020);
		assert_eq!(tx.fee, 100);
		assert_eq!(tx.memo.as_deref(), Some("invoice"));
		assert_eq!(
			tx.operations,
			vec![StellarOperation::Payment {
				destination: "dest".into(),
				asset: StellarAsset::Native,
				amount: 125_000_000,
			}]
		);
	}

	#[test]
	fn test_stellar_sequence_overflow_is_a_decode_error() {
		let ctx = LedgerContext {
			sequence: u64::MAX,
			..CTX
		};
		assert!(matches!(
			stellar_payment(&ctx, &transfer(None, None)),
			Err(ConstructionError::Remote(ChainError::Decode(_)))
		));
	}

	#[test]
	fn test_stellar_credit_asset() {
		let tx = stellar_payment(&CTX, &transfer(Some("USDC"), Some("GISSUER"))).unwrap();
		assert!(matches!(
			&tx.operations[0],
			StellarOperation::Payment {
				asset: StellarAsset::Credit { code, issuer },
				..
			} if code == "USDC" && issuer == "GISSUER"
		));
		assert!(matches!(
			stellar_payment(&CTX, &transfer(Some("USDC"), None)),
			Err(ConstructionError::Validation(_))
		));
	}

	#[test]
	fn test_stellar_upload_and_trustline() {
		let deploy = ContractDeployIntent {
			source: transfer(None, None).source,
			bytecode: "0x0061736D".into(),
			constructor_args: None,
			contract_name: None,
		};
		let upload = stellar_upload(&CTX, &deploy).unwrap();
		assert_eq!(
			upload.operations,
			vec![StellarOperation::UploadContractWasm {
				wasm: "0061736d".into()
			}]
		);

		let trustline = TrustlineIntent {
			source: transfer(None, None).source,
			currency: "USDC".into(),
			issuer: "GISSUER".into(),
			limit: Some(Decimal::from(1000)),
		};
		let tx = stellar_trustline(&CTX, &trustline).unwrap();
		assert!(matches!(
			tx.operations[0],
			StellarOperation::ChangeTrust {
				limit: Some(10_000_000_000),
				..
			}
		));
	}

	#[test]
	fn test_xrp_native_and_issued() {
		let native = xrp_payment(&CTX, &transfer(Some("XRP"), None)).unwrap();
		assert_eq!(native.sequence, 41);
		assert_eq!(native.last_ledger_sequence, 1020);
		assert_eq!(native.fee, 100);
		assert_eq!(native.memos, vec!["invoice".to_string()]);
		assert_eq!(
			native.operation,
			XrpOperation::Payment {
				destination: "dest".into(),
				amount: XrpAmount::Drops(12_500_000),
			}
		);

		let issued = xrp_payment(&CTX, &transfer(Some("USD"), Some("rIssuer"))).unwrap();
		assert_eq!(
			issued.operation,
			XrpOperation::Payment {
				destination: "dest".into(),
				amount: XrpAmount::Issued {
					currency: "USD".into(),
					issuer: "rIssuer".into(),
					value: "12.5".into(),
				},
			}
		);
	}

	#[test]
	fn test_xrp_trustline_defaults_to_max_limit() {
		let trustline = TrustlineIntent {
			source: transfer(None, None).source,
			currency: "USD".into(),
			issuer: "rIssuer".into(),
			limit: None,
		};
		let tx = xrp_trustline(&CTX, &trustline);
		assert_eq!(
			tx.operation,
			XrpOperation::TrustSet {
				limit_amount: XrpAmount::Issued {
					currency: "USD".into(),
					issuer: "rIssuer".into(),
					value: XRP_MAX_TRUST_LIMIT.into(),
				}
			}
		);
	}
}
