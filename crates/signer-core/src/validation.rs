//! Intent checks that need no remote data.
//!
//! Everything here runs before the first network call of a construction.

use crate::ConstructionError;
use rust_decimal::Decimal;
use signer_types::{
	without_0x_prefix, AccountingModel, Intent, Operation, Protocol, TokenId, TokenSupplyIntent,
	TransferIntent, TrustlineIntent, UtxoSource, UtxoTransferIntent,
};

/// Longest text memo a Stellar transaction can carry, in bytes.
pub const MAX_STELLAR_MEMO_BYTES: usize = 28;

/// Fails unless `operation` is declared for `protocol`.
pub fn ensure_supported(
	protocol: Protocol,
	operation: &Operation,
) -> Result<(), ConstructionError> {
	let kind = operation.kind();
	let shape_matches = match (protocol.model(), operation) {
		(AccountingModel::UnspentOutput, Operation::Transfer(_)) => false,
		(_, Operation::UtxoTransfer(_)) => protocol.model() == AccountingModel::UnspentOutput,
		_ => true,
	};
	if !shape_matches || !protocol.supports(kind) {
		return Err(ConstructionError::UnsupportedProtocol {
			protocol,
			operation: kind,
		});
	}
	Ok(())
}

/// Checks the fields of an intent whose operation is supported.
pub fn validate(intent: &Intent) -> Result<(), ConstructionError> {
	let protocol = intent.protocol;
	match &intent.operation {
		Operation::Transfer(transfer) => validate_transfer(protocol, transfer),
		Operation::UtxoTransfer(transfer) => validate_utxo_transfer(protocol, transfer),
		Operation::ContractCall(call) => {
			require(&call.contract_address, "contractAddress")?;
			require(&call.method, "method")?;
			if let Some(amount) = call.amount {
				non_negative(amount, "amount")?;
			}
			Ok(())
		},
		Operation::ContractDeploy(deploy) => {
			require(&deploy.bytecode, "bytecode")?;
			hex_field(&deploy.bytecode, "bytecode")?;
			if let Some(args) = &deploy.constructor_args {
				hex_field(args, "constructorArgs")?;
			}
			Ok(())
		},
		Operation::TokenMint(supply) | Operation::TokenMelt(supply) => {
			validate_supply(protocol, supply)
		},
		Operation::Trustline(trustline) => validate_trustline(trustline),
	}
}

fn validate_transfer(
	protocol: Protocol,
	transfer: &TransferIntent,
) -> Result<(), ConstructionError> {
	require(&transfer.to, "to")?;
	non_negative(transfer.amount, "amount")?;

	let native = transfer
		.currency
		.as_deref()
		.is_none_or(|c| protocol.is_native_symbol(c));

	match protocol.model() {
		AccountingModel::Account => {
			if transfer.memo.is_some() && (!native || transfer.contract_address.is_some()) {
				return Err(ConstructionError::Validation(
					"memo is only supported on native transfers".into(),
				));
			}
		},
		AccountingModel::LedgerSequence => {
			if !native && transfer.issuer.as_deref().is_none_or(str::is_empty) {
				return Err(ConstructionError::Validation(format!(
					"issuer is required for non-native {} payments",
					protocol
				)));
			}
			if protocol == Protocol::Stellar {
				if let Some(memo) = &transfer.memo {
					if memo.len() > MAX_STELLAR_MEMO_BYTES {
						return Err(ConstructionError::Validation(format!(
							"memo exceeds {} bytes",
							MAX_STELLAR_MEMO_BYTES
						)));
					}
				}
			}
		},
		AccountingModel::UnspentOutput => {},
	}
	Ok(())
}

fn validate_utxo_transfer(
	protocol: Protocol,
	transfer: &UtxoTransferIntent,
) -> Result<(), ConstructionError> {
	validate_source(&transfer.source, transfer.change_address.as_deref())?;
	if transfer.outputs.is_empty() {
		return Err(ConstructionError::Validation(
			"at least one output is required".into(),
		));
	}

	for recipient in &transfer.outputs {
		require(&recipient.address, "outputs.address")?;
		non_negative(recipient.amount, "outputs.amount")?;
		let token = TokenId::normalize(recipient.token.as_deref(), protocol);
		if !protocol.is_multi_token() {
			if !token.is_native() {
				return Err(ConstructionError::Validation(format!(
					"{} outputs carry only the native asset",
					protocol
				)));
			}
			if recipient.amount.is_zero() {
				return Err(ConstructionError::Validation(
					"outputs.amount must be positive".into(),
				));
			}
		}
	}
	Ok(())
}

fn validate_supply(
	protocol: Protocol,
	supply: &TokenSupplyIntent,
) -> Result<(), ConstructionError> {
	validate_source(&supply.source, supply.change_address.as_deref())?;
	require(&supply.token, "token")?;
	if TokenId::normalize(Some(&supply.token), protocol).is_native() {
		return Err(ConstructionError::Validation(
			"the native asset cannot be minted or melted".into(),
		));
	}
	if supply.amount <= Decimal::ZERO {
		return Err(ConstructionError::Validation(
			"amount must be positive".into(),
		));
	}
	Ok(())
}

fn validate_trustline(trustline: &TrustlineIntent) -> Result<(), ConstructionError> {
	require(&trustline.currency, "currency")?;
	require(&trustline.issuer, "issuer")?;
	if let Some(limit) = trustline.limit {
		non_negative(limit, "limit")?;
	}
	Ok(())
}

fn validate_source(
	source: &UtxoSource,
	change_address: Option<&str>,
) -> Result<(), ConstructionError> {
	if source.is_empty() {
		return Err(ConstructionError::Validation(
			"at least one source address or input is required".into(),
		));
	}
	match source {
		UtxoSource::Addresses(keys) => {
			for key in keys {
				require(&key.address, "fromAddress.address")?;
			}
		},
		UtxoSource::Inputs(inputs) => {
			for input in inputs {
				require(&input.tx_hash, "fromUtxo.txHash")?;
			}
			if change_address.is_none_or(str::is_empty) {
				return Err(ConstructionError::Validation(
					"changeAddress is required when spending explicit inputs".into(),
				));
			}
		},
	}
	Ok(())
}

fn require(value: &str, field: &str) -> Result<(), ConstructionError> {
	if value.trim().is_empty() {
		return Err(ConstructionError::Validation(format!("{} is required", field)));
	}
	Ok(())
}

fn non_negative(amount: Decimal, field: &str) -> Result<(), ConstructionError> {
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(ConstructionError::Validation(format!(
			"{} must not be negative",
			field
		)));
	}
	Ok(())
}

fn hex_field(value: &str, field: &str) -> Result<(), ConstructionError> {
	hex::decode(without_0x_prefix(value))
		.map(|_| ())
		.map_err(|e| ConstructionError::Validation(format!("{} is not valid hex: {}", field, e)))
}
