//! Operations for remote-assisted construction (Cardano).
//!
//! The construction service turns these operations into the unsigned
//! transaction and the payloads to sign.

use crate::selection::SelectedInputSet;
use crate::ConstructionError;
use signer_types::{ConstructionOperation, Currency, Protocol, TokenId, UtxoOutput};

/// Curve reported with every construction signature.
pub const CURVE_TYPE: &str = "edwards25519";
/// Signature type used when the payload does not name one.
pub const SIGNATURE_TYPE: &str = "ed25519";

pub fn currency() -> Currency {
	Currency {
		symbol: Protocol::Cardano.ticker().to_string(),
		decimals: Protocol::Cardano.decimals(),
	}
}

/// Spends every selected input, pays `recipients` and sends what is left
/// after `fee` to `change_address`.
///
/// A zero `fee` produces the draft used to ask the service for a fee.
pub fn operations(
	selected: &SelectedInputSet<'_>,
	recipients: &[UtxoOutput],
	change_address: &str,
	fee: u64,
) -> Result<Vec<ConstructionOperation>, ConstructionError> {
	let native = TokenId::native();
	let required = super::utxo::output_total(recipients)?.saturating_add(fee);
	selected.ensure_covers(&native, required)?;

	let mut operations = Vec::with_capacity(selected.len() + recipients.len() + 1);
	for candidate in selected.iter() {
		let output = &candidate.output;
		operations.push(ConstructionOperation::input(
			operations.len() as u64,
			&output.address,
			&output.tx_hash,
			output.index,
			output.value,
			currency(),
		));
	}
	for recipient in recipients {
		operations.push(ConstructionOperation::output(
			operations.len() as u64,
			&recipient.address,
			recipient.value,
			currency(),
		));
	}

	let change = selected.total(&native) - required;
	if change > 0 {
		operations.push(ConstructionOperation::output(
			operations.len() as u64,
			change_address,
			change,
			currency(),
		));
	}
	Ok(operations)
}
