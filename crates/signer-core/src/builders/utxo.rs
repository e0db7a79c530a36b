//! Native-asset output-chain transactions (Bitcoin, Litecoin, Dogecoin).

use crate::selection::Candidate;
use crate::ConstructionError;
use signer_types::{
	to_base_units_u64, truncate_id, KeyRing, Protocol, RawTransaction, Recipient, TokenId,
	UtxoInput, UtxoOutput, UtxoTransaction,
};

/// A selected input with the context of the transaction that created it.
#[derive(Debug, Clone)]
pub struct ResolvedInput<'k> {
	pub candidate: Candidate<'k>,
	pub prev_tx_hex: String,
	pub block_hash: Option<String>,
	pub script: Option<String>,
}

impl<'k> ResolvedInput<'k> {
	/// Fails with [`ConstructionError::InvalidInput`] when `raw` has no output
	/// at the candidate's index.
	pub fn new(candidate: Candidate<'k>, raw: &RawTransaction) -> Result<Self, ConstructionError> {
		let output = raw.output(candidate.output.index).ok_or_else(|| {
			ConstructionError::InvalidInput(format!(
				"Output {} not found in transaction {}",
				candidate.output.index,
				truncate_id(&candidate.output.tx_hash)
			))
		})?;
		Ok(Self {
			script: output.script.clone(),
			prev_tx_hex: raw.hex.clone(),
			block_hash: raw.block_hash.clone(),
			candidate,
		})
	}
}

/// Converts recipients to outputs in the smallest unit of `protocol`.
pub fn recipients(
	protocol: Protocol,
	recipients: &[Recipient],
) -> Result<Vec<UtxoOutput>, ConstructionError> {
	recipients
		.iter()
		.map(|r| {
			Ok(UtxoOutput {
				address: r.address.clone(),
				value: to_base_units_u64(r.amount, protocol.decimals())?,
			})
		})
		.collect()
}

/// Sum of output values, failing on overflow.
pub fn output_total(outputs: &[UtxoOutput]) -> Result<u64, ConstructionError> {
	outputs.iter().try_fold(0u64, |acc, o| {
		acc.checked_add(o.value)
			.ok_or_else(|| ConstructionError::Validation("output total overflows".into()))
	})
}

/// Spends every input, pays `outputs` and returns the remainder after `fee`
/// to `change_address`.
pub fn build<'k>(
	inputs: Vec<ResolvedInput<'k>>,
	mut outputs: Vec<UtxoOutput>,
	change_address: &str,
	fee: u64,
	keys: &mut KeyRing<'k>,
) -> Result<UtxoTransaction, ConstructionError> {
	let required = output_total(&outputs)?
		.checked_add(fee)
		.ok_or_else(|| ConstructionError::Validation("output total overflows".into()))?;
	let available = inputs
		.iter()
		.fold(0u64, |acc, i| acc.saturating_add(i.candidate.output.value));
	if inputs.is_empty() || available < required {
		return Err(ConstructionError::NoAvailableOutputs {
			token: TokenId::native(),
			required,
			available,
		});
	}

	let change = available - required;
	if change > 0 {
		outputs.push(UtxoOutput {
			address: change_address.to_string(),
			value: change,
		});
	}

	let inputs = inputs
		.into_iter()
		.map(|input| UtxoInput {
			key_index: keys.push(input.candidate.key),
			tx_hash: input.candidate.output.tx_hash,
			index: input.candidate.output.index,
			value: input.candidate.output.value,
			prev_tx_hex: input.prev_tx_hex,
			block_hash: input.block_hash,
			script: input.script,
		})
		.collect();

	Ok(UtxoTransaction {
		inputs,
		outputs,
		fee,
	})
}
