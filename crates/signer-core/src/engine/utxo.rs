//! Native-asset output-chain flow (Bitcoin, Litecoin, Dogecoin).

use super::{Prepared, TransactionCrafter};
use crate::builders::utxo::{self, ResolvedInput};
use crate::ConstructionError;
use signer_types::{
	ChainRef, FeeOverride, FeeQuoteRequest, KeyRing, OperationKind, TokenId, UnsignedTransaction,
	UtxoSource, UtxoTransferIntent,
};

/// Explicit change address, else the first source address.
pub(super) fn change_address<'a>(
	source: &'a UtxoSource,
	explicit: Option<&'a str>,
) -> Result<&'a str, ConstructionError> {
	explicit.or_else(|| source.first_address()).ok_or_else(|| {
		ConstructionError::Validation(
			"changeAddress is required when spending explicit inputs".into(),
		)
	})
}

/// Quote request describing a transfer from `source` to the first recipient.
pub(super) fn transfer_request(transfer: &UtxoTransferIntent) -> FeeQuoteRequest {
	let first = transfer.outputs.first();
	FeeQuoteRequest {
		kind: Some(OperationKind::Transfer),
		from: transfer.source.first_address().map(str::to_string),
		to: first.map(|r| r.address.clone()),
		amount: first.map(|r| r.amount.to_string()),
		..Default::default()
	}
}

impl TransactionCrafter {
	/// Discovered outputs are selected to cover the recipients plus the fee.
	/// Explicit inputs are all spent.
	pub(super) async fn utxo_transfer<'k>(
		&self,
		chain: ChainRef,
		transfer: &'k UtxoTransferIntent,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let outputs = utxo::recipients(chain.protocol, &transfer.outputs)?;
		let change = change_address(&transfer.source, transfer.change_address.as_deref())?;
		let request = transfer_request(transfer);

		let (inputs, fee): (Vec<ResolvedInput<'k>>, u64) = match &transfer.source {
			UtxoSource::Addresses(_) => {
				let (candidates, quote) = tokio::try_join!(
					self.state.candidates(chain, &transfer.source),
					self.fees.resolve(chain, &request, fee),
				)?;
				let fee = quote.flat_fee();
				let required = utxo::output_total(&outputs)?.saturating_add(fee);
				let selected =
					self.selector.select_value(&candidates, &TokenId::native(), required)?;
				(self.state.resolve(chain, selected).await?, fee)
			},
			UtxoSource::Inputs(inputs) => {
				let (inputs, quote) = tokio::try_join!(
					self.state.explicit_inputs(chain, inputs),
					self.fees.resolve(chain, &request, fee),
				)?;
				(inputs, quote.flat_fee())
			},
		};

		let mut keys = KeyRing::new();
		let tx = utxo::build(inputs, outputs, change, fee, &mut keys)?;
		tracing::debug!(
			inputs = tx.inputs.len(),
			outputs = tx.outputs.len(),
			fee,
			strategy = self.selector.strategy_name(),
			"Built output transaction"
		);
		Ok(Prepared::Unsigned {
			tx: UnsignedTransaction::Utxo(tx),
			keys,
		})
	}
}
