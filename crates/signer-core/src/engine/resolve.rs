//! Chain state and fee resolution.
//!
//! Both are read fresh for every construction; nothing is cached between
//! calls.

use crate::builders::utxo::ResolvedInput;
use crate::selection::{Candidate, SelectedInputSet};
use crate::ConstructionError;
use futures::future::try_join_all;
use signer_chain::{ChainError, ChainStateClient, FeeQuotation};
use signer_types::{
	AddressKey, ChainRef, ChainState, FeeOverride, FeeQuote, FeeQuoteRequest, FeeShape, InputKey,
	UnspentOutput, UtxoSource,
};
use std::sync::Arc;

/// Resolves the fee of one transaction from the quotation service and the
/// caller's override.
pub struct FeeResolver {
	fees: Arc<dyn FeeQuotation>,
}

impl FeeResolver {
	pub fn new(fees: Arc<dyn FeeQuotation>) -> Self {
		Self { fees }
	}

	/// Each field the override sets replaces the quoted one. An override that
	/// sets every field of the protocol's fee shape is used without asking
	/// for a quote. Ledgers without network fees resolve to a zero flat fee.
	pub async fn resolve(
		&self,
		chain: ChainRef,
		request: &FeeQuoteRequest,
		fee_override: FeeOverride,
	) -> Result<FeeQuote, ConstructionError> {
		if chain.protocol.is_multi_token() {
			return Ok(FeeQuote::Flat { fee: 0 });
		}

		let shape = FeeShape::for_protocol(chain.protocol);
		if let Some(quote) = fee_override.to_quote(shape) {
			tracing::debug!(chain = %chain, "Fee override is complete, skipping quotation");
			return Ok(quote);
		}

		let quote = FeeQuote::from(self.fees.quote(chain, request).await?);
		if quote.shape() != shape {
			return Err(ChainError::Decode(format!(
				"Expected a {:?} fee quote for {}",
				shape, chain.protocol
			))
			.into());
		}
		Ok(fee_override.apply(quote))
	}
}

/// Reads chain state for the source of a transaction.
pub struct StateReader {
	client: Arc<dyn ChainStateClient>,
}

impl StateReader {
	pub fn new(client: Arc<dyn ChainStateClient>) -> Self {
		Self { client }
	}

	pub async fn account(
		&self,
		chain: ChainRef,
		address: &str,
	) -> Result<ChainState, ConstructionError> {
		let info = self.client.account(chain, address).await?;
		let nonce = info
			.nonce
			.ok_or_else(|| ChainError::Decode(format!("No nonce returned for {}", address)))?;
		Ok(ChainState::Account { nonce })
	}

	/// Sequence of `address` and the current ledger index. The latest block
	/// height stands in for the index when the account response lacks it.
	pub async fn ledger(
		&self,
		chain: ChainRef,
		address: &str,
	) -> Result<ChainState, ConstructionError> {
		let info = self.client.account(chain, address).await?;
		let sequence = info
			.sequence
			.ok_or_else(|| ChainError::Decode(format!("No sequence returned for {}", address)))?;
		let ledger_index = match info.ledger_current_index {
			Some(index) => index,
			None => self.client.latest_block(chain).await?.height,
		};
		Ok(ChainState::Ledger {
			sequence,
			ledger_index,
		})
	}

	/// Unspent outputs of every source address, in address order.
	pub async fn outputs(
		&self,
		chain: ChainRef,
		keys: &[AddressKey],
	) -> Result<ChainState, ConstructionError> {
		let per_address = try_join_all(
			keys.iter()
				.map(|key| self.client.unspent_outputs(chain, &key.address)),
		)
		.await?;

		let outputs = keys
			.iter()
			.zip(per_address)
			.flat_map(|(key, outputs)| {
				outputs.into_iter().map(move |mut output| {
					if output.address.is_empty() {
						output.address = key.address.clone();
					}
					output
				})
			})
			.collect::<Vec<_>>();
		tracing::debug!(chain = %chain, outputs = outputs.len(), "Fetched unspent outputs");
		Ok(ChainState::Outputs(outputs))
	}

	/// Candidates of an output-chain source: discovered outputs of the source
	/// addresses, or the explicitly named inputs.
	pub async fn candidates<'k>(
		&self,
		chain: ChainRef,
		source: &'k UtxoSource,
	) -> Result<Vec<Candidate<'k>>, ConstructionError> {
		match source {
			UtxoSource::Addresses(keys) => {
				let state = self.outputs(chain, keys).await?;
				Ok(owned_candidates(state, keys))
			},
			UtxoSource::Inputs(inputs) => Ok(self
				.explicit_inputs(chain, inputs)
				.await?
				.into_iter()
				.map(|input| input.candidate)
				.collect()),
		}
	}

	/// Fetches the creating transaction of every selected input.
	pub async fn resolve<'k>(
		&self,
		chain: ChainRef,
		selected: SelectedInputSet<'k>,
	) -> Result<Vec<ResolvedInput<'k>>, ConstructionError> {
		let candidates: Vec<Candidate<'k>> = selected.into_iter().collect();
		let transactions = try_join_all(
			candidates
				.iter()
				.map(|c| self.client.transaction(chain, &c.output.tx_hash)),
		)
		.await?;

		candidates
			.into_iter()
			.zip(&transactions)
			.map(|(candidate, raw)| ResolvedInput::new(candidate, raw))
			.collect()
	}

	/// Resolves caller-named inputs against their transactions.
	///
	/// Fails with [`ConstructionError::InvalidInput`] when an index is not an
	/// output of its transaction or when inputs repeat.
	pub async fn explicit_inputs<'k>(
		&self,
		chain: ChainRef,
		inputs: &'k [InputKey],
	) -> Result<Vec<ResolvedInput<'k>>, ConstructionError> {
		let transactions = try_join_all(
			inputs
				.iter()
				.map(|input| self.client.transaction(chain, &input.tx_hash)),
		)
		.await?;

		let mut seen = SelectedInputSet::new();
		let mut resolved = Vec::with_capacity(inputs.len());
		for (input, raw) in inputs.iter().zip(&transactions) {
			let output = raw.output(input.index).ok_or_else(|| {
				ConstructionError::InvalidInput(format!(
					"Output {} not found in transaction {}",
					input.index, input.tx_hash
				))
			})?;
			let candidate = Candidate::new(
				UnspentOutput {
					tx_hash: input.tx_hash.clone(),
					index: input.index,
					token: output.token.clone(),
					value: output.value,
					authority: output.authority,
					address: output.address.clone().unwrap_or_default(),
				},
				&input.private_key,
			);
			if seen.push(candidate.clone()) {
				resolved.push(ResolvedInput::new(candidate, raw)?);
			}
		}

		if resolved.len() != inputs.len() {
			return Err(ConstructionError::InvalidInput(format!(
				"{} inputs supplied but {} distinct outputs resolved",
				inputs.len(),
				resolved.len()
			)));
		}
		Ok(resolved)
	}
}

/// Pairs discovered outputs with the key of their address. Outputs of other
/// addresses are dropped.
pub fn owned_candidates<'k>(state: ChainState, keys: &'k [AddressKey]) -> Vec<Candidate<'k>> {
	let ChainState::Outputs(outputs) = state else {
		return Vec::new();
	};
	outputs
		.into_iter()
		.filter_map(|output| {
			let key = keys.iter().find(|k| k.address == output.address)?;
			Some(Candidate::new(output, &key.private_key))
		})
		.collect()
}
