//! Multi-token flow for Hathor: transfers, mint and melt.
//!
//! Hathor charges no network fee, so these flows never ask for a quote and
//! ignore fee overrides.

use super::utxo::change_address;
use super::{Prepared, TransactionCrafter};
use crate::builders::hathor;
use crate::selection::{Candidate, SelectedInputSet};
use crate::ConstructionError;
use signer_types::{
	ChainRef, FeeOverride, KeyRing, Protocol, TokenId, TokenSupplyIntent, UnsignedTransaction,
	UtxoSource, UtxoTransferIntent, MELT_AUTHORITY, MINT_AUTHORITY,
};

/// Every candidate, for sources that name their inputs explicitly.
fn spend_all<'k>(candidates: Vec<Candidate<'k>>) -> SelectedInputSet<'k> {
	let mut selected = SelectedInputSet::new();
	for candidate in candidates {
		selected.push(candidate);
	}
	selected
}

impl TransactionCrafter {
	pub(super) async fn hathor_transfer<'k>(
		&self,
		chain: ChainRef,
		transfer: &'k UtxoTransferIntent,
		_fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let outputs = hathor::recipients(&transfer.outputs)?;
		let change = change_address(&transfer.source, transfer.change_address.as_deref())?;
		let targets = hathor::targets(&outputs);

		let candidates = self.state.candidates(chain, &transfer.source).await?;
		let selected = match &transfer.source {
			UtxoSource::Addresses(_) => self.selector.select_targets(&candidates, &targets)?,
			UtxoSource::Inputs(_) => {
				let selected = spend_all(candidates);
				for (token, required) in &targets {
					selected.ensure_covers(token, *required)?;
				}
				selected
			},
		};

		let mut keys = KeyRing::new();
		let tx = hathor::transfer(&selected, outputs, change, &mut keys);
		tracing::debug!(
			inputs = tx.inputs.len(),
			outputs = tx.outputs.len(),
			tokens = tx.tokens.len(),
			"Built token transfer"
		);
		Ok(Prepared::Unsigned {
			tx: UnsignedTransaction::Hathor(tx),
			keys,
		})
	}

	/// Spends either a mint authority or native outputs covering `amount`.
	pub(super) async fn hathor_mint<'k>(
		&self,
		chain: ChainRef,
		supply: &'k TokenSupplyIntent,
		_fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let token = TokenId::normalize(Some(&supply.token), Protocol::Hathor);
		let amount = hathor::units(supply.amount)?;
		let change = change_address(&supply.source, supply.change_address.as_deref())?;
		let destination = supply.destination.as_deref().unwrap_or(change);

		let selected = self
			.supply_inputs(chain, supply, &token, MINT_AUTHORITY, &TokenId::native(), amount)
			.await?;

		let mut keys = KeyRing::new();
		let tx = hathor::mint(&selected, &token, amount, destination, change, &mut keys);
		tracing::debug!(
			token = %token,
			amount,
			deposit = hathor::mint_deposit(amount),
			inputs = tx.inputs.len(),
			"Built token mint"
		);
		Ok(Prepared::Unsigned {
			tx: UnsignedTransaction::Hathor(tx),
			keys,
		})
	}

	/// Spends either a melt authority or `amount` units of the token.
	pub(super) async fn hathor_melt<'k>(
		&self,
		chain: ChainRef,
		supply: &'k TokenSupplyIntent,
		_fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let token = TokenId::normalize(Some(&supply.token), Protocol::Hathor);
		let amount = hathor::units(supply.amount)?;
		let change = change_address(&supply.source, supply.change_address.as_deref())?;
		let destination = supply.destination.as_deref().unwrap_or(change);

		let selected = self
			.supply_inputs(chain, supply, &token, MELT_AUTHORITY, &token, amount)
			.await?;

		let mut keys = KeyRing::new();
		let tx = hathor::melt(&selected, &token, amount, destination, change, &mut keys);
		tracing::debug!(
			token = %token,
			amount,
			withdrawal = hathor::melt_withdrawal(amount),
			inputs = tx.inputs.len(),
			"Built token melt"
		);
		Ok(Prepared::Unsigned {
			tx: UnsignedTransaction::Hathor(tx),
			keys,
		})
	}

	/// Inputs of a supply change: one authority output carrying `mask`, or
	/// value outputs of `value_token` covering `required`.
	async fn supply_inputs<'k>(
		&self,
		chain: ChainRef,
		supply: &'k TokenSupplyIntent,
		token: &TokenId,
		mask: u64,
		value_token: &TokenId,
		required: u64,
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		let candidates = self.state.candidates(chain, &supply.source).await?;
		match &supply.source {
			UtxoSource::Addresses(_) => {
				self.selector
					.select_supply(&candidates, token, mask, value_token, required)
			},
			UtxoSource::Inputs(_) => {
				let selected = spend_all(candidates);
				selected.ensure_supply(token, mask, value_token, required)?;
				Ok(selected)
			},
		}
	}
}
