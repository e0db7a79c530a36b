//! Multi-token output transactions (Hathor).
//!
//! Every output carries a token id. Minting locks a deposit of the native
//! asset and melting releases part of it. A spent authority output is
//! re-created to the change address.

use crate::selection::SelectedInputSet;
use crate::ConstructionError;
use rust_decimal::Decimal;
use signer_types::{
	to_base_units_u64, HathorInput, HathorOutput, HathorTransaction, KeyRing, Protocol, Recipient,
	TokenId, MELT_AUTHORITY, MINT_AUTHORITY,
};

/// Deposit rate of minted tokens, in percent.
const DEPOSIT_PERCENT: u64 = 1;

/// Native units locked when minting `amount` token units, rounded up.
pub fn mint_deposit(amount: u64) -> u64 {
	amount.saturating_mul(DEPOSIT_PERCENT).div_ceil(100)
}

/// Native units released when melting `amount` token units, rounded down.
pub fn melt_withdrawal(amount: u64) -> u64 {
	amount.saturating_mul(DEPOSIT_PERCENT) / 100
}

/// Converts an amount in display units to token units.
pub fn units(amount: Decimal) -> Result<u64, ConstructionError> {
	Ok(to_base_units_u64(amount, Protocol::Hathor.decimals())?)
}

/// Converts recipients to outputs, normalising their token ids.
pub fn recipients(recipients: &[Recipient]) -> Result<Vec<HathorOutput>, ConstructionError> {
	recipients
		.iter()
		.map(|r| {
			Ok(HathorOutput {
				address: r.address.clone(),
				value: units(r.amount)?,
				token: TokenId::normalize(r.token.as_deref(), Protocol::Hathor),
				authority: false,
			})
		})
		.collect()
}

/// Required amount per token, in first-seen order.
pub fn targets(outputs: &[HathorOutput]) -> Vec<(TokenId, u64)> {
	let mut targets: Vec<(TokenId, u64)> = Vec::new();
	for output in outputs {
		match targets.iter_mut().find(|(token, _)| *token == output.token) {
			Some((_, amount)) => *amount = amount.saturating_add(output.value),
			None => targets.push((output.token.clone(), output.value)),
		}
	}
	targets
}

/// Pays `outputs` and returns each token's remainder to `change_address`.
pub fn transfer<'k>(
	selected: &SelectedInputSet<'k>,
	mut outputs: Vec<HathorOutput>,
	change_address: &str,
	keys: &mut KeyRing<'k>,
) -> HathorTransaction {
	for (token, required) in targets(&outputs) {
		push_change(&mut outputs, change_address, &token, selected.total(&token), required);
	}
	assemble(selected, outputs, keys)
}

/// Mints `amount` units of `token` to `destination`.
pub fn mint<'k>(
	selected: &SelectedInputSet<'k>,
	token: &TokenId,
	amount: u64,
	destination: &str,
	change_address: &str,
	keys: &mut KeyRing<'k>,
) -> HathorTransaction {
	let native = TokenId::native();
	let mut outputs = vec![HathorOutput {
		address: destination.to_string(),
		value: amount,
		token: token.clone(),
		authority: false,
	}];
	push_authority(&mut outputs, selected, change_address, token, MINT_AUTHORITY);
	push_change(
		&mut outputs,
		change_address,
		&native,
		selected.total(&native),
		mint_deposit(amount),
	);
	assemble(selected, outputs, keys)
}

/// Melts `amount` units of `token` and pays the released deposit to
/// `destination`.
pub fn melt<'k>(
	selected: &SelectedInputSet<'k>,
	token: &TokenId,
	amount: u64,
	destination: &str,
	change_address: &str,
	keys: &mut KeyRing<'k>,
) -> HathorTransaction {
	let mut outputs = Vec::new();
	push_change(&mut outputs, change_address, token, selected.total(token), amount);
	push_authority(&mut outputs, selected, change_address, token, MELT_AUTHORITY);

	let withdrawal = melt_withdrawal(amount);
	if withdrawal > 0 {
		outputs.push(HathorOutput {
			address: destination.to_string(),
			value: withdrawal,
			token: TokenId::native(),
			authority: false,
		});
	}
	assemble(selected, outputs, keys)
}

fn push_authority(
	outputs: &mut Vec<HathorOutput>,
	selected: &SelectedInputSet<'_>,
	change_address: &str,
	token: &TokenId,
	mask: u64,
) {
	if selected.has_authority(token, mask) {
		outputs.push(HathorOutput {
			address: change_address.to_string(),
			value: mask,
			token: token.clone(),
			authority: true,
		});
	}
}

fn push_change(
	outputs: &mut Vec<HathorOutput>,
	change_address: &str,
	token: &TokenId,
	available: u64,
	required: u64,
) {
	let change = available.saturating_sub(required);
	if change > 0 {
		outputs.push(HathorOutput {
			address: change_address.to_string(),
			value: change,
			token: token.clone(),
			authority: false,
		});
	}
}

fn assemble<'k>(
	selected: &SelectedInputSet<'k>,
	outputs: Vec<HathorOutput>,
	keys: &mut KeyRing<'k>,
) -> HathorTransaction {
	let inputs = selected
		.iter()
		.map(|c| HathorInput {
			tx_hash: c.output.tx_hash.clone(),
			index: c.output.index,
			key_index: keys.push(c.key),
		})
		.collect();
	HathorTransaction {
		tokens: HathorTransaction::token_list(&outputs),
		inputs,
		outputs,
	}
}
