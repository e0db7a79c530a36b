//! Conversion of human-unit amounts into a ledger's smallest unit.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Largest scale a `Decimal` can represent exactly.
const MAX_DECIMALS: u32 = 28;

/// Errors that can occur when converting amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("Amount cannot be negative: {0}")]
	Negative(Decimal),
	#[error("Amount {amount} has more than {decimals} decimal places")]
	TooPrecise { amount: Decimal, decimals: u32 },
	#[error("Amount {0} overflows the target unit")]
	Overflow(Decimal),
	#[error("Unsupported number of decimals: {0}")]
	UnsupportedDecimals(u32),
}

/// Converts `amount` (display units) into integer smallest units.
///
/// Fails instead of rounding when the amount carries more precision than the
/// asset supports.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<u128, AmountError> {
	if decimals > MAX_DECIMALS {
		return Err(AmountError::UnsupportedDecimals(decimals));
	}
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(AmountError::Negative(amount));
	}

	let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
	let scaled = amount
		.checked_mul(factor)
		.ok_or(AmountError::Overflow(amount))?;
	if !scaled.fract().is_zero() {
		return Err(AmountError::TooPrecise { amount, decimals });
	}

	scaled.trunc().to_u128().ok_or(AmountError::Overflow(amount))
}

/// Same as [`to_base_units`] but bounded to `u64`, the width used by every
/// non-EVM ledger.
pub fn to_base_units_u64(amount: Decimal, decimals: u32) -> Result<u64, AmountError> {
	let value = to_base_units(amount, decimals)?;
	u64::try_from(value).map_err(|_| AmountError::Overflow(amount))
}
