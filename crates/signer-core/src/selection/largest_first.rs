//! First-fit selection over outputs sorted by descending value.

use super::{accumulate, SelectionStrategy};
use signer_types::UnspentOutput;
use std::cmp::Reverse;

/// Spends the largest outputs first, which keeps the input count low. Ties
/// keep discovery order.
pub struct LargestFirstSelection;

impl SelectionStrategy for LargestFirstSelection {
	fn name(&self) -> &'static str {
		"largest_first"
	}

	fn select(&self, eligible: &[&UnspentOutput], required: u64) -> Option<Vec<usize>> {
		let mut order: Vec<usize> = (0..eligible.len()).collect();
		order.sort_by_key(|&position| Reverse(eligible[position].value));
		accumulate(order, eligible, required)
	}
}
