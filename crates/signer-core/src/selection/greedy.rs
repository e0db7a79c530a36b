//! First-fit selection in discovery order.

use super::{accumulate, SelectionStrategy};
use signer_types::UnspentOutput;

/// Takes eligible outputs in the order the chain data API returned them and
/// stops as soon as the requirement is met. No attempt is made to minimise
/// input count or change.
pub struct GreedySelection;

impl SelectionStrategy for GreedySelection {
	fn name(&self) -> &'static str {
		"greedy"
	}

	fn select(&self, eligible: &[&UnspentOutput], required: u64) -> Option<Vec<usize>> {
		accumulate(0..eligible.len(), eligible, required)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::utxo;

	#[test]
	fn test_keeps_discovery_order() {
		let outputs = [
			utxo("a", "00", 1, false),
			utxo("b", "00", 10, false),
			utxo("c", "00", 100, false),
		];
		let eligible: Vec<&UnspentOutput> = outputs.iter().collect();
		assert_eq!(GreedySelection.select(&eligible, 11), Some(vec![0, 1]));
		assert_eq!(GreedySelection.select(&eligible, 112), None);
	}

	#[test]
	fn test_zero_requirement_takes_first_output() {
		let outputs = [utxo("a", "00", 5, false)];
		let eligible: Vec<&UnspentOutput> = outputs.iter().collect();
		assert_eq!(GreedySelection.select(&eligible, 0), Some(vec![0]));
		assert_eq!(GreedySelection.select(&[], 0), None);
	}
}
