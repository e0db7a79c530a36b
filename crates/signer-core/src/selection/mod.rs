//! Input selection for output-based chains.
//!
//! Selection runs over candidates in discovery order. The strategy decides
//! which of the eligible outputs to take; [`UtxoSelector`] decides which
//! outputs are eligible for a requirement and turns a shortfall into
//! [`ConstructionError::NoAvailableOutputs`].

use crate::ConstructionError;
use signer_config::SelectionStrategyKind;
use signer_types::{SecretString, TokenId, UnspentOutput};

pub mod greedy;
pub mod largest_first;

pub use greedy::GreedySelection;
pub use largest_first::LargestFirstSelection;

/// A spendable output together with the key that controls it.
#[derive(Debug, Clone)]
pub struct Candidate<'k> {
	pub output: UnspentOutput,
	pub key: &'k SecretString,
}

impl<'k> Candidate<'k> {
	pub fn new(output: UnspentOutput, key: &'k SecretString) -> Self {
		Self { output, key }
	}
}

/// Policy for picking value outputs.
pub trait SelectionStrategy: Send + Sync {
	fn name(&self) -> &'static str;

	/// Picks from `eligible` until the running total reaches `required`.
	///
	/// Returns positions into `eligible` in the order they were taken, or
	/// `None` when the eligible total cannot reach `required`.
	fn select(&self, eligible: &[&UnspentOutput], required: u64) -> Option<Vec<usize>>;
}

/// Authority output of `token` whose value is exactly `mask`.
fn is_authority(output: &UnspentOutput, token: &TokenId, mask: u64) -> bool {
	output.token == *token && output.authority && output.value == mask
}

/// Takes outputs in `order` until the total reaches `required`.
///
/// Every output is pushed before the total is checked, so a zero requirement
/// still takes the first output.
pub(crate) fn accumulate(
	order: impl IntoIterator<Item = usize>,
	eligible: &[&UnspentOutput],
	required: u64,
) -> Option<Vec<usize>> {
	let mut total = 0u64;
	let mut picked = Vec::new();
	for position in order {
		let output = eligible.get(position)?;
		picked.push(position);
		total = total.saturating_add(output.value);
		if total >= required {
			return Some(picked);
		}
	}
	None
}

/// Ordered inputs chosen for one transaction.
///
/// No outpoint appears twice.
#[derive(Debug, Clone, Default)]
pub struct SelectedInputSet<'k> {
	inputs: Vec<Candidate<'k>>,
}

impl<'k> SelectedInputSet<'k> {
	pub fn new() -> Self {
		Self { inputs: Vec::new() }
	}

	/// Adds `candidate` unless its outpoint is already selected.
	pub fn push(&mut self, candidate: Candidate<'k>) -> bool {
		if self.contains(candidate.output.outpoint()) {
			return false;
		}
		self.inputs.push(candidate);
		true
	}

	pub fn extend(&mut self, other: SelectedInputSet<'k>) {
		for candidate in other.inputs {
			self.push(candidate);
		}
	}

	pub fn contains(&self, outpoint: (&str, u32)) -> bool {
		self.inputs.iter().any(|c| c.output.outpoint() == outpoint)
	}

	pub fn len(&self) -> usize {
		self.inputs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inputs.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Candidate<'k>> {
		self.inputs.iter()
	}

	/// Spendable value of `token`, excluding authority outputs.
	pub fn total(&self, token: &TokenId) -> u64 {
		self.inputs
			.iter()
			.filter(|c| c.output.token == *token && !c.output.authority)
			.fold(0u64, |acc, c| acc.saturating_add(c.output.value))
	}

	/// Fails unless the set holds at least `required` of `token`.
	pub fn ensure_covers(&self, token: &TokenId, required: u64) -> Result<(), ConstructionError> {
		let available = self.total(token);
		if self.is_empty() || available < required {
			return Err(ConstructionError::NoAvailableOutputs {
				token: token.clone(),
				required,
				available,
			});
		}
		Ok(())
	}

	/// Whether the set holds an authority output of `token` carrying `mask`.
	pub fn has_authority(&self, token: &TokenId, mask: u64) -> bool {
		self.inputs
			.iter()
			.any(|c| is_authority(&c.output, token, mask))
	}

	/// Fails unless the set holds either the authority of `token` carrying
	/// `mask` or at least `required` of `value_token`.
	pub fn ensure_supply(
		&self,
		token: &TokenId,
		mask: u64,
		value_token: &TokenId,
		required: u64,
	) -> Result<(), ConstructionError> {
		if self.has_authority(token, mask) {
			return Ok(());
		}
		self.ensure_covers(value_token, required)
	}
}

impl<'k> IntoIterator for SelectedInputSet<'k> {
	type Item = Candidate<'k>;
	type IntoIter = std::vec::IntoIter<Candidate<'k>>;

	fn into_iter(self) -> Self::IntoIter {
		self.inputs.into_iter()
	}
}

/// Applies a [`SelectionStrategy`] to the requirements of a transaction.
pub struct UtxoSelector {
	strategy: Box<dyn SelectionStrategy>,
}

impl Default for UtxoSelector {
	fn default() -> Self {
		Self::new(Box::new(GreedySelection))
	}
}

impl UtxoSelector {
	pub fn new(strategy: Box<dyn SelectionStrategy>) -> Self {
		Self { strategy }
	}

	pub fn from_kind(kind: SelectionStrategyKind) -> Self {
		match kind {
			SelectionStrategyKind::Greedy => Self::new(Box::new(GreedySelection)),
			SelectionStrategyKind::LargestFirst => Self::new(Box::new(LargestFirstSelection)),
		}
	}

	pub fn strategy_name(&self) -> &'static str {
		self.strategy.name()
	}

	/// Value outputs of `token` until the total reaches `required`.
	pub fn select_value<'k>(
		&self,
		candidates: &[Candidate<'k>],
		token: &TokenId,
		required: u64,
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		self.select_eligible(candidates, token, required, |o| {
			o.token == *token && !o.authority
		})
	}

	/// One pass per `(token, amount)` target, in the order given.
	///
	/// Authority outputs are never spent for value, except that a zero-value
	/// native target accepts any native output as its anchor.
	pub fn select_targets<'k>(
		&self,
		candidates: &[Candidate<'k>],
		targets: &[(TokenId, u64)],
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		let mut selected = SelectedInputSet::new();
		for (token, required) in targets {
			let anchor = token.is_native() && *required == 0;
			let pass = self.select_eligible(candidates, token, *required, |o| {
				o.token == *token && (!o.authority || anchor)
			})?;
			selected.extend(pass);
		}
		Ok(selected)
	}

	/// Exactly one authority output of `token` whose value equals `mask`.
	///
	/// Value outputs are never taken by this pass.
	pub fn select_authority<'k>(
		&self,
		candidates: &[Candidate<'k>],
		token: &TokenId,
		mask: u64,
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		let authority = candidates
			.iter()
			.find(|c| is_authority(&c.output, token, mask))
			.ok_or_else(|| ConstructionError::NoAvailableOutputs {
				token: token.clone(),
				required: mask,
				available: 0,
			})?;

		let mut selected = SelectedInputSet::new();
		selected.push(authority.clone());
		tracing::debug!(token = %token, mask, "Selected authority output");
		Ok(selected)
	}

	/// Inputs of a supply change: either exactly one authority output of
	/// `token` carrying `mask`, or value outputs of `value_token` covering
	/// `required`.
	///
	/// An authority output anywhere among the candidates is taken alone and
	/// every value output is ignored.
	pub fn select_supply<'k>(
		&self,
		candidates: &[Candidate<'k>],
		token: &TokenId,
		mask: u64,
		value_token: &TokenId,
		required: u64,
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		if candidates.iter().any(|c| is_authority(&c.output, token, mask)) {
			return self.select_authority(candidates, token, mask);
		}
		self.select_value(candidates, value_token, required)
	}

	fn select_eligible<'k>(
		&self,
		candidates: &[Candidate<'k>],
		token: &TokenId,
		required: u64,
		eligible: impl Fn(&UnspentOutput) -> bool,
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		let pool: Vec<&Candidate<'k>> = candidates
			.iter()
			.filter(|c| eligible(&c.output))
			.collect();
		let outputs: Vec<&UnspentOutput> = pool.iter().map(|c| &c.output).collect();

		let Some(picked) = self.strategy.select(&outputs, required) else {
			return Err(ConstructionError::NoAvailableOutputs {
				token: token.clone(),
				required,
				available: outputs.iter().fold(0u64, |acc, o| acc.saturating_add(o.value)),
			});
		};

		let mut selected = SelectedInputSet::new();
		for position in picked {
			let candidate = pool.get(position).ok_or_else(|| {
				ConstructionError::Validation(format!(
					"Selection strategy {} picked position {} of {} eligible outputs",
					self.strategy.name(),
					position,
					pool.len()
				))
			})?;
			selected.push((*candidate).clone());
		}
		tracing::debug!(
			strategy = self.strategy.name(),
			token = %token,
			required,
			inputs = selected.len(),
			"Selected inputs"
		);
		Ok(selected)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::utxo;
	use signer_types::{Protocol, MELT_AUTHORITY, MINT_AUTHORITY};

	fn candidates<'k>(key: &'k SecretString, outputs: Vec<UnspentOutput>) -> Vec<Candidate<'k>> {
		outputs
			.into_iter()
			.map(|o| Candidate::new(o, key))
			.collect()
	}

	fn hashes(set: &SelectedInputSet<'_>) -> Vec<String> {
		set.iter().map(|c| c.output.tx_hash.clone()).collect()
	}

	#[test]
	fn test_greedy_stops_once_covered() {
		let key = SecretString::from("01");
		let pool = candidates(
			&key,
			vec![
				utxo("a", "00", 400, false),
				utxo("b", "00", 700, false),
				utxo("c", "00", 900, false),
			],
		);

		let selected = UtxoSelector::default()
			.select_value(&pool, &TokenId::native(), 1000)
			.unwrap();
		assert_eq!(hashes(&selected), vec!["a", "b"]);
		assert!(selected.total(&TokenId::native()) >= 1000);
	}

	#[test]
	fn test_selected_total_covers_requirement() {
		let key = SecretString::from("01");
		let values = [3u64, 1, 4, 1, 5, 9, 2, 6];
		let pool = candidates(
			&key,
			values
				.iter()
				.enumerate()
				.map(|(i, v)| utxo(&format!("tx{}", i), "00", *v, false))
				.collect(),
		);
		let available: u64 = values.iter().sum();

		for selector in [
			UtxoSelector::default(),
			UtxoSelector::from_kind(SelectionStrategyKind::LargestFirst),
		] {
			for required in 0..=available + 1 {
				match selector.select_value(&pool, &TokenId::native(), required) {
					Ok(selected) => assert!(selected.total(&TokenId::native()) >= required),
					Err(ConstructionError::NoAvailableOutputs {
						available: reported,
						..
					}) => {
						assert!(required > available);
						assert_eq!(reported, available);
					},
					Err(e) => panic!("unexpected error: {}", e),
				}
			}
		}
	}

	#[test]
	fn test_empty_pool_has_no_available_outputs() {
		let result = UtxoSelector::default().select_value(&[], &TokenId::native(), 0);
		assert!(matches!(
			result,
			Err(ConstructionError::NoAvailableOutputs {
				required: 0,
				available: 0,
				..
			})
		));
	}

	#[test]
	fn test_authority_outputs_are_not_spent_for_value() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let pool = candidates(
			&key,
			vec![
				utxo("auth", "00c0ffee", MELT_AUTHORITY, true),
				utxo("v1", "00c0ffee", 50, false),
			],
		);

		let selected = UtxoSelector::default()
			.select_value(&pool, &token, 2)
			.unwrap();
		assert_eq!(hashes(&selected), vec!["v1"]);
	}

	#[test]
	fn test_targets_partition_by_token() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let pool = candidates(
			&key,
			vec![
				utxo("n1", "00", 10, false),
				utxo("t1", "00c0ffee", 30, false),
				utxo("n2", "00", 10, false),
				utxo("t2", "00c0ffee", 30, false),
			],
		);

		let targets = vec![
			(token.clone(), 40),
			(TokenId::normalize(Some("HTR"), Protocol::Hathor), 15),
		];
		let selected = UtxoSelector::default()
			.select_targets(&pool, &targets)
			.unwrap();
		assert_eq!(hashes(&selected), vec!["t1", "t2", "n1", "n2"]);
	}

	#[test]
	fn test_zero_native_target_takes_an_anchor() {
		let key = SecretString::from("01");
		let pool = candidates(
			&key,
			vec![
				utxo("t1", "00c0ffee", 30, false),
				utxo("n1", "00", MINT_AUTHORITY, true),
				utxo("n2", "00", 10, false),
			],
		);

		let selected = UtxoSelector::default()
			.select_targets(&pool, &[(TokenId::native(), 0)])
			.unwrap();
		assert_eq!(hashes(&selected), vec!["n1"]);
	}

	#[test]
	fn test_melt_authority_is_selected_alone() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let pool = candidates(
			&key,
			vec![
				utxo("v1", "00c0ffee", 500, false),
				utxo("mint", "00c0ffee", MINT_AUTHORITY, true),
				utxo("melt", "00c0ffee", MELT_AUTHORITY, true),
				utxo("v2", "00c0ffee", 300, false),
			],
		);

		let selected = UtxoSelector::default()
			.select_authority(&pool, &token, MELT_AUTHORITY)
			.unwrap();
		assert_eq!(hashes(&selected), vec!["melt"]);
	}

	#[test]
	fn test_supply_prefers_authority_over_value() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let pool = candidates(
			&key,
			vec![
				utxo("tok", "00c0ffee", 1_500, false),
				utxo("htr", "00", 500, false),
				utxo("melt", "00c0ffee", MELT_AUTHORITY, true),
			],
		);

		let selected = UtxoSelector::default()
			.select_supply(&pool, &token, MELT_AUTHORITY, &token, 1_000)
			.unwrap();
		assert_eq!(hashes(&selected), vec!["melt"]);
		assert_eq!(selected.total(&token), 0);
	}

	#[test]
	fn test_supply_falls_back_to_value_outputs() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let pool = candidates(
			&key,
			vec![
				utxo("melt", "00c0ffee", MELT_AUTHORITY, true),
				utxo("n1", "00", 60, false),
				utxo("n2", "00", 60, false),
				utxo("n3", "00", 60, false),
			],
		);

		let selected = UtxoSelector::default()
			.select_supply(&pool, &token, MINT_AUTHORITY, &TokenId::native(), 100)
			.unwrap();
		assert_eq!(hashes(&selected), vec!["n1", "n2"]);
		assert!(!selected.has_authority(&token, MINT_AUTHORITY));

		assert!(matches!(
			UtxoSelector::default().select_supply(
				&pool,
				&token,
				MINT_AUTHORITY,
				&TokenId::native(),
				181
			),
			Err(ConstructionError::NoAvailableOutputs {
				required: 181,
				available: 180,
				..
			})
		));
	}

	#[test]
	fn test_ensure_supply_accepts_either_requirement() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let mut authority = SelectedInputSet::new();
		authority.push(Candidate::new(utxo("mint", "00c0ffee", MINT_AUTHORITY, true), &key));
		assert!(authority
			.ensure_supply(&token, MINT_AUTHORITY, &TokenId::native(), 1_000)
			.is_ok());

		let mut value = SelectedInputSet::new();
		value.push(Candidate::new(utxo("htr", "00", 40, false), &key));
		assert!(value
			.ensure_supply(&token, MINT_AUTHORITY, &TokenId::native(), 40)
			.is_ok());
		assert!(matches!(
			value.ensure_supply(&token, MINT_AUTHORITY, &TokenId::native(), 41),
			Err(ConstructionError::NoAvailableOutputs { .. })
		));
	}

	struct OutOfRange;

	impl SelectionStrategy for OutOfRange {
		fn name(&self) -> &'static str {
			"out-of-range"
		}

		fn select(&self, eligible: &[&UnspentOutput], _required: u64) -> Option<Vec<usize>> {
			Some(vec![eligible.len()])
		}
	}

	#[test]
	fn test_strategy_position_out_of_range_is_rejected() {
		let key = SecretString::from("01");
		let pool = candidates(&key, vec![utxo("a", "00", 10, false)]);

		let result = UtxoSelector::new(Box::new(OutOfRange)).select_value(
			&pool,
			&TokenId::native(),
			5,
		);
		assert!(matches!(result, Err(ConstructionError::Validation(_))));
	}

	#[test]
	fn test_accumulate_ignores_positions_past_the_end() {
		let outputs = [utxo("a", "00", 10, false)];
		let eligible: Vec<&UnspentOutput> = outputs.iter().collect();
		assert_eq!(accumulate([0, 3], &eligible, 20), None);
	}

	#[test]
	fn test_authority_requires_exact_mask() {
		let key = SecretString::from("01");
		let token = TokenId::new("00c0ffee");
		let pool = candidates(
			&key,
			vec![
				utxo("both", "00c0ffee", MINT_AUTHORITY | MELT_AUTHORITY, true),
				utxo("other", "00beef", MINT_AUTHORITY, true),
			],
		);

		assert!(matches!(
			UtxoSelector::default().select_authority(&pool, &token, MINT_AUTHORITY),
			Err(ConstructionError::NoAvailableOutputs { .. })
		));
	}

	#[test]
	fn test_selected_set_rejects_duplicate_outpoints() {
		let key = SecretString::from("01");
		let mut set = SelectedInputSet::new();
		assert!(set.push(Candidate::new(utxo("a", "00", 1, false), &key)));
		assert!(!set.push(Candidate::new(utxo("a", "00", 1, false), &key)));
		assert_eq!(set.len(), 1);
	}

	#[test]
	fn test_ensure_covers() {
		let key = SecretString::from("01");
		let mut set = SelectedInputSet::new();
		set.push(Candidate::new(utxo("a", "00", 100, false), &key));
		assert!(set.ensure_covers(&TokenId::native(), 100).is_ok());
		assert!(matches!(
			set.ensure_covers(&TokenId::native(), 101),
			Err(ConstructionError::NoAvailableOutputs {
				required: 101,
				available: 100,
				..
			})
		));
	}
}
