//! Multi-phase flow for Cardano.
//!
//! The construction service is asked for a fee on a draft of the
//! operations, then for the payloads of the final operations. Every payload
//! is signed locally with the key of its address and the signatures are
//! combined by the service in a single call.

use super::utxo::change_address;
use super::{Prepared, TransactionCrafter};
use crate::builders::{cardano, utxo};
use crate::selection::{Candidate, SelectedInputSet};
use crate::ConstructionError;
use signer_account::SigningError;
use signer_chain::ChainError;
use signer_types::{
	ChainRef, CombineRequest, ConstructionSignature, FeeOverride, MetadataRequest,
	PayloadsRequest, PublicKey, SecretString, SigningPayload, TokenId, UtxoSource,
	UtxoTransferIntent,
};

impl TransactionCrafter {
	pub(super) async fn cardano_transfer<'k>(
		&self,
		chain: ChainRef,
		transfer: &'k UtxoTransferIntent,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let recipients = utxo::recipients(chain.protocol, &transfer.outputs)?;
		let change = change_address(&transfer.source, transfer.change_address.as_deref())?;
		let candidates = self.state.candidates(chain, &transfer.source).await?;
		let amount = utxo::output_total(&recipients)?;

		let (fee, metadata) = match fee.fee {
			Some(fee) => (fee, serde_json::json!({})),
			None => {
				let draft = self.cardano_inputs(&transfer.source, &candidates, amount)?;
				let request = MetadataRequest {
					operations: cardano::operations(&draft, &recipients, change, 0)?,
				};
				let response = self.construction.metadata(chain, &request).await?;
				let fee = response.fee().ok_or_else(|| {
					ChainError::Decode("Construction metadata carries no suggested fee".into())
				})?;
				(fee, response.metadata)
			},
		};

		let selected =
			self.cardano_inputs(&transfer.source, &candidates, amount.saturating_add(fee))?;
		let operations = cardano::operations(&selected, &recipients, change, fee)?;
		tracing::debug!(operations = operations.len(), fee, "Requesting signing payloads");

		let request = PayloadsRequest {
			operations,
			metadata,
		};
		let payloads = self.construction.payloads(chain, &request).await?;
		let signatures = payloads
			.payloads
			.iter()
			.map(|payload| self.sign_construction_payload(chain, payload, &selected))
			.collect::<Result<Vec<_>, ConstructionError>>()?;

		let request = CombineRequest {
			unsigned_transaction: payloads.unsigned_transaction,
			signatures,
		};
		let combined = self.construction.combine(chain, &request).await?;
		tracing::debug!(signatures = request.signatures.len(), "Combined transaction");
		Ok(Prepared::Signed(combined.signed_transaction))
	}

	/// Discovered candidates are selected to cover `required`; explicit
	/// inputs are all spent.
	fn cardano_inputs<'k>(
		&self,
		source: &UtxoSource,
		candidates: &[Candidate<'k>],
		required: u64,
	) -> Result<SelectedInputSet<'k>, ConstructionError> {
		match source {
			UtxoSource::Addresses(_) => {
				self.selector.select_value(candidates, &TokenId::native(), required)
			},
			UtxoSource::Inputs(_) => {
				let mut selected = SelectedInputSet::new();
				for candidate in candidates {
					selected.push(candidate.clone());
				}
				Ok(selected)
			},
		}
	}

	fn sign_construction_payload(
		&self,
		chain: ChainRef,
		payload: &SigningPayload,
		selected: &SelectedInputSet<'_>,
	) -> Result<ConstructionSignature, ConstructionError> {
		let address = &payload.account_identifier.address;
		let key: &SecretString = selected
			.iter()
			.find(|c| c.output.address == *address)
			.map(|c| c.key)
			.ok_or_else(|| SigningError::OwnershipMismatch(address.clone()))?;

		let detached = self
			.signer
			.sign_payload(chain.protocol, &payload.hex_bytes, key)?;
		Ok(ConstructionSignature {
			signing_payload: payload.clone(),
			public_key: PublicKey {
				hex_bytes: detached.public_key,
				curve_type: cardano::CURVE_TYPE.to_string(),
			},
			signature_type: payload
				.signature_type
				.clone()
				.unwrap_or_else(|| cardano::SIGNATURE_TYPE.to_string()),
			hex_bytes: detached.signature,
		})
	}
}
