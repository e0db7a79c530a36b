//! Ledger-sequence flow for Stellar and XRP.

use super::{Prepared, TransactionCrafter};
use crate::builders::ledger::{self, LedgerContext};
use crate::ConstructionError;
use signer_chain::ChainError;
use signer_types::{
	ChainRef, ChainState, ContractDeployIntent, FeeOverride, FeeQuoteRequest, KeyRing,
	OperationKind, Protocol, Signer, TransferIntent, TrustlineIntent, UnsignedTransaction,
};

/// Sequence, ledger index and fee read for one source account.
struct LedgerState {
	address: String,
	sequence: u64,
	ledger_index: u64,
	fee: u64,
}

impl LedgerState {
	fn context(&self) -> LedgerContext<'_> {
		LedgerContext {
			source: &self.address,
			sequence: self.sequence,
			ledger_index: self.ledger_index,
			fee: self.fee,
		}
	}
}

impl TransactionCrafter {
	pub(super) async fn ledger_transfer<'k>(
		&self,
		chain: ChainRef,
		transfer: &'k TransferIntent,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let request = FeeQuoteRequest {
			kind: Some(OperationKind::Transfer),
			to: Some(transfer.to.clone()),
			amount: Some(transfer.amount.to_string()),
			token_type: transfer.currency.clone(),
			fee_currency: transfer.fee_currency.clone(),
			..Default::default()
		};
		let state = self.ledger_state(chain, &transfer.source, request, fee).await?;

		let tx = match chain.protocol {
			Protocol::Stellar => {
				UnsignedTransaction::Stellar(ledger::stellar_payment(&state.context(), transfer)?)
			},
			_ => UnsignedTransaction::Xrp(ledger::xrp_payment(&state.context(), transfer)?),
		};
		Ok(single_key(tx, &transfer.source))
	}

	pub(super) async fn ledger_trustline<'k>(
		&self,
		chain: ChainRef,
		trustline: &'k TrustlineIntent,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let request = FeeQuoteRequest {
			kind: Some(OperationKind::Trustline),
			token_type: Some(trustline.currency.clone()),
			to: Some(trustline.issuer.clone()),
			..Default::default()
		};
		let state = self.ledger_state(chain, &trustline.source, request, fee).await?;

		let tx = match chain.protocol {
			Protocol::Stellar => UnsignedTransaction::Stellar(ledger::stellar_trustline(
				&state.context(),
				trustline,
			)?),
			_ => UnsignedTransaction::Xrp(ledger::xrp_trustline(&state.context(), trustline)),
		};
		Ok(single_key(tx, &trustline.source))
	}

	pub(super) async fn stellar_deploy<'k>(
		&self,
		chain: ChainRef,
		deploy: &'k ContractDeployIntent,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let request = FeeQuoteRequest {
			kind: Some(OperationKind::ContractDeploy),
			contract_name: deploy.contract_name.clone(),
			..Default::default()
		};
		let state = self.ledger_state(chain, &deploy.source, request, fee).await?;

		let tx = ledger::stellar_upload(&state.context(), deploy)?;
		Ok(single_key(UnsignedTransaction::Stellar(tx), &deploy.source))
	}

	/// Reads the account sequence and resolves the flat fee concurrently.
	async fn ledger_state(
		&self,
		chain: ChainRef,
		source: &Signer,
		mut request: FeeQuoteRequest,
		fee: FeeOverride,
	) -> Result<LedgerState, ConstructionError> {
		let address = self.source_address(chain.protocol, source)?;
		request.from = Some(address.clone());

		let (state, quote) = tokio::try_join!(
			self.state.ledger(chain, &address),
			self.fees.resolve(chain, &request, fee),
		)?;
		let ChainState::Ledger {
			sequence,
			ledger_index,
		} = state
		else {
			return Err(ChainError::Decode(format!("No ledger state for {}", address)).into());
		};

		tracing::debug!(sequence, ledger_index, fee = quote.flat_fee(), "Read ledger state");
		Ok(LedgerState {
			address,
			sequence,
			ledger_index,
			fee: quote.flat_fee(),
		})
	}
}

fn single_key<'k>(tx: UnsignedTransaction, source: &'k Signer) -> Prepared<'k> {
	Prepared::Unsigned {
		tx,
		keys: KeyRing::single(&source.private_key),
	}
}
