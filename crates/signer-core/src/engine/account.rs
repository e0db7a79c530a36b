//! Account-chain flow: nonce and gas quote, then a single-key signature.

use super::{Prepared, TransactionCrafter};
use crate::builders::account::{EvmCall, GasParams, TransferRoute};
use crate::ConstructionError;
use signer_chain::ChainError;
use signer_types::{
	ChainRef, ChainState, ContractCallIntent, ContractDeployIntent, FeeOverride, FeeQuoteRequest,
	KeyRing, OperationKind, Signer, TransferIntent, UnsignedTransaction,
};

const RELAY_METHOD: &str = "sendMessage(address,string)";
const TOKEN_TRANSFER_METHOD: &str = "transfer(address,uint256)";

/// Quote request for a transfer along `route`.
pub(super) fn transfer_request(
	transfer: &TransferIntent,
	route: &TransferRoute,
) -> FeeQuoteRequest {
	let base = FeeQuoteRequest {
		kind: Some(OperationKind::Transfer),
		to: Some(transfer.to.clone()),
		amount: Some(transfer.amount.to_string()),
		fee_currency: transfer.fee_currency.clone(),
		..Default::default()
	};

	match route {
		TransferRoute::Native => base,
		TransferRoute::Relay { contract } => FeeQuoteRequest {
			contract_address: Some(contract.to_checksum(None)),
			method: Some(RELAY_METHOD.to_string()),
			params: Some(vec![
				transfer.to.clone(),
				transfer.memo.clone().unwrap_or_default(),
			]),
			..base
		},
		TransferRoute::Token { contract, .. } => FeeQuoteRequest {
			contract_address: Some(contract.to_checksum(None)),
			method: Some(TOKEN_TRANSFER_METHOD.to_string()),
			params: Some(vec![transfer.to.clone(), transfer.amount.to_string()]),
			token_type: transfer.currency.clone(),
			..base
		},
	}
}

pub(super) fn contract_call_request(call: &ContractCallIntent) -> FeeQuoteRequest {
	FeeQuoteRequest {
		kind: Some(OperationKind::ContractCall),
		to: Some(call.contract_address.clone()),
		amount: call.amount.map(|a| a.to_string()),
		contract_address: Some(call.contract_address.clone()),
		contract_abi: call.contract_abi.clone(),
		method: Some(call.method.clone()),
		params: Some(call.params.clone()),
		..Default::default()
	}
}

pub(super) fn deploy_request(deploy: &ContractDeployIntent) -> FeeQuoteRequest {
	FeeQuoteRequest {
		kind: Some(OperationKind::ContractDeploy),
		contract_name: deploy.contract_name.clone(),
		source: Some(deploy.bytecode.clone()),
		..Default::default()
	}
}

impl TransactionCrafter {
	/// Reads the nonce and resolves the gas quote concurrently, then fills
	/// them into `call`.
	pub(super) async fn account<'k>(
		&self,
		chain: ChainRef,
		source: &'k Signer,
		call: EvmCall,
		mut request: FeeQuoteRequest,
		fee: FeeOverride,
	) -> Result<Prepared<'k>, ConstructionError> {
		let address = self.source_address(chain.protocol, source)?;
		request.from = Some(address.clone());

		let (state, quote) = tokio::try_join!(
			self.state.account(chain, &address),
			self.fees.resolve(chain, &request, fee),
		)?;
		let ChainState::Account { nonce } = state else {
			return Err(ChainError::Decode(format!("No account state for {}", address)).into());
		};
		let gas = GasParams::from_quote(quote, chain.protocol, chain.testnet)?;

		tracing::debug!(
			nonce,
			chain_id = gas.chain_id,
			gas_limit = gas.gas_limit,
			"Built account transaction"
		);
		Ok(Prepared::Unsigned {
			tx: UnsignedTransaction::Evm(call.build(nonce, gas)),
			keys: KeyRing::single(&source.private_key),
		})
	}
}
