//! Account-chain (EVM) transactions.
//!
//! Destination, value and calldata are resolved from the intent and the
//! configuration before any remote call; nonce and gas are filled in once
//! chain state and the fee quote are known.

use crate::ConstructionError;
use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use rust_decimal::Decimal;
use signer_chain::ChainError;
use signer_config::Config;
use signer_types::{
	to_base_units, without_0x_prefix, ContractCallIntent, ContractDeployIntent, EvmTransaction,
	FeeQuote, Protocol, TransferIntent,
};

sol! {
	function transfer(address to, uint256 amount) external returns (bool);
	function sendMessage(address recipient, string message) external;
}

/// Decimals assumed for a token contract when the intent does not state them.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// How an account-chain transfer reaches its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRoute {
	/// Plain value transfer.
	Native,
	/// Native value sent through the message relay contract with the memo.
	Relay { contract: Address },
	/// Token `transfer` call on a contract.
	Token { contract: Address, decimals: u32 },
}

impl TransferRoute {
	pub fn resolve(
		protocol: Protocol,
		transfer: &TransferIntent,
		config: &Config,
	) -> Result<Self, ConstructionError> {
		if let Some(contract) = &transfer.contract_address {
			return Ok(TransferRoute::Token {
				contract: parse_address(contract, "contractAddress")?,
				decimals: transfer.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
			});
		}

		match transfer.currency.as_deref() {
			Some(symbol) if !protocol.is_native_symbol(symbol) => {
				let token = config.token(protocol, symbol).ok_or_else(|| {
					ConstructionError::Validation(format!(
						"Unknown token {} on {}",
						symbol, protocol
					))
				})?;
				Ok(TransferRoute::Token {
					contract: parse_address(&token.address, "token address")?,
					decimals: token.decimals,
				})
			},
			_ if transfer.memo.is_some() => {
				let relay = config.relay_contract(protocol).ok_or_else(|| {
					ConstructionError::Validation(format!(
						"No message relay contract configured for {}",
						protocol
					))
				})?;
				Ok(TransferRoute::Relay {
					contract: parse_address(relay, "relay contract")?,
				})
			},
			_ => Ok(TransferRoute::Native),
		}
	}
}

/// Gas parameters of a legacy transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
	pub chain_id: u64,
	pub gas_limit: u64,
	pub gas_price: u128,
}

impl GasParams {
	/// Takes the chain id from the quote, falling back to the protocol's
	/// default for the network.
	pub fn from_quote(
		quote: FeeQuote,
		protocol: Protocol,
		testnet: bool,
	) -> Result<Self, ConstructionError> {
		let FeeQuote::Gas {
			gas_limit,
			gas_price,
			chain_id,
		} = quote
		else {
			return Err(
				ChainError::Decode(format!("{} requires a gas fee quote", protocol)).into(),
			);
		};
		let chain_id = chain_id
			.or_else(|| protocol.default_chain_id(testnet))
			.ok_or_else(|| {
				ConstructionError::Validation(format!("No chain id known for {}", protocol))
			})?;
		Ok(Self {
			chain_id,
			gas_limit,
			gas_price,
		})
	}
}

/// Destination, value and calldata of an account-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCall {
	/// `None` deploys a contract.
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
}

impl EvmCall {
	pub fn transfer(
		route: &TransferRoute,
		transfer: &TransferIntent,
	) -> Result<Self, ConstructionError> {
		let recipient = parse_address(&transfer.to, "to")?;
		Ok(match route {
			TransferRoute::Native => Self {
				to: Some(recipient),
				value: native_value(transfer.amount)?,
				data: Bytes::new(),
			},
			TransferRoute::Relay { contract } => {
				let call = sendMessageCall {
					recipient,
					message: transfer.memo.clone().unwrap_or_default(),
				};
				Self {
					to: Some(*contract),
					value: native_value(transfer.amount)?,
					data: call.abi_encode().into(),
				}
			},
			TransferRoute::Token { contract, decimals } => {
				let call = transferCall {
					to: recipient,
					amount: U256::from(to_base_units(transfer.amount, *decimals)?),
				};
				Self {
					to: Some(*contract),
					value: U256::ZERO,
					data: call.abi_encode().into(),
				}
			},
		})
	}

	pub fn contract_call(call: &ContractCallIntent) -> Result<Self, ConstructionError> {
		let function = resolve_function(call)?;
		if function.inputs.len() != call.params.len() {
			return Err(ConstructionError::Validation(format!(
				"{} takes {} parameters, got {}",
				function.name,
				function.inputs.len(),
				call.params.len()
			)));
		}

		let values = function
			.inputs
			.iter()
			.zip(&call.params)
			.map(|(param, raw)| {
				let ty: DynSolType = param.resolve().map_err(|e| {
					ConstructionError::Validation(format!("Unsupported parameter type: {}", e))
				})?;
				ty.coerce_str(raw).map_err(|e| {
					ConstructionError::Validation(format!(
						"Invalid {} value for parameter '{}': {}",
						ty, param.name, e
					))
				})
			})
			.collect::<Result<Vec<DynSolValue>, _>>()?;
		let data = function
			.abi_encode_input(&values)
			.map_err(|e| ConstructionError::Validation(format!("Failed to encode call: {}", e)))?;

		Ok(Self {
			to: Some(parse_address(&call.contract_address, "contractAddress")?),
			value: call.amount.map(native_value).transpose()?.unwrap_or(U256::ZERO),
			data: data.into(),
		})
	}

	/// Creation transaction carrying the bytecode followed by the encoded
	/// constructor arguments.
	pub fn deploy(deploy: &ContractDeployIntent) -> Result<Self, ConstructionError> {
		let mut code = decode_hex(&deploy.bytecode, "bytecode")?;
		if let Some(args) = &deploy.constructor_args {
			code.extend(decode_hex(args, "constructorArgs")?);
		}
		Ok(Self {
			to: None,
			value: U256::ZERO,
			data: code.into(),
		})
	}

	pub fn build(&self, nonce: u64, gas: GasParams) -> EvmTransaction {
		EvmTransaction {
			chain_id: gas.chain_id,
			nonce,
			gas_price: gas.gas_price,
			gas_limit: gas.gas_limit,
			to: self.to,
			value: self.value,
			data: self.data.clone(),
		}
	}
}

/// Finds the called function, either in the supplied ABI by name and arity
/// or by parsing `method` as a signature.
fn resolve_function(call: &ContractCallIntent) -> Result<Function, ConstructionError> {
	let Some(abi) = &call.contract_abi else {
		return Function::parse(&call.method).map_err(|e| {
			ConstructionError::Validation(format!("Invalid method '{}': {}", call.method, e))
		});
	};

	let abi: JsonAbi = serde_json::from_value(abi.clone())
		.map_err(|e| ConstructionError::Validation(format!("Invalid contract ABI: {}", e)))?;
	let name = call.method.split('(').next().unwrap_or_default().trim();
	abi.function(name)
		.and_then(|overloads| {
			overloads
				.iter()
				.find(|f| f.inputs.len() == call.params.len())
		})
		.cloned()
		.ok_or_else(|| {
			ConstructionError::Validation(format!(
				"Function {} with {} parameters not found in ABI",
				name,
				call.params.len()
			))
		})
}

fn native_value(amount: Decimal) -> Result<U256, ConstructionError> {
	Ok(U256::from(to_base_units(amount, Protocol::Ethereum.decimals())?))
}

fn parse_address(value: &str, field: &str) -> Result<Address, ConstructionError> {
	value
		.parse()
		.map_err(|e| ConstructionError::Validation(format!("Invalid {} '{}': {}", field, value, e)))
}

fn decode_hex(value: &str, field: &str) -> Result<Vec<u8>, ConstructionError> {
	hex::decode(without_0x_prefix(value))
		.map_err(|e| ConstructionError::Validation(format!("{} is not valid hex: {}", field, e)))
}
