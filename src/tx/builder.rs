//! Unsigned transaction assembly

use super::fee::FeeFields;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, TransactionRequest, U256};

/// A payable call into a contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// Per-attempt chain state the transaction is built against
#[derive(Debug, Clone, Copy)]
pub struct TxParams {
    pub chain_id: u64,
    pub nonce: U256,
    pub from: Address,
    pub fees: FeeFields,
}

/// Build the unsigned transaction for `call`; the gas limit is set later
/// from the estimate.
pub fn build_transaction(call: &ContractCall, params: &TxParams) -> TypedTransaction {
    match params.fees {
        FeeFields::Legacy { gas_price } => TransactionRequest::new()
            .chain_id(params.chain_id)
            .from(params.from)
            .to(call.to)
            .data(call.data.clone())
            .value(call.value)
            .nonce(params.nonce)
            .gas_price(gas_price)
            .into(),
        FeeFields::PriorityFee {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } => Eip1559TransactionRequest::new()
            .chain_id(params.chain_id)
            .from(params.from)
            .to(call.to)
            .data(call.data.clone())
            .value(call.value)
            .nonce(params.nonce)
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(max_priority_fee_per_gas)
            .into(),
    }
}

/// Scale a gas estimate by `percent`, rounding to nearest
pub fn apply_gas_margin(estimate: U256, percent: u64) -> U256 {
    (estimate * U256::from(percent) + U256::from(50u64)) / U256::from(100u64)
}
