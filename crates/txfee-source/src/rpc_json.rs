//! Decoding of Ethereum JSON-RPC result objects.
//!
//! Both the node source and the explorer proxy return the same object shapes
//! for `eth_getTransactionByHash`, `eth_getTransactionReceipt` and
//! `eth_getBlockByNumber`, so decoding lives here. Quantities arrive as
//! `0x` hex strings; some gateways send plain decimal numbers instead, and
//! both are accepted.

use crate::SourceError;
use alloy_primitives::{Address, U256};
use serde_json::Value;
use txfee_types::{utils::without_0x_prefix, RawBlockData, RawReceiptData, RawTxData};

fn malformed(field: &str, value: &Value) -> SourceError {
	SourceError::Malformed(format!("field '{}' has unexpected value {}", field, value))
}

/// Decodes a quantity field as `u64`. Missing and `null` fields yield `None`.
pub fn quantity_u64(object: &Value, field: &str) -> Result<Option<u64>, SourceError> {
	match object.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(v @ Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| malformed(field, v)),
		Some(v @ Value::String(s)) => parse_u64_str(s).map(Some).ok_or_else(|| malformed(field, v)),
		Some(other) => Err(malformed(field, other)),
	}
}

/// Decodes a quantity field as `U256`. Missing and `null` fields yield `None`.
pub fn quantity_u256(object: &Value, field: &str) -> Result<Option<U256>, SourceError> {
	match object.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(v @ Value::Number(n)) => n.as_u64().map(|n| Some(U256::from(n))).ok_or_else(|| malformed(field, v)),
		Some(v @ Value::String(s)) => txfee_types::utils::serde_wei::parse_wei_str(s)
			.map(Some)
			.map_err(|_| malformed(field, v)),
		Some(other) => Err(malformed(field, other)),
	}
}

fn address(object: &Value, field: &str) -> Result<Option<Address>, SourceError> {
	match object.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(v @ Value::String(s)) => s.parse::<Address>().map(Some).map_err(|_| malformed(field, v)),
		Some(other) => Err(malformed(field, other)),
	}
}

/// Parses a bare quantity string such as `0x1b4` or `436`.
pub fn parse_u64_str(s: &str) -> Option<u64> {
	let trimmed = s.trim();
	if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
		u64::from_str_radix(without_0x_prefix(trimmed), 16).ok()
	} else {
		trimmed.parse().ok()
	}
}

/// Decodes a bare quantity result such as the one `eth_chainId` returns.
pub fn decode_quantity(result: &Value, method: &str) -> Result<u64, SourceError> {
	match result {
		Value::String(s) => parse_u64_str(s),
		Value::Number(n) => n.as_u64(),
		_ => None,
	}
	.ok_or_else(|| SourceError::Malformed(format!("{} returned {}", method, result)))
}

fn expect_object<'a>(result: &'a Value, method: &str) -> Result<&'a Value, SourceError> {
	if result.is_object() {
		Ok(result)
	} else {
		Err(SourceError::Malformed(format!(
			"{} returned a non-object result: {}",
			method, result
		)))
	}
}

/// Decodes an `eth_getTransactionByHash` result. `null` means not found.
pub fn decode_transaction(result: &Value) -> Result<RawTxData, SourceError> {
	if result.is_null() {
		return Err(SourceError::NotFound);
	}
	let tx = expect_object(result, "eth_getTransactionByHash")?;

	let tx_type = quantity_u64(tx, "type")?
		.map(|t| u8::try_from(t).map_err(|_| malformed("type", &tx["type"])))
		.transpose()?;

	Ok(RawTxData {
		from: address(tx, "from")?,
		to: address(tx, "to")?,
		nonce: quantity_u64(tx, "nonce")?,
		gas_limit: quantity_u64(tx, "gas")?,
		gas_price_wei: quantity_u256(tx, "gasPrice")?,
		max_fee_per_gas_wei: quantity_u256(tx, "maxFeePerGas")?,
		max_priority_fee_per_gas_wei: quantity_u256(tx, "maxPriorityFeePerGas")?,
		value_wei: quantity_u256(tx, "value")?,
		tx_type,
		block_number: quantity_u64(tx, "blockNumber")?,
	})
}

/// Decodes an `eth_getTransactionReceipt` result.
///
/// `null`, and receipts without a block number (returned by a few nodes for
/// transactions still in the mempool), mean the transaction is pending.
pub fn decode_receipt(result: &Value) -> Result<RawReceiptData, SourceError> {
	if result.is_null() {
		return Err(SourceError::Pending);
	}
	let receipt = expect_object(result, "eth_getTransactionReceipt")?;

	let block_number = quantity_u64(receipt, "blockNumber")?;
	if block_number.is_none() {
		return Err(SourceError::Pending);
	}

	let status = quantity_u64(receipt, "status")?
		.map(|s| match s {
			0 | 1 => Ok(s as u8),
			_ => Err(malformed("status", &receipt["status"])),
		})
		.transpose()?;

	Ok(RawReceiptData {
		block_number,
		status,
		gas_used: quantity_u64(receipt, "gasUsed")?,
		effective_gas_price_wei: quantity_u256(receipt, "effectiveGasPrice")?,
		contract_address: address(receipt, "contractAddress")?,
		transaction_hash: receipt
			.get("transactionHash")
			.and_then(Value::as_str)
			.map(str::to_lowercase),
	})
}

/// Decodes an `eth_getBlockByNumber` result.
pub fn decode_block(result: &Value, requested: u64) -> Result<RawBlockData, SourceError> {
	if result.is_null() {
		return Err(SourceError::Malformed(format!(
			"block {} was not returned",
			requested
		)));
	}
	let block = expect_object(result, "eth_getBlockByNumber")?;

	let number = quantity_u64(block, "number")?.unwrap_or(requested);
	let timestamp = quantity_u64(block, "timestamp")?.ok_or_else(|| {
		SourceError::Malformed(format!("block {} has no timestamp", requested))
	})?;

	Ok(RawBlockData { number, timestamp })
}

/// Formats a block number as a JSON-RPC quantity.
pub fn to_quantity(n: u64) -> String {
	format!("0x{:x}", n)
}
