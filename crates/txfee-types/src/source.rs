//! Raw records returned by data sources.
//!
//! Each source implementation translates its native response shape into these
//! records before the core sees them. Every field is optional because sources
//! routinely omit data (legacy receipts without `effectiveGasPrice`, explorer
//! responses without `type`, contract creations without `to`).

use crate::utils::serde_wei;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Transaction data as declared by the sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxData {
	pub from: Option<Address>,
	/// Recipient; `None` for contract creation.
	pub to: Option<Address>,
	pub nonce: Option<u64>,
	pub gas_limit: Option<u64>,
	/// Declared gas price (legacy and access-list transactions; some nodes
	/// also echo the effective price here for mined EIP-1559 transactions).
	#[serde(default, with = "serde_wei::option")]
	pub gas_price_wei: Option<U256>,
	#[serde(default, with = "serde_wei::option")]
	pub max_fee_per_gas_wei: Option<U256>,
	#[serde(default, with = "serde_wei::option")]
	pub max_priority_fee_per_gas_wei: Option<U256>,
	#[serde(default, with = "serde_wei::option")]
	pub value_wei: Option<U256>,
	/// EIP-2718 transaction type tag (0 legacy, 1 access list, 2 EIP-1559, ...).
	pub tx_type: Option<u8>,
	/// Inclusion block as reported on the transaction object, if mined.
	pub block_number: Option<u64>,
}

/// Receipt data, present only once the transaction has been mined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReceiptData {
	pub block_number: Option<u64>,
	/// 1 for success, 0 for failure (reverted).
	pub status: Option<u8>,
	pub gas_used: Option<u64>,
	/// Price per gas actually charged.
	#[serde(default, with = "serde_wei::option")]
	pub effective_gas_price_wei: Option<U256>,
	pub contract_address: Option<Address>,
	/// Hash echoed back by the source, lowercase `0x` form.
	pub transaction_hash: Option<String>,
}

/// Block header fields used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlockData {
	pub number: u64,
	/// Unix seconds, UTC.
	pub timestamp: u64,
}
