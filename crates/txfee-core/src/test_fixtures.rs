//! Shared builders for unit tests.

use alloy_primitives::{Address, U256};
use txfee_types::{ErrorKind, RawReceiptData, RawTxData, TransactionHash, TxView};

/// A hash made of 32 repetitions of `byte` (two hex digits).
pub fn hash(byte: &str) -> TransactionHash {
	TransactionHash::normalize(&byte.repeat(32)).unwrap()
}

/// A plain value transfer with a declared gas price.
pub fn legacy_tx(gas_price: u64) -> RawTxData {
	RawTxData {
		from: Some(Address::repeat_byte(0x11)),
		to: Some(Address::repeat_byte(0x22)),
		nonce: Some(7),
		gas_limit: Some(21_000),
		gas_price_wei: Some(U256::from(gas_price)),
		value_wei: Some(U256::ZERO),
		tx_type: Some(0),
		..Default::default()
	}
}

pub fn mined_receipt(
	block: u64,
	status: u8,
	gas_used: u64,
	effective_gas_price: Option<u64>,
) -> RawReceiptData {
	RawReceiptData {
		block_number: Some(block),
		status: Some(status),
		gas_used: Some(gas_used),
		effective_gas_price_wei: effective_gas_price.map(U256::from),
		..Default::default()
	}
}

/// A successful view with the compared fields set.
pub fn ok_view(label: &str, chain_id: u64, gas_used: u64, gas_price: u64) -> TxView {
	let mut view = TxView::failed(label, None, ErrorKind::SourceError, "");
	view.ok = true;
	view.error_kind = None;
	view.error_message = None;
	view.chain_id = Some(chain_id);
	view.block_number = Some(100);
	view.status = Some(1);
	view.gas_used = Some(gas_used);
	view.gas_price_wei = Some(U256::from(gas_price));
	view.total_fee_wei = Some(U256::from(gas_used) * U256::from(gas_price));
	view.confirmations = Some(3);
	view
}
