//! Per-source view construction.
//!
//! Turns the answers of one [`SourceInterface`] into a single [`TxView`].
//! Queries run in a fixed order; chain id, head block and block timestamp
//! failures only blank their own fields, while transaction and receipt
//! failures end the view with an error kind.

use alloy_primitives::U256;
use tracing::instrument;
use txfee_source::{SourceError, SourceInterface};
use txfee_types::{
	truncate_hash, ErrorKind, GasPriceSource, RawReceiptData, RawTxData, TransactionHash,
	TxDetails, TxView,
};

/// Order in which gas price candidates are tried.
pub const GAS_PRICE_PREFERENCE: [GasPriceSource; 2] =
	[GasPriceSource::Effective, GasPriceSource::Declared];

/// Classifies a source failure for the view.
pub fn error_kind(error: &SourceError) -> ErrorKind {
	match error {
		SourceError::NotFound => ErrorKind::TransactionNotFound,
		SourceError::Pending => ErrorKind::Pending,
		SourceError::Connection(_) => ErrorKind::ConnectionFailure,
		SourceError::Timeout(_)
		| SourceError::Network(_)
		| SourceError::Malformed(_)
		| SourceError::Configuration(_) => ErrorKind::SourceError,
	}
}

/// Picks the gas price following [`GAS_PRICE_PREFERENCE`].
pub fn resolve_gas_price(
	receipt: &RawReceiptData,
	tx: &RawTxData,
) -> Option<(U256, GasPriceSource)> {
	GAS_PRICE_PREFERENCE.iter().find_map(|source| {
		let candidate = match source {
			GasPriceSource::Effective => receipt.effective_gas_price_wei,
			GasPriceSource::Declared => tx.gas_price_wei,
		};
		candidate.map(|price| (price, *source))
	})
}

/// Exact fee in wei; `None` unless both operands are known and the product
/// fits in 256 bits.
pub fn total_fee(gas_used: Option<u64>, gas_price_wei: Option<U256>) -> Option<U256> {
	U256::from(gas_used?).checked_mul(gas_price_wei?)
}

/// Confirmations counting the inclusion block as the first, clamped at zero
/// when the head read is older than the inclusion block.
pub fn confirmations(latest_block: Option<u64>, block_number: Option<u64>) -> Option<u64> {
	Some(latest_block?.saturating_add(1).saturating_sub(block_number?))
}

/// Builds [`TxView`]s for one labelled source.
pub struct FeeViewBuilder<'a> {
	label: &'a str,
	source: &'a dyn SourceInterface,
}

impl<'a> FeeViewBuilder<'a> {
	pub fn new(label: &'a str, source: &'a dyn SourceInterface) -> Self {
		Self { label, source }
	}

	fn failed(&self, error: &SourceError) -> TxView {
		TxView::failed(
			self.label,
			Some(self.source.endpoint()),
			error_kind(error),
			error.to_string(),
		)
	}

	/// Queries the source and produces exactly one view for `hash`.
	#[instrument(skip_all, fields(source = %self.label, tx_hash = %truncate_hash(&hash.to_string())))]
	pub async fn build(&self, hash: &TransactionHash) -> TxView {
		let chain_id = match self.source.get_chain_id().await {
			Ok(id) => Some(id),
			Err(e) => {
				tracing::debug!(error = %e, "Chain id unavailable");
				None
			},
		};

		let latest_block = match self.source.get_latest_block_number().await {
			Ok(block) => Some(block),
			Err(e) => {
				tracing::debug!(error = %e, "Latest block unavailable");
				None
			},
		};

		let tx = match self.source.get_transaction(hash).await {
			Ok(tx) => tx,
			Err(e) => {
				tracing::info!(error = %e, "Transaction lookup failed");
				return self.failed(&e);
			},
		};

		let receipt = match self.source.get_transaction_receipt(hash).await {
			Ok(receipt) => receipt,
			// The transaction exists, so a missing receipt means unmined.
			Err(SourceError::NotFound) => return self.failed(&SourceError::Pending),
			Err(e) => {
				tracing::info!(error = %e, "Receipt lookup failed");
				return self.failed(&e);
			},
		};

		let gas_price = resolve_gas_price(&receipt, &tx);
		let gas_price_wei = gas_price.map(|(price, _)| price);
		let block_number = receipt.block_number.or(tx.block_number);

		let total_fee_wei = total_fee(receipt.gas_used, gas_price_wei);
		if let (None, Some(gas_used), Some(price)) = (total_fee_wei, receipt.gas_used, gas_price_wei) {
			return self.failed(&SourceError::Malformed(format!(
				"fee of {} gas at {} wei per gas overflows 256 bits",
				gas_used, price
			)));
		}

		let block_timestamp = match block_number {
			Some(number) => match self.source.get_block(number).await {
				Ok(block) => Some(block.timestamp),
				Err(e) => {
					tracing::debug!(error = %e, block = number, "Block timestamp unavailable");
					None
				},
			},
			None => None,
		};

		let view = TxView {
			source_label: self.label.to_string(),
			endpoint: Some(self.source.endpoint()),
			ok: true,
			error_kind: None,
			error_message: None,
			chain_id,
			block_number,
			status: receipt.status,
			gas_used: receipt.gas_used,
			gas_price_wei,
			gas_price_source: gas_price.map(|(_, source)| source),
			total_fee_wei,
			confirmations: confirmations(latest_block, block_number),
			details: TxDetails {
				from: tx.from,
				to: tx.to,
				contract_address: receipt.contract_address,
				nonce: tx.nonce,
				gas_limit: tx.gas_limit,
				tx_type: tx.tx_type,
				value_wei: tx.value_wei,
				block_timestamp,
			},
		};

		tracing::debug!(
			block = ?view.block_number,
			confirmations = ?view.confirmations,
			"Built view"
		);
		view
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_fixtures::{hash, legacy_tx, mined_receipt};
	use std::time::Duration;
	use txfee_source::implementations::mock::{MockOperation, MockSource};
	use txfee_types::RawBlockData;

	#[test]
	fn test_gas_price_prefers_effective() {
		let tx = RawTxData {
			gas_price_wei: Some(U256::from(30u64)),
			..Default::default()
		};
		let receipt = RawReceiptData {
			effective_gas_price_wei: Some(U256::from(25u64)),
			..Default::default()
		};
		assert_eq!(
			resolve_gas_price(&receipt, &tx),
			Some((U256::from(25u64), GasPriceSource::Effective))
		);

		let receipt = RawReceiptData::default();
		assert_eq!(
			resolve_gas_price(&receipt, &tx),
			Some((U256::from(30u64), GasPriceSource::Declared))
		);
		assert_eq!(resolve_gas_price(&receipt, &RawTxData::default()), None);
	}

	#[test]
	fn test_total_fee_requires_both_operands() {
		assert_eq!(
			total_fee(Some(21_000), Some(U256::from(20_000_000_000u64))),
			Some(U256::from(420_000_000_000_000u64))
		);
		assert_eq!(total_fee(None, Some(U256::from(1u64))), None);
		assert_eq!(total_fee(Some(21_000), None), None);
		// Exact beyond f64 precision.
		let price = U256::from(123_456_789_123_456_789u64);
		assert_eq!(
			total_fee(Some(987_654_321), Some(price)),
			Some(U256::from(987_654_321u64) * price)
		);
		assert_eq!(total_fee(Some(2), Some(U256::MAX)), None);
	}

	#[test]
	fn test_confirmations_are_clamped() {
		assert_eq!(confirmations(Some(100), Some(100)), Some(1));
		assert_eq!(confirmations(Some(102), Some(100)), Some(3));
		assert_eq!(confirmations(Some(90), Some(100)), Some(0));
		assert_eq!(confirmations(Some(99), Some(100)), Some(0));
		assert_eq!(confirmations(None, Some(100)), None);
		assert_eq!(confirmations(Some(100), None), None);
	}

	#[tokio::test]
	async fn test_mined_legacy_transaction() {
		let h = hash("aa");
		let source = MockSource::new()
			.with_latest_block(104)
			.with_mined(h, legacy_tx(20_000_000_000), mined_receipt(100, 1, 21_000, None))
			.with_block(RawBlockData {
				number: 100,
				timestamp: 1_700_000_000,
			});

		let view = FeeViewBuilder::new("rpc-1", &source).build(&h).await;
		assert!(view.ok);
		assert_eq!(view.error_kind, None);
		assert_eq!(view.chain_id, Some(1));
		assert_eq!(view.block_number, Some(100));
		assert_eq!(view.status, Some(1));
		assert_eq!(view.gas_used, Some(21_000));
		assert_eq!(view.gas_price_wei, Some(U256::from(20_000_000_000u64)));
		assert_eq!(view.gas_price_source, Some(GasPriceSource::Declared));
		assert_eq!(view.total_fee_wei, Some(U256::from(420_000_000_000_000u64)));
		assert_eq!(view.confirmations, Some(5));
		assert_eq!(view.details.block_timestamp, Some(1_700_000_000));
		assert_eq!(view.details.value_wei, Some(U256::ZERO));
	}

	#[tokio::test]
	async fn test_reverted_transaction_still_pays() {
		let h = hash("ab");
		let source = MockSource::new().with_latest_block(10).with_mined(
			h,
			legacy_tx(1_000_000_000),
			mined_receipt(10, 0, 50_000, Some(2_000_000_000)),
		);

		let view = FeeViewBuilder::new("rpc", &source).build(&h).await;
		assert!(view.ok);
		assert_eq!(view.status, Some(0));
		assert_eq!(view.gas_price_source, Some(GasPriceSource::Effective));
		assert_eq!(view.total_fee_wei, Some(U256::from(100_000_000_000_000u64)));
		// Missing block is not fatal.
		assert_eq!(view.details.block_timestamp, None);
	}

	#[tokio::test]
	async fn test_overflowing_fee_is_malformed() {
		let h = hash("ae");
		let receipt = RawReceiptData {
			effective_gas_price_wei: Some(U256::MAX),
			..mined_receipt(10, 1, 21_000, None)
		};
		let source = MockSource::new()
			.with_latest_block(10)
			.with_mined(h, legacy_tx(1), receipt);

		let view = FeeViewBuilder::new("rpc", &source).build(&h).await;
		assert!(!view.ok);
		assert_eq!(view.error_kind, Some(ErrorKind::SourceError));
		assert!(view.total_fee_wei.is_none());
		assert!(view
			.error_message
			.as_deref()
			.is_some_and(|m| m.contains("overflows 256 bits")));
	}

	#[tokio::test]
	async fn test_not_found_pending_and_errors() {
		let h = hash("ac");

		let empty = MockSource::new();
		let view = FeeViewBuilder::new("a", &empty).build(&h).await;
		assert!(!view.ok);
		assert_eq!(view.error_kind, Some(ErrorKind::TransactionNotFound));

		let pending = MockSource::new().with_transaction(h, legacy_tx(1));
		let view = FeeViewBuilder::new("b", &pending).build(&h).await;
		assert_eq!(view.error_kind, Some(ErrorKind::Pending));
		assert!(view.total_fee_wei.is_none());
		assert!(view.chain_id.is_none());

		let timeout = MockSource::new()
			.with_transaction(h, legacy_tx(1))
			.failing(MockOperation::Receipt, SourceError::Timeout(Duration::from_secs(15)));
		let view = FeeViewBuilder::new("c", &timeout).build(&h).await;
		assert_eq!(view.error_kind, Some(ErrorKind::SourceError));
		assert!(view
			.error_message
			.as_deref()
			.is_some_and(|m| m.contains("timed out")));

		let down = MockSource::new().with_endpoint("mock://down").unreachable();
		let view = FeeViewBuilder::new("d", &down).build(&h).await;
		assert_eq!(view.error_kind, Some(ErrorKind::ConnectionFailure));
		assert_eq!(view.endpoint.as_deref(), Some("mock://down"));
	}

	#[tokio::test]
	async fn test_metadata_failures_are_not_fatal() {
		let h = hash("ad");
		let source = MockSource::new()
			.with_mined(h, legacy_tx(10), mined_receipt(7, 1, 21_000, None))
			.failing(MockOperation::ChainId, SourceError::Network("boom".into()))
			.failing(MockOperation::LatestBlock, SourceError::Malformed("bad".into()));

		let view = FeeViewBuilder::new("rpc", &source).build(&h).await;
		assert!(view.ok);
		assert_eq!(view.chain_id, None);
		assert_eq!(view.confirmations, None);
		assert_eq!(view.total_fee_wei, Some(U256::from(210_000u64)));
	}

	#[tokio::test]
	async fn test_stale_head_reports_zero_confirmations() {
		let h = hash("ae");
		let source = MockSource::new()
			.with_latest_block(95)
			.with_mined(h, legacy_tx(10), mined_receipt(100, 1, 21_000, None));

		let view = FeeViewBuilder::new("rpc", &source).build(&h).await;
		assert_eq!(view.confirmations, Some(0));
	}
}
