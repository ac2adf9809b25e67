//! Batch evaluation of many hashes against one source.

use crate::fee_view::FeeViewBuilder;
use futures::stream::{self, StreamExt};
use txfee_source::SourceInterface;
use txfee_types::{BatchPolicy, BatchPolicyResult, TransactionHash, TxView};

/// Applies `policy` to one view.
///
/// Checks only apply to `ok` views. Unknown confirmations never violate the
/// minimum; they are flagged instead.
pub fn evaluate(tx_hash: TransactionHash, view: TxView, policy: &BatchPolicy) -> BatchPolicyResult {
	if !view.ok {
		return BatchPolicyResult {
			tx_hash,
			view,
			confirmations_satisfied: false,
			confirmations_unknown: false,
			fee_violation: false,
		};
	}

	let confirmations_unknown = view.confirmations.is_none();
	let confirmations_satisfied = view
		.confirmations
		.is_none_or(|c| c >= policy.min_confirmations);
	let fee_violation = match (policy.max_fee_wei, view.total_fee_wei) {
		(Some(max), Some(fee)) => fee > max,
		_ => false,
	};

	BatchPolicyResult {
		tx_hash,
		view,
		confirmations_satisfied,
		confirmations_unknown,
		fee_violation,
	}
}

/// Runs the view builder over many hashes against a single source.
pub struct BatchRunner<'a> {
	label: &'a str,
	source: &'a dyn SourceInterface,
	policy: &'a BatchPolicy,
	concurrency: usize,
}

impl<'a> BatchRunner<'a> {
	pub fn new(
		label: &'a str,
		source: &'a dyn SourceInterface,
		policy: &'a BatchPolicy,
		concurrency: usize,
	) -> Self {
		Self {
			label,
			source,
			policy,
			concurrency: concurrency.max(1),
		}
	}

	/// Evaluates every hash. Up to `concurrency` hashes are in flight at once;
	/// results are returned in input order.
	pub async fn run(&self, hashes: &[TransactionHash]) -> Vec<BatchPolicyResult> {
		let builder = FeeViewBuilder::new(self.label, self.source);
		let builder = &builder;

		stream::iter(hashes.iter().copied())
			.map(|hash| async move {
				let view = builder.build(&hash).await;
				evaluate(hash, view, self.policy)
			})
			.buffered(self.concurrency)
			.collect()
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_fixtures::{hash, legacy_tx, mined_receipt, ok_view};
	use alloy_primitives::U256;
	use std::time::Duration;
	use txfee_source::implementations::mock::MockSource;
	use txfee_types::{parse_wei_amount, ErrorKind};

	#[test]
	fn test_min_confirmations() {
		let policy = BatchPolicy {
			min_confirmations: 5,
			..Default::default()
		};
		let result = evaluate(hash("01"), ok_view("rpc", 1, 21_000, 1), &policy);
		// ok_view has 3 confirmations
		assert!(!result.confirmations_satisfied);
		assert!(result.is_failure(&policy));

		let mut unknown = ok_view("rpc", 1, 21_000, 1);
		unknown.confirmations = None;
		let result = evaluate(hash("01"), unknown, &policy);
		assert!(result.confirmations_satisfied);
		assert!(result.confirmations_unknown);
		assert!(!result.is_failure(&policy));
	}

	#[test]
	fn test_max_fee() {
		let policy = BatchPolicy {
			max_fee_wei: Some(parse_wei_amount("0.01 ether").unwrap()),
			..Default::default()
		};

		let mut view = ok_view("rpc", 1, 21_000, 1);
		view.total_fee_wei = Some(parse_wei_amount("0.02").unwrap());
		let result = evaluate(hash("02"), view, &policy);
		assert!(result.fee_violation);

		let mut view = ok_view("rpc", 1, 21_000, 1);
		view.total_fee_wei = Some(parse_wei_amount("0.01").unwrap());
		assert!(!evaluate(hash("02"), view, &policy).fee_violation);

		let mut view = ok_view("rpc", 1, 21_000, 1);
		view.total_fee_wei = None;
		assert!(!evaluate(hash("02"), view, &policy).fee_violation);
	}

	#[test]
	fn test_failed_views_skip_checks() {
		let policy = BatchPolicy {
			max_fee_wei: Some(U256::ZERO),
			..Default::default()
		};
		let view = TxView::failed("rpc", None, ErrorKind::TransactionNotFound, "missing");
		let result = evaluate(hash("03"), view, &policy);
		assert!(!result.confirmations_satisfied);
		assert!(!result.fee_violation);
		assert!(result.is_failure(&policy));
	}

	#[tokio::test(start_paused = true)]
	async fn test_run_preserves_input_order() {
		let hashes: Vec<_> = ["0a", "0b", "0c", "0d", "0e"].iter().map(|b| hash(b)).collect();
		let mut source = MockSource::new()
			.with_latest_block(200)
			.with_delay(Duration::from_millis(10));
		for (i, h) in hashes.iter().enumerate().skip(1) {
			source = source.with_mined(
				*h,
				legacy_tx(1_000_000_000),
				mined_receipt(100 + i as u64, 1, 21_000, None),
			);
		}

		let policy = BatchPolicy::default();
		let results = BatchRunner::new("rpc", &source, &policy, 3)
			.run(&hashes)
			.await;

		assert_eq!(results.len(), 5);
		assert_eq!(
			results.iter().map(|r| r.tx_hash).collect::<Vec<_>>(),
			hashes
		);
		assert_eq!(
			results[0].view.error_kind,
			Some(ErrorKind::TransactionNotFound)
		);
		assert_eq!(results[4].view.block_number, Some(104));
		assert_eq!(results[4].view.confirmations, Some(97));
	}
}
