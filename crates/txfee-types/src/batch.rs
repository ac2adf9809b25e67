//! Batch policy configuration and per-hash outcomes.

use crate::utils::serde_wei;
use crate::{RejectedHash, TransactionHash, TxView};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Threshold policy applied to every row of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPolicy {
	/// Minimum confirmations each transaction must have.
	pub min_confirmations: u64,
	/// Maximum acceptable total fee, in wei.
	#[serde(default, with = "serde_wei::option")]
	pub max_fee_wei: Option<U256>,
	/// Treat pending transactions as run errors instead of informational rows.
	#[serde(default)]
	pub fail_on_pending: bool,
}

/// Outcome of one hash in a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPolicyResult {
	pub tx_hash: TransactionHash,
	pub view: TxView,
	/// Always false when the view is not ok.
	pub confirmations_satisfied: bool,
	/// Set when the view is ok but the confirmation count is unknown.
	pub confirmations_unknown: bool,
	/// Always false when the view is not ok.
	pub fee_violation: bool,
}

impl BatchPolicyResult {
	/// Whether this row makes the overall run fail under `policy`.
	pub fn is_failure(&self, policy: &BatchPolicy) -> bool {
		if !self.view.ok {
			return !self.view.is_pending() || policy.fail_on_pending;
		}
		!self.confirmations_satisfied || self.fee_violation
	}
}

/// All rows of a batch run plus the inputs that never reached a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
	pub policy: BatchPolicy,
	pub rejected: Vec<RejectedHash>,
	pub results: Vec<BatchPolicyResult>,
}

impl BatchReport {
	/// The run fails if any input was invalid or any row failed its policy.
	pub fn is_failure(&self) -> bool {
		!self.rejected.is_empty() || self.results.iter().any(|r| r.is_failure(&self.policy))
	}

	pub fn failure_count(&self) -> usize {
		self.rejected.len()
			+ self
				.results
				.iter()
				.filter(|r| r.is_failure(&self.policy))
				.count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ErrorKind;

	fn hash() -> TransactionHash {
		TransactionHash::normalize(&"11".repeat(32)).unwrap()
	}

	fn ok_view() -> TxView {
		let mut view = TxView::failed("rpc", None, ErrorKind::SourceError, "");
		view.ok = true;
		view.error_kind = None;
		view.error_message = None;
		view
	}

	fn row(view: TxView, satisfied: bool, violation: bool) -> BatchPolicyResult {
		BatchPolicyResult {
			tx_hash: hash(),
			view,
			confirmations_satisfied: satisfied,
			confirmations_unknown: false,
			fee_violation: violation,
		}
	}

	#[test]
	fn test_pending_is_informational_by_default() {
		let pending = TxView::failed("rpc", None, ErrorKind::Pending, "no receipt");
		let policy = BatchPolicy::default();
		assert!(!row(pending.clone(), false, false).is_failure(&policy));

		let strict = BatchPolicy {
			fail_on_pending: true,
			..Default::default()
		};
		assert!(row(pending, false, false).is_failure(&strict));
	}

	#[test]
	fn test_report_failure_rules() {
		let policy = BatchPolicy::default();
		let report = BatchReport {
			policy: policy.clone(),
			rejected: vec![],
			results: vec![row(ok_view(), true, false)],
		};
		assert!(!report.is_failure());

		let report = BatchReport {
			policy: policy.clone(),
			rejected: vec![],
			results: vec![row(ok_view(), true, false), row(ok_view(), false, false)],
		};
		assert!(report.is_failure());
		assert_eq!(report.failure_count(), 1);

		let not_found = TxView::failed("rpc", None, ErrorKind::TransactionNotFound, "");
		let report = BatchReport {
			policy,
			rejected: vec![RejectedHash::new(
				"0x12",
				&crate::HashError::InvalidLength {
					input: "0x12".into(),
					found: 2,
				},
			)],
			results: vec![row(not_found, false, false)],
		};
		assert_eq!(report.failure_count(), 2);
	}
}
