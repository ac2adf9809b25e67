//! The canonical per-source transaction snapshot.

use crate::utils::serde_wei;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of why a view could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
	/// The identifier failed canonicalization.
	InvalidHash,
	/// The source could not be reached at all.
	ConnectionFailure,
	/// The source has no knowledge of the hash.
	TransactionNotFound,
	/// The transaction is known but has not been mined.
	Pending,
	/// Any other transient failure: timeout, malformed response, rate limit.
	SourceError,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::InvalidHash => "invalid-hash",
			ErrorKind::ConnectionFailure => "connection-failure",
			ErrorKind::TransactionNotFound => "transaction-not-found",
			ErrorKind::Pending => "pending",
			ErrorKind::SourceError => "source-error",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where the gas price of a view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasPriceSource {
	/// The receipt's `effectiveGasPrice`.
	Effective,
	/// The transaction's declared `gasPrice`.
	Declared,
}

/// Informational transaction details. Never reconciled across sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDetails {
	pub from: Option<Address>,
	pub to: Option<Address>,
	pub contract_address: Option<Address>,
	pub nonce: Option<u64>,
	pub gas_limit: Option<u64>,
	pub tx_type: Option<u8>,
	#[serde(default, with = "serde_wei::option")]
	pub value_wei: Option<U256>,
	/// Unix seconds of the inclusion block.
	pub block_timestamp: Option<u64>,
}

/// Snapshot of one transaction as seen by one source.
///
/// Built once per (source, hash) query by the fee view builder. When `ok` is
/// false every numeric field is `None` and `error_kind` is set. When present,
/// `total_fee_wei` always equals `gas_used * gas_price_wei` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxView {
	pub source_label: String,
	/// Redacted description of the endpoint behind the source.
	pub endpoint: Option<String>,
	pub ok: bool,
	pub error_kind: Option<ErrorKind>,
	pub error_message: Option<String>,
	pub chain_id: Option<u64>,
	pub block_number: Option<u64>,
	pub status: Option<u8>,
	pub gas_used: Option<u64>,
	#[serde(default, with = "serde_wei::option")]
	pub gas_price_wei: Option<U256>,
	pub gas_price_source: Option<GasPriceSource>,
	#[serde(default, with = "serde_wei::option")]
	pub total_fee_wei: Option<U256>,
	pub confirmations: Option<u64>,
	#[serde(default)]
	pub details: TxDetails,
}

impl TxView {
	/// Creates a failed view carrying only the label and the error.
	pub fn failed(
		source_label: impl Into<String>,
		endpoint: Option<String>,
		kind: ErrorKind,
		message: impl Into<String>,
	) -> Self {
		Self {
			source_label: source_label.into(),
			endpoint,
			ok: false,
			error_kind: Some(kind),
			error_message: Some(message.into()),
			chain_id: None,
			block_number: None,
			status: None,
			gas_used: None,
			gas_price_wei: None,
			gas_price_source: None,
			total_fee_wei: None,
			confirmations: None,
			details: TxDetails::default(),
		}
	}

	/// Whether the failure is the non-fatal "known but unmined" case.
	pub fn is_pending(&self) -> bool {
		self.error_kind == Some(ErrorKind::Pending)
	}

	/// Whether the transaction executed successfully on-chain.
	///
	/// `None` when the view is not ok or the source omitted the status.
	pub fn succeeded(&self) -> Option<bool> {
		self.status.map(|s| s == 1)
	}
}
