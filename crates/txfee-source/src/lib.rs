//! Data source abstraction for the transaction fee inspector.
//!
//! A source answers five read-only questions about a chain: its id, its head
//! block, and the transaction, receipt and block for a given hash or number.
//! Each implementation translates its native response shape into the raw
//! records from `txfee_types` so the core never sees transport details.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use txfee_types::{
	ConfigSchema, ImplementationRegistry, RawBlockData, RawReceiptData, RawTxData,
	TransactionHash,
};

pub mod rpc_json;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod explorer {
		pub mod etherscan;
	}
	pub mod mock;
}

/// Errors that can occur while querying a data source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
	/// The source has no record of the transaction.
	#[error("transaction not found")]
	NotFound,
	/// The transaction is known but no receipt exists yet.
	#[error("transaction is pending (no receipt yet)")]
	Pending,
	/// The endpoint could not be reached at all.
	#[error("connection failed: {0}")]
	Connection(String),
	/// The call did not complete within the configured timeout.
	#[error("request timed out after {}s", .0.as_secs_f64())]
	Timeout(Duration),
	/// The endpoint answered with an error.
	#[error("network error: {0}")]
	Network(String),
	/// The response could not be interpreted.
	#[error("malformed response: {0}")]
	Malformed(String),
	/// The source could not be built from its configuration.
	#[error("invalid configuration: {0}")]
	Configuration(String),
}

/// Settings shared by every source built for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
	/// Upper bound on a single network call.
	pub timeout: Duration,
}

impl Default for SourceSettings {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(15),
		}
	}
}

/// Trait defining the read-only capability every data source provides.
///
/// Failures are independent per call: a failing chain id lookup says nothing
/// about whether the transaction lookup will succeed.
#[async_trait]
pub trait SourceInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Redacted description of the endpoint, safe to print and log.
	fn endpoint(&self) -> String;

	async fn get_chain_id(&self) -> Result<u64, SourceError>;

	async fn get_latest_block_number(&self) -> Result<u64, SourceError>;

	/// Fetches the transaction. Fails with [`SourceError::NotFound`] when the
	/// source has never seen the hash.
	async fn get_transaction(&self, hash: &TransactionHash) -> Result<RawTxData, SourceError>;

	/// Fetches the receipt. Fails with [`SourceError::Pending`] when the
	/// transaction has not been mined.
	async fn get_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<RawReceiptData, SourceError>;

	async fn get_block(&self, number: u64) -> Result<RawBlockData, SourceError>;
}

/// Type alias for source factory functions.
pub type SourceFactory =
	fn(&toml::Value, &SourceSettings) -> Result<Box<dyn SourceInterface>, SourceError>;

/// Registry trait for source implementations.
pub trait SourceRegistry: ImplementationRegistry<Factory = SourceFactory> {}

/// Get all registered source implementations.
///
/// Returns a vector of (name, factory) tuples for all available implementations.
pub fn get_all_implementations() -> Vec<(&'static str, SourceFactory)> {
	use implementations::{evm::alloy, explorer::etherscan, mock};

	vec![
		(alloy::Registry::NAME, alloy::Registry::factory()),
		(etherscan::Registry::NAME, etherscan::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Looks up a factory by implementation name.
pub fn find_implementation(name: &str) -> Option<SourceFactory> {
	get_all_implementations()
		.into_iter()
		.find(|(n, _)| *n == name)
		.map(|(_, factory)| factory)
}
