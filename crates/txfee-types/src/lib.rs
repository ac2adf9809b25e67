//! Common types for the transaction fee inspector.
//!
//! This crate holds the data model shared by every other crate: canonical
//! transaction hashes, raw source payloads, normalized fee views, comparison
//! and batch reports, plus the configuration validation helpers used by
//! source implementations.

/// Batch policy and per-transaction policy results.
pub mod batch;
/// Transaction hash normalization.
pub mod hash;
/// Chain names and explorer endpoints.
pub mod networks;
/// Registry trait for source implementations.
pub mod registry;
/// Cross-source comparison reports.
pub mod report;
/// Redacting wrapper for credentials.
pub mod secret_string;
/// Raw payloads returned by data sources.
pub mod source;
/// Wei amount parsing and display.
pub mod units;
/// Formatting and serde helpers.
pub mod utils;
/// Configuration validation types.
pub mod validation;
/// Normalized per-source fee views.
pub mod view;

pub use alloy_primitives::{Address, B256, U256};
pub use batch::{BatchPolicy, BatchPolicyResult, BatchReport};
pub use hash::{normalize_hashes, HashError, NormalizedHashes, RejectedHash, TransactionHash};
pub use networks::{chain_name, describe_chain, etherscan_network, EtherscanNetwork};
pub use registry::ImplementationRegistry;
pub use report::{ComparedField, ComparisonReport, FieldComparison, FieldObservation, Verdict};
pub use secret_string::SecretString;
pub use source::{RawBlockData, RawReceiptData, RawTxData};
pub use units::{format_eth, format_gwei, format_wei, parse_wei_amount, AmountError, DisplayUnit};
pub use utils::{truncate_hash, with_0x_prefix, without_0x_prefix};
pub use validation::*;
pub use view::{ErrorKind, GasPriceSource, TxDetails, TxView};
