//! Utility functions for hex handling, display formatting and serde helpers.

pub mod formatting;
pub mod serde_wei;

pub use formatting::{
	format_elapsed, format_timestamp, redact_endpoint, truncate_hash, with_0x_prefix,
	without_0x_prefix,
};
