//! String formatting utilities.
//!
//! Provides hex prefix management, hash truncation, endpoint redaction and
//! human readable durations and timestamps.

use chrono::{TimeZone, Utc};
use std::time::Duration;

/// Truncates a hash for display, keeping the prefix and the last four digits.
///
/// Strings of 14 characters or fewer are returned unchanged.
pub fn truncate_hash(hash: &str) -> String {
	if hash.len() <= 14 || !hash.is_ascii() {
		hash.to_string()
	} else {
		format!("{}..{}", &hash[..10], &hash[hash.len() - 4..])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Reduces an endpoint URL to `scheme://host[:port]`.
///
/// Paths and query strings frequently carry API keys, so they are never
/// shown. Inputs that do not look like URLs are replaced with `<redacted>`.
pub fn redact_endpoint(url: &str) -> String {
	let Some((scheme, rest)) = url.split_once("://") else {
		return "<redacted>".to_string();
	};
	let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
	// Drop userinfo, which may hold credentials.
	let host = authority.rsplit('@').next().unwrap_or_default();
	if scheme.is_empty() || host.is_empty() {
		return "<redacted>".to_string();
	}
	format!("{}://{}", scheme, host)
}

/// Formats an elapsed duration: milliseconds below one second, otherwise
/// seconds with two decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
	if elapsed < Duration::from_secs(1) {
		format!("{}ms", elapsed.as_millis())
	} else {
		format!("{:.2}s", elapsed.as_secs_f64())
	}
}

/// Formats a unix timestamp as an RFC 3339 UTC string.
pub fn format_timestamp(timestamp: u64) -> Option<String> {
	let seconds = i64::try_from(timestamp).ok()?;
	Utc.timestamp_opt(seconds, 0)
		.single()
		.map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
