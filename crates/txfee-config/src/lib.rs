//! Configuration for the transaction fee inspector.
//!
//! A configuration file is optional; everything it holds can also be given
//! on the command line. When present it is TOML with `${VAR}` and
//! `${VAR:-default}` environment interpolation:
//!
//! ```toml
//! [inspector]
//! timeout_seconds = 15
//! concurrency = 4
//!
//! [policy]
//! min_confirmations = 12
//! max_fee = "0.01 ether"
//!
//! [[sources]]
//! label = "primary"
//! implementation = "evm_alloy"
//! [sources.config]
//! rpc_url = "${RPC_URL}"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use txfee_types::{parse_wei_amount, BatchPolicy};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Bounds for `inspector.timeout_seconds`.
pub const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=300;
/// Bounds for `inspector.concurrency`.
pub const CONCURRENCY_RANGE: std::ops::RangeInclusive<usize> = 1..=64;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	#[serde(default)]
	pub inspector: InspectorConfig,
	#[serde(default)]
	pub policy: PolicyConfig,
	/// Data sources, in the order their views are reported.
	#[serde(default)]
	pub sources: Vec<SourceConfig>,
}

/// Network behaviour of the inspector.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InspectorConfig {
	/// Timeout applied to each individual network call.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Number of hashes processed at once in batch mode.
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,
}

fn default_timeout_seconds() -> u64 {
	15
}

fn default_concurrency() -> usize {
	4
}

impl Default for InspectorConfig {
	fn default() -> Self {
		Self {
			timeout_seconds: default_timeout_seconds(),
			concurrency: default_concurrency(),
		}
	}
}

impl InspectorConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_seconds)
	}
}

/// Thresholds evaluated per transaction in batch mode.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PolicyConfig {
	#[serde(default)]
	pub min_confirmations: u64,
	/// Maximum total fee, e.g. `"0.01 ether"`, `"500000 gwei"`. Bare numbers are ether.
	#[serde(default)]
	pub max_fee: Option<String>,
	/// Count pending transactions as failures.
	#[serde(default)]
	pub fail_on_pending: bool,
}

impl PolicyConfig {
	/// Converts to the batch policy, parsing `max_fee` to exact wei.
	pub fn to_batch_policy(&self) -> Result<BatchPolicy, ConfigError> {
		let max_fee_wei = self
			.max_fee
			.as_deref()
			.map(parse_wei_amount)
			.transpose()
			.map_err(|e| ConfigError::Validation(format!("policy.max_fee: {}", e)))?;

		Ok(BatchPolicy {
			min_confirmations: self.min_confirmations,
			max_fee_wei,
			fail_on_pending: self.fail_on_pending,
		})
	}
}

/// One data source entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
	/// Name shown in reports; unique within a configuration.
	pub label: String,
	/// Registered implementation name, e.g. `evm_alloy`, `etherscan`, `mock`.
	pub implementation: String,
	/// Implementation-specific settings, validated by the implementation.
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Validates value ranges and source entries.
	///
	/// Implementation names and implementation-specific settings are checked
	/// when sources are built, since only the source registry knows them.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !TIMEOUT_RANGE.contains(&self.inspector.timeout_seconds) {
			return Err(ConfigError::Validation(format!(
				"inspector.timeout_seconds must be between {} and {}, got {}",
				TIMEOUT_RANGE.start(),
				TIMEOUT_RANGE.end(),
				self.inspector.timeout_seconds
			)));
		}
		if !CONCURRENCY_RANGE.contains(&self.inspector.concurrency) {
			return Err(ConfigError::Validation(format!(
				"inspector.concurrency must be between {} and {}, got {}",
				CONCURRENCY_RANGE.start(),
				CONCURRENCY_RANGE.end(),
				self.inspector.concurrency
			)));
		}

		self.policy.to_batch_policy()?;

		let mut labels = HashSet::new();
		for source in &self.sources {
			if source.label.trim().is_empty() {
				return Err(ConfigError::Validation(
					"Source label cannot be empty".into(),
				));
			}
			if source.implementation.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Source '{}' must name an implementation",
					source.label
				)));
			}
			if !source.config.is_table() {
				return Err(ConfigError::Validation(format!(
					"Source '{}' config must be a table",
					source.label
				)));
			}
			if !labels.insert(source.label.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate source label '{}'",
					source.label
				)));
			}
		}

		Ok(())
	}
}

/// Parses TOML, resolving environment variables first, then validates.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
