//! Etherscan-compatible block explorer source.
//!
//! Uses the explorer's `module=proxy` endpoints, which relay standard
//! JSON-RPC results, so decoding is shared with the node source. The API key
//! travels as a query parameter; it is held in a [`SecretString`] and errors
//! are stripped of the request URL before they are reported.

use crate::rpc_json::{decode_block, decode_quantity, decode_receipt, decode_transaction, to_quantity};
use crate::{SourceError, SourceInterface, SourceSettings};
use async_trait::async_trait;
use reqwest::{
	header::{HeaderMap, HeaderValue, ACCEPT},
	Client,
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use txfee_types::{
	etherscan_network, networks::etherscan_network_names, utils::redact_endpoint, ConfigSchema,
	Field, FieldType, RawBlockData, RawReceiptData, RawTxData, Schema, SecretString,
	TransactionHash, ValidationError,
};

/// Envelope returned by the proxy module. Successful calls carry
/// `jsonrpc`/`result`; rejected calls carry `status = "0"` and a message.
#[derive(Debug, Deserialize)]
struct ProxyResponse {
	#[serde(default)]
	result: Option<Value>,
	#[serde(default)]
	error: Option<ProxyError>,
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyError {
	#[serde(default)]
	code: i64,
	#[serde(default)]
	message: String,
}

impl ProxyResponse {
	/// Unwraps the relayed JSON-RPC result. A missing result is `Null`, which
	/// the decoders read as not found or pending.
	fn into_result(self, action: &str, endpoint: &str) -> Result<Value, SourceError> {
		if let Some(error) = self.error {
			return Err(SourceError::Network(format!(
				"{} rejected by {}: {} (code {})",
				action, endpoint, error.message, error.code
			)));
		}
		if self.status.as_deref() == Some("0") {
			let detail = self
				.result
				.as_ref()
				.and_then(Value::as_str)
				.unwrap_or_default();
			return Err(SourceError::Network(format!(
				"{} rejected by {}: {} {}",
				action,
				endpoint,
				self.message.as_deref().unwrap_or_default(),
				detail
			)));
		}

		Ok(self.result.unwrap_or(Value::Null))
	}
}

/// Explorer source bound to one network.
pub struct EtherscanSource {
	client: Client,
	base_url: String,
	api_key: SecretString,
	/// Known from the network table or configuration; the proxy module has no
	/// chain id action.
	chain_id: Option<u64>,
	timeout: Duration,
}

impl EtherscanSource {
	pub fn new(
		base_url: String,
		api_key: SecretString,
		chain_id: Option<u64>,
		timeout: Duration,
	) -> Result<Self, SourceError> {
		if api_key.is_empty() {
			return Err(SourceError::Configuration(
				"etherscan api_key must not be empty".to_string(),
			));
		}

		let mut headers = HeaderMap::new();
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let client = Client::builder()
			.default_headers(headers)
			.timeout(timeout)
			.build()
			.map_err(|e| {
				SourceError::Configuration(format!("failed to create HTTP client: {}", e))
			})?;

		debug!(
			"Etherscan source initialized - Base URL: {}, chain id: {:?}",
			redact_endpoint(&base_url),
			chain_id
		);

		Ok(Self {
			client,
			base_url,
			api_key,
			chain_id,
			timeout,
		})
	}

	/// Performs one proxy action and unwraps the JSON-RPC result.
	async fn proxy(&self, action: &str, params: &[(&str, String)]) -> Result<Value, SourceError> {
		let endpoint = redact_endpoint(&self.base_url);
		debug!(endpoint = %endpoint, action, "Querying explorer");

		let mut query: Vec<(&str, String)> = vec![
			("module", "proxy".to_string()),
			("action", action.to_string()),
		];
		query.extend(params.iter().cloned());
		self.api_key
			.with_exposed(|key| query.push(("apikey", key.to_string())));

		let response = self
			.client
			.get(&self.base_url)
			.query(&query)
			.send()
			.await
			.map_err(|e| self.request_error(&endpoint, e))?;

		if !response.status().is_success() {
			return Err(SourceError::Network(format!(
				"{} returned HTTP {} for {}",
				endpoint,
				response.status(),
				action
			)));
		}

		let body: ProxyResponse = response.json().await.map_err(|e| {
			SourceError::Malformed(format!("{} from {}: {}", action, endpoint, e.without_url()))
		})?;

		body.into_result(action, &endpoint)
	}

	fn request_error(&self, endpoint: &str, err: reqwest::Error) -> SourceError {
		let err = err.without_url();
		if err.is_timeout() {
			SourceError::Timeout(self.timeout)
		} else if err.is_connect() {
			SourceError::Connection(format!("cannot reach {}: {}", endpoint, err))
		} else {
			SourceError::Network(format!("request to {} failed: {}", endpoint, err))
		}
	}
}

/// Configuration schema for the explorer source.
pub struct EtherscanSourceSchema;

impl EtherscanSourceSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for EtherscanSourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("api_key", FieldType::String)],
			vec![
				Field::new("network", FieldType::String).with_validator(|value| {
					let name = value.as_str().unwrap_or_default();
					if etherscan_network(name).is_some() {
						Ok(())
					} else {
						Err(format!(
							"unknown network '{}', expected one of: {}",
							name,
							etherscan_network_names().collect::<Vec<_>>().join(", ")
						))
					}
				}),
				Field::new("base_url", FieldType::Url),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
		);
		schema.validate(config)
	}
}

#[async_trait]
impl SourceInterface for EtherscanSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(EtherscanSourceSchema)
	}

	fn endpoint(&self) -> String {
		redact_endpoint(&self.base_url)
	}

	async fn get_chain_id(&self) -> Result<u64, SourceError> {
		self.chain_id.ok_or_else(|| {
			SourceError::Configuration(
				"chain id unknown for custom explorer base_url; set chain_id".to_string(),
			)
		})
	}

	async fn get_latest_block_number(&self) -> Result<u64, SourceError> {
		let result = self.proxy("eth_blockNumber", &[]).await?;
		decode_quantity(&result, "eth_blockNumber")
	}

	async fn get_transaction(&self, hash: &TransactionHash) -> Result<RawTxData, SourceError> {
		let result = self
			.proxy("eth_getTransactionByHash", &[("txhash", hash.to_string())])
			.await?;
		decode_transaction(&result)
	}

	async fn get_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<RawReceiptData, SourceError> {
		let result = self
			.proxy("eth_getTransactionReceipt", &[("txhash", hash.to_string())])
			.await?;
		decode_receipt(&result)
	}

	async fn get_block(&self, number: u64) -> Result<RawBlockData, SourceError> {
		let result = self
			.proxy(
				"eth_getBlockByNumber",
				&[("tag", to_quantity(number)), ("boolean", "false".to_string())],
			)
			.await?;
		decode_block(&result, number)
	}
}

/// Factory function to create an explorer source from configuration.
///
/// Configuration parameters:
/// - `api_key` (required): explorer API key
/// - `network` (optional): `mainnet` (default), `goerli` or `sepolia`
/// - `base_url` (optional): overrides the network's API URL
/// - `chain_id` (optional): overrides the network's chain id
pub fn create_source(
	config: &toml::Value,
	settings: &SourceSettings,
) -> Result<Box<dyn SourceInterface>, SourceError> {
	EtherscanSourceSchema::validate_config(config)
		.map_err(|e| SourceError::Configuration(e.to_string()))?;

	let api_key = config
		.get("api_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| SourceError::Configuration("api_key is required".to_string()))?;

	let base_url = config.get("base_url").and_then(|v| v.as_str());
	let network = match config.get("network").and_then(|v| v.as_str()) {
		Some(name) => etherscan_network(name),
		None if base_url.is_none() => etherscan_network("mainnet"),
		None => None,
	};

	let base_url = base_url
		.map(str::to_string)
		.or_else(|| network.map(|n| n.api_url.to_string()))
		.ok_or_else(|| SourceError::Configuration("no explorer base_url".to_string()))?;
	let chain_id = config
		.get("chain_id")
		.and_then(|v| v.as_integer())
		.map(|id| id as u64)
		.or_else(|| network.map(|n| n.chain_id));

	Ok(Box::new(EtherscanSource::new(
		base_url,
		api_key,
		chain_id,
		settings.timeout,
	)?))
}

/// Registry for the explorer source implementation.
pub struct Registry;

impl txfee_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "etherscan";
	type Factory = crate::SourceFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl crate::SourceRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(s: &str) -> toml::Value {
		toml::from_str(s).unwrap()
	}

	#[tokio::test]
	async fn test_defaults_to_mainnet() {
		let source = create_source(&config("api_key = \"KEY\""), &SourceSettings::default()).unwrap();
		assert_eq!(source.endpoint(), "https://api.etherscan.io");
		assert_eq!(source.get_chain_id().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_network_and_overrides() {
		let settings = SourceSettings::default();
		let sepolia = create_source(
			&config("api_key = \"KEY\"\nnetwork = \"sepolia\""),
			&settings,
		)
		.unwrap();
		assert_eq!(sepolia.get_chain_id().await.unwrap(), 11155111);
		assert_eq!(sepolia.endpoint(), "https://api-sepolia.etherscan.io");

		let custom = create_source(
			&config("api_key = \"KEY\"\nbase_url = \"https://explorer.example/api\""),
			&settings,
		)
		.unwrap();
		assert!(matches!(
			custom.get_chain_id().await,
			Err(SourceError::Configuration(_))
		));
	}

	#[test]
	fn test_rejects_bad_config() {
		let settings = SourceSettings::default();
		assert!(create_source(&config("network = \"mainnet\""), &settings).is_err());
		assert!(create_source(
			&config("api_key = \"KEY\"\nnetwork = \"polygon\""),
			&settings
		)
		.is_err());
		assert!(create_source(&config("api_key = \"  \""), &settings).is_err());
	}

	fn envelope(json: &str) -> ProxyResponse {
		serde_json::from_str(json).unwrap()
	}

	const ENDPOINT: &str = "https://api.etherscan.io";

	#[test]
	fn test_envelope_result() {
		let result = envelope(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#)
			.into_result("eth_blockNumber", ENDPOINT)
			.unwrap();
		assert_eq!(decode_quantity(&result, "eth_blockNumber").unwrap(), 16);
	}

	#[test]
	fn test_envelope_rejected_status() {
		let err = envelope(r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#)
			.into_result("eth_getTransactionByHash", ENDPOINT)
			.unwrap_err();
		match err {
			SourceError::Network(message) => {
				assert!(message.contains("eth_getTransactionByHash rejected by https://api.etherscan.io"));
				assert!(message.contains("NOTOK Max rate limit reached"));
			},
			other => panic!("expected network error, got {:?}", other),
		}

		let invalid_key = envelope(r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#)
			.into_result("eth_blockNumber", ENDPOINT);
		assert!(matches!(invalid_key, Err(SourceError::Network(m)) if m.contains("Invalid API Key")));
	}

	#[test]
	fn test_envelope_rpc_error() {
		let err = envelope(
			r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid argument"}}"#,
		)
		.into_result("eth_getBlockByNumber", ENDPOINT)
		.unwrap_err();
		match err {
			SourceError::Network(message) => {
				assert!(message.contains("invalid argument (code -32602)"));
			},
			other => panic!("expected network error, got {:?}", other),
		}
	}

	#[test]
	fn test_envelope_missing_result_is_not_found_or_pending() {
		let tx = envelope(r#"{"jsonrpc":"2.0","id":1}"#)
			.into_result("eth_getTransactionByHash", ENDPOINT)
			.unwrap();
		assert_eq!(tx, Value::Null);
		assert!(matches!(decode_transaction(&tx), Err(SourceError::NotFound)));

		let receipt = envelope(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
			.into_result("eth_getTransactionReceipt", ENDPOINT)
			.unwrap();
		assert!(matches!(decode_receipt(&receipt), Err(SourceError::Pending)));
	}
}
