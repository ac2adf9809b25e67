//! JSON-RPC node source built on alloy.
//!
//! Calls are issued as raw JSON-RPC requests through the provider's client
//! and decoded by [`crate::rpc_json`], so nodes that omit optional fields
//! (legacy receipts without `effectiveGasPrice`, chains without `type`)
//! still produce partial records instead of decode failures.

use crate::rpc_json::{decode_block, decode_quantity, decode_receipt, decode_transaction, to_quantity};
use crate::{SourceError, SourceInterface, SourceSettings};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_transport::{RpcError, TransportError, TransportErrorKind};
use alloy_transport_http::Http;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use txfee_types::{
	utils::redact_endpoint, ConfigSchema, Field, FieldType, RawBlockData, RawReceiptData,
	RawTxData, Schema, TransactionHash, ValidationError,
};

/// Alloy-based JSON-RPC source for a single endpoint.
pub struct AlloySource {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	/// Redacted form of the configured URL.
	endpoint: String,
	/// Spellings of the full URL that must never appear in messages: as
	/// configured and as normalized by the URL parser.
	secret_urls: [String; 2],
	timeout: Duration,
}

impl AlloySource {
	/// Creates a source for `rpc_url`. No request is made until the first query.
	pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, SourceError> {
		let endpoint = redact_endpoint(rpc_url);
		let url: reqwest::Url = rpc_url.parse().map_err(|e| {
			SourceError::Configuration(format!("invalid RPC URL {}: {}", endpoint, e))
		})?;
		let secret_urls = [url.to_string(), rpc_url.trim().to_string()];

		let provider = ProviderBuilder::new().on_http(url);

		Ok(Self {
			provider: Arc::new(provider) as Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
			endpoint,
			secret_urls,
			timeout,
		})
	}

	/// Issues one JSON-RPC call bounded by the configured timeout.
	async fn call(&self, method: &'static str, params: Value) -> Result<Value, SourceError> {
		let request = async {
			let result: Value = self.provider.client().request(method, params).await?;
			Ok::<_, TransportError>(result)
		};

		match tokio::time::timeout(self.timeout, request).await {
			Ok(Ok(result)) => Ok(result),
			// The node answered with a literal null; callers decide what it means.
			Ok(Err(RpcError::NullResp)) => Ok(Value::Null),
			Ok(Err(e)) => Err(self.classify(method, e)),
			Err(_) => {
				tracing::debug!(endpoint = %self.endpoint, method, "RPC call timed out");
				Err(SourceError::Timeout(self.timeout))
			},
		}
	}

	fn classify(&self, method: &str, err: TransportError) -> SourceError {
		match &err {
			RpcError::Transport(TransportErrorKind::Custom(inner)) => {
				if let Some(http) = inner.downcast_ref::<reqwest::Error>() {
					if http.is_timeout() {
						return SourceError::Timeout(self.timeout);
					}
					if http.is_connect() {
						return SourceError::Connection(format!(
							"cannot reach {}: {}",
							self.endpoint,
							self.scrub(&http.to_string())
						));
					}
				}
				SourceError::Network(format!(
					"{} via {}: {}",
					method,
					self.endpoint,
					self.scrub(&err.to_string())
				))
			},
			RpcError::ErrorResp(payload) => SourceError::Network(format!(
				"{} rejected by {}: {} (code {})",
				method,
				self.endpoint,
				self.scrub(&payload.message),
				payload.code
			)),
			RpcError::DeserError { .. } | RpcError::SerError(_) => SourceError::Malformed(format!(
				"{} via {}: {}",
				method,
				self.endpoint,
				self.scrub(&err.to_string())
			)),
			_ => SourceError::Network(format!(
				"{} via {}: {}",
				method,
				self.endpoint,
				self.scrub(&err.to_string())
			)),
		}
	}

	/// Replaces every spelling of the full URL in `message` with the
	/// redacted endpoint.
	fn scrub(&self, message: &str) -> String {
		self.secret_urls
			.iter()
			.filter(|url| !url.is_empty())
			.fold(message.to_string(), |text, url| text.replace(url.as_str(), &self.endpoint))
	}
}

/// Configuration schema for the alloy source.
pub struct AlloySourceSchema;

impl AlloySourceSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for AlloySourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![Field::new("rpc_url", FieldType::Url)], vec![]);
		schema.validate(config)
	}
}

#[async_trait]
impl SourceInterface for AlloySource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloySourceSchema)
	}

	fn endpoint(&self) -> String {
		self.endpoint.clone()
	}

	async fn get_chain_id(&self) -> Result<u64, SourceError> {
		let result = self.call("eth_chainId", json!([])).await?;
		decode_quantity(&result, "eth_chainId")
	}

	async fn get_latest_block_number(&self) -> Result<u64, SourceError> {
		let result = self.call("eth_blockNumber", json!([])).await?;
		decode_quantity(&result, "eth_blockNumber")
	}

	async fn get_transaction(&self, hash: &TransactionHash) -> Result<RawTxData, SourceError> {
		let result = self
			.call("eth_getTransactionByHash", json!([hash.to_string()]))
			.await?;
		decode_transaction(&result)
	}

	async fn get_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<RawReceiptData, SourceError> {
		let result = self
			.call("eth_getTransactionReceipt", json!([hash.to_string()]))
			.await?;
		decode_receipt(&result)
	}

	async fn get_block(&self, number: u64) -> Result<RawBlockData, SourceError> {
		let result = self
			.call("eth_getBlockByNumber", json!([to_quantity(number), false]))
			.await?;
		decode_block(&result, number)
	}
}

/// Factory function to create an alloy source from configuration.
///
/// Configuration parameters:
/// - `rpc_url` (required): HTTP(S) JSON-RPC endpoint
pub fn create_source(
	config: &toml::Value,
	settings: &SourceSettings,
) -> Result<Box<dyn SourceInterface>, SourceError> {
	AlloySourceSchema::validate_config(config)
		.map_err(|e| SourceError::Configuration(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| SourceError::Configuration("rpc_url is required".to_string()))?;

	Ok(Box::new(AlloySource::new(rpc_url, settings.timeout)?))
}

/// Registry for the alloy source implementation.
pub struct Registry;

impl txfee_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = crate::SourceFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl crate::SourceRegistry for Registry {}
