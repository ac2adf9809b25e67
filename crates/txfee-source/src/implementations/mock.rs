//! Mock source with canned chain data.
//!
//! Used by tests throughout the workspace and for offline dry runs of a
//! configuration file. Every operation can be made to fail with a chosen
//! [`SourceError`], and an artificial delay can be added to each call.

use crate::{SourceError, SourceFactory, SourceInterface, SourceRegistry, SourceSettings};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use txfee_types::{
	utils::serde_wei, ConfigSchema, Field, FieldType, ImplementationRegistry, RawBlockData,
	RawReceiptData, RawTxData, Schema, TransactionHash, ValidationError,
};

/// Operations of [`SourceInterface`], used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
	ChainId,
	LatestBlock,
	Transaction,
	Receipt,
	Block,
}

impl MockOperation {
	const ALL: [MockOperation; 5] = [
		MockOperation::ChainId,
		MockOperation::LatestBlock,
		MockOperation::Transaction,
		MockOperation::Receipt,
		MockOperation::Block,
	];
}

/// A transaction entry in the mock configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct MockTransactionConfig {
	pub hash: TransactionHash,
	/// Unset means the transaction is pending.
	#[serde(default)]
	pub block_number: Option<u64>,
	#[serde(default = "default_status")]
	pub status: u8,
	#[serde(default = "default_gas_used")]
	pub gas_used: u64,
	#[serde(default, with = "serde_wei::option")]
	pub gas_price: Option<U256>,
	#[serde(default, with = "serde_wei::option")]
	pub effective_gas_price: Option<U256>,
	#[serde(default)]
	pub block_timestamp: Option<u64>,
}

fn default_status() -> u8 {
	1
}

fn default_gas_used() -> u64 {
	21_000
}

/// Configuration for the mock source.
#[derive(Debug, Clone, Deserialize)]
pub struct MockSourceConfig {
	#[serde(default = "default_endpoint")]
	pub endpoint: String,
	#[serde(default)]
	pub chain_id: Option<u64>,
	#[serde(default)]
	pub latest_block: Option<u64>,
	#[serde(default)]
	pub delay_ms: Option<u64>,
	#[serde(default)]
	pub transactions: Vec<MockTransactionConfig>,
}

fn default_endpoint() -> String {
	"mock://local".to_string()
}

/// Configuration schema for the mock source.
pub struct MockSourceSchema;

impl ConfigSchema for MockSourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let non_negative = || FieldType::Integer {
			min: Some(0),
			max: None,
		};
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("endpoint", FieldType::String),
				Field::new("chain_id", non_negative()),
				Field::new("latest_block", non_negative()),
				Field::new("delay_ms", non_negative()),
			],
		);
		schema.validate(config)
	}
}

/// In-memory source returning canned records.
#[derive(Debug, Clone)]
pub struct MockSource {
	endpoint: String,
	chain_id: Option<u64>,
	latest_block: Option<u64>,
	transactions: HashMap<TransactionHash, RawTxData>,
	receipts: HashMap<TransactionHash, RawReceiptData>,
	blocks: HashMap<u64, RawBlockData>,
	failures: HashMap<MockOperation, SourceError>,
	delay: Option<Duration>,
}

impl Default for MockSource {
	fn default() -> Self {
		Self::new()
	}
}

impl MockSource {
	/// Creates an empty mock on chain 1 with head block 0.
	pub fn new() -> Self {
		Self {
			endpoint: default_endpoint(),
			chain_id: Some(1),
			latest_block: Some(0),
			transactions: HashMap::new(),
			receipts: HashMap::new(),
			blocks: HashMap::new(),
			failures: HashMap::new(),
			delay: None,
		}
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}

	pub fn with_chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = Some(chain_id);
		self
	}

	pub fn with_latest_block(mut self, block: u64) -> Self {
		self.latest_block = Some(block);
		self
	}

	/// Adds a transaction without a receipt, i.e. a pending one.
	pub fn with_transaction(mut self, hash: TransactionHash, tx: RawTxData) -> Self {
		self.transactions.insert(hash, tx);
		self
	}

	/// Adds a receipt for a transaction previously added.
	pub fn with_receipt(mut self, hash: TransactionHash, receipt: RawReceiptData) -> Self {
		self.receipts.insert(hash, receipt);
		self
	}

	/// Adds a mined transaction together with its receipt.
	pub fn with_mined(
		self,
		hash: TransactionHash,
		tx: RawTxData,
		receipt: RawReceiptData,
	) -> Self {
		self.with_transaction(hash, tx).with_receipt(hash, receipt)
	}

	pub fn with_block(mut self, block: RawBlockData) -> Self {
		self.blocks.insert(block.number, block);
		self
	}

	/// Makes every call to `operation` fail with `error`.
	pub fn failing(mut self, operation: MockOperation, error: SourceError) -> Self {
		self.failures.insert(operation, error);
		self
	}

	/// Makes every operation fail as if the endpoint were down.
	pub fn unreachable(mut self) -> Self {
		for operation in MockOperation::ALL {
			self.failures.insert(
				operation,
				SourceError::Connection(format!("cannot reach {}", self.endpoint)),
			);
		}
		self
	}

	/// Delays every call, for exercising timeouts and concurrency.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	/// Builds a mock from its TOML configuration.
	pub fn from_config(config: MockSourceConfig) -> Self {
		let mut source = Self::new().with_endpoint(config.endpoint);
		source.chain_id = config.chain_id.or(source.chain_id);
		source.latest_block = config.latest_block.or(source.latest_block);
		source.delay = config.delay_ms.map(Duration::from_millis);

		for entry in config.transactions {
			let tx = RawTxData {
				from: Some(Address::ZERO),
				gas_limit: Some(entry.gas_used),
				gas_price_wei: entry.gas_price,
				value_wei: Some(U256::ZERO),
				tx_type: Some(if entry.effective_gas_price.is_some() { 2 } else { 0 }),
				block_number: entry.block_number,
				..Default::default()
			};
			source = source.with_transaction(entry.hash, tx);

			if let Some(block_number) = entry.block_number {
				let receipt = RawReceiptData {
					block_number: Some(block_number),
					status: Some(entry.status),
					gas_used: Some(entry.gas_used),
					effective_gas_price_wei: entry.effective_gas_price,
					transaction_hash: Some(entry.hash.to_string()),
					..Default::default()
				};
				source = source.with_receipt(entry.hash, receipt);
				if let Some(timestamp) = entry.block_timestamp {
					source = source.with_block(RawBlockData {
						number: block_number,
						timestamp,
					});
				}
			}
		}

		source
	}

	async fn enter(&self, operation: MockOperation) -> Result<(), SourceError> {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		match self.failures.get(&operation) {
			Some(error) => Err(error.clone()),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl SourceInterface for MockSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockSourceSchema)
	}

	fn endpoint(&self) -> String {
		self.endpoint.clone()
	}

	async fn get_chain_id(&self) -> Result<u64, SourceError> {
		self.enter(MockOperation::ChainId).await?;
		self.chain_id
			.ok_or_else(|| SourceError::Malformed("eth_chainId returned null".to_string()))
	}

	async fn get_latest_block_number(&self) -> Result<u64, SourceError> {
		self.enter(MockOperation::LatestBlock).await?;
		self.latest_block
			.ok_or_else(|| SourceError::Malformed("eth_blockNumber returned null".to_string()))
	}

	async fn get_transaction(&self, hash: &TransactionHash) -> Result<RawTxData, SourceError> {
		self.enter(MockOperation::Transaction).await?;
		self.transactions
			.get(hash)
			.cloned()
			.ok_or(SourceError::NotFound)
	}

	async fn get_transaction_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<RawReceiptData, SourceError> {
		self.enter(MockOperation::Receipt).await?;
		self.receipts.get(hash).cloned().ok_or(SourceError::Pending)
	}

	async fn get_block(&self, number: u64) -> Result<RawBlockData, SourceError> {
		self.enter(MockOperation::Block).await?;
		self.blocks
			.get(&number)
			.copied()
			.ok_or_else(|| SourceError::Malformed(format!("block {} was not returned", number)))
	}
}

/// Registry for the mock source implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = SourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value,
		 _settings: &SourceSettings|
		 -> Result<Box<dyn SourceInterface>, SourceError> {
			MockSourceSchema
				.validate(config)
				.map_err(|e| SourceError::Configuration(e.to_string()))?;
			let mock_config: MockSourceConfig = config
				.clone()
				.try_into()
				.map_err(|e| SourceError::Configuration(format!("Invalid mock config: {}", e)))?;

			Ok(Box::new(MockSource::from_config(mock_config)))
		}
	}
}

impl SourceRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn hash(byte: &str) -> TransactionHash {
		TransactionHash::normalize(&byte.repeat(32)).unwrap()
	}

	#[tokio::test]
	async fn test_canned_records() {
		let h = hash("aa");
		let source = MockSource::new()
			.with_chain_id(5)
			.with_latest_block(120)
			.with_mined(
				h,
				RawTxData::default(),
				RawReceiptData {
					block_number: Some(100),
					gas_used: Some(21_000),
					..Default::default()
				},
			);

		assert_eq!(source.get_chain_id().await.unwrap(), 5);
		assert_eq!(source.get_latest_block_number().await.unwrap(), 120);
		assert!(source.get_transaction(&h).await.is_ok());
		assert_eq!(
			source.get_transaction_receipt(&h).await.unwrap().gas_used,
			Some(21_000)
		);
		assert!(matches!(
			source.get_transaction(&hash("bb")).await,
			Err(SourceError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_pending_and_failures() {
		let h = hash("cc");
		let source = MockSource::new()
			.with_transaction(h, RawTxData::default())
			.failing(MockOperation::ChainId, SourceError::Timeout(Duration::from_secs(1)));

		assert!(matches!(
			source.get_transaction_receipt(&h).await,
			Err(SourceError::Pending)
		));
		assert!(matches!(
			source.get_chain_id().await,
			Err(SourceError::Timeout(_))
		));

		let down = MockSource::new().with_endpoint("mock://down").unreachable();
		match down.get_latest_block_number().await {
			Err(SourceError::Connection(message)) => assert!(message.contains("mock://down")),
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_factory_from_toml() {
		let config: toml::Value = toml::from_str(
			r#"
			chain_id = 11155111
			latest_block = 50
			endpoint = "mock://fixture"

			[[transactions]]
			hash = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
			block_number = 48
			gas_used = 50000
			effective_gas_price = "1500000000"
			block_timestamp = 1700000000

			[[transactions]]
			hash = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
			gas_price = 1000000000
			"#,
		)
		.unwrap();

		let source = Registry::factory()(&config, &SourceSettings::default()).unwrap();
		assert_eq!(source.endpoint(), "mock://fixture");
		assert_eq!(source.get_chain_id().await.unwrap(), 11155111);

		let mined = source.get_transaction_receipt(&hash("aa")).await.unwrap();
		assert_eq!(mined.effective_gas_price_wei, Some(U256::from(1_500_000_000u64)));
		assert_eq!(source.get_block(48).await.unwrap().timestamp, 1_700_000_000);

		assert!(matches!(
			source.get_transaction_receipt(&hash("bb")).await,
			Err(SourceError::Pending)
		));
	}

	#[test]
	fn test_factory_rejects_bad_config() {
		let config: toml::Value = toml::from_str("chain_id = \"one\"").unwrap();
		assert!(matches!(
			Registry::factory()(&config, &SourceSettings::default()),
			Err(SourceError::Configuration(_))
		));
	}
}
