//! Merges command-line sources and overrides into the loaded configuration.

use clap::Args;
use txfee_config::{Config, SourceConfig};
use txfee_types::etherscan_network;

/// Environment variables consulted when neither flags nor the config file
/// name a source.
pub const RPC_URL_ENV: [&str; 2] = ["RPC_URL", "RPC_URL_2"];

/// Flags that select data sources.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
	/// JSON-RPC endpoint; repeat to compare several nodes
	#[arg(long = "rpc", value_name = "URL")]
	pub rpc: Vec<String>,

	/// Add an Etherscan source for this network (mainnet, goerli, sepolia)
	#[arg(long, value_name = "NETWORK")]
	pub etherscan_chain: Option<String>,

	/// Etherscan API key
	#[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
	pub etherscan_key: Option<String>,
}

/// Flags that override `[inspector]` and `[policy]`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub timeout_seconds: Option<u64>,
	pub concurrency: Option<usize>,
	pub min_confirmations: Option<u64>,
	pub max_fee: Option<String>,
	pub fail_on_pending: bool,
}

/// Applies CLI sources and overrides on top of `config`.
///
/// Sources given on the command line replace those from the file. When
/// neither names a source, `RPC_URL` and `RPC_URL_2` are read through `env`.
pub fn merge(
	mut config: Config,
	args: &SourceArgs,
	overrides: &Overrides,
	env: impl Fn(&str) -> Option<String>,
) -> Result<Config, String> {
	let cli_sources = cli_sources(args)?;
	if !cli_sources.is_empty() {
		config.sources = cli_sources;
	} else if config.sources.is_empty() {
		let urls: Vec<String> = RPC_URL_ENV
			.iter()
			.filter_map(|name| env(name))
			.filter(|url| !url.trim().is_empty())
			.collect();
		config.sources = rpc_sources(&urls);
	}

	if let Some(timeout) = overrides.timeout_seconds {
		config.inspector.timeout_seconds = timeout;
	}
	if let Some(concurrency) = overrides.concurrency {
		config.inspector.concurrency = concurrency;
	}
	if let Some(min) = overrides.min_confirmations {
		config.policy.min_confirmations = min;
	}
	if let Some(max_fee) = &overrides.max_fee {
		config.policy.max_fee = Some(max_fee.clone());
	}
	config.policy.fail_on_pending |= overrides.fail_on_pending;

	if config.sources.is_empty() {
		return Err(format!(
			"No data source given: pass --rpc, --etherscan-chain, a config file with [[sources]], or set {}",
			RPC_URL_ENV.join(" / ")
		));
	}

	Ok(config)
}

fn cli_sources(args: &SourceArgs) -> Result<Vec<SourceConfig>, String> {
	let mut sources = rpc_sources(&args.rpc);

	if let Some(network) = &args.etherscan_chain {
		if etherscan_network(network).is_none() {
			return Err(format!(
				"Unknown Etherscan network '{}'. Available: [{}]",
				network,
				txfee_types::networks::etherscan_network_names()
					.collect::<Vec<_>>()
					.join(", ")
			));
		}
		let api_key = args
			.etherscan_key
			.as_deref()
			.filter(|key| !key.trim().is_empty())
			.ok_or("--etherscan-chain requires --etherscan-key or ETHERSCAN_API_KEY")?;

		sources.push(SourceConfig {
			label: format!("etherscan-{}", network.to_lowercase()),
			implementation: "etherscan".into(),
			config: table(&[("network", network), ("api_key", api_key)]),
		});
	}

	Ok(sources)
}

fn rpc_sources(urls: &[String]) -> Vec<SourceConfig> {
	urls.iter()
		.enumerate()
		.map(|(i, url)| SourceConfig {
			label: format!("rpc-{}", i + 1),
			implementation: "evm_alloy".into(),
			config: table(&[("rpc_url", url.trim())]),
		})
		.collect()
}

fn table(entries: &[(&str, &str)]) -> toml::Value {
	let mut map = toml::map::Map::new();
	for (key, value) in entries {
		map.insert(key.to_string(), toml::Value::String(value.to_string()));
	}
	toml::Value::Table(map)
}
