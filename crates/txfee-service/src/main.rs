//! Main entry point for the transaction fee inspector.
//!
//! Looks a transaction up on one or more data sources, reports its fee and
//! confirmation state, and reconciles what the sources say. A batch mode
//! checks many hashes against confirmation and fee thresholds.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use txfee_config::Config;
use txfee_core::Inspection;
use txfee_types::TransactionHash;

mod factory_registry;
mod input;
mod render;
mod sources;

use render::RenderOptions;
use sources::{Overrides, SourceArgs};

/// Everything succeeded.
const EXIT_OK: u8 = 0;
/// An error, a mismatch between sources, or a policy violation.
const EXIT_FAILURE: u8 = 1;
/// The transaction is pending and `--fail-on-pending` was given.
const EXIT_PENDING: u8 = 2;

/// Command-line arguments for the inspector.
#[derive(Parser, Debug)]
#[command(name = "txfee", author, version, about, long_about = None)]
struct Args {
	#[command(subcommand)]
	command: Command,

	/// Path to configuration file
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Timeout for each network call, in seconds
	#[arg(long, global = true, value_name = "SECONDS")]
	timeout: Option<u64>,

	/// Print structured JSON instead of a table
	#[arg(long, global = true)]
	json: bool,

	/// Print one summary line per source or hash
	#[arg(long, global = true, conflicts_with = "json")]
	short: bool,

	/// Use ASCII markers instead of emoji
	#[arg(long, global = true)]
	no_emoji: bool,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn", global = true)]
	log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Inspect one transaction on every configured source
	Inspect(InspectArgs),
	/// Inspect one transaction and require at least two sources to compare
	Compare(InspectArgs),
	/// Check many transactions against confirmation and fee thresholds
	Batch(BatchArgs),
}

#[derive(ClapArgs, Debug)]
struct InspectArgs {
	/// Transaction hash, with or without 0x
	hash: String,

	#[command(flatten)]
	sources: SourceArgs,

	/// Exit with status 2 when the transaction is pending
	#[arg(long)]
	fail_on_pending: bool,
}

#[derive(ClapArgs, Debug)]
struct BatchArgs {
	#[command(flatten)]
	sources: SourceArgs,

	/// Transaction hash; repeat for several
	#[arg(long = "tx", value_name = "HASH")]
	tx: Vec<String>,

	/// File with one hash per line; blank lines and # comments are skipped
	#[arg(long, value_name = "PATH")]
	file: Option<PathBuf>,

	/// Minimum number of confirmations each transaction needs
	#[arg(long, value_name = "N")]
	min_confirmations: Option<u64>,

	/// Maximum total fee, e.g. "0.01 ether" or "500000 gwei"
	#[arg(long, value_name = "AMOUNT")]
	max_fee: Option<String>,

	/// Number of transactions checked at once
	#[arg(long, value_name = "N")]
	concurrency: Option<usize>,

	/// Count pending transactions as failures
	#[arg(long)]
	fail_on_pending: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = match &args.config {
		Some(path) => {
			let config = Config::from_file(path).await?;
			tracing::info!(path = %path.display(), sources = config.sources.len(), "Loaded configuration");
			config
		},
		None => Config::default(),
	};

	let options = RenderOptions {
		emoji: !args.no_emoji,
	};

	let code = match &args.command {
		Command::Inspect(inspect) => run_inspect(&args, config, inspect, options, false).await?,
		Command::Compare(inspect) => run_inspect(&args, config, inspect, options, true).await?,
		Command::Batch(batch) => run_batch(&args, config, batch, options).await?,
	};

	Ok(ExitCode::from(code))
}

async fn run_inspect(
	args: &Args,
	config: Config,
	inspect: &InspectArgs,
	options: RenderOptions,
	require_comparison: bool,
) -> Result<u8, Box<dyn std::error::Error>> {
	let hash = match TransactionHash::normalize(&inspect.hash) {
		Ok(hash) => hash,
		Err(e) => {
			eprintln!("Invalid transaction hash '{}': {}", inspect.hash.trim(), e);
			return Ok(EXIT_FAILURE);
		},
	};

	let overrides = Overrides {
		timeout_seconds: args.timeout,
		fail_on_pending: inspect.fail_on_pending,
		..Default::default()
	};
	let config = sources::merge(config, &inspect.sources, &overrides, env_var)?;
	if require_comparison && config.sources.len() < 2 {
		return Err(format!(
			"compare needs at least two sources, got {}",
			config.sources.len()
		)
		.into());
	}

	let engine = factory_registry::build_engine_from_config(config)?;
	let fail_on_pending = engine.policy().fail_on_pending;

	let started = Instant::now();
	let inspection = engine.inspect(&hash).await;
	let elapsed = started.elapsed();

	if args.json {
		println!("{}", render::inspection_json(&inspection, elapsed)?);
	} else if args.short {
		print!("{}", render::inspection_short(&inspection, options));
	} else {
		print!("{}", render::inspection_table(&inspection, elapsed, options));
	}

	Ok(inspection_exit_code(&inspection, fail_on_pending))
}

async fn run_batch(
	args: &Args,
	config: Config,
	batch: &BatchArgs,
	options: RenderOptions,
) -> Result<u8, Box<dyn std::error::Error>> {
	let inputs = input::load_hashes(&batch.tx, batch.file.as_deref()).await?;
	if inputs.is_empty() {
		return Err("No transaction hashes given: pass --tx or --file".into());
	}

	let overrides = Overrides {
		timeout_seconds: args.timeout,
		concurrency: batch.concurrency,
		min_confirmations: batch.min_confirmations,
		max_fee: batch.max_fee.clone(),
		fail_on_pending: batch.fail_on_pending,
	};
	let config = sources::merge(config, &batch.sources, &overrides, env_var)?;
	let engine = factory_registry::build_engine_from_config(config)?;

	let started = Instant::now();
	let report = engine.batch(&inputs).await?;
	let elapsed = started.elapsed();

	if args.json {
		println!("{}", render::batch_json(&report, elapsed)?);
	} else {
		print!("{}", render::batch_text(&report, elapsed, options, args.short));
	}

	Ok(if report.is_failure() {
		EXIT_FAILURE
	} else {
		EXIT_OK
	})
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok()
}

/// Errors and mismatches fail the run; pending fails it only on request.
fn inspection_exit_code(inspection: &Inspection, fail_on_pending: bool) -> u8 {
	if inspection.has_error() || inspection.has_mismatch() {
		EXIT_FAILURE
	} else if inspection.has_pending() && fail_on_pending {
		EXIT_PENDING
	} else {
		EXIT_OK
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use txfee_types::{ErrorKind, TxView};

	fn hash() -> TransactionHash {
		TransactionHash::normalize(&"ab".repeat(32)).unwrap()
	}

	fn inspection(views: Vec<TxView>) -> Inspection {
		Inspection {
			tx_hash: hash(),
			comparison: (views.len() >= 2).then(|| txfee_core::reconcile(&views)),
			views,
		}
	}

	fn ok_view(label: &str) -> TxView {
		let mut view = TxView::failed(label, None, ErrorKind::SourceError, "");
		view.ok = true;
		view.error_kind = None;
		view.error_message = None;
		view.chain_id = Some(1);
		view
	}

	#[test]
	fn test_parse_inspect() {
		let args = Args::try_parse_from([
			"txfee",
			"inspect",
			"0xabc",
			"--rpc",
			"http://a:8545",
			"--rpc",
			"http://b:8545",
			"--json",
			"--no-emoji",
		])
		.unwrap();

		assert!(args.json);
		assert!(args.no_emoji);
		assert_eq!(args.log_level, "warn");
		match args.command {
			Command::Inspect(inspect) => {
				assert_eq!(inspect.hash, "0xabc");
				assert_eq!(inspect.sources.rpc.len(), 2);
				assert!(!inspect.fail_on_pending);
			},
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_parse_batch() {
		let args = Args::try_parse_from([
			"txfee",
			"batch",
			"--tx",
			"0x01",
			"--tx",
			"0x02",
			"--file",
			"hashes.txt",
			"--min-confirmations",
			"12",
			"--max-fee",
			"0.01 ether",
			"--concurrency",
			"8",
			"--config",
			"txfee.toml",
		])
		.unwrap();

		assert_eq!(args.config, Some(PathBuf::from("txfee.toml")));
		match args.command {
			Command::Batch(batch) => {
				assert_eq!(batch.tx, vec!["0x01", "0x02"]);
				assert_eq!(batch.file, Some(PathBuf::from("hashes.txt")));
				assert_eq!(batch.min_confirmations, Some(12));
				assert_eq!(batch.max_fee.as_deref(), Some("0.01 ether"));
				assert_eq!(batch.concurrency, Some(8));
			},
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_negative_min_confirmations_rejected() {
		assert!(Args::try_parse_from([
			"txfee",
			"batch",
			"--tx",
			"0x01",
			"--min-confirmations=-1",
		])
		.is_err());
	}

	#[test]
	fn test_json_conflicts_with_short() {
		assert!(Args::try_parse_from(["txfee", "inspect", "0x01", "--json", "--short"]).is_err());
	}

	#[test]
	fn test_exit_codes() {
		let all_ok = inspection(vec![ok_view("a"), ok_view("b")]);
		assert_eq!(inspection_exit_code(&all_ok, true), EXIT_OK);

		let mut other_chain = ok_view("b");
		other_chain.chain_id = Some(5);
		let mismatch = inspection(vec![ok_view("a"), other_chain]);
		assert_eq!(inspection_exit_code(&mismatch, false), EXIT_FAILURE);

		let not_found = inspection(vec![TxView::failed(
			"a",
			None,
			ErrorKind::TransactionNotFound,
			"transaction not found",
		)]);
		assert_eq!(inspection_exit_code(&not_found, false), EXIT_FAILURE);

		let pending = inspection(vec![TxView::failed("a", None, ErrorKind::Pending, "pending")]);
		assert_eq!(inspection_exit_code(&pending, false), EXIT_OK);
		assert_eq!(inspection_exit_code(&pending, true), EXIT_PENDING);
	}

	#[tokio::test]
	async fn test_mock_source_from_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("txfee.toml");
		std::fs::write(
			&path,
			r#"
[policy]
min_confirmations = 2

[[sources]]
label = "fixture"
implementation = "mock"
[sources.config]
latest_block = 120

[[sources.config.transactions]]
hash = "0xabababababababababababababababababababababababababababababababab"
block_number = 100
gas_price = "1000000000"
"#,
		)
		.unwrap();

		let config = Config::from_file(&path).await.unwrap();
		let config =
			sources::merge(config, &SourceArgs::default(), &Overrides::default(), |_| None)
				.unwrap();
		let engine = factory_registry::build_engine_from_config(config).unwrap();

		let inspection = engine.inspect(&hash()).await;
		assert!(inspection.views[0].ok);
		assert_eq!(inspection.views[0].confirmations, Some(21));
		assert_eq!(inspection_exit_code(&inspection, false), EXIT_OK);

		let report = engine.batch([hash().to_string()]).await.unwrap();
		assert!(!report.is_failure());
	}
}
