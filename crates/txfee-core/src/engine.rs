//! Inspection engine: sources built from configuration plus the operations
//! the binary drives.

use crate::batch::BatchRunner;
use crate::fee_view::FeeViewBuilder;
use crate::reconcile::reconcile;
use crate::CoreError;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use txfee_config::Config;
use txfee_source::{SourceFactory, SourceInterface, SourceSettings};
use txfee_types::{
	normalize_hashes, truncate_hash, utils::redact_endpoint, BatchPolicy, BatchReport,
	ComparisonReport, ErrorKind, TransactionHash, TxView,
};

/// A configured source, or the reason it could not be built.
#[derive(Clone)]
pub enum SourceSlot {
	Ready(Arc<dyn SourceInterface>),
	/// Construction failed; every view from this slot is a connection failure.
	Unavailable { endpoint: String, reason: String },
}

/// A labelled source slot.
#[derive(Clone)]
pub struct LabeledSource {
	pub label: String,
	pub slot: SourceSlot,
}

impl LabeledSource {
	pub fn ready(label: impl Into<String>, source: Arc<dyn SourceInterface>) -> Self {
		Self {
			label: label.into(),
			slot: SourceSlot::Ready(source),
		}
	}

	pub fn endpoint(&self) -> String {
		match &self.slot {
			SourceSlot::Ready(source) => source.endpoint(),
			SourceSlot::Unavailable { endpoint, .. } => endpoint.clone(),
		}
	}

	async fn view(&self, hash: &TransactionHash) -> TxView {
		match &self.slot {
			SourceSlot::Ready(source) => FeeViewBuilder::new(&self.label, source.as_ref()).build(hash).await,
			SourceSlot::Unavailable { endpoint, reason } => self.unavailable_view(endpoint, reason),
		}
	}

	fn unavailable_view(&self, endpoint: &str, reason: &str) -> TxView {
		TxView::failed(
			&self.label,
			Some(endpoint.to_string()),
			ErrorKind::ConnectionFailure,
			format!("source {} unavailable: {}", endpoint, reason),
		)
	}
}

/// Views of one hash from every source plus their reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
	pub tx_hash: TransactionHash,
	pub views: Vec<TxView>,
	/// Present when two or more sources were queried.
	pub comparison: Option<ComparisonReport>,
}

impl Inspection {
	/// Whether any source failed for a reason other than pending.
	pub fn has_error(&self) -> bool {
		self.views.iter().any(|v| !v.ok && !v.is_pending())
	}

	pub fn has_pending(&self) -> bool {
		self.views.iter().any(TxView::is_pending)
	}

	pub fn has_mismatch(&self) -> bool {
		self.comparison
			.as_ref()
			.is_some_and(ComparisonReport::has_mismatch)
	}
}

/// Holds the sources and policy for one run.
pub struct InspectionEngine {
	sources: Vec<LabeledSource>,
	policy: BatchPolicy,
	concurrency: usize,
}

impl InspectionEngine {
	pub fn new(sources: Vec<LabeledSource>, policy: BatchPolicy, concurrency: usize) -> Self {
		Self {
			sources,
			policy,
			concurrency,
		}
	}

	pub fn sources(&self) -> &[LabeledSource] {
		&self.sources
	}

	pub fn policy(&self) -> &BatchPolicy {
		&self.policy
	}

	/// Queries every source concurrently and reconciles the views.
	pub async fn inspect(&self, hash: &TransactionHash) -> Inspection {
		tracing::info!(
			tx_hash = %truncate_hash(&hash.to_string()),
			sources = self.sources.len(),
			"Inspecting transaction"
		);

		let views = join_all(self.sources.iter().map(|s| s.view(hash))).await;
		let comparison = (views.len() >= 2).then(|| reconcile(&views));

		if let Some(report) = comparison.as_ref().filter(|r| r.has_mismatch()) {
			tracing::warn!(
				tx_hash = %truncate_hash(&hash.to_string()),
				fields = ?report.mismatched_fields(),
				"Sources disagree"
			);
		}

		Inspection {
			tx_hash: *hash,
			views,
			comparison,
		}
	}

	/// Normalizes `inputs` and evaluates each unique hash against the first
	/// source.
	pub async fn batch<I, S>(&self, inputs: I) -> Result<BatchReport, CoreError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let primary = self.sources.first().ok_or(CoreError::NoSources)?;
		if self.sources.len() > 1 {
			tracing::warn!(
				source = %primary.label,
				"Batch mode uses only the first source"
			);
		}

		let normalized = normalize_hashes(inputs);
		for rejected in &normalized.rejected {
			tracing::warn!(input = %rejected.input, reason = %rejected.reason, "Skipping invalid hash");
		}

		let results = match &primary.slot {
			SourceSlot::Ready(source) => {
				BatchRunner::new(&primary.label, source.as_ref(), &self.policy, self.concurrency)
					.run(&normalized.hashes)
					.await
			},
			SourceSlot::Unavailable { endpoint, reason } => normalized
				.hashes
				.iter()
				.map(|hash| {
					crate::batch::evaluate(
						*hash,
						primary.unavailable_view(endpoint, reason),
						&self.policy,
					)
				})
				.collect(),
		};

		tracing::info!(
			total = results.len(),
			rejected = normalized.rejected.len(),
			"Batch complete"
		);

		Ok(BatchReport {
			policy: self.policy.clone(),
			rejected: normalized.rejected,
			results,
		})
	}
}

/// Builds an [`InspectionEngine`] from configuration and source factories.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds every configured source.
	///
	/// Unknown implementation names are configuration errors. A source whose
	/// factory fails is kept as unavailable so the remaining sources still run.
	pub fn build(
		self,
		factories: &HashMap<String, SourceFactory>,
	) -> Result<InspectionEngine, CoreError> {
		self.config
			.validate()
			.map_err(|e| CoreError::Config(e.to_string()))?;
		if self.config.sources.is_empty() {
			return Err(CoreError::NoSources);
		}

		let settings = SourceSettings {
			timeout: self.config.inspector.timeout(),
		};
		let policy = self
			.config
			.policy
			.to_batch_policy()
			.map_err(|e| CoreError::Config(e.to_string()))?;

		let mut sources = Vec::with_capacity(self.config.sources.len());
		for source in &self.config.sources {
			let factory = factories.get(&source.implementation).ok_or_else(|| {
				CoreError::UnknownImplementation {
					label: source.label.clone(),
					implementation: source.implementation.clone(),
				}
			})?;

			let slot = match factory(&source.config, &settings) {
				Ok(implementation) => {
					tracing::info!(
						component = "source",
						label = %source.label,
						implementation = %source.implementation,
						endpoint = %implementation.endpoint(),
						"Loaded"
					);
					SourceSlot::Ready(Arc::from(implementation))
				},
				Err(e) => {
					let endpoint = configured_endpoint(&source.config)
						.unwrap_or_else(|| source.implementation.clone());
					tracing::error!(
						component = "source",
						label = %source.label,
						implementation = %source.implementation,
						error = %e,
						"Failed to create source"
					);
					SourceSlot::Unavailable {
						endpoint,
						reason: e.to_string(),
					}
				},
			};

			sources.push(LabeledSource {
				label: source.label.clone(),
				slot,
			});
		}

		Ok(InspectionEngine::new(
			sources,
			policy,
			self.config.inspector.concurrency,
		))
	}
}

fn configured_endpoint(config: &toml::Value) -> Option<String> {
	["rpc_url", "base_url", "endpoint"]
		.iter()
		.find_map(|key| config.get(*key).and_then(|v| v.as_str()))
		.map(redact_endpoint)
}
