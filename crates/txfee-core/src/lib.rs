//! Core logic of the transaction fee inspector.
//!
//! Builds one fee view per source, reconciles views across sources, and
//! evaluates batch policies. All network access goes through
//! `txfee_source::SourceInterface`.

use thiserror::Error;

pub mod batch;
pub mod engine;
pub mod fee_view;
pub mod reconcile;

#[cfg(test)]
mod test_fixtures;

pub use batch::{evaluate, BatchRunner};
pub use engine::{EngineBuilder, Inspection, InspectionEngine, LabeledSource, SourceSlot};
pub use fee_view::{confirmations, resolve_gas_price, total_fee, FeeViewBuilder};
pub use reconcile::reconcile;

/// Errors that prevent a run from starting.
///
/// Failures of individual sources are never reported here; they are folded
/// into the affected views.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Source '{label}' uses unknown implementation '{implementation}'")]
	UnknownImplementation {
		label: String,
		implementation: String,
	},
	#[error("No data sources configured")]
	NoSources,
}
