//! Registry of source implementations available to the binary.
//!
//! Implementations are registered once from `txfee_source` and looked up by
//! the names used in configuration files.

use std::collections::HashMap;
use std::sync::OnceLock;
use txfee_config::Config;
use txfee_core::{EngineBuilder, InspectionEngine};
use txfee_source::SourceFactory;

/// Global registry for all source factories
pub struct FactoryRegistry {
	pub sources: HashMap<String, SourceFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			sources: HashMap::new(),
		}
	}

	/// Register a source implementation
	pub fn register_source(&mut self, name: impl Into<String>, factory: SourceFactory) {
		self.sources.insert(name.into(), factory);
	}

	/// Registered names, sorted for stable messages.
	pub fn available(&self) -> Vec<&str> {
		let mut names: Vec<_> = self.sources.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Initialize the global registry with all available implementations
pub fn initialize_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in txfee_source::get_all_implementations() {
			tracing::debug!("Registering source implementation: {}", name);
			registry.register_source(name, factory);
		}

		registry
	})
}

/// Get the global factory registry
pub fn get_registry() -> &'static FactoryRegistry {
	initialize_registry()
}

/// Builds the inspection engine for `config` using the registered sources.
pub fn build_engine_from_config(
	config: Config,
) -> Result<InspectionEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	for source in &config.sources {
		if !registry.sources.contains_key(&source.implementation) {
			return Err(format!(
				"Unknown source implementation '{}' for '{}'. Available: [{}]",
				source.implementation,
				source.label,
				registry.available().join(", ")
			)
			.into());
		}
	}

	Ok(EngineBuilder::new(config).build(&registry.sources)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_contains_all_sources() {
		let registry = get_registry();
		assert_eq!(registry.available(), vec!["etherscan", "evm_alloy", "mock"]);
	}

	#[test]
	fn test_unknown_implementation_lists_available() {
		let config: Config = "[[sources]]\nlabel = \"a\"\nimplementation = \"ipc\""
			.parse()
			.unwrap();
		let err = build_engine_from_config(config).err().unwrap();
		let message = err.to_string();
		assert!(message.contains("'ipc'"));
		assert!(message.contains("etherscan, evm_alloy, mock"));
	}

	#[test]
	fn test_builds_mock_engine() {
		let config: Config = "[[sources]]\nlabel = \"a\"\nimplementation = \"mock\""
			.parse()
			.unwrap();
		let engine = build_engine_from_config(config).unwrap();
		assert_eq!(engine.sources().len(), 1);
		assert_eq!(engine.sources()[0].endpoint(), "mock://local");
	}
}
