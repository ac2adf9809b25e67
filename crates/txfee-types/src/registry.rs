//! Registry trait for self-registering source implementations.

/// Base trait for implementation registries.
///
/// Every source implementation module exposes a `Registry` struct that
/// implements this trait, tying the name used in `[[sources]]` entries to the
/// factory that builds it.
pub trait ImplementationRegistry {
	/// Name referenced by `implementation = "..."` in configuration,
	/// for example "evm_alloy", "etherscan" or "mock".
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory for this implementation.
	fn factory() -> Self::Factory;
}
