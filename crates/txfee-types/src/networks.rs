//! Well-known chain identifiers and explorer endpoints.

/// Human readable names for chains the tool is commonly pointed at.
const CHAIN_NAMES: &[(u64, &str)] = &[
	(1, "Ethereum Mainnet"),
	(5, "Goerli"),
	(10, "Optimism"),
	(137, "Polygon"),
	(8453, "Base"),
	(42161, "Arbitrum One"),
	(11155111, "Sepolia"),
];

/// Etherscan API base URLs keyed by network name.
const ETHERSCAN_APIS: &[(&str, u64, &str)] = &[
	("mainnet", 1, "https://api.etherscan.io/api"),
	("goerli", 5, "https://api-goerli.etherscan.io/api"),
	("sepolia", 11155111, "https://api-sepolia.etherscan.io/api"),
];

/// Returns the display name for a chain id, if known.
pub fn chain_name(chain_id: u64) -> Option<&'static str> {
	CHAIN_NAMES
		.iter()
		.find(|(id, _)| *id == chain_id)
		.map(|(_, name)| *name)
}

/// Formats a chain id with its name, e.g. `1 (Ethereum Mainnet)`.
pub fn describe_chain(chain_id: u64) -> String {
	match chain_name(chain_id) {
		Some(name) => format!("{} ({})", chain_id, name),
		None => chain_id.to_string(),
	}
}

/// Explorer network known to the Etherscan source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EtherscanNetwork {
	pub name: &'static str,
	pub chain_id: u64,
	pub api_url: &'static str,
}

/// Looks up an Etherscan network by name (case insensitive).
pub fn etherscan_network(name: &str) -> Option<EtherscanNetwork> {
	let wanted = name.trim().to_ascii_lowercase();
	ETHERSCAN_APIS
		.iter()
		.find(|(n, _, _)| *n == wanted)
		.map(|(name, chain_id, api_url)| EtherscanNetwork {
			name,
			chain_id: *chain_id,
			api_url,
		})
}

/// Names accepted by [`etherscan_network`].
pub fn etherscan_network_names() -> impl Iterator<Item = &'static str> {
	ETHERSCAN_APIS.iter().map(|(name, _, _)| *name)
}
