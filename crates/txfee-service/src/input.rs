//! Loading transaction hashes for batch runs.

use std::path::Path;

/// Extracts hash entries from a newline-delimited list.
///
/// Blank lines and lines starting with `#` are skipped; everything else is
/// returned trimmed and unvalidated.
pub fn parse_hash_list(content: &str) -> Vec<String> {
	content
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect()
}

/// Collects `--tx` values followed by the entries of `file`, if any.
pub async fn load_hashes(tx: &[String], file: Option<&Path>) -> std::io::Result<Vec<String>> {
	let mut inputs = tx.to_vec();

	if let Some(path) = file {
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			std::io::Error::new(e.kind(), format!("Cannot read {}: {}", path.display(), e))
		})?;
		let entries = parse_hash_list(&content);
		tracing::debug!(path = %path.display(), entries = entries.len(), "Loaded hash file");
		inputs.extend(entries);
	}

	Ok(inputs)
}
