//! Transaction hash canonicalization.
//!
//! Every transaction identifier that enters the system passes through
//! [`TransactionHash::normalize`], which produces the canonical form: a
//! lowercase, `0x`-prefixed, 66 character hex string. Raw user input is never
//! compared directly.

use crate::utils::without_0x_prefix;
use crate::view::ErrorKind;
use alloy_primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex characters in a 32-byte hash, excluding the prefix.
pub const HASH_HEX_LEN: usize = 64;

/// Reasons a transaction identifier can fail canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
	/// The input was empty after trimming whitespace.
	#[error("invalid transaction hash: input is empty")]
	Empty,
	/// The input does not contain exactly 64 hex characters.
	#[error(
		"invalid transaction hash '{input}': expected 0x + 64 hex characters, got {found} characters after the prefix"
	)]
	InvalidLength { input: String, found: usize },
	/// The input contains a character that is not a hex digit.
	#[error("invalid transaction hash '{input}': non-hex character '{character}' at position {position}")]
	InvalidCharacter {
		input: String,
		character: char,
		position: usize,
	},
}

/// A canonical 32-byte transaction hash.
///
/// Only constructible through [`TransactionHash::normalize`] (or its `FromStr`
/// and `Deserialize` impls, which delegate to it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionHash(B256);

impl TransactionHash {
	/// Canonicalizes an arbitrary identifier.
	///
	/// Surrounding whitespace is stripped and a missing `0x` prefix is added.
	/// The remainder must be exactly 64 hex digits in any letter case; the
	/// input is never truncated or padded.
	pub fn normalize(input: &str) -> Result<Self, HashError> {
		let trimmed = input.trim();
		if trimmed.is_empty() {
			return Err(HashError::Empty);
		}

		let digits = without_0x_prefix(trimmed);
		if let Some((position, character)) = digits
			.chars()
			.enumerate()
			.find(|(_, c)| !c.is_ascii_hexdigit())
		{
			return Err(HashError::InvalidCharacter {
				input: trimmed.to_string(),
				character,
				position: position + (trimmed.len() - digits.len()),
			});
		}
		if digits.len() != HASH_HEX_LEN {
			return Err(HashError::InvalidLength {
				input: trimmed.to_string(),
				found: digits.len(),
			});
		}

		let mut bytes = [0u8; 32];
		hex::decode_to_slice(digits, &mut bytes).map_err(|_| HashError::InvalidLength {
			input: trimmed.to_string(),
			found: digits.len(),
		})?;
		Ok(Self(B256::from(bytes)))
	}

	/// Returns the raw 32 bytes.
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0 .0
	}

	/// Returns the hash as an alloy `B256`.
	pub fn as_b256(&self) -> B256 {
		self.0
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

impl FromStr for TransactionHash {
	type Err = HashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::normalize(s)
	}
}

impl Serialize for TransactionHash {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for TransactionHash {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		Self::normalize(&raw).map_err(serde::de::Error::custom)
	}
}

/// An identifier that failed canonicalization, kept with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedHash {
	pub input: String,
	/// Always [`ErrorKind::InvalidHash`].
	pub error_kind: ErrorKind,
	pub reason: String,
}

impl RejectedHash {
	pub fn new(input: impl Into<String>, error: &HashError) -> Self {
		Self {
			input: input.into(),
			error_kind: ErrorKind::InvalidHash,
			reason: error.to_string(),
		}
	}
}

/// Result of canonicalizing and deduplicating a list of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedHashes {
	/// Unique canonical hashes in first-seen order.
	pub hashes: Vec<TransactionHash>,
	/// Inputs that failed canonicalization, in input order.
	pub rejected: Vec<RejectedHash>,
}

/// Canonicalizes every input and removes duplicates.
///
/// Duplicates are detected on the canonical form, so `0xAB..` and `ab..`
/// collapse to one entry. Blank inputs are skipped rather than rejected.
pub fn normalize_hashes<I, S>(inputs: I) -> NormalizedHashes
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut result = NormalizedHashes::default();

	for input in inputs {
		let raw = input.as_ref();
		if raw.trim().is_empty() {
			continue;
		}
		match TransactionHash::normalize(raw) {
			Ok(hash) => {
				if seen.insert(hash) {
					result.hashes.push(hash);
				}
			},
			Err(e) => result.rejected.push(RejectedHash::new(raw.trim(), &e)),
		}
	}

	result
}

#[cfg(test)]
mod tests {
	use super::*;

	const LOWER: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
	const UPPER: &str = "0x5C504ED432CB51138BCF09AA5E8A410DD4A1E204EF84BFED1BE16DFBA1B22060";

	#[test]
	fn test_normalize_canonical_is_idempotent() {
		let hash = TransactionHash::normalize(LOWER).unwrap();
		assert_eq!(hash.to_string(), LOWER);
		let again = TransactionHash::normalize(&hash.to_string()).unwrap();
		assert_eq!(again, hash);
	}

	#[test]
	fn test_normalize_case_prefix_and_whitespace() {
		let expected = TransactionHash::normalize(LOWER).unwrap();

		assert_eq!(TransactionHash::normalize(UPPER).unwrap(), expected);
		assert_eq!(TransactionHash::normalize(&LOWER[2..]).unwrap(), expected);
		assert_eq!(TransactionHash::normalize(&UPPER[2..]).unwrap(), expected);
		assert_eq!(
			TransactionHash::normalize(&format!("  {}\n", UPPER)).unwrap(),
			expected
		);
		assert_eq!(
			TransactionHash::normalize(&format!("0X{}", &UPPER[2..])).unwrap(),
			expected
		);
	}

	#[test]
	fn test_normalize_rejects_wrong_length() {
		let short = &LOWER[..64];
		match TransactionHash::normalize(short) {
			Err(HashError::InvalidLength { found, .. }) => assert_eq!(found, 62),
			other => panic!("unexpected result: {:?}", other),
		}

		let long = format!("{}00", LOWER);
		assert!(matches!(
			TransactionHash::normalize(&long),
			Err(HashError::InvalidLength { found: 66, .. })
		));
	}

	#[test]
	fn test_normalize_rejects_non_hex() {
		let bad = format!("0x{}zz", &LOWER[4..]);
		let err = TransactionHash::normalize(&bad).unwrap_err();
		assert!(matches!(
			err,
			HashError::InvalidCharacter {
				character: 'z',
				position: 64,
				..
			}
		));
		assert!(err.to_string().contains("non-hex character 'z'"));
	}

	#[test]
	fn test_normalize_rejects_empty() {
		assert_eq!(TransactionHash::normalize("   "), Err(HashError::Empty));
	}

	#[test]
	fn test_normalize_hashes_dedupes_on_canonical_form() {
		let aa = "aa".repeat(32);
		let inputs = vec![
			format!("0x{}", aa.to_uppercase()),
			format!("0x{}", aa),
			aa.to_uppercase(),
		];
		let result = normalize_hashes(&inputs);
		assert_eq!(result.hashes.len(), 1);
		assert_eq!(result.hashes[0].to_string(), format!("0x{}", aa));
		assert!(result.rejected.is_empty());
	}

	#[test]
	fn test_normalize_hashes_preserves_order_and_collects_rejects() {
		let inputs = vec![UPPER, "", "0x1234", LOWER, &LOWER[2..]];
		let other = format!("0x{}", "bb".repeat(32));
		let mut all: Vec<&str> = inputs.clone();
		all.insert(1, &other);

		let result = normalize_hashes(all);
		assert_eq!(
			result.hashes.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
			vec![LOWER.to_string(), other.clone()]
		);
		assert_eq!(result.rejected.len(), 1);
		assert_eq!(result.rejected[0].input, "0x1234");
		assert_eq!(result.rejected[0].error_kind, ErrorKind::InvalidHash);
	}

	#[test]
	fn test_serde_uses_canonical_string() {
		let hash: TransactionHash = serde_json::from_str(&format!("\"{}\"", UPPER)).unwrap();
		assert_eq!(serde_json::to_string(&hash).unwrap(), format!("\"{}\"", LOWER));
	}
}
