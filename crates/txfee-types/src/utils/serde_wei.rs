//! Serde helpers for wei amounts.
//!
//! Amounts are serialized as decimal strings so JSON consumers never lose
//! precision. Deserialization accepts decimal strings, `0x` hex strings and
//! plain JSON integers.

use alloy_primitives::U256;
use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;
use std::fmt;

struct WeiVisitor;

impl Visitor<'_> for WeiVisitor {
	type Value = U256;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("a decimal or 0x-prefixed hex wei amount")
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
		Ok(U256::from(v))
	}

	// TOML integers arrive as i64.
	fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
		u64::try_from(v)
			.map(U256::from)
			.map_err(|_| E::custom(format!("wei amount must not be negative: {}", v)))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
		parse_wei_str(v).map_err(E::custom)
	}
}

/// Parses a decimal or `0x` hex quantity.
pub fn parse_wei_str(value: &str) -> Result<U256, String> {
	let trimmed = value.trim();
	let parsed = match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some(hex) => U256::from_str_radix(hex, 16),
		None => U256::from_str_radix(trimmed, 10),
	};
	parsed.map_err(|e| format!("invalid wei amount '{}': {}", value, e))
}

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
	deserializer.deserialize_any(WeiVisitor)
}

/// Same encoding for `Option<U256>`, with `None` as `null`.
pub mod option {
	use super::WeiVisitor;
	use alloy_primitives::U256;
	use serde::de::{self, Deserializer, Visitor};
	use serde::Serializer;
	use std::fmt;

	pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
		match value {
			Some(v) => serializer.serialize_str(&v.to_string()),
			None => serializer.serialize_none(),
		}
	}

	struct OptionVisitor;

	impl<'de> Visitor<'de> for OptionVisitor {
		type Value = Option<U256>;

		fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
			f.write_str("null or a wei amount")
		}

		fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
			Ok(None)
		}

		fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
			Ok(None)
		}

		fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
			d.deserialize_any(WeiVisitor).map(Some)
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<U256>, D::Error> {
		deserializer.deserialize_option(OptionVisitor)
	}
}
