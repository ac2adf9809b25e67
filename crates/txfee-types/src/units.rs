//! Wei amounts: parsing thresholds and rendering for display.
//!
//! All arithmetic is integer arithmetic on `U256`; ether and gwei renderings
//! are produced by decimal scaling and only rounded at display precision.

use alloy_primitives::utils::parse_units;
use alloy_primitives::U256;
use thiserror::Error;

/// Decimals of the principal unit.
pub const ETHER_DECIMALS: u8 = 18;
/// Decimals of gwei relative to wei.
pub const GWEI_DECIMALS: u8 = 9;

/// Errors that can occur while parsing a wei amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
	#[error("amount is empty")]
	Empty,
	#[error("amount '{0}' must not be negative")]
	Negative(String),
	#[error("unknown unit '{0}' (expected wei, gwei or ether)")]
	UnknownUnit(String),
	#[error("invalid amount '{input}': {reason}")]
	Invalid { input: String, reason: String },
}

/// Display units for wei values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayUnit {
	Wei,
	Gwei,
	Ether,
}

impl DisplayUnit {
	pub fn decimals(&self) -> u8 {
		match self {
			DisplayUnit::Wei => 0,
			DisplayUnit::Gwei => GWEI_DECIMALS,
			DisplayUnit::Ether => ETHER_DECIMALS,
		}
	}

	pub fn symbol(&self) -> &'static str {
		match self {
			DisplayUnit::Wei => "wei",
			DisplayUnit::Gwei => "Gwei",
			DisplayUnit::Ether => "ETH",
		}
	}
}

/// Parses an amount such as `0.01`, `0.01 ether`, `25gwei` or `1000 wei`.
///
/// A bare number is interpreted as ether. The conversion is exact; amounts
/// with more fractional digits than the unit allows are rejected.
pub fn parse_wei_amount(input: &str) -> Result<U256, AmountError> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(AmountError::Empty);
	}
	if trimmed.starts_with('-') {
		return Err(AmountError::Negative(trimmed.to_string()));
	}

	let split = trimmed
		.find(|c: char| c.is_ascii_alphabetic())
		.unwrap_or(trimmed.len());
	let (number, unit) = trimmed.split_at(split);
	let number = number.trim();
	let unit = match unit.trim().to_ascii_lowercase().as_str() {
		"" | "eth" | "ether" => DisplayUnit::Ether,
		"gwei" => DisplayUnit::Gwei,
		"wei" => DisplayUnit::Wei,
		other => return Err(AmountError::UnknownUnit(other.to_string())),
	};

	if number.is_empty() {
		return Err(AmountError::Invalid {
			input: trimmed.to_string(),
			reason: "missing number".to_string(),
		});
	}

	let fraction_digits = number
		.split_once('.')
		.map(|(_, fraction)| fraction.len())
		.unwrap_or(0);
	if fraction_digits > unit.decimals() as usize {
		return Err(AmountError::Invalid {
			input: trimmed.to_string(),
			reason: format!(
				"{} allows at most {} fractional digits",
				unit.symbol(),
				unit.decimals()
			),
		});
	}

	parse_units(number, unit.decimals())
		.map(|parsed| parsed.get_absolute())
		.map_err(|e| AmountError::Invalid {
			input: trimmed.to_string(),
			reason: e.to_string(),
		})
}

/// Renders `wei` in `unit` with exactly `precision` fractional digits,
/// rounding half up at the last displayed digit.
pub fn format_wei(wei: U256, unit: DisplayUnit, precision: usize) -> String {
	let decimals = unit.decimals() as usize;
	if decimals == 0 {
		return wei.to_string();
	}

	let divisor = U256::from(10u64).pow(U256::from(decimals));
	let scale = U256::from(10u64).pow(U256::from(precision));
	let scaled = match wei.checked_mul(scale) {
		Some(v) => v,
		None => return format!("{}", wei / divisor),
	};

	let (mut quotient, remainder) = scaled.div_rem(divisor);
	if remainder * U256::from(2u64) >= divisor {
		quotient += U256::from(1u64);
	}

	let digits = quotient.to_string();
	if precision == 0 {
		return digits;
	}
	let padded = format!("{:0>width$}", digits, width = precision + 1);
	let (integer, fraction) = padded.split_at(padded.len() - precision);
	format!("{}.{}", integer, fraction)
}

/// Ether with six decimals, or `-` when absent.
pub fn format_eth(wei: Option<U256>) -> String {
	wei.map(|w| format_wei(w, DisplayUnit::Ether, 6))
		.unwrap_or_else(|| "-".to_string())
}

/// Gwei with two decimals, or `-` when absent.
pub fn format_gwei(wei: Option<U256>) -> String {
	wei.map(|w| format_wei(w, DisplayUnit::Gwei, 2))
		.unwrap_or_else(|| "-".to_string())
}
