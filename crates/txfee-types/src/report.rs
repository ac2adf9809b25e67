//! Cross-source comparison report types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields compared across sources, in their fixed output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparedField {
	ChainId,
	BlockNumber,
	Status,
	GasUsed,
	GasPriceWei,
	TotalFeeWei,
}

impl ComparedField {
	/// All compared fields in stable output order.
	pub const ALL: [ComparedField; 6] = [
		ComparedField::ChainId,
		ComparedField::BlockNumber,
		ComparedField::Status,
		ComparedField::GasUsed,
		ComparedField::GasPriceWei,
		ComparedField::TotalFeeWei,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ComparedField::ChainId => "chain_id",
			ComparedField::BlockNumber => "block_number",
			ComparedField::Status => "status",
			ComparedField::GasUsed => "gas_used",
			ComparedField::GasPriceWei => "gas_price_wei",
			ComparedField::TotalFeeWei => "total_fee_wei",
		}
	}
}

impl fmt::Display for ComparedField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Outcome of comparing one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
	Match,
	Mismatch,
	/// Incomparable: fewer than two substantive observations.
	Neutral,
}

/// One source's value for a compared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldObservation {
	pub source_label: String,
	/// Decimal rendering of the value; `None` when the source had no value.
	pub value: Option<String>,
}

/// Verdict for a single field plus the values that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldComparison {
	pub field: ComparedField,
	pub verdict: Verdict,
	/// Values from the `ok` views that took part in the comparison.
	pub observations: Vec<FieldObservation>,
	/// Advisory annotation; never changes the verdict.
	pub advisory: Option<String>,
}

/// Field-by-field agreement report across two or more views of one hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
	/// Number of `ok` views that were compared.
	pub compared_sources: usize,
	pub fields: Vec<FieldComparison>,
}

impl ComparisonReport {
	/// Whether at least two substantive observations were available.
	pub fn is_comparable(&self) -> bool {
		self.compared_sources >= 2
	}

	/// Returns the verdict for a field.
	pub fn verdict(&self, field: ComparedField) -> Verdict {
		self.fields
			.iter()
			.find(|c| c.field == field)
			.map(|c| c.verdict)
			.unwrap_or(Verdict::Neutral)
	}

	/// Fields with a `mismatch` verdict, in output order.
	pub fn mismatched_fields(&self) -> Vec<ComparedField> {
		self.fields
			.iter()
			.filter(|c| c.verdict == Verdict::Mismatch)
			.map(|c| c.field)
			.collect()
	}

	pub fn has_mismatch(&self) -> bool {
		self.fields.iter().any(|c| c.verdict == Verdict::Mismatch)
	}

	/// Advisory notes attached to individual fields.
	pub fn advisories(&self) -> impl Iterator<Item = (ComparedField, &str)> {
		self.fields
			.iter()
			.filter_map(|c| c.advisory.as_deref().map(|a| (c.field, a)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn comparison(field: ComparedField, verdict: Verdict) -> FieldComparison {
		FieldComparison {
			field,
			verdict,
			observations: vec![],
			advisory: None,
		}
	}

	#[test]
	fn test_mismatched_fields_keep_output_order() {
		let report = ComparisonReport {
			compared_sources: 2,
			fields: vec![
				comparison(ComparedField::ChainId, Verdict::Match),
				comparison(ComparedField::GasPriceWei, Verdict::Mismatch),
				comparison(ComparedField::TotalFeeWei, Verdict::Mismatch),
			],
		};
		assert!(report.has_mismatch());
		assert_eq!(
			report.mismatched_fields(),
			vec![ComparedField::GasPriceWei, ComparedField::TotalFeeWei]
		);
		assert_eq!(report.verdict(ComparedField::Status), Verdict::Neutral);
	}

	#[test]
	fn test_field_names() {
		let names: Vec<_> = ComparedField::ALL.iter().map(|f| f.as_str()).collect();
		assert_eq!(
			names,
			vec![
				"chain_id",
				"block_number",
				"status",
				"gas_used",
				"gas_price_wei",
				"total_fee_wei"
			]
		);
	}
}
