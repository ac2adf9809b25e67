//! Cross-source reconciliation.
//!
//! [`reconcile`] is a pure function over views of one hash. Only `ok` views
//! take part. A field gets a `match` or `mismatch` verdict only when at least
//! two of those views carry a value for it; otherwise it is `neutral`.

use txfee_types::{
	ComparedField, ComparisonReport, FieldComparison, FieldObservation, TxView, Verdict,
};

/// Advisory attached to fee fields when sources agree on the chain but not
/// on the price.
pub const EIP1559_ADVISORY: &str =
	"expected under EIP-1559 viewing differences: sources on the same chain report different gas prices";

fn field_value(view: &TxView, field: ComparedField) -> Option<String> {
	match field {
		ComparedField::ChainId => view.chain_id.map(|v| v.to_string()),
		ComparedField::BlockNumber => view.block_number.map(|v| v.to_string()),
		ComparedField::Status => view.status.map(|v| v.to_string()),
		ComparedField::GasUsed => view.gas_used.map(|v| v.to_string()),
		ComparedField::GasPriceWei => view.gas_price_wei.map(|v| v.to_string()),
		ComparedField::TotalFeeWei => view.total_fee_wei.map(|v| v.to_string()),
	}
}

fn compare_field(ok_views: &[&TxView], field: ComparedField) -> FieldComparison {
	let observations: Vec<FieldObservation> = ok_views
		.iter()
		.map(|view| FieldObservation {
			source_label: view.source_label.clone(),
			value: field_value(view, field),
		})
		.collect();

	let present: Vec<&str> = observations
		.iter()
		.filter_map(|o| o.value.as_deref())
		.collect();

	let verdict = match present.split_first() {
		_ if ok_views.len() < 2 || present.len() < 2 => Verdict::Neutral,
		Some((first, rest)) if rest.iter().all(|v| v == first) => Verdict::Match,
		_ => Verdict::Mismatch,
	};

	FieldComparison {
		field,
		verdict,
		observations,
		advisory: None,
	}
}

/// Compares views of the same transaction field by field.
///
/// The order of `views` only affects the order of observations; verdicts are
/// independent of it.
pub fn reconcile(views: &[TxView]) -> ComparisonReport {
	let ok_views: Vec<&TxView> = views.iter().filter(|v| v.ok).collect();

	let mut fields: Vec<FieldComparison> = ComparedField::ALL
		.iter()
		.map(|field| compare_field(&ok_views, *field))
		.collect();

	let verdict_of = |fields: &[FieldComparison], field: ComparedField| {
		fields
			.iter()
			.find(|c| c.field == field)
			.map(|c| c.verdict)
			.unwrap_or(Verdict::Neutral)
	};

	if verdict_of(&fields, ComparedField::ChainId) == Verdict::Match
		&& verdict_of(&fields, ComparedField::GasPriceWei) == Verdict::Mismatch
	{
		for comparison in fields.iter_mut().filter(|c| {
			matches!(c.field, ComparedField::GasPriceWei | ComparedField::TotalFeeWei)
				&& c.verdict == Verdict::Mismatch
		}) {
			comparison.advisory = Some(EIP1559_ADVISORY.to_string());
		}
	}

	ComparisonReport {
		compared_sources: ok_views.len(),
		fields,
	}
}
