//! Human-readable and JSON rendering of inspection and batch results.
//!
//! Wei amounts always appear as exact integers; ether and gwei renderings are
//! added next to them for reading.

use serde::Serialize;
use std::time::Duration;
use txfee_core::Inspection;
use txfee_types::{
	chain_name, format_eth, format_gwei, truncate_hash, utils::format_elapsed,
	utils::format_timestamp, BatchPolicyResult, BatchReport, ComparedField, TxView, Verdict,
	U256,
};

/// Presentation switches shared by all text renderers.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
	/// Use emoji markers instead of bracketed ASCII ones.
	pub emoji: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
	Ok,
	Warn,
	Err,
	Pending,
}

impl Mark {
	fn render(self, options: RenderOptions) -> &'static str {
		match (self, options.emoji) {
			(Mark::Ok, true) => "✅",
			(Mark::Warn, true) => "⚠️",
			(Mark::Err, true) => "❌",
			(Mark::Pending, true) => "⏳",
			(Mark::Ok, false) => "[OK]",
			(Mark::Warn, false) => "[WARN]",
			(Mark::Err, false) => "[ERR]",
			(Mark::Pending, false) => "PENDING:",
		}
	}

	fn for_view(view: &TxView) -> Self {
		if view.is_pending() {
			Mark::Pending
		} else if !view.ok {
			Mark::Err
		} else if view.succeeded() == Some(false) {
			Mark::Warn
		} else {
			Mark::Ok
		}
	}
}

#[derive(Serialize)]
struct InspectionOutput<'a> {
	#[serde(flatten)]
	inspection: &'a Inspection,
	elapsed_ms: u64,
}

#[derive(Serialize)]
struct BatchOutput<'a> {
	#[serde(flatten)]
	report: &'a BatchReport,
	failures: usize,
	elapsed_ms: u64,
}

/// Pretty JSON for a single-hash inspection.
pub fn inspection_json(inspection: &Inspection, elapsed: Duration) -> serde_json::Result<String> {
	serde_json::to_string_pretty(&InspectionOutput {
		inspection,
		elapsed_ms: elapsed.as_millis() as u64,
	})
}

/// Pretty JSON for a batch run.
pub fn batch_json(report: &BatchReport, elapsed: Duration) -> serde_json::Result<String> {
	serde_json::to_string_pretty(&BatchOutput {
		report,
		failures: report.failure_count(),
		elapsed_ms: elapsed.as_millis() as u64,
	})
}

/// Header line naming the chain, e.g. `chainId 1, Ethereum Mainnet`.
pub fn chain_header(chain_id: Option<u64>) -> String {
	match chain_id {
		Some(id) => format!("chainId {}, {}", id, chain_name(id).unwrap_or("Unknown network")),
		None => "chainId unknown".to_string(),
	}
}

/// Full report: one row per field across all sources, then source status and
/// notes.
pub fn inspection_table(inspection: &Inspection, elapsed: Duration, options: RenderOptions) -> String {
	let views = &inspection.views;
	let mut out = String::new();

	out.push_str(&format!("Transaction {}\n", inspection.tx_hash));
	out.push_str(&chain_header(views.iter().find(|v| v.ok).and_then(|v| v.chain_id)));
	out.push_str("\n\n");

	let mut header = vec!["field".to_string()];
	header.extend(views.iter().map(|v| v.source_label.clone()));
	if inspection.comparison.is_some() {
		header.push("verdict".to_string());
	}

	let mut rows = Vec::new();
	for field in ComparedField::ALL {
		let mut row = vec![field.as_str().to_string()];
		row.extend(views.iter().map(|v| field_cell(v, field)));
		if let Some(report) = &inspection.comparison {
			row.push(verdict_cell(report.verdict(field), options));
		}
		rows.push(row);
	}

	let detail_rows: [(&str, fn(&TxView) -> Option<String>); 9] = [
		("confirmations", |v| v.confirmations.map(|c| c.to_string())),
		("gas_price_source", |v| {
			v.gas_price_source
				.map(|s| format!("{:?}", s).to_lowercase())
		}),
		("from", |v| v.details.from.map(|a| a.to_string())),
		("to", |v| {
			v.ok.then(|| {
				v.details
					.to
					.map(|a| a.to_string())
					.unwrap_or_else(|| "(contract creation)".to_string())
			})
		}),
		("contract_address", |v| v.details.contract_address.map(|a| a.to_string())),
		("nonce", |v| v.details.nonce.map(|n| n.to_string())),
		("gas_limit", |v| v.details.gas_limit.map(|n| n.to_string())),
		("value", |v| {
			v.details
				.value_wei
				.map(|w| format!("{} ETH", format_eth(Some(w))))
		}),
		("timestamp", |v| v.details.block_timestamp.and_then(format_timestamp)),
	];
	for (name, extract) in detail_rows {
		if views.iter().all(|v| extract(v).is_none()) {
			continue;
		}
		let mut row = vec![name.to_string()];
		row.extend(views.iter().map(|v| extract(v).unwrap_or_else(|| "-".to_string())));
		if inspection.comparison.is_some() {
			row.push(String::new());
		}
		rows.push(row);
	}

	out.push_str(&render_table(&header, &rows));
	out.push('\n');

	out.push_str("Sources\n");
	for view in views {
		out.push_str(&format!("  {}\n", source_line(view, options)));
	}

	let notes = notes(inspection, options);
	if !notes.is_empty() {
		out.push_str("\nNotes\n");
		for note in notes {
			out.push_str(&format!("  {}\n", note));
		}
	}

	out.push_str(&format!("\nCompleted in {}\n", format_elapsed(elapsed)));
	out
}

/// One line per source, plus a mismatch line when sources disagree.
pub fn inspection_short(inspection: &Inspection, options: RenderOptions) -> String {
	let mut out = String::new();
	for view in &inspection.views {
		out.push_str(&source_summary(view, options));
		out.push('\n');
	}
	if let Some(report) = inspection.comparison.as_ref().filter(|r| r.has_mismatch()) {
		let fields: Vec<_> = report
			.mismatched_fields()
			.iter()
			.map(ComparedField::as_str)
			.collect();
		out.push_str(&format!(
			"{} mismatch: {}\n",
			Mark::Warn.render(options),
			fields.join(", ")
		));
	}
	out
}

/// Batch rows, invalid inputs and a summary line. `short` drops the table
/// layout and prints one line per hash.
pub fn batch_text(
	report: &BatchReport,
	elapsed: Duration,
	options: RenderOptions,
	short: bool,
) -> String {
	let mut out = String::new();

	if short {
		for result in &report.results {
			out.push_str(&format!(
				"{} {} {}\n",
				batch_mark(result, report).render(options),
				result.tx_hash,
				batch_note(result, report)
			));
		}
	} else {
		let header: Vec<String> = ["", "tx", "block", "confirmations", "fee (ETH)", "result"]
			.iter()
			.map(|s| s.to_string())
			.collect();
		let rows: Vec<Vec<String>> = report
			.results
			.iter()
			.map(|result| {
				let view = &result.view;
				vec![
					batch_mark(result, report).render(options).to_string(),
					truncate_hash(&result.tx_hash.to_string()),
					opt(view.block_number),
					opt(view.confirmations),
					format_eth(view.total_fee_wei),
					batch_note(result, report),
				]
			})
			.collect();
		if !rows.is_empty() {
			out.push_str(&render_table(&header, &rows));
		}
	}

	for rejected in &report.rejected {
		out.push_str(&format!(
			"{} {} \"{}\": {}\n",
			Mark::Err.render(options),
			rejected.error_kind,
			rejected.input,
			rejected.reason
		));
	}

	out.push_str(&format!(
		"\n{} checked, {} failed, {} invalid in {}\n",
		report.results.len(),
		report.failure_count() - report.rejected.len(),
		report.rejected.len(),
		format_elapsed(elapsed)
	));
	out
}

fn field_cell(view: &TxView, field: ComparedField) -> String {
	match field {
		ComparedField::ChainId => opt(view.chain_id),
		ComparedField::BlockNumber => opt(view.block_number),
		ComparedField::Status => match view.status {
			Some(1) => "1 (success)".to_string(),
			Some(0) => "0 (reverted)".to_string(),
			Some(other) => other.to_string(),
			None => "-".to_string(),
		},
		ComparedField::GasUsed => opt(view.gas_used),
		ComparedField::GasPriceWei => wei_cell(view.gas_price_wei, |w| {
			format!("{} gwei", format_gwei(Some(w)))
		}),
		ComparedField::TotalFeeWei => wei_cell(view.total_fee_wei, |w| {
			format!("{} ETH", format_eth(Some(w)))
		}),
	}
}

fn wei_cell(wei: Option<U256>, display: impl Fn(U256) -> String) -> String {
	match wei {
		Some(w) => format!("{} ({})", w, display(w)),
		None => "-".to_string(),
	}
}

fn verdict_cell(verdict: Verdict, options: RenderOptions) -> String {
	match verdict {
		Verdict::Match => "match".to_string(),
		Verdict::Mismatch => format!("{} MISMATCH", Mark::Warn.render(options)),
		Verdict::Neutral => "neutral".to_string(),
	}
}

fn opt<T: ToString>(value: Option<T>) -> String {
	value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn source_line(view: &TxView, options: RenderOptions) -> String {
	let endpoint = view.endpoint.as_deref().unwrap_or("-");
	let mark = Mark::for_view(view).render(options);
	match (&view.error_kind, &view.error_message) {
		(Some(kind), Some(message)) => {
			format!("{} {} ({}): {}: {}", mark, view.source_label, endpoint, kind, message)
		},
		(Some(kind), None) => format!("{} {} ({}): {}", mark, view.source_label, endpoint, kind),
		_ => format!("{} {} ({})", mark, view.source_label, endpoint),
	}
}

fn source_summary(view: &TxView, options: RenderOptions) -> String {
	let mark = Mark::for_view(view).render(options);
	if !view.ok {
		let kind = view.error_kind.map(|k| k.as_str()).unwrap_or("error");
		return match &view.error_message {
			Some(message) => format!("{} {}: {}: {}", mark, view.source_label, kind, message),
			None => format!("{} {}: {}", mark, view.source_label, kind),
		};
	}

	let status = match view.succeeded() {
		Some(true) => "success",
		Some(false) => "reverted",
		None => "status unknown",
	};
	format!(
		"{} {}: block {}, {}, fee {} ETH, gas price {} gwei, {} confirmations",
		mark,
		view.source_label,
		opt(view.block_number),
		status,
		format_eth(view.total_fee_wei),
		format_gwei(view.gas_price_wei),
		opt(view.confirmations)
	)
}

fn notes(inspection: &Inspection, options: RenderOptions) -> Vec<String> {
	let mut notes = Vec::new();
	let Some(report) = &inspection.comparison else {
		return notes;
	};

	if !report.is_comparable() {
		notes.push(format!(
			"{} fewer than two sources returned data; fields were not compared",
			Mark::Warn.render(options)
		));
	}
	let mismatched = report.mismatched_fields();
	if !mismatched.is_empty() {
		let fields: Vec<_> = mismatched.iter().map(ComparedField::as_str).collect();
		notes.push(format!(
			"{} sources disagree on: {}",
			Mark::Warn.render(options),
			fields.join(", ")
		));
	}
	for (field, advisory) in report.advisories() {
		notes.push(format!("{}: {}", field, advisory));
	}
	notes
}

fn batch_mark(result: &BatchPolicyResult, report: &BatchReport) -> Mark {
	if result.view.is_pending() && !report.policy.fail_on_pending {
		Mark::Pending
	} else if result.is_failure(&report.policy) {
		Mark::Err
	} else if result.confirmations_unknown || result.view.succeeded() == Some(false) {
		Mark::Warn
	} else {
		Mark::Ok
	}
}

fn batch_note(result: &BatchPolicyResult, report: &BatchReport) -> String {
	let view = &result.view;
	if !view.ok {
		let kind = view.error_kind.map(|k| k.as_str()).unwrap_or("error");
		return match &view.error_message {
			Some(message) => format!("{}: {}", kind, message),
			None => kind.to_string(),
		};
	}

	let mut notes = Vec::new();
	if !result.confirmations_satisfied {
		notes.push(format!(
			"below {} confirmations",
			report.policy.min_confirmations
		));
	}
	if result.confirmations_unknown {
		notes.push("confirmations unknown".to_string());
	}
	if result.fee_violation {
		notes.push(format!(
			"fee above max {} ETH",
			format_eth(report.policy.max_fee_wei)
		));
	}
	if view.succeeded() == Some(false) {
		notes.push("reverted".to_string());
	}
	if notes.is_empty() {
		"ok".to_string()
	} else {
		notes.join("; ")
	}
}

fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
	let columns = header.len();
	let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
	for row in rows {
		for (i, cell) in row.iter().enumerate().take(columns) {
			widths[i] = widths[i].max(cell.chars().count());
		}
	}

	let format_row = |cells: &[String]| {
		let line = cells
			.iter()
			.enumerate()
			.map(|(i, cell)| {
				let pad = widths[i].saturating_sub(cell.chars().count());
				format!("{}{}", cell, " ".repeat(pad))
			})
			.collect::<Vec<_>>()
			.join("  ");
		format!("{}\n", line.trim_end())
	};

	let mut out = format_row(header);
	let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
	out.push_str(&format_row(&rule));
	for row in rows {
		out.push_str(&format_row(row));
	}
	out
}
