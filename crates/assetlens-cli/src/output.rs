//! Run summary rendering

use assetlens_pipeline::{PersistMode, RunSummary};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render a finished run for the terminal
pub fn format_summary(summary: &RunSummary, mode: PersistMode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fetched:    {}", summary.fetched);
    let _ = writeln!(out, "Passes:     {}", summary.passes);
    let _ = writeln!(out, "Queries:    {}", summary.queries);
    let _ = writeln!(out, "Extracted:  {}", summary.extracted);

    match mode {
        PersistMode::None => {
            let _ = writeln!(out, "Persisted:  none (report only)");
        }
        PersistMode::Direct => {
            let _ = writeln!(
                out,
                "Persisted:  {} updated, {} unchanged",
                summary.persisted.updated, summary.persisted.unchanged
            );
        }
        PersistMode::Upload => {
            let file = summary
                .persisted
                .upload_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "no file written".to_string());
            let _ = writeln!(
                out,
                "Persisted:  {} upload rows ({})",
                summary.persisted.upload_rows, file
            );
        }
    }

    let _ = writeln!(out, "Errors:     {}", summary.errors.len());
    let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
    for entry in &summary.errors {
        *by_kind.entry(entry.kind.as_str()).or_default() += 1;
    }
    for (kind, count) in by_kind {
        let _ = writeln!(out, "  {:<20}{}", kind, count);
    }

    let _ = writeln!(out, "Successes:  {}", summary.reports.success.display());
    let _ = write!(out, "Failures:   {}", summary.reports.error.display());
    out
}
