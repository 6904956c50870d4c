// ABOUTME: Classifies ranked table sizes against an oversize threshold
// ABOUTME: Produces the human-readable findings printed by the analyze mode

use crate::mysql::inspector::{SizeReportEntry, TableStructure};

/// Tables larger than this many megabytes are reported as oversized.
pub const DEFAULT_THRESHOLD_MB: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SizeFinding {
    pub entry: SizeReportEntry,
    pub oversized: bool,
}

/// Flag every entry strictly larger than `threshold_mb`.
///
/// The input order (largest first) is kept for reporting.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::analyze::classify;
/// # use mysql_dump_curator::mysql::inspector::SizeReportEntry;
/// let ranked = vec![
///     SizeReportEntry { table_name: "events".into(), size_mb: 300.5 },
///     SizeReportEntry { table_name: "users".into(), size_mb: 42.0 },
/// ];
/// let findings = classify(ranked, 100.0);
/// assert!(findings[0].oversized);
/// assert!(!findings[1].oversized);
/// ```
pub fn classify(ranked: Vec<SizeReportEntry>, threshold_mb: f64) -> Vec<SizeFinding> {
    ranked
        .into_iter()
        .map(|entry| SizeFinding {
            oversized: entry.size_mb > threshold_mb,
            entry,
        })
        .collect()
}

/// Message for an oversized table, followed by its column structure.
pub fn oversized_message(entry: &SizeReportEntry, structure: &TableStructure) -> String {
    format!(
        "{} is {:.2} mb! Figure out a way to make it smaller.\n{}",
        entry.table_name, entry.size_mb, structure
    )
}

pub fn acceptable_message(entry: &SizeReportEntry) -> String {
    format!(
        "{} is only {:.2} mb - no problem.",
        entry.table_name, entry.size_mb
    )
}
