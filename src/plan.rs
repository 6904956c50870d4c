// ABOUTME: Builds the ordered dump plan from live tables and config overrides
// ABOUTME: Pure merge step; unconfigured tables get the dump-everything defaults

use crate::config::{Overrides, DEFAULT_ROW_FILTER};
use crate::mysql::inspector::{SchemaTable, TableKind};

/// Export instructions for one base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpItem {
    pub table_name: String,
    pub row_filter: String,
    pub extra_flags: String,
}

impl DumpItem {
    pub fn new(
        table_name: impl Into<String>,
        row_filter: impl Into<String>,
        extra_flags: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            row_filter: row_filter.into(),
            extra_flags: extra_flags.into(),
        }
    }

    /// Extra flags as individual command-line arguments.
    pub fn flag_args(&self) -> impl Iterator<Item = &str> {
        self.extra_flags.split_whitespace()
    }
}

/// Ordered per-table export instructions. Never contains views.
pub type DumpPlan = Vec<DumpItem>;

/// Merge the live table list with the configured overrides.
///
/// One item per base table, in the order `tables` lists them. Views are
/// skipped and overrides naming tables that do not exist are ignored.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::config::{Overrides, TableOverride};
/// # use mysql_dump_curator::mysql::inspector::SchemaTable;
/// # use mysql_dump_curator::plan::{build_plan, DumpItem};
/// let mut overrides = Overrides::new();
/// overrides.insert(
///     "orders".to_string(),
///     TableOverride {
///         table_name: "orders".to_string(),
///         row_filter: "id > 100".to_string(),
///         extra_flags: String::new(),
///     },
/// );
/// let tables = vec![SchemaTable::base("orders"), SchemaTable::base("customers")];
///
/// let plan = build_plan(&tables, &overrides);
/// assert_eq!(plan[0], DumpItem::new("orders", "id > 100", ""));
/// assert_eq!(plan[1], DumpItem::new("customers", "1=1", ""));
/// ```
pub fn build_plan(tables: &[SchemaTable], overrides: &Overrides) -> DumpPlan {
    let plan: DumpPlan = tables
        .iter()
        .filter(|t| t.kind == TableKind::BaseTable)
        .map(|t| match overrides.get(&t.table_name) {
            Some(o) => DumpItem::new(&t.table_name, &o.row_filter, &o.extra_flags),
            None => DumpItem::new(&t.table_name, DEFAULT_ROW_FILTER, ""),
        })
        .collect();

    let overridden = plan
        .iter()
        .filter(|item| overrides.contains_key(&item.table_name))
        .count();
    if overridden < overrides.len() {
        tracing::debug!(
            "{} override(s) name tables not present in the schema and were ignored",
            overrides.len() - overridden
        );
    }
    tracing::info!(
        "Dump plan has {} table(s), {} with overrides",
        plan.len(),
        overridden
    );

    plan
}
