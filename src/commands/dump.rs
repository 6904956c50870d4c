// ABOUTME: Dump command - selective per-table mysqldump into one restorable SQL file
// ABOUTME: Config, metadata and output errors abort; per-table export errors do not

use crate::assemble::OutputAssembler;
use crate::config;
use crate::export::{run_dump, DumpSummary, MysqldumpExporter};
use crate::mysql::{self, inspector, ConnectionParams};
use crate::plan::build_plan;
use crate::utils;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub config_path: PathBuf,
    pub output_path: PathBuf,
    /// Start the artifact with `CREATE DATABASE` / `USE`.
    pub write_preamble: bool,
}

/// Dump every base table of `params.database` with its configured row filter
/// and flags, followed by all view definitions, into `options.output_path`.
///
/// Tables whose export fails are skipped and listed in the returned summary.
pub async fn dump(params: &ConnectionParams, options: &DumpOptions) -> Result<DumpSummary> {
    utils::validate_mysql_identifier(&params.database).context("Invalid --database")?;

    let overrides = config::load_overrides(&options.config_path)?;
    utils::check_required_tools()?;

    let mut conn = mysql::connect(params).await?;
    let tables = inspector::list_tables(&mut conn, &params.database, false).await?;
    let views = inspector::list_views(&mut conn, &params.database).await?;
    if let Err(e) = conn.disconnect().await {
        tracing::debug!("Error while closing MySQL connection: {}", e);
    }

    let plan = build_plan(&tables, &overrides);

    let mut assembler = OutputAssembler::create(&options.output_path)?;
    let mut exporter = MysqldumpExporter::new(params)?;

    let preamble = options.write_preamble.then_some(params.database.as_str());
    let summary = run_dump(&plan, &views, &mut exporter, &mut assembler, preamble)?;

    let bytes = assembler.bytes_written();
    assembler.finish()?;

    let written = format!(
        "{}/{} table(s) and {}/{} view(s) to {} ({} bytes)",
        summary.tables_exported,
        summary.tables_total,
        summary.views_written(),
        summary.views_total,
        options.output_path.display(),
        bytes
    );
    if summary.is_complete() {
        tracing::info!("✓ Dumped {}", written);
    } else {
        tracing::warn!("Dump is incomplete: wrote {}", written);
        if !summary.failed_tables.is_empty() {
            tracing::warn!(
                "{} table(s) could not be dumped and are missing from the output: {}",
                summary.failed_tables.len(),
                summary.failed_tables.join(", ")
            );
        }
        if summary.views_written() < summary.views_total {
            tracing::warn!("View definitions are missing from the output");
        }
    }

    Ok(summary)
}
