// ABOUTME: Analyze command - ranks tables by size and describes oversized ones
// ABOUTME: Read-only diagnostics; takes no corrective action

use crate::analyze::{acceptable_message, classify, oversized_message};
use crate::mysql::{self, inspector, ConnectionParams};
use crate::utils;
use anyhow::{Context, Result};

/// Report every base table's size, largest first, with the column structure of
/// tables larger than `threshold_mb`.
pub async fn analyze(params: &ConnectionParams, threshold_mb: f64) -> Result<()> {
    utils::validate_mysql_identifier(&params.database).context("Invalid --database")?;

    let mut conn = mysql::connect(params).await?;

    let ranked = inspector::size_ranking(&mut conn, &params.database).await?;
    let findings = classify(ranked, threshold_mb);
    let oversized = findings.iter().filter(|f| f.oversized).count();

    for finding in &findings {
        if finding.oversized {
            let structure =
                inspector::describe_table(&mut conn, &params.database, &finding.entry.table_name)
                    .await?;
            tracing::info!("{}", oversized_message(&finding.entry, &structure));
        } else {
            tracing::info!("{}", acceptable_message(&finding.entry));
        }
    }

    tracing::info!(
        "Analyzed {} table(s); {} exceed {:.2} mb",
        findings.len(),
        oversized,
        threshold_mb
    );

    if let Err(e) = conn.disconnect().await {
        tracing::debug!("Error while closing MySQL connection: {}", e);
    }
    Ok(())
}
