// ABOUTME: Runs the dump plan through an Exporter and assembles one SQL artifact
// ABOUTME: Per-table export failures are logged and skipped; sink failures abort

pub mod definer;
pub mod mysqldump;

pub use definer::strip_definer_clauses;
pub use mysqldump::MysqldumpExporter;

use crate::assemble::OutputAssembler;
use crate::error::{ExportError, SinkError};
use crate::plan::{DumpItem, DumpPlan};
use std::io::Write;

/// Captured output of one export invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Table name, or a label for the bulk view export.
    pub table_name: String,
    pub stdout_bytes: Vec<u8>,
    pub stderr_text: String,
    pub failed: bool,
    /// Exit code of the export process, if it exited normally.
    pub exit_code: Option<i32>,
}

impl ExportResult {
    /// Turn a failed result into the matching [`ExportError`].
    pub fn check(self) -> Result<ExportResult, ExportError> {
        if self.failed {
            return Err(ExportError::NonZeroExit {
                target: self.table_name,
                status: match self.exit_code {
                    Some(code) => format!("exit code {}", code),
                    None => "termination by signal".to_string(),
                },
                stderr: self.stderr_text.trim().to_string(),
            });
        }
        Ok(self)
    }
}

/// Something that can dump single tables and a set of views.
///
/// [`MysqldumpExporter`] runs the real client tool; tests substitute fakes.
pub trait Exporter {
    /// Dump the rows of one table, restricted by its row filter.
    fn export_table(&mut self, item: &DumpItem) -> Result<ExportResult, ExportError>;

    /// Dump the structure of all given views in one invocation.
    fn export_views(&mut self, views: &[String]) -> Result<ExportResult, ExportError>;
}

/// Outcome of a dump run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub tables_total: usize,
    pub tables_exported: usize,
    pub failed_tables: Vec<String>,
    pub views_total: usize,
    pub views_exported: bool,
}

impl DumpSummary {
    /// Number of view definitions that made it into the artifact.
    pub fn views_written(&self) -> usize {
        if self.views_exported {
            self.views_total
        } else {
            0
        }
    }

    /// True when every table and every view was written.
    pub fn is_complete(&self) -> bool {
        self.failed_tables.is_empty() && (self.views_total == 0 || self.views_exported)
    }
}

/// Export every plan item in order, then the views, writing successful output
/// to `assembler`.
///
/// When `preamble_database` is set, a `CREATE DATABASE` / `USE` preamble is
/// written first. A table whose export fails is logged, left out of the
/// artifact and recorded in the summary; later tables are still exported.
/// View output has its definer clauses stripped before it is written.
///
/// # Errors
///
/// Only sink failures are returned. They are fatal to the run.
pub fn run_dump<W: Write, E: Exporter + ?Sized>(
    plan: &DumpPlan,
    views: &[String],
    exporter: &mut E,
    assembler: &mut OutputAssembler<W>,
    preamble_database: Option<&str>,
) -> Result<DumpSummary, SinkError> {
    let mut summary = DumpSummary {
        tables_total: plan.len(),
        views_total: views.len(),
        ..DumpSummary::default()
    };

    if let Some(database) = preamble_database {
        assembler.write_preamble(database)?;
    }

    for (index, item) in plan.iter().enumerate() {
        tracing::info!(
            "[{}/{}] Running mysqldump for '{}'",
            index + 1,
            plan.len(),
            item.table_name
        );

        match exporter.export_table(item).and_then(ExportResult::check) {
            Ok(result) => {
                log_stderr(&result);
                assembler.append_fragment(&result.stdout_bytes)?;
                summary.tables_exported += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping table '{}': {}", item.table_name, e);
                summary.failed_tables.push(item.table_name.clone());
            }
        }
    }

    if views.is_empty() {
        tracing::info!("No views to dump");
    } else {
        tracing::info!("Dumping {} view definition(s)", views.len());
        match exporter.export_views(views).and_then(ExportResult::check) {
            Ok(result) => {
                log_stderr(&result);
                let cleaned = strip_definer_clauses(&result.stdout_bytes);
                assembler.append_fragment(&cleaned)?;
                summary.views_exported = true;
            }
            Err(e) => {
                tracing::warn!("View definitions were not dumped: {}", e);
            }
        }
    }

    Ok(summary)
}

fn log_stderr(result: &ExportResult) {
    let stderr = result.stderr_text.trim();
    if !stderr.is_empty() {
        tracing::warn!("mysqldump reported for '{}':\n{}", result.table_name, stderr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_result(name: &str, stdout: &str) -> ExportResult {
        ExportResult {
            table_name: name.to_string(),
            stdout_bytes: stdout.as_bytes().to_vec(),
            stderr_text: String::new(),
            failed: false,
            exit_code: Some(0),
        }
    }

    /// Exporter that fails for the named tables and records every call.
    struct ScriptedExporter {
        fail: Vec<&'static str>,
        spawn_error: Vec<&'static str>,
        calls: Vec<String>,
        view_output: &'static str,
        fail_views: bool,
    }

    impl ScriptedExporter {
        fn new() -> Self {
            Self {
                fail: Vec::new(),
                spawn_error: Vec::new(),
                calls: Vec::new(),
                view_output: "",
                fail_views: false,
            }
        }
    }

    impl Exporter for ScriptedExporter {
        fn export_table(&mut self, item: &DumpItem) -> Result<ExportResult, ExportError> {
            self.calls.push(item.table_name.clone());
            if self.spawn_error.iter().any(|t| *t == item.table_name) {
                return Err(ExportError::InvocationFailed {
                    target: item.table_name.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no mysqldump"),
                });
            }
            let mut result = ok_result(
                &item.table_name,
                &format!("INSERT INTO `{}` VALUES (1);\n", item.table_name),
            );
            if self.fail.iter().any(|t| *t == item.table_name) {
                result.failed = true;
                result.exit_code = Some(2);
                result.stderr_text = "mysqldump: Got error: 1054".to_string();
                result.stdout_bytes = b"-- partial".to_vec();
            }
            Ok(result)
        }

        fn export_views(&mut self, views: &[String]) -> Result<ExportResult, ExportError> {
            self.calls.push(format!("views:{}", views.join(",")));
            let mut result = ok_result("views", self.view_output);
            result.failed = self.fail_views;
            Ok(result)
        }
    }

    fn plan(names: &[&str]) -> DumpPlan {
        names.iter().map(|n| DumpItem::new(*n, "1=1", "")).collect()
    }

    fn output(assembler: OutputAssembler<Vec<u8>>) -> String {
        String::from_utf8(assembler.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_check_maps_failure_to_non_zero_exit() {
        let mut result = ok_result("orders", "");
        assert!(result.clone().check().is_ok());

        result.failed = true;
        result.exit_code = Some(3);
        result.stderr_text = "  access denied \n".to_string();
        match result.check() {
            Err(ExportError::NonZeroExit {
                target,
                status,
                stderr,
            }) => {
                assert_eq!(target, "orders");
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "access denied");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_failing_table_does_not_stop_later_tables() {
        let mut exporter = ScriptedExporter::new();
        exporter.fail = vec!["orders"];
        exporter.spawn_error = vec!["payments"];
        let mut assembler = OutputAssembler::new(Vec::new());

        let summary = run_dump(
            &plan(&["customers", "orders", "payments", "products"]),
            &[],
            &mut exporter,
            &mut assembler,
            None,
        )
        .unwrap();

        assert_eq!(
            exporter.calls,
            vec!["customers", "orders", "payments", "products"]
        );
        assert_eq!(summary.tables_total, 4);
        assert_eq!(summary.tables_exported, 2);
        assert_eq!(summary.failed_tables, vec!["orders", "payments"]);
        assert!(!summary.is_complete());

        let out = output(assembler);
        assert_eq!(
            out,
            "INSERT INTO `customers` VALUES (1);\nINSERT INTO `products` VALUES (1);\n"
        );
        assert!(!out.contains("partial"));
    }

    #[test]
    fn test_preamble_tables_then_cleaned_views() {
        let mut exporter = ScriptedExporter::new();
        exporter.view_output =
            "/*!50013 DEFINER=`app`@`%` SQL SECURITY DEFINER */\n/*!50001 VIEW `v` AS select 1 */;\n";
        let mut assembler = OutputAssembler::new(Vec::new());

        let summary = run_dump(
            &plan(&["a", "b"]),
            &["v".to_string(), "w".to_string()],
            &mut exporter,
            &mut assembler,
            Some("shop"),
        )
        .unwrap();

        assert!(summary.is_complete());
        assert!(summary.views_exported);
        assert_eq!(summary.views_written(), 2);
        assert_eq!(exporter.calls, vec!["a", "b", "views:v,w"]);
        assert_eq!(
            output(assembler),
            "CREATE DATABASE `shop`;\nUSE `shop`;\n\
             INSERT INTO `a` VALUES (1);\n\
             INSERT INTO `b` VALUES (1);\n\
             /*!50013 */\n/*!50001 VIEW `v` AS select 1 */;\n"
        );
    }

    #[test]
    fn test_failed_view_export_leaves_dump_incomplete() {
        let mut exporter = ScriptedExporter::new();
        exporter.view_output = "CREATE VIEW `v` AS select 1;\n";
        exporter.fail_views = true;
        let mut assembler = OutputAssembler::new(Vec::new());

        let summary = run_dump(
            &plan(&["a"]),
            &["v".to_string()],
            &mut exporter,
            &mut assembler,
            None,
        )
        .unwrap();

        assert!(summary.failed_tables.is_empty());
        assert!(!summary.views_exported);
        assert_eq!(summary.views_written(), 0);
        assert!(!summary.is_complete());
        assert_eq!(output(assembler), "INSERT INTO `a` VALUES (1);\n");
    }

    #[test]
    fn test_no_views_skips_view_export() {
        let mut exporter = ScriptedExporter::new();
        let mut assembler = OutputAssembler::new(Vec::new());

        let summary = run_dump(&plan(&["a"]), &[], &mut exporter, &mut assembler, None).unwrap();

        assert_eq!(exporter.calls, vec!["a"]);
        assert!(!summary.views_exported);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_empty_plan_writes_only_preamble() {
        let mut exporter = ScriptedExporter::new();
        let mut assembler = OutputAssembler::new(Vec::new());

        let summary =
            run_dump(&Vec::new(), &[], &mut exporter, &mut assembler, Some("shop")).unwrap();

        assert_eq!(summary.tables_total, 0);
        assert!(exporter.calls.is_empty());
        assert_eq!(output(assembler), "CREATE DATABASE `shop`;\nUSE `shop`;\n");
    }
}
