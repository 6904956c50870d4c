// ABOUTME: Exporter backed by the mysqldump client binary
// ABOUTME: Passes each argument directly (no shell) and credentials via an option file

use super::{ExportResult, Exporter};
use crate::error::ExportError;
use crate::mysql::{ClientOptionFile, ConnectionParams};
use crate::plan::DumpItem;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::process::{Command, Stdio};

/// Runs `mysqldump` once per table and once for all views.
///
/// Every value is handed to the child as its own argument, so row filters and
/// flags are never interpreted by a shell. The password reaches `mysqldump`
/// through a temporary `--defaults-extra-file` that lives as long as the
/// exporter.
pub struct MysqldumpExporter {
    program: OsString,
    database: String,
    option_file: ClientOptionFile,
}

impl MysqldumpExporter {
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let option_file = ClientOptionFile::new(params)
            .context("Failed to prepare credentials for mysqldump")?;
        Ok(Self {
            program: OsString::from("mysqldump"),
            database: params.database.clone(),
            option_file,
        })
    }

    /// Use a different executable instead of `mysqldump` from PATH.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn table_args(&self, item: &DumpItem) -> Vec<String> {
        let mut args = vec![
            // Must come first or mysqldump ignores it
            self.option_file.defaults_arg(),
            "--lock-tables=false".to_string(),
            "--compact".to_string(),
            format!("--where={}", item.row_filter),
        ];
        args.extend(item.flag_args().map(str::to_string));
        // Names come from live metadata and may look like options
        args.push("--".to_string());
        args.push(self.database.clone());
        args.push(item.table_name.clone());
        args
    }

    fn view_args(&self, views: &[String]) -> Vec<String> {
        let mut args = vec![
            self.option_file.defaults_arg(),
            "--no-data".to_string(),
            "--skip-comments".to_string(),
            "--".to_string(),
            self.database.clone(),
        ];
        args.extend(views.iter().cloned());
        args
    }

    fn invoke(&self, target: &str, args: Vec<String>) -> Result<ExportResult, ExportError> {
        tracing::debug!(
            "Invoking {} for '{}' with {} argument(s)",
            self.program.to_string_lossy(),
            target,
            args.len()
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExportError::InvocationFailed {
                target: target.to_string(),
                source,
            })?;

        Ok(ExportResult {
            table_name: target.to_string(),
            stdout_bytes: output.stdout,
            stderr_text: String::from_utf8_lossy(&output.stderr).into_owned(),
            failed: !output.status.success(),
            exit_code: output.status.code(),
        })
    }
}

impl Exporter for MysqldumpExporter {
    fn export_table(&mut self, item: &DumpItem) -> Result<ExportResult, ExportError> {
        let args = self.table_args(item);
        self.invoke(&item.table_name, args)
    }

    fn export_views(&mut self, views: &[String]) -> Result<ExportResult, ExportError> {
        let args = self.view_args(views);
        self.invoke("views", args)
    }
}
