// ABOUTME: Parses the per-table dump override file (YAML or TOML)
// ABOUTME: Validates row filters and extra mysqldump flags before any export runs

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Row filter used for tables without an override: dump every row.
pub const DEFAULT_ROW_FILTER: &str = "1=1";

/// Options that would redirect the dump, change credentials or replace the
/// row filter. These are owned by the exporter and never taken from config.
const FORBIDDEN_FLAGS: &[&str] = &[
    "--host",
    "--user",
    "--password",
    "--port",
    "--socket",
    "--protocol",
    "--result-file",
    "--tab",
    "--where",
    "--defaults-file",
    "--defaults-extra-file",
    "--defaults-group-suffix",
    "--login-path",
    "--plugin-dir",
    "--no-defaults",
    "--print-defaults",
];

static LONG_FLAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(--[A-Za-z][A-Za-z0-9_-]*)(=[A-Za-z0-9_.,:/@%+-]*)?$").expect("valid flag regex")
});

#[derive(Debug, Default, Deserialize)]
struct DumpConfig {
    #[serde(default)]
    tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    table_name: String,
    #[serde(rename = "where")]
    #[serde(default)]
    predicate: Option<String>,
    #[serde(default)]
    flags: Option<String>,
}

/// Per-table dump settings loaded from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOverride {
    pub table_name: String,
    pub row_filter: String,
    pub extra_flags: String,
}

/// Overrides keyed by exact table name.
pub type Overrides = HashMap<String, TableOverride>;

/// Load and validate the override file at `path`.
///
/// Files ending in `.toml` are parsed as TOML (`[[tables]]`); anything else is
/// parsed as YAML (`tables: [...]`). An empty file yields no overrides.
///
/// # Errors
///
/// * [`ConfigError::NotFound`] if the file does not exist
/// * [`ConfigError::Malformed`] if it cannot be read or parsed, contains a
///   duplicate `table_name`, or carries a row filter or flag that fails
///   validation
///
/// # Examples
///
/// ```no_run
/// # use mysql_dump_curator::config::load_overrides;
/// let overrides = load_overrides("dump.yaml").unwrap();
/// if let Some(o) = overrides.get("orders") {
///     println!("orders filtered by {}", o.row_filter);
/// }
/// ```
pub fn load_overrides(path: impl AsRef<Path>) -> Result<Overrides, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => malformed(path, format!("cannot read file: {}", e)),
    })?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let parsed = parse_config(&raw, is_toml).map_err(|reason| malformed(path, reason))?;

    let overrides = build_overrides(parsed).map_err(|reason| malformed(path, reason))?;
    tracing::info!(
        "Loaded {} table override(s) from {}",
        overrides.len(),
        path.display()
    );
    Ok(overrides)
}

fn parse_config(raw: &str, is_toml: bool) -> Result<DumpConfig, String> {
    if raw.trim().is_empty() {
        return Ok(DumpConfig::default());
    }
    if is_toml {
        toml::from_str(raw).map_err(|e| format!("invalid TOML: {}", e))
    } else {
        serde_yaml::from_str(raw).map_err(|e| format!("invalid YAML: {}", e))
    }
}

fn build_overrides(config: DumpConfig) -> Result<Overrides, String> {
    let mut overrides = Overrides::with_capacity(config.tables.len());

    for entry in config.tables {
        let table_name = entry.table_name.trim().to_string();
        if table_name.is_empty() {
            return Err("table_name cannot be empty".to_string());
        }
        if table_name.chars().any(char::is_control) {
            return Err(format!(
                "table_name '{}' contains control characters",
                crate::utils::sanitize_identifier(&table_name)
            ));
        }

        let row_filter = match entry.predicate {
            Some(p) if !p.trim().is_empty() => {
                validate_row_filter(&table_name, &p)?;
                p
            }
            _ => DEFAULT_ROW_FILTER.to_string(),
        };

        let extra_flags = entry.flags.unwrap_or_default().trim().to_string();
        validate_extra_flags(&extra_flags)
            .map_err(|reason| format!("flags for table '{}': {}", table_name, reason))?;

        if overrides.contains_key(&table_name) {
            return Err(format!("duplicate table_name '{}'", table_name));
        }
        overrides.insert(
            table_name.clone(),
            TableOverride {
                table_name,
                row_filter,
                extra_flags,
            },
        );
    }

    Ok(overrides)
}

fn validate_row_filter(table_name: &str, predicate: &str) -> Result<(), String> {
    if predicate.contains('\0') || predicate.contains('\n') || predicate.contains('\r') {
        return Err(format!(
            "where clause for table '{}' must be a single line without NUL bytes",
            table_name
        ));
    }
    Ok(())
}

/// Check that every token of `flags` is a plain long mysqldump option.
///
/// Flags are split on whitespace, so option values cannot contain spaces or
/// quotes. Options that change the connection, the credentials, the output
/// location or the row filter are rejected, including their `--loose-` forms
/// and abbreviations.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::config::validate_extra_flags;
/// assert!(validate_extra_flags("--no-create-info --skip-triggers").is_ok());
/// assert!(validate_extra_flags("--max-allowed-packet=64M").is_ok());
/// assert!(validate_extra_flags("--result-file=/tmp/x").is_err());
/// assert!(validate_extra_flags("--loose-host=elsewhere").is_err());
/// assert!(validate_extra_flags("; rm -rf /").is_err());
/// ```
pub fn validate_extra_flags(flags: &str) -> Result<(), String> {
    for token in flags.split_whitespace() {
        let captures = LONG_FLAG_RE.captures(token).ok_or_else(|| {
            format!(
                "'{}' is not a plain long option (expected --name or --name=value)",
                crate::utils::sanitize_identifier(token)
            )
        })?;
        let name = canonical_option_name(&captures[1]);
        // Client tools accept any unambiguous prefix of an option name
        if let Some(managed) = FORBIDDEN_FLAGS.iter().find(|f| f.starts_with(&name)) {
            return Err(format!(
                "option '{}' would set '{}', which is managed by the exporter",
                &captures[1], managed
            ));
        }
    }
    Ok(())
}

/// Lowercase, map `_` to `-` and drop any `--loose-` prefixes, the way the
/// MySQL option parser resolves a long option name.
fn canonical_option_name(raw: &str) -> String {
    let mut name = raw.to_ascii_lowercase().replace('_', "-");
    while let Some(rest) = name.strip_prefix("--loose-") {
        name = format!("--{}", rest);
    }
    name
}

fn malformed(path: &Path, reason: String) -> ConfigError {
    ConfigError::Malformed {
        path: PathBuf::from(path),
        reason,
    }
}
