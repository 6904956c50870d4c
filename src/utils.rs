// ABOUTME: Utility functions for validation and tool discovery
// ABOUTME: Provides identifier validation, quoting, and mysqldump availability checks

use anyhow::{bail, Result};
use which::which;

/// Check that required MySQL client tools are available
///
/// Verifies that `mysqldump` is installed and in PATH.
///
/// # Errors
///
/// Returns an error with installation instructions if the tool is missing.
///
/// # Examples
///
/// ```no_run
/// # use mysql_dump_curator::utils::check_required_tools;
/// # use anyhow::Result;
/// # fn example() -> Result<()> {
/// check_required_tools()?;
/// # Ok(())
/// # }
/// ```
pub fn check_required_tools() -> Result<()> {
    let tools = ["mysqldump"];
    let mut missing = Vec::new();

    for tool in &tools {
        if which(tool).is_err() {
            missing.push(*tool);
        }
    }

    if !missing.is_empty() {
        bail!(
            "Missing required MySQL client tools: {}\n\
             \n\
             Please install MySQL client tools:\n\
             - Ubuntu/Debian: sudo apt-get install mysql-client\n\
             - macOS: brew install mysql-client\n\
             - RHEL/CentOS: sudo yum install mysql",
            missing.join(", ")
        );
    }

    Ok(())
}

/// Validate a MySQL schema identifier (database name)
///
/// Accepts 1-64 characters made of ASCII letters, digits, `_` and `$`, not
/// consisting solely of digits. Quoted identifiers with other characters are
/// legal in MySQL but are refused here because the name is written into the
/// dump preamble and passed to `mysqldump`.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::utils::validate_mysql_identifier;
/// assert!(validate_mysql_identifier("shop").is_ok());
/// assert!(validate_mysql_identifier("shop_2024").is_ok());
/// assert!(validate_mysql_identifier("").is_err());
/// assert!(validate_mysql_identifier("shop`; DROP DATABASE x; --").is_err());
/// ```
pub fn validate_mysql_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        bail!("Identifier cannot be empty or whitespace-only");
    }

    if identifier.chars().count() > 64 {
        bail!(
            "Identifier '{}' exceeds maximum length of 64 characters (got {})",
            sanitize_identifier(identifier),
            identifier.chars().count()
        );
    }

    for (i, c) in identifier.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '$' {
            bail!(
                "Identifier '{}' contains invalid character '{}' at position {}. \
                 Only letters, digits, '_' and '$' are allowed",
                sanitize_identifier(identifier),
                if c.is_control() {
                    format!("\\x{:02x}", c as u32)
                } else {
                    c.to_string()
                },
                i
            );
        }
    }

    if identifier.chars().all(|c| c.is_ascii_digit()) {
        bail!(
            "Identifier '{}' cannot consist solely of digits",
            identifier
        );
    }

    Ok(())
}

/// Quote a MySQL identifier with backticks, doubling embedded backticks.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::utils::quote_ident;
/// assert_eq!(quote_ident("orders"), "`orders`");
/// assert_eq!(quote_ident("odd`name"), "`odd``name`");
/// ```
pub fn quote_ident(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Sanitize an identifier (table name, flag, etc.) for display
///
/// Removes control characters and limits length to prevent log injection attacks
/// and ensure readable error messages.
///
/// # Examples
///
/// ```
/// # use mysql_dump_curator::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
