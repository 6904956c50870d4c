// ABOUTME: Typed error kinds for configuration, metadata, export and output failures
// ABOUTME: Lets callers tell fatal setup errors apart from per-table export errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the override configuration. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("malformed config file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Errors raised while reading live schema metadata. Always fatal.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to connect to MySQL at {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: mysql_async::Error,
    },

    #[error("metadata query failed ({context}): {source}")]
    QueryFailed {
        context: String,
        #[source]
        source: mysql_async::Error,
    },
}

/// Errors raised by a single export invocation.
///
/// These are recovered per table: the dump run logs them and moves on to the
/// next item in the plan.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export of '{target}' exited with {status}: {stderr}")]
    NonZeroExit {
        target: String,
        status: String,
        stderr: String,
    },

    #[error("failed to invoke export for '{target}': {source}")]
    InvocationFailed {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the output sink. Always fatal.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to open output {}: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {source}")]
    WriteFailed {
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_file() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("/etc/dump.yaml"),
        };
        assert_eq!(err.to_string(), "config file not found: /etc/dump.yaml");

        let err = ConfigError::Malformed {
            path: PathBuf::from("dump.yaml"),
            reason: "duplicate table_name 'orders'".to_string(),
        };
        assert!(err.to_string().contains("dump.yaml"));
        assert!(err.to_string().contains("duplicate table_name"));
    }

    #[test]
    fn test_export_error_includes_stderr() {
        let err = ExportError::NonZeroExit {
            target: "orders".to_string(),
            status: "exit status: 2".to_string(),
            stderr: "Unknown column 'foo'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders"));
        assert!(msg.contains("Unknown column"));
    }
}
