// ABOUTME: MySQL connection parameters, connection setup and client option files
// ABOUTME: Keeps credentials off child-process command lines

pub mod inspector;

use crate::error::MetadataError;
use anyhow::{bail, Context, Result};
use mysql_async::{prelude::Queryable, Conn, OptsBuilder, SslOpts};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Everything needed to reach one MySQL schema, shared by the metadata
/// connection and the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub user: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub database: String,
    pub ssl_ca: Option<PathBuf>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            password: String::new(),
            database: String::new(),
            ssl_ca: None,
        }
    }
}

impl ConnectionParams {
    fn opts(&self) -> OptsBuilder {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .db_name(Some(self.database.clone()));

        if !self.password.is_empty() {
            builder = builder.pass(Some(self.password.clone()));
        }

        if let Some(ca) = &self.ssl_ca {
            let ssl = SslOpts::default().with_root_certs(vec![ca.clone().into()]);
            builder = builder.ssl_opts(Some(ssl));
        }

        builder
    }
}

/// Connect to MySQL and verify the connection with a ping.
///
/// TLS is enabled with the given CA certificate when `ssl_ca` is set.
///
/// # Errors
///
/// Returns [`MetadataError::ConnectionFailed`] if the server cannot be reached,
/// rejects the credentials, or fails the TLS handshake.
///
/// # Examples
///
/// ```no_run
/// # use mysql_dump_curator::mysql::{connect, ConnectionParams};
/// # async fn example() -> anyhow::Result<()> {
/// let params = ConnectionParams {
///     database: "shop".to_string(),
///     ..ConnectionParams::default()
/// };
/// let conn = connect(&params).await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect(params: &ConnectionParams) -> Result<Conn, MetadataError> {
    tracing::info!(
        "Connecting to MySQL at {}:{} as '{}'",
        params.host,
        params.port,
        params.user
    );

    let connection_failed = |source| MetadataError::ConnectionFailed {
        host: params.host.clone(),
        port: params.port,
        source,
    };

    let mut conn = Conn::new(params.opts()).await.map_err(connection_failed)?;
    conn.ping().await.map_err(connection_failed)?;

    tracing::debug!("Successfully connected to MySQL");
    Ok(conn)
}

/// A `[client]` option file holding the connection credentials.
///
/// Passed to MySQL client tools as `--defaults-extra-file` so the password is
/// never visible in the process list. The file lives in the system temp
/// directory with owner-only permissions and is deleted on drop.
pub struct ClientOptionFile {
    file: NamedTempFile,
}

impl ClientOptionFile {
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let contents = render_option_file(params)?;

        let mut file = tempfile::Builder::new()
            .prefix("mysql-dump-curator-")
            .suffix(".cnf")
            .tempfile()
            .context("Failed to create temporary MySQL option file")?;
        file.write_all(contents.as_bytes())
            .context("Failed to write temporary MySQL option file")?;
        file.flush()
            .context("Failed to flush temporary MySQL option file")?;

        tracing::debug!("Wrote client option file {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The argument that must come first on a MySQL client command line.
    pub fn defaults_arg(&self) -> String {
        format!("--defaults-extra-file={}", self.path().display())
    }
}

fn render_option_file(params: &ConnectionParams) -> Result<String> {
    let mut out = String::from("[client]\n");
    out.push_str(&format!("user={}\n", option_value(&params.user)?));
    if !params.password.is_empty() {
        out.push_str(&format!("password={}\n", option_value(&params.password)?));
    }
    out.push_str(&format!("host={}\n", option_value(&params.host)?));
    out.push_str(&format!("port={}\n", params.port));
    if let Some(ca) = &params.ssl_ca {
        out.push_str(&format!(
            "ssl-ca={}\n",
            option_value(&ca.display().to_string())?
        ));
    }
    Ok(out)
}

/// Quote a value for a MySQL option file.
fn option_value(value: &str) -> Result<String> {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");

    let quote = match (escaped.contains('"'), escaped.contains('\'')) {
        (false, _) => '"',
        (true, false) => '\'',
        (true, true) => {
            bail!("Option file values cannot contain both single and double quotes")
        }
    };
    Ok(format!("{quote}{escaped}{quote}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConnectionParams {
        ConnectionParams {
            user: "backup".to_string(),
            host: "db.internal".to_string(),
            port: 3307,
            password: "s3cret".to_string(),
            database: "shop".to_string(),
            ssl_ca: None,
        }
    }

    #[test]
    fn test_default_params_match_cli_defaults() {
        let defaults = ConnectionParams::default();
        assert_eq!(defaults.user, "root");
        assert_eq!(defaults.host, "localhost");
        assert_eq!(defaults.port, 3306);
        assert!(defaults.password.is_empty());
        assert!(defaults.ssl_ca.is_none());
    }

    #[test]
    fn test_render_option_file() {
        let rendered = render_option_file(&params()).unwrap();
        assert_eq!(
            rendered,
            "[client]\nuser=\"backup\"\npassword=\"s3cret\"\nhost=\"db.internal\"\nport=3307\n"
        );
    }

    #[test]
    fn test_render_option_file_with_ssl_and_no_password() {
        let mut p = params();
        p.password.clear();
        p.ssl_ca = Some(PathBuf::from("/etc/ssl/rds-ca.pem"));

        let rendered = render_option_file(&p).unwrap();
        assert!(!rendered.contains("password="));
        assert!(rendered.contains("ssl-ca=\"/etc/ssl/rds-ca.pem\"\n"));
    }

    #[test]
    fn test_option_value_escaping() {
        assert_eq!(option_value("plain").unwrap(), "\"plain\"");
        assert_eq!(option_value("a\\b").unwrap(), "\"a\\\\b\"");
        assert_eq!(option_value("say \"hi\"").unwrap(), "'say \"hi\"'");
        assert_eq!(option_value("line\nbreak").unwrap(), "\"line\\nbreak\"");
        assert!(option_value("both ' and \"").is_err());
    }

    #[test]
    fn test_client_option_file_lifecycle() {
        let file = ClientOptionFile::new(&params()).unwrap();
        let path = file.path().to_path_buf();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[client]\n"));
        assert!(contents.contains("password=\"s3cret\""));
        assert_eq!(
            file.defaults_arg(),
            format!("--defaults-extra-file={}", path.display())
        );

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_is_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let p = ConnectionParams {
            host: "127.0.0.1".to_string(),
            port,
            database: "shop".to_string(),
            ..ConnectionParams::default()
        };

        match connect(&p).await {
            Err(MetadataError::ConnectionFailed { host, port: failed_port, .. }) => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(failed_port, port);
            }
            Err(other) => panic!("expected ConnectionFailed, got {other}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }
}
