// ABOUTME: CLI entry point for mysql-dump-curator
// ABOUTME: Parses connection flags and routes to the analyze or dump mode

use clap::{Parser, ValueEnum};
use mysql_dump_curator::analyze::DEFAULT_THRESHOLD_MB;
use mysql_dump_curator::commands::{self, DumpOptions};
use mysql_dump_curator::mysql::ConnectionParams;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mysql-dump-curator")]
#[command(
    about = "Find oversized MySQL tables, or dump a schema with per-table row filters",
    long_about = None
)]
struct Cli {
    /// The MySQL user
    #[arg(long, default_value = "root")]
    user: String,
    /// The MySQL host
    #[arg(long, default_value = "localhost")]
    host: String,
    /// The MySQL port
    #[arg(long, default_value_t = 3306)]
    port: u16,
    /// The password for this user
    #[arg(long, default_value = "")]
    password: String,
    /// The database (schema) name
    #[arg(long)]
    database: String,
    /// Path to the CA certificate used to verify the server (enables TLS)
    #[arg(long)]
    ssl_ca: Option<PathBuf>,
    /// Run mode
    #[arg(long, value_enum, default_value_t = Mode::Analyze)]
    mode: Mode,
    /// The YAML (or TOML) override config for dump mode
    #[arg(long, required_if_eq("mode", "dump"))]
    config: Option<PathBuf>,
    /// Where dump mode writes the SQL file
    #[arg(long, default_value = "./output.sql")]
    output: PathBuf,
    /// Do not start the dump with CREATE DATABASE / USE statements
    #[arg(long)]
    no_preamble: bool,
    /// Size in megabytes above which analyze mode describes a table
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MB)]
    threshold_mb: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Rank tables by size and describe the oversized ones
    Analyze,
    /// Write a filtered dump of all tables and views
    Dump,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let params = ConnectionParams {
        user: cli.user,
        host: cli.host,
        port: cli.port,
        password: cli.password,
        database: cli.database,
        ssl_ca: cli.ssl_ca,
    };

    match cli.mode {
        Mode::Analyze => commands::analyze(&params, cli.threshold_mb).await,
        Mode::Dump => {
            let options = DumpOptions {
                // Enforced by clap's required_if_eq
                config_path: cli.config.unwrap_or_default(),
                output_path: cli.output,
                write_preamble: !cli.no_preamble,
            };
            commands::dump(&params, &options).await.map(|_| ())
        }
    }
}
