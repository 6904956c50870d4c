// ABOUTME: Read-only MySQL schema introspection through INFORMATION_SCHEMA
// ABOUTME: Lists tables and views, ranks tables by size and describes column structure

use crate::error::MetadataError;
use crate::utils::quote_ident;
use mysql_async::{prelude::*, Conn};
use std::cmp::Ordering;
use std::fmt;

/// Kind of schema object as reported by `INFORMATION_SCHEMA.TABLES.TABLE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    BaseTable,
    View,
}

impl TableKind {
    fn from_table_type(table_type: &str) -> Option<Self> {
        match table_type {
            "BASE TABLE" => Some(TableKind::BaseTable),
            "VIEW" => Some(TableKind::View),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTable {
    pub table_name: String,
    pub kind: TableKind,
}

impl SchemaTable {
    pub fn base(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            kind: TableKind::BaseTable,
        }
    }

    pub fn view(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            kind: TableKind::View,
        }
    }
}

/// Size of one base table in megabytes (data plus indexes).
#[derive(Debug, Clone, PartialEq)]
pub struct SizeReportEntry {
    pub table_name: String,
    pub size_mb: f64,
}

/// List the base tables (and optionally views) of a schema.
///
/// Rows come back ordered by `TABLE_NAME`; callers rely on that order and never
/// re-sort.
///
/// # Examples
///
/// ```no_run
/// # use mysql_dump_curator::mysql::{connect, ConnectionParams, inspector::list_tables};
/// # async fn example() -> anyhow::Result<()> {
/// let params = ConnectionParams { database: "shop".into(), ..Default::default() };
/// let mut conn = connect(&params).await?;
/// let tables = list_tables(&mut conn, "shop", false).await?;
/// println!("Found {} tables", tables.len());
/// # Ok(())
/// # }
/// ```
pub async fn list_tables(
    conn: &mut Conn,
    database: &str,
    include_views: bool,
) -> Result<Vec<SchemaTable>, MetadataError> {
    tracing::info!("Listing tables from MySQL database '{}'", database);

    let query = r#"
        SELECT TABLE_NAME, TABLE_TYPE
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE IN ('BASE TABLE', 'VIEW')
        ORDER BY TABLE_NAME
    "#;

    let rows: Vec<(String, String)> =
        conn.exec(query, (database,))
            .await
            .map_err(|source| MetadataError::QueryFailed {
                context: format!("list tables of '{}'", database),
                source,
            })?;

    let tables = collect_tables(rows, include_views);

    tracing::info!(
        "Found {} object(s) in database '{}'",
        tables.len(),
        database
    );
    Ok(tables)
}

/// Names of all views in a schema, in `TABLE_NAME` order.
pub async fn list_views(conn: &mut Conn, database: &str) -> Result<Vec<String>, MetadataError> {
    let views = list_tables(conn, database, true)
        .await?
        .into_iter()
        .filter(|t| t.kind == TableKind::View)
        .map(|t| t.table_name)
        .collect::<Vec<_>>();

    tracing::info!("Found {} view(s) in database '{}'", views.len(), database);
    Ok(views)
}

fn collect_tables(rows: Vec<(String, String)>, include_views: bool) -> Vec<SchemaTable> {
    rows.into_iter()
        .filter_map(|(table_name, table_type)| {
            TableKind::from_table_type(&table_type).map(|kind| SchemaTable { table_name, kind })
        })
        .filter(|t| include_views || t.kind == TableKind::BaseTable)
        .collect()
}

/// Rank the base tables of a schema by size, largest first.
///
/// Size is `(DATA_LENGTH + INDEX_LENGTH) / 1024 / 1024` rounded to two
/// decimals; tables whose lengths are NULL count as 0.00.
pub async fn size_ranking(
    conn: &mut Conn,
    database: &str,
) -> Result<Vec<SizeReportEntry>, MetadataError> {
    tracing::info!("Measuring table sizes in database '{}'", database);

    let query = r#"
        SELECT TABLE_NAME, CAST(DATA_LENGTH + INDEX_LENGTH AS UNSIGNED)
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY (DATA_LENGTH + INDEX_LENGTH) DESC
    "#;

    let rows: Vec<(String, Option<u64>)> =
        conn.exec(query, (database,))
            .await
            .map_err(|source| MetadataError::QueryFailed {
                context: format!("measure table sizes of '{}'", database),
                source,
            })?;

    let entries = rows
        .into_iter()
        .map(|(table_name, bytes)| SizeReportEntry {
            table_name,
            size_mb: size_mb(bytes),
        })
        .collect();

    Ok(rank_by_size(entries))
}

/// Convert a byte count to megabytes rounded to two decimals.
pub fn size_mb(bytes: Option<u64>) -> f64 {
    match bytes {
        Some(b) => ((b as f64) / 1024.0 / 1024.0 * 100.0).round() / 100.0,
        None => 0.0,
    }
}

/// Stable sort, largest first. Ties keep their incoming order.
pub fn rank_by_size(mut entries: Vec<SizeReportEntry>) -> Vec<SizeReportEntry> {
    entries.sort_by(|a, b| {
        b.size_mb
            .partial_cmp(&a.size_mb)
            .unwrap_or(Ordering::Equal)
    });
    entries
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub field: String,
    pub column_type: String,
    pub nullable: String,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
}

/// Column layout of one table, as returned by `SHOW COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStructure {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Read the column structure of a table.
pub async fn describe_table(
    conn: &mut Conn,
    database: &str,
    table: &str,
) -> Result<TableStructure, MetadataError> {
    tracing::debug!("Describing table '{}.{}'", database, table);

    let query = format!(
        "SHOW COLUMNS FROM {} FROM {}",
        quote_ident(table),
        quote_ident(database)
    );

    let rows: Vec<(String, String, String, String, Option<String>, String)> = conn
        .query(query)
        .await
        .map_err(|source| MetadataError::QueryFailed {
            context: format!("describe table '{}'", table),
            source,
        })?;

    let columns = rows
        .into_iter()
        .map(
            |(field, column_type, nullable, key, default, extra)| ColumnInfo {
                field,
                column_type,
                nullable,
                key,
                default,
                extra,
            },
        )
        .collect();

    Ok(TableStructure {
        table_name: table.to_string(),
        columns,
    })
}

impl fmt::Display for TableStructure {
    /// Renders the structure as a boxed grid in the style of `mysql --table`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = ["Field", "Type", "Null", "Key", "Default", "Extra"];
        let rows: Vec<[String; 6]> = self
            .columns
            .iter()
            .map(|c| {
                [
                    c.field.clone(),
                    c.column_type.clone(),
                    c.nullable.clone(),
                    c.key.clone(),
                    c.default.clone().unwrap_or_else(|| "NULL".to_string()),
                    c.extra.clone(),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.chars().count());
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let border: String = widths
            .iter()
            .map(|w| format!("+{}", "-".repeat(w + 2)))
            .collect::<String>()
            + "+";

        let line = |cells: &[&str]| -> String {
            cells
                .iter()
                .zip(widths.iter())
                .map(|(cell, w)| format!("| {:<width$} ", cell, width = *w))
                .collect::<String>()
                + "|"
        };

        writeln!(f, "{}", border)?;
        writeln!(f, "{}", line(&header))?;
        writeln!(f, "{}", border)?;
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            writeln!(f, "{}", line(&cells))?;
        }
        write!(f, "{}", border)
    }
}
