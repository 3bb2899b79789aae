// Workspace Gate - SQLite Gateway
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// create / inspect / execute against single-file SQLite databases.
// Connections are scoped to one call: opened, used and closed, also on error.
// Statement text is passed through verbatim; only the target file is gated.

use crate::error::{GateError, GateResult};
use crate::paths::{ConfinedPath, SandboxRoot};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Extensions accepted by create_sql_db
const DB_EXTENSIONS: &[&str] = &[".db", ".sqlite"];

// ============================================================================
// TYPES
// ============================================================================

/// One SQLite value, as stored.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    fn from_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }

    /// JSON form; blobs become "x'<hex>'" literals, non-finite reals become
    /// "Inf" / "-Inf" / "NaN" so they never collide with NULL
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(i) => json!(i),
            SqlValue::Real(f) if f.is_nan() => json!("NaN"),
            SqlValue::Real(f) if f.is_infinite() => json!(if *f > 0.0 { "Inf" } else { "-Inf" }),
            SqlValue::Real(f) => json!(f),
            SqlValue::Text(s) => json!(s),
            SqlValue::Blob(b) => json!(format!("x'{}'", hex::encode(b))),
        }
    }
}

/// A result row: column name -> value, in statement column order.
pub type Row = Vec<(String, SqlValue)>;

/// Column of a table as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Statement produced output columns; may hold zero rows
    Rows(Vec<Row>),
    /// DDL/DML: rows changed by the statement
    Affected(usize),
}

impl QueryOutcome {
    /// Render for the caller. `max_rows` caps the rendered rows only.
    pub fn render(&self, max_rows: usize) -> String {
        match self {
            QueryOutcome::Rows(rows) if rows.is_empty() => "Query returned 0 results.".to_string(),
            QueryOutcome::Rows(rows) => {
                let shown: Vec<Value> = rows
                    .iter()
                    .take(max_rows)
                    .map(|row| {
                        let obj: Map<String, Value> = row
                            .iter()
                            .map(|(col, v)| (col.clone(), v.to_json()))
                            .collect();
                        Value::Object(obj)
                    })
                    .collect();
                let mut text = Value::Array(shown).to_string();
                if rows.len() > max_rows {
                    text.push_str(&format!(
                        "\n({} more rows not shown, {} total)",
                        rows.len() - max_rows,
                        rows.len()
                    ));
                }
                text
            }
            QueryOutcome::Affected(n) => format!("✅ Success. Rows affected: {}", n),
        }
    }
}

/// Render a schema report; an empty catalog gets its own message.
pub fn render_schema(filename: &str, tables: &[TableSchema]) -> String {
    if tables.is_empty() {
        return "Database is empty.".to_string();
    }
    let mut report = format!("Schema for {}:\n", filename);
    for table in tables {
        report.push_str(&format!("\nTable: {}\n{}\n", table.name, "-".repeat(20)));
        for col in &table.columns {
            report.push_str(&format!("  - {} ({})\n", col.name, col.declared_type));
        }
    }
    report
}

// ============================================================================
// SQL GATEWAY
// ============================================================================

pub struct SqlGateway {
    root: Arc<SandboxRoot>,
}

impl SqlGateway {
    pub fn new(root: Arc<SandboxRoot>) -> Self {
        Self { root }
    }

    /// Create a fresh, empty database. Never get-or-create.
    pub fn create(&self, filename: &str) -> GateResult<()> {
        if !DB_EXTENSIONS.iter().any(|ext| filename.ends_with(ext)) {
            return Err(GateError::InvalidArgument(
                "Database filename must end with .db or .sqlite".to_string(),
            ));
        }

        let path = self.root.resolve(filename)?;
        if path.exists() {
            return Err(GateError::AlreadyExists(filename.to_string()));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = open(&path, flags)?;
        close(conn)?;

        log::info!("created database {}", path.name());
        Ok(())
    }

    /// Tables in catalog order, each with its columns in declaration order.
    pub fn inspect(&self, filename: &str) -> GateResult<Vec<TableSchema>> {
        let path = self.existing(filename)?;
        let conn = open(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let result = read_catalog(&conn);
        close(conn)?;
        result
    }

    /// Execute exactly one statement and commit.
    pub fn execute(&self, filename: &str, statement: &str) -> GateResult<QueryOutcome> {
        if statement.trim().is_empty() {
            return Err(GateError::InvalidArgument("query is empty".to_string()));
        }
        let path = self.existing(filename)?;
        let conn = open(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let result = run_statement(&conn, statement);

        // Auto-commit: a statement that opened a transaction does not keep it
        if result.is_ok() && !conn.is_autocommit() {
            if let Err(e) = conn.execute_batch("COMMIT") {
                close(conn)?;
                return Err(GateError::QueryError(e.to_string()));
            }
        }

        close(conn)?;
        if let Ok(outcome) = &result {
            match outcome {
                QueryOutcome::Rows(rows) => log::info!("query on {} returned {} rows", path.name(), rows.len()),
                QueryOutcome::Affected(n) => log::info!("statement on {} changed {} rows", path.name(), n),
            }
        }
        result
    }

    fn existing(&self, filename: &str) -> GateResult<ConfinedPath> {
        let path = self.root.resolve(filename)?;
        if !path.exists() {
            return Err(GateError::NotFound(filename.to_string()));
        }
        Ok(path)
    }
}

/// Connection failures are file-access problems, not query problems.
fn open(path: &ConfinedPath, flags: OpenFlags) -> GateResult<Connection> {
    Connection::open_with_flags(path.as_path(), flags)
        .map_err(|e| GateError::SystemError(format!("cannot open {}: {}", path.name(), e)))
}

fn close(conn: Connection) -> GateResult<()> {
    conn.close()
        .map_err(|(_, e)| GateError::SystemError(format!("cannot close database: {}", e)))
}

fn read_catalog(conn: &Connection) -> GateResult<Vec<TableSchema>> {
    let mut tables_stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = tables_stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut cols_stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = cols_stmt
            .query_map([&name], |row| {
                Ok(ColumnInfo { name: row.get(0)?, declared_type: row.get(1)? })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        tables.push(TableSchema { name, columns });
    }
    Ok(tables)
}

/// Compile every statement in the text before running any, so a second
/// statement is refused with nothing executed. Comment-only text is empty.
fn run_statement(conn: &Connection, statement: &str) -> GateResult<QueryOutcome> {
    let mut batch = Batch::new(conn, statement);
    let mut stmt = batch
        .next()?
        .ok_or_else(|| GateError::InvalidArgument("query is empty".to_string()))?;
    if batch.next()?.is_some() {
        return Err(GateError::QueryError(
            "only one statement may be executed at a time".to_string(),
        ));
    }

    if stmt.column_count() == 0 {
        let changed = stmt.execute([])?;
        return Ok(QueryOutcome::Affected(changed));
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut out = Row::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            out.push((col.clone(), SqlValue::from_ref(row.get_ref(i)?)));
        }
        rows.push(out);
    }
    Ok(QueryOutcome::Rows(rows))
}

// ============================================================================
// TESTS
// ============================================================================
