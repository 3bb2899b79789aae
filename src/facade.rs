// Workspace Gate - Tool Facade
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// The only boundary the transport sees. One invocation -> one operation ->
// one text result. Nothing escapes as a fault: every GateError (and any
// panic inside an operation) is flattened to a string here.

use crate::audit::AuditLog;
use crate::config::GateConfig;
use crate::error::{ErrorKind, GateError, GateResult};
use crate::paths::SandboxRoot;
use crate::sql::{self, SqlGateway};
use crate::store::{FileStore, WriteMode};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ListFiles,
    ReadFile,
    WriteToFile,
    DeleteFile,
    CreateSqlDb,
    InspectSqlDb,
    RunSqlQuery,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::ListFiles,
        Tool::ReadFile,
        Tool::WriteToFile,
        Tool::DeleteFile,
        Tool::CreateSqlDb,
        Tool::InspectSqlDb,
        Tool::RunSqlQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::ListFiles => "list_files",
            Tool::ReadFile => "read_file",
            Tool::WriteToFile => "write_to_file",
            Tool::DeleteFile => "delete_file",
            Tool::CreateSqlDb => "create_sql_db",
            Tool::InspectSqlDb => "inspect_sql_db",
            Tool::RunSqlQuery => "run_sql_query",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Text handed back to the transport, with the failure kind kept as a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub error: Option<ErrorKind>,
}

impl ToolOutcome {
    fn ok(text: String) -> Self {
        Self { text, error: None }
    }

    fn from_error(err: &GateError) -> Self {
        Self { text: err.to_string(), error: Some(err.kind()) }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub struct ToolFacade {
    root: Arc<SandboxRoot>,
    files: FileStore,
    sql: SqlGateway,
    max_rows: usize,
    audit: AuditLog,
}

impl ToolFacade {
    pub fn new(root: Arc<SandboxRoot>, config: &GateConfig) -> Self {
        Self {
            files: FileStore::new(Arc::clone(&root), config.max_write_size),
            sql: SqlGateway::new(Arc::clone(&root)),
            root,
            max_rows: config.max_rows,
            audit: AuditLog::new(config.audit_log.clone()),
        }
    }

    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Run one invocation. Always returns, never panics outward.
    pub fn call(&self, name: &str, args: &Value) -> ToolOutcome {
        self.audit.call(name, args);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(name, args))) {
            Ok(Ok(text)) => ToolOutcome::ok(text),
            Ok(Err(err)) => ToolOutcome::from_error(&err),
            Err(_) => {
                log::error!("{} panicked", name);
                ToolOutcome::from_error(&GateError::SystemError(format!(
                    "internal fault while running {}",
                    name
                )))
            }
        };

        if outcome.is_error() {
            self.audit.fail(name, &outcome.text);
        }
        outcome
    }

    fn dispatch(&self, name: &str, args: &Value) -> GateResult<String> {
        let tool = Tool::from_name(name)
            .ok_or_else(|| GateError::InvalidArgument(format!("unknown tool '{}'", name)))?;

        match tool {
            Tool::ListFiles => {
                let files = self.files.list()?;
                if files.is_empty() {
                    return Ok("The workspace is empty.".to_string());
                }
                let lines: Vec<String> = files.iter().map(|f| format!("- {}", f)).collect();
                Ok(format!("Files available:\n{}", lines.join("\n")))
            }

            Tool::ReadFile => self.files.read(required_str(args, "filename")?),

            Tool::WriteToFile => {
                let filename = required_str(args, "filename")?;
                let content = required_str(args, "content")?;
                let mode = match optional_str(args, "mode")? {
                    Some(m) => m.parse::<WriteMode>()?,
                    None => WriteMode::default(),
                };
                self.files.write(filename, content, mode)?;
                Ok(format!("✅ Successfully wrote to {}", filename))
            }

            Tool::DeleteFile => {
                let filename = required_str(args, "filename")?;
                self.files.delete(filename)?;
                Ok(format!("✅ Successfully deleted {}", filename))
            }

            Tool::CreateSqlDb => {
                let filename = required_str(args, "filename")?;
                self.sql.create(filename)?;
                Ok(format!("✅ Created new database: {}", filename))
            }

            Tool::InspectSqlDb => {
                let filename = required_str(args, "filename")?;
                let tables = self.sql.inspect(filename)?;
                Ok(sql::render_schema(filename, &tables))
            }

            Tool::RunSqlQuery => {
                let filename = required_str(args, "filename")?;
                let query = required_str(args, "query")?;
                let outcome = self.sql.execute(filename, query)?;
                Ok(outcome.render(self.max_rows))
            }
        }
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> GateResult<&'a str> {
    optional_str(args, key)?
        .ok_or_else(|| GateError::InvalidArgument(format!("missing required argument '{}'", key)))
}

/// Absent and null are both "not given"; any other non-string is an error.
fn optional_str<'a>(args: &'a Value, key: &str) -> GateResult<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(GateError::InvalidArgument(format!("argument '{}' must be a string", key))),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn facade() -> (tempfile::TempDir, ToolFacade) {
        let dir = tempdir().unwrap();
        let root = SandboxRoot::open(&dir.path().join("ws")).unwrap();
        let config = GateConfig { root: root.path().to_path_buf(), ..GateConfig::default() };
        (dir, ToolFacade::new(Arc::new(root), &config))
    }

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(Tool::from_name("run_shell"), None);
    }

    #[test]
    fn unknown_tool_is_an_error_string() {
        let (_dir, gate) = facade();
        let outcome = gate.call("rm_rf", &json!({}));
        assert_eq!(outcome.error, Some(ErrorKind::InvalidArgument));
        assert_eq!(outcome.text, "Error: unknown tool 'rm_rf'");
    }

    #[test]
    fn missing_and_mistyped_arguments() {
        let (_dir, gate) = facade();
        let outcome = gate.call("read_file", &json!({}));
        assert_eq!(outcome.text, "Error: missing required argument 'filename'");

        let outcome = gate.call("read_file", &json!({"filename": 42}));
        assert_eq!(outcome.text, "Error: argument 'filename' must be a string");
    }

    #[test]
    fn list_empty_then_populated() {
        let (_dir, gate) = facade();
        let outcome = gate.call("list_files", &json!({}));
        assert_eq!(outcome, ToolOutcome::ok("The workspace is empty.".to_string()));

        gate.call("write_to_file", &json!({"filename": "b.txt", "content": "b"}));
        gate.call("write_to_file", &json!({"filename": "a.md", "content": "a"}));
        let outcome = gate.call("list_files", &json!({}));
        assert_eq!(outcome.text, "Files available:\n- a.md\n- b.txt");
    }

    #[test]
    fn write_modes_through_facade() {
        let (_dir, gate) = facade();
        let outcome = gate.call("write_to_file", &json!({"filename": "f.txt", "content": "X"}));
        assert_eq!(outcome.text, "✅ Successfully wrote to f.txt");
        gate.call("write_to_file", &json!({"filename": "f.txt", "content": "Y", "mode": "a"}));
        assert_eq!(gate.call("read_file", &json!({"filename": "f.txt"})).text, "XY");

        let outcome = gate.call(
            "write_to_file",
            &json!({"filename": "f.txt", "content": "Z", "mode": "truncate"}),
        );
        assert_eq!(outcome.error, Some(ErrorKind::InvalidArgument));
        assert_eq!(gate.call("read_file", &json!({"filename": "f.txt"})).text, "XY");
    }

    #[test]
    fn sql_flow_through_facade() {
        let (_dir, gate) = facade();
        let outcome = gate.call("create_sql_db", &json!({"filename": "app.db"}));
        assert_eq!(outcome.text, "✅ Created new database: app.db");

        let outcome = gate.call("inspect_sql_db", &json!({"filename": "app.db"}));
        assert_eq!(outcome.text, "Database is empty.");

        let outcome = gate.call(
            "run_sql_query",
            &json!({"filename": "app.db", "query": "CREATE TABLE t(id INTEGER, name TEXT)"}),
        );
        assert_eq!(outcome.text, "✅ Success. Rows affected: 0");

        let outcome = gate.call(
            "run_sql_query",
            &json!({"filename": "app.db", "query": "INSERT INTO t VALUES (1, 'ada')"}),
        );
        assert_eq!(outcome.text, "✅ Success. Rows affected: 1");

        let outcome = gate.call(
            "run_sql_query",
            &json!({"filename": "app.db", "query": "SELECT id, name FROM t"}),
        );
        assert_eq!(outcome.text, r#"[{"id":1,"name":"ada"}]"#);

        let outcome = gate.call("run_sql_query", &json!({"filename": "app.db", "query": "DROP"}));
        assert_eq!(outcome.error, Some(ErrorKind::QueryError));
        assert!(outcome.text.starts_with("Query Execution Error:"));
    }

    #[test]
    fn create_rejects_wrong_extension() {
        let (_dir, gate) = facade();
        let outcome = gate.call("create_sql_db", &json!({"filename": "app.txt"}));
        assert_eq!(outcome.text, "Error: Database filename must end with .db or .sqlite");
    }

    #[test]
    fn database_is_not_readable_as_text() {
        let (_dir, gate) = facade();
        gate.call("create_sql_db", &json!({"filename": "app.db"}));
        let outcome = gate.call("read_file", &json!({"filename": "app.db"}));
        assert_eq!(outcome.error, Some(ErrorKind::DecodeFailure));
        assert!(outcome.text.contains("inspect_sql_db"));

        let outcome = gate.call("write_to_file", &json!({"filename": "app.db", "content": "x"}));
        assert_eq!(outcome.error, Some(ErrorKind::UnsupportedWrite));

        let outcome = gate.call("delete_file", &json!({"filename": "app.db"}));
        assert_eq!(outcome.text, "✅ Successfully deleted app.db");
    }
}
