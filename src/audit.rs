// Workspace Gate - Call Audit
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CALL / FAIL lines for every tool invocation.
// Always emitted through `log`; optionally appended to a file outside the root.

use chrono::Local;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

const SUMMARY_LIMIT: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    file: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn call(&self, tool: &str, args: &Value) {
        self.record(&format!("CALL {} | {}", tool, param_summary(tool, args)));
    }

    pub fn fail(&self, tool: &str, text: &str) {
        let snippet = truncate(text, SUMMARY_LIMIT);
        log::warn!("FAIL {} | {}", tool, snippet);
        self.append(&format!("FAIL {} | {}", tool, snippet));
    }

    fn record(&self, msg: &str) {
        log::info!("{}", msg);
        self.append(msg);
    }

    /// Best effort: an unwritable audit file never fails the call
    fn append(&self, msg: &str) {
        let Some(path) = &self.file else { return };
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(mut f) => {
                let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
                if let Err(e) = writeln!(f, "[{}] {}", ts, msg) {
                    log::warn!("audit log write failed: {}", e);
                }
            }
            Err(e) => log::warn!("audit log {:?} unavailable: {}", path, e),
        }
    }
}

/// Summarize tool params for logging (truncate large values)
fn param_summary(tool: &str, args: &Value) -> String {
    let filename = args.get("filename").and_then(|v| v.as_str()).unwrap_or("?");
    match tool {
        "list_files" => String::new(),
        "write_to_file" => {
            let size = args.get("content").and_then(|v| v.as_str()).map(|s| s.len()).unwrap_or(0);
            let mode = args.get("mode").and_then(|v| v.as_str()).unwrap_or("overwrite");
            format!("file={} mode={} content_len={}", filename, mode, size)
        }
        "run_sql_query" => {
            let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("?");
            format!("file={} query={}", filename, truncate(query, SUMMARY_LIMIT))
        }
        "read_file" | "delete_file" | "create_sql_db" | "inspect_sql_db" => {
            format!("file={}", filename)
        }
        _ => truncate(&args.to_string(), SUMMARY_LIMIT),
    }
}

/// Char-boundary safe truncation with an ellipsis
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}…", head)
    } else {
        s.to_string()
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

    #[test]
    fn summary_hides_write_content() {
        let summary = param_summary(
            "write_to_file",
            &json!({"filename": "a.txt", "content": "secret body", "mode": "append"}),
        );
        assert_eq!(summary, "file=a.txt mode=append content_len=11");
    }

    #[test]
    fn summary_truncates_long_queries() {
        let query = "x".repeat(500);
        let summary = param_summary("run_sql_query", &json!({"filename": "d.db", "query": query}));
        assert!(summary.ends_with('…'));
        assert!(summary.chars().count() < 250);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééé", 2), "éé…");
        assert_eq!(truncate("ab", 5), "ab");
    }

    #[test]
    fn appends_timestamped_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let audit = AuditLog::new(Some(path.clone()));

        audit.call("read_file", &json!({"filename": "a.txt"}));
        audit.fail("read_file", "Error: File 'a.txt' not found.");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("CALL read_file | file=a.txt"));
        assert!(lines[1].ends_with("FAIL read_file | Error: File 'a.txt' not found."));
    }

    #[test]
    fn missing_audit_dir_does_not_panic() {
        let dir = tempdir().unwrap();
        let audit = AuditLog::new(Some(dir.path().join("no/such/dir/audit.log")));
        audit.call("list_files", &json!({}));
    }
}
