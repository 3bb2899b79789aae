// Workspace Gate - MCP Server (JSON-RPC 2.0 over stdio)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// ALL tool calls route through this gateway.
// Exposes: list_files, read_file, write_to_file, delete_file,
//          create_sql_db, inspect_sql_db, run_sql_query

use crate::facade::{Tool, ToolFacade};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "workspace-gate";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;

/// MCP tool definition helper
fn tool_def(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

fn filename_prop(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

/// Return all tool definitions
pub fn tool_definitions() -> Vec<Value> {
    Tool::ALL.iter().map(|tool| definition(*tool)).collect()
}

fn definition(tool: Tool) -> Value {
    let name = tool.as_str();
    match tool {
        // ====== FILE SYSTEM TOOLS ======
        Tool::ListFiles => tool_def(
            name,
            "Lists all files currently in the workspace.",
            json!({}),
            vec![],
        ),
        Tool::ReadFile => tool_def(
            name,
            "Reads a file (txt, md, py, json, pdf, docx). For .db/.sqlite files, use 'inspect_sql_db' instead.",
            json!({ "filename": filename_prop("Name of a file in the workspace") }),
            vec!["filename"],
        ),
        Tool::WriteToFile => tool_def(
            name,
            "Creates or edits a text-based file. Existing PDF, DOCX and database files cannot be written.",
            json!({
                "filename": filename_prop("Name of the file to create or edit"),
                "content": {"type": "string", "description": "Text to write, exactly as given"},
                "mode": {
                    "type": "string",
                    "enum": ["overwrite", "append", "w", "a"],
                    "description": "overwrite (w) or append (a)",
                    "default": "overwrite"
                }
            }),
            vec!["filename", "content"],
        ),
        Tool::DeleteFile => tool_def(
            name,
            "Permanently deletes a file from the workspace. Works for any file type including databases.",
            json!({ "filename": filename_prop("Name of the file to delete") }),
            vec!["filename"],
        ),

        // ====== DATABASE TOOLS ======
        Tool::CreateSqlDb => tool_def(
            name,
            "Creates a new empty SQLite database file. Filename must end in .db or .sqlite",
            json!({ "filename": filename_prop("New database filename (.db or .sqlite)") }),
            vec!["filename"],
        ),
        Tool::InspectSqlDb => tool_def(
            name,
            "Inspects a SQLite database schema (tables and columns).",
            json!({ "filename": filename_prop("Database filename") }),
            vec!["filename"],
        ),
        Tool::RunSqlQuery => tool_def(
            name,
            "Executes one SQL statement (SELECT, INSERT, UPDATE, DELETE, CREATE TABLE). Auto-commits changes.",
            json!({
                "filename": filename_prop("Database filename"),
                "query": {"type": "string", "description": "A single SQL statement"}
            }),
            vec!["filename", "query"],
        ),
    }
}

fn response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Handle one JSON-RPC line. `None` means nothing is sent back
/// (notifications, blank lines).
pub fn handle_line(facade: &ToolFacade, line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let msg: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("JSON parse error: {}", e);
            return Some(error_response(&Value::Null, PARSE_ERROR, &format!("Parse error: {}", e)));
        }
    };

    let method = msg["method"].as_str().unwrap_or("");
    let id = &msg["id"];
    let params = &msg["params"];

    log::debug!("Received: {}", method);

    match method {
        "initialize" => Some(response(id, json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            }
        }))),

        "notifications/initialized" => None,

        "tools/list" => Some(response(id, json!({ "tools": tool_definitions() }))),

        "tools/call" => {
            let name = params["name"].as_str().unwrap_or("");
            let args = params.get("arguments").cloned().unwrap_or(json!({}));

            let outcome = facade.call(name, &args);

            Some(response(id, json!({
                "content": [{"type": "text", "text": outcome.text}],
                "isError": outcome.is_error(),
            })))
        }

        "ping" => Some(response(id, json!({}))),

        _ => {
            if id.is_null() {
                None
            } else {
                Some(error_response(id, METHOD_NOT_FOUND, &format!("Unknown method: {}", method)))
            }
        }
    }
}

/// Serve line-delimited JSON-RPC until input closes.
pub fn serve<R: BufRead, W: Write>(facade: &ToolFacade, input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("stdin read error: {}", e);
                continue;
            }
        };

        if let Some(reply) = handle_line(facade, &line) {
            match serde_json::to_string(&reply) {
                Ok(msg) => {
                    output.write_all(msg.as_bytes())?;
                    output.write_all(b"\n")?;
                    output.flush()?;
                }
                Err(e) => log::error!("failed to encode response: {}", e),
            }
        }
    }
    Ok(())
}

/// Run MCP server on stdio. Blocks until stdin closes.
pub fn run(facade: &ToolFacade) -> io::Result<()> {
    log::info!("Starting {} v{}", SERVER_NAME, SERVER_VERSION);
    log::info!("Root: {:?}", facade.root().path());

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(facade, stdin.lock(), stdout.lock())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_cover_every_tool() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), Tool::ALL.len());
        for (def, tool) in defs.iter().zip(Tool::ALL) {
            assert_eq!(def["name"], tool.as_str());
            assert_eq!(def["inputSchema"]["type"], "object");
        }
    }

    #[test]
    fn write_schema_requires_filename_and_content() {
        let def = definition(Tool::WriteToFile);
        assert_eq!(def["inputSchema"]["required"], json!(["filename", "content"]));
        assert_eq!(def["inputSchema"]["properties"]["mode"]["default"], "overwrite");
    }

    #[test]
    fn query_schema_requires_query() {
        let def = definition(Tool::RunSqlQuery);
        assert_eq!(def["inputSchema"]["required"], json!(["filename", "query"]));
    }

    #[test]
    fn error_response_shape() {
        let reply = error_response(&json!(3), METHOD_NOT_FOUND, "Unknown method: x");
        assert_eq!(reply["id"], 3);
        assert_eq!(reply["error"]["code"], -32601);
    }
}
