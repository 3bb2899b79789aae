// Workspace Gate - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and MCP stdio server. All tool calls route through this gateway.
// Usage:
//   workspace-gate serve                                   # Run MCP server (stdio)
//   workspace-gate call <tool> '<json args>'               # One-shot tool call
//   workspace-gate tools                                   # Print tool definitions
//   workspace-gate status                                  # Show gateway status

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use workspace_gate::{
    codec::ContentKind,
    config::{GateConfig, ROOT_ENV},
    mcp,
    paths::SandboxRoot,
    ToolFacade,
};

#[derive(Parser)]
#[command(name = "workspace-gate")]
#[command(version)]
#[command(about = "Workspace Gate - sandboxed file and SQLite access over MCP")]
struct Cli {
    /// JSON config file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "workspace-gate.json")]
    config: PathBuf,

    /// Sandbox root directory (overrides config and WORKSPACE_GATE_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server (stdio JSON-RPC)
    Serve,

    /// One-shot tool call. Prints the text result, exits 1 on error
    Call {
        /// Tool name (list_files, read_file, run_sql_query, ...)
        tool: String,

        /// Arguments as JSON object string
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Print tool definitions as JSON
    Tools,

    /// Show gateway status
    Status,
}

fn main() -> Result<()> {
    // Initialize logging (safe if already init). stderr only: stdout is JSON-RPC.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .try_init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&mcp::tool_definitions())?);
        }

        Commands::Serve => {
            let (_, facade) = open_gate(&cli)?;
            mcp::run(&facade).context("MCP server I/O failed")?;
        }

        Commands::Call { tool, args } => {
            let args: serde_json::Value = serde_json::from_str(args)
                .with_context(|| format!("Invalid args JSON: {}", args))?;
            let (_, facade) = open_gate(&cli)?;

            let outcome = facade.call(tool, &args);
            println!("{}", outcome.text);

            if outcome.is_error() {
                std::process::exit(1);
            }
        }

        Commands::Status => {
            let (config, facade) = open_gate(&cli)?;
            let files = facade.files().list()?;
            let databases = files
                .iter()
                .filter(|f| matches!(facade.files().kind_of(f), Ok(ContentKind::Database)))
                .count();

            println!("Workspace Gate v{}", env!("CARGO_PKG_VERSION"));
            println!("Root: {:?}", facade.root().path());
            println!("Config: {:?}", cli.config);
            println!("Max write size: {} bytes", config.max_write_size);
            println!("Max rendered rows: {}", config.max_rows);
            match &config.audit_log {
                Some(path) => println!("Audit log: {:?}", path),
                None => println!("Audit log: (stderr only)"),
            }
            println!();
            println!("Files: {} ({} databases)", files.len(), databases);
        }
    }

    Ok(())
}

/// Load config (file, then env, then CLI), open the sandbox root and build the facade.
fn open_gate(cli: &Cli) -> Result<(GateConfig, ToolFacade)> {
    let config = GateConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?
        .with_overrides(std::env::var(ROOT_ENV).ok(), cli.root.clone());

    let root = SandboxRoot::open(&config.root)
        .with_context(|| format!("Failed to open sandbox root {:?}", config.root))?;
    config.validate(root.path())?;

    let facade = ToolFacade::new(Arc::new(root), &config);
    Ok((config, facade))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_needs_no_config() {
        let cli = Cli::try_parse_from(["workspace-gate", "--config", "/nonexistent/gate.json", "tools"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Tools));
    }

    #[test]
    fn open_gate_uses_cli_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        let config_path = dir.path().join("missing.json");
        let cli = Cli::try_parse_from([
            "workspace-gate",
            "--config",
            config_path.to_str().unwrap(),
            "--root",
            root.to_str().unwrap(),
            "status",
        ])
        .unwrap();

        let (config, facade) = open_gate(&cli).unwrap();
        assert_eq!(config.root, root);
        assert_eq!(facade.root().path(), root.canonicalize().unwrap());
        assert_eq!(facade.call("list_files", &serde_json::json!({})).text, "The workspace is empty.");
    }
}
