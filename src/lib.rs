// Workspace Gate - Library Root
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// All modules exported here for use by the binary and tests.

pub mod audit;
pub mod codec;
pub mod config;
pub mod error;
pub mod facade;
pub mod mcp;
pub mod paths;
pub mod sql;
pub mod store;

pub use error::{ErrorKind, GateError, GateResult};
pub use facade::{Tool, ToolFacade, ToolOutcome};
