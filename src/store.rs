// Workspace Gate - Confined File Store
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// list / read / write / delete over the flat sandbox directory.
// Every filename passes through SandboxRoot::resolve first.
// No caching, no metadata: each call sees the disk as it is.
//
// No file locking: concurrent writers to one file may interleave.

use crate::codec::{self, ContentKind};
use crate::error::{GateError, GateResult};
use crate::paths::SandboxRoot;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

impl FromStr for WriteMode {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" | "w" => Ok(WriteMode::Overwrite),
            "append" | "a" => Ok(WriteMode::Append),
            other => Err(GateError::InvalidArgument(format!(
                "unknown write mode '{}' (expected 'overwrite' or 'append')",
                other
            ))),
        }
    }
}

pub struct FileStore {
    root: Arc<SandboxRoot>,
    max_write_size: usize,
}

impl FileStore {
    pub fn new(root: Arc<SandboxRoot>, max_write_size: usize) -> Self {
        Self { root, max_write_size }
    }

    /// Names of regular files directly under the root, sorted.
    /// Symlinks and directories are not listed.
    pub fn list(&self) -> GateResult<Vec<String>> {
        let io_err = |e: std::io::Error| GateError::SystemError(format!("listing files: {}", e));

        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.root.path()).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.file_type().map_err(io_err)?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn read(&self, filename: &str) -> GateResult<String> {
        let path = self.root.resolve(filename)?;
        if !path.exists() {
            return Err(GateError::NotFound(filename.to_string()));
        }
        if !path.as_path().is_file() {
            return Err(GateError::InvalidArgument(format!("'{}' is not a regular file", filename)));
        }
        let kind = codec::classify(path.as_path());
        log::debug!("read {} as {:?}", path.name(), kind);
        codec::decode_for_read(&path, kind)
    }

    /// Write content verbatim; creates the file if absent. Returns bytes written.
    pub fn write(&self, filename: &str, content: &str, mode: WriteMode) -> GateResult<usize> {
        if content.len() > self.max_write_size {
            return Err(GateError::InvalidArgument(format!(
                "content is {} bytes, limit is {}",
                content.len(),
                self.max_write_size
            )));
        }

        let path = self.root.resolve(filename)?;
        codec::guard_write(&path, codec::classify(path.as_path()))?;

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Overwrite => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };

        let mut file = options
            .open(path.as_path())
            .map_err(|e| GateError::from_io(filename, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| GateError::from_io(filename, e))?;

        log::info!("wrote {} bytes to {} ({:?})", content.len(), path.name(), mode);
        Ok(content.len())
    }

    /// Remove a file of any kind. Databases are deletable even though
    /// they are not text-writable.
    pub fn delete(&self, filename: &str) -> GateResult<()> {
        let path = self.root.resolve(filename)?;
        if !path.exists() {
            return Err(GateError::NotFound(filename.to_string()));
        }
        std::fs::remove_file(path.as_path()).map_err(|e| GateError::from_io(filename, e))?;
        log::info!("deleted {}", path.name());
        Ok(())
    }

    /// Kind of an existing file, used for status reporting
    pub fn kind_of(&self, filename: &str) -> GateResult<ContentKind> {
        let path = self.root.resolve(filename)?;
        Ok(codec::classify(path.as_path()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
