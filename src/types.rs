//! Core data types for the SAF bridge
//!
//! This module contains the values passed between the dispatch layer and the
//! document tree backends:
//! - Tree references and document paths
//! - Resolved document nodes
//! - Stream handles and write modes
//! - Plugin configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::{BridgeError, Result};

/// MIME type the document provider uses for directories.
pub const DIRECTORY_MIME_TYPE: &str = "vnd.android.document/directory";

/// Opaque reference to a user-granted directory tree.
///
/// On Android this is a `content://` tree URI (or a serialized `FileUri`),
/// on desktop an absolute directory path or `file://` URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeRef(String);

impl TreeRef {
    /// Build a tree reference, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(BridgeError::InvalidArgument("treeUri is required".to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty list of child names leading from a tree root to a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentPath {
    parents: Vec<String>,
    name: String,
}

impl DocumentPath {
    pub fn new(mut segments: Vec<String>) -> Result<Self> {
        for segment in &segments {
            validate_segment(segment)?;
        }
        let name = segments
            .pop()
            .ok_or_else(|| BridgeError::InvalidArgument("path is required".to_string()))?;
        Ok(Self {
            parents: segments,
            name,
        })
    }

    /// All segments, root-most first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.parents
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
    }

    /// Parent segments and the final name.
    pub fn split_last(&self) -> (&[String], &str) {
        (&self.parents, &self.name)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for parent in &self.parents {
            write!(f, "{}/", parent)?;
        }
        f.write_str(&self.name)
    }
}

/// A segment names exactly one child, so separators and relative
/// components are rejected.
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(BridgeError::InvalidArgument("path segments must not be empty".to_string()));
    }
    if segment == "." || segment == ".." {
        return Err(BridgeError::InvalidArgument(format!(
            "path segment '{}' is not allowed",
            segment
        )));
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err(BridgeError::InvalidArgument(format!(
            "path segment '{}' contains a separator",
            segment
        )));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// A resolved file or directory inside a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document<Id> {
    pub id: Id,
    pub name: String,
    pub kind: NodeKind,
}

impl<Id> Document<Id> {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// How an output stream is positioned when it is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Start at offset 0 without truncating existing content.
    Overwrite,
    /// Start at the end of existing content.
    Append,
}

impl WriteMode {
    pub fn from_append(append: bool) -> Self {
        if append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        }
    }
}

/// Integer key for one open stream. Values start at 1 and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Validate a handle received from the shell.
    pub fn from_raw(raw: i64) -> Result<Self> {
        if raw <= 0 {
            return Err(BridgeError::InvalidArgument(format!("invalid handle: {}", raw)));
        }
        Ok(Self(raw as u64))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plugin configuration, read from `plugins.saf` in the Tauri config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafConfig {
    /// Upper bound for a single `read` call, whatever `maxBytes` asks for.
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: usize,
    /// Event emitted when a directory pick completes.
    #[serde(default = "default_pick_event")]
    pub pick_event: String,
}

impl Default for SafConfig {
    fn default() -> Self {
        Self {
            max_read_bytes: default_max_read_bytes(),
            pick_event: default_pick_event(),
        }
    }
}

impl SafConfig {
    /// Replace values that would make the bridge unusable with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_read_bytes == 0 {
            warn!("maxReadBytes is 0, using the default");
            self.max_read_bytes = default_max_read_bytes();
        }
        self
    }
}

fn default_max_read_bytes() -> usize {
    8 * 1024 * 1024
}

fn default_pick_event() -> String {
    "saf://pick-completed".to_string()
}
