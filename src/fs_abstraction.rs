//! Document tree abstraction for cross-platform SAF operations.
//!
//! This module provides the seam between the bridge and the platform:
//! - Android: Storage Access Framework via tauri-plugin-android-fs
//!   (see `crate::android::saf::AndroidTree`)
//! - Desktop (Linux/Windows/macOS): [`LocalTree`], direct filesystem access
//!   via std::fs where the tree reference is a directory path
//!
//! The abstraction is intentionally minimal - only child lookup, creation,
//! deletion and stream opening. Path walking lives in `crate::resolver`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Result};
use crate::types::{Document, NodeKind, TreeRef, WriteMode};

pub type InputStream = Box<dyn Read + Send>;
pub type OutputStream = Box<dyn Write + Send>;

/// Operations a document provider must offer to the bridge.
///
/// Nodes are addressed by an opaque backend id. Lookups that find nothing
/// return `Ok(None)`; `Err` is reserved for provider failures.
pub trait DocumentTree {
    type Id: Clone;

    /// Root directory of a granted tree. `InvalidTree` if the reference does
    /// not resolve.
    fn root(&self, tree: &TreeRef) -> Result<Document<Self::Id>>;

    /// Direct child of `dir` with exactly this name.
    fn find_child(&self, dir: &Document<Self::Id>, name: &str) -> Result<Option<Document<Self::Id>>>;

    /// Names of the direct children of `dir`.
    fn child_names(&self, dir: &Document<Self::Id>) -> Result<Vec<String>>;

    fn create_directory(&self, parent: &Document<Self::Id>, name: &str) -> Result<Document<Self::Id>>;

    fn create_file(
        &self,
        parent: &Document<Self::Id>,
        name: &str,
        mime_type: &str,
    ) -> Result<Document<Self::Id>>;

    /// Delete a document; directories are removed with their contents.
    fn delete(&self, doc: &Document<Self::Id>) -> Result<()>;

    fn open_read(&self, doc: &Document<Self::Id>) -> Result<InputStream>;

    fn open_write(&self, doc: &Document<Self::Id>, mode: WriteMode) -> Result<OutputStream>;

    /// Persist read+write access to the tree across process launches.
    fn persist_permission(&self, tree: &TreeRef) -> Result<()>;
}

// ============================================================================
// Desktop Implementation (Linux, Windows, macOS)
// ============================================================================

/// Directory tree on the local filesystem.
///
/// Tree references are absolute directory paths or `file://` URIs. There is
/// no grant to persist on desktop, so persisting only checks the root.
#[derive(Clone, Debug, Default)]
pub struct LocalTree;

impl LocalTree {
    pub fn new() -> Self {
        Self
    }

    fn root_path(tree: &TreeRef) -> Result<PathBuf> {
        let raw = tree.as_str().trim();
        let path = match raw.strip_prefix("file://") {
            Some(rest) => urlencoding::decode(rest)
                .map_err(|e| BridgeError::InvalidTree(format!("{}: {}", raw, e)))?
                .into_owned(),
            None => raw.to_string(),
        };

        let path = PathBuf::from(path);
        if !path.is_absolute() {
            return Err(BridgeError::InvalidTree(format!("{} is not an absolute path", raw)));
        }
        if !path.is_dir() {
            return Err(BridgeError::InvalidTree(format!("{} is not a directory", raw)));
        }
        dunce::canonicalize(&path).map_err(|e| BridgeError::InvalidTree(format!("{}: {}", raw, e)))
    }

    fn document(path: PathBuf, kind: NodeKind) -> Document<PathBuf> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Document { id: path, name, kind }
    }
}

impl DocumentTree for LocalTree {
    type Id = PathBuf;

    fn root(&self, tree: &TreeRef) -> Result<Document<PathBuf>> {
        Ok(Self::document(Self::root_path(tree)?, NodeKind::Directory))
    }

    fn find_child(&self, dir: &Document<PathBuf>, name: &str) -> Result<Option<Document<PathBuf>>> {
        let path = dir.id.join(name);
        // Symlinks count as absent so no lookup leaves the root.
        match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(None),
            Ok(meta) => {
                let kind = if meta.is_dir() { NodeKind::Directory } else { NodeKind::File };
                Ok(Some(Self::document(path, kind)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::ListFailed(format!(
                "Failed to stat {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn child_names(&self, dir: &Document<PathBuf>) -> Result<Vec<String>> {
        let mut names = std::fs::read_dir(&dir.id)
            .map_err(|e| BridgeError::ListFailed(format!("Failed to read directory: {}", e)))?
            .filter_map(|entry| entry.ok())
            .filter(|e| !e.file_type().map(|t| t.is_symlink()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    fn create_directory(&self, parent: &Document<PathBuf>, name: &str) -> Result<Document<PathBuf>> {
        let path = parent.id.join(name);
        std::fs::create_dir(&path)
            .map_err(|e| BridgeError::CreateFailed(format!("Failed to create directory: {}: {}", name, e)))?;
        Ok(Self::document(path, NodeKind::Directory))
    }

    fn create_file(&self, parent: &Document<PathBuf>, name: &str, _mime_type: &str) -> Result<Document<PathBuf>> {
        let path = parent.id.join(name);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| BridgeError::CreateFailed(format!("Failed to create file: {}: {}", name, e)))?;
        Ok(Self::document(path, NodeKind::File))
    }

    fn delete(&self, doc: &Document<PathBuf>) -> Result<()> {
        let result = if doc.is_dir() {
            std::fs::remove_dir_all(&doc.id)
        } else {
            std::fs::remove_file(&doc.id)
        };
        result.map_err(|e| BridgeError::DeleteFailed(format!("Failed to delete {}: {}", doc.name, e)))
    }

    fn open_read(&self, doc: &Document<PathBuf>) -> Result<InputStream> {
        let file = File::open(&doc.id)
            .map_err(|e| BridgeError::OpenFailed(format!("Failed to open file for reading: {}", e)))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, doc: &Document<PathBuf>, mode: WriteMode) -> Result<OutputStream> {
        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Append => options.append(true),
            // No truncate: existing bytes past the written range survive.
            WriteMode::Overwrite => options.write(true),
        };
        let file = options
            .open(&doc.id)
            .map_err(|e| BridgeError::OpenFailed(format!("Failed to open file for writing: {}", e)))?;
        Ok(Box::new(file))
    }

    fn persist_permission(&self, tree: &TreeRef) -> Result<()> {
        Self::root_path(tree)
            .map(|_| ())
            .map_err(|e| BridgeError::PersistFailed(e.to_string()))
    }
}

/// Tree reference for a local directory, as handed out by the desktop picker.
pub fn local_tree_ref(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
