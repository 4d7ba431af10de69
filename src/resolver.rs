//! Path resolution inside a granted tree.
//!
//! Documents have no identity beyond their path, so every operation walks
//! from the tree root again. Nothing is cached between calls.

use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::fs_abstraction::DocumentTree;
use crate::types::{Document, DocumentPath, TreeRef};

/// Find the document at `path`, or `None` if any step is missing or an
/// intermediate node is not a directory.
pub fn resolve<T: DocumentTree>(
    tree: &T,
    tree_ref: &TreeRef,
    path: &DocumentPath,
) -> Result<Option<Document<T::Id>>> {
    let mut current = tree.root(tree_ref)?;
    for segment in path.segments() {
        if !current.is_dir() {
            return Ok(None);
        }
        match tree.find_child(&current, segment)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Find or create the file at `path`, creating missing parent directories.
///
/// An existing file is reused as is. A directory occupying the file's name
/// is deleted, contents included, and replaced by a new file.
pub fn resolve_or_create<T: DocumentTree>(
    tree: &T,
    tree_ref: &TreeRef,
    path: &DocumentPath,
    mime_type: &str,
) -> Result<Document<T::Id>> {
    let (parents, file_name) = path.split_last();

    let mut dir = tree.root(tree_ref)?;
    for segment in parents {
        dir = match tree.find_child(&dir, segment)? {
            Some(existing) if existing.is_dir() => existing,
            _ => {
                debug!(segment = %segment, "creating directory");
                tree.create_directory(&dir, segment).map_err(|e| match e {
                    BridgeError::CreateFailed(_) => e,
                    other => BridgeError::CreateFailed(format!(
                        "Failed to create directory: {}: {}",
                        segment, other
                    )),
                })?
            }
        };
    }

    match tree.find_child(&dir, file_name)? {
        Some(existing) if existing.is_file() => return Ok(existing),
        Some(existing) => {
            debug!(name = %file_name, "replacing directory with file");
            tree.delete(&existing)?;
        }
        None => {}
    }

    tree.create_file(&dir, file_name, mime_type).map_err(|e| match e {
        BridgeError::CreateFailed(_) => e,
        other => BridgeError::CreateFailed(format!("Failed to create file: {}: {}", file_name, other)),
    })
}
