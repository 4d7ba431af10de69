//! Storage Access Framework (SAF) document tree for Android.
//!
//! This module implements [`DocumentTree`] on top of Android's SAF, which
//! allows access to user-selected directories via `content://` URIs.
//!
//! Uses tauri-plugin-android-fs for the actual SAF operations.
//!
//! Tree references are either plain `content://` tree URIs or FileUri JSON.
//! Format:
//! {"uri":"content://...","documentTopTreeUri":null}

#![cfg(target_os = "android")]

use tauri::AppHandle;
use tauri_plugin_android_fs::{AndroidFsExt, Entry, FileAccessMode, FileUri};

use crate::error::{BridgeError, Result};
use crate::fs_abstraction::{DocumentTree, InputStream, OutputStream};
use crate::types::{Document, NodeKind, TreeRef, WriteMode, DIRECTORY_MIME_TYPE};

/// Parse a tree reference into a FileUri.
///
/// References handed out by the picker are JSON-serialized FileUri objects;
/// a bare `content://` URI is wrapped in minimal JSON.
fn parse_uri(raw: &str) -> Result<FileUri> {
    let raw = raw.trim();
    if raw.starts_with('{') {
        FileUri::from_json_str(raw)
            .map_err(|e| BridgeError::InvalidTree(format!("Failed to parse FileUri JSON: {:?}", e)))
    } else {
        let json = serde_json::json!({ "uri": raw, "documentTopTreeUri": null }).to_string();
        FileUri::from_json_str(&json)
            .map_err(|e| BridgeError::InvalidTree(format!("Failed to create FileUri from URI: {:?}", e)))
    }
}

/// Convert a FileUri to the string handed to the shell.
pub fn uri_to_string(uri: &FileUri) -> String {
    uri.to_json_string().unwrap_or_else(|_| String::new())
}

/// SAF-backed document tree.
pub struct AndroidTree {
    app: AppHandle,
}

impl AndroidTree {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl DocumentTree for AndroidTree {
    type Id = FileUri;

    fn root(&self, tree: &TreeRef) -> Result<Document<FileUri>> {
        let api = self.app.android_fs();
        let uri = parse_uri(tree.as_str())?;

        // Name lookup fails when the grant is gone or the URI is malformed.
        let name = api
            .get_name(&uri)
            .map_err(|e| BridgeError::InvalidTree(format!("{:?}", e)))?;
        let mime = api
            .get_mime_type(&uri)
            .map_err(|e| BridgeError::InvalidTree(format!("{:?}", e)))?;
        if mime != DIRECTORY_MIME_TYPE {
            return Err(BridgeError::InvalidTree(format!("{} is not a directory", tree)));
        }

        Ok(Document {
            id: uri,
            name,
            kind: NodeKind::Directory,
        })
    }

    fn find_child(&self, dir: &Document<FileUri>, name: &str) -> Result<Option<Document<FileUri>>> {
        let api = self.app.android_fs();
        let entries = api
            .read_dir(&dir.id)
            .map_err(|e| BridgeError::ListFailed(format!("Failed to read directory: {:?}", e)))?;

        for entry in entries {
            let doc = match entry {
                Entry::File { name, uri, .. } => Document { id: uri, name, kind: NodeKind::File },
                Entry::Dir { name, uri, .. } => Document { id: uri, name, kind: NodeKind::Directory },
            };
            if doc.name == name {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    fn child_names(&self, dir: &Document<FileUri>) -> Result<Vec<String>> {
        let api = self.app.android_fs();
        let entries = api
            .read_dir(&dir.id)
            .map_err(|e| BridgeError::ListFailed(format!("Failed to read directory: {:?}", e)))?;

        Ok(entries
            .map(|entry| match entry {
                Entry::File { name, .. } => name,
                Entry::Dir { name, .. } => name,
            })
            .collect())
    }

    fn create_directory(&self, parent: &Document<FileUri>, name: &str) -> Result<Document<FileUri>> {
        let api = self.app.android_fs();
        let uri = api
            .create_new_file(&parent.id, name, Some(DIRECTORY_MIME_TYPE))
            .map_err(|e| BridgeError::CreateFailed(format!("Failed to create directory: {}: {:?}", name, e)))?;

        Ok(Document {
            id: uri,
            name: name.to_string(),
            kind: NodeKind::Directory,
        })
    }

    fn create_file(&self, parent: &Document<FileUri>, name: &str, mime_type: &str) -> Result<Document<FileUri>> {
        let api = self.app.android_fs();
        let uri = api
            .create_new_file(&parent.id, name, Some(mime_type))
            .map_err(|e| BridgeError::CreateFailed(format!("Failed to create file: {}: {:?}", name, e)))?;

        // The provider may adjust the display name (e.g. append an extension).
        let name = api.get_name(&uri).unwrap_or_else(|_| name.to_string());
        Ok(Document {
            id: uri,
            name,
            kind: NodeKind::File,
        })
    }

    fn delete(&self, doc: &Document<FileUri>) -> Result<()> {
        let api = self.app.android_fs();
        let result = if doc.is_dir() {
            api.remove_dir_all(&doc.id)
        } else {
            api.remove_file(&doc.id)
        };
        result.map_err(|e| BridgeError::DeleteFailed(format!("Failed to delete document: {:?}", e)))
    }

    fn open_read(&self, doc: &Document<FileUri>) -> Result<InputStream> {
        let api = self.app.android_fs();
        let file = api
            .open_file(&doc.id, FileAccessMode::Read)
            .map_err(|e| BridgeError::OpenFailed(format!("Failed to open file for reading: {:?}", e)))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, doc: &Document<FileUri>, mode: WriteMode) -> Result<OutputStream> {
        let api = self.app.android_fs();
        // "rw" never truncates, whatever the provider does with "w"; "wa" appends.
        let access = match mode {
            WriteMode::Overwrite => FileAccessMode::ReadWrite,
            WriteMode::Append => FileAccessMode::WriteAppend,
        };
        let file = api
            .open_file(&doc.id, access)
            .map_err(|e| BridgeError::OpenFailed(format!("Failed to open file for writing: {:?}", e)))?;
        Ok(Box::new(file))
    }

    fn persist_permission(&self, tree: &TreeRef) -> Result<()> {
        let api = self.app.android_fs_async();
        let uri = parse_uri(tree.as_str()).map_err(|e| BridgeError::PersistFailed(e.to_string()))?;

        // Use block_on to call async method from sync context
        tauri::async_runtime::block_on(async {
            api.file_picker()
                .persist_uri_permission(&uri)
                .await
                .map_err(|e| BridgeError::PersistFailed(format!("Failed to persist permission: {:?}", e)))
        })
    }
}

/// Open the SAF directory picker. Returns the picked tree as FileUri JSON,
/// or `None` if the user cancelled.
pub async fn pick_directory(app: &AppHandle) -> std::result::Result<Option<String>, String> {
    let api = app.android_fs_async();

    match api.file_picker().pick_dir(None, false).await {
        Ok(Some(uri)) => Ok(Some(uri_to_string(&uri))),
        Ok(None) => Ok(None),
        Err(e) => Err(format!("Directory picker failed: {:?}", e)),
    }
}
