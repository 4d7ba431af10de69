//! Storage Access Framework bridge for Tauri.
//!
//! The webview asks for a user-granted directory tree, persists the grant,
//! and works with files inside it by path: existence checks, deletion,
//! listing, and streamed reads/writes through integer handles.
//!
//! Register the plugin with the application builder:
//!
//! ```ignore
//! tauri::Builder::default()
//!     .plugin(tauri_plugin_dialog::init())
//!     .plugin(saf_bridge::init())
//! ```
//!
//! and call `plugin:saf|call` with `{ method, args }`.

pub mod dispatch;
pub mod error;
pub mod fs_abstraction;
pub mod handles;
pub mod permissions;
pub mod resolver;
pub mod saf_plugin;
pub mod types;

#[cfg(target_os = "android")]
pub mod android;

pub use dispatch::{MethodCall, Operation, Reply, SafBridge};
pub use error::{BridgeError, ErrorReply};
pub use fs_abstraction::{DocumentTree, LocalTree};
pub use permissions::{PickCompletion, PickTicket};
pub use saf_plugin::{init, SafExt, SafPluginState};
pub use types::{Document, DocumentPath, Handle, NodeKind, SafConfig, TreeRef, WriteMode};
