//! Method dispatch for the SAF channel.
//!
//! The shell sends a method name plus a JSON object of arguments. Each call
//! runs to completion against the bridge session before the next one is
//! served; the only thing left pending between calls is a directory pick.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, ErrorReply, Result};
use crate::fs_abstraction::DocumentTree;
use crate::handles::HandleTable;
use crate::permissions::{self, PickCompletion, PickSession, PickTicket};
use crate::resolver;
use crate::types::{DocumentPath, Handle, SafConfig, TreeRef, WriteMode};

/// One call received over the channel.
#[derive(Clone, Debug, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Outcome of a call, as sent back to the shell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Reply {
    Success { value: Value },
    Error(ErrorReply),
    NotImplemented,
    /// A picker request was accepted; the tree arrives with the completion
    /// event carrying the same ticket.
    PickStarted { ticket: PickTicket },
}

impl Reply {
    fn success(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Reply::Success { value },
            Err(e) => Reply::Error(ErrorReply::new("internal", e.to_string())),
        }
    }
}

/// Operations understood by the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    PickTree,
    PersistPermission,
    Exists,
    Delete,
    ListChildren,
    OpenWrite,
    Write,
    CloseWrite,
    OpenRead,
    Read,
    CloseRead,
}

impl Operation {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "pickTree" => Operation::PickTree,
            "persistPermission" => Operation::PersistPermission,
            "exists" => Operation::Exists,
            "delete" => Operation::Delete,
            "listChildren" => Operation::ListChildren,
            "openWrite" => Operation::OpenWrite,
            "write" => Operation::Write,
            "closeWrite" => Operation::CloseWrite,
            "openRead" => Operation::OpenRead,
            "read" => Operation::Read,
            "closeRead" => Operation::CloseRead,
            _ => return None,
        })
    }

    /// Error code reported for failures that have no more specific code.
    ///
    /// `None` for operations that either never fail or only fail with an
    /// error that carries its own code (`busy`).
    pub fn failure_code(self) -> Option<&'static str> {
        match self {
            Operation::PersistPermission => Some("persist_failed"),
            Operation::Exists => Some("exists_failed"),
            Operation::Delete => Some("delete_failed"),
            Operation::ListChildren => Some("list_failed"),
            Operation::OpenWrite => Some("open_write_failed"),
            Operation::Write => Some("write_failed"),
            Operation::OpenRead => Some("open_read_failed"),
            Operation::Read => Some("read_failed"),
            Operation::PickTree | Operation::CloseWrite | Operation::CloseRead => None,
        }
    }
}

// ── Argument decoding ───────────────────────────────────────────────────────
//
// Each operation decodes only the fields it declares; anything else in the
// argument object is ignored.

fn decode<A: DeserializeOwned>(args: Value) -> Result<A> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args)
        .map_err(|e| BridgeError::InvalidArgument(format!("malformed arguments: {}", e)))
}

fn tree_and_path(tree_uri: &Option<String>, path: &Option<Vec<String>>) -> Result<(TreeRef, DocumentPath)> {
    match (tree_uri, path) {
        (Some(tree), Some(path)) if !tree.trim().is_empty() && !path.is_empty() => {
            Ok((TreeRef::parse(tree)?, DocumentPath::new(path.clone())?))
        }
        _ => Err(BridgeError::InvalidArgument("treeUri and path are required".to_string())),
    }
}

/// Handle for a close call. Anything unusable is treated as "nothing to close".
fn close_handle(args: &Value) -> Option<Handle> {
    args.get("handle")
        .and_then(Value::as_i64)
        .and_then(|raw| Handle::from_raw(raw).ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeArgs {
    tree_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathArgs {
    tree_uri: Option<String>,
    path: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenWriteArgs {
    tree_uri: Option<String>,
    path: Option<Vec<String>>,
    mime_type: Option<String>,
    append: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    handle: Option<i64>,
    bytes: Option<Bytes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadArgs {
    handle: Option<i64>,
    max_bytes: Option<i64>,
}

/// Byte payloads arrive either base64 encoded or as an array of numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bytes {
    Base64(String),
    Raw(Vec<u8>),
}

impl Bytes {
    fn into_vec(self) -> Result<Vec<u8>> {
        match self {
            Bytes::Base64(s) => STANDARD
                .decode(&s)
                .map_err(|e| BridgeError::InvalidArgument(format!("bytes is not valid base64: {}", e))),
            Bytes::Raw(v) => Ok(v),
        }
    }
}

// ── Bridge session ──────────────────────────────────────────────────────────

/// All state one channel needs: the document backend, open streams and
/// the picker session.
pub struct SafBridge<T: DocumentTree> {
    tree: T,
    handles: HandleTable,
    picker: PickSession,
    config: SafConfig,
}

impl<T: DocumentTree> SafBridge<T> {
    pub fn new(tree: T, config: SafConfig) -> Self {
        Self {
            tree,
            handles: HandleTable::new(),
            picker: PickSession::new(),
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &SafConfig {
        &self.config
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn picker(&self) -> &PickSession {
        &self.picker
    }

    /// Serve one call.
    pub fn handle(&mut self, call: MethodCall) -> Reply {
        let Some(op) = Operation::from_name(&call.method) else {
            debug!(method = %call.method, "not implemented");
            return Reply::NotImplemented;
        };
        debug!(method = %call.method, "dispatching");

        match self.run(op, call.args) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(method = %call.method, error = %e, "call failed");
                Reply::Error(ErrorReply::from_error(op.failure_code(), &e))
            }
        }
    }

    /// Route a completed picker request back into the session.
    pub fn complete_pick(&mut self, ticket: PickTicket, picked: Option<String>) -> Option<PickCompletion> {
        permissions::complete_pick(&mut self.picker, &self.tree, ticket, picked)
    }

    /// Release every open stream.
    pub fn close_all(&mut self) {
        self.handles.close_all();
    }

    fn run(&mut self, op: Operation, args: Value) -> Result<Reply> {
        match op {
            Operation::PickTree => {
                let ticket = self.picker.begin()?;
                Ok(Reply::PickStarted { ticket })
            }
            Operation::PersistPermission => {
                let args: TreeArgs = decode(args)?;
                permissions::persist(&self.tree, args.tree_uri.as_deref())?;
                Ok(Reply::success(()))
            }
            Operation::Exists => {
                let args: PathArgs = decode(args)?;
                let (tree_ref, path) = tree_and_path(&args.tree_uri, &args.path)?;
                let doc = resolver::resolve(&self.tree, &tree_ref, &path)?;
                Ok(Reply::success(doc.is_some()))
            }
            Operation::Delete => {
                let args: PathArgs = decode(args)?;
                let (tree_ref, path) = tree_and_path(&args.tree_uri, &args.path)?;
                if let Some(doc) = resolver::resolve(&self.tree, &tree_ref, &path)? {
                    self.tree.delete(&doc)?;
                }
                Ok(Reply::success(()))
            }
            Operation::ListChildren => {
                let args: PathArgs = decode(args)?;
                let (tree_ref, path) = tree_and_path(&args.tree_uri, &args.path)?;
                let names = match resolver::resolve(&self.tree, &tree_ref, &path)? {
                    Some(doc) if doc.is_dir() => self.tree.child_names(&doc)?,
                    _ => Vec::new(),
                };
                Ok(Reply::success(names))
            }
            Operation::OpenWrite => {
                let args: OpenWriteArgs = decode(args)?;
                let mime_type = args.mime_type.as_deref().unwrap_or_default();
                if mime_type.trim().is_empty() {
                    return Err(BridgeError::InvalidArgument(
                        "treeUri, path, mimeType required".to_string(),
                    ));
                }
                let (tree_ref, path) = tree_and_path(&args.tree_uri, &args.path)?;
                let mode = WriteMode::from_append(args.append.unwrap_or(false));
                let doc = resolver::resolve_or_create(&self.tree, &tree_ref, &path, mime_type)?;
                let stream = self.tree.open_write(&doc, mode)?;
                Ok(Reply::success(self.handles.open_write(stream)))
            }
            Operation::Write => {
                let args: WriteArgs = decode(args)?;
                let handle = Handle::from_raw(args.handle.unwrap_or(-1))?;
                let bytes = args
                    .bytes
                    .ok_or_else(|| BridgeError::InvalidArgument("invalid handle/bytes".to_string()))?
                    .into_vec()?;
                self.handles.write(handle, &bytes)?;
                Ok(Reply::success(()))
            }
            Operation::CloseWrite => {
                if let Some(handle) = close_handle(&args) {
                    self.handles.close_write(handle);
                }
                Ok(Reply::success(()))
            }
            Operation::OpenRead => {
                let args: PathArgs = decode(args)?;
                let (tree_ref, path) = tree_and_path(&args.tree_uri, &args.path)?;
                let doc = match resolver::resolve(&self.tree, &tree_ref, &path)? {
                    Some(doc) if doc.is_file() => doc,
                    _ => return Err(BridgeError::NotFound("file not found".to_string())),
                };
                let stream = self.tree.open_read(&doc)?;
                Ok(Reply::success(self.handles.open_read(stream)))
            }
            Operation::Read => {
                let args: ReadArgs = decode(args)?;
                let handle = Handle::from_raw(args.handle.unwrap_or(-1))?;
                let max_bytes = args.max_bytes.unwrap_or(0);
                if max_bytes <= 0 {
                    return Err(BridgeError::InvalidArgument("invalid handle/maxBytes".to_string()));
                }
                let max_bytes = usize::try_from(max_bytes)
                    .unwrap_or(usize::MAX)
                    .min(self.config.max_read_bytes);
                let bytes = self.handles.read(handle, max_bytes)?;
                Ok(Reply::success(STANDARD.encode(bytes)))
            }
            Operation::CloseRead => {
                if let Some(handle) = close_handle(&args) {
                    self.handles.close_read(handle);
                }
                Ok(Reply::success(()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_abstraction::{local_tree_ref, LocalTree};
    use serde_json::json;

    struct Fixture {
        dir: tempfile::TempDir,
        bridge: SafBridge<LocalTree>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                bridge: SafBridge::new(LocalTree::new(), SafConfig::default()),
            }
        }

        fn tree_uri(&self) -> String {
            local_tree_ref(self.dir.path())
        }

        fn call(&mut self, method: &str, args: Value) -> Reply {
            self.bridge.handle(MethodCall::new(method, args))
        }

        fn ok(&mut self, method: &str, args: Value) -> Value {
            match self.call(method, args) {
                Reply::Success { value } => value,
                other => panic!("{} failed: {:?}", method, other),
            }
        }

        fn err(&mut self, method: &str, args: Value) -> ErrorReply {
            match self.call(method, args) {
                Reply::Error(e) => e,
                other => panic!("{} unexpectedly returned {:?}", method, other),
            }
        }

        fn open_write(&mut self, path: &[&str], append: bool) -> i64 {
            let tree_uri = self.tree_uri();
            self.ok(
                "openWrite",
                json!({ "treeUri": tree_uri, "path": path, "mimeType": "text/plain", "append": append }),
            )
            .as_i64()
            .unwrap()
        }

        fn write(&mut self, handle: i64, bytes: &[u8]) {
            self.ok("write", json!({ "handle": handle, "bytes": STANDARD.encode(bytes) }));
        }

        fn read_all(&mut self, path: &[&str], chunk: i64) -> Vec<u8> {
            let tree_uri = self.tree_uri();
            let handle = self.ok("openRead", json!({ "treeUri": tree_uri, "path": path }));
            let mut out = Vec::new();
            loop {
                let value = self.ok("read", json!({ "handle": handle, "maxBytes": chunk }));
                let bytes = STANDARD.decode(value.as_str().unwrap()).unwrap();
                if bytes.is_empty() {
                    break;
                }
                out.extend(bytes);
            }
            self.ok("closeRead", json!({ "handle": handle }));
            out
        }
    }

    #[test]
    fn test_missing_paths_are_absent() {
        let mut fx = Fixture::new();
        let tree_uri = fx.tree_uri();
        let args = json!({ "treeUri": tree_uri, "path": ["no", "such", "file"] });

        assert_eq!(fx.ok("exists", args.clone()), json!(false));
        assert_eq!(fx.ok("listChildren", args.clone()), json!([]));
        assert_eq!(fx.ok("delete", args.clone()), Value::Null);
        assert_eq!(fx.err("openRead", args).code, "not_found");
    }

    #[test]
    fn test_write_then_read_back() {
        let mut fx = Fixture::new();
        let h = fx.open_write(&["audio", "book", "part1.txt"], false);
        fx.write(h, b"first chunk,");
        fx.write(h, b" second chunk");
        fx.ok("closeWrite", json!({ "handle": h }));

        assert_eq!(fx.read_all(&["audio", "book", "part1.txt"], 4), b"first chunk, second chunk");

        let tree_uri = fx.tree_uri();
        assert_eq!(
            fx.ok("listChildren", json!({ "treeUri": tree_uri, "path": ["audio", "book"] })),
            json!(["part1.txt"])
        );
        assert_eq!(
            fx.ok("exists", json!({ "treeUri": tree_uri, "path": ["audio"] })),
            json!(true)
        );
    }

    #[test]
    fn test_append_and_reuse_policy() {
        let mut fx = Fixture::new();
        let h = fx.open_write(&["log.txt"], false);
        fx.write(h, b"hello world");
        fx.ok("closeWrite", json!({ "handle": h }));

        let h = fx.open_write(&["log.txt"], true);
        fx.write(h, b"!");
        fx.ok("closeWrite", json!({ "handle": h }));
        assert_eq!(fx.read_all(&["log.txt"], 64), b"hello world!");

        // Reopening without append reuses the file without truncating it.
        let h = fx.open_write(&["log.txt"], false);
        fx.ok("closeWrite", json!({ "handle": h }));
        assert_eq!(fx.read_all(&["log.txt"], 64), b"hello world!");

        let h = fx.open_write(&["log.txt"], false);
        fx.write(h, b"HELLO");
        fx.ok("closeWrite", json!({ "handle": h }));
        assert_eq!(fx.read_all(&["log.txt"], 64), b"HELLO world!");
    }

    #[test]
    fn test_bounded_read_sequence() {
        let mut fx = Fixture::new();
        std::fs::write(fx.dir.path().join("data.bin"), b"0123456789").unwrap();
        let tree_uri = fx.tree_uri();
        let h = fx.ok("openRead", json!({ "treeUri": tree_uri, "path": ["data.bin"] }));

        let read = |fx: &mut Fixture| {
            let v = fx.ok("read", json!({ "handle": h, "maxBytes": 4 }));
            STANDARD.decode(v.as_str().unwrap()).unwrap()
        };
        assert_eq!(read(&mut fx), b"0123");
        assert_eq!(read(&mut fx), b"4567");
        assert_eq!(read(&mut fx), b"89");
        assert!(read(&mut fx).is_empty());
    }

    #[test]
    fn test_read_capped_by_config() {
        let mut fx = Fixture::new();
        fx.bridge = SafBridge::new(
            LocalTree::new(),
            SafConfig {
                max_read_bytes: 3,
                ..SafConfig::default()
            },
        );
        std::fs::write(fx.dir.path().join("data.bin"), b"abcdef").unwrap();
        let tree_uri = fx.tree_uri();
        let h = fx.ok("openRead", json!({ "treeUri": tree_uri, "path": ["data.bin"] }));

        let v = fx.ok("read", json!({ "handle": h, "maxBytes": 1000 }));
        assert_eq!(STANDARD.decode(v.as_str().unwrap()).unwrap(), b"abc");
    }

    #[test]
    fn test_zero_read_cap_falls_back_to_default() {
        let mut fx = Fixture::new();
        fx.bridge = SafBridge::new(
            LocalTree::new(),
            SafConfig {
                max_read_bytes: 0,
                ..SafConfig::default()
            },
        );
        assert_eq!(fx.bridge.config().max_read_bytes, SafConfig::default().max_read_bytes);

        std::fs::write(fx.dir.path().join("data.bin"), b"abcdef").unwrap();
        assert_eq!(fx.read_all(&["data.bin"], 4), b"abcdef");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_does_not_escape_tree() {
        let mut fx = Fixture::new();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), b"keep").unwrap();
        std::os::unix::fs::symlink(outside.path(), fx.dir.path().join("out")).unwrap();
        let tree_uri = fx.tree_uri();

        let args = json!({ "treeUri": tree_uri, "path": ["out", "secret.txt"] });
        assert_eq!(fx.ok("exists", args.clone()), json!(false));
        assert_eq!(fx.err("openRead", args.clone()).code, "not_found");
        fx.ok("delete", args);
        assert_eq!(
            fx.err(
                "openWrite",
                json!({ "treeUri": tree_uri, "path": ["out", "secret.txt"], "mimeType": "text/plain" })
            )
            .code,
            "open_write_failed"
        );
        assert_eq!(std::fs::read(outside.path().join("secret.txt")).unwrap(), b"keep");
    }

    #[test]
    fn test_directory_replaced_by_file() {
        let mut fx = Fixture::new();
        let clash = fx.dir.path().join("notes");
        std::fs::create_dir(&clash).unwrap();
        std::fs::write(clash.join("inner.txt"), b"old").unwrap();

        let h = fx.open_write(&["notes"], false);
        fx.write(h, b"new");
        fx.ok("closeWrite", json!({ "handle": h }));

        assert!(clash.is_file());
        assert_eq!(fx.read_all(&["notes"], 16), b"new");
    }

    #[test]
    fn test_open_read_on_directory() {
        let mut fx = Fixture::new();
        std::fs::create_dir(fx.dir.path().join("folder")).unwrap();
        let tree_uri = fx.tree_uri();

        let err = fx.err("openRead", json!({ "treeUri": tree_uri, "path": ["folder"] }));
        assert_eq!(err.code, "not_found");
        assert_eq!(
            fx.ok("listChildren", json!({ "treeUri": tree_uri, "path": ["folder"] })),
            json!([])
        );
    }

    #[test]
    fn test_delete_directory() {
        let mut fx = Fixture::new();
        let sub = fx.dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("a.txt"), b"a").unwrap();
        let tree_uri = fx.tree_uri();

        fx.ok("delete", json!({ "treeUri": tree_uri, "path": ["sub"] }));
        assert!(!sub.exists());
    }

    #[test]
    fn test_bad_arguments() {
        let mut fx = Fixture::new();
        let tree_uri = fx.tree_uri();

        assert_eq!(fx.err("exists", json!({ "path": ["a"] })).code, "bad_args");
        assert_eq!(fx.err("exists", json!({ "treeUri": tree_uri, "path": [] })).code, "bad_args");
        assert_eq!(fx.err("exists", json!({ "treeUri": tree_uri, "path": [".."] })).code, "bad_args");
        assert_eq!(fx.err("exists", json!({ "treeUri": tree_uri, "path": "a" })).code, "bad_args");
        assert_eq!(
            fx.err("openWrite", json!({ "treeUri": tree_uri, "path": ["a"] })).code,
            "bad_args"
        );
        assert_eq!(fx.err("write", json!({ "handle": 1, "bytes": "AAA=" })).code, "bad_args");
        assert_eq!(fx.err("write", json!({ "handle": 0, "bytes": [1, 2] })).code, "bad_args");
        assert_eq!(fx.err("read", json!({ "handle": 1, "maxBytes": 0 })).code, "bad_args");
        assert_eq!(fx.err("read", json!({ "handle": -1, "maxBytes": 10 })).code, "bad_args");
        assert_eq!(fx.err("persistPermission", json!({})).code, "bad_args");

        let h = fx.open_write(&["x.txt"], false);
        assert_eq!(fx.err("write", json!({ "handle": h, "bytes": "%%%" })).code, "bad_args");
        assert_eq!(fx.err("write", json!({ "handle": h })).code, "bad_args");
        fx.ok("write", json!({ "handle": h, "bytes": [104, 105] }));
        fx.ok("closeWrite", json!({ "handle": h }));
        assert_eq!(fx.read_all(&["x.txt"], 8), b"hi");
    }

    #[test]
    fn test_invalid_tree_uses_operation_code() {
        let mut fx = Fixture::new();
        let gone = local_tree_ref(&fx.dir.path().join("revoked"));
        let args = json!({ "treeUri": gone, "path": ["a"] });

        assert_eq!(fx.err("exists", args.clone()).code, "exists_failed");
        assert_eq!(fx.err("delete", args.clone()).code, "delete_failed");
        assert_eq!(fx.err("listChildren", args.clone()).code, "list_failed");
        assert_eq!(fx.err("openRead", args.clone()).code, "open_read_failed");
        assert_eq!(
            fx.err(
                "openWrite",
                json!({ "treeUri": gone, "path": ["a"], "mimeType": "text/plain" })
            )
            .code,
            "open_write_failed"
        );
        assert_eq!(
            fx.err("persistPermission", json!({ "treeUri": gone })).code,
            "persist_failed"
        );
    }

    #[test]
    fn test_close_always_succeeds() {
        let mut fx = Fixture::new();
        assert_eq!(fx.ok("closeWrite", json!({ "handle": 12345 })), Value::Null);
        assert_eq!(fx.ok("closeRead", json!({})), Value::Null);
        assert_eq!(fx.ok("closeRead", Value::Null), Value::Null);
        assert_eq!(fx.ok("closeWrite", json!({ "handle": "7" })), Value::Null);
        assert_eq!(fx.ok("closeRead", json!({ "handle": 1.5 })), Value::Null);

        // Fields other operations use are ignored, and a real handle still closes.
        std::fs::write(fx.dir.path().join("a.txt"), b"a").unwrap();
        let tree_uri = fx.tree_uri();
        let h = fx.ok("openRead", json!({ "treeUri": tree_uri, "path": ["a.txt"] }));
        assert_eq!(fx.bridge.handles().open_count(), 1);
        assert_eq!(fx.ok("closeRead", json!({ "handle": h, "bytes": 9 })), Value::Null);
        assert_eq!(fx.bridge.handles().open_count(), 0);
    }

    #[test]
    fn test_pick_flow() {
        let mut fx = Fixture::new();
        let ticket = match fx.call("pickTree", Value::Null) {
            Reply::PickStarted { ticket } => ticket,
            other => panic!("unexpected reply {:?}", other),
        };

        let busy = fx.err("pickTree", Value::Null);
        assert_eq!(busy.code, "busy");
        assert!(fx.bridge.picker().is_pending());

        let tree_uri = fx.tree_uri();
        let done = fx.bridge.complete_pick(ticket, Some(tree_uri.clone())).unwrap();
        assert_eq!(done.tree_uri, Some(tree_uri));
        assert!(!fx.bridge.picker().is_pending());

        assert!(matches!(fx.call("pickTree", Value::Null), Reply::PickStarted { .. }));
    }

    #[test]
    fn test_unknown_method() {
        let mut fx = Fixture::new();
        assert_eq!(fx.call("renameFile", json!({})), Reply::NotImplemented);
    }

    #[test]
    fn test_reply_wire_format() {
        assert_eq!(
            serde_json::to_value(Reply::success(3)).unwrap(),
            json!({ "status": "success", "value": 3 })
        );
        assert_eq!(
            serde_json::to_value(Reply::Error(ErrorReply::new("busy", "folder picker already active"))).unwrap(),
            json!({ "status": "error", "code": "busy", "message": "folder picker already active" })
        );
        assert_eq!(
            serde_json::to_value(Reply::NotImplemented).unwrap(),
            json!({ "status": "notImplemented" })
        );
    }

    #[test]
    fn test_close_all_releases_streams() {
        let mut fx = Fixture::new();
        fx.open_write(&["a.txt"], false);
        fx.open_write(&["b.txt"], false);
        assert_eq!(fx.bridge.handles().open_count(), 2);

        fx.bridge.close_all();
        assert_eq!(fx.bridge.handles().open_count(), 0);
    }
}
