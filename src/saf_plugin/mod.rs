// SAF (Storage Access Framework) plugin
// This exposes the bridge to the webview as `plugin:saf|call`

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tauri::{
    plugin::{Builder, TauriPlugin},
    AppHandle, Emitter, Manager, Wry,
};
use tracing::warn;

use crate::dispatch::{MethodCall, Reply, SafBridge};
use crate::permissions::{PickCompletion, PickTicket};
use crate::types::SafConfig;

#[cfg(target_os = "android")]
pub type PlatformTree = crate::android::saf::AndroidTree;

#[cfg(not(target_os = "android"))]
pub type PlatformTree = crate::fs_abstraction::LocalTree;

/// SAF plugin state - one bridge session per application
pub struct SafPluginState {
    bridge: Mutex<SafBridge<PlatformTree>>,
}

impl SafPluginState {
    pub fn new(tree: PlatformTree, config: SafConfig) -> Self {
        Self {
            bridge: Mutex::new(SafBridge::new(tree, config)),
        }
    }

    fn bridge(&self) -> MutexGuard<'_, SafBridge<PlatformTree>> {
        // A panic mid-call leaves the tables usable; keep serving.
        self.bridge.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve one channel call
    pub fn call(&self, call: MethodCall) -> Reply {
        self.bridge().handle(call)
    }

    /// Feed a picker result back into the session
    pub fn complete_pick(&self, ticket: PickTicket, picked: Option<String>) -> Option<PickCompletion> {
        self.bridge().complete_pick(ticket, picked)
    }

    pub fn pick_event(&self) -> String {
        self.bridge().config().pick_event.clone()
    }

    /// Close every stream still open
    pub fn close_all(&self) {
        self.bridge().close_all();
    }
}

/// Complete a pick and notify the webview.
fn finish_pick(app: &AppHandle, ticket: PickTicket, picked: Option<String>) {
    let state = app.state::<SafPluginState>();
    let Some(completion) = state.complete_pick(ticket, picked) else {
        return;
    };
    let event = state.pick_event();
    if let Err(e) = app.emit(&event, &completion) {
        warn!(event = %event, error = %e, "failed to emit pick completion");
    }
}

/// Show the platform directory chooser for `ticket`.
#[cfg(target_os = "android")]
fn launch_picker(app: AppHandle, ticket: PickTicket) {
    tauri::async_runtime::spawn(async move {
        let picked = match crate::android::saf::pick_directory(&app).await {
            Ok(picked) => picked,
            Err(e) => {
                warn!(error = %e, "directory picker failed");
                None
            }
        };
        // Persisting the grant blocks on the async runtime.
        let _ = tauri::async_runtime::spawn_blocking(move || finish_pick(&app, ticket, picked)).await;
    });
}

/// Show the platform directory chooser for `ticket`.
#[cfg(not(target_os = "android"))]
fn launch_picker(app: AppHandle, ticket: PickTicket) {
    use tauri_plugin_dialog::DialogExt;

    let handle = app.clone();
    app.dialog().file().pick_folder(move |folder| {
        let picked = folder
            .and_then(|f| f.into_path().ok())
            .map(|p| crate::fs_abstraction::local_tree_ref(&p));
        finish_pick(&handle, ticket, picked);
    });
}

/// Tauri command serving every SAF operation by name
#[tauri::command]
pub fn call(app: AppHandle, method: String, args: Option<Value>) -> Reply {
    let state = app.state::<SafPluginState>();
    let reply = state.call(MethodCall::new(method, args.unwrap_or(Value::Null)));
    if let Reply::PickStarted { ticket } = &reply {
        launch_picker(app.clone(), *ticket);
    }
    reply
}

/// Initialize the SAF plugin
pub fn init() -> TauriPlugin<Wry, Option<SafConfig>> {
    Builder::<Wry, Option<SafConfig>>::new("saf")
        .invoke_handler(tauri::generate_handler![call])
        .setup(|app, api| {
            let config = api.config().clone().unwrap_or_default();

            #[cfg(target_os = "android")]
            let tree = crate::android::saf::AndroidTree::new(app.clone());
            #[cfg(not(target_os = "android"))]
            let tree = crate::fs_abstraction::LocalTree::new();

            app.manage(SafPluginState::new(tree, config));
            Ok(())
        })
        .on_drop(|app| {
            if let Some(state) = app.try_state::<SafPluginState>() {
                state.close_all();
            }
        })
        .build()
}

/// Extension trait for easy access to SAF plugin state
pub trait SafExt {
    fn saf(&self) -> &SafPluginState;
}

impl<T: Manager<Wry>> SafExt for T {
    fn saf(&self) -> &SafPluginState {
        self.state::<SafPluginState>().inner()
    }
}
