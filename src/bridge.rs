use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tauri::{AppHandle, Runtime};
use tauri_plugin_dialog::DialogExt;
use tokio::sync::{oneshot, watch};

/// Event emitted to the webview once the bridge is usable.
pub const BRIDGE_READY_EVENT: &str = "bridge-ready";

/// Every command the bridge exposes to the webview.
pub const BRIDGE_METHODS: &[&str] = &[
    "list_projects",
    "bridge_status",
    "get_host_state",
    "set_host_state",
    "open_file_dialog",
    "save_content",
    "list_dir",
    "toggle_fullscreen",
    "open_project",
    "close_dashboard",
    "get_dashboard",
    "set_query",
    "update_config",
    "toggle_folder",
    "process_codebase",
    "analyze_code",
    "rpc_call",
    "get_settings",
];

/// One-time readiness signal. Fires at most once; later fires are no-ops.
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Returns true only for the call that actually flipped the signal.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ReadyListener {
        ReadyListener {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct ReadyListener {
    rx: watch::Receiver<bool>,
}

impl ReadyListener {
    /// Run `handler` once the signal has fired. An already-fired signal is
    /// detected synchronously, before any await. Returns false, without
    /// running the handler, if the signal is dropped while still unfired.
    pub async fn on_ready<F: FnOnce()>(mut self, handler: F) -> bool {
        let already = *self.rx.borrow_and_update();
        if !already {
            let fired = self.rx.wait_for(|ready| *ready).await.is_ok();
            if !fired {
                return false;
            }
        }
        handler();
        true
    }
}

/// Free-form key/value bag shared between host and webview.
/// Created lazily; never reset once it exists.
#[derive(Debug, Default)]
pub struct HostState {
    bag: Option<Map<String, Value>>,
}

impl HostState {
    pub fn ensure(&mut self) -> &mut Map<String, Value> {
        self.bag.get_or_insert_with(Map::new)
    }

    pub fn exists(&self) -> bool {
        self.bag.is_some()
    }

    pub fn set(&mut self, key: String, value: Value) -> Option<Value> {
        self.ensure().insert(key, value)
    }

    pub fn snapshot(&self) -> Option<Map<String, Value>> {
        self.bag.clone()
    }

    /// Snapshot as seen by the webview. Once the bridge is ready the bag
    /// exists, even if the ready handler has not run yet.
    pub fn read(&mut self, ready: bool) -> Option<Map<String, Value>> {
        if ready {
            self.ensure();
        }
        self.snapshot()
    }
}

/// Native folder picker, starting in the working directory.
/// The picked value is opaque to the app: it is logged and handed back.
pub async fn open_file_dialog<R: Runtime>(app: &AppHandle<R>) -> Result<Option<String>> {
    let start = std::env::current_dir().context("resolving working directory")?;
    let (tx, rx) = oneshot::channel();
    app.dialog()
        .file()
        .set_directory(start)
        .pick_folder(move |folder| {
            let _ = tx.send(folder);
        });
    let picked = rx
        .await
        .context("file dialog closed without a result")?
        .map(|p| p.to_string());
    tracing::info!("open file dialog: {:?}", picked);
    Ok(picked)
}

/// Ask for a destination and write `content` there.
/// Returns the chosen path, or None when the user cancels.
pub async fn save_content<R: Runtime>(app: &AppHandle<R>, content: String) -> Result<Option<String>> {
    let (tx, rx) = oneshot::channel();
    app.dialog().file().save_file(move |path| {
        let _ = tx.send(path);
    });
    let Some(target) = rx.await.context("save dialog closed without a result")? else {
        return Ok(None);
    };
    let path: PathBuf = target
        .into_path()
        .context("save dialog returned a non-filesystem location")?;
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Saved content to {}", path.display());
    Ok(Some(path.to_string_lossy().to_string()))
}

/// Entry names of the working directory, sorted.
pub fn list_dir() -> Result<Vec<String>> {
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let mut names = std::fs::read_dir(&cwd)
        .with_context(|| format!("listing {}", cwd.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn handler_runs_once_when_signal_fired_before_subscribe() {
        let signal = ReadySignal::new();
        assert!(signal.fire());
        assert!(!signal.fire());

        let calls = AtomicUsize::new(0);
        let ran = signal
            .subscribe()
            .on_ready(|| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        assert!(ran);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_runs_once_when_signal_fired_after_subscribe() {
        let signal = ReadySignal::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let listener = signal.subscribe();
        let counted = calls.clone();
        let task = tokio::spawn(listener.on_ready(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(task.await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(signal.is_ready());
    }

    #[tokio::test]
    async fn dropped_signal_never_runs_handler() {
        let signal = ReadySignal::new();
        let listener = signal.subscribe();
        drop(signal);
        let mut ran = false;
        assert!(!listener.on_ready(|| ran = true).await);
        assert!(!ran);
    }

    #[test]
    fn host_state_is_created_lazily_and_kept() {
        let mut state = HostState::default();
        assert!(!state.exists());
        assert!(state.snapshot().is_none());

        state.ensure();
        assert!(state.exists());
        state.set("ticker".into(), Value::from(3));
        state.ensure();
        assert_eq!(state.snapshot().unwrap().get("ticker"), Some(&Value::from(3)));
        assert_eq!(state.set("ticker".into(), Value::from(4)), Some(Value::from(3)));
    }

    #[test]
    fn ready_read_sees_a_bag() {
        let mut state = HostState::default();
        assert!(state.read(false).is_none());
        assert!(!state.exists());
        assert_eq!(state.read(true), Some(Map::new()));

        state.set("k".into(), Value::from(1));
        assert_eq!(state.read(true).unwrap().get("k"), Some(&Value::from(1)));
    }

    #[test]
    fn set_creates_missing_bag() {
        let mut state = HostState::default();
        assert_eq!(state.set("k".into(), Value::Bool(true)), None);
        assert!(state.exists());
    }

    #[test]
    fn bridge_methods_are_unique() {
        let mut names = BRIDGE_METHODS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BRIDGE_METHODS.len());
    }
}
