use std::path::PathBuf;

use anyhow::Context;
use serde_json::{Map, Value};
use tauri::{Emitter, Manager, State};

use crate::bridge::{self, ReadySignal, BRIDGE_METHODS, BRIDGE_READY_EVENT};
use crate::dashboard::{self, DashboardEvents};
use crate::rpc::RpcClient;
use crate::scanner::{self, FileFilter};
use crate::settings::{self, Settings};
use crate::types::{AnalysisConfig, BridgeStatus, DashboardView, Project};
use crate::{projects, tree, AppMutex};

// ─── Tauri commands ────────────────────────────────────────────────────────────

/// Recently opened projects for the start screen.
#[tauri::command]
pub async fn list_projects() -> Vec<Project> {
    projects::recent_projects()
}

/// Lets the webview check readiness after it starts listening for the
/// `bridge-ready` event, so an early signal is not missed.
#[tauri::command]
pub async fn bridge_status(
    signal: State<'_, ReadySignal>,
    rpc: State<'_, RpcClient>,
) -> Result<BridgeStatus, String> {
    Ok(BridgeStatus {
        ready: signal.is_ready(),
        methods: BRIDGE_METHODS.iter().map(|m| m.to_string()).collect(),
        rpc_methods: rpc.methods(),
    })
}

#[tauri::command]
pub async fn get_host_state(
    signal: State<'_, ReadySignal>,
    state: State<'_, AppMutex>,
) -> Result<Option<Map<String, Value>>, String> {
    Ok(state.lock().await.host_state.read(signal.is_ready()))
}

#[tauri::command]
pub async fn set_host_state(
    key: String,
    value: Value,
    state: State<'_, AppMutex>,
) -> Result<Option<Value>, String> {
    Ok(state.lock().await.host_state.set(key, value))
}

/// Native folder picker. The result is opaque: logged and returned as is.
#[tauri::command]
pub async fn open_file_dialog(app: tauri::AppHandle) -> Result<Option<String>, String> {
    bridge::open_file_dialog(&app).await.map_err(|e| {
        tracing::error!("open_file_dialog failed: {e:#}");
        e.to_string()
    })
}

#[tauri::command]
pub async fn save_content(app: tauri::AppHandle, content: String) -> Result<Option<String>, String> {
    bridge::save_content(&app, content).await.map_err(|e| {
        tracing::error!("save_content failed: {e:#}");
        e.to_string()
    })
}

#[tauri::command]
pub async fn list_dir() -> Result<Vec<String>, String> {
    tokio::task::spawn_blocking(bridge::list_dir)
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

/// Flip fullscreen on the calling window. Returns the new state.
#[tauri::command]
pub async fn toggle_fullscreen(window: tauri::WebviewWindow) -> Result<bool, String> {
    let fullscreen = !window.is_fullscreen().map_err(|e| e.to_string())?;
    window.set_fullscreen(fullscreen).map_err(|e| e.to_string())?;
    Ok(fullscreen)
}

/// Mount a fresh dashboard for `path`, scanning it when it exists locally.
#[tauri::command]
pub async fn open_project(
    path: String,
    state: State<'_, AppMutex>,
    app: tauri::AppHandle,
) -> Result<DashboardView, String> {
    mount_project(&state, &app, path)
        .await
        .map_err(|e| e.to_string())
}

/// Back to the project list. Pending simulated actions are dropped.
#[tauri::command]
pub async fn close_dashboard(state: State<'_, AppMutex>) -> Result<(), String> {
    state.lock().await.dashboard = None;
    Ok(())
}

#[tauri::command]
pub async fn get_dashboard(state: State<'_, AppMutex>) -> Result<Option<DashboardView>, String> {
    Ok(state.lock().await.dashboard.as_ref().map(|d| d.view()))
}

#[tauri::command]
pub async fn set_query(query: String, state: State<'_, AppMutex>) -> Result<DashboardView, String> {
    let mut s = state.lock().await;
    let dashboard = s.dashboard.as_mut().ok_or("dashboard_not_mounted")?;
    dashboard.set_query(query);
    Ok(dashboard.view())
}

#[tauri::command]
pub async fn update_config(
    config: AnalysisConfig,
    state: State<'_, AppMutex>,
) -> Result<DashboardView, String> {
    let mut s = state.lock().await;
    let dashboard = s.dashboard.as_mut().ok_or("dashboard_not_mounted")?;
    dashboard.update_config(config);
    Ok(dashboard.view())
}

#[tauri::command]
pub async fn toggle_folder(
    path: Vec<usize>,
    state: State<'_, AppMutex>,
) -> Result<DashboardView, String> {
    let mut s = state.lock().await;
    let dashboard = s.dashboard.as_mut().ok_or("dashboard_not_mounted")?;
    if !dashboard.toggle_folder(&path) {
        return Err("not_a_folder".to_string());
    }
    Ok(dashboard.view())
}

/// Start the simulated processing run. Progress arrives as
/// `dashboard-changed` events.
#[tauri::command]
pub async fn process_codebase(
    state: State<'_, AppMutex>,
    app: tauri::AppHandle,
) -> Result<(), String> {
    ensure_mounted(&state).await?;
    tauri::async_runtime::spawn(async move {
        let state = app.state::<AppMutex>();
        if let Err(e) = dashboard::process(&state, &app).await {
            tracing::error!("process_codebase failed: {e:#}");
        }
    });
    Ok(())
}

/// Start the simulated analysis, optionally replacing the query first.
#[tauri::command]
pub async fn analyze_code(
    query: Option<String>,
    state: State<'_, AppMutex>,
    app: tauri::AppHandle,
) -> Result<(), String> {
    {
        let mut s = state.lock().await;
        let dashboard = s.dashboard.as_mut().ok_or("dashboard_not_mounted")?;
        if let Some(query) = query {
            dashboard.set_query(query);
        }
    }
    tauri::async_runtime::spawn(async move {
        let state = app.state::<AppMutex>();
        if let Err(e) = dashboard::analyze(&state, &app).await {
            tracing::error!("analyze_code failed: {e:#}");
        }
    });
    Ok(())
}

/// Queue a named call for the background dispatcher. Unknown names fail here.
#[tauri::command]
pub async fn rpc_call(
    name: String,
    payload: Option<Value>,
    rpc: State<'_, RpcClient>,
) -> Result<(), String> {
    rpc.call(&name, payload.unwrap_or(Value::Null))
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_settings(state: State<'_, AppMutex>) -> Result<Settings, String> {
    Ok(state.lock().await.settings.clone())
}

// ─── Queued bridge handlers ────────────────────────────────────────────────────

pub async fn rpc_open_project(app: tauri::AppHandle, payload: Value) -> anyhow::Result<()> {
    let path = payload
        .as_str()
        .or_else(|| payload.get("path").and_then(Value::as_str))
        .context("open_project expects a path")?
        .to_string();
    let state = app.state::<AppMutex>();
    mount_project(&state, &app, path).await?;
    Ok(())
}

/// Reload settings: from the payload when it carries an object, otherwise
/// from the settings file.
pub async fn rpc_initialize_rag(app: tauri::AppHandle, payload: Value) -> anyhow::Result<()> {
    let settings = if payload.is_object() {
        serde_json::from_value(payload).context("invalid settings payload")?
    } else {
        load_settings(&app)
    };
    let state = app.state::<AppMutex>();
    state.lock().await.settings = settings;
    tracing::info!("Settings initialized");
    Ok(())
}

pub async fn rpc_process_codebase(app: tauri::AppHandle, _payload: Value) -> anyhow::Result<()> {
    let state = app.state::<AppMutex>();
    dashboard::process(&state, &app).await?;
    Ok(())
}

pub async fn rpc_analyze_code(app: tauri::AppHandle, payload: Value) -> anyhow::Result<()> {
    let state = app.state::<AppMutex>();
    if let Some(question) = payload.as_str() {
        if let Some(dashboard) = state.lock().await.dashboard.as_mut() {
            dashboard.set_query(question.to_string());
        }
    }
    dashboard::analyze(&state, &app).await?;
    Ok(())
}

// ─── Internal helpers ──────────────────────────────────────────────────────────

/// Runs once per readiness signal: make sure the host state bag exists,
/// then tell the webview.
pub async fn on_bridge_ready(app: tauri::AppHandle) {
    {
        let state = app.state::<AppMutex>();
        state.lock().await.host_state.ensure();
    }
    if let Err(e) = app.emit(BRIDGE_READY_EVENT, ()) {
        tracing::error!("Failed to emit {BRIDGE_READY_EVENT}: {e}");
    }
}

/// Settings from `<app_config_dir>/settings.json`, defaults otherwise.
pub fn load_settings(app: &tauri::AppHandle) -> Settings {
    match app.path().app_config_dir() {
        Ok(dir) => settings::load(&dir.join(settings::SETTINGS_FILE)),
        Err(e) => {
            tracing::warn!("No app config dir ({e}); using default settings");
            Settings::default()
        }
    }
}

async fn ensure_mounted(state: &AppMutex) -> Result<(), String> {
    if state.lock().await.dashboard.is_none() {
        return Err("dashboard_not_mounted".to_string());
    }
    Ok(())
}

/// Scan `path` when it is a local directory and mount a dashboard for it.
/// Paths that don't exist here (e.g. list entries from another machine)
/// get the sample tree instead.
pub async fn mount_project<E: DashboardEvents>(
    state: &AppMutex,
    events: &E,
    path: String,
) -> anyhow::Result<DashboardView> {
    let project = projects::project_for_path(&path);
    let root = PathBuf::from(&path);

    let (file_tree, scan) = if root.is_dir() {
        let settings = state.lock().await.settings.clone();
        let (files, summary) = tokio::task::spawn_blocking(move || {
            let filter = FileFilter::from_settings(&settings, &root)?;
            let files = scanner::scan_codebase(&root, &filter)?;
            let summary = scanner::summarize(&root, &files);
            anyhow::Ok((files, summary))
        })
        .await
        .context("scan task panicked")??;
        let paths: Vec<&str> = files.iter().map(|f| f.file_path.as_str()).collect();
        (tree::from_paths(&paths), Some(summary))
    } else {
        tracing::warn!("{path} is not a local directory; showing the sample tree");
        (tree::sample_tree(), None)
    };

    let mut s = state.lock().await;
    let view = s.mount_dashboard(Some(project), file_tree, scan).view();
    events.publish(&view);
    Ok(view)
}
