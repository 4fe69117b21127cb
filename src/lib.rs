pub mod bridge;
pub mod commands;
pub mod dashboard;
pub mod projects;
pub mod rpc;
pub mod scanner;
pub mod settings;
pub mod tree;
pub mod types;

use tokio::sync::Mutex;

use tauri::webview::PageLoadEvent;
use tauri::{Manager, WindowEvent};

use crate::bridge::{HostState, ReadySignal};
use crate::dashboard::Dashboard;
use crate::rpc::{Registry, RpcClient};
use crate::settings::Settings;
use crate::types::{FileTreeNode, Project, ScanSummary};

/// All runtime state shared across Tauri commands.
#[derive(Default)]
pub struct AppState {
    /// Backend settings, loaded at startup and reloaded by `initialize_rag`.
    pub settings: Settings,
    /// Custom key/value bag for host and webview interop.
    pub host_state: HostState,
    /// Present between opening a project and closing the dashboard.
    pub dashboard: Option<Dashboard>,
    /// Number of dashboard mounts so far; the latest one is the live mount id.
    pub mounts: u64,
}

impl AppState {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replace any mounted dashboard with a fresh one.
    pub fn mount_dashboard(
        &mut self,
        project: Option<Project>,
        tree: Vec<FileTreeNode>,
        scan: Option<ScanSummary>,
    ) -> &mut Dashboard {
        self.mounts += 1;
        self.dashboard.insert(Dashboard::new(self.mounts, project, tree, scan))
    }
}

/// Type alias used in Tauri command signatures and background tasks.
pub type AppMutex = Mutex<AppState>;

/// Methods reachable through the queued `rpc_call` bridge.
fn rpc_registry() -> Registry<tauri::AppHandle> {
    let mut registry = Registry::new();
    registry.register("open_project", commands::rpc_open_project);
    registry.register("initialize_rag", commands::rpc_initialize_rag);
    registry.register("process_codebase", commands::rpc_process_codebase);
    registry.register("analyze_code", commands::rpc_analyze_code);
    registry
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Only log WARN and above in production to keep project paths out of logs
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt::init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).init();
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(ReadySignal::new())
        .invoke_handler(tauri::generate_handler![
            commands::list_projects,
            commands::bridge_status,
            commands::get_host_state,
            commands::set_host_state,
            commands::open_file_dialog,
            commands::save_content,
            commands::list_dir,
            commands::toggle_fullscreen,
            commands::open_project,
            commands::close_dashboard,
            commands::get_dashboard,
            commands::set_query,
            commands::update_config,
            commands::toggle_folder,
            commands::process_codebase,
            commands::analyze_code,
            commands::rpc_call,
            commands::get_settings,
        ])
        .on_page_load(|webview, payload| {
            // The bridge is usable once the main page has loaded; reloads are ignored.
            if webview.label() == "main"
                && matches!(payload.event(), PageLoadEvent::Finished)
                && webview.state::<ReadySignal>().fire()
            {
                tracing::info!("Bridge ready");
            }
        })
        .on_window_event(|window, event| {
            if let WindowEvent::CloseRequested { .. } = event {
                if let Some(rpc) = window.try_state::<RpcClient>() {
                    rpc.close();
                }
            }
        })
        .setup(|app| {
            let handle = app.handle().clone();

            let settings = commands::load_settings(&handle);
            app.manage(AppMutex::new(AppState::with_settings(settings)));

            let (client, worker) = rpc_registry().serve(handle.clone());
            app.manage(client);
            tauri::async_runtime::spawn(worker.run());

            // Subscribe once, before the page can finish loading.
            let listener = app.state::<ReadySignal>().subscribe();
            tauri::async_runtime::spawn(async move {
                listener
                    .on_ready(move || {
                        tauri::async_runtime::spawn(commands::on_bridge_ready(handle));
                    })
                    .await;
            });
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
