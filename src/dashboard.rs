use std::time::Duration;

use anyhow::Result;
use tauri::{AppHandle, Emitter, Runtime};

use crate::tree;
use crate::types::{AnalysisConfig, DashboardView, FileTreeNode, Project, ScanSummary};
use crate::AppMutex;

/// Event carrying a fresh `DashboardView` after every state change.
pub const DASHBOARD_EVENT: &str = "dashboard-changed";

/// Simulated duration of "Process Codebase".
pub const PROCESS_DELAY: Duration = Duration::from_millis(2000);
/// Simulated duration of "Analyze".
pub const ANALYZE_DELAY: Duration = Duration::from_millis(1500);

pub const STATUS_READY: &str = "Ready";
pub const STATUS_PROCESSING: &str = "Processing codebase...";
pub const STATUS_PROCESSED: &str = "Processing complete";
pub const STATUS_EMPTY_QUERY: &str = "Please enter a query";
pub const STATUS_ANALYZING: &str = "Analyzing code...";
pub const STATUS_ANALYZED: &str = "Analysis complete";

pub const SAMPLE_RESULTS: &str = "Sample analysis results would appear here...";
pub const RESULTS_PLACEHOLDER: &str = "Analysis results will appear here...";

/// State of one mounted dashboard. Dropped on unmount; a remount starts over
/// with a fresh config, query and status.
#[derive(Debug, Clone)]
pub struct Dashboard {
    mount: u64,
    project: Option<Project>,
    config: AnalysisConfig,
    query: String,
    results: String,
    status: String,
    is_processing: bool,
    tree: Vec<FileTreeNode>,
    scan: Option<ScanSummary>,
}

impl Dashboard {
    pub fn new(
        mount: u64,
        project: Option<Project>,
        tree: Vec<FileTreeNode>,
        scan: Option<ScanSummary>,
    ) -> Self {
        Self {
            mount,
            project,
            config: AnalysisConfig::default(),
            query: String::new(),
            results: String::new(),
            status: STATUS_READY.to_string(),
            is_processing: false,
            tree,
            scan,
        }
    }

    pub fn mount_id(&self) -> u64 {
        self.mount
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub fn update_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }

    pub fn toggle_folder(&mut self, path: &[usize]) -> bool {
        tree::toggle(&mut self.tree, path)
    }

    /// Returns false, changing nothing, while a previous run is in flight.
    pub fn begin_process(&mut self) -> bool {
        if self.is_processing {
            return false;
        }
        self.is_processing = true;
        self.status = STATUS_PROCESSING.to_string();
        true
    }

    pub fn finish_process(&mut self) {
        self.is_processing = false;
        self.status = STATUS_PROCESSED.to_string();
    }

    /// Returns false for a blank query; results are left untouched.
    pub fn begin_analyze(&mut self) -> bool {
        if self.query.trim().is_empty() {
            self.status = STATUS_EMPTY_QUERY.to_string();
            return false;
        }
        self.status = STATUS_ANALYZING.to_string();
        true
    }

    pub fn finish_analyze(&mut self) {
        self.results = SAMPLE_RESULTS.to_string();
        self.status = STATUS_ANALYZED.to_string();
    }

    pub fn view(&self) -> DashboardView {
        let results_text = if self.results.is_empty() {
            RESULTS_PLACEHOLDER.to_string()
        } else {
            self.results.clone()
        };
        DashboardView {
            project: self.project.clone(),
            config: self.config.clone(),
            query: self.query.clone(),
            results: self.results.clone(),
            results_text,
            status: self.status.clone(),
            is_processing: self.is_processing,
            rows: tree::render_rows(&self.tree),
            scan: self.scan.clone(),
        }
    }
}

/// Where dashboard changes are pushed.
pub trait DashboardEvents: Send + Sync {
    fn publish(&self, view: &DashboardView);
}

impl<R: Runtime> DashboardEvents for AppHandle<R> {
    fn publish(&self, view: &DashboardView) {
        if let Err(e) = self.emit(DASHBOARD_EVENT, view) {
            tracing::warn!("Failed to emit {DASHBOARD_EVENT}: {e}");
        }
    }
}

/// "Process Codebase": disable the trigger, wait, re-enable.
/// Returns Ok(false) if a run was already in flight.
pub async fn process<E: DashboardEvents>(state: &AppMutex, events: &E) -> Result<bool> {
    simulate(
        state,
        events,
        Dashboard::begin_process,
        PROCESS_DELAY,
        Dashboard::finish_process,
    )
    .await
}

/// "Analyze": validate the query, wait, fill in the canned results.
/// Returns Ok(false) if the query was blank.
pub async fn analyze<E: DashboardEvents>(state: &AppMutex, events: &E) -> Result<bool> {
    simulate(
        state,
        events,
        Dashboard::begin_analyze,
        ANALYZE_DELAY,
        Dashboard::finish_analyze,
    )
    .await
}

async fn simulate<E: DashboardEvents>(
    state: &AppMutex,
    events: &E,
    begin: fn(&mut Dashboard) -> bool,
    delay: Duration,
    finish: fn(&mut Dashboard),
) -> Result<bool> {
    let mount = {
        let mut s = state.lock().await;
        let dashboard = s
            .dashboard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("dashboard_not_mounted"))?;
        let started = begin(dashboard);
        events.publish(&dashboard.view());
        if !started {
            return Ok(false);
        }
        dashboard.mount_id()
    }; // lock released before the delay

    tokio::time::sleep(delay).await;

    let mut s = state.lock().await;
    match s.dashboard.as_mut() {
        Some(dashboard) if dashboard.mount_id() == mount => {
            finish(dashboard);
            events.publish(&dashboard.view());
        }
        // Unmounted or remounted meanwhile: the result has nowhere to go.
        _ => tracing::debug!("Dropping simulated result for stale dashboard {mount}"),
    }
    Ok(true)
}
