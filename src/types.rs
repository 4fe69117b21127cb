use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: String, // platform-specific absolute path, shown verbatim
    pub icon: char,
}

/// Values edited in place by the dashboard config form.
/// Free-form strings: the form does no validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub llm_model: String,
    pub embedder: String,
    pub chunk_size: String,
    pub overlap: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            llm_model: "gpt-4".to_string(),
            embedder: "nomic-embed-text".to_string(),
            chunk_size: "1000".to_string(),
            overlap: "200".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chevron {
    Down,
    Right,
}

/// One visible line of the rendered file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub indent_px: u32,
    /// None for files.
    pub chevron: Option<Chevron>,
    /// Child indices from the root list down to this node.
    pub path: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// Relative to the scanned root, always `/`-separated.
    pub file_path: String,
    pub language: String,
    pub file_name: String,
    pub extension: String,
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub root: String,
    pub files: usize,
    pub languages: BTreeMap<String, usize>,
}

/// Snapshot of the dashboard sent to the webview on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub project: Option<Project>,
    pub config: AnalysisConfig,
    pub query: String,
    pub results: String,
    pub results_text: String,
    pub status: String,
    pub is_processing: bool,
    pub rows: Vec<TreeRow>,
    pub scan: Option<ScanSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub ready: bool,
    /// Commands callable through `invoke`.
    pub methods: Vec<String>,
    /// Names accepted by `rpc_call`.
    pub rpc_methods: Vec<String>,
}
