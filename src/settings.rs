use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the settings file inside the app config dir.
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub model_name: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            kind: "ollama".to_string(),
            model_name: "phi3.5:latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedderSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub model_name: String,
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self {
            kind: "ollama".to_string(),
            model_name: "nomic-embed-text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorStoreSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub db_path: String,
    pub table_name: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            kind: "lancedb".to_string(),
            db_path: "./data/lancedb".to_string(),
            table_name: "code_documents".to_string(),
        }
    }
}

/// Backend settings. Every field is optional in the JSON file; missing
/// fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub llm: LlmSettings,
    pub embedder: EmbedderSettings,
    pub vector_store: VectorStoreSettings,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub excluded_dirs: Vec<String>,
    pub excluded_files: Vec<String>,
    /// Lowercase, with the leading dot.
    pub excluded_extensions: Vec<String>,
    /// gitignore-style pattern file, relative to the project root.
    pub ignore_file: Option<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            embedder: EmbedderSettings::default(),
            vector_store: VectorStoreSettings::default(),
            chunk_size: 1000,
            chunk_overlap: 200,
            excluded_dirs: strings(&[
                "venv",
                "node_modules",
                ".git",
                "__pycache__",
                "build",
                "dist",
                "tests/fixtures",
            ]),
            excluded_files: strings(&[
                "setup.py",
                "requirements.txt",
                "package.json",
                ".env",
                ".env.local",
            ]),
            excluded_extensions: strings(&[".pyc", ".pyo", ".pyd", ".log", ".csv", ".json"]),
            ignore_file: Some(".coderagignore".to_string()),
        }
    }
}

/// Load settings from `path`. A missing file yields the defaults silently;
/// an unreadable or malformed one is logged and also yields the defaults.
pub fn load(path: &Path) -> Settings {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
        Err(e) => {
            tracing::warn!("Could not read settings at {}: {e}", path.display());
            return Settings::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => {
            tracing::debug!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed settings at {}: {e}", path.display());
            Settings::default()
        }
    }
}
