use std::path::Path;

use crate::types::Project;

/// Previously opened projects shown on the start screen.
const RECENT_PROJECTS: &[(&str, &str, char)] = &[
    ("ceylon-ai-rag", r"G:\Projects\myrag\ceylon-ai-rag", 'C'),
    ("rk-core", r"L:\projects\Ceylon\rk-core", 'R'),
    ("ceylon-app", r"G:\Projects\myrag\ceylon-app", 'C'),
    ("ceylon-ai-app", r"G:\Projects\myrag\ceylon-ai-app", 'C'),
    ("mistral", r"F:\projects\research\mistral", 'M'),
];

pub fn recent_projects() -> Vec<Project> {
    RECENT_PROJECTS
        .iter()
        .map(|&(name, path, icon)| Project {
            name: name.to_string(),
            path: path.to_string(),
            icon,
        })
        .collect()
}

/// Build a project record for a path the user picked or clicked.
/// Known paths keep their list entry; anything else is named after its last
/// component, splitting on both separators so Windows paths work everywhere.
pub fn project_for_path(path: &str) -> Project {
    if let Some(known) = recent_projects().into_iter().find(|p| p.path == path) {
        return known;
    }
    let trimmed = path.trim_end_matches(['/', '\\']);
    let name = trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            Path::new(trimmed)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_default();
    let icon = name
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?');
    Project {
        name,
        path: path.to_string(),
        icon,
    }
}
