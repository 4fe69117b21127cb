use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use walkdir::WalkDir;

use crate::settings::Settings;
use crate::types::{ScanSummary, SourceFile};

/// Language name for a file extension (without the dot, any case).
pub fn language_for(extension: &str) -> Option<&'static str> {
    let lang = match extension.to_ascii_lowercase().as_str() {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "java" => "java",
        "cpp" => "c++",
        "c" => "c",
        "go" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "scala" => "scala",
        "swift" => "swift",
        "kt" => "kotlin",
        "r" => "r",
        "sh" => "shell",
        "sql" => "sql",
        "html" => "html",
        "css" => "css",
        "md" => "markdown",
        _ => return None,
    };
    Some(lang)
}

/// Stable 63-bit index for a relative path: `h = h * 31 + c (mod 2^63)`
/// over the path's code points.
pub fn path_index(path: &str) -> i64 {
    const MASK: u64 = (1 << 63) - 1;
    let hash = path
        .chars()
        .fold(0u64, |h, c| h.wrapping_mul(31).wrapping_add(c as u64) & MASK);
    hash as i64
}

struct IgnorePattern {
    negated: bool,
    matcher: GlobMatcher,
}

/// Decides which files of a project take part in a scan.
pub struct FileFilter {
    excluded_dirs: Vec<Vec<String>>,
    excluded_files: HashSet<String>,
    excluded_extensions: HashSet<String>,
    ignore: Vec<IgnorePattern>,
}

impl FileFilter {
    pub fn new(
        excluded_dirs: &[String],
        excluded_files: &[String],
        excluded_extensions: &[String],
        ignore_lines: &[String],
    ) -> Result<Self> {
        let mut ignore = Vec::new();
        for line in ignore_lines {
            let (negated, pattern) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line.as_str()),
            };
            match Glob::new(pattern) {
                Ok(glob) => ignore.push(IgnorePattern {
                    negated,
                    matcher: glob.compile_matcher(),
                }),
                Err(e) => tracing::warn!("Skipping invalid ignore pattern `{line}`: {e}"),
            }
        }
        Ok(Self {
            excluded_dirs: excluded_dirs
                .iter()
                .map(|d| {
                    d.replace('\\', "/")
                        .split('/')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .filter(|segments| !segments.is_empty())
                .collect(),
            excluded_files: excluded_files.iter().cloned().collect(),
            excluded_extensions: excluded_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            ignore,
        })
    }

    /// Build a filter from settings, reading the ignore file relative to `root`
    /// when one is configured and present.
    pub fn from_settings(settings: &Settings, root: &Path) -> Result<Self> {
        let ignore_lines = match &settings.ignore_file {
            Some(name) => read_ignore_file(&root.join(name))?,
            None => Vec::new(),
        };
        Self::new(
            &settings.excluded_dirs,
            &settings.excluded_files,
            &settings.excluded_extensions,
            &ignore_lines,
        )
    }

    fn in_excluded_dir(&self, dirs: &[&str]) -> bool {
        self.excluded_dirs.iter().any(|excluded| {
            dirs.windows(excluded.len())
                .any(|w| w.iter().zip(excluded).all(|(a, b)| *a == b.as_str()))
        })
    }

    /// Whether a directory (relative to the scan root) lies under an excluded
    /// dir, so the walk can skip it entirely.
    pub fn skips_dir(&self, relative: &str) -> bool {
        let normalized = relative.replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        self.in_excluded_dir(&segments)
    }

    fn is_ignored(&self, path: &str) -> bool {
        for pattern in &self.ignore {
            if pattern.matcher.is_match(path) {
                return !pattern.negated;
            }
        }
        false
    }

    /// Language of `relative` if the file should be scanned, `None` otherwise.
    pub fn accept(&self, relative: &str) -> Option<&'static str> {
        let normalized = relative.replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        let (file_name, dirs) = segments.split_last()?;

        if self.in_excluded_dir(dirs) {
            return None;
        }
        if self.excluded_files.contains(*file_name) {
            return None;
        }
        let extension = extension_of(file_name);
        if let Some(ext) = extension {
            if self
                .excluded_extensions
                .contains(&format!(".{}", ext.to_ascii_lowercase()))
            {
                return None;
            }
        }
        if self.is_ignored(&normalized) {
            return None;
        }
        extension.and_then(language_for)
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|e| e.to_str())
}

fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading ignore file {}", path.display()))?;
    Ok(raw
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Walk `root` recursively and return every accepted file, sorted by path.
pub fn scan_codebase(root: &Path, filter: &FileFilter) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("Directory not found: {}", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match entry.path().strip_prefix(root) {
                Ok(rel) => !filter.skips_dir(&rel.to_string_lossy()),
                Err(_) => true,
            }
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        let Some(language) = filter.accept(&relative) else {
            continue;
        };
        let file_name = entry.file_name().to_string_lossy().to_string();
        let extension = extension_of(&file_name).unwrap_or_default().to_string();
        files.push(SourceFile {
            index: path_index(&relative),
            file_path: relative,
            language: language.to_string(),
            file_name,
            extension,
        });
    }
    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    tracing::info!("Scanned {}: {} files", root.display(), files.len());
    Ok(files)
}

pub fn summarize(root: &Path, files: &[SourceFile]) -> ScanSummary {
    let mut languages = BTreeMap::new();
    for f in files {
        *languages.entry(f.language.clone()).or_insert(0) += 1;
    }
    ScanSummary {
        root: root.to_string_lossy().to_string(),
        files: files.len(),
        languages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    fn default_filter() -> FileFilter {
        let s = Settings::default();
        FileFilter::new(&s.excluded_dirs, &s.excluded_files, &s.excluded_extensions, &[]).unwrap()
    }

    #[test]
    fn path_index_matches_polynomial_hash() {
        assert_eq!(path_index(""), 0);
        assert_eq!(path_index("a"), 97);
        assert_eq!(path_index("ab"), 97 * 31 + 98);
        assert_ne!(path_index("folder/file1.txt"), path_index("folder/file2.txt"));
        let long = "deep/nested/path/to/a/very/long/file/name/that/overflows.rs".repeat(4);
        assert!(path_index(&long) >= 0);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        assert_eq!(language_for("RS"), Some("rust"));
        assert_eq!(language_for("cpp"), Some("c++"));
        assert_eq!(language_for("toml"), None);
    }

    #[test]
    fn filter_applies_exclusions() {
        let f = default_filter();
        assert_eq!(f.accept("src/main.py"), Some("python"));
        assert_eq!(f.accept("node_modules/lib/index.js"), None);
        assert_eq!(f.accept("pkg/.git/hooks/pre-commit.sh"), None);
        assert_eq!(f.accept("tests/fixtures/sample.py"), None);
        assert_eq!(f.accept("tests/unit/sample.py"), Some("python"));
        assert_eq!(f.accept("setup.py"), None);
        assert_eq!(f.accept("data/dump.JSON"), None);
        assert_eq!(f.accept("notes.txt"), None);
        assert_eq!(f.accept(r"src\win\app.ts"), Some("typescript"));
    }

    #[test]
    fn ignore_patterns_respect_negation_order() {
        let s = Settings::default();
        let lines = vec!["!src/keep_*.py".to_string(), "src/*.py".to_string()];
        let f = FileFilter::new(&s.excluded_dirs, &s.excluded_files, &s.excluded_extensions, &lines).unwrap();
        assert_eq!(f.accept("src/drop.py"), None);
        assert_eq!(f.accept("src/keep_me.py"), Some("python"));
        assert_eq!(f.accept("lib/other.py"), Some("python"));
    }

    #[test]
    fn scan_walks_tree_and_reads_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/main.rs");
        touch(root, "src/lib.rs");
        touch(root, "src/generated/out.rs");
        touch(root, "node_modules/dep/index.js");
        touch(root, "README.md");
        touch(root, "Cargo.lock");
        std::fs::write(root.join(".coderagignore"), "# generated code\nsrc/generated/*\n\n").unwrap();

        let filter = FileFilter::from_settings(&Settings::default(), root).unwrap();
        let files = scan_codebase(root, &filter).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/lib.rs", "src/main.rs"]);

        let main = &files[2];
        assert_eq!(main.language, "rust");
        assert_eq!(main.file_name, "main.rs");
        assert_eq!(main.extension, "rs");
        assert_eq!(main.index, path_index("src/main.rs"));

        let summary = summarize(root, &files);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.languages.get("rust"), Some(&2));
        assert_eq!(summary.languages.get("markdown"), Some(&1));
    }

    #[test]
    fn broken_ignore_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/app.py");
        touch(root, "src/debug.sh");
        std::fs::write(root.join(".coderagignore"), "[\n*.sh\n").unwrap();

        let filter = FileFilter::from_settings(&Settings::default(), root).unwrap();
        let files = scan_codebase(root, &filter).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, vec!["src/app.py"]);
    }

    #[test]
    fn excluded_dirs_are_pruned() {
        let f = default_filter();
        assert!(f.skips_dir("node_modules"));
        assert!(f.skips_dir("web/node_modules/dep"));
        assert!(f.skips_dir(r"tests\fixtures"));
        assert!(!f.skips_dir("tests"));
        assert!(!f.skips_dir(""));

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/index.ts");
        touch(root, ".git/hooks/pre-commit.sh");
        touch(root, "venv/lib/site.py");
        let files = scan_codebase(root, &f).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, vec!["src/index.ts"]);
    }

    #[test]
    fn scan_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_codebase(&dir.path().join("nope"), &default_filter()).unwrap_err();
        assert!(err.to_string().contains("Directory not found"));
    }
}
