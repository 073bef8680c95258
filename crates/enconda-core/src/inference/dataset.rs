//! Benchmark README discovery
//!
//! Expected layout:
//!
//! ```text
//! data_root/
//! ├── error_gen_<repo>/
//! │   ├── README_1/
//! │   │   ├── README.md
//! │   │   └── README.json
//! │   └── README_2/ ...
//! └── error_gen_<other>/ ...
//! ```

use crate::errors::{BenchError, BenchResult};
use crate::file_utils::safe_read_file;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const REPO_DIR_PREFIX: &str = "error_gen_";

/// README file names in preference order.
const README_NAMES: [&str; 4] = ["README.md", "README.rst", "README.txt", "README"];

/// Maximum number of files listed in a repository structure.
const MAX_STRUCTURE_FILES: usize = 50;

const NO_STRUCTURE: &str = "Unable to get file structure information";

/// One README folder in the benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeFolder {
    pub path: PathBuf,
    /// Repository name with the `error_gen_` prefix removed
    pub repo_name: String,
    /// Folder name, used as `readme_name` in result files
    pub readme_name: String,
}

impl ReadmeFolder {
    /// Identifier used in logs: `<repo>_<folder>`.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.repo_name, self.readme_name)
    }

    /// The preferred README file inside the folder.
    pub fn readme_path(&self) -> Option<PathBuf> {
        README_NAMES
            .iter()
            .map(|name| self.path.join(name))
            .find(|path| path.is_file())
    }
}

pub struct ReadmeDataset {
    data_root: PathBuf,
    source_root: PathBuf,
}

impl ReadmeDataset {
    pub fn new(data_root: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            source_root: source_root.into(),
        }
    }

    /// All `error_gen_<repo>/<folder>` directories holding a README, sorted.
    pub fn readme_folders(&self) -> Vec<ReadmeFolder> {
        let mut folders = Vec::new();

        for repo_dir in sorted_subdirs(&self.data_root) {
            let Some(dir_name) = repo_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(repo_name) = dir_name.strip_prefix(REPO_DIR_PREFIX) else {
                continue;
            };

            for folder_path in sorted_subdirs(&repo_dir) {
                let Some(readme_name) = folder_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let folder = ReadmeFolder {
                    path: folder_path.clone(),
                    repo_name: repo_name.to_string(),
                    readme_name: readme_name.to_string(),
                };
                if folder.readme_path().is_some() {
                    folders.push(folder);
                }
            }
        }

        tracing::info!(count = folders.len(), "Found README folders");
        folders
    }

    pub fn read_readme(&self, folder: &ReadmeFolder) -> BenchResult<String> {
        let path = folder.readme_path().ok_or_else(|| BenchError::FileRead {
            path: folder.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no README file in folder"),
        })?;
        safe_read_file(&path)
    }

    /// Repository structure text for a repo, or a fixed fallback sentence.
    pub fn repository_structure(&self, repo_name: &str) -> String {
        match self.find_repository_info(repo_name) {
            Some(info) => render_structure(&info),
            None => {
                tracing::warn!(repo = repo_name, "Directory info not found");
                NO_STRUCTURE.to_string()
            }
        }
    }

    /// First `*.jsonl` entry whose normalized `repository` equals the repo.
    fn find_repository_info(&self, repo_name: &str) -> Option<Value> {
        let wanted = normalize_repo_name(repo_name);

        for path in sorted_jsonl_files(&self.source_root) {
            match scan_jsonl(&path, &wanted) {
                Ok(Some(info)) => return Some(info),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Failed to read jsonl file");
                }
            }
        }

        None
    }
}

/// Evenly strided selection of `sample_size` items.
///
/// Returns the input unchanged when it is not larger than the sample.
pub fn sample_evenly<T: Clone>(items: &[T], sample_size: usize) -> Vec<T> {
    if items.len() <= sample_size {
        return items.to_vec();
    }

    (0..sample_size)
        .map(|i| items[i * items.len() / sample_size].clone())
        .collect()
}

/// `bigmlcom/python-x` → `bigmlcom_python_x`
fn normalize_repo_name(name: &str) -> String {
    name.replace(['/', '-'], "_")
}

fn render_structure(info: &Value) -> String {
    let repository = info
        .get("repository")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    let mut lines = vec![format!("Repository: {}", repository)];

    if let Some(files) = info.get("files").and_then(Value::as_array) {
        lines.push("File structure:".to_string());
        for file in files.iter().take(MAX_STRUCTURE_FILES) {
            let path = file.get("path").and_then(Value::as_str).unwrap_or("");
            let kind = file.get("type").and_then(Value::as_str).unwrap_or("file");
            lines.push(format!("  {}: {}", kind, path));
        }
    }

    lines.join("\n")
}

fn scan_jsonl(path: &Path, wanted: &str) -> BenchResult<Option<Value>> {
    let file = fs::File::open(path).map_err(|e| BenchError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| BenchError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value =
            serde_json::from_str(line.trim()).map_err(|e| BenchError::MalformedRecord {
                path: path.to_path_buf(),
                source: e,
            })?;

        let matches = value
            .get("repository")
            .and_then(Value::as_str)
            .is_some_and(|repo| normalize_repo_name(repo) == wanted);
        if matches {
            return Ok(Some(value));
        }
    }

    Ok(None)
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn sorted_jsonl_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    files.sort();
    files
}
