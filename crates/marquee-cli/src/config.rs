//! Path resolution for the CLI.
//!
//! Everything lives under one data directory:
//! - `graph.redb`: the relationship graph
//! - `index/`: vector index artifacts
//! - `imdb_top_1000.csv`: default dataset location
//! - `models/all-MiniLM-L6-v2/`: default embedding model location
//!
//! The dataset and model directory can be overridden by flag or environment
//! variable (handled by clap in `main.rs`).

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Graph database file name
const GRAPH_FILENAME: &str = "graph.redb";

/// Subdirectory holding the vector index files
const INDEX_DIRNAME: &str = "index";

/// Default dataset file name
const DATASET_FILENAME: &str = "imdb_top_1000.csv";

/// Default model subdirectory
const MODEL_SUBDIR: &str = "models/all-MiniLM-L6-v2";

/// Resolved locations for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub dataset: PathBuf,
    pub model_dir: PathBuf,
}

impl Paths {
    /// Resolves paths from optional overrides, defaulting into the data dir.
    pub fn resolve(
        data_dir: Option<&PathBuf>,
        dataset: Option<&PathBuf>,
        model_dir: Option<&PathBuf>,
    ) -> Result<Self> {
        let data_dir = get_data_dir(data_dir)?;
        Ok(Self {
            dataset: dataset
                .cloned()
                .unwrap_or_else(|| data_dir.join(DATASET_FILENAME)),
            model_dir: model_dir
                .cloned()
                .unwrap_or_else(|| data_dir.join(MODEL_SUBDIR)),
            data_dir,
        })
    }

    pub fn graph_path(&self) -> PathBuf {
        self.data_dir.join(GRAPH_FILENAME)
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join(INDEX_DIRNAME)
    }

    /// Creates the data directory if it does not exist yet.
    pub fn ensure_data_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            anyhow!(
                "Could not create data directory {}: {}",
                self.data_dir.display(),
                e
            )
        })?;
        Ok(&self.data_dir)
    }
}

/// Returns the data directory.
///
/// - macOS: `~/Library/Application Support/dev.marquee.Marquee/`
/// - Linux: `~/.local/share/marquee/`
/// - Windows: `%APPDATA%\marquee\Marquee\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    ProjectDirs::from("dev", "marquee", "Marquee")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_dir() {
        let dir = get_data_dir(None).unwrap();
        let dir_str = dir.to_string_lossy().to_lowercase();
        assert!(
            dir_str.contains("marquee"),
            "Data dir should use the project name: {}",
            dir_str
        );
    }

    #[test]
    fn test_custom_data_dir() {
        let custom = PathBuf::from("/tmp/custom-data");
        let dir = get_data_dir(Some(&custom)).unwrap();
        assert_eq!(dir, custom);
    }

    #[test]
    fn test_defaults_live_under_data_dir() {
        let data = PathBuf::from("/tmp/marquee-data");
        let paths = Paths::resolve(Some(&data), None, None).unwrap();

        assert_eq!(paths.dataset, data.join("imdb_top_1000.csv"));
        assert_eq!(paths.model_dir, data.join("models/all-MiniLM-L6-v2"));
        assert_eq!(paths.graph_path(), data.join("graph.redb"));
        assert_eq!(paths.index_dir(), data.join("index"));
    }

    #[test]
    fn test_overrides_win() {
        let data = PathBuf::from("/tmp/marquee-data");
        let dataset = PathBuf::from("/srv/movies.csv");
        let model = PathBuf::from("/opt/minilm");
        let paths = Paths::resolve(Some(&data), Some(&dataset), Some(&model)).unwrap();

        assert_eq!(paths.dataset, dataset);
        assert_eq!(paths.model_dir, model);
        assert_eq!(paths.graph_path(), data.join("graph.redb"));
    }

    #[test]
    fn test_ensure_data_dir_creates_it() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("nested/data");
        let paths = Paths::resolve(Some(&data), None, None).unwrap();

        paths.ensure_data_dir().unwrap();
        assert!(data.is_dir());
    }
}
