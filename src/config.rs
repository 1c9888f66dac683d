//! `.stylegraph.toml` configuration.
//!
//! Every key is optional:
//!
//! ```toml
//! base-dir = "src"
//! root = "globals/scss/styles.scss"
//! output = "graph.json"
//! median = "lexicographic"   # or "numeric"
//! report-unreachable = false
//! ```
//!
//! Relative `base-dir` and `output` paths are taken relative to the directory
//! holding the config file. `root` is relative to `base-dir`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::graph::resolver::relative_id;
use crate::stats::MedianMode;

/// File name searched for in the current directory and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".stylegraph.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Errors raised while loading a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub base_dir: PathBuf,
    pub root: PathBuf,
    pub output: PathBuf,
    pub median: MedianMode,
    pub report_unreachable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            root: PathBuf::from("globals/scss/styles.scss"),
            output: PathBuf::from("graph.json"),
            median: MedianMode::default(),
            report_unreachable: false,
        }
    }
}

impl Config {
    /// Reads and parses a config file, rebasing its relative paths onto the
    /// file's directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(dir) = path.parent() {
            config.base_dir = dir.join(&config.base_dir);
            config.output = dir.join(&config.output);
        }

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Graph id of the root file.
    ///
    /// ```
    /// use stylegraph::config::Config;
    ///
    /// let config = Config { root: "./globals/scss/styles.scss".into(), ..Config::default() };
    /// assert_eq!(config.root_id(), "globals/scss/styles.scss");
    /// ```
    pub fn root_id(&self) -> String {
        relative_id(Path::new(""), &self.root)
    }

    /// Loads the nearest config file at or above `start`, or the defaults
    /// when there is none.
    ///
    /// A config file that exists but cannot be parsed is an error.
    pub fn discover(start: &Path) -> Result<Self, ConfigError> {
        match find_config_file(start) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!(
                    "No {} found after checking {} directories, using defaults",
                    CONFIG_FILE_NAME, MAX_TRAVERSAL_DEPTH
                );
                Ok(Self::default())
            }
        }
    }
}

/// Finds the nearest config file at or above `start`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// `start` and its parents, nearest first, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.root, PathBuf::from("globals/scss/styles.scss"));
        assert_eq!(config.median, MedianMode::Lexicographic);
    }

    #[test]
    fn test_parse_all_keys() {
        let config: Config = toml::from_str(
            "base-dir = \"src\"\nroot = \"main.scss\"\noutput = \"out/graph.json\"\nmedian = \"numeric\"\nreport-unreachable = true\n",
        )
        .unwrap();
        assert_eq!(config.base_dir, PathBuf::from("src"));
        assert_eq!(config.root, PathBuf::from("main.scss"));
        assert_eq!(config.median, MedianMode::Numeric);
        assert!(config.report_unreachable);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(toml::from_str::<Config>("colour = true").is_err());
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = create_tree(&[
            (".stylegraph.toml", "base-dir = \"src\"\nmedian = \"numeric\"\n"),
            ("src/components/_a.scss", ""),
        ]);

        let config = Config::discover(&dir.path().join("src/components")).unwrap();

        assert_eq!(config.base_dir, dir.path().join("src"));
        assert_eq!(config.output, dir.path().join("graph.json"));
        assert_eq!(config.median, MedianMode::Numeric);
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = create_tree(&[("deep/er/x.scss", "")]);
        let start = dir.path().join("deep/er");
        if find_config_file(&start).is_none() {
            assert_eq!(Config::discover(&start).unwrap(), Config::default());
        }
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = create_tree(&[(".stylegraph.toml", "median = 3\n")]);
        let err = Config::discover(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_directory_ancestors_depth() {
        let ancestors: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(ancestors, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }
}
