//! Project configuration (`form-request-phpdoc.json`).
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "form-request-phpdoc.json";

static WINDOWS_ABSOLUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]:\\").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Side-channel stub file, relative to the project root.
    pub filename: String,
    /// Parent class written into side-channel stubs.
    pub form_request_extends: String,
    /// `true` writes into the request classes themselves.
    pub default_write: bool,
    pub scan_dirs: Vec<String>,
    /// JSON dump of every request's `rules()`.
    pub rules_dump: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filename: "_form_request_phpdoc.php".into(),
            form_request_extends: "\\Illuminate\\Foundation\\Http\\FormRequest".into(),
            default_write: false,
            scan_dirs: vec!["app/Http/Requests".into()],
            rules_dump: "form_request_rules.json".into(),
        }
    }
}

/// Where merged docblocks go. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteDestination {
    /// Rewrite each request class file.
    InPlace,
    /// Collect stubs into one file, flushed at the end of the run.
    SideChannel(PathBuf),
}

/// The project being documented; relative config paths hang off its root.
#[derive(Debug, Clone)]
pub struct Project {
    pub base_path: PathBuf,
    pub config: Config,
}

impl Config {
    /// Read `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(source) => crate::path_de::from_str_with_path(path, &source),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(error) => Err(Error::read(path, error)),
        }
    }
}

impl Project {
    pub fn load(base_path: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => resolve_against(&base_path, &path.to_string_lossy()),
            None => base_path.join(DEFAULT_CONFIG_FILE),
        };
        let config = Config::load(&config_path)?;
        Ok(Self { base_path, config })
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        resolve_against(&self.base_path, path)
    }

    pub fn scan_dirs(&self) -> Vec<PathBuf> {
        self.config.scan_dirs.iter().map(|dir| self.resolve(dir)).collect()
    }

    pub fn rules_dump(&self) -> PathBuf {
        self.resolve(&self.config.rules_dump)
    }

    /// `--write` forces in-place; otherwise the config decides.
    pub fn destination(&self, write_flag: bool) -> WriteDestination {
        if write_flag || self.config.default_write {
            WriteDestination::InPlace
        } else {
            WriteDestination::SideChannel(self.resolve(&self.config.filename))
        }
    }
}

fn resolve_against(base: &Path, path: &str) -> PathBuf {
    if WINDOWS_ABSOLUTE.is_match(path) || path.starts_with('/') {
        PathBuf::from(path)
    } else {
        base.join(path)
    }
}
