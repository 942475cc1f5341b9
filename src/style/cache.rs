use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::CacheError;

/// File name of the cache inside the git directory.
const DEFAULT_CACHE_FILE: &str = "ai-commit-style.json";

/// Cached commit-style signals for one repository.
///
/// Every field is optional on disk so older or hand-edited files still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleProfile {
    /// Number of commits scanned to produce `summary`.
    pub history_depth: u32,
    pub summary: Option<String>,
    pub guidelines: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl StyleProfile {
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn cached_guidelines(&self) -> Option<&str> {
        self.guidelines.as_deref().filter(|g| !g.trim().is_empty())
    }

    /// Take the analysed fields from `analysis`, keeping our guidelines.
    pub fn apply_analysis(&mut self, analysis: StyleProfile) {
        self.history_depth = analysis.history_depth;
        self.summary = analysis.summary;
        self.generated_at = analysis.generated_at;
    }
}

/// The on-disk home of a repository's `StyleProfile`.
#[derive(Debug, Clone)]
pub struct StyleCache {
    path: PathBuf,
}

impl StyleCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at the default location inside `git_dir`.
    pub fn in_git_dir(git_dir: &Path) -> Self {
        Self::new(git_dir.join(DEFAULT_CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load: `Ok(None)` when there is no cache yet.
    pub fn try_load(&self) -> Result<Option<StyleProfile>, CacheError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| CacheError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Load the profile, treating a missing or broken cache as empty.
    pub fn load(&self) -> StyleProfile {
        match self.try_load() {
            Ok(profile) => profile.unwrap_or_default(),
            Err(e) => {
                log::warn!("{e}; ignoring cached style profile");
                StyleProfile::default()
            }
        }
    }

    /// Atomically replace the cache file with `profile`.
    pub fn save(&self, profile: &StyleProfile) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(profile).map_err(CacheError::Encode)?;

        let write_err = |source| CacheError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        log::debug!("Wrote style cache {:?}", self.path);
        Ok(())
    }

    /// Replace only the cached guidelines, keeping the analysed fields.
    pub fn merge_guidelines(&self, text: &str) -> Result<StyleProfile, CacheError> {
        let mut profile = self.load();
        profile.guidelines = Some(text.to_string());
        self.save(&profile)?;
        Ok(profile)
    }
}
