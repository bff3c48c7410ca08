//! Process-wide configuration, loaded once from YAML and read-only afterwards.
//!
//! ```yaml
//! video_files_formats: [mov, mp4]
//! image_files_formats: [dpx, exr, png]
//! versions_regex:
//!   - '[_.]v(?P<version_number>\d+)'
//! ffmpeg_dir:
//!   linux: /opt/ffmpeg/bin
//! slate_threshold: 0.2
//! ```
//!
//! Every key is optional. `FFMPEG_DIR` in the environment overrides
//! `ffmpeg_dir` for all platforms.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable overriding the configured ffmpeg directory.
pub const FFMPEG_DIR_ENV: &str = "FFMPEG_DIR";

/// Named capture group every version pattern must define.
pub const VERSION_GROUP: &str = "version_number";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { source: io::Error, path: PathBuf },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid version pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("version pattern {0:?} has no `version_number` group")]
    MissingVersionGroup(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ConfigFile {
    video_files_formats: Vec<String>,
    image_files_formats: Vec<String>,
    versions_regex: Vec<String>,
    ffmpeg_dir: PlatformDirs,
    slate_threshold: f64,
    thumbnail: ThumbnailSection,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            video_files_formats: owned(&["mov", "mp4", "avi", "mkv", "m4v", "mxf", "webm"]),
            image_files_formats: owned(&[
                "dpx", "exr", "jpg", "jpeg", "png", "tif", "tiff", "tga", "bmp",
            ]),
            versions_regex: owned(&[r"[_.]v(?P<version_number>\d+)", r"v(?P<version_number>\d+)"]),
            ffmpeg_dir: PlatformDirs::default(),
            slate_threshold: 0.2,
            thumbnail: ThumbnailSection::default(),
        }
    }
}

/// Per-platform ffmpeg install directories.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformDirs {
    pub linux: Option<PathBuf>,
    pub mac: Option<PathBuf>,
    pub win: Option<PathBuf>,
}

impl PlatformDirs {
    fn current(&self) -> Option<&PathBuf> {
        if cfg!(target_os = "macos") {
            self.mac.as_ref()
        } else if cfg!(windows) {
            self.win.as_ref()
        } else {
            self.linux.as_ref()
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
struct ThumbnailSection {
    width: i32,
    height: i32,
}

impl Default for ThumbnailSection {
    fn default() -> Self {
        // -1 keeps the aspect ratio in ffmpeg's scale filter
        Self {
            width: 320,
            height: -1,
        }
    }
}

/// Immutable configuration shared by the classifier and every asset it builds.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    video_formats: BTreeSet<String>,
    image_formats: BTreeSet<String>,
    version_patterns: Vec<Regex>,
    ffmpeg_dir: Option<PathBuf>,
    slate_threshold: f64,
    thumbnail_size: (i32, i32),
}

impl AssetConfig {
    /// Built-in defaults, still honouring `FFMPEG_DIR`.
    pub fn builtin() -> Result<Self> {
        Self::from_file(ConfigFile::default())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if content.trim().is_empty() {
            return Self::builtin();
        }
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        debug!("Loading asset config from {}", path.display());
        Self::from_yaml_str(&content).map_err(|e| match e {
            ConfigError::Yaml(source) => ConfigError::Parse {
                source,
                path: path.to_path_buf(),
            },
            other => other,
        })
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let version_patterns = file
            .versions_regex
            .iter()
            .map(|pattern| compile_version_pattern(pattern))
            .collect::<Result<Vec<_>>>()?;

        let ffmpeg_dir = match std::env::var_os(FFMPEG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
            _ => file.ffmpeg_dir.current().cloned(),
        };
        if ffmpeg_dir.is_none() {
            warn!(
                "Can not determine ffmpeg path. Set {} or ffmpeg_dir; falling back to PATH",
                FFMPEG_DIR_ENV
            );
        }

        Ok(Self {
            video_formats: normalize_extensions(&file.video_files_formats),
            image_formats: normalize_extensions(&file.image_files_formats),
            version_patterns,
            ffmpeg_dir,
            slate_threshold: file.slate_threshold,
            thumbnail_size: (file.thumbnail.width, file.thumbnail.height),
        })
    }

    pub fn is_video_extension(&self, extension: &str) -> bool {
        self.video_formats.contains(&extension.to_ascii_lowercase())
    }

    pub fn is_image_extension(&self, extension: &str) -> bool {
        self.image_formats.contains(&extension.to_ascii_lowercase())
    }

    pub fn version_patterns(&self) -> &[Regex] {
        &self.version_patterns
    }

    pub fn ffmpeg_dir(&self) -> Option<&Path> {
        self.ffmpeg_dir.as_deref()
    }

    /// Path of a tool (`ffmpeg`, `ffprobe`) inside the configured directory.
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        match &self.ffmpeg_dir {
            Some(dir) => dir.join(tool),
            None => PathBuf::from(tool),
        }
    }

    /// Scene-change score above which frame 2 counts as a cut from frame 1.
    pub fn slate_threshold(&self) -> f64 {
        self.slate_threshold
    }

    pub fn thumbnail_size(&self) -> (i32, i32) {
        self.thumbnail_size
    }
}

fn compile_version_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    if !regex.capture_names().flatten().any(|name| name == VERSION_GROUP) {
        return Err(ConfigError::MissingVersionGroup(pattern.to_string()));
    }
    Ok(regex)
}

fn normalize_extensions(items: &[String]) -> BTreeSet<String> {
    items
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
