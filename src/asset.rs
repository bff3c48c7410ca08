//! The [`Asset`] tagged union and the state every variant shares
//!
//! Variants only differ in how they derive frames, resolution, thumbnails
//! and slates. Name parsing is shared through [`crate::naming`].

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::Classifier;
use crate::copy::{CopyOptions, CopyReport};
use crate::error::{AssetError, Result};
use crate::image::ImageFile;
use crate::local::LocalFile;
use crate::naming;
use crate::probe::StreamInfo;
use crate::sequence::ImageSequence;
use crate::video::VideoFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssetKind {
    LocalFile,
    ImageFile,
    VideoFile,
    ImageSequence,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::LocalFile => "LocalFile",
            AssetKind::ImageFile => "ImageFile",
            AssetKind::VideoFile => "VideoFile",
            AssetKind::ImageSequence => "ImageSequence",
        };
        f.write_str(name)
    }
}

/// State owned by every asset instance.
///
/// The probed stream is memoized for the lifetime of this instance only.
/// Temporary files are tracked until [`AssetCore::remove_tmp_files`] runs;
/// nothing removes them implicitly.
#[derive(Debug)]
pub struct AssetCore {
    path: PathBuf,
    classifier: Classifier,
    stream: OnceCell<StreamInfo>,
    metadata: BTreeMap<String, Value>,
    tmp_files: Vec<PathBuf>,
}

impl AssetCore {
    pub(crate) fn new(path: impl Into<PathBuf>, classifier: Classifier) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(AssetError::PathNotFound(path));
        }
        Ok(Self {
            path,
            classifier,
            stream: OnceCell::new(),
            metadata: BTreeMap::new(),
            tmp_files: Vec::new(),
        })
    }

    /// The path this asset was constructed from (a directory for sequences).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub(crate) fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn file_extension(&self) -> String {
        self.path
            .extension()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Probe `target` once; later calls return the cached stream.
    pub(crate) fn stream(&self, target: &Path) -> Result<&StreamInfo> {
        if let Some(stream) = self.stream.get() {
            return Ok(stream);
        }
        debug!("Probing {}", target.display());
        let stream = self.classifier.backend().probe(target)?;
        Ok(self.stream.get_or_init(|| stream))
    }

    pub(crate) fn resolution_of(&self, target: &Path) -> Result<(u32, u32)> {
        let stream = self.stream(target)?;
        let missing = |field| AssetError::MissingStreamField {
            path: target.to_path_buf(),
            field,
        };
        let width = stream.width.ok_or_else(|| missing("width"))?;
        let height = stream.height.ok_or_else(|| missing("height"))?;
        Ok((width, height))
    }

    /// Reserve a file in the system temp dir and track it.
    pub(crate) fn tmp_file(&mut self, name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        self.tmp_files.push(path.clone());
        path
    }

    pub fn tmp_files(&self) -> &[PathBuf] {
        &self.tmp_files
    }

    /// Delete every tracked temporary file that still exists.
    pub fn remove_tmp_files(&mut self) -> std::io::Result<()> {
        for file in self.tmp_files.drain(..) {
            if file.exists() {
                debug!("Removing temporary file {}", file.display());
                std::fs::remove_file(&file)?;
            }
        }
        Ok(())
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }
}

/// A classified filesystem path.
#[derive(Debug)]
pub enum Asset {
    Local(LocalFile),
    Image(ImageFile),
    Video(VideoFile),
    Sequence(ImageSequence),
}

macro_rules! dispatch {
    ($asset:expr, $inner:ident => $body:expr) => {
        match $asset {
            Asset::Local($inner) => $body,
            Asset::Image($inner) => $body,
            Asset::Video($inner) => $body,
            Asset::Sequence($inner) => $body,
        }
    };
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Local(_) => AssetKind::LocalFile,
            Asset::Image(_) => AssetKind::ImageFile,
            Asset::Video(_) => AssetKind::VideoFile,
            Asset::Sequence(_) => AssetKind::ImageSequence,
        }
    }

    pub fn core(&self) -> &AssetCore {
        dispatch!(self, a => a.core())
    }

    pub fn core_mut(&mut self) -> &mut AssetCore {
        dispatch!(self, a => a.core_mut())
    }

    /// Canonical path; a frame template for sequences.
    pub fn path(&self) -> PathBuf {
        dispatch!(self, a => a.path())
    }

    pub fn name(&self) -> String {
        dispatch!(self, a => a.name())
    }

    pub fn base_name(&self) -> String {
        dispatch!(self, a => a.base_name())
    }

    /// Base name without its version token, stable across versions.
    pub fn core_name(&self) -> String {
        naming::core_name(&self.base_name())
    }

    pub fn extension(&self) -> String {
        dispatch!(self, a => a.extension())
    }

    pub fn version(&self) -> Option<u32> {
        let patterns = self.core().classifier().config().version_patterns();
        naming::extract_version(&self.base_name(), patterns)
    }

    /// Values of a `{shot}_{task}` style template, read from the core name.
    pub fn fields_from_name(&self, template: &str) -> Option<BTreeMap<String, String>> {
        naming::fields_from_name(&self.core_name(), template)
    }

    pub fn start(&self) -> u32 {
        dispatch!(self, a => a.start())
    }

    pub fn end(&self) -> Result<u32> {
        dispatch!(self, a => a.end())
    }

    pub fn frame_count(&self) -> Result<u32> {
        dispatch!(self, a => a.frame_count())
    }

    pub fn frame_range(&self) -> Result<String> {
        match self {
            Asset::Sequence(seq) => Ok(seq.frames().to_string()),
            other => Ok(format!("{}-{}", other.start(), other.end()?)),
        }
    }

    pub fn resolution(&self) -> Result<(u32, u32)> {
        match self {
            Asset::Local(_) => Err(AssetError::Unsupported {
                kind: self.kind(),
                operation: "resolution",
            }),
            Asset::Image(a) => a.resolution(),
            Asset::Video(a) => a.resolution(),
            Asset::Sequence(a) => a.resolution(),
        }
    }

    pub fn width(&self) -> Result<u32> {
        Ok(self.resolution()?.0)
    }

    pub fn height(&self) -> Result<u32> {
        Ok(self.resolution()?.1)
    }

    /// True when the first frame looks like a slate ahead of the footage.
    pub fn has_slate(&self) -> Result<bool> {
        dispatch!(self, a => a.has_slate())
    }

    /// Render a scaled thumbnail into the temp dir. `height = -1` keeps
    /// the aspect ratio. The file is tracked in [`Asset::tmp_files`].
    pub fn generate_thumbnail(&mut self, width: i32, height: i32) -> Result<Option<PathBuf>> {
        match self {
            Asset::Local(_) => {
                warn!("{} has no thumbnail", self.path().display());
                Ok(None)
            }
            Asset::Image(a) => a.generate_thumbnail(width, height),
            Asset::Video(a) => a.generate_thumbnail(width, height),
            Asset::Sequence(a) => a.generate_thumbnail(width, height),
        }
    }

    /// [`Asset::generate_thumbnail`] at the configured default size.
    pub fn generate_default_thumbnail(&mut self) -> Result<Option<PathBuf>> {
        let (width, height) = self.core().classifier().config().thumbnail_size();
        self.generate_thumbnail(width, height)
    }

    /// Copy to `destination`: frame by frame for sequences (a frame
    /// template is expected), a single file copy otherwise.
    pub fn copy_to(
        &self,
        destination: impl AsRef<Path>,
        options: &CopyOptions,
    ) -> Result<CopyReport> {
        match self {
            Asset::Sequence(seq) => seq.copy(destination, options),
            other => crate::copy::copy_single(other.core(), destination.as_ref(), options.dry_run),
        }
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        self.core().metadata()
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.core_mut().set_metadata(key, value)
    }

    pub fn tmp_files(&self) -> &[PathBuf] {
        self.core().tmp_files()
    }

    pub fn remove_tmp_files(&mut self) -> Result<()> {
        Ok(self.core_mut().remove_tmp_files()?)
    }

    pub fn as_sequence(&self) -> Option<&ImageSequence> {
        match self {
            Asset::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Serializable snapshot. With `probe`, values that need the media
    /// backend (video frame counts, resolution) are filled in as well.
    pub fn info(&self, probe: bool) -> Result<AssetInfo> {
        let needs_probe = matches!(self, Asset::Video(_));
        let (end, frame_count, frame_range) = if needs_probe && !probe {
            (None, None, None)
        } else {
            (
                Some(self.end()?),
                Some(self.frame_count()?),
                Some(self.frame_range()?),
            )
        };
        let resolution = match self {
            Asset::Local(_) => None,
            _ if probe => Some(self.resolution()?),
            _ => None,
        };

        Ok(AssetInfo {
            kind: self.kind(),
            path: self.path(),
            name: self.name(),
            base_name: self.base_name(),
            core_name: self.core_name(),
            extension: self.extension(),
            version: self.version(),
            start: self.start(),
            end,
            frame_count,
            frame_range,
            resolution,
            metadata: self.metadata().clone(),
        })
    }
}

/// Flat view of an asset, for printing and serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetInfo {
    pub kind: AssetKind,
    pub path: PathBuf,
    pub name: String,
    pub base_name: String,
    pub core_name: String,
    pub extension: String,
    pub version: Option<u32>,
    pub start: u32,
    pub end: Option<u32>,
    pub frame_count: Option<u32>,
    pub frame_range: Option<String>,
    pub resolution: Option<(u32, u32)>,
    pub metadata: BTreeMap<String, Value>,
}
