//! Path classification: decide which [`Asset`] variant a path is

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error};

use crate::asset::{Asset, AssetCore};
use crate::config::AssetConfig;
use crate::error::{AssetError, Result};
use crate::ffmpeg::FfmpegBackend;
use crate::frame::contains_placeholder;
use crate::image::ImageFile;
use crate::local::LocalFile;
use crate::probe::MediaBackend;
use crate::sequence::ImageSequence;
use crate::video::VideoFile;

/// Builds assets from paths. Cheap to clone; the configuration and media
/// backend are shared read-only.
#[derive(Clone)]
pub struct Classifier {
    config: Arc<AssetConfig>,
    backend: Arc<dyn MediaBackend>,
}

impl Classifier {
    /// Classifier backed by the ffmpeg tools named in `config`.
    pub fn new(config: AssetConfig) -> Self {
        let backend = FfmpegBackend::from_config(&config);
        Self {
            config: Arc::new(config),
            backend: Arc::new(backend),
        }
    }

    pub fn with_backend(config: Arc<AssetConfig>, backend: Arc<dyn MediaBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn MediaBackend {
        self.backend.as_ref()
    }

    /// Classify `path`.
    ///
    /// A path whose file name holds a frame placeholder stands for its
    /// parent directory. Directories become sequences, then the configured
    /// video and image extensions are checked, and any other regular file
    /// becomes a [`LocalFile`].
    pub fn classify(&self, path: impl AsRef<Path>) -> Result<Asset> {
        let mut path = path.as_ref();

        let templated = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(contains_placeholder);
        if templated {
            path = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
        }

        if !path.exists() {
            error!("Path {} does not exist", path.display());
            return Err(AssetError::PathNotFound(path.to_path_buf()));
        }

        let core = AssetCore::new(path, self.clone())?;
        let extension = core.file_extension();

        let asset = if path.is_dir() {
            Asset::Sequence(ImageSequence::open(core)?)
        } else if self.config.is_video_extension(&extension) {
            Asset::Video(VideoFile::new(core))
        } else if self.config.is_image_extension(&extension) {
            Asset::Image(ImageFile::new(core))
        } else if path.is_file() {
            Asset::Local(LocalFile::new(core))
        } else {
            error!("Path {} is not a file or directory", path.display());
            return Err(AssetError::Classification(path.to_path_buf()));
        };

        debug!("Classified {} as {}", path.display(), asset.kind());
        Ok(asset)
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
