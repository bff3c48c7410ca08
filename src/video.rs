//! Video files
//!
//! Frame count and resolution come from the first video stream; the stream
//! is probed once per instance.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::asset::AssetCore;
use crate::error::{AssetError, Result};
use crate::probe::{SceneInput, ThumbnailRequest, ThumbnailSource};

#[derive(Debug)]
pub struct VideoFile {
    core: AssetCore,
}

impl VideoFile {
    pub(crate) fn new(core: AssetCore) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &AssetCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut AssetCore {
        &mut self.core
    }

    pub fn path(&self) -> PathBuf {
        self.core.path().to_path_buf()
    }

    pub fn name(&self) -> String {
        self.core.file_name()
    }

    pub fn base_name(&self) -> String {
        self.core.file_stem()
    }

    pub fn extension(&self) -> String {
        self.core.file_extension()
    }

    pub fn start(&self) -> u32 {
        1
    }

    pub fn end(&self) -> Result<u32> {
        self.frame_count()
    }

    pub fn frame_count(&self) -> Result<u32> {
        let stream = self.core.stream(self.core.path())?;
        stream.nb_frames.ok_or_else(|| AssetError::MissingStreamField {
            path: self.path(),
            field: "nb_frames",
        })
    }

    pub fn resolution(&self) -> Result<(u32, u32)> {
        self.core.resolution_of(self.core.path())
    }

    /// Scene change within the first second of the stream.
    pub fn has_slate(&self) -> Result<bool> {
        let threshold = self.core.classifier().config().slate_threshold();
        let input = SceneInput::Movie(self.path());
        let first_change = self
            .core
            .classifier()
            .backend()
            .detect_scene_change(&input, threshold)?;
        debug!("First scene change in {}: {:?}", self.name(), first_change);
        Ok(first_change.is_some_and(|t| t < 1.0))
    }

    /// First frame of the movie, scaled.
    pub fn generate_thumbnail(&mut self, width: i32, height: i32) -> Result<Option<PathBuf>> {
        let name = format!("{}_tmp_thumb.png", self.base_name());
        let output = self.core.tmp_file(&name);
        let request = ThumbnailRequest {
            input: self.path(),
            output,
            width,
            height,
            source: ThumbnailSource::Movie,
        };
        info!("Generating thumbnail for {}", request.input.display());
        Ok(self.core.classifier().backend().render_thumbnail(&request)?)
    }
}
