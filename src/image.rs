//! Single still image files

use std::path::PathBuf;

use tracing::info;

use crate::asset::AssetCore;
use crate::error::Result;
use crate::probe::{ThumbnailRequest, ThumbnailSource};

#[derive(Debug)]
pub struct ImageFile {
    core: AssetCore,
}

impl ImageFile {
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
        Ok(1)
    }

    pub fn frame_count(&self) -> Result<u32> {
        Ok(1)
    }

    pub fn resolution(&self) -> Result<(u32, u32)> {
        self.core.resolution_of(self.core.path())
    }

    pub fn has_slate(&self) -> Result<bool> {
        Ok(false)
    }

    /// Scaled copy of the image.
    pub fn generate_thumbnail(&mut self, width: i32, height: i32) -> Result<Option<PathBuf>> {
        let name = format!("{}_tmp_thumb.png", self.base_name());
        let output = self.core.tmp_file(&name);
        let request = ThumbnailRequest {
            input: self.path(),
            output,
            width,
            height,
            source: ThumbnailSource::Still,
        };
        info!("Generating thumbnail for {}", request.input.display());
        Ok(self.core.classifier().backend().render_thumbnail(&request)?)
    }
}
