//! Files that are neither video nor still image

use std::path::PathBuf;

use crate::asset::AssetCore;
use crate::error::Result;

#[derive(Debug)]
pub struct LocalFile {
    core: AssetCore,
}

impl LocalFile {
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

    pub fn has_slate(&self) -> Result<bool> {
        Ok(false)
    }
}
