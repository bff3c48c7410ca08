//! Image sequences: one folder, one contiguous run of numbered frames

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::asset::AssetCore;
use crate::copy::{self, CopyOptions, CopyReport, FastCopy, SystemCopy};
use crate::discover::{discover_sequences, SequenceCandidate};
use crate::error::{AssetError, Result};
use crate::frame::{FrameSet, FrameTemplate};
use crate::probe::{SceneInput, ThumbnailRequest, ThumbnailSource};

#[derive(Debug)]
pub struct ImageSequence {
    core: AssetCore,
    template: FrameTemplate,
    frames: FrameSet,
}

impl ImageSequence {
    /// Validate the folder behind `core` and build the sequence.
    ///
    /// Fails with [`AssetError::InvalidSequence`] unless exactly one
    /// candidate is found, and with [`AssetError::BrokenSequence`] when that
    /// candidate has missing frames.
    pub(crate) fn open(core: AssetCore) -> Result<Self> {
        let dir = core.path();
        let mut candidates = discover_sequences(dir)?;

        let SequenceCandidate { template, frames } = match candidates.len() {
            0 => {
                return Err(AssetError::InvalidSequence(format!(
                    "No sequences found in the folder {}",
                    dir.display()
                )))
            }
            1 => candidates.remove(0),
            n => {
                let found: Vec<String> = candidates
                    .iter()
                    .map(|c| c.template.file_name())
                    .collect();
                return Err(AssetError::InvalidSequence(format!(
                    "Multiple file sequences found in {} ({}): {}",
                    dir.display(),
                    n,
                    found.join(", ")
                )));
            }
        };

        if !frames.is_contiguous() {
            return Err(AssetError::BrokenSequence(frames));
        }

        debug!("Sequence {} [{}]", template, frames);
        Ok(Self {
            core,
            template,
            frames,
        })
    }

    pub fn core(&self) -> &AssetCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut AssetCore {
        &mut self.core
    }

    /// Frame template, e.g. `/shots/plate/lpk_plate_v001.%04d.dpx`.
    pub fn path(&self) -> PathBuf {
        self.template.path()
    }

    pub fn template(&self) -> &FrameTemplate {
        &self.template
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn name(&self) -> String {
        self.template.file_name()
    }

    pub fn base_name(&self) -> String {
        self.template.prefix().trim_end_matches(['.', '_']).to_string()
    }

    pub fn extension(&self) -> String {
        self.template.suffix().trim_start_matches('.').to_string()
    }

    pub fn directory(&self) -> &Path {
        self.template.dir()
    }

    pub fn directory_name(&self) -> String {
        self.directory()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn frame_path(&self, frame: u32) -> PathBuf {
        self.template.frame_path(frame)
    }

    pub fn start(&self) -> u32 {
        self.frames.start().unwrap_or_default()
    }

    pub fn end(&self) -> Result<u32> {
        Ok(self.last())
    }

    fn last(&self) -> u32 {
        self.frames.end().unwrap_or_default()
    }

    pub fn frame_count(&self) -> Result<u32> {
        Ok(self.count())
    }

    pub(crate) fn count(&self) -> u32 {
        self.last() - self.start() + 1
    }

    /// Probed from the first frame.
    pub fn resolution(&self) -> Result<(u32, u32)> {
        self.core.resolution_of(&self.frame_path(self.start()))
    }

    /// Scene change between the first two frames.
    ///
    /// The two frames are concatenated into a synthetic stream since the
    /// prober can not open a sequence at an arbitrary start frame.
    pub fn has_slate(&self) -> Result<bool> {
        if self.count() < 2 {
            debug!("{} has a single frame, no slate", self.name());
            return Ok(false);
        }
        let input = SceneInput::FramePair(
            self.frame_path(self.start()),
            self.frame_path(self.start() + 1),
        );
        let threshold = self.core.classifier().config().slate_threshold();
        let first_change = self
            .core
            .classifier()
            .backend()
            .detect_scene_change(&input, threshold)?;
        debug!("First scene change in {}: {:?}", self.name(), first_change);
        Ok(first_change.is_some_and(|t| t < 1.0))
    }

    /// Frame used for thumbnails.
    pub fn middle_frame(&self) -> u32 {
        self.start() + self.count() / 2
    }

    /// Scaled copy of the middle frame.
    pub fn generate_thumbnail(&mut self, width: i32, height: i32) -> Result<Option<PathBuf>> {
        let name = format!("{}_tmp_thumb.png", self.base_name());
        let output = self.core.tmp_file(&name);
        let request = ThumbnailRequest {
            input: self.frame_path(self.middle_frame()),
            output,
            width,
            height,
            source: ThumbnailSource::Still,
        };
        info!("Generating thumbnail for {}", request.input.display());
        Ok(self.core.classifier().backend().render_thumbnail(&request)?)
    }

    /// Copy frame by frame to `destination`, a frame template.
    pub fn copy(&self, destination: impl AsRef<Path>, options: &CopyOptions) -> Result<CopyReport> {
        self.copy_with(destination, options, &SystemCopy)
    }

    /// [`ImageSequence::copy`] with an explicit fast-copy strategy.
    pub fn copy_with(
        &self,
        destination: impl AsRef<Path>,
        options: &CopyOptions,
        fast_copy: &dyn FastCopy,
    ) -> Result<CopyReport> {
        copy::copy_sequence(self, destination.as_ref(), options, fast_copy)
    }
}
