//! media_asset - classify media paths into typed assets
//!
//! A path becomes a [`LocalFile`], [`ImageFile`], [`VideoFile`] or
//! [`ImageSequence`] behind the uniform [`Asset`] interface: naming and
//! version fields, frame range, resolution, thumbnails, slate detection and
//! frame-by-frame copies. Pixel-level facts come from `ffprobe`/`ffmpeg`,
//! run as subprocesses.
//!
//! ```rust,no_run
//! use media_asset::{AssetConfig, Classifier, CopyOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = Classifier::new(AssetConfig::builtin()?);
//! let plate = classifier.classify("/shots/abc0010/plate")?;
//! println!("{} v{:?} [{}]", plate.core_name(), plate.version(), plate.frame_range()?);
//!
//! let options = CopyOptions {
//!     start_offset: 1,
//!     new_start_frame: Some(1001),
//!     ..Default::default()
//! };
//! let report = plate.copy_to("/publish/abc0010/abc0010_plate_v001.%04d.dpx", &options)?;
//! println!("copied {} frames", report.copied());
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod classify;
pub mod config;
pub mod copy;
pub mod discover;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod naming;
pub mod probe;
mod image;
mod local;
mod sequence;
mod video;

pub use asset::{Asset, AssetCore, AssetInfo, AssetKind};
pub use classify::Classifier;
pub use config::{AssetConfig, ConfigError};
pub use copy::{CopyOptions, CopyReport, FastCopy, FrameAction, FrameCopy, SystemCopy};
pub use discover::{discover_sequences, SequenceCandidate};
pub use error::{AssetError, Result};
pub use ffmpeg::{FfmpegBackend, FfmpegCommand, FfmpegError};
pub use frame::{FrameSet, FrameTemplate};
pub use crate::image::ImageFile;
pub use local::LocalFile;
pub use probe::{MediaBackend, SceneInput, StreamInfo, ThumbnailRequest, ThumbnailSource};
pub use sequence::ImageSequence;
pub use video::VideoFile;
