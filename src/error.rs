use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::ffmpeg::FfmpegError;
use crate::frame::FrameSet;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Sequence broken and has missing frames: {0}")]
    BrokenSequence(FrameSet),

    #[error("Path is not a file or directory: {}", .0.display())]
    Classification(PathBuf),

    #[error("Invalid frame template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Start offset {offset} leaves nothing to copy from {frame_count} frames")]
    InvalidOffset { offset: u32, frame_count: u32 },

    #[error("Media stream of {} has no `{field}`", .path.display())]
    MissingStreamField { path: PathBuf, field: &'static str },

    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: crate::asset::AssetKind,
        operation: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AssetError>;
