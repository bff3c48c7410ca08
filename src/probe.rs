//! Media backend interface: stream probing, thumbnail rendering and
//! scene-change detection.
//!
//! The ffmpeg implementation lives in [`crate::ffmpeg`]; tests substitute
//! their own backend.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ffmpeg::FfmpegError;

/// First video stream of a media file, as reported by the prober.
///
/// `StreamInfo::default()` stands for "no stream found".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub nb_frames: Option<u32>,
    pub pix_fmt: Option<String>,
    /// Every field of the stream object, untouched
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl StreamInfo {
    /// Build from one entry of ffprobe's `streams` array.
    pub fn from_json(stream: &Value) -> Self {
        let get_u32 = |key: &str| -> Option<u32> {
            let value = stream.get(key)?;
            // ffprobe prints some counters as strings ("nb_frames": "240")
            value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .and_then(|v| u32::try_from(v).ok())
        };
        let get_str = |key: &str| -> Option<String> {
            stream.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
        };

        Self {
            codec_name: get_str("codec_name"),
            width: get_u32("width"),
            height: get_u32("height"),
            nb_frames: get_u32("nb_frames"),
            pix_fmt: get_str("pix_fmt"),
            raw: stream.as_object().cloned().unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.width.is_none() && self.height.is_none()
    }
}

/// What ffmpeg should read when rendering a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSource {
    /// A single still image
    Still,
    /// A movie; only its first frame is rendered
    Movie,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: i32,
    pub height: i32,
    pub source: ThumbnailSource,
}

impl ThumbnailRequest {
    /// ffmpeg scale filter, `-1` keeping the aspect ratio.
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

/// Input of the scene-change probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneInput {
    /// The start of a movie file
    Movie(PathBuf),
    /// Two still frames concatenated into a two-frame stream
    FramePair(PathBuf, PathBuf),
}

impl SceneInput {
    /// lavfi filter graph selecting frames whose scene score exceeds `threshold`.
    pub fn filter_graph(&self, threshold: f64) -> String {
        match self {
            SceneInput::Movie(path) => format!(
                "movie={}, select=gt(scene\\,{})",
                escape_filter_path(path),
                threshold
            ),
            SceneInput::FramePair(first, second) => format!(
                "movie={} [img1]; movie={} [img2]; [img1] [img2] concat [out]; [out] select=gt(scene\\,{})",
                escape_filter_path(first),
                escape_filter_path(second),
                threshold
            ),
        }
    }
}

/// Forward slashes only, `:` escaped twice for the lavfi parser.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\\\:")
}

/// External tools the assets delegate pixel-level facts to.
pub trait MediaBackend: Send + Sync {
    /// First video stream of `path`, or an empty [`StreamInfo`].
    fn probe(&self, path: &Path) -> Result<StreamInfo, FfmpegError>;

    /// Render a scaled thumbnail. `Ok(None)` when the renderer ran but failed.
    fn render_thumbnail(&self, request: &ThumbnailRequest) -> Result<Option<PathBuf>, FfmpegError>;

    /// Timestamp (seconds) of the first detected scene change, if any.
    fn detect_scene_change(
        &self,
        input: &SceneInput,
        threshold: f64,
    ) -> Result<Option<f64>, FfmpegError>;
}
