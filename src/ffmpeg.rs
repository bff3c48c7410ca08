//! FFmpeg / FFprobe command wrappers and the subprocess-backed [`MediaBackend`]

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::AssetConfig;
use crate::probe::{MediaBackend, SceneInput, StreamInfo, ThumbnailRequest, ThumbnailSource};

#[derive(Debug, Error)]
pub enum FfmpegError {
    #[error("{} not found", .0.display())]
    NotInstalled(PathBuf),

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct FfmpegCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.args.push("-i".to_string());
        self.args.push(path.as_ref().display().to_string());
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.args.push(path.as_ref().display().to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// The command line, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    pub fn execute(self) -> Result<Output, FfmpegError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| {
                debug!("Test this command: {}", self.command_line());
                if e.kind() == ErrorKind::NotFound {
                    FfmpegError::NotInstalled(self.program.clone())
                } else {
                    FfmpegError::ExecutionFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            debug!("Test this command: {}", self.command_line());
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FfmpegError::ExecutionFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(output)
    }
}

/// [`MediaBackend`] shelling out to `ffprobe` and `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(config.tool_path("ffmpeg"), config.tool_path("ffprobe"))
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    fn probe_with_ffprobe(&self, path: &Path) -> Result<StreamInfo, FfmpegError> {
        let output = FfmpegCommand::new(&self.ffprobe)
            .args(&[
                "-v",
                "quiet",
                "-select_streams",
                "v",
                "-show_streams",
                "-print_format",
                "json",
            ])
            .output(path)
            .execute()
            .inspect_err(|e| {
                error!(
                    "ffprobe failed to extract information about {}: {}",
                    path.display(),
                    e
                )
            })?;
        parse_probe_output(path, &output.stdout)
    }
}

/// First stream of an ffprobe `-show_streams` JSON document.
pub fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<StreamInfo, FfmpegError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        warn!("No media streams are found in {}", path.display());
        return Ok(StreamInfo::default());
    }
    let parsed: Value = serde_json::from_slice(stdout)
        .map_err(|e| FfmpegError::InvalidOutput(format!("JSON parse error: {}", e)))?;

    let streams = parsed
        .get("streams")
        .and_then(|s| s.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    match streams {
        [] => {
            warn!("No media streams are found in {}", path.display());
            Ok(StreamInfo::default())
        }
        [stream] => Ok(StreamInfo::from_json(stream)),
        [stream, ..] => {
            warn!(
                "Media file {} contains {} streams. Using the first one.",
                path.display(),
                streams.len()
            );
            Ok(StreamInfo::from_json(stream))
        }
    }
}

/// Timestamp of the first frame reported by `ffprobe -show_frames`.
pub fn parse_scene_output(stdout: &[u8]) -> Result<Option<f64>, FfmpegError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let parsed: Value = serde_json::from_slice(stdout)
        .map_err(|e| FfmpegError::InvalidOutput(format!("JSON parse error: {}", e)))?;

    let Some(frame) = parsed
        .get("frames")
        .and_then(|f| f.as_array())
        .and_then(|frames| frames.first())
    else {
        return Ok(None);
    };

    // pkt_dts_time is gone from newer ffprobe releases
    let timestamp = ["pkt_dts_time", "pts_time", "best_effort_timestamp_time"]
        .iter()
        .filter_map(|key| frame.get(*key))
        .find_map(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        });

    timestamp.map(Some).ok_or_else(|| {
        FfmpegError::InvalidOutput("scene change frame has no timestamp".to_string())
    })
}

impl MediaBackend for FfmpegBackend {
    fn probe(&self, path: &Path) -> Result<StreamInfo, FfmpegError> {
        match self.probe_with_ffprobe(path) {
            Err(FfmpegError::NotInstalled(program)) => {
                // Still images can be measured from their header alone
                let (width, height) = image::image_dimensions(path)
                    .map_err(|_| FfmpegError::NotInstalled(program.clone()))?;
                warn!(
                    "{} not available, read {}x{} from the image header of {}",
                    program.display(),
                    width,
                    height,
                    path.display()
                );
                Ok(StreamInfo {
                    width: Some(width),
                    height: Some(height),
                    nb_frames: Some(1),
                    ..Default::default()
                })
            }
            other => other,
        }
    }

    fn render_thumbnail(&self, request: &ThumbnailRequest) -> Result<Option<PathBuf>, FfmpegError> {
        let filter = request.scale_filter();
        let mut cmd = FfmpegCommand::new(&self.ffmpeg)
            .args(&["-v", "quiet"])
            .input(&request.input);
        cmd = match request.source {
            ThumbnailSource::Still => cmd.args(&["-y"]),
            ThumbnailSource::Movie => cmd.args(&["-y", "-vframes", "1"]),
        };
        let cmd = cmd.args(&["-vf", &filter]).output(&request.output);

        match cmd.execute() {
            Ok(_) => Ok(Some(request.output.clone())),
            Err(e) => {
                error!(
                    "Failed to generate thumbnail for {}: {}",
                    request.input.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn detect_scene_change(
        &self,
        input: &SceneInput,
        threshold: f64,
    ) -> Result<Option<f64>, FfmpegError> {
        let graph = input.filter_graph(threshold);
        let output = FfmpegCommand::new(&self.ffprobe)
            .args(&[
                "-show_frames",
                "-v",
                "quiet",
                "-read_intervals",
                "%+#3",
                "-print_format",
                "json",
                "-f",
                "lavfi",
                &graph,
            ])
            .execute()?;
        parse_scene_output(&output.stdout)
    }
}
