//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use media_asset::{
    AssetConfig, Classifier, FfmpegError, MediaBackend, SceneInput, StreamInfo, ThumbnailRequest,
};

/// Backend returning canned answers and recording every call.
#[derive(Default)]
pub struct FakeBackend {
    pub stream: StreamInfo,
    pub scene_change: Option<f64>,
    pub probes: Mutex<Vec<PathBuf>>,
    pub scenes: Mutex<Vec<SceneInput>>,
    pub thumbnails: Mutex<Vec<ThumbnailRequest>>,
}

impl FakeBackend {
    pub fn with_stream(width: u32, height: u32, nb_frames: Option<u32>) -> Self {
        Self {
            stream: StreamInfo {
                width: Some(width),
                height: Some(height),
                nb_frames,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_scene_change(scene_change: Option<f64>) -> Self {
        Self {
            scene_change,
            ..Default::default()
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }
}

impl MediaBackend for FakeBackend {
    fn probe(&self, path: &Path) -> Result<StreamInfo, FfmpegError> {
        self.probes.lock().unwrap().push(path.to_path_buf());
        Ok(self.stream.clone())
    }

    fn render_thumbnail(&self, request: &ThumbnailRequest) -> Result<Option<PathBuf>, FfmpegError> {
        self.thumbnails.lock().unwrap().push(request.clone());
        fs::write(&request.output, b"thumbnail")?;
        Ok(Some(request.output.clone()))
    }

    fn detect_scene_change(
        &self,
        input: &SceneInput,
        _threshold: f64,
    ) -> Result<Option<f64>, FfmpegError> {
        self.scenes.lock().unwrap().push(input.clone());
        Ok(self.scene_change)
    }
}

pub fn classifier_with(backend: Arc<FakeBackend>) -> Classifier {
    let config = AssetConfig::builtin().unwrap();
    Classifier::with_backend(Arc::new(config), backend)
}

pub fn classifier() -> Classifier {
    classifier_with(Arc::new(FakeBackend::default()))
}

/// Write `<prefix>.<frame:04>.<ext>` files whose content names the frame.
pub fn write_sequence(dir: &Path, prefix: &str, ext: &str, frames: impl IntoIterator<Item = u32>) {
    fs::create_dir_all(dir).unwrap();
    for frame in frames {
        fs::write(
            dir.join(format!("{}.{:04}.{}", prefix, frame, ext)),
            format!("{} frame {}", prefix, frame),
        )
        .unwrap();
    }
}

pub fn read_frame(dir: &Path, prefix: &str, ext: &str, frame: u32) -> String {
    fs::read_to_string(dir.join(format!("{}.{:04}.{}", prefix, frame, ext))).unwrap()
}
