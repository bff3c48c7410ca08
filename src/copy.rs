//! Copy engine
//!
//! Sequences are copied frame by frame: source frame `start + offset + i`
//! goes to destination frame `new_start + i`. Existing destination frames
//! are skipped unless `overwrite` is set, so an interrupted copy can be
//! resumed by running it again. Each frame is copied with the platform copy
//! command first and with [`std::fs::copy`] if that fails.

use std::collections::BTreeSet;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::asset::{Asset, AssetCore};
use crate::error::{AssetError, Result};
use crate::frame::FrameTemplate;
use crate::sequence::ImageSequence;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Leading source frames to drop (e.g. a slate)
    pub start_offset: u32,
    /// First destination frame; defaults to the source start frame
    pub new_start_frame: Option<u32>,
    pub overwrite: bool,
    /// Walk the plan without touching the filesystem
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAction {
    Copy,
    Skip,
}

/// One planned or executed frame copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameCopy {
    pub source_frame: u32,
    pub destination_frame: u32,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: FrameAction,
}

/// Outcome of a copy. `asset` is the re-classified destination and is
/// `None` for dry runs.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub frames: Vec<FrameCopy>,
    pub warnings: Vec<String>,
    pub dry_run: bool,
    pub asset: Option<Asset>,
}

impl CopyReport {
    pub fn planned(&self) -> usize {
        self.frames.len()
    }

    /// Frames actually written.
    pub fn copied(&self) -> usize {
        if self.dry_run {
            return 0;
        }
        self.count(FrameAction::Copy)
    }

    pub fn skipped(&self) -> usize {
        self.count(FrameAction::Skip)
    }

    fn count(&self, action: FrameAction) -> usize {
        self.frames.iter().filter(|f| f.action == action).count()
    }

    pub fn into_asset(self) -> Option<Asset> {
        self.asset
    }
}

/// Fast, platform specific file copy. Errors make the engine fall back to
/// a portable copy.
pub trait FastCopy {
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// `cp` on Unix-likes, `xcopy` on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCopy;

impl FastCopy for SystemCopy {
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<()> {
        let (program, mut cmd) = if cfg!(windows) {
            let mut cmd = Command::new("xcopy");
            // trailing `*` stops xcopy asking whether dst is a file or a directory
            cmd.arg(src).arg(format!("{}*", dst.display())).arg("/Y");
            ("xcopy", cmd)
        } else {
            let mut cmd = Command::new("cp");
            cmd.arg(src).arg(dst);
            ("cp", cmd)
        };

        let output = cmd.output()?;
        if !output.status.success() {
            debug!(
                "{} failed: {}",
                program,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(io::Error::other(format!(
                "{} exited with {}",
                program, output.status
            )));
        }
        Ok(())
    }
}

fn copy_frame(
    src: &Path,
    dst: &Path,
    fast_copy: &dyn FastCopy,
    warnings: &mut BTreeSet<String>,
) -> io::Result<()> {
    if let Err(e) = fast_copy.copy(src, dst) {
        warnings.insert(format!(
            "Unable to execute fast system copy. {}. Default copy was used.",
            e
        ));
        std::fs::copy(src, dst)?;
    }
    Ok(())
}

/// True when both paths resolve to the same file on disk.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Refuse plans whose destination frames are files of the source sequence.
fn check_overlap(
    sequence: &ImageSequence,
    target: &FrameTemplate,
    destination_frames: RangeInclusive<u32>,
) -> Result<()> {
    let target_dir = if target.dir().as_os_str().is_empty() {
        Path::new(".")
    } else {
        target.dir()
    };
    if !same_file(sequence.directory(), target_dir) {
        return Ok(());
    }
    for frame in destination_frames {
        let Some(source_frame) = sequence
            .template()
            .match_file_name(&target.frame_file_name(frame))
        else {
            continue;
        };
        if sequence.frames().contains(source_frame) {
            return Err(AssetError::InvalidTemplate {
                template: target.to_string(),
                reason: format!(
                    "destination frame {} is source frame {} of {}",
                    frame,
                    source_frame,
                    sequence.path().display()
                ),
            });
        }
    }
    Ok(())
}

pub(crate) fn copy_sequence(
    sequence: &ImageSequence,
    destination: &Path,
    options: &CopyOptions,
    fast_copy: &dyn FastCopy,
) -> Result<CopyReport> {
    let target = FrameTemplate::parse(destination)?;
    let frame_count = sequence.count();
    if options.start_offset >= frame_count {
        return Err(AssetError::InvalidOffset {
            offset: options.start_offset,
            frame_count,
        });
    }

    let dst_frame_count = frame_count - options.start_offset;
    let first_source = sequence.start() + options.start_offset;
    let new_start_frame = options.new_start_frame.unwrap_or(sequence.start());
    let Some(last_frame) = new_start_frame.checked_add(dst_frame_count - 1) else {
        return Err(AssetError::InvalidTemplate {
            template: target.to_string(),
            reason: format!("frame numbers overflow from {}", new_start_frame),
        });
    };
    check_overlap(sequence, &target, new_start_frame..=last_frame)?;

    if options.dry_run {
        info!("Dry run mode is active!");
    } else {
        let parent = target.dir();
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!("Copy {} to {}", sequence.path().display(), target);
    info!("Starting copy for {} frames total", dst_frame_count);

    let mut report = CopyReport {
        dry_run: options.dry_run,
        ..Default::default()
    };
    let mut warnings = BTreeSet::new();

    for i in 0..dst_frame_count {
        let source_frame = first_source + i;
        let destination_frame = new_start_frame + i;
        let source = sequence.frame_path(source_frame);
        let destination = target.frame_path(destination_frame);

        let action = if destination.exists() && !options.overwrite {
            info!("Frame {} already exists", destination_frame);
            FrameAction::Skip
        } else if destination.exists() && same_file(&source, &destination) {
            warn!(
                "{} and {} are the same file",
                source.display(),
                destination.display()
            );
            FrameAction::Skip
        } else if options.dry_run {
            info!("Copy {} to {}", source.display(), destination.display());
            FrameAction::Copy
        } else {
            copy_frame(&source, &destination, fast_copy, &mut warnings)?;
            debug!("Frame {} copied to {}", source_frame, destination_frame);
            FrameAction::Copy
        };

        report.frames.push(FrameCopy {
            source_frame,
            destination_frame,
            source,
            destination,
            action,
        });
    }

    if !warnings.is_empty() {
        warn!("Some warnings were raised during copying:");
        for (i, w) in warnings.iter().enumerate() {
            warn!("\t{:02}: {}", i + 1, w);
        }
    }
    report.warnings = warnings.into_iter().collect();

    info!(
        "Copied {} frames, skipped {}",
        report.copied(),
        report.skipped()
    );

    if !options.dry_run {
        let classifier = sequence.core().classifier();
        report.asset = Some(classifier.classify(target.path())?);
    }
    Ok(report)
}

/// Plain copy of a non-sequence asset. An existing destination is kept and
/// returned as is.
pub(crate) fn copy_single(
    core: &AssetCore,
    destination: &Path,
    dry_run: bool,
) -> Result<CopyReport> {
    let mut report = CopyReport {
        dry_run,
        ..Default::default()
    };
    let mut frame = FrameCopy {
        source_frame: 1,
        destination_frame: 1,
        source: core.path().to_path_buf(),
        destination: destination.to_path_buf(),
        action: FrameAction::Copy,
    };

    if destination.exists() {
        warn!("Local file {} already exists", destination.display());
        frame.action = FrameAction::Skip;
    }

    if dry_run {
        info!("Dry run mode is active!");
        info!("Copy {} to {}", core.path().display(), destination.display());
        report.frames.push(frame);
        return Ok(report);
    }

    if frame.action == FrameAction::Copy {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Copy {} to {}", core.path().display(), destination.display());
        std::fs::copy(core.path(), destination)?;
    }
    report.frames.push(frame);
    report.asset = Some(core.classifier().classify(destination)?);
    Ok(report)
}
