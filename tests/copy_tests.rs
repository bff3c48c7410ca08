//! Integration tests for the copy engine

mod common;

use std::fs;
use std::io;
use std::path::Path;

use common::{classifier, read_frame, write_sequence};
use media_asset::{AssetError, AssetKind, CopyOptions, FastCopy, FrameAction};
use tempfile::TempDir;

/// Fast copy that always fails, forcing the portable fallback.
struct FailingCopy;

impl FastCopy for FailingCopy {
    fn copy(&self, _src: &Path, _dst: &Path) -> io::Result<()> {
        Err(io::Error::other("cp exited with exit status: 1"))
    }
}

#[test]
fn test_sequence_copy_round_trip() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write_sequence(&src, "abc0010_plate_v001", "dpx", 1..=10);
    let asset = classifier().classify(&src).unwrap();

    let template = tmp.path().join("dst/abc0010_plate_v002.%04d.dpx");
    let options = CopyOptions {
        start_offset: 2,
        ..Default::default()
    };
    let report = asset.copy_to(&template, &options).unwrap();
    assert_eq!(report.copied(), 8);
    assert_eq!(report.skipped(), 0);

    let copied = report.into_asset().unwrap();
    assert_eq!(copied.kind(), AssetKind::ImageSequence);
    assert_eq!(copied.frame_count().unwrap(), asset.frame_count().unwrap() - 2);
    assert_eq!(copied.path(), template);
    assert_eq!(copied.version(), Some(2));
}

#[test]
fn test_offset_and_renumber() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "exr", 1001..=1010);
    let asset = classifier().classify(&src).unwrap();

    let options = CopyOptions {
        start_offset: 1,
        new_start_frame: Some(1001),
        ..Default::default()
    };
    let report = asset
        .copy_to(dst.join("plate.%04d.exr"), &options)
        .unwrap();

    let copied = report.asset.as_ref().unwrap();
    assert_eq!(copied.start(), 1001);
    assert_eq!(copied.end().unwrap(), 1009);
    for (i, frame) in (1001..=1009).enumerate() {
        assert_eq!(
            read_frame(&dst, "plate", "exr", frame),
            format!("plate frame {}", 1002 + i as u32)
        );
        assert_eq!(report.frames[i].source_frame, 1002 + i as u32);
        assert_eq!(report.frames[i].destination_frame, frame);
    }
    assert!(!dst.join("plate.1010.exr").exists());
}

#[test]
fn test_default_start_frame_is_source_start() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "dpx", 101..=104);
    let asset = classifier().classify(&src).unwrap();

    let report = asset
        .copy_to(dst.join("plate.%d.dpx"), &CopyOptions::default())
        .unwrap();
    assert_eq!(report.copied(), 4);
    for frame in 101..=104 {
        assert!(dst.join(format!("plate.{}.dpx", frame)).exists());
    }
}

#[test]
fn test_second_copy_skips_everything() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let template = tmp.path().join("dst/plate.%04d.dpx");
    write_sequence(&src, "plate", "dpx", 1..=5);
    let asset = classifier().classify(&src).unwrap();

    let first = asset.copy_to(&template, &CopyOptions::default()).unwrap();
    assert_eq!(first.copied(), 5);

    let second = asset.copy_to(&template, &CopyOptions::default()).unwrap();
    assert_eq!(second.copied(), 0);
    assert_eq!(second.skipped(), 5);
    assert!(second.frames.iter().all(|f| f.action == FrameAction::Skip));
    assert_eq!(second.asset.unwrap().frame_count().unwrap(), 5);
}

#[test]
fn test_interrupted_copy_resumes() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "dpx", 1..=6);
    let asset = classifier().classify(&src).unwrap();

    asset
        .copy_to(dst.join("plate.%04d.dpx"), &CopyOptions::default())
        .unwrap();
    fs::remove_file(dst.join("plate.0005.dpx")).unwrap();
    fs::remove_file(dst.join("plate.0006.dpx")).unwrap();

    let report = asset
        .copy_to(dst.join("plate.%04d.dpx"), &CopyOptions::default())
        .unwrap();
    assert_eq!(report.skipped(), 4);
    assert_eq!(report.copied(), 2);
    assert_eq!(read_frame(&dst, "plate", "dpx", 6), "plate frame 6");
}

#[test]
fn test_overwrite_replaces_existing_frames() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "dpx", 1..=3);
    fs::create_dir_all(&dst).unwrap();
    fs::write(dst.join("plate.0002.dpx"), "stale").unwrap();
    let asset = classifier().classify(&src).unwrap();

    let options = CopyOptions {
        overwrite: true,
        ..Default::default()
    };
    let report = asset.copy_to(dst.join("plate.%04d.dpx"), &options).unwrap();
    assert_eq!(report.copied(), 3);
    assert_eq!(read_frame(&dst, "plate", "dpx", 2), "plate frame 2");
}

#[test]
fn test_dry_run_touches_nothing() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "dpx", 1..=7);
    let asset = classifier().classify(&src).unwrap();

    let options = CopyOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = asset.copy_to(dst.join("plate.%04d.dpx"), &options).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.planned(), asset.frame_count().unwrap() as usize);
    assert_eq!(report.copied(), 0);
    assert!(report.asset.is_none());
    assert!(!dst.exists());
}

#[test]
fn test_fallback_copy_warns_once() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "dpx", 1..=4);
    let asset = classifier().classify(&src).unwrap();

    let report = asset
        .as_sequence()
        .unwrap()
        .copy_with(dst.join("plate.%04d.dpx"), &CopyOptions::default(), &FailingCopy)
        .unwrap();
    assert_eq!(report.copied(), 4);
    assert_eq!(
        report.warnings,
        vec![
            "Unable to execute fast system copy. cp exited with exit status: 1. Default copy was used."
                .to_string()
        ]
    );
    assert_eq!(read_frame(&dst, "plate", "dpx", 3), "plate frame 3");
}

#[test]
fn test_offset_past_the_end() {
    let tmp = TempDir::new().unwrap();
    write_sequence(tmp.path(), "plate", "dpx", 1..=3);
    let asset = classifier().classify(tmp.path()).unwrap();

    let options = CopyOptions {
        start_offset: 3,
        ..Default::default()
    };
    let err = asset
        .copy_to(tmp.path().join("out/plate.%04d.dpx"), &options)
        .unwrap_err();
    assert!(matches!(
        err,
        AssetError::InvalidOffset {
            offset: 3,
            frame_count: 3
        }
    ));
}

#[test]
fn test_destination_needs_a_frame_token() {
    let tmp = TempDir::new().unwrap();
    write_sequence(tmp.path(), "plate", "dpx", 1..=3);
    let asset = classifier().classify(tmp.path()).unwrap();

    let err = asset
        .copy_to(tmp.path().join("out/plate.dpx"), &CopyOptions::default())
        .unwrap_err();
    assert!(matches!(err, AssetError::InvalidTemplate { .. }));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_single_file_copy() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("abc0010_edit_v002.mov");
    fs::write(&src, b"movie").unwrap();
    let asset = classifier().classify(&src).unwrap();

    let dst = tmp.path().join("publish/abc0010_edit_v002.mov");
    let report = asset.copy_to(&dst, &CopyOptions::default()).unwrap();
    assert_eq!(report.copied(), 1);
    assert_eq!(fs::read(&dst).unwrap(), b"movie");
    let copied = report.into_asset().unwrap();
    assert_eq!(copied.kind(), AssetKind::VideoFile);
    assert_eq!(copied.path(), dst);

    fs::write(&src, b"changed").unwrap();
    let again = asset.copy_to(&dst, &CopyOptions::default()).unwrap();
    assert_eq!(again.skipped(), 1);
    assert_eq!(fs::read(&dst).unwrap(), b"movie");
}

#[test]
fn test_single_file_dry_run() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("notes.txt");
    fs::write(&src, b"notes").unwrap();
    let asset = classifier().classify(&src).unwrap();

    let dst = tmp.path().join("publish/notes.txt");
    let options = CopyOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = asset.copy_to(&dst, &options).unwrap();
    assert_eq!(report.planned(), 1);
    assert_eq!(report.copied(), 0);
    assert!(report.asset.is_none());
    assert!(!tmp.path().join("publish").exists());
}

#[test]
fn test_copy_onto_itself_is_rejected() {
    let tmp = TempDir::new().unwrap();
    write_sequence(tmp.path(), "plate", "dpx", 1..=3);
    let asset = classifier().classify(tmp.path()).unwrap();

    let options = CopyOptions {
        overwrite: true,
        ..Default::default()
    };
    let err = asset.copy_to(asset.path(), &options).unwrap_err();
    assert!(matches!(err, AssetError::InvalidTemplate { .. }));

    // the same folder spelled differently
    let roundabout = tmp
        .path()
        .join("..")
        .join(tmp.path().file_name().unwrap())
        .join("plate.%04d.dpx");
    let err = asset.copy_to(&roundabout, &options).unwrap_err();
    assert!(matches!(err, AssetError::InvalidTemplate { .. }));

    for frame in 1..=3 {
        assert_eq!(
            read_frame(tmp.path(), "plate", "dpx", frame),
            format!("plate frame {}", frame)
        );
    }
}

#[test]
fn test_renumber_overlapping_the_source_is_rejected() {
    let tmp = TempDir::new().unwrap();
    write_sequence(tmp.path(), "plate", "dpx", 1..=3);
    let asset = classifier().classify(tmp.path()).unwrap();

    let options = CopyOptions {
        new_start_frame: Some(2),
        overwrite: true,
        ..Default::default()
    };
    let err = asset.copy_to(asset.path(), &options).unwrap_err();
    assert!(matches!(err, AssetError::InvalidTemplate { .. }));
    assert_eq!(read_frame(tmp.path(), "plate", "dpx", 2), "plate frame 2");
    assert!(!tmp.path().join("plate.0004.dpx").exists());
}

#[cfg(unix)]
#[test]
fn test_linked_destination_frame_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    write_sequence(&src, "plate", "dpx", 1..=3);
    fs::create_dir_all(&dst).unwrap();
    std::os::unix::fs::symlink(src.join("plate.0002.dpx"), dst.join("plate.0002.dpx")).unwrap();
    let asset = classifier().classify(&src).unwrap();

    let options = CopyOptions {
        overwrite: true,
        ..Default::default()
    };
    let report = asset
        .as_sequence()
        .unwrap()
        .copy_with(dst.join("plate.%04d.dpx"), &options, &FailingCopy)
        .unwrap();
    assert_eq!(report.copied(), 2);
    assert_eq!(report.frames[1].action, FrameAction::Skip);
    assert_eq!(read_frame(&src, "plate", "dpx", 2), "plate frame 2");
}
