//! Sequence discovery: group the numbered files of one directory into
//! candidate sequences.
//!
//! Files are grouped by the text around their frame number (`prefix`,
//! `suffix`). Every group is a candidate, gapped or not; contiguity and the
//! one-sequence-per-folder rule are enforced by [`crate::ImageSequence`].

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::frame::{split_frame_name, FrameSet, FrameTemplate};

/// One group of numbered files sharing prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCandidate {
    pub template: FrameTemplate,
    pub frames: FrameSet,
}

impl SequenceCandidate {
    /// Prefix with trailing `.`/`_` separators removed.
    pub fn base_name(&self) -> &str {
        self.template.prefix().trim_end_matches(['.', '_'])
    }

    pub fn extension(&self) -> &str {
        self.template.suffix().trim_start_matches('.')
    }
}

/// A numbered file and the width of its digit run.
struct Member {
    name: String,
    frame: u32,
    digits: usize,
}

/// Scan `dir` (non-recursively) for numbered files.
///
/// Symlinked frames are followed. Subdirectories, hidden files and files
/// without a trailing frame number are ignored. The pad width of a group is
/// its shortest digit run, so both `0999`/`1000` and `999`/`1000` resolve to
/// a single template. Files the
/// chosen template can not address (`plate.0002.dpx` next to
/// `plate.001.dpx`) form a separate candidate of their own width.
pub fn discover_sequences(dir: impl AsRef<Path>) -> Result<Vec<SequenceCandidate>> {
    let dir = dir.as_ref();
    let mut groups: BTreeMap<(String, String), Vec<Member>> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!("Skipping non UTF-8 file name {:?}", file_name);
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let Some(parts) = split_frame_name(name) else {
            debug!("Skipping {} (no frame number)", name);
            continue;
        };
        let Some(frame) = parts.frame() else {
            debug!("Skipping {} (frame number out of range)", name);
            continue;
        };

        groups
            .entry((parts.prefix.to_string(), parts.suffix.to_string()))
            .or_default()
            .push(Member {
                name: name.to_string(),
                frame,
                digits: parts.digits.len(),
            });
    }

    let mut candidates = Vec::new();
    for ((prefix, suffix), members) in groups {
        let width = members.iter().map(|m| m.digits).min().unwrap_or(0);
        let template = FrameTemplate::from_parts(dir, prefix.as_str(), width, suffix.as_str());

        let mut frames = FrameSet::new();
        let mut strays: BTreeMap<usize, FrameSet> = BTreeMap::new();
        for member in members {
            if template.match_file_name(&member.name).is_some() {
                frames.insert(member.frame);
            } else {
                debug!("{} does not fit {}", member.name, template);
                strays.entry(member.digits).or_default().insert(member.frame);
            }
        }

        candidates.push(SequenceCandidate { template, frames });
        // a stray's digit run is exactly its width, so it always fits
        for (width, frames) in strays {
            let template = FrameTemplate::from_parts(dir, prefix.as_str(), width, suffix.as_str());
            candidates.push(SequenceCandidate { template, frames });
        }
    }

    debug!(
        "Discovered {} sequence candidate(s) in {}",
        candidates.len(),
        dir.display()
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"frame").unwrap();
    }

    #[test]
    fn test_single_sequence() {
        let dir = tempfile::tempdir().unwrap();
        for frame in 1001..=1010 {
            touch(dir.path(), &format!("lpk_plate_v001.{:04}.dpx", frame));
        }
        let candidates = discover_sequences(dir.path()).unwrap();
        assert_eq!(candidates.len(), 1);

        let seq = &candidates[0];
        assert_eq!(seq.base_name(), "lpk_plate_v001");
        assert_eq!(seq.extension(), "dpx");
        assert_eq!(seq.frames.start(), Some(1001));
        assert_eq!(seq.frames.end(), Some(1010));
        assert!(seq.frames.is_contiguous());
        assert_eq!(
            seq.template.path(),
            dir.path().join("lpk_plate_v001.%04d.dpx")
        );
    }

    #[test]
    fn test_gapped_sequence_is_still_a_candidate() {
        let dir = tempfile::tempdir().unwrap();
        for frame in (1..=10).filter(|f| *f != 4) {
            touch(dir.path(), &format!("plate.{:04}.dpx", frame));
        }
        let candidates = discover_sequences(dir.path()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].frames.to_string(), "1-3,5-10");
    }

    #[test]
    fn test_groups_by_prefix_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        for frame in 1..=3 {
            touch(dir.path(), &format!("plate.{:04}.dpx", frame));
            touch(dir.path(), &format!("plate.{:04}.exr", frame));
            touch(dir.path(), &format!("matte.{:04}.dpx", frame));
        }
        let candidates = discover_sequences(dir.path()).unwrap();
        let names: Vec<String> = candidates.iter().map(|c| c.template.file_name()).collect();
        assert_eq!(
            names,
            vec!["matte.%04d.dpx", "plate.%04d.dpx", "plate.%04d.exr"]
        );
    }

    #[test]
    fn test_ignores_hidden_unnumbered_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        for frame in 1..=3 {
            touch(dir.path(), &format!("plate.{:04}.dpx", frame));
        }
        touch(dir.path(), ".DS_Store");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("plate.0004.dpx.d")).unwrap();
        fs::create_dir(dir.path().join("sub_0001")).unwrap();

        let candidates = discover_sequences(dir.path()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].frames.len(), 3);
    }

    #[test]
    fn test_unpadded_frames_crossing_digit_boundary() {
        let dir = tempfile::tempdir().unwrap();
        for frame in 998..=1001 {
            touch(dir.path(), &format!("render_{}.png", frame));
        }
        let candidates = discover_sequences(dir.path()).unwrap();
        assert_eq!(candidates.len(), 1);
        let seq = &candidates[0];
        assert_eq!(seq.template.width(), 3);
        assert!(seq.frames.is_contiguous());
        assert!(seq.template.frame_path(1000).exists());
        assert!(seq.template.frame_path(999).exists());
    }

    #[test]
    fn test_mixed_padding_splits_into_two_candidates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "plate.001.dpx");
        touch(dir.path(), "plate.0002.dpx");

        let candidates = discover_sequences(dir.path()).unwrap();
        let names: Vec<String> = candidates.iter().map(|c| c.template.file_name()).collect();
        assert_eq!(names, vec!["plate.%03d.dpx", "plate.%04d.dpx"]);
        for candidate in &candidates {
            for frame in candidate.frames.iter() {
                assert!(candidate.template.frame_path(frame).exists());
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinked_frames() {
        let dir = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        touch(dir.path(), "plate.0001.dpx");
        touch(store.path(), "plate.0002.dpx");
        std::os::unix::fs::symlink(
            store.path().join("plate.0002.dpx"),
            dir.path().join("plate.0002.dpx"),
        )
        .unwrap();

        let candidates = discover_sequences(dir.path()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].frames.to_string(), "1-2");
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_sequences(dir.path()).unwrap().is_empty());
    }
}
