//! Frame indexing: printf-style frame templates and frame number sets
//!
//! A template such as `/shots/plate/lpk_plate_v001.%04d.dpx` maps frame
//! `1001` to `/shots/plate/lpk_plate_v001.1001.dpx`. The inverse direction
//! scans the template's directory for the frames that physically exist.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AssetError, Result};

/// Sorted set of frame numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSet(BTreeSet<u32>);

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: u32) -> bool {
        self.0.insert(frame)
    }

    pub fn contains(&self, frame: u32) -> bool {
        self.0.contains(&frame)
    }

    pub fn start(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn end(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Maximal runs of consecutive frames, in ascending order.
    pub fn ranges(&self) -> Vec<RangeInclusive<u32>> {
        let mut ranges: Vec<RangeInclusive<u32>> = Vec::new();
        for frame in self.iter() {
            match ranges.last_mut() {
                Some(run) if run.end().checked_add(1) == Some(frame) => {
                    *run = *run.start()..=frame;
                }
                _ => ranges.push(frame..=frame),
            }
        }
        ranges
    }

    /// True for a non-empty set with no gaps.
    pub fn is_contiguous(&self) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => (end - start) as usize + 1 == self.len(),
            _ => false,
        }
    }
}

impl FromIterator<u32> for FrameSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FrameSet {
    /// `1-3,5-10`; single-frame runs print as the bare number.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, run) in self.ranges().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if run.start() == run.end() {
                write!(f, "{}", run.start())?;
            } else {
                write!(f, "{}-{}", run.start(), run.end())?;
            }
        }
        Ok(())
    }
}

/// A `%d` / `%04d` token located inside a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    start: usize,
    end: usize,
    width: usize,
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([0-9]*)d").expect("valid regex"));

fn find_placeholders(text: &str) -> Vec<Placeholder> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| {
            let token = caps.get(0)?;
            let width = caps.get(1)?.as_str().parse().unwrap_or(0);
            Some(Placeholder {
                start: token.start(),
                end: token.end(),
                width,
            })
        })
        .collect()
}

/// True if `name` contains a printf-style frame token.
pub fn contains_placeholder(name: &str) -> bool {
    !find_placeholders(name).is_empty()
}

/// A file name split around its frame number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameName<'a> {
    pub prefix: &'a str,
    pub digits: &'a str,
    pub suffix: &'a str,
}

impl FrameName<'_> {
    pub fn frame(&self) -> Option<u32> {
        self.digits.parse().ok()
    }
}

/// Split `lpk_plate_v001.0001.dpx` into `lpk_plate_v001.`, `0001` and `.dpx`.
///
/// The frame number is the trailing digit run of the stem; the suffix is the
/// last extension unless that extension is itself all digits.
pub fn split_frame_name(file_name: &str) -> Option<FrameName<'_>> {
    let (stem, suffix) = match file_name.rfind('.') {
        Some(dot)
            if dot > 0 && !file_name[dot + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            file_name.split_at(dot)
        }
        _ => (file_name, ""),
    };
    let digits_len = stem.bytes().rev().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let (prefix, digits) = stem.split_at(stem.len() - digits_len);
    Some(FrameName {
        prefix,
        digits,
        suffix,
    })
}

/// Directory + file name pattern with one zero-padded frame slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameTemplate {
    dir: PathBuf,
    prefix: String,
    width: usize,
    suffix: String,
}

impl FrameTemplate {
    pub fn from_parts(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        width: usize,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            width,
            suffix: suffix.into(),
        }
    }

    /// Parse a path whose file name holds exactly one `%d`/`%0Nd` token.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: &str| AssetError::InvalidTemplate {
            template: path.display().to_string(),
            reason: reason.to_string(),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("file name is missing or not valid UTF-8"))?;

        let placeholders = find_placeholders(name);
        let token = match placeholders.as_slice() {
            [token] => *token,
            [] => return Err(invalid("no frame placeholder")),
            _ => return Err(invalid("more than one frame placeholder")),
        };

        Ok(Self {
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            prefix: name[..token.start].to_string(),
            width: token.width,
            suffix: name[token.end..].to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn file_name(&self) -> String {
        if self.width > 1 {
            format!("{}%0{}d{}", self.prefix, self.width, self.suffix)
        } else {
            format!("{}%d{}", self.prefix, self.suffix)
        }
    }

    /// The template itself, placeholder included.
    pub fn path(&self) -> PathBuf {
        self.dir.join(self.file_name())
    }

    pub fn frame_file_name(&self, frame: u32) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            frame,
            self.suffix,
            width = self.width
        )
    }

    pub fn frame_path(&self, frame: u32) -> PathBuf {
        self.dir.join(self.frame_file_name(frame))
    }

    /// Frame number of `file_name` if it is a member of this template.
    pub fn match_file_name(&self, file_name: &str) -> Option<u32> {
        let digits = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let frame: u32 = digits.parse().ok()?;
        // 00001 is not a member of a %04d template
        (format!("{:0width$}", frame, width = self.width) == digits).then_some(frame)
    }

    /// Frames of this template present on disk. No gap validation.
    pub fn existing_frames(&self) -> std::io::Result<FrameSet> {
        let dir = if self.dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.dir.as_path()
        };
        let mut frames = FrameSet::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(frame) = name.to_str().and_then(|n| self.match_file_name(n)) {
                frames.insert(frame);
            }
        }
        Ok(frames)
    }
}

impl fmt::Display for FrameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}
