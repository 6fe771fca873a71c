//! Wheel filename parsing (PEP 427)
//!
//! A wheel filename encodes the full identity of a built artifact:
//!
//! ```text
//! {distribution}-{version}[-{build_tag}]-{python_tag}-{abi_tag}-{platform_tag}.whl
//! ```
//!
//! Parsing is pure and lossless: rejoining the parsed fields reproduces
//! the input byte-for-byte, so a parsed filename can always be rendered
//! back into a listing entry or cache key without drift.

use std::fmt;

use crate::error::{ParseError, Result};
use crate::name::{names_equal, normalize_name};

/// Structured identity extracted from a wheel filename.
///
/// Fields hold the raw (non-normalized) segments exactly as they appear
/// in the filename; use [`WheelFilename::normalized_distribution`] for
/// registry-comparable names. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    /// Distribution segment as written (underscored, e.g. `typing_extensions`).
    pub distribution: String,
    /// Version segment (PEP 440 version string).
    pub version: String,
    /// Optional build tag; always starts with a digit when present.
    pub build_tag: Option<String>,
    /// Python implementation tag (e.g. `py3`, `cp311`).
    pub python_tag: String,
    /// ABI tag (e.g. `none`, `cp311`).
    pub abi_tag: String,
    /// Platform tag (e.g. `any`, `manylinux_2_17_x86_64`).
    pub platform_tag: String,
    /// The original filename, verbatim.
    pub raw: String,
}

const WHEEL_EXT: &str = ".whl";

impl WheelFilename {
    /// Parse a wheel filename into its structured identity.
    ///
    /// Fails when the extension is wrong, the segment count is off, any
    /// segment is empty, or a six-segment filename carries a build tag
    /// that does not start with a digit.
    pub fn parse(filename: &str) -> Result<Self> {
        let stem = filename
            .strip_suffix(WHEEL_EXT)
            .ok_or_else(|| ParseError::WrongExtension {
                filename: filename.to_string(),
            })?;

        let segments: Vec<&str> = stem.split('-').collect();
        if segments.len() != 5 && segments.len() != 6 {
            return Err(ParseError::WrongSegmentCount {
                filename: filename.to_string(),
                segments: segments.len(),
            });
        }

        let segment_names: &[&'static str] = if segments.len() == 6 {
            &["distribution", "version", "build tag", "python tag", "abi tag", "platform tag"]
        } else {
            &["distribution", "version", "python tag", "abi tag", "platform tag"]
        };
        for (seg, name) in segments.iter().zip(segment_names) {
            if seg.is_empty() {
                return Err(ParseError::EmptySegment {
                    filename: filename.to_string(),
                    segment: name,
                });
            }
        }

        let build_tag = if segments.len() == 6 {
            // PEP 427: the build tag is distinguished from the python tag
            // by its leading digit.
            let tag = segments[2];
            if !tag.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(ParseError::InvalidBuildTag {
                    filename: filename.to_string(),
                    build_tag: tag.to_string(),
                });
            }
            Some(tag.to_string())
        } else {
            None
        };

        let tail = segments.len() - 3;
        Ok(Self {
            distribution: segments[0].to_string(),
            version: segments[1].to_string(),
            build_tag,
            python_tag: segments[tail].to_string(),
            abi_tag: segments[tail + 1].to_string(),
            platform_tag: segments[tail + 2].to_string(),
            raw: filename.to_string(),
        })
    }

    /// Distribution name in PEP 503 normalized form.
    pub fn normalized_distribution(&self) -> String {
        normalize_name(&self.distribution)
    }

    /// The ordered compatibility tag triple.
    pub fn compatibility_tags(&self) -> [&str; 3] {
        [&self.python_tag, &self.abi_tag, &self.platform_tag]
    }

    /// Whether this wheel belongs to the given distribution, under
    /// name normalization.
    pub fn is_for(&self, distribution: &str) -> bool {
        names_equal(&self.distribution, distribution)
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.distribution, self.version)?;
        if let Some(build) = &self.build_tag {
            write!(f, "-{build}")?;
        }
        write!(
            f,
            "-{}-{}-{}{}",
            self.python_tag, self.abi_tag, self.platform_tag, WHEEL_EXT
        )
    }
}
