//! Core error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Not a wheel filename: {filename} (expected .whl extension)")]
    WrongExtension { filename: String },

    #[error("Malformed wheel filename: {filename} (expected 5 or 6 dash-separated segments, got {segments})")]
    WrongSegmentCount { filename: String, segments: usize },

    #[error("Malformed wheel filename: {filename} (empty {segment} segment)")]
    EmptySegment {
        filename: String,
        segment: &'static str,
    },

    #[error("Malformed wheel filename: {filename} (build tag '{build_tag}' must start with a digit)")]
    InvalidBuildTag { filename: String, build_tag: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;
