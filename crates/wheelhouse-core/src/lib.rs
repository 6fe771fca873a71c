//! Wheelhouse Core - Foundational types for the wheelhouse package index
//!
//! This crate provides the pure, I/O-free pieces used throughout wheelhouse:
//! - `WheelFilename`: structured identity parsed from a wheel filename
//! - `normalize_name`: PEP 503 distribution name normalization
//! - `ParseError`: filename grammar violations

pub mod error;
pub mod name;
pub mod wheel;

pub use error::ParseError;
pub use name::{names_equal, normalize_name};
pub use wheel::WheelFilename;
