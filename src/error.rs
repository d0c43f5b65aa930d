//! Error types for gauge rendering.
//!
//! Rendering itself never fails: these errors surface from the fallible
//! helpers (asset loading, catalog parsing, PNG export) and are logged when a
//! render degrades a visual layer instead of aborting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GaugeError>;

/// Top-level error for the crate.
#[derive(Error, Debug)]
pub enum GaugeError {
    /// A panel, needle or hub asset could not be loaded.
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// The label font could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// The range/color tables do not line up.
    #[error("Range error: {0}")]
    Range(#[from] RangeError),

    /// A face could not be resolved from the catalog.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A caller supplied an argument outside its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON parse error for face catalogs.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Asset load failures.
///
/// Kept `Clone` so that the cache can hand the same failed load to every
/// render that asks for the asset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("cannot read asset {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("cannot decode asset {path:?}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("unsupported asset type {path:?}")]
    Unsupported { path: PathBuf },
}

/// Malformed range tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    /// A segment needs a color index that the color table does not have.
    #[error("range segment needs color #{index} but only {available} colors were given")]
    MissingColor { index: usize, available: usize },
}
