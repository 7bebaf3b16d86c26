//! Custom error types for perceptkit.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the perceptkit library.
#[derive(Error, Debug)]
pub enum Error {
    /// A single path that is neither an existing file nor a directory.
    #[error(
        "paths must be a single file, a list of files or a single directory, \
         unsure what to do with {}",
        path.display()
    )]
    InvalidPath { path: PathBuf },

    /// Every candidate file was skipped, or no paths were given.
    #[error("no images could be loaded")]
    NoImages,

    /// Image has a channel count the requested conversion cannot handle.
    #[error("unsupported channel count {channels} for {context}")]
    UnsupportedChannels { channels: usize, context: String },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Float image with values above 1.
    #[error("all values must lie between 0 and 1, but max is {max}")]
    OutOfRange { max: f64 },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Dimensionality that the loader logic cannot produce.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

/// Result type alias for perceptkit operations.
pub type Result<T> = std::result::Result<T, Error>;
