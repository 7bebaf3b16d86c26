//! # perceptkit
//!
//! Image loading, synthetic stimuli and statistical moments for visual
//! perception models.
//!
//! Models and synthesis methods expect their inputs to be 4d `f32` batches,
//! `(batch, channel, height, width)`, with values in [0, 1]. This crate gets
//! images from disk into that layout, generates a standard battery of test
//! stimuli in the same layout, and computes the central moments used to
//! describe them.
//!
//! ## Example
//!
//! ```no_run
//! use perceptkit::image::{load_images, ColorMode};
//! use perceptkit::stats::{kurtosis, Reduction};
//! use perceptkit::synthetic::{make_synthetic_stimuli, StimulusConfig};
//!
//! # fn main() -> perceptkit::Result<()> {
//! let images = load_images("images/", ColorMode::Gray)?;
//! let per_image = kurtosis(&images, None, None, &Reduction::over([1, 2, 3]))?;
//!
//! let stimuli = make_synthetic_stimuli(&StimulusConfig::with_size(64))?;
//! assert_eq!(stimuli.stimuli.shape(), &[11, 1, 64, 64]);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod stats;
pub mod synthetic;

pub use crate::error::{Error, Result};
pub use crate::image::{load_images, ColorMode, ImageBatch};
pub use crate::synthetic::{make_synthetic_stimuli, StimulusConfig};
