//! Image loading, conversion, and saving utilities.

mod convert;
mod load;
mod save;

use std::path::{Path, PathBuf};

pub use convert::{convert_float_to_int, UnsignedSample};
pub use load::{load_images, load_reference_images, ImageSource};
pub use save::save_image;

use ndarray::Array4;
use once_cell::sync::Lazy;

/// Image batch in NCHW format (batch, channels, height, width).
/// Values are normalized to the [0, 1] range.
pub type ImageBatch = Array4<f32>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Number of channels in RGBA images.
pub const RGBA_CHANNELS: usize = 4;

/// Environment variable overriding the bundled reference image directory.
pub const DATA_DIR_ENV: &str = "PERCEPTKIT_DATA_DIR";

static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var_os(DATA_DIR_ENV).map_or_else(
        || Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("256"),
        PathBuf::from,
    )
});

/// Directory holding the bundled reference images.
///
/// Resolved once per process from `PERCEPTKIT_DATA_DIR`, falling back to
/// `data/256` under the crate root.
#[must_use]
pub fn data_dir() -> &'static Path {
    DATA_DIR.as_path()
}

/// How loaded images are mapped onto the channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Luminance-weighted conversion to a single channel.
    #[default]
    Gray,
    /// Keep source channels; grayscale sources are replicated to RGB.
    Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_resolved_once() {
        assert!(std::ptr::eq(data_dir(), data_dir()));
    }

    #[test]
    fn test_reference_images() {
        if std::env::var_os(DATA_DIR_ENV).is_some() {
            return;
        }

        let gray = load_reference_images(ColorMode::Gray).unwrap();
        assert_eq!(gray.shape(), &[3, 1, 256, 256]);
        assert!(gray.iter().all(|&v| (0.0..=1.0).contains(&v)));

        let color = load_reference_images(ColorMode::Color).unwrap();
        assert_eq!(color.shape(), &[3, RGB_CHANNELS, 256, 256]);
    }
}
