//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use ndarray::{ArrayBase, Data, Ix3};

use crate::error::{Error, Result};

use super::{convert_float_to_int, RGBA_CHANNELS, RGB_CHANNELS};

/// Save a single `(channel, height, width)` image as an 8-bit file.
///
/// The image is:
/// 1. Quantized from [0, 1] to [0, 255] with [`convert_float_to_int`]
/// 2. Moved to channel-last layout
/// 3. Saved to the specified path (format inferred from extension)
///
/// One channel is written as grayscale, three as RGB and four as RGBA.
///
/// # Errors
///
/// Returns an error if a value exceeds 1, the channel count has no 8-bit
/// image type, or the image cannot be saved.
pub fn save_image<S, P>(image: &ArrayBase<S, Ix3>, path: P) -> Result<()>
where
    S: Data<Elem = f32>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let (channels, height, width) = image.dim();

    let quantized = convert_float_to_int::<u8, _, _, _>(image)?;
    let samples: Vec<u8> = quantized.permuted_axes([1, 2, 0]).iter().copied().collect();

    let img = to_dynamic_image(samples, channels, height, width)?;

    img.save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Saved {width}x{height} image with {channels} channels to {}",
        path.display()
    );
    Ok(())
}

/// Wrap channel-last samples in the matching `DynamicImage` variant.
#[allow(clippy::cast_possible_truncation)]
fn to_dynamic_image(
    samples: Vec<u8>,
    channels: usize,
    height: usize,
    width: usize,
) -> Result<DynamicImage> {
    let (w, h) = (width as u32, height as u32);
    let img = match channels {
        1 => GrayImage::from_raw(w, h, samples).map(DynamicImage::ImageLuma8),
        RGB_CHANNELS => RgbImage::from_raw(w, h, samples).map(DynamicImage::ImageRgb8),
        RGBA_CHANNELS => RgbaImage::from_raw(w, h, samples).map(DynamicImage::ImageRgba8),
        _ => {
            return Err(Error::UnsupportedChannels {
                channels,
                context: "saving an 8-bit image".to_string(),
            })
        }
    };

    img.ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{width}x{height}x{channels} samples"),
        actual: "buffer too small".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Axis};
    use tempfile::tempdir;

    #[test]
    fn test_gray_round_trip_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let image =
            Array3::<f32>::from_shape_fn((1, 2, 3), |(_, y, x)| if x == y { 1.0 } else { 0.0 });

        save_image(&image, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(1, 1)[0], 255);
        assert_eq!(loaded.get_pixel(2, 1)[0], 0);
    }

    #[test]
    fn test_rgb_channel_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blue.png");
        let mut image = Array3::<f32>::zeros((3, 2, 2));
        image.index_axis_mut(Axis(0), 2).fill(1.0);

        save_image(&image, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.get_pixel(0, 1).0, [0, 0, 255]);
    }

    #[test]
    fn test_unsupported_channels() {
        let dir = tempdir().unwrap();
        let image = Array3::<f32>::zeros((2, 2, 2));

        let err = save_image(&image, dir.path().join("two.png")).unwrap_err();

        assert!(matches!(err, Error::UnsupportedChannels { channels: 2, .. }));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let dir = tempdir().unwrap();
        let image = Array3::<f32>::from_elem((1, 2, 2), 1.5);

        let err = save_image(&image, dir.path().join("bright.png")).unwrap_err();

        assert!(matches!(err, Error::OutOfRange { .. }));
    }
}
