//! Image loading utilities.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use image::{DynamicImage, GenericImageView};
use ndarray::{stack, ArrayD, Axis, Ix4, IxDyn};

use crate::error::{Error, Result};

use super::{data_dir, ColorMode, ImageBatch, RGBA_CHANNELS, RGB_CHANNELS};

/// Luminance weights (ITU-R BT.709) for R, G and B.
const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Where to load images from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A single image file, or a directory whose entries are all tried.
    Path(PathBuf),
    /// An explicit list of image files.
    Paths(Vec<PathBuf>),
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for ImageSource {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Paths(paths)
    }
}

impl From<&[PathBuf]> for ImageSource {
    fn from(paths: &[PathBuf]) -> Self {
        Self::Paths(paths.to_vec())
    }
}

impl ImageSource {
    /// Expand into the list of candidate files.
    ///
    /// Directories are expanded non-recursively, in sorted order, without
    /// hidden entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if a single path is neither a file nor
    /// a directory.
    pub fn resolve(self) -> Result<Vec<PathBuf>> {
        match self {
            Self::Paths(paths) => Ok(paths),
            Self::Path(path) if path.is_file() => Ok(vec![path]),
            Self::Path(path) if path.is_dir() => directory_entries(&path),
            Self::Path(path) => Err(Error::InvalidPath { path }),
        }
    }
}

fn directory_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let entries = glob::glob_with(&pattern, options).map_err(|_| Error::InvalidPath {
        path: dir.to_path_buf(),
    })?;

    entries
        .map(|entry| entry.map_err(|err| Error::Io(err.into())))
        .collect()
}

/// Load images from disk into a normalized NCHW batch.
///
/// Each image is:
/// 1. Decoded from disk (undecodable files are skipped with a warning)
/// 2. Scaled to [0, 1] by the maximum of its sample type (float sources
///    must already lie in that range)
/// 3. Converted to grayscale, or to channel-first color, per `mode`
/// 4. Stacked along a new batch axis
///
/// # Errors
///
/// Returns an error if the source path is invalid, no image could be loaded,
/// the images do not share one shape, or a source has a channel count the
/// grayscale conversion cannot handle.
pub fn load_images<S: Into<ImageSource>>(source: S, mode: ColorMode) -> Result<ImageBatch> {
    let paths = source.into().resolve()?;

    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        let img = match decode(path) {
            Ok(img) => img,
            Err(err) => {
                tracing::warn!(
                    "Unable to load in file {}, it's probably not an image, skipping: {err}",
                    path.display()
                );
                continue;
            }
        };

        let (width, height) = img.dimensions();
        tracing::debug!(
            "Loaded {} ({width}x{height}, {:?})",
            path.display(),
            img.color()
        );

        let im = image_to_array(&img)?;
        images.push(apply_color_mode(im, mode, path)?);
    }

    if images.is_empty() {
        return Err(Error::NoImages);
    }

    check_shapes(&images)?;

    let views: Vec<_> = images.iter().map(ArrayD::view).collect();
    let stacked = stack(Axis(0), &views).map_err(|err| Error::ShapeMismatch {
        expected: "stackable images".to_string(),
        actual: err.to_string(),
    })?;

    let batch = finalize_batch(stacked, mode, paths.len())?;
    tracing::info!("Loaded batch of shape {:?}", batch.shape());

    Ok(batch)
}

/// Decode a file, detecting its format from the contents rather than the
/// extension.
fn decode(path: &Path) -> image::ImageResult<DynamicImage> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
}

/// Load the bundled reference images from [`data_dir`].
///
/// # Errors
///
/// Same as [`load_images`].
pub fn load_reference_images(mode: ColorMode) -> Result<ImageBatch> {
    load_images(data_dir(), mode)
}

/// Decode a `DynamicImage` to an `(H, W)` or `(H, W, C)` array in [0, 1].
fn image_to_array(img: &DynamicImage) -> Result<ArrayD<f32>> {
    let (width, height) = img.dimensions();
    let (samples, channels) = match img {
        DynamicImage::ImageLuma8(buf) => (normalize_u8(buf.as_raw()), 1),
        DynamicImage::ImageLumaA8(buf) => (normalize_u8(buf.as_raw()), 2),
        DynamicImage::ImageRgb8(buf) => (normalize_u8(buf.as_raw()), 3),
        DynamicImage::ImageRgba8(buf) => (normalize_u8(buf.as_raw()), 4),
        DynamicImage::ImageLuma16(buf) => (normalize_u16(buf.as_raw()), 1),
        DynamicImage::ImageLumaA16(buf) => (normalize_u16(buf.as_raw()), 2),
        DynamicImage::ImageRgb16(buf) => (normalize_u16(buf.as_raw()), 3),
        DynamicImage::ImageRgba16(buf) => (normalize_u16(buf.as_raw()), 4),
        DynamicImage::ImageRgb32F(buf) => (checked_unit_range(buf.as_raw())?, 3),
        DynamicImage::ImageRgba32F(buf) => (checked_unit_range(buf.as_raw())?, 4),
        other => (normalize_u8(other.to_rgba8().as_raw()), 4),
    };

    let (h, w) = (height as usize, width as usize);
    let shape = if channels == 1 {
        IxDyn(&[h, w])
    } else {
        IxDyn(&[h, w, channels])
    };

    ArrayD::from_shape_vec(shape, samples).map_err(|err| Error::ShapeMismatch {
        expected: format!("{h}x{w}x{channels} samples"),
        actual: err.to_string(),
    })
}

/// Float samples are taken as they are, provided none exceeds 1.
fn checked_unit_range(raw: &[f32]) -> Result<Vec<f32>> {
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max > 1.0 {
        return Err(Error::OutOfRange {
            max: f64::from(max),
        });
    }
    Ok(raw.to_vec())
}

fn normalize_u8(raw: &[u8]) -> Vec<f32> {
    let max = f32::from(u8::MAX);
    raw.iter().map(|&v| f32::from(v) / max).collect()
}

fn normalize_u16(raw: &[u16]) -> Vec<f32> {
    let max = f32::from(u16::MAX);
    raw.iter().map(|&v| f32::from(v) / max).collect()
}

/// Map a channel-last image onto the layout `mode` asks for.
fn apply_color_mode(im: ArrayD<f32>, mode: ColorMode, path: &Path) -> Result<ArrayD<f32>> {
    match (mode, im.ndim()) {
        (ColorMode::Gray, 3) => match rgb_to_gray(&im) {
            Some(gray) => Ok(gray),
            None => rgba_to_rgb(&im)
                .and_then(|rgb| rgb_to_gray(&rgb))
                .ok_or_else(|| Error::UnsupportedChannels {
                    channels: im.len_of(Axis(2)),
                    context: format!("grayscale conversion of {}", path.display()),
                }),
        },
        // RGB(A) ends up on the last axis, move it to the front
        (ColorMode::Color, 3) => Ok(im
            .permuted_axes(IxDyn(&[2, 0, 1]))
            .as_standard_layout()
            .into_owned()),
        (ColorMode::Color, 2) => {
            let view = im.view();
            stack(Axis(0), &[view.clone(), view.clone(), view]).map_err(|err| {
                Error::ShapeMismatch {
                    expected: "replicable grayscale image".to_string(),
                    actual: err.to_string(),
                }
            })
        }
        _ => Ok(im),
    }
}

/// Luminance-weighted RGB to gray. `None` unless the image has 3 channels.
fn rgb_to_gray(im: &ArrayD<f32>) -> Option<ArrayD<f32>> {
    if im.len_of(Axis(2)) != RGB_CHANNELS {
        return None;
    }
    let channel = move |c: usize| im.index_axis(Axis(2), c);
    Some(
        &channel(0) * LUMA_WEIGHTS[0]
            + &channel(1) * LUMA_WEIGHTS[1]
            + &channel(2) * LUMA_WEIGHTS[2],
    )
}

/// Composite an RGBA image over a white background. `None` unless the image
/// has 4 channels.
fn rgba_to_rgb(im: &ArrayD<f32>) -> Option<ArrayD<f32>> {
    if im.len_of(Axis(2)) != RGBA_CHANNELS {
        return None;
    }
    let alpha = im.index_axis(Axis(2), 3);
    let composited: Vec<ArrayD<f32>> = (0..RGB_CHANNELS)
        .map(|c| {
            let mut channel = &im.index_axis(Axis(2), c) * &alpha + alpha.mapv(|a| 1.0 - a);
            channel.mapv_inplace(|v| v.clamp(0.0, 1.0));
            channel
        })
        .collect();
    let views: Vec<_> = composited.iter().map(ArrayD::view).collect();
    stack(Axis(2), &views).ok()
}

/// Fail unless every image has the same shape, listing all of them if not.
fn check_shapes(images: &[ArrayD<f32>]) -> Result<()> {
    let first = images[0].shape();
    if images.iter().all(|im| im.shape() == first) {
        return Ok(());
    }

    let shapes: Vec<String> = images.iter().map(|im| format!("{:?}", im.shape())).collect();
    Err(Error::ShapeMismatch {
        expected: "all images to be the same shape".to_string(),
        actual: format!("the following: [{}]", shapes.join(", ")),
    })
}

/// Bring a stacked array to `(batch, channel, height, width)`.
///
/// `path_count` is the number of resolved input paths, used to tell a single
/// color image apart from several grayscale ones.
fn finalize_batch(stacked: ArrayD<f32>, mode: ColorMode, path_count: usize) -> Result<ImageBatch> {
    let batch = match (mode, stacked.ndim()) {
        (ColorMode::Gray, 3) => stacked.insert_axis(Axis(1)),
        (ColorMode::Gray, ndim) => {
            return Err(Error::Invariant(format!(
                "for loading in images as grayscale, this should be a 3d array, got {ndim}d"
            )));
        }
        // Either a single color image or multiple grayscale ones.
        (ColorMode::Color, 3) if path_count > 1 => stacked.insert_axis(Axis(0)),
        (ColorMode::Color, 3) => stacked.insert_axis(Axis(1)),
        (ColorMode::Color, _) => stacked,
    };

    let ndim = batch.ndim();
    batch.into_dimensionality::<Ix4>().map_err(|_| {
        Error::Invariant(format!(
            "somehow ended up with {ndim} dimensions instead of 4, not sure how we got here"
        ))
    })
}
