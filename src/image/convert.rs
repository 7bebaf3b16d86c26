//! Float to integer sample conversion.

use ndarray::{Array, ArrayBase, Data, Dimension};

use crate::error::{Error, Result};

/// Unsigned integer sample types an image can be quantized to.
pub trait UnsignedSample: Copy {
    /// Largest representable value, as a float.
    const MAX_VALUE: f64;

    /// Truncate an already scaled value into the sample type.
    fn from_scaled(value: f64) -> Self;
}

impl UnsignedSample for u8 {
    const MAX_VALUE: f64 = u8::MAX as f64;

    #[inline]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_scaled(value: f64) -> Self {
        value as Self
    }
}

impl UnsignedSample for u16 {
    const MAX_VALUE: f64 = u16::MAX as f64;

    #[inline]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_scaled(value: f64) -> Self {
        value as Self
    }
}

/// Convert an image from float in [0, 1] to 8 or 16 bit samples.
///
/// Values are multiplied by the maximum of the target type (255 or 65535)
/// and truncated.
///
/// # Errors
///
/// Returns [`Error::OutOfRange`] if any value is greater than 1.
pub fn convert_float_to_int<T, A, S, D>(im: &ArrayBase<S, D>) -> Result<Array<T, D>>
where
    T: UnsignedSample,
    A: Copy + Into<f64>,
    S: Data<Elem = A>,
    D: Dimension,
{
    let max = im
        .iter()
        .map(|&v| v.into())
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 1.0 {
        return Err(Error::OutOfRange { max });
    }

    Ok(im.mapv(|v| T::from_scaled(v.into() * T::MAX_VALUE)))
}
