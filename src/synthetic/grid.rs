//! Polar coordinate grids.

use std::f64::consts::PI;

use ndarray::Array2;

/// Dimensions of a generated grid, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub height: usize,
    pub width: usize,
}

impl GridSize {
    /// Grid with explicit height and width.
    #[must_use]
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Square grid.
    #[must_use]
    pub const fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Centre of the grid in 1-indexed pixel coordinates, `((h+1)/2, (w+1)/2)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self) -> (f64, f64) {
        ((self.height as f64 + 1.0) / 2.0, (self.width as f64 + 1.0) / 2.0)
    }

    /// Larger of the two dimensions.
    #[must_use]
    pub fn max_dim(self) -> usize {
        self.height.max(self.width)
    }
}

impl From<usize> for GridSize {
    fn from(size: usize) -> Self {
        Self::square(size)
    }
}

impl From<(usize, usize)> for GridSize {
    fn from((height, width): (usize, usize)) -> Self {
        Self::new(height, width)
    }
}

/// Evaluate `f(dy, dx)` at every pixel, where `dy`/`dx` are the row/column
/// offsets of the 1-indexed pixel from `origin` (grid centre by default).
#[allow(clippy::cast_precision_loss)]
pub(crate) fn from_offsets<F>(size: GridSize, origin: Option<(f64, f64)>, f: F) -> Array2<f64>
where
    F: Fn(f64, f64) -> f64,
{
    let (oy, ox) = origin.unwrap_or_else(|| size.center());
    Array2::from_shape_fn((size.height, size.width), |(i, j)| {
        f((i + 1) as f64 - oy, (j + 1) as f64 - ox)
    })
}

/// Make a distance-from-origin matrix, raised to `exponent`.
///
/// `origin` is in 1-indexed pixel coordinates `(row, column)`; `None` places
/// it at the centre of the grid.
///
/// For non-positive exponents the origin pixel itself is 0 instead of
/// infinity (or 1 for an exponent of 0).
#[must_use]
pub fn polar_radius<G: Into<GridSize>>(
    size: G,
    exponent: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    from_offsets(size.into(), origin, |dy, dx| {
        let r2 = dx * dx + dy * dy;
        if exponent <= 0.0 && r2 == 0.0 {
            0.0
        } else {
            r2.powf(exponent / 2.0)
        }
    })
}

/// Make a polar angle matrix (in radians, clockwise from the X-axis).
///
/// The result is rotated by `phase` and wrapped into `[-pi, pi)`.
#[must_use]
pub fn polar_angle<G: Into<GridSize>>(
    size: G,
    phase: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    from_offsets(size.into(), origin, |dy, dx| {
        (dy.atan2(dx) + (PI - phase)).rem_euclid(2.0 * PI) - PI
    })
}
