//! Procedural test patterns.
//!
//! All generators use 1-indexed pixel coordinates with the default origin at
//! the grid centre, like [`polar_radius`] and [`polar_angle`].

use std::f64::consts::PI;

use ndarray::{Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use rustfft::{num_complex::Complex, FftPlanner};

use super::grid::{from_offsets, polar_angle, polar_radius, GridSize};

/// Raised-cosine step from 0 to 1, centred on 0, `width` pixels wide.
fn raised_cosine_step(x: f64, width: f64) -> f64 {
    if x <= -width / 2.0 {
        0.0
    } else if x >= width / 2.0 {
        1.0
    } else {
        0.5 * (1.0 + (PI * x / width).sin())
    }
}

/// Convert a frequency vector `(fx, fy)` in radians per pixel into
/// `(period, direction)`.
#[must_use]
pub fn period_and_direction(frequency: (f64, f64)) -> (f64, f64) {
    let (fx, fy) = frequency;
    (2.0 * PI / fx.hypot(fy), fy.atan2(fx))
}

/// Linear ramp: `intercept + slope * (cos(direction) * dx + sin(direction) * dy)`.
#[must_use]
pub fn ramp<G: Into<GridSize>>(
    size: G,
    direction: f64,
    slope: f64,
    intercept: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    let (xinc, yinc) = (slope * direction.cos(), slope * direction.sin());
    from_offsets(size.into(), origin, |dy, dx| intercept + xinc * dx + yinc * dy)
}

/// Sinusoidal grating with the given period (pixels) and direction (radians).
#[must_use]
pub fn sine<G: Into<GridSize>>(
    size: G,
    period: f64,
    direction: f64,
    amplitude: f64,
    phase: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    ramp(size, direction, 2.0 * PI / period, phase, origin).mapv(|v| amplitude * v.sin())
}

/// Square wave grating with raised-cosine transitions `twidth` pixels wide.
///
/// The wave is `+amplitude` on the first half of each period and
/// `-amplitude` on the second, `phase` is in radians.
#[must_use]
pub fn square_wave<G: Into<GridSize>>(
    size: G,
    period: f64,
    direction: f64,
    amplitude: f64,
    phase: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    let twidth = (period / 3.0).min(2.0);
    let half = period / 2.0;
    let offset = phase * period / (2.0 * PI);

    ramp(size, direction, 1.0, offset, origin).mapv(|pos| {
        let t = pos.rem_euclid(period);
        let level = raised_cosine_step(t, twidth) - raised_cosine_step(t - half, twidth)
            + raised_cosine_step(t - period, twidth);
        amplitude * (2.0 * level - 1.0)
    })
}

/// Isotropic gaussian with the given (scalar) covariance, normalized to
/// unit sum over the plane.
#[must_use]
pub fn gaussian<G: Into<GridSize>>(
    size: G,
    covariance: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    let norm = 1.0 / (2.0 * PI * covariance);
    from_offsets(size.into(), origin, |dy, dx| {
        norm * (-(dx * dx + dy * dy) / (2.0 * covariance)).exp()
    })
}

/// Disk of value 1 on a background of 0, with a raised-cosine edge two
/// pixels wide.
#[must_use]
pub fn disk<G: Into<GridSize>>(size: G, radius: f64, origin: Option<(f64, f64)>) -> Array2<f64> {
    const TWIDTH: f64 = 2.0;
    polar_radius(size, 1.0, origin).mapv(|r| 1.0 - raised_cosine_step(r - radius, TWIDTH))
}

/// Sine of `harmonic` times the polar angle.
#[must_use]
pub fn angular_sine<G: Into<GridSize>>(
    size: G,
    harmonic: f64,
    amplitude: f64,
    phase: f64,
    origin: Option<(f64, f64)>,
) -> Array2<f64> {
    polar_angle(size, phase, origin).mapv(|a| amplitude * (harmonic * a).sin())
}

/// Zone plate: `amplitude * cos(pi / max_dim * r^2 + phase)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn zone_plate<G: Into<GridSize>>(size: G, amplitude: f64, phase: f64) -> Array2<f64> {
    let size = size.into();
    let scale = PI / size.max_dim() as f64;
    polar_radius(size, 2.0, None).mapv(|r2| amplitude * (scale * r2 + phase).cos())
}

/// Pink (1/f) noise with the given fractal dimension.
///
/// White gaussian noise is filtered in the Fourier domain with an amplitude
/// spectrum of `f^-(2.5 - fract_dim)`; the DC term is kept unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pink_noise<G, R>(size: G, fract_dim: f64, rng: &mut R) -> Array2<f64>
where
    G: Into<GridSize>,
    R: Rng + ?Sized,
{
    let size = size.into();
    let (h, w) = (size.height, size.width);

    let mut spectrum = Array2::from_shape_fn((h, w), |_| {
        let sample: f64 = StandardNormal.sample(&mut *rng);
        Complex::new(sample, 0.0)
    });

    let mut planner = FftPlanner::new();
    fft2(&mut spectrum, &mut planner, false);

    // Radius centred on (h/2, w/2), shifted so the zero frequency lands on [0, 0].
    let exponent = -(2.5 - fract_dim);
    let center = ((h / 2 + 1) as f64, (w / 2 + 1) as f64);
    let radius = polar_radius(size, exponent, Some(center));
    for ((i, j), value) in spectrum.indexed_iter_mut() {
        let gain = if (i, j) == (0, 0) {
            1.0
        } else {
            radius[[(i + h / 2) % h, (j + w / 2) % w]]
        };
        *value *= gain;
    }

    fft2(&mut spectrum, &mut planner, true);

    let norm = (h * w) as f64;
    let max_imag = spectrum.iter().map(|c| c.im.abs()).fold(0.0, f64::max);
    let max_real = spectrum.iter().map(|c| c.re.abs()).fold(0.0, f64::max);
    if max_imag > 1e-10 * max_real {
        tracing::debug!("pink noise has imaginary residue {}", max_imag / norm);
    }

    spectrum.mapv(|c| c.re / norm)
}

/// Unnormalized 2D FFT, rows then columns.
fn fft2(data: &mut Array2<Complex<f64>>, planner: &mut FftPlanner<f64>, inverse: bool) {
    for axis in [Axis(1), Axis(0)] {
        let len = data.len_of(axis);
        let fft = if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        };

        let mut buffer = vec![Complex::new(0.0, 0.0); len];
        for mut lane in data.lanes_mut(axis) {
            buffer.iter_mut().zip(lane.iter()).for_each(|(b, &v)| *b = v);
            fft.process(&mut buffer);
            lane.iter_mut().zip(&buffer).for_each(|(v, &b)| *v = b);
        }
    }
}

/// Linearly map `x` onto `[a, b]`. A constant input maps to `a`.
#[must_use]
pub fn rescale(x: &Array2<f64>, a: f64, b: f64) -> Array2<f64> {
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return Array2::from_elem(x.dim(), a);
    }
    x.mapv(|v| a + (b - a) * (v - min) / range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ramp_slope() {
        let r = ramp(5, 0.0, 2.0, 1.0, None);

        assert_abs_diff_eq!(r[[0, 2]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[[4, 4]], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[[4, 0]], -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_ramp() {
        let r = ramp(5, PI / 2.0, 1.0, 0.0, None);

        assert_abs_diff_eq!(r[[0, 3]], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[[4, 1]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sine_zero_at_origin() {
        let s = sine(9, 4.0, 0.0, 1.0, 0.0, None);

        assert_abs_diff_eq!(s[[4, 4]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[[4, 5]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[[4, 3]], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_square_wave_step_edge() {
        let size = 16;
        let edge = square_wave(size, (size + 1) as f64, 0.0, 1.0, 0.0, None);

        assert_abs_diff_eq!(edge[[3, 15]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(edge[[3, 0]], -1.0, epsilon = 1e-12);
        assert!(edge.iter().all(|v| (-1.0..=1.0).contains(v)));
        // Constant along columns for a horizontal wave.
        assert!(edge.column(10).iter().all(|&v| v == edge[[0, 10]]));
    }

    #[test]
    fn test_gaussian_peak_and_sum() {
        let g = gaussian(41, 16.0, None);

        let peak = g.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(g[[20, 20]], peak);
        assert_abs_diff_eq!(g.sum(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_disk_inside_and_outside() {
        let d = disk(21, 5.0, None);

        assert_eq!(d[[10, 10]], 1.0);
        assert_eq!(d[[0, 0]], 0.0);
        assert_abs_diff_eq!(d[[10, 15]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_angular_sine_symmetry() {
        let a = angular_sine(8, 6.0, 1.0, 0.0, None);
        assert!(a.iter().all(|v| (-1.0..=1.0).contains(v)));
        // Even harmonic, so point reflection leaves it unchanged.
        assert_abs_diff_eq!(a[[1, 2]], a[[6, 5]], epsilon = 1e-9);
    }

    #[test]
    fn test_zone_plate_center() {
        let z = zone_plate(9, 1.0, 0.0);
        assert_abs_diff_eq!(z[[4, 4]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pink_noise_seeded() {
        let a = pink_noise(16, 0.8, &mut StdRng::seed_from_u64(3));
        let b = pink_noise(16, 0.8, &mut StdRng::seed_from_u64(3));
        let c = pink_noise(16, 0.8, &mut StdRng::seed_from_u64(4));

        assert_eq!(a.dim(), (16, 16));
        assert!(a.iter().all(|v| v.is_finite()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pink_noise_is_smoother_than_white() {
        let noise = pink_noise(32, 0.8, &mut StdRng::seed_from_u64(11));
        let mean_abs_step = |m: &Array2<f64>| {
            let range = m.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                - m.iter().copied().fold(f64::INFINITY, f64::min);
            let steps: f64 = m
                .rows()
                .into_iter()
                .map(|row| row.windows(2).into_iter().map(|w| (w[1] - w[0]).abs()).sum::<f64>())
                .sum();
            steps / range
        };

        let mut rng = StdRng::seed_from_u64(11);
        let white: Array2<f64> =
            Array2::from_shape_fn((32, 32), |_| StandardNormal.sample(&mut rng));

        assert!(mean_abs_step(&noise) < mean_abs_step(&white));
    }

    #[test]
    fn test_period_and_direction() {
        let (period, direction) = period_and_direction((0.5, 0.5));

        assert_abs_diff_eq!(period, 2.0 * PI / 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(direction, PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rescale() {
        let x = ndarray::array![[-2.0, 0.0], [2.0, 6.0]];
        let r = rescale(&x, 0.0, 1.0);

        assert_eq!(r, ndarray::array![[0.0, 0.25], [0.5, 1.0]]);
        assert_eq!(rescale(&Array2::zeros((2, 2)), 0.0, 1.0), Array2::zeros((2, 2)));
    }
}
