//! The standard battery of synthetic stimuli.

use std::f64::consts::PI;

use ndarray::{s, Array2, Array4, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::image::ImageBatch;

use super::grid::polar_angle;
use super::patterns::{
    angular_sine, disk, gaussian, period_and_direction, pink_noise, ramp, rescale, sine,
    square_wave, zone_plate,
};

/// Number of sine grating cycles across the image.
const SINE_GRATING_CYCLES: f64 = 8.0;

/// Angular frequency of the angular sine pattern.
const ANGULAR_HARMONIC: f64 = 6.0;

/// Configuration for the stimulus battery.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusConfig {
    /// Height and width of every stimulus, in pixels.
    pub size: usize,

    /// Fractal dimension of the pink noise stimulus.
    pub fract_dim: f64,

    /// Random seed for the noise stimulus. None for random.
    pub seed: Option<u64>,

    /// Whether consumers should track gradients through the stimuli.
    pub requires_grad: bool,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            size: 256,
            fract_dim: 0.8,
            seed: None,
            requires_grad: true,
        }
    }
}

impl StimulusConfig {
    /// Config for `size x size` stimuli, other fields at their defaults.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidParameter {
                name: "size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(0.0..2.5).contains(&self.fract_dim) {
            return Err(Error::InvalidParameter {
                name: "fract_dim".to_string(),
                reason: "must be in [0.0, 2.5)".to_string(),
            });
        }

        Ok(())
    }
}

/// One pattern of the battery, in batch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stimulus {
    /// Single bright pixel at the centre.
    Impulse,
    /// Vertical step edge through the centre.
    StepEdge,
    /// Vertical luminance ramp.
    Ramp,
    /// Short vertical bar.
    Bar,
    /// Edge of a large disk centred on the bottom-right corner.
    CurvedEdge,
    /// Gaussian-windowed sine grating.
    SineGrating,
    /// Gaussian-windowed oblique square grating.
    SquareGrating,
    /// Polar angle map.
    PolarAngle,
    /// Sine of a multiple of the polar angle.
    AngularSine,
    /// Radial chirp.
    ZonePlate,
    /// Pink noise.
    Fractal,
}

impl Stimulus {
    /// Every stimulus, in the order they are stacked.
    pub const ALL: [Self; 11] = [
        Self::Impulse,
        Self::StepEdge,
        Self::Ramp,
        Self::Bar,
        Self::CurvedEdge,
        Self::SineGrating,
        Self::SquareGrating,
        Self::PolarAngle,
        Self::AngularSine,
        Self::ZonePlate,
        Self::Fractal,
    ];

    /// Short snake-case name, used for file names.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Impulse => "impulse",
            Self::StepEdge => "step_edge",
            Self::Ramp => "ramp",
            Self::Bar => "bar",
            Self::CurvedEdge => "curv_edge",
            Self::SineGrating => "sine_grating",
            Self::SquareGrating => "square_grating",
            Self::PolarAngle => "polar_angle",
            Self::AngularSine => "angular_sine",
            Self::ZonePlate => "zone_plate",
            Self::Fractal => "fractal",
        }
    }

    /// Position of this stimulus in the batch.
    #[must_use]
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or_default()
    }

    /// Generate the raw (unscaled) pattern. Only [`Stimulus::Fractal`] draws
    /// from `rng`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        size: usize,
        fract_dim: f64,
        rng: &mut R,
    ) -> Array2<f64> {
        let n = size as f64;
        match self {
            Self::Impulse => {
                let mut im = Array2::zeros((size, size));
                im[[size / 2, size / 2]] = 1.0;
                im
            }
            Self::StepEdge => square_wave(size, n + 1.0, 0.0, 1.0, 0.0, None),
            Self::Ramp => ramp(size, PI / 2.0, 1.0, 0.0, None),
            Self::Bar => {
                let mut im = Array2::zeros((size, size));
                let (mid, half_len) = (size / 2, size / 10);
                im.slice_mut(s![
                    mid.saturating_sub(half_len)..(mid + half_len).min(size),
                    mid.saturating_sub(1)..(mid + 1).min(size)
                ])
                .fill(1.0);
                im
            }
            Self::CurvedEdge => disk(size, n / 1.2, Some((n, n))),
            Self::SineGrating => {
                sine(size, n / SINE_GRATING_CYCLES, 0.0, 1.0, 0.0, None) * gaussian(size, n, None)
            }
            Self::SquareGrating => {
                let (period, direction) = period_and_direction((0.5, 0.5));
                square_wave(size, period, direction, 1.0, 2.0 * PI / 3.0, None)
                    * gaussian(size, n, None)
            }
            Self::PolarAngle => polar_angle(size, 0.0, None),
            Self::AngularSine => angular_sine(size, ANGULAR_HARMONIC, 1.0, 0.0, None),
            Self::ZonePlate => zone_plate(size, 1.0, 0.0),
            Self::Fractal => pink_noise(size, fract_dim, rng),
        }
    }
}

/// The stacked stimulus battery.
#[derive(Debug, Clone)]
pub struct StimulusSet {
    /// Batch of shape `(11, 1, size, size)`, values in [0, 1].
    pub stimuli: ImageBatch,

    /// Gradient tracking flag requested through [`StimulusConfig`].
    pub requires_grad: bool,
}

impl StimulusSet {
    /// The `(size, size)` plane of one stimulus.
    #[must_use]
    pub fn get(&self, stimulus: Stimulus) -> ArrayView2<'_, f32> {
        self.stimuli
            .index_axis(Axis(0), stimulus.index())
            .index_axis_move(Axis(0), 0)
    }
}

/// Make the set of basic stimuli, useful for developing and debugging models.
///
/// Every pattern of [`Stimulus::ALL`] is generated, rescaled to [0, 1] and
/// stacked into a `(11, 1, size, size)` batch.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
#[allow(clippy::cast_possible_truncation)]
pub fn make_synthetic_stimuli(config: &StimulusConfig) -> Result<StimulusSet> {
    config.validate()?;

    let mut rng = config
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    let size = config.size;
    let mut stimuli = Array4::<f32>::zeros((Stimulus::ALL.len(), 1, size, size));
    for (stimulus, mut slot) in Stimulus::ALL.iter().zip(stimuli.axis_iter_mut(Axis(0))) {
        let pattern = rescale(&stimulus.generate(size, config.fract_dim, &mut rng), 0.0, 1.0);
        slot.index_axis_mut(Axis(0), 0).assign(&pattern.mapv(|v| v as f32));
    }

    tracing::debug!(
        "Generated {} stimuli of size {size}x{size}",
        Stimulus::ALL.len()
    );

    Ok(StimulusSet {
        stimuli,
        requires_grad: config.requires_grad,
    })
}
