//! Synthetic stimuli and the coordinate grids they are built from.

mod grid;
mod patterns;
mod stimuli;

pub use grid::{polar_angle, polar_radius, GridSize};
pub use patterns::{
    angular_sine, disk, gaussian, period_and_direction, pink_noise, ramp, rescale, sine,
    square_wave, zone_plate,
};
pub use stimuli::{make_synthetic_stimuli, Stimulus, StimulusConfig, StimulusSet};
