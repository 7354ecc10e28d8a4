//! Order-2 spherical-harmonic ambient probe.
//!
//! Stores nine RGB radiance coefficients in the real SH basis and evaluates
//! irradiance by convolving with the clamped cosine lobe.

use std::f32::consts::PI;

use glam::Vec3;

use crate::environment::AmbientSh;

const Y00: f32 = 0.282_095;
const Y1: f32 = 0.488_603;
const Y2_CROSS: f32 = 1.092_548;
const Y20: f32 = 0.315_392;
const Y22: f32 = 0.546_274;

/// Cosine-lobe convolution weights per band.
const A0: f32 = PI;
const A1: f32 = 2.0 * PI / 3.0;
const A2: f32 = PI / 4.0;

/// SH basis values for a unit direction, ordered
/// `[Y00, Y1-1, Y10, Y11, Y2-2, Y2-1, Y20, Y21, Y22]`.
fn basis(d: Vec3) -> [f32; 9] {
    [
        Y00,
        Y1 * d.y,
        Y1 * d.z,
        Y1 * d.x,
        Y2_CROSS * d.x * d.y,
        Y2_CROSS * d.y * d.z,
        Y20 * (3.0 * d.z * d.z - 1.0),
        Y2_CROSS * d.x * d.z,
        Y22 * (d.x * d.x - d.y * d.y),
    ]
}

/// Band index of each coefficient.
const BAND: [usize; 9] = [0, 1, 1, 1, 2, 2, 2, 2, 2];
const BAND_WEIGHT: [f32; 3] = [A0, A1, A2];

/// Nine-coefficient RGB radiance probe.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShL2 {
    pub coefficients: [Vec3; 9],
}

impl ShL2 {
    /// Probe whose irradiance is `irradiance` for every normal.
    pub fn ambient(irradiance: Vec3) -> Self {
        let mut sh = Self::default();
        sh.add_ambient(irradiance);
        sh
    }

    /// Add uniform irradiance.
    pub fn add_ambient(&mut self, irradiance: Vec3) {
        self.coefficients[0] += irradiance / (A0 * Y00);
    }

    /// Project a distant directional light of the given color.
    ///
    /// `direction` points toward the light.
    pub fn add_directional(&mut self, direction: Vec3, color: Vec3) {
        let y = basis(direction.normalize());
        for (coefficient, weight) in self.coefficients.iter_mut().zip(y) {
            *coefficient += color * weight;
        }
    }

    /// Irradiance for `normal`, clamped to be non-negative.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let y = basis(normal);
        let sum: Vec3 = self
            .coefficients
            .iter()
            .zip(y)
            .zip(BAND)
            .map(|((coefficient, weight), band)| *coefficient * (weight * BAND_WEIGHT[band]))
            .sum();
        sum.max(Vec3::ZERO)
    }
}

impl AmbientSh for ShL2 {
    fn evaluate(&self, normal: Vec3, _world_pos: Vec3) -> Vec3 {
        self.irradiance(normal)
    }
}
