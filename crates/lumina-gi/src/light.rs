//! Light value types produced and consumed by illumination composition.
//!
//! [`DirectLight`] is one directional contribution, [`IndirectLight`] the
//! ambient accumulator, and [`CombinedIllumination`] the composed result
//! handed to the BRDF stage.

use glam::Vec3;

/// One directional light contribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectLight {
    /// Linear RGB radiance, already scaled by any attenuation.
    pub color: Vec3,
    /// Direction from the surface TOWARD the light. Unit length, or zero for a
    /// light that has been reset.
    pub direction: Vec3,
    /// Clamped N·L for this light. Only written by the directional lightmap
    /// decoder; the BRDF stage recomputes it for live lights.
    pub ndotl: f32,
}

impl DirectLight {
    /// A light that contributes nothing.
    pub const ZERO: Self = Self {
        color: Vec3::ZERO,
        direction: Vec3::ZERO,
        ndotl: 0.0,
    };

    /// Create a light with the given color and direction toward the light.
    pub fn new(color: Vec3, direction: Vec3) -> Self {
        Self {
            color,
            direction,
            ndotl: 0.0,
        }
    }

    /// Copy of this light with its color scaled by `attenuation`.
    pub fn attenuated(&self, attenuation: f32) -> Self {
        Self {
            color: self.color * attenuation,
            ..*self
        }
    }

    /// Returns `true` if the light carries no energy.
    pub fn is_black(&self) -> bool {
        self.color == Vec3::ZERO
    }
}

/// Ambient (indirect) light accumulator. Zero-initialized, then summed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IndirectLight {
    /// Indirect diffuse irradiance (SH ambient plus lightmaps), occluded.
    pub diffuse: Vec3,
    /// Indirect specular radiance from reflection probes, occluded.
    pub specular: Vec3,
}

/// Composed illumination for one shading point.
///
/// `light` and `indirect` never count the same energy twice: when a lightmap
/// already contains the main light, `light` is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CombinedIllumination {
    /// The live main light after attenuation.
    pub light: DirectLight,
    /// Indirect diffuse and specular.
    pub indirect: IndirectLight,
    /// Directional part split off the static directional lightmap.
    pub static_lightmap_light: DirectLight,
    /// Directional part split off the dynamic directional lightmap.
    pub dynamic_lightmap_light: DirectLight,
}
