//! Indirect specular from one or two cubemap reflection probes.
//!
//! Each probe is sampled through [`glossy_environment`], optionally after a
//! box re-projection that corrects parallax for box-shaped probe volumes.
//! With two probes the results are blended by the primary probe's weight.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::environment::Cubemap;
use crate::input::IlluminationInput;
use crate::lightmap::HdrDecode;

/// Blend weights at or above this are treated as "primary probe only".
pub const DEFAULT_BLEND_THRESHOLD: f32 = 0.99999;

/// Number of roughness mip steps in a prefiltered probe.
pub const DEFAULT_LOD_STEPS: f32 = 6.0;

/// Reflection sampling settings, resolved once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Sample probes at all. When off, `fallback_specular` is used.
    pub enabled: bool,
    /// Apply box re-projection to probes that request it.
    pub box_projection: bool,
    /// Blend toward the secondary probe when one is bound.
    pub probe_blending: bool,
    pub blend_threshold: f32,
    /// Constant indirect specular color used when probes are not sampled.
    pub fallback_specular: Vec3,
    pub lod_steps: f32,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            box_projection: true,
            probe_blending: true,
            blend_threshold: DEFAULT_BLEND_THRESHOLD,
            fallback_specular: Vec3::new(0.12, 0.13, 0.15),
            lod_steps: DEFAULT_LOD_STEPS,
        }
    }
}

/// One bound reflection probe.
#[derive(Clone, Copy)]
pub struct ReflectionProbe<'a> {
    pub cubemap: &'a dyn Cubemap,
    /// Per-probe decode, applied before any blending.
    pub hdr: HdrDecode,
    /// Capture position in world space.
    pub position: Vec3,
    pub box_min: Vec3,
    pub box_max: Vec3,
    /// Whether this probe's volume is a box suitable for re-projection.
    pub box_projection: bool,
}

impl std::fmt::Debug for ReflectionProbe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectionProbe")
            .field("hdr", &self.hdr)
            .field("position", &self.position)
            .field("box_min", &self.box_min)
            .field("box_max", &self.box_max)
            .field("box_projection", &self.box_projection)
            .finish_non_exhaustive()
    }
}

impl ReflectionProbe<'_> {
    /// Re-project `direction` for a shading point at `world_pos`, or return
    /// it unchanged when this probe has no box volume.
    pub fn project(&self, direction: Vec3, world_pos: Vec3) -> Vec3 {
        if self.box_projection {
            box_project(direction, world_pos, self.position, self.box_min, self.box_max)
        } else {
            direction
        }
    }
}

/// The up-to-two probes affecting a shading point.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbeSet<'a> {
    pub primary: Option<ReflectionProbe<'a>>,
    pub secondary: Option<ReflectionProbe<'a>>,
    /// Weight of the primary probe in \[0, 1\]. 0 = secondary only.
    pub blend: f32,
}

/// Where and how rough to look up the environment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlossyEnvironmentQuery {
    /// Reflection of the view direction about the normal.
    pub reflection_dir: Vec3,
    /// `1 - smoothness`.
    pub perceptual_roughness: f32,
}

impl GlossyEnvironmentQuery {
    /// Build a query from material smoothness. `view_dir` points from the
    /// surface toward the eye.
    pub fn from_smoothness(smoothness: f32, view_dir: Vec3, normal: Vec3) -> Self {
        let incident = -view_dir;
        Self {
            reflection_dir: incident - 2.0 * normal.dot(incident) * normal,
            perceptual_roughness: 1.0 - smoothness,
        }
    }
}

/// Intersect the reflection ray with the probe box and return the direction
/// from the probe center to the hit point.
///
/// Axes the ray is parallel to never bound the hit distance.
pub fn box_project(
    direction: Vec3,
    world_pos: Vec3,
    probe_center: Vec3,
    box_min: Vec3,
    box_max: Vec3,
) -> Vec3 {
    let direction = direction.normalize();
    let to_max = (box_max - world_pos) / direction;
    let to_min = (box_min - world_pos) / direction;
    let exit = Vec3::select(direction.cmpgt(Vec3::ZERO), to_max, to_min);
    let exit = Vec3::select(direction.cmpeq(Vec3::ZERO), Vec3::INFINITY, exit);
    let distance = exit.min_element();
    (world_pos - probe_center) + direction * distance
}

/// Sample a prefiltered cubemap at the mip matching the query roughness and
/// decode it.
pub fn glossy_environment(
    cubemap: &dyn Cubemap,
    hdr: &HdrDecode,
    query: &GlossyEnvironmentQuery,
    lod_steps: f32,
) -> Vec3 {
    let r = query.perceptual_roughness;
    // Approximates the mip that best matches a GGX lobe of this roughness.
    let r = r * (1.7 - 0.7 * r);
    let mip = r * lod_steps;
    hdr.decode(cubemap.sample_level(query.reflection_dir, mip))
}

/// Indirect specular for one shading point, already multiplied by
/// `occlusion`.
pub fn sample_indirect_specular(
    input: &IlluminationInput<'_>,
    occlusion: f32,
    query: &GlossyEnvironmentQuery,
    config: &ReflectionConfig,
) -> Vec3 {
    if !config.enabled {
        return config.fallback_specular * occlusion;
    }
    let Some(primary) = input.probes.primary else {
        return config.fallback_specular * occlusion;
    };

    let original = query.reflection_dir;
    let mut query = *query;
    if config.box_projection {
        query.reflection_dir = primary.project(original, input.world_pos);
    }
    let env0 = glossy_environment(primary.cubemap, &primary.hdr, &query, config.lod_steps);

    let blend = input.probes.blend;
    let specular = match input.probes.secondary {
        Some(secondary) if config.probe_blending && blend < config.blend_threshold => {
            query.reflection_dir = if config.box_projection {
                secondary.project(original, input.world_pos)
            } else {
                original
            };
            let env1 =
                glossy_environment(secondary.cubemap, &secondary.hdr, &query, config.lod_steps);
            env1.lerp(env0, blend)
        }
        _ => env0,
    };

    specular * occlusion
}
