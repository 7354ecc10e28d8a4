//! Resolving a [`ShadingConfig`] once per draw batch.
//!
//! [`ShadingBatch`] holds the sanitized configuration plus the decisions that
//! only depend on it: which route the main light takes to the surface,
//! whether the SH probe is sampled, and whether shadows are blended with
//! baked occlusion. [`ShadingUniform`] is its GPU-side mirror.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::{RenderPass, ShadingConfig};
use crate::lightmap::LightmapVariant;
use crate::shadow::{ShadowFadeParams, ShadowMixing};

/// How the main light's energy reaches a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainLightRoute {
    /// Evaluated live as `light`.
    Live,
    /// Already in the static lightmap with no screen-space realtime shadow
    /// to subtract; the live light is dropped.
    Baked,
    /// In the static lightmap, with the realtime shadow subtracted from the
    /// bake; the live light is dropped.
    BakedShadowCorrected,
}

impl MainLightRoute {
    fn resolve(config: &ShadingConfig) -> Self {
        let shadows = &config.shadows;
        if config.static_lightmap.is_none() || !shadows.subtractive_mixing || shadows.shadow_mask {
            return Self::Live;
        }
        if shadows.screen_shadows {
            Self::BakedShadowCorrected
        } else {
            Self::Baked
        }
    }

    /// Returns `true` if a lightmap carries the main light.
    pub fn is_baked(self) -> bool {
        !matches!(self, Self::Live)
    }
}

/// Feature bits of [`ShadingUniform::flags`].
pub mod flags {
    pub const STATIC_LIGHTMAP: u32 = 1 << 0;
    pub const STATIC_DIRECTIONAL: u32 = 1 << 1;
    pub const DYNAMIC_LIGHTMAP: u32 = 1 << 2;
    pub const DYNAMIC_DIRECTIONAL: u32 = 1 << 3;
    pub const SH_AMBIENT: u32 = 1 << 4;
    pub const SHADOW_BLEND_IN_GI: u32 = 1 << 5;
    pub const SHADOW_MASK: u32 = 1 << 6;
    pub const REFLECTIONS: u32 = 1 << 7;
    pub const BOX_PROJECTION: u32 = 1 << 8;
    pub const PROBE_BLENDING: u32 = 1 << 9;
}

/// GPU-side shading parameters, 80 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadingUniform {
    /// x = feature bits, y = main light route (0 live, 1 baked, 2 corrected), zw = padding.
    pub flags_route: [u32; 4],
    /// x = probe blend threshold, y = lod steps, z = shadow strength, w = padding.
    pub params: [f32; 4],
    /// xyz = subtractive shadow color, w = padding.
    pub shadow_color: [f32; 4],
    /// xyz = fallback indirect specular, w = padding.
    pub fallback_specular: [f32; 4],
    pub occlusion_mask_selector: [f32; 4],
}

static_assertions::assert_eq_size!(ShadingUniform, [u8; 80]);

/// A configuration resolved for one draw batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingBatch {
    config: ShadingConfig,
    route: MainLightRoute,
    sample_sh: bool,
    blend_shadows_in_gi: bool,
}

impl ShadingBatch {
    /// Resolve `config`. Out-of-range values are clamped with a warning.
    pub fn new(config: &ShadingConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => *config,
            Err(err) => {
                tracing::warn!(%err, "shading config out of range, clamping");
                config.sanitized()
            }
        };

        let has_lightmap = config.static_lightmap.is_some() || config.dynamic_lightmap.is_some();
        if config.sh_ambient && has_lightmap {
            tracing::debug!("lightmaps supply ambient, skipping SH probe");
        }
        let sample_sh = config.sh_ambient && !has_lightmap;

        let shadows = &config.shadows;
        let blend_shadows_in_gi =
            shadows.shadow_mask || (shadows.screen_shadows && config.static_lightmap.is_some());

        let route = MainLightRoute::resolve(&config);
        tracing::debug!(
            ?route,
            sample_sh,
            blend_shadows_in_gi,
            reflections = config.reflections.enabled,
            "resolved shading batch"
        );

        Self {
            config,
            route,
            sample_sh,
            blend_shadows_in_gi,
        }
    }

    pub fn config(&self) -> &ShadingConfig {
        &self.config
    }

    pub fn route(&self) -> MainLightRoute {
        self.route
    }

    /// Whether the SH ambient probe is evaluated.
    pub fn samples_sh(&self) -> bool {
        self.sample_sh
    }

    /// Whether realtime attenuation is mixed with baked occlusion.
    pub fn blends_shadows_in_gi(&self) -> bool {
        self.blend_shadows_in_gi
    }

    /// Whether reflections are left to a later deferred composite.
    pub fn defers_reflections(&self) -> bool {
        self.config.pass == RenderPass::DeferredGeometry && self.config.deferred_reflections
    }

    /// Shadow fade for a camera at `camera_position`, built from the
    /// configured distances.
    pub fn shadow_fade(&self, camera_position: Vec3) -> ShadowFadeParams {
        let shadows = &self.config.shadows;
        let mixing = if shadows.subtractive_mixing {
            ShadowMixing::MinWithFade
        } else {
            ShadowMixing::Lerp
        };
        ShadowFadeParams::new(
            camera_position,
            shadows.shadow_distance,
            shadows.fade_range,
            shadows.spherical_fade,
            mixing,
        )
    }

    /// Build the GPU-side uniform for shader variants mirroring this batch.
    pub fn to_uniform(&self) -> ShadingUniform {
        let config = &self.config;
        let mut bits = 0;
        if let Some(lightmap) = &config.static_lightmap {
            bits |= flags::STATIC_LIGHTMAP;
            if lightmap.variant == LightmapVariant::Directional {
                bits |= flags::STATIC_DIRECTIONAL;
            }
        }
        if let Some(lightmap) = &config.dynamic_lightmap {
            bits |= flags::DYNAMIC_LIGHTMAP;
            if lightmap.variant == LightmapVariant::Directional {
                bits |= flags::DYNAMIC_DIRECTIONAL;
            }
        }
        if self.sample_sh {
            bits |= flags::SH_AMBIENT;
        }
        if self.blend_shadows_in_gi {
            bits |= flags::SHADOW_BLEND_IN_GI;
        }
        if config.shadows.shadow_mask {
            bits |= flags::SHADOW_MASK;
        }
        let reflections = &config.reflections;
        if reflections.enabled {
            bits |= flags::REFLECTIONS;
        }
        if reflections.box_projection {
            bits |= flags::BOX_PROJECTION;
        }
        if reflections.probe_blending {
            bits |= flags::PROBE_BLENDING;
        }

        let route = match self.route {
            MainLightRoute::Live => 0,
            MainLightRoute::Baked => 1,
            MainLightRoute::BakedShadowCorrected => 2,
        };
        let subtractive = &config.shadows.subtractive;

        ShadingUniform {
            flags_route: [bits, route, 0, 0],
            params: [
                reflections.blend_threshold,
                reflections.lod_steps,
                subtractive.shadow_strength,
                0.0,
            ],
            shadow_color: subtractive.shadow_color.extend(0.0).to_array(),
            fallback_specular: reflections.fallback_specular.extend(0.0).to_array(),
            occlusion_mask_selector: config.shadows.occlusion_mask_selector.to_array(),
        }
    }
}
