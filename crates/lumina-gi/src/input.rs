//! Per-shading-point inputs supplied by the rendering pipeline.

use glam::{Vec2, Vec3};

use crate::config::{ShadingConfig, ShadingConfigError};
use crate::environment::{AmbientSh, ShadowFade, Texture2D};
use crate::light::DirectLight;
use crate::lightmap::LightmapVariant;
use crate::reflection::ProbeSet;

/// Camera data needed for the shadow distance fade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewParams {
    pub camera_position: Vec3,
    /// Unit view-space Z axis in world space, pointing from the scene toward
    /// the camera.
    pub view_z_axis: Vec3,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            camera_position: Vec3::ZERO,
            view_z_axis: Vec3::Z,
        }
    }
}

impl ViewParams {
    /// View-space depth of `world_pos`.
    pub fn view_z(&self, world_pos: Vec3) -> f32 {
        (self.camera_position - world_pos).dot(self.view_z_axis)
    }
}

/// Lightmap textures bound for the current draw.
#[derive(Clone, Copy, Default)]
pub struct LightmapTextures<'a> {
    pub static_color: Option<&'a dyn Texture2D>,
    pub static_direction: Option<&'a dyn Texture2D>,
    /// Baked occlusion of the main light, channel chosen by the config mask
    /// selector.
    pub shadow_mask: Option<&'a dyn Texture2D>,
    pub dynamic_color: Option<&'a dyn Texture2D>,
    pub dynamic_direction: Option<&'a dyn Texture2D>,
    /// Surface normals captured with the realtime directional lightmap.
    pub dynamic_normal: Option<&'a dyn Texture2D>,
}

impl LightmapTextures<'_> {
    /// Check that every texture `config` will read is bound.
    ///
    /// Meant to be called once per draw; an unbound texture at shading time
    /// just contributes nothing.
    pub fn check(&self, config: &ShadingConfig) -> Result<(), ShadingConfigError> {
        fn require(bound: bool, name: &'static str) -> Result<(), ShadingConfigError> {
            if bound {
                Ok(())
            } else {
                Err(ShadingConfigError::MissingTexture(name))
            }
        }

        if let Some(lightmap) = &config.static_lightmap {
            require(self.static_color.is_some(), "static lightmap color")?;
            if lightmap.variant == LightmapVariant::Directional {
                require(self.static_direction.is_some(), "static lightmap direction")?;
            }
        }
        if let Some(lightmap) = &config.dynamic_lightmap {
            require(self.dynamic_color.is_some(), "dynamic lightmap color")?;
            if lightmap.variant == LightmapVariant::Directional {
                require(self.dynamic_direction.is_some(), "dynamic lightmap direction")?;
                require(self.dynamic_normal.is_some(), "dynamic lightmap normal")?;
            }
        }
        if config.shadows.shadow_mask {
            require(self.shadow_mask.is_some(), "shadow mask")?;
        }
        Ok(())
    }
}

/// Everything known about one shading point. Read-only during composition.
#[derive(Clone, Copy)]
pub struct IlluminationInput<'a> {
    pub world_pos: Vec3,
    /// Unit direction from the surface toward the eye.
    pub view_dir: Vec3,
    pub view: ViewParams,
    /// Realtime shadow attenuation of the main light, 1 = unshadowed.
    pub attenuation: f32,
    /// Ambient probe for surfaces without lightmaps.
    pub ambient: Option<&'a dyn AmbientSh>,
    pub lightmap_uv: Vec2,
    pub dynamic_lightmap_uv: Vec2,
    /// The main light before attenuation.
    pub light: DirectLight,
    pub probes: ProbeSet<'a>,
    pub lightmaps: LightmapTextures<'a>,
    /// Overrides the shadow fade derived from the batch configuration.
    pub shadow_fade: Option<&'a dyn ShadowFade>,
}

impl Default for IlluminationInput<'_> {
    fn default() -> Self {
        Self {
            world_pos: Vec3::ZERO,
            view_dir: Vec3::Z,
            view: ViewParams::default(),
            attenuation: 1.0,
            ambient: None,
            lightmap_uv: Vec2::ZERO,
            dynamic_lightmap_uv: Vec2::ZERO,
            light: DirectLight::ZERO,
            probes: ProbeSet::default(),
            lightmaps: LightmapTextures::default(),
            shadow_fade: None,
        }
    }
}
