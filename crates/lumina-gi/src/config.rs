//! Per-batch shading configuration.
//!
//! A [`ShadingConfig`] describes which lighting inputs a draw batch uses:
//! which lightmaps are present and in what variant, how realtime shadows meet
//! baked ones, and how reflections are sampled. It is serializable so it can
//! live in the engine configuration file.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::lightmap::{LightmapEncoding, LightmapVariant, RealtimeDecode};
use crate::reflection::ReflectionConfig;
use crate::shadow::SubtractiveShadow;

/// Errors in a shading configuration or its texture bindings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShadingConfigError {
    /// Shadow strength must lie in \[0, 1\].
    #[error("shadow strength {0} outside [0, 1]")]
    ShadowStrength(f32),

    /// Shadow color channels must be non-negative.
    #[error("shadow color {0} has a negative channel")]
    ShadowColor(Vec3),

    /// Probe blend threshold must lie in (0, 1\].
    #[error("probe blend threshold {0} outside (0, 1]")]
    BlendThreshold(f32),

    /// Reflection LOD step count must be positive.
    #[error("reflection lod steps {0} must be positive")]
    LodSteps(f32),

    /// Shadow fade range must be positive and no longer than the shadow distance.
    #[error("shadow fade range {fade_range} invalid for shadow distance {shadow_distance}")]
    FadeRange { shadow_distance: f32, fade_range: f32 },

    /// A texture the configuration reads is not bound.
    #[error("{0} texture is not bound")]
    MissingTexture(&'static str),
}

/// A baked lightmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticLightmap {
    pub variant: LightmapVariant,
    pub encoding: LightmapEncoding,
}

/// A realtime GI lightmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicLightmap {
    pub variant: LightmapVariant,
    pub decode: RealtimeDecode,
}

/// Realtime shadow settings for the main light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// A baked shadow-mask texture stores the main light's occlusion.
    pub shadow_mask: bool,
    /// The main light is baked into the lightmap and realtime shadows are
    /// subtracted from it (subtractive mixed lighting).
    pub subtractive_mixing: bool,
    /// Realtime shadows are resolved into a screen-space shadow texture.
    pub screen_shadows: bool,
    pub subtractive: SubtractiveShadow,
    /// Selects the shadow-mask channel belonging to the main light.
    pub occlusion_mask_selector: Vec4,
    /// Distance at which realtime shadows end.
    pub shadow_distance: f32,
    /// Length of the realtime-to-baked hand-off before `shadow_distance`.
    pub fade_range: f32,
    /// Fade by spherical distance from the camera instead of view depth.
    pub spherical_fade: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            shadow_mask: false,
            subtractive_mixing: false,
            screen_shadows: true,
            subtractive: SubtractiveShadow::default(),
            occlusion_mask_selector: Vec4::X,
            shadow_distance: 150.0,
            fade_range: 30.0,
            spherical_fade: false,
        }
    }
}

/// The render pass the shading runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderPass {
    #[default]
    Forward,
    /// G-buffer fill of a deferred renderer.
    DeferredGeometry,
}

/// Lighting inputs and modes for one draw batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub static_lightmap: Option<StaticLightmap>,
    pub dynamic_lightmap: Option<DynamicLightmap>,
    /// Sample the ambient SH probe. Only honored when no lightmap is present.
    pub sh_ambient: bool,
    pub shadows: ShadowConfig,
    pub reflections: ReflectionConfig,
    pub pass: RenderPass,
    /// Deferred renderers composite reflections in a separate buffer.
    pub deferred_reflections: bool,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            static_lightmap: None,
            dynamic_lightmap: None,
            sh_ambient: true,
            shadows: ShadowConfig::default(),
            reflections: ReflectionConfig::default(),
            pass: RenderPass::Forward,
            deferred_reflections: true,
        }
    }
}

impl ShadingConfig {
    /// Check value ranges. Returns the first problem found.
    pub fn validate(&self) -> Result<(), ShadingConfigError> {
        let shadows = &self.shadows;
        let strength = shadows.subtractive.shadow_strength;
        if !(0.0..=1.0).contains(&strength) {
            return Err(ShadingConfigError::ShadowStrength(strength));
        }
        if shadows.subtractive.shadow_color.min_element() < 0.0 {
            return Err(ShadingConfigError::ShadowColor(shadows.subtractive.shadow_color));
        }
        if !(shadows.fade_range > 0.0 && shadows.fade_range <= shadows.shadow_distance) {
            return Err(ShadingConfigError::FadeRange {
                shadow_distance: shadows.shadow_distance,
                fade_range: shadows.fade_range,
            });
        }
        let threshold = self.reflections.blend_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ShadingConfigError::BlendThreshold(threshold));
        }
        if !(self.reflections.lod_steps > 0.0) {
            return Err(ShadingConfigError::LodSteps(self.reflections.lod_steps));
        }
        Ok(())
    }

    /// Copy with every out-of-range value clamped into range.
    pub fn sanitized(&self) -> Self {
        let mut config = *self;
        let shadows = &mut config.shadows;
        // f32::max/min drop NaN in favor of the bound.
        shadows.subtractive.shadow_strength = shadows.subtractive.shadow_strength.max(0.0).min(1.0);
        shadows.subtractive.shadow_color = shadows.subtractive.shadow_color.max(Vec3::ZERO);
        shadows.shadow_distance = shadows.shadow_distance.max(f32::EPSILON);
        shadows.fade_range = shadows.fade_range.max(f32::EPSILON).min(shadows.shadow_distance);

        let reflections = &mut config.reflections;
        if !(reflections.blend_threshold > 0.0 && reflections.blend_threshold <= 1.0) {
            reflections.blend_threshold = crate::reflection::DEFAULT_BLEND_THRESHOLD;
        }
        if !(reflections.lod_steps > 0.0) {
            reflections.lod_steps = crate::reflection::DEFAULT_LOD_STEPS;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ShadingConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_default_uses_sh_and_reflections() {
        let config = ShadingConfig::default();
        assert!(config.sh_ambient);
        assert!(config.reflections.enabled);
        assert!(config.static_lightmap.is_none());
        assert!(config.dynamic_lightmap.is_none());
    }

    #[test]
    fn test_shadow_strength_out_of_range() {
        let mut config = ShadingConfig::default();
        config.shadows.subtractive.shadow_strength = 1.5;
        assert_eq!(config.validate(), Err(ShadingConfigError::ShadowStrength(1.5)));
        assert_eq!(config.sanitized().shadows.subtractive.shadow_strength, 1.0);
        assert_eq!(config.sanitized().validate(), Ok(()));
    }

    #[test]
    fn test_negative_shadow_color() {
        let mut config = ShadingConfig::default();
        config.shadows.subtractive.shadow_color = Vec3::new(0.1, -0.2, 0.3);
        assert!(matches!(config.validate(), Err(ShadingConfigError::ShadowColor(_))));
        assert_eq!(
            config.sanitized().shadows.subtractive.shadow_color,
            Vec3::new(0.1, 0.0, 0.3)
        );
    }

    #[test]
    fn test_fade_range_longer_than_distance() {
        let mut config = ShadingConfig::default();
        config.shadows.fade_range = 500.0;
        assert!(matches!(config.validate(), Err(ShadingConfigError::FadeRange { .. })));
        let fixed = config.sanitized();
        assert_eq!(fixed.shadows.fade_range, fixed.shadows.shadow_distance);
    }

    #[test]
    fn test_bad_threshold_resets_to_default() {
        let mut config = ShadingConfig::default();
        config.reflections.blend_threshold = 0.0;
        assert_eq!(config.validate(), Err(ShadingConfigError::BlendThreshold(0.0)));
        assert_eq!(
            config.sanitized().reflections.blend_threshold,
            crate::reflection::DEFAULT_BLEND_THRESHOLD
        );
    }

    #[test]
    fn test_nan_lod_steps_rejected() {
        let mut config = ShadingConfig::default();
        config.reflections.lod_steps = f32::NAN;
        assert!(matches!(config.validate(), Err(ShadingConfigError::LodSteps(_))));
        assert_eq!(config.sanitized().reflections.lod_steps, 6.0);
    }

    #[test]
    fn test_ron_roundtrip() {
        let mut config = ShadingConfig {
            static_lightmap: Some(StaticLightmap {
                variant: LightmapVariant::Directional,
                encoding: LightmapEncoding::DoubleLdr,
            }),
            pass: RenderPass::DeferredGeometry,
            ..ShadingConfig::default()
        };
        config.shadows.subtractive_mixing = true;
        let text = ron::to_string(&config).unwrap();
        let parsed: ShadingConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let parsed: ShadingConfig =
            ron::from_str("(static_lightmap: Some((variant: Directional)), sh_ambient: false)")
                .unwrap();
        let lightmap = parsed.static_lightmap.unwrap();
        assert_eq!(lightmap.variant, LightmapVariant::Directional);
        assert_eq!(lightmap.encoding, LightmapEncoding::Rgbm);
        assert!(!parsed.sh_ambient);
        assert_eq!(parsed.reflections, ReflectionConfig::default());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ShadingConfigError::MissingTexture("shadow mask").to_string(),
            "shadow mask texture is not bound"
        );
        assert_eq!(
            ShadingConfigError::ShadowStrength(2.0).to_string(),
            "shadow strength 2 outside [0, 1]"
        );
    }
}
