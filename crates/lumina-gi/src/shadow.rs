//! Reconciling realtime shadows with baked lighting.
//!
//! Two concerns live here:
//!
//! - [`reconcile_subtractive`]: when the main light is baked into a lightmap
//!   but a realtime shadow must still darken the surface (subtractive mixed
//!   lighting), estimate the light the shadow removes and subtract it from
//!   the bake.
//! - [`ShadowFadeParams`]: the reference [`ShadowFade`] used to hand realtime
//!   shadows off to baked occlusion as distance from the camera grows.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::environment::ShadowFade;
use crate::light::DirectLight;

/// User-facing controls for subtractive shadows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtractiveShadow {
    /// Darkest color a shadowed lightmapped surface may reach.
    pub shadow_color: Vec3,
    /// 0 = full subtraction, 1 = shadows have no effect on the bake.
    pub shadow_strength: f32,
}

impl Default for SubtractiveShadow {
    fn default() -> Self {
        Self {
            shadow_color: Vec3::new(0.42, 0.48, 0.63),
            shadow_strength: 0.0,
        }
    }
}

/// Darken a baked diffuse value by the realtime shadow of the main light.
///
/// `main_light` is the unattenuated main light; `realtime_attenuation` is 1
/// when the point is fully lit. The result is never brighter than
/// `baked_diffuse` in any channel.
///
/// The caller must drop the live main light for this surface afterwards, or
/// the light is counted twice.
pub fn reconcile_subtractive(
    baked_diffuse: Vec3,
    realtime_attenuation: f32,
    main_light: &DirectLight,
    normal: Vec3,
    settings: &SubtractiveShadow,
) -> Vec3 {
    let ndotl = normal.dot(main_light.direction).max(0.0);
    let estimated = main_light.color * (ndotl * (1.0 - realtime_attenuation));
    let subtracted = baked_diffuse - estimated;
    let shadowed = subtracted.max(settings.shadow_color);
    let shadowed = shadowed.lerp(baked_diffuse, settings.shadow_strength);
    baked_diffuse.min(shadowed)
}

/// How realtime and baked attenuation are combined once the fade is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMixing {
    /// Interpolate from realtime toward baked as the fade grows.
    #[default]
    Lerp,
    /// Fade realtime shadows out, then keep the darker of the two. Used when
    /// the baked term already includes the main light's shadowing.
    MinWithFade,
}

/// Reference shadow fade: a ramp over `[shadow_distance - fade_range,
/// shadow_distance]` measured from `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFadeParams {
    /// Fade center, normally the camera position.
    pub center: Vec3,
    /// 0 = fade by view-space depth, 1 = fade by spherical distance.
    pub sphere_weight: f32,
    /// Ramp slope (`1 / fade_range`).
    pub scale: f32,
    /// Ramp offset.
    pub bias: f32,
    pub mixing: ShadowMixing,
}

impl ShadowFadeParams {
    /// Build the ramp so the fade is 0 before `shadow_distance - fade_range`
    /// and 1 at `shadow_distance`.
    pub fn new(
        center: Vec3,
        shadow_distance: f32,
        fade_range: f32,
        spherical: bool,
        mixing: ShadowMixing,
    ) -> Self {
        let fade_range = fade_range.max(f32::EPSILON);
        let scale = 1.0 / fade_range;
        Self {
            center,
            sphere_weight: if spherical { 1.0 } else { 0.0 },
            scale,
            bias: -(shadow_distance - fade_range) * scale,
            mixing,
        }
    }
}

impl ShadowFade for ShadowFadeParams {
    fn fade_distance(&self, world_pos: Vec3, view_z: f32) -> f32 {
        let sphere_dist = (world_pos - self.center).length();
        view_z + (sphere_dist - view_z) * self.sphere_weight
    }

    fn fade(&self, distance: f32) -> f32 {
        (distance * self.scale + self.bias).clamp(0.0, 1.0)
    }

    fn mix(&self, realtime: f32, baked: f32, fade: f32) -> f32 {
        match self.mixing {
            ShadowMixing::Lerp => realtime + (baked - realtime) * fade,
            ShadowMixing::MinWithFade => (realtime + fade).clamp(0.0, 1.0).min(baked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sun() -> DirectLight {
        DirectLight::new(Vec3::new(1.0, 0.9, 0.8), Vec3::Y)
    }

    #[test]
    fn test_unshadowed_returns_bake_unchanged() {
        let baked = Vec3::new(0.7, 0.6, 0.5);
        let settings = SubtractiveShadow {
            shadow_color: Vec3::ZERO,
            shadow_strength: 0.0,
        };
        let result = reconcile_subtractive(baked, 1.0, &sun(), Vec3::Y, &settings);
        assert_eq!(result, baked);
    }

    #[test]
    fn test_never_brightens_the_bake() {
        let baked = Vec3::new(0.3, 0.5, 0.05);
        let normals = [Vec3::Y, Vec3::X, -Vec3::Y, Vec3::new(1.0, 1.0, 0.0).normalize()];
        for &normal in &normals {
            for a in 0..=4 {
                for s in 0..=4 {
                    for c in 0..=4 {
                        let settings = SubtractiveShadow {
                            shadow_color: Vec3::splat(c as f32 * 0.25),
                            shadow_strength: s as f32 * 0.25,
                        };
                        let atten = a as f32 * 0.25;
                        let result = reconcile_subtractive(baked, atten, &sun(), normal, &settings);
                        assert!(
                            result.cmple(baked).all(),
                            "{result:?} brighter than {baked:?} (atten {atten}, {settings:?})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_full_shadow_clamps_to_shadow_color() {
        let baked = Vec3::splat(0.5);
        let settings = SubtractiveShadow {
            shadow_color: Vec3::splat(0.1),
            shadow_strength: 0.0,
        };
        let light = DirectLight::new(Vec3::ONE, Vec3::Y);
        let result = reconcile_subtractive(baked, 0.0, &light, Vec3::Y, &settings);
        assert!((result - Vec3::splat(0.1)).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_strength_one_ignores_shadow() {
        let baked = Vec3::splat(0.5);
        let settings = SubtractiveShadow {
            shadow_color: Vec3::ZERO,
            shadow_strength: 1.0,
        };
        let result = reconcile_subtractive(baked, 0.0, &sun(), Vec3::Y, &settings);
        assert_eq!(result, baked);
    }

    #[test]
    fn test_back_facing_surface_is_not_darkened() {
        let baked = Vec3::splat(0.5);
        let settings = SubtractiveShadow {
            shadow_color: Vec3::ZERO,
            shadow_strength: 0.0,
        };
        let result = reconcile_subtractive(baked, 0.0, &sun(), -Vec3::Y, &settings);
        assert_eq!(result, baked);
    }

    #[test]
    fn test_fade_ramp() {
        let fade = ShadowFadeParams::new(Vec3::ZERO, 100.0, 20.0, false, ShadowMixing::Lerp);
        assert_eq!(fade.fade(50.0), 0.0);
        assert!((fade.fade(90.0) - 0.5).abs() < 1e-5);
        assert_eq!(fade.fade(150.0), 1.0);
    }

    #[test]
    fn test_fade_distance_modes() {
        let pos = Vec3::new(3.0, 4.0, 0.0);
        let planar = ShadowFadeParams::new(Vec3::ZERO, 100.0, 20.0, false, ShadowMixing::Lerp);
        let sphere = ShadowFadeParams::new(Vec3::ZERO, 100.0, 20.0, true, ShadowMixing::Lerp);
        assert_eq!(planar.fade_distance(pos, 2.0), 2.0);
        assert!((sphere.fade_distance(pos, 2.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_mix_modes() {
        let lerp = ShadowFadeParams::new(Vec3::ZERO, 100.0, 20.0, false, ShadowMixing::Lerp);
        assert_eq!(lerp.mix(0.0, 1.0, 0.0), 0.0);
        assert_eq!(lerp.mix(0.0, 1.0, 1.0), 1.0);
        assert!((lerp.mix(0.2, 0.6, 0.5) - 0.4).abs() < 1e-6);

        let min = ShadowFadeParams::new(Vec3::ZERO, 100.0, 20.0, false, ShadowMixing::MinWithFade);
        // Faded out realtime shadow leaves the baked attenuation.
        assert_eq!(min.mix(0.0, 0.3, 1.0), 0.3);
        // Close to the camera the darker realtime shadow wins.
        assert_eq!(min.mix(0.1, 0.8, 0.0), 0.1);
    }
}
