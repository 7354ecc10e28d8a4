//! Base illumination: main light, SH ambient and lightmaps.
//!
//! [`compose_base`] produces everything in [`CombinedIllumination`] except
//! indirect specular. The steps run in a fixed order:
//!
//! 1. Blend realtime attenuation with baked occlusion (shadow mask or
//!    distance fade), when the batch asks for it.
//! 2. Attenuate the main light.
//! 3. Seed indirect diffuse from the SH probe.
//! 4. Add the static lightmap, then hand the main light to it according to
//!    the batch's [`MainLightRoute`]. A shadow-corrected bake is folded into
//!    indirect diffuse whole before the realtime shadow is subtracted.
//! 5. Add the dynamic lightmap. It never carries the main light.
//! 6. Apply ambient occlusion to indirect diffuse.

use glam::Vec3;

use crate::batch::{MainLightRoute, ShadingBatch};
use crate::environment::ShadowFade;
use crate::input::IlluminationInput;
use crate::light::{CombinedIllumination, DirectLight};
use crate::lightmap::{LightmapVariant, decode_directional};
use crate::shadow::reconcile_subtractive;

/// Realtime attenuation mixed with the baked occlusion of the main light.
fn blended_attenuation(input: &IlluminationInput<'_>, batch: &ShadingBatch) -> f32 {
    let shadows = &batch.config().shadows;
    let baked = match input.lightmaps.shadow_mask {
        Some(mask) if shadows.shadow_mask => mask
            .sample(input.lightmap_uv)
            .dot(shadows.occlusion_mask_selector)
            .clamp(0.0, 1.0),
        _ => 1.0,
    };

    match input.shadow_fade {
        Some(fade) => mix_faded(fade, input, baked),
        None => mix_faded(&batch.shadow_fade(input.view.camera_position), input, baked),
    }
}

fn mix_faded(fade: &dyn ShadowFade, input: &IlluminationInput<'_>, baked: f32) -> f32 {
    let view_z = input.view.view_z(input.world_pos);
    let distance = fade.fade_distance(input.world_pos, view_z);
    fade.mix(input.attenuation, baked, fade.fade(distance))
}

/// Compose the main light, SH ambient and lightmaps for one shading point.
///
/// `occlusion` is the ambient occlusion in \[0, 1\] and `normal` the unit
/// world-space shading normal.
pub fn compose_base(
    input: &IlluminationInput<'_>,
    occlusion: f32,
    normal: Vec3,
    batch: &ShadingBatch,
) -> CombinedIllumination {
    let config = batch.config();
    let mut gi = CombinedIllumination::default();

    let attenuation = if batch.blends_shadows_in_gi() {
        blended_attenuation(input, batch)
    } else {
        input.attenuation
    };

    gi.light = input.light.attenuated(attenuation);

    if batch.samples_sh()
        && let Some(ambient) = input.ambient
    {
        gi.indirect.diffuse = ambient.evaluate(normal, input.world_pos);
    }

    if let Some(lightmap) = &config.static_lightmap
        && let Some(color_tex) = input.lightmaps.static_color
    {
        let uv = input.lightmap_uv;
        let color = lightmap.encoding.decode(color_tex.sample(uv));
        match (lightmap.variant, input.lightmaps.static_direction) {
            (LightmapVariant::Directional, Some(dir_tex)) => {
                let (ambient, light) =
                    decode_directional(color, dir_tex.sample(uv), normal, None);
                gi.indirect.diffuse += ambient;
                gi.static_lightmap_light = light;
            }
            _ => gi.indirect.diffuse += color,
        }

        match batch.route() {
            MainLightRoute::Live => {}
            MainLightRoute::Baked => gi.light = DirectLight::ZERO,
            MainLightRoute::BakedShadowCorrected => {
                gi.light = DirectLight::ZERO;
                // Shadow the directional part together with the rest of the bake.
                let baked = gi.static_lightmap_light;
                gi.indirect.diffuse += baked.color * baked.ndotl;
                gi.static_lightmap_light = DirectLight::ZERO;
                gi.indirect.diffuse = reconcile_subtractive(
                    gi.indirect.diffuse,
                    attenuation,
                    &input.light,
                    normal,
                    &config.shadows.subtractive,
                );
            }
        }
    }

    if let Some(lightmap) = &config.dynamic_lightmap
        && let Some(color_tex) = input.lightmaps.dynamic_color
    {
        let uv = input.dynamic_lightmap_uv;
        let color = lightmap.decode.decode(color_tex.sample(uv));
        match (lightmap.variant, input.lightmaps.dynamic_direction) {
            (LightmapVariant::Directional, Some(dir_tex)) => {
                let captured_normal = input.lightmaps.dynamic_normal.map(|tex| tex.sample(uv));
                let (ambient, light) =
                    decode_directional(color, dir_tex.sample(uv), normal, captured_normal);
                gi.indirect.diffuse += ambient;
                gi.dynamic_lightmap_light = light;
            }
            _ => gi.indirect.diffuse += color,
        }
    }

    gi.indirect.diffuse *= occlusion;
    gi
}
