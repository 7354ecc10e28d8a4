//! Lightmap texel decoding, including the directional split.
//!
//! Baked lightmaps arrive in one of the [`LightmapEncoding`]s, realtime GI
//! lightmaps through a [`RealtimeDecode`]. Directional variants carry a second
//! texture whose xyz encodes the dominant incoming direction and whose length
//! encodes how directional the light is; [`decode_directional`] splits the
//! decoded color into an ambient part and a directional [`DirectLight`].

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::light::DirectLight;

/// Smallest directionality accepted before dividing by it.
pub const MIN_DIRECTIONALITY: f32 = 0.001;

/// Smallest cosine accepted when undoing the N·L weighting of realtime
/// directional lightmaps.
pub const MIN_REALTIME_COSINE: f32 = 0.125;

/// Linear-space range of a double-LDR lightmap (2.0 ^ 2.2).
pub const DOUBLE_LDR_RANGE: f32 = 4.59;

/// Linear-space range of an RGBM lightmap (5.0 ^ 2.2).
pub const RGBM_RANGE: f32 = 34.493242;

/// Whether a lightmap stores a direction texture next to its color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightmapVariant {
    /// Color only.
    #[default]
    NonDirectional,
    /// Color plus dominant-direction texture.
    Directional,
}

/// HDR decode instructions: `multiplier * alpha' ^ exponent * rgb` with
/// `alpha' = alpha_weight * (a - 1) + 1`.
///
/// An `alpha_weight` of 0 ignores the alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdrDecode {
    /// Overall range multiplier.
    pub multiplier: f32,
    /// Exponent applied to the alpha term.
    pub exponent: f32,
    /// 1 = alpha carries a range scale (RGBM), 0 = alpha ignored.
    pub alpha_weight: f32,
}

impl Default for HdrDecode {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl HdrDecode {
    /// Pass-through decode for textures already stored as linear HDR.
    pub const LINEAR: Self = Self {
        multiplier: 1.0,
        exponent: 1.0,
        alpha_weight: 0.0,
    };

    /// RGBM decode with the given linear-space range.
    pub fn rgbm(range: f32) -> Self {
        Self {
            multiplier: range,
            exponent: 2.2,
            alpha_weight: 1.0,
        }
    }

    /// Decode a texel into linear RGB.
    pub fn decode(&self, texel: Vec4) -> Vec3 {
        let alpha = self.alpha_weight * (texel.w - 1.0) + 1.0;
        texel.truncate() * (self.multiplier * alpha.powf(self.exponent))
    }
}

/// Storage encoding of a baked lightmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightmapEncoding {
    /// `rgb * 2` in gamma space.
    DoubleLdr,
    /// RGB scaled by a range stored in alpha.
    #[default]
    Rgbm,
    /// Linear half-float, read as-is.
    Hdr,
}

impl LightmapEncoding {
    /// Decode instructions equivalent to this encoding.
    pub fn instructions(self) -> HdrDecode {
        match self {
            Self::DoubleLdr => HdrDecode {
                multiplier: DOUBLE_LDR_RANGE,
                exponent: 1.0,
                alpha_weight: 0.0,
            },
            Self::Rgbm => HdrDecode::rgbm(RGBM_RANGE),
            Self::Hdr => HdrDecode::LINEAR,
        }
    }

    /// Decode a baked lightmap texel into linear RGB.
    pub fn decode(self, texel: Vec4) -> Vec3 {
        self.instructions().decode(texel)
    }
}

/// Decode parameters for realtime GI lightmaps: `(scale * a * rgb) ^ exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeDecode {
    pub scale: f32,
    pub exponent: f32,
}

impl Default for RealtimeDecode {
    fn default() -> Self {
        Self {
            scale: 1.0,
            exponent: 1.0,
        }
    }
}

impl RealtimeDecode {
    pub fn decode(&self, texel: Vec4) -> Vec3 {
        (texel.truncate() * (self.scale * texel.w)).powf(self.exponent)
    }
}

/// Unpack a \[0, 1\] texture-space vector into \[-1, 1\].
fn unpack_signed(encoded: Vec4) -> Vec3 {
    encoded.truncate() * 2.0 - Vec3::ONE
}

/// Split a decoded directional lightmap color into ambient and directional
/// parts.
///
/// `realtime_normal` is `Some` only for realtime (dynamic) directional
/// lightmaps: those captures are cosine-weighted against the stored normal,
/// so the color is divided by `max(0.125, N_rt·L)` first. Baked captures are
/// stored already divided.
///
/// Returns the ambient part, to be added straight to indirect diffuse, and
/// the directional part as a [`DirectLight`] pointing along the decoded
/// dominant direction.
///
/// The ambient part is multiplied by `saturate(N·L)`. This is not physically
/// correct for ambient light; it hides the jagged light edge at silhouettes
/// and lets normal maps show on otherwise flat baked light.
pub fn decode_directional(
    color: Vec3,
    encoded_direction: Vec4,
    normal: Vec3,
    realtime_normal: Option<Vec4>,
) -> (Vec3, DirectLight) {
    let dir = unpack_signed(encoded_direction);
    let directionality = dir.length().max(MIN_DIRECTIONALITY);
    let dir = dir / directionality;

    let color = match realtime_normal {
        Some(encoded) => {
            let captured_normal = unpack_signed(encoded);
            color / captured_normal.dot(dir).max(MIN_REALTIME_COSINE)
        }
        None => color,
    };

    let ndotl = normal.dot(dir).clamp(0.0, 1.0);
    let light = DirectLight {
        color: color * directionality,
        direction: dir,
        ndotl,
    };
    let ambient = color * (1.0 - directionality) * ndotl;
    (ambient, light)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a signed direction into texture range.
    fn encode(dir: Vec3) -> Vec4 {
        ((dir + Vec3::ONE) * 0.5).extend(1.0)
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_fully_directional_has_no_ambient() {
        let (ambient, light) = decode_directional(Vec3::ONE, encode(Vec3::Y), Vec3::Y, None);
        assert!(approx(ambient, Vec3::ZERO), "ambient was {ambient:?}");
        assert!(approx(light.color, Vec3::ONE));
        assert!(approx(light.direction, Vec3::Y));
        assert!((light.ndotl - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_energy_split_for_all_directionalities() {
        let color = Vec3::new(0.8, 0.4, 0.2);
        for step in 1..=10 {
            let directionality = step as f32 / 10.0;
            let (ambient, light) =
                decode_directional(color, encode(Vec3::Y * directionality), Vec3::Y, None);
            // Normal aligned with the direction, so the cosine fudge is 1.
            assert!(
                approx(ambient + light.color, color),
                "directionality {directionality}: {:?} + {:?} != {color:?}",
                ambient,
                light.color
            );
        }
    }

    #[test]
    fn test_energy_split_with_cosine_fudge() {
        let color = Vec3::splat(1.0);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let (ambient, light) = decode_directional(color, encode(Vec3::Y * 0.5), normal, None);
        let cos = normal.dot(Vec3::Y);
        assert!(approx(ambient, color * 0.5 * cos));
        assert!(approx(light.color, color * 0.5));
    }

    #[test]
    fn test_zero_direction_is_floored() {
        let (ambient, light) = decode_directional(Vec3::ONE, encode(Vec3::ZERO), Vec3::Y, None);
        assert!(ambient.is_finite());
        assert!(light.color.is_finite());
        assert!(light.color.max_element() <= MIN_DIRECTIONALITY + 1e-6);
    }

    #[test]
    fn test_back_facing_ambient_is_clamped() {
        let (ambient, _) = decode_directional(Vec3::ONE, encode(Vec3::Y * 0.5), -Vec3::Y, None);
        assert_eq!(ambient, Vec3::ZERO);
    }

    #[test]
    fn test_realtime_normal_rescales_color() {
        let normal_at_45 = Vec3::new(1.0, 1.0, 0.0).normalize();
        let (_, light) =
            decode_directional(Vec3::ONE, encode(Vec3::Y), Vec3::Y, Some(encode(normal_at_45)));
        let expected = 1.0 / normal_at_45.dot(Vec3::Y);
        assert!((light.color.x - expected).abs() < 1e-3);
    }

    #[test]
    fn test_realtime_rescale_is_floored() {
        let (_, light) =
            decode_directional(Vec3::ONE, encode(Vec3::Y), Vec3::Y, Some(encode(-Vec3::Y)));
        assert!((light.color.x - 1.0 / MIN_REALTIME_COSINE).abs() < 1e-3);
    }

    #[test]
    fn test_encoding_decode() {
        let texel = Vec4::new(0.5, 0.25, 0.0, 1.0);
        assert!(approx(LightmapEncoding::Hdr.decode(texel), Vec3::new(0.5, 0.25, 0.0)));
        assert!(approx(
            LightmapEncoding::DoubleLdr.decode(texel),
            Vec3::new(0.5, 0.25, 0.0) * DOUBLE_LDR_RANGE
        ));
        assert!(approx(
            LightmapEncoding::Rgbm.decode(texel),
            Vec3::new(0.5, 0.25, 0.0) * RGBM_RANGE
        ));
    }

    #[test]
    fn test_rgbm_alpha_scales_range() {
        let full = LightmapEncoding::Rgbm.decode(Vec4::new(1.0, 1.0, 1.0, 1.0));
        let half = LightmapEncoding::Rgbm.decode(Vec4::new(1.0, 1.0, 1.0, 0.5));
        let ratio = half.x / full.x;
        assert!((ratio - 0.5f32.powf(2.2)).abs() < 1e-5);
    }

    #[test]
    fn test_realtime_decode_identity_by_default() {
        let texel = Vec4::new(0.3, 0.6, 0.9, 1.0);
        assert!(approx(RealtimeDecode::default().decode(texel), texel.truncate()));
    }
}
