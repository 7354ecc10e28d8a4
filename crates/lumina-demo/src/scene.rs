//! Procedural test scene: a lightmapped ground plane under a row of
//! probe-lit spheres, a sun, and a gradient sky.

use glam::{Vec2, Vec3, Vec4};
use lumina_gi::lightmap::{DOUBLE_LDR_RANGE, RGBM_RANGE};
use lumina_gi::{Cubemap, DirectLight, HdrDecode, LightmapEncoding, ReflectionProbe, ShL2};

/// Half extent of the ground plane and of its lightmap.
pub const GROUND_EXTENT: f32 = 8.0;

/// Shortest direction vector the baker writes, so the direction survives
/// on texels lit by sky alone.
const MIN_ENCODED_DIRECTIONALITY: f32 = 0.01;

/// Sky gradient with a blur that grows with the mip level.
#[derive(Debug, Clone, Copy)]
pub struct SkyCubemap {
    pub zenith: Vec3,
    pub horizon: Vec3,
    pub ground: Vec3,
    pub max_mip: f32,
}

impl SkyCubemap {
    fn average(&self) -> Vec3 {
        (self.zenith + self.horizon * 2.0 + self.ground) * 0.25
    }
}

impl Cubemap for SkyCubemap {
    fn sample_level(&self, direction: Vec3, mip: f32) -> Vec4 {
        let y = direction.normalize_or_zero().y;
        let sharp = if y >= 0.0 {
            self.horizon.lerp(self.zenith, y.sqrt())
        } else {
            self.horizon.lerp(self.ground, (-y).sqrt())
        };
        let blur = (mip / self.max_mip).clamp(0.0, 1.0);
        sharp.lerp(self.average(), blur).extend(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub albedo: Vec3,
}

impl Sphere {
    /// Distance along a unit ray to the nearest hit in front of the origin.
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let oc = origin - self.center;
        let b = oc.dot(dir);
        let c = oc.length_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        [-b - root, -b + root].into_iter().find(|t| *t > 1e-4)
    }
}

/// What a camera ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    Ground,
    Sphere(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub surface: Surface,
    pub position: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

pub struct Scene {
    pub sun: DirectLight,
    pub sky: SkyCubemap,
    pub ambient: ShL2,
    pub spheres: Vec<Sphere>,
    /// Cubemaps captured for the left and right half of the scene.
    pub west_capture: SkyCubemap,
    pub east_capture: SkyCubemap,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let sun_dir = Vec3::new(0.45, 0.8, 0.35).normalize();
        let sky = SkyCubemap {
            zenith: Vec3::new(0.25, 0.45, 0.9),
            horizon: Vec3::new(0.7, 0.75, 0.8),
            ground: Vec3::new(0.2, 0.18, 0.15),
            max_mip: lumina_gi::reflection::DEFAULT_LOD_STEPS,
        };

        let mut ambient = ShL2::ambient(sky.horizon * 0.3);
        ambient.add_directional(Vec3::Y, sky.zenith * 0.8);
        ambient.add_directional(-Vec3::Y, sky.ground * 0.5);

        let spheres = (0..5)
            .map(|i| {
                let x = -4.0 + i as f32 * 2.0;
                let hue = i as f32 / 4.0;
                Sphere {
                    center: Vec3::new(x, 0.8, 0.0),
                    radius: 0.8,
                    albedo: Vec3::new(0.9 - 0.6 * hue, 0.4 + 0.3 * hue, 0.3 + 0.6 * hue),
                }
            })
            .collect();

        Self {
            sun: DirectLight::new(Vec3::new(3.0, 2.85, 2.55), sun_dir),
            sky,
            ambient,
            spheres,
            west_capture: SkyCubemap {
                horizon: Vec3::new(0.85, 0.7, 0.55),
                ..sky
            },
            east_capture: SkyCubemap {
                horizon: Vec3::new(0.55, 0.7, 0.85),
                ..sky
            },
        }
    }

    /// Nearest surface along a unit ray.
    pub fn trace(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        let mut best: Option<Hit> = None;

        if dir.y < -1e-6 {
            let t = -origin.y / dir.y;
            let p = origin + dir * t;
            if p.x.abs() <= GROUND_EXTENT && p.z.abs() <= GROUND_EXTENT {
                best = Some(Hit {
                    surface: Surface::Ground,
                    position: p,
                    normal: Vec3::Y,
                    distance: t,
                });
            }
        }

        for (i, sphere) in self.spheres.iter().enumerate() {
            if let Some(t) = sphere.intersect(origin, dir)
                && best.is_none_or(|hit| t < hit.distance)
            {
                let p = origin + dir * t;
                best = Some(Hit {
                    surface: Surface::Sphere(i),
                    position: p,
                    normal: (p - sphere.center) / sphere.radius,
                    distance: t,
                });
            }
        }
        best
    }

    /// 1 when `point` sees the sun, 0 when a sphere blocks it.
    pub fn sun_visibility(&self, point: Vec3) -> f32 {
        let origin = point + self.sun.direction * 1e-3;
        let blocked = self
            .spheres
            .iter()
            .any(|s| s.intersect(origin, self.sun.direction).is_some());
        if blocked { 0.0 } else { 1.0 }
    }

    /// Albedo of the hit surface.
    pub fn albedo(&self, hit: &Hit) -> Vec3 {
        match hit.surface {
            Surface::Ground => {
                let cell = (hit.position.x.floor() + hit.position.z.floor()) as i32;
                if cell.rem_euclid(2) == 0 {
                    Vec3::splat(0.7)
                } else {
                    Vec3::splat(0.45)
                }
            }
            Surface::Sphere(i) => self.spheres[i].albedo,
        }
    }

    /// Rough sky visibility of a ground point next to the spheres.
    fn ground_sky_visibility(&self, point: Vec3) -> f32 {
        self.spheres
            .iter()
            .map(|s| {
                let d = (point - s.center).length() / s.radius;
                (1.0 - 0.5 / (d * d)).clamp(0.3, 1.0)
            })
            .product()
    }

    /// World position of a ground lightmap texel.
    pub fn ground_point(uv: Vec2) -> Vec3 {
        let xz = (uv * 2.0 - Vec2::ONE) * GROUND_EXTENT;
        Vec3::new(xz.x, 0.0, xz.y)
    }

    /// Lightmap UV of a ground point.
    pub fn ground_uv(point: Vec3) -> Vec2 {
        (Vec2::new(point.x, point.z) / GROUND_EXTENT + Vec2::ONE) * 0.5
    }

    /// Baked ground irradiance split into (sky, sun). The sun term is only
    /// meaningful when the sun is baked.
    fn ground_irradiance(&self, uv: Vec2) -> (Vec3, Vec3) {
        let p = Self::ground_point(uv);
        let sky = self.ambient.irradiance(Vec3::Y) * self.ground_sky_visibility(p);
        let sun = self.sun.color * self.sun.direction.y.max(0.0) * self.sun_visibility(p);
        (sky, sun)
    }

    /// Encoded static lightmap color texel.
    pub fn bake_color(&self, uv: Vec2, encoding: LightmapEncoding, bake_sun: bool) -> Vec4 {
        let (sky, sun) = self.ground_irradiance(uv);
        let sun = if bake_sun { sun } else { Vec3::ZERO };
        encode_lightmap(sky + sun, encoding)
    }

    /// Encoded dominant-direction texel. Points between the sun and the sky
    /// by their share of the bake; the sun's share sets the vector length.
    pub fn bake_direction(&self, uv: Vec2, bake_sun: bool) -> Vec4 {
        let (sky, sun) = self.ground_irradiance(uv);
        let sky = sky.element_sum();
        let sun = if bake_sun { sun.element_sum() } else { 0.0 };
        let dominant = (self.sun.direction * sun + Vec3::Y * sky).normalize_or(Vec3::Y);
        let directionality = (sun / (sun + sky).max(1e-6)).max(MIN_ENCODED_DIRECTIONALITY);
        pack_signed(dominant * directionality)
    }

    /// Shadow mask texel, main light occlusion in the red channel.
    pub fn bake_shadow_mask(&self, uv: Vec2) -> Vec4 {
        Vec4::new(self.sun_visibility(Self::ground_point(uv)), 1.0, 1.0, 1.0)
    }

    /// Realtime GI texel: sunlight bounced off the spheres onto the ground.
    pub fn realtime_bounce(&self, uv: Vec2) -> Vec4 {
        let p = Self::ground_point(uv);
        let bounce: Vec3 = self
            .spheres
            .iter()
            .map(|s| {
                let d = (p - s.center).length().max(s.radius);
                s.albedo * self.sun.color * (0.05 * s.radius * s.radius / (d * d))
            })
            .sum();
        bounce.extend(1.0)
    }

    pub fn probes(&self) -> [ReflectionProbe<'_>; 2] {
        let half = |center_x: f32| {
            (
                Vec3::new(center_x, 2.0, 0.0),
                Vec3::new(center_x - GROUND_EXTENT * 0.5, 0.0, -GROUND_EXTENT),
                Vec3::new(center_x + GROUND_EXTENT * 0.5, 6.0, GROUND_EXTENT),
            )
        };
        let (west_pos, west_min, west_max) = half(-GROUND_EXTENT * 0.5);
        let (east_pos, east_min, east_max) = half(GROUND_EXTENT * 0.5);
        [
            ReflectionProbe {
                cubemap: &self.west_capture,
                hdr: HdrDecode::LINEAR,
                position: west_pos,
                box_min: west_min,
                box_max: west_max,
                box_projection: true,
            },
            ReflectionProbe {
                cubemap: &self.east_capture,
                hdr: HdrDecode::LINEAR,
                position: east_pos,
                box_min: east_min,
                box_max: east_max,
                box_projection: true,
            },
        ]
    }
}

/// Weight of the west probe at `x`; fades across the middle of the scene.
pub fn probe_blend(x: f32) -> f32 {
    let t = ((x + 1.5) / 3.0).clamp(0.0, 1.0);
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// Store linear irradiance the way a baker would for `encoding`.
pub fn encode_lightmap(color: Vec3, encoding: LightmapEncoding) -> Vec4 {
    let color = color.max(Vec3::ZERO);
    match encoding {
        LightmapEncoding::Hdr => color.extend(1.0),
        LightmapEncoding::DoubleLdr => (color / DOUBLE_LDR_RANGE).min(Vec3::ONE).extend(1.0),
        LightmapEncoding::Rgbm => {
            let exponent = HdrDecode::rgbm(RGBM_RANGE).exponent;
            let scale = (color.max_element() / RGBM_RANGE).clamp(1e-6, 1.0);
            let alpha = scale.powf(1.0 / exponent).max(1.0 / 255.0);
            let rgb = color / (RGBM_RANGE * alpha.powf(exponent));
            rgb.min(Vec3::ONE).extend(alpha)
        }
    }
}

fn pack_signed(v: Vec3) -> Vec4 {
    ((v + Vec3::ONE) * 0.5).extend(1.0)
}
