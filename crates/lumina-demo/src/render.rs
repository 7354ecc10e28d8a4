//! CPU rendering of the test scene through the illumination composer.

use std::path::Path;
use std::time::Instant;

use glam::{Vec2, Vec3, Vec4};
use lumina_config::DemoConfig;
use lumina_gi::{
    CombinedIllumination, Cubemap, DirectLight, IlluminationInput, LightmapTextures, ProbeSet,
    ShadingBatch, ShadingConfig, ShadingConfigError, ViewParams, compose_legacy_smoothness,
};

use crate::scene::{Hit, Scene, Surface, probe_blend};

/// Pinhole camera.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    tan_half_fov: f32,
}

impl Camera {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_degrees: f32) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        Self {
            position,
            forward,
            right,
            up,
            tan_half_fov: (fov_y_degrees.to_radians() * 0.5).tan(),
        }
    }

    /// Unit ray through the center of pixel (`x`, `y`).
    pub fn ray(&self, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
        let aspect = width as f32 / height as f32;
        let ndc = Vec2::new(
            (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
            1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
        );
        let offset = ndc * self.tan_half_fov * Vec2::new(aspect, 1.0);
        (self.forward + self.right * offset.x + self.up * offset.y).normalize()
    }

    pub fn view_params(&self) -> ViewParams {
        ViewParams {
            camera_position: self.position,
            view_z_axis: -self.forward,
        }
    }
}

/// A rendered HDR frame in row-major order.
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

/// Summary of a rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub mean_luminance: f32,
    pub peak_luminance: f32,
}

impl Frame {
    pub fn stats(&self) -> FrameStats {
        let mut stats = FrameStats::default();
        let mut sum = 0.0;
        for p in &self.pixels {
            let l = luminance(*p);
            sum += l;
            stats.peak_luminance = stats.peak_luminance.max(l);
        }
        if !self.pixels.is_empty() {
            stats.mean_luminance = sum / self.pixels.len() as f32;
        }
        stats
    }

    /// Write the frame as an 8-bit sRGB-ish PNG after Reinhard tonemapping.
    pub fn save_png(&self, path: &Path, exposure: f32) -> image::ImageResult<()> {
        let image = image::RgbImage::from_fn(self.width, self.height, |x, y| {
            let hdr = self.pixels[(y * self.width + x) as usize];
            image::Rgb(tonemap(hdr, exposure))
        });
        image.save(path)
    }
}

fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

/// Reinhard tonemap and 1/2.2 gamma to 8-bit.
pub fn tonemap(hdr: Vec3, exposure: f32) -> [u8; 3] {
    let c = hdr.max(Vec3::ZERO) * exposure;
    let mapped = (c / (Vec3::ONE + c)).powf(1.0 / 2.2);
    let bytes = (mapped * 255.0 + Vec3::splat(0.5)).clamp(Vec3::ZERO, Vec3::splat(255.0));
    [bytes.x as u8, bytes.y as u8, bytes.z as u8]
}

/// Renders the scene with one batch for the lightmapped ground and one for
/// the probe-lit spheres.
pub struct Renderer<'s> {
    scene: &'s Scene,
    camera: Camera,
    ground: ShadingBatch,
    objects: ShadingBatch,
    occlusion: f32,
    smoothness: f32,
}

impl<'s> Renderer<'s> {
    pub fn new(scene: &'s Scene, shading: &ShadingConfig, demo: &DemoConfig) -> Self {
        let ground = ShadingBatch::new(shading);
        let objects = ShadingBatch::new(&ShadingConfig {
            static_lightmap: None,
            dynamic_lightmap: None,
            ..*shading
        });
        tracing::info!(
            ground_route = ?ground.route(),
            ground_sh = ground.samples_sh(),
            objects_sh = objects.samples_sh(),
            "shading batches ready"
        );

        Self {
            scene,
            camera: Camera::look_at(Vec3::new(0.0, 3.0, 9.0), Vec3::new(0.0, 0.5, 0.0), 50.0),
            ground,
            objects,
            occlusion: demo.occlusion.clamp(0.0, 1.0),
            smoothness: demo.smoothness.clamp(0.0, 1.0),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Bind the procedural ground lightmaps and hand them to `f`.
    pub fn with_ground_textures<R>(&self, f: impl FnOnce(&LightmapTextures<'_>) -> R) -> R {
        let scene = self.scene;
        let encoding = self
            .ground
            .config()
            .static_lightmap
            .map(|lightmap| lightmap.encoding)
            .unwrap_or_default();
        let bake_sun = self.ground.route().is_baked();

        let static_color = move |uv: Vec2| scene.bake_color(uv, encoding, bake_sun);
        let static_direction = move |uv: Vec2| scene.bake_direction(uv, bake_sun);
        let shadow_mask = move |uv: Vec2| scene.bake_shadow_mask(uv);
        let bounce = move |uv: Vec2| scene.realtime_bounce(uv);
        let up = |_: Vec2| Vec4::new(0.5, 1.0, 0.5, 1.0);

        f(&LightmapTextures {
            static_color: Some(&static_color),
            static_direction: Some(&static_direction),
            shadow_mask: Some(&shadow_mask),
            dynamic_color: Some(&bounce),
            // Bounce light arrives mostly from straight above.
            dynamic_direction: Some(&up),
            dynamic_normal: Some(&up),
        })
    }

    /// Render a `width` x `height` frame using `threads` workers, each taking
    /// a band of rows.
    pub fn render(
        &self,
        width: u32,
        height: u32,
        threads: usize,
    ) -> Result<Frame, ShadingConfigError> {
        self.with_ground_textures(|textures| -> Result<Frame, ShadingConfigError> {
            textures.check(self.ground.config())?;

            let width = width.max(1);
            let height = height.max(1);
            let threads = threads.clamp(1, height as usize);
            let rows_per_band = (height as usize).div_ceil(threads);
            let mut pixels = vec![Vec3::ZERO; width as usize * height as usize];

            let start = Instant::now();
            std::thread::scope(|s| {
                for (band, chunk) in pixels.chunks_mut(rows_per_band * width as usize).enumerate() {
                    s.spawn(move || {
                        let first_row = band * rows_per_band;
                        for (i, pixel) in chunk.iter_mut().enumerate() {
                            let x = (i % width as usize) as u32;
                            let y = (first_row + i / width as usize) as u32;
                            *pixel = self.shade_pixel(x, y, width, height, textures);
                        }
                    });
                }
            });
            tracing::debug!(
                threads,
                rows_per_band,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "frame rendered"
            );

            Ok(Frame {
                width,
                height,
                pixels,
            })
        })
    }

    fn shade_pixel(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        textures: &LightmapTextures<'_>,
    ) -> Vec3 {
        let dir = self.camera.ray(x, y, width, height);
        match self.scene.trace(self.camera.position, dir) {
            Some(hit) => self.shade_hit(&hit, dir, textures),
            None => self.scene.sky.sample_level(dir, 0.0).truncate(),
        }
    }

    /// Shade one surface hit.
    pub fn shade_hit(&self, hit: &Hit, dir: Vec3, textures: &LightmapTextures<'_>) -> Vec3 {
        let gi = self.illuminate(hit, dir, textures);
        let normal = hit.normal;
        let view_dir = -dir;

        let diffuse = lambert(&gi.light, normal)
            + gi.static_lightmap_light.color * gi.static_lightmap_light.ndotl
            + gi.dynamic_lightmap_light.color * gi.dynamic_lightmap_light.ndotl
            + gi.indirect.diffuse;

        let ndotv = normal.dot(view_dir).clamp(0.0, 1.0);
        let fresnel = 0.04 + 0.96 * (1.0 - ndotv).powi(5);
        let specular = gi.indirect.specular * (fresnel * self.smoothness);

        self.scene.albedo(hit) * diffuse + specular
    }

    fn illuminate(
        &self,
        hit: &Hit,
        dir: Vec3,
        textures: &LightmapTextures<'_>,
    ) -> CombinedIllumination {
        let [west, east] = self.scene.probes();
        let (batch, lightmaps) = match hit.surface {
            Surface::Ground => (&self.ground, *textures),
            Surface::Sphere(_) => (&self.objects, LightmapTextures::default()),
        };
        let uv = Scene::ground_uv(hit.position);

        let input = IlluminationInput {
            world_pos: hit.position,
            view_dir: -dir,
            view: self.camera.view_params(),
            attenuation: self.scene.sun_visibility(hit.position),
            ambient: Some(&self.scene.ambient),
            lightmap_uv: uv,
            dynamic_lightmap_uv: uv,
            light: self.scene.sun,
            probes: ProbeSet {
                primary: Some(west),
                secondary: Some(east),
                blend: probe_blend(hit.position.x),
            },
            lightmaps,
            shadow_fade: None,
        };
        compose_legacy_smoothness(&input, self.occlusion, self.smoothness, hit.normal, batch)
    }
}

fn lambert(light: &DirectLight, normal: Vec3) -> Vec3 {
    light.color * normal.dot(light.direction).max(0.0)
}

#[cfg(test)]
mod tests {
    use lumina_gi::{LightmapVariant, StaticLightmap};

    use super::*;

    fn render(shading: &ShadingConfig, threads: usize) -> Frame {
        let scene = Scene::new();
        let renderer = Renderer::new(&scene, shading, &DemoConfig::default());
        renderer.render(48, 27, threads).unwrap()
    }

    fn baked_config() -> ShadingConfig {
        let mut shading = ShadingConfig {
            static_lightmap: Some(StaticLightmap {
                variant: LightmapVariant::Directional,
                ..StaticLightmap::default()
            }),
            ..ShadingConfig::default()
        };
        shading.shadows.subtractive_mixing = true;
        shading
    }

    #[test]
    fn test_tonemap_range() {
        assert_eq!(tonemap(Vec3::ZERO, 1.0), [0, 0, 0]);
        assert_eq!(tonemap(Vec3::splat(1e9), 1.0), [255, 255, 255]);
        let mid = tonemap(Vec3::ONE, 1.0);
        assert!(mid[0] > 150 && mid[0] < 200);
    }

    #[test]
    fn test_ray_through_center_is_forward() {
        let camera = Camera::look_at(Vec3::ZERO, -Vec3::Z, 60.0);
        let ray = camera.ray(1, 1, 3, 3);
        assert!((ray - -Vec3::Z).length() < 1e-6);
        assert!((camera.view_params().view_z_axis - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_thread_count_does_not_change_image() {
        let shading = baked_config();
        let single = render(&shading, 1);
        let multi = render(&shading, 4);
        assert_eq!(single.pixels, multi.pixels);
    }

    #[test]
    fn test_frame_is_finite_and_lit() {
        for shading in [ShadingConfig::default(), baked_config()] {
            let frame = render(&shading, 2);
            assert!(frame.pixels.iter().all(|p| p.is_finite()));
            let stats = frame.stats();
            assert!(stats.mean_luminance > 0.0);
            assert!(stats.peak_luminance >= stats.mean_luminance);
        }
    }

    fn ground_hit(position: Vec3) -> Hit {
        Hit {
            surface: Surface::Ground,
            position,
            normal: Vec3::Y,
            distance: 1.0,
        }
    }

    fn shade_ground(scene: &Scene, shading: &ShadingConfig, position: Vec3) -> Vec3 {
        let renderer = Renderer::new(scene, shading, &DemoConfig::default());
        let dir = (position - renderer.camera().position).normalize();
        renderer
            .with_ground_textures(|textures| renderer.shade_hit(&ground_hit(position), dir, textures))
    }

    #[test]
    fn test_shadow_mask_darkens_ground_under_sphere() {
        let scene = Scene::new();
        let mut shading = baked_config();
        shading.shadows.shadow_mask = true;
        let center = scene.spheres[2].center;
        let shadowed = shade_ground(&scene, &shading, Vec3::new(center.x, 0.0, center.z));
        let open = shade_ground(&scene, &shading, Vec3::new(center.x, 0.0, 6.0));
        assert!(luminance(shadowed) < 0.5 * luminance(open));
    }

    #[test]
    fn test_subtractive_shadow_darkens_ground_under_sphere() {
        let scene = Scene::new();
        let center = scene.spheres[2].center;
        let shadowed = shade_ground(&scene, &baked_config(), Vec3::new(center.x, 0.0, center.z));
        let open = shade_ground(&scene, &baked_config(), Vec3::new(center.x, 0.0, 6.0));
        assert!(luminance(shadowed) < luminance(open));
    }

    #[test]
    fn test_baked_sun_close_to_live_sun_on_open_ground() {
        // Directional lightmaps fold the sun into one dominant direction, so
        // the baked result only approximates live evaluation.
        let scene = Scene::new();
        let point = Vec3::new(7.0, 0.0, 7.0);
        let mut live = baked_config();
        live.shadows.subtractive_mixing = false;

        let baked = luminance(shade_ground(&scene, &baked_config(), point));
        let live = luminance(shade_ground(&scene, &live, point));
        assert!(baked > 0.75 * live && baked < 1.05 * live, "baked {baked} live {live}");
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = render(&ShadingConfig::default(), 2);
        frame.save_png(&path, 1.0).unwrap();
        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (48, 27));
    }
}
