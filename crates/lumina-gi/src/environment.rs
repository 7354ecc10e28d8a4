//! Contracts for the texture, ambient and shadow-fade collaborators.
//!
//! The composer never filters textures or evaluates probes on its own; it
//! calls through these traits. Every trait is `Send + Sync` so one set of
//! bindings can be shared by all threads shading a batch.

use glam::{Vec2, Vec3, Vec4};

/// A bound 2D texture with filtering already configured.
pub trait Texture2D: Send + Sync {
    /// Filtered texel at `uv`.
    fn sample(&self, uv: Vec2) -> Vec4;
}

/// A bound cubemap with mip chain.
pub trait Cubemap: Send + Sync {
    /// Filtered texel along `direction` at mip level `mip`.
    fn sample_level(&self, direction: Vec3, mip: f32) -> Vec4;
}

/// Spherical-harmonic (or equivalent) ambient irradiance source.
pub trait AmbientSh: Send + Sync {
    /// Irradiance arriving at a surface with normal `normal` located at
    /// `world_pos`.
    fn evaluate(&self, normal: Vec3, world_pos: Vec3) -> Vec3;
}

/// Realtime shadow distance fade and realtime/baked shadow mixing.
pub trait ShadowFade: Send + Sync {
    /// Distance used for the fade, given the world position and the
    /// view-space depth of the shading point.
    fn fade_distance(&self, world_pos: Vec3, view_z: f32) -> f32;
    /// Fade factor in \[0, 1\]; 1 means realtime shadows are fully faded out.
    fn fade(&self, distance: f32) -> f32;
    /// Combine the realtime and baked attenuation using `fade`.
    fn mix(&self, realtime: f32, baked: f32, fade: f32) -> f32;
}

impl<F> Texture2D for F
where
    F: Fn(Vec2) -> Vec4 + Send + Sync,
{
    fn sample(&self, uv: Vec2) -> Vec4 {
        self(uv)
    }
}

/// A texture returning the same texel everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidTexture(pub Vec4);

impl Texture2D for SolidTexture {
    fn sample(&self, _uv: Vec2) -> Vec4 {
        self.0
    }
}

/// A cubemap returning the same texel in every direction and at every mip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformCubemap(pub Vec4);

impl Cubemap for UniformCubemap {
    fn sample_level(&self, _direction: Vec3, _mip: f32) -> Vec4 {
        self.0
    }
}

/// Constant ambient irradiance independent of normal and position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatAmbient(pub Vec3);

impl AmbientSh for FlatAmbient {
    fn evaluate(&self, _normal: Vec3, _world_pos: Vec3) -> Vec3 {
        self.0
    }
}
