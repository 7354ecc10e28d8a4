//! Global-illumination composition for forward and deferred shading.
//!
//! Combines the main light, SH ambient probes, baked and realtime lightmaps,
//! and cubemap reflection probes into one [`CombinedIllumination`] per
//! shading point, ready for BRDF evaluation.

pub mod batch;
mod compose;
pub mod config;
pub mod environment;
mod facade;
mod input;
mod light;
pub mod lightmap;
pub mod reflection;
pub mod sh;
pub mod shadow;

pub use batch::{MainLightRoute, ShadingBatch, ShadingUniform};
pub use compose::compose_base;
pub use config::{
    DynamicLightmap, RenderPass, ShadingConfig, ShadingConfigError, ShadowConfig, StaticLightmap,
};
pub use environment::{AmbientSh, Cubemap, ShadowFade, Texture2D};
pub use facade::{
    ShadingRequest, compose, compose_base_only, compose_legacy, compose_legacy_smoothness,
    evaluate,
};
pub use input::{IlluminationInput, LightmapTextures, ViewParams};
pub use light::{CombinedIllumination, DirectLight, IndirectLight};
pub use lightmap::{HdrDecode, LightmapEncoding, LightmapVariant, RealtimeDecode};
pub use reflection::{GlossyEnvironmentQuery, ProbeSet, ReflectionConfig, ReflectionProbe};
pub use sh::ShL2;
pub use shadow::{ShadowFadeParams, ShadowMixing, SubtractiveShadow};
