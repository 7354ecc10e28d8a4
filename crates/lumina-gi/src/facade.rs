//! Public entry points.
//!
//! [`evaluate`] is the one canonical path; every other function here only
//! builds a [`ShadingRequest`] for it.

use glam::Vec3;

use crate::batch::ShadingBatch;
use crate::compose::compose_base;
use crate::input::IlluminationInput;
use crate::light::CombinedIllumination;
use crate::reflection::{GlossyEnvironmentQuery, sample_indirect_specular};

/// A fully specified illumination request for one shading point.
#[derive(Clone, Copy)]
pub struct ShadingRequest<'r, 'a> {
    pub input: &'r IlluminationInput<'a>,
    pub occlusion: f32,
    pub normal: Vec3,
    /// `None` leaves indirect specular at zero.
    pub glossy: Option<GlossyEnvironmentQuery>,
}

/// Compose base illumination and, when the request carries a glossy query,
/// indirect specular.
pub fn evaluate(request: &ShadingRequest<'_, '_>, batch: &ShadingBatch) -> CombinedIllumination {
    let mut gi = compose_base(request.input, request.occlusion, request.normal, batch);
    if let Some(query) = &request.glossy {
        gi.indirect.specular = sample_indirect_specular(
            request.input,
            request.occlusion,
            query,
            &batch.config().reflections,
        );
    }
    gi
}

/// Base illumination only; indirect specular stays zero.
pub fn compose_base_only(
    input: &IlluminationInput<'_>,
    occlusion: f32,
    normal: Vec3,
    batch: &ShadingBatch,
) -> CombinedIllumination {
    evaluate(
        &ShadingRequest {
            input,
            occlusion,
            normal,
            glossy: None,
        },
        batch,
    )
}

/// Base illumination plus indirect specular for `query`.
pub fn compose(
    input: &IlluminationInput<'_>,
    occlusion: f32,
    normal: Vec3,
    query: &GlossyEnvironmentQuery,
    batch: &ShadingBatch,
) -> CombinedIllumination {
    evaluate(
        &ShadingRequest {
            input,
            occlusion,
            normal,
            glossy: Some(*query),
        },
        batch,
    )
}

/// Smoothness-based form. Builds the glossy query from the view direction
/// when `reflections` is set, unless this is a deferred geometry pass whose
/// reflections are composited later.
pub fn compose_legacy(
    input: &IlluminationInput<'_>,
    occlusion: f32,
    smoothness: f32,
    normal: Vec3,
    reflections: bool,
    batch: &ShadingBatch,
) -> CombinedIllumination {
    let reflections = reflections && !batch.defers_reflections();
    let glossy = reflections
        .then(|| GlossyEnvironmentQuery::from_smoothness(smoothness, input.view_dir, normal));
    evaluate(
        &ShadingRequest {
            input,
            occlusion,
            normal,
            glossy,
        },
        batch,
    )
}

/// Smoothness-only form with reflections requested.
pub fn compose_legacy_smoothness(
    input: &IlluminationInput<'_>,
    occlusion: f32,
    smoothness: f32,
    normal: Vec3,
    batch: &ShadingBatch,
) -> CombinedIllumination {
    compose_legacy(input, occlusion, smoothness, normal, true, batch)
}
