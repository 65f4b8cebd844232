use crate::resources::geometry::{LightVolumeKind, LightVolumeMesh};
use std::f32::consts::PI;

/// Vertex budget of a mesh indexed with `u16`.
const MAX_SPHERE_VERTICES: u32 = u16::MAX as u32 + 1;

pub struct SphereOptions {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 24,
            height_segments: 16,
        }
    }
}

/// Builds the point light volume: a UV sphere with opaque white vertices.
///
/// Pole rows produce degenerate triangles, which the rasteriser discards.
///
/// Segment counts are clamped so the vertex count stays within the `u16`
/// index range; a clamp is logged as a warning.
pub fn create_point_light_volume(options: SphereOptions) -> LightVolumeMesh {
    let radius = options.radius;
    let width_segments = options.width_segments.clamp(3, MAX_SPHERE_VERTICES / 3 - 1);
    let height_segments = options
        .height_segments
        .clamp(2, MAX_SPHERE_VERTICES / (width_segments + 1) - 1);

    if width_segments < options.width_segments || height_segments < options.height_segments {
        log::warn!(
            "Point light volume {}x{} segments exceeds the u16 index range; \
             using {width_segments}x{height_segments}",
            options.width_segments,
            options.height_segments
        );
    }

    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for y in 0..=height_segments {
        let v_ratio = y as f32 / height_segments as f32;
        // Latitude angle: from 0 to PI (south pole to north pole)
        let theta = v_ratio * PI;

        let py = -radius * theta.cos();
        let ring_radius = radius * theta.sin();

        for x in 0..=width_segments {
            let u_ratio = x as f32 / width_segments as f32;
            let phi = u_ratio * 2.0 * PI;

            positions.push([-ring_radius * phi.cos(), py, ring_radius * phi.sin()]);
        }
    }

    // Each grid cell consists of two triangles
    let stride = width_segments + 1;
    for y in 0..height_segments {
        for x in 0..width_segments {
            let v0 = y * stride + x;
            let v1 = v0 + 1;
            let v2 = (y + 1) * stride + x;
            let v3 = v2 + 1;

            // In range: the clamp keeps every vertex index below `MAX_SPHERE_VERTICES`.
            let [v0, v1, v2, v3] = [v0, v1, v2, v3].map(|v| v as u16);
            indices.extend_from_slice(&[v0, v1, v2]);
            indices.extend_from_slice(&[v1, v3, v2]);
        }
    }

    let colors = vec![[255, 255, 255, 255]; positions.len()];
    LightVolumeMesh::new(LightVolumeKind::Point, positions, colors, indices)
}
