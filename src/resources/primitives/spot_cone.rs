use std::f32::consts::PI;

use crate::resources::geometry::{LightVolumeKind, LightVolumeMesh};

/// Number of angular samples around the cone axis.
pub const SPOT_SEGMENT_COUNT: usize = 16;

/// Radius of the core rings relative to the silhouette ring.
pub const SPOT_CORE_RATIO: f32 = 0.9;

const OPAQUE: [u8; 4] = [255, 255, 255, 255];
const FEATHERED: [u8; 4] = [255, 255, 255, 0];
/// Apex and base center carry no color.
const CENTER: [u8; 4] = [0, 0, 0, 0];

/// Vertex count of the spot volume: apex, base center and three rings.
#[must_use]
pub const fn spot_vertex_count(segments: usize) -> usize {
    2 + 3 * segments
}

/// Triangle count of the spot volume: apex fan, two ring bands of two
/// triangles per segment, base fan.
#[must_use]
pub const fn spot_triangle_count(segments: usize) -> usize {
    6 * segments
}

/// Builds the soft-edged spot light volume.
///
/// The apex sits at the origin and the base is centered at `(0, 0, 1)` with
/// unit radius. Per angular sample there are three rings:
///
/// ```text
///   ring      index              radius  z     alpha
///   core      2 + i              0.9     0.9   1
///   edge      2 + n + i          1.0     1.0   0
///   base      2 + 2n + i         0.9     1.0   1
/// ```
///
/// Triangles, all wound counter-clockwise seen from outside:
/// apex fan over the core ring, core→edge band (the feathered cone wall),
/// edge→base band (the feathered rim of the cap) and a base fan over the
/// base ring.
#[must_use]
pub fn create_spot_light_volume() -> LightVolumeMesh {
    let n = SPOT_SEGMENT_COUNT;
    let step = PI * 2.0 / n as f32;

    let mut positions = vec![[0.0_f32; 3]; spot_vertex_count(n)];
    let mut colors = vec![CENTER; spot_vertex_count(n)];

    positions[0] = [0.0, 0.0, 0.0];
    positions[1] = [0.0, 0.0, 1.0];

    for i in 0..n {
        let angle = step * i as f32;
        let (x, y) = (-angle.cos(), angle.sin());

        let core = 2 + i;
        let edge = 2 + n + i;
        let base = 2 + 2 * n + i;

        positions[core] = [x * SPOT_CORE_RATIO, y * SPOT_CORE_RATIO, SPOT_CORE_RATIO];
        colors[core] = OPAQUE;
        positions[edge] = [x, y, 1.0];
        colors[edge] = FEATHERED;
        positions[base] = [x * SPOT_CORE_RATIO, y * SPOT_CORE_RATIO, 1.0];
        colors[base] = OPAQUE;
    }

    let ring = |offset: usize, i: usize| (2 + offset * n + i % n) as u16;
    let (core, edge, base) = (0, 1, 2);

    let mut indices: Vec<u16> = Vec::with_capacity(spot_triangle_count(n) * 3);

    // Apex fan
    for i in 0..n {
        indices.extend_from_slice(&[0, ring(core, i), ring(core, i + 1)]);
    }

    // Ring bands: core → edge, edge → base
    for (inner, outer) in [(core, edge), (edge, base)] {
        for i in 0..n {
            indices.extend_from_slice(&[
                ring(inner, i),
                ring(outer, i),
                ring(inner, i + 1),
                ring(inner, i + 1),
                ring(outer, i),
                ring(outer, i + 1),
            ]);
        }
    }

    // Base fan
    for i in 0..n {
        indices.extend_from_slice(&[1, ring(base, i + 1), ring(base, i)]);
    }

    LightVolumeMesh::new(LightVolumeKind::Spot, positions, colors, indices)
}
