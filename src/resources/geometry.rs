//! Light Volume Geometry
//!
//! CPU-side mesh data for the bounding volumes the scattering shader is
//! rasterised with. Positions and vertex colors are stored planar; the alpha
//! channel of the vertex color carries the soft-edge falloff.

use glam::Vec3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Returns `true` if `point` lies inside or on the box, with `epsilon` slack.
    pub fn contains(&self, point: Vec3, epsilon: f32) -> bool {
        point.cmpge(self.min - Vec3::splat(epsilon)).all()
            && point.cmple(self.max + Vec3::splat(epsilon)).all()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Shape of a light volume mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightVolumeKind {
    Point,
    Spot,
}

/// Immutable triangle mesh bounding a light's region of influence.
///
/// Built once per [`LightVolumeKind`] and shared by every light of that kind
/// (see [`shared`](crate::resources::shared)).
#[derive(Debug, Clone, PartialEq)]
pub struct LightVolumeMesh {
    pub kind: LightVolumeKind,
    positions: Vec<[f32; 3]>,
    /// RGBA8 vertex colors; alpha is the edge falloff.
    colors: Vec<[u8; 4]>,
    /// Triangle list, counter-clockwise front faces.
    indices: Vec<u16>,
    bounding_box: BoundingBox,
    bounding_sphere: BoundingSphere,
}

impl LightVolumeMesh {
    /// Assembles a mesh and computes its bounding volume.
    ///
    /// # Panics
    ///
    /// Panics if the attribute lengths differ or an index is out of range;
    /// both indicate a bug in the generator that produced the data.
    #[must_use]
    pub fn new(
        kind: LightVolumeKind,
        positions: Vec<[f32; 3]>,
        colors: Vec<[u8; 4]>,
        indices: Vec<u16>,
    ) -> Self {
        assert_eq!(positions.len(), colors.len(), "one color per vertex");
        assert_eq!(indices.len() % 3, 0, "triangle list");
        assert!(
            indices.iter().all(|&i| (i as usize) < positions.len()),
            "index out of range"
        );

        let mut mesh = Self {
            kind,
            positions,
            colors,
            indices,
            bounding_box: BoundingBox::default(),
            bounding_sphere: BoundingSphere::default(),
        };
        mesh.compute_bounding_volume();
        mesh
    }

    /// Recomputes the AABB and the bounding sphere around the AABB center.
    pub fn compute_bounding_volume(&mut self) {
        if self.positions.is_empty() {
            self.bounding_box = BoundingBox::default();
            self.bounding_sphere = BoundingSphere::default();
            return;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in &self.positions {
            let v = Vec3::from_array(*p);
            min = min.min(v);
            max = max.max(v);
        }
        self.bounding_box = BoundingBox { min, max };

        // Sphere centered on the AABB, radius from the farthest vertex.
        let center = (min + max) * 0.5;
        let max_dist_sq = self
            .positions
            .iter()
            .map(|p| Vec3::from_array(*p).distance_squared(center))
            .fold(0.0_f32, f32::max);

        self.bounding_sphere = BoundingSphere {
            center,
            radius: max_dist_sq.sqrt(),
        };
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    #[inline]
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// Iterates triangles as vertex positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from_array(self.positions[tri[0] as usize]),
                Vec3::from_array(self.positions[tri[1] as usize]),
                Vec3::from_array(self.positions[tri[2] as usize]),
            ]
        })
    }

    /// Raw position bytes for a vertex buffer upload.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw color bytes for a vertex buffer upload.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Raw index bytes for an index buffer upload (`Uint16`).
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
