pub mod sphere;
pub mod spot_cone;

pub use sphere::{SphereOptions, create_point_light_volume};
pub use spot_cone::{
    SPOT_CORE_RATIO, SPOT_SEGMENT_COUNT, create_spot_light_volume, spot_triangle_count,
    spot_vertex_count,
};
