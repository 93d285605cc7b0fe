pub mod hit_testing;
pub mod transform;

pub use hit_testing::{Corner, HitTarget, hit_test, rotate_control_center};
pub use transform::{CenteredTransform, Frame, map_point, map_rect, normalize_rotation, scale_between};
