//! 3D math for the wireframe pipeline: vectors, unit quaternions, and the
//! per-entity transform.

mod quaternion;
mod transform;
mod vec3;

pub use quaternion::Quaternion;
pub use transform::Transform;
pub use vec3::Vec3;
