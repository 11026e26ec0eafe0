pub mod entity;
pub mod transform;

pub use entity::{Entity, Positioned};
pub use transform::TransformMatrix;
