// scene/mod.rs

use std::rc::Rc;

pub mod camera;
pub mod loader;
pub mod object;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use loader::{ObjFileReader, ObjGeometry};
pub use object::{ObjectId, SceneObject};
pub use scene::Scene;
pub use transform::trs_matrix;

/// Per-frame callback receiving the scene time and the value it animates.
pub type UpdateHook<T> = Rc<dyn Fn(f64, &mut T)>;
