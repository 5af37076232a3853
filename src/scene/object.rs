use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

use super::transform::trs_matrix;
use super::UpdateHook;
use crate::renderer::{IndexBuffer, Material, VertexBuffer};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{:x}", self.0)
    }
}

/// A renderable entity: geometry, material and a TRS pose.
///
/// Every object owns its buffers and material outright. A clone gets fresh
/// GPU state for all of them, so it can be realized in a different context;
/// textures follow the material's [`TextureSharing`](crate::renderer::TextureSharing).
pub struct SceneObject {
    id: ObjectId,
    pub name: String,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    material: Material,
    pub translation: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
    update: Option<UpdateHook<SceneObject>>,
}

impl SceneObject {
    pub fn new(vertex_buffer: VertexBuffer, index_buffer: IndexBuffer, material: Material) -> Self {
        Self {
            id: ObjectId::next(),
            name: String::new(),
            vertex_buffer,
            index_buffer,
            material,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            update: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    pub fn vertex_buffer_mut(&mut self) -> &mut VertexBuffer {
        &mut self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }

    pub fn index_buffer_mut(&mut self) -> &mut IndexBuffer {
        &mut self.index_buffer
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Mutable access to all three parts at once, for realizing them
    /// against a single program.
    pub(crate) fn parts_mut(&mut self) -> (&mut VertexBuffer, &mut IndexBuffer, &mut Material) {
        (&mut self.vertex_buffer, &mut self.index_buffer, &mut self.material)
    }

    /// `T * R * S` from the current fields.
    pub fn transform(&self) -> Mat4 {
        trs_matrix(self.translation, self.rotation, self.scale)
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vec3::new(dx, dy, dz);
    }

    /// Runs once per frame, before drawing, with the scene time.
    pub fn set_update(&mut self, hook: impl Fn(f64, &mut SceneObject) + 'static) {
        self.update = Some(Rc::new(hook));
    }

    pub fn clear_update(&mut self) {
        self.update = None;
    }

    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    pub(crate) fn run_update(&mut self, time: f64) {
        if let Some(hook) = self.update.clone() {
            hook(time, self);
        }
    }

    /// Marks every GPU resource unrealized without releasing anything, so
    /// the object can be drawn by another context.
    pub fn reset_created(&mut self) {
        self.vertex_buffer.reset_created();
        self.index_buffer.reset_created();
        self.material.reset_created();
    }
}

/// New id, fresh buffers and material. The update hook is shared.
impl Clone for SceneObject {
    fn clone(&self) -> Self {
        Self {
            id: ObjectId::next(),
            name: self.name.clone(),
            vertex_buffer: self.vertex_buffer.clone(),
            index_buffer: self.index_buffer.clone(),
            material: self.material.clone(),
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
            update: self.update.clone(),
        }
    }
}

impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("translation", &self.translation)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("material", &self.material)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::primitives;

    #[test]
    fn clone_does_not_alias_pose() {
        let original = primitives::cube().with_translation(Vec3::new(1.0, 2.0, 3.0));
        let mut clone = original.clone();
        clone.translation.x = 10.0;
        clone.rotate(0.0, 90.0, 0.0);

        assert_eq!(original.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(original.rotation, Vec3::ZERO);
        assert_ne!(original.id(), clone.id());
        assert_ne!(original.material().id(), clone.material().id());
        assert_eq!(original.name(), clone.name());
    }

    #[test]
    fn transform_follows_mutation() {
        let mut object = primitives::cube();
        let before = object.transform();
        object.translation = Vec3::new(0.0, 0.0, -3.0);
        let after = object.transform();
        assert!(before.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        assert!(after
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, 0.0, -3.0), 1e-6));
    }

    #[test]
    fn clone_shares_update_hook() {
        let mut object = primitives::triangle();
        object.set_update(|time, o| o.translation.y = time as f32);
        let mut clone = object.clone();
        clone.run_update(2.5);
        assert_eq!(clone.translation.y, 2.5);
        assert_eq!(object.translation.y, 0.0);
    }
}
