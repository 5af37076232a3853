use glam::Vec4;

use super::camera::Camera;
use super::object::{ObjectId, SceneObject};

/// Object list, active camera, background and simulation clock.
///
/// List order is draw order. Time only moves through [`Scene::tick`], which
/// [`Scene::advance_frame`] calls once after every update hook has run.
pub struct Scene {
    objects: Vec<SceneObject>,
    camera: Option<Camera>,
    background_color: Vec4,
    delta_time: f64,
    time: f64,
}

impl Scene {
    pub fn new(delta_time: f64) -> Self {
        Self {
            objects: Vec::new(),
            camera: None,
            background_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            delta_time,
            time: 0.0,
        }
    }

    /// Appends to the draw list. Ids are unique by construction, so no
    /// duplicate check is made.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id();
        log::debug!("Scene: add {} ({})", id, object.name());
        self.objects.push(object);
        id
    }

    /// Removes the object with `id`, keeping the order of the rest.
    ///
    /// GPU resources held by the object are not released here; pass the
    /// returned object to `Renderer::release_object` for that.
    pub fn delete_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|object| object.id() == id)?;
        log::debug!("Scene: delete {}", id);
        Some(self.objects.remove(index))
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn background_color(&self) -> Vec4 {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Vec4) {
        self.background_color = color;
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    pub fn set_delta_time(&mut self, delta_time: f64) {
        self.delta_time = delta_time;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tick(&mut self) {
        self.time += self.delta_time;
    }

    /// Camera hook, then object hooks in list order, all at the current
    /// time; then one tick.
    pub fn advance_frame(&mut self) {
        let time = self.time;
        if let Some(camera) = self.camera.as_mut() {
            camera.run_update(time);
        }
        for object in &mut self.objects {
            object.run_update(time);
        }
        self.tick();
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects.len())
            .field("camera", &self.camera)
            .field("background_color", &self.background_color)
            .field("delta_time", &self.delta_time)
            .field("time", &self.time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::primitives;

    #[test]
    fn delete_keeps_remaining_order() {
        let mut scene = Scene::new(0.01);
        let a = scene.add_object(primitives::cube().with_name("a"));
        let b = scene.add_object(primitives::cube().with_name("b"));
        let c = scene.add_object(primitives::cube().with_name("c"));

        let removed = scene.delete_object(b).unwrap();
        assert_eq!(removed.name(), "b");
        let ids: Vec<ObjectId> = scene.objects().iter().map(SceneObject::id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(scene.delete_object(b).is_none());
        assert_eq!(scene.objects().len(), 2);
    }

    #[test]
    fn time_only_moves_on_tick() {
        let mut scene = Scene::new(0.5);
        scene.set_camera(Camera::new(1.0, 60.0, 0.1, 10.0));
        assert_eq!(scene.time(), 0.0);
        scene.advance_frame();
        scene.advance_frame();
        assert!((scene.time() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_background_is_opaque_black() {
        assert_eq!(Scene::new(0.1).background_color(), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }
}
