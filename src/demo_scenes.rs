use glam::{Vec3, Vec4};
use log::info;

use crate::renderer::{primitives, PropertyValue, RenderResult, Texture};
use crate::scene::{Camera, ObjFileReader, Scene};
use crate::settings::EditorSettings;

/// Camera hook circling the origin at `radius`, `height` above the ground,
/// one radian per simulated second.
pub fn orbit_camera(radius: f32, height: f32) -> impl Fn(f64, &mut Camera) + 'static {
    let pitch = -(height / radius).atan().to_degrees();
    move |time: f64, camera: &mut Camera| {
        let t = time as f32;
        camera.translation = Vec3::new(t.sin() * radius, height, t.cos() * radius);
        camera.rotation = Vec3::new(pitch, t.to_degrees(), 0.0);
    }
}

fn base_scene(settings: &EditorSettings) -> Scene {
    let mut scene = Scene::new(settings.delta_time);
    scene.set_background_color(Vec4::from_array(settings.background_color));
    scene.set_camera(settings.build_camera());
    scene
}

/// Cube, square and triangle side by side.
pub fn primitives_scene(settings: &EditorSettings) -> Scene {
    info!("Creating primitives scene...");
    let mut scene = base_scene(settings);
    if let Some(camera) = scene.camera_mut() {
        camera.set_update(orbit_camera(8.0, 3.0));
    }

    let mut cube = primitives::cube().with_translation(Vec3::new(-3.0, 0.0, 0.0));
    cube.set_update(|_, cube| cube.rotate(0.5, 1.0, 0.0));
    scene.add_object(cube);

    let mut square = primitives::square();
    let checker = Texture::checkerboard("Checkerboard", 64, 8, [255; 4], [40, 40, 40, 255]);
    square.material_mut().set_property("texture", PropertyValue::Texture(checker.into_shared()));
    square.material_mut().set_property("color", PropertyValue::Vec4(Vec4::ONE));
    scene.add_object(square);

    let mut triangle = primitives::triangle().with_translation(Vec3::new(3.0, 0.0, 0.0));
    triangle.set_update(|time, triangle| {
        triangle.scale = Vec3::splat(1.0 + 0.25 * (time as f32 * 2.0).sin());
    });
    scene.add_object(triangle);

    scene
}

/// One imported OBJ model at the origin.
pub fn model_scene(settings: &EditorSettings, obj_text: &str, name: &str) -> RenderResult<Scene> {
    info!("Creating model scene for '{}'...", name);
    let mut scene = base_scene(settings);
    if let Some(camera) = scene.camera_mut() {
        camera.set_update(orbit_camera(5.0, 2.0));
    }

    let model = ObjFileReader::new().to_scene_object(obj_text, name)?;
    scene.add_object(model);
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_keeps_radius_and_faces_origin() {
        let hook = orbit_camera(8.0, 0.0);
        let mut camera = Camera::new(1.0, 45.0, 0.1, 100.0);
        for time in [0.0, 0.7, 2.0] {
            hook(time, &mut camera);
            assert!((camera.translation.length() - 8.0).abs() < 1e-4);
            // The origin ends up straight ahead, on the view-space -Z axis
            let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
            assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -8.0), 1e-3), "{origin:?}");
        }
    }

    #[test]
    fn primitives_scene_has_three_objects() {
        let scene = primitives_scene(&EditorSettings::default());
        assert_eq!(scene.objects().len(), 3);
        assert!(scene.camera().is_some_and(Camera::has_update));
    }
}
