use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec3, Vec4};
use scene_forge::renderer::primitives;
use scene_forge::scene::{Camera, ObjFileReader, Scene};

const EPSILON: f64 = 1e-9;

fn recorder() -> (Rc<RefCell<Vec<f64>>>, impl Fn(f64) + Clone + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |time| sink.borrow_mut().push(time))
}

#[test]
fn hooks_observe_time_before_each_tick() {
    let dt = 0.25;
    let frames = 6;
    let mut scene = Scene::new(dt);

    let (camera_seen, record_camera) = recorder();
    let mut camera = Camera::new(16.0 / 9.0, 45.0, 0.1, 100.0);
    camera.set_update(move |time, _| record_camera(time));
    scene.set_camera(camera);

    let (first_seen, record_first) = recorder();
    let (second_seen, record_second) = recorder();
    let mut first = primitives::cube();
    first.set_update(move |time, _| record_first(time));
    let mut second = primitives::triangle();
    second.set_update(move |time, _| record_second(time));
    scene.add_object(first);
    scene.add_object(second);

    for _ in 0..frames {
        scene.advance_frame();
    }

    assert!((scene.time() - frames as f64 * dt).abs() < EPSILON);
    let expected: Vec<f64> = (0..frames).map(|n| n as f64 * dt).collect();
    for seen in [camera_seen, first_seen, second_seen] {
        let seen = seen.borrow();
        assert_eq!(seen.len(), expected.len());
        for (got, want) in seen.iter().zip(&expected) {
            assert!((got - want).abs() < EPSILON, "{got} != {want}");
        }
    }
}

#[test]
fn camera_runs_before_objects() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new(0.1);

    let log = Rc::clone(&order);
    let mut camera = Camera::new(1.0, 60.0, 0.1, 10.0);
    camera.set_update(move |_, _| log.borrow_mut().push("camera"));
    scene.set_camera(camera);

    let log = Rc::clone(&order);
    let mut object = primitives::square();
    object.set_update(move |_, _| log.borrow_mut().push("square"));
    scene.add_object(object);

    scene.advance_frame();
    scene.advance_frame();
    assert_eq!(*order.borrow(), ["camera", "square", "camera", "square"]);
}

#[test]
fn one_frame_moves_time_and_keeps_pose() {
    let mut scene = Scene::new(0.01);
    let id = scene.add_object(primitives::empty().with_translation(Vec3::new(0.0, 0.0, -3.0)));

    scene.advance_frame();

    assert!((scene.time() - 0.01).abs() < EPSILON);
    let object = scene.object(id).unwrap();
    let moved = object.transform().transform_point3(Vec3::ZERO);
    assert!(moved.abs_diff_eq(Vec3::new(0.0, 0.0, -3.0), 1e-6), "{moved:?}");
}

#[test]
fn hook_moves_object_each_frame() {
    let mut scene = Scene::new(0.5);
    let mut object = primitives::cube();
    object.set_update(|time, object| object.translation.x = time as f32);
    let id = scene.add_object(object);

    scene.advance_frame();
    scene.advance_frame();
    scene.advance_frame();

    // The last hook ran at t = 1.0, before the final tick
    assert_eq!(scene.object(id).unwrap().translation.x, 1.0);
}

#[test]
fn deleting_keeps_order_of_the_rest() {
    let mut scene = Scene::new(0.01);
    let ids: Vec<_> = (0..4)
        .map(|n| scene.add_object(primitives::triangle().with_name(format!("tri-{n}"))))
        .collect();

    let removed = scene.delete_object(ids[1]).unwrap();
    assert_eq!(removed.name(), "tri-1");
    assert!(scene.delete_object(ids[1]).is_none());

    let names: Vec<&str> = scene.objects().iter().map(|object| object.name()).collect();
    assert_eq!(names, ["tri-0", "tri-2", "tri-3"]);
}

#[test]
fn cloned_object_is_independent() {
    let mut original = primitives::cube().with_translation(Vec3::new(1.0, 2.0, 3.0));
    let mut copy = original.clone();

    copy.translation.x = 10.0;
    copy.material_mut()
        .set_property("color", scene_forge::renderer::PropertyValue::Vec4(Vec4::ZERO));
    original.rotate(0.0, 90.0, 0.0);

    assert_eq!(original.translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(copy.rotation, Vec3::ZERO);
    assert_ne!(copy.id(), original.id());
    assert_ne!(copy.material().id(), original.material().id());
    assert!(original.material().property("color").is_some_and(|property| {
        !matches!(property.value, scene_forge::renderer::PropertyValue::Vec4(v) if v == Vec4::ZERO)
    }));
}

#[test]
fn imported_model_joins_the_scene() {
    let text = "\
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";
    let object = ObjFileReader::new().to_scene_object(text, "quad").unwrap();
    assert_eq!(object.name(), "quad");
    assert_eq!(object.index_buffer().len(), 6);
    assert_eq!(object.vertex_buffer().vertex_count(), 4);

    let mut scene = Scene::new(0.01);
    let id = scene.add_object(object);
    assert_eq!(scene.object(id).map(|object| object.name()), Some("quad"));
}
