// renderer/primitives.rs
//! Built-in objects the editor can add without importing anything.

use glam::Vec4;

use super::buffer::{IndexBuffer, VertexAttribute, VertexBuffer, VertexLayout};
use super::material::{Material, MaterialProperty, PropertyValue};
use super::shader::ShaderProgram;
use super::texture::{SharedTexture, Texture};
use crate::scene::loader::obj_layout;
use crate::scene::SceneObject;

pub const COLORED_VERTEX_SHADER: &str = "
precision mediump float;

attribute vec3 position;
attribute vec4 vertexColor;

uniform mat4 transform;
uniform mat4 perspective;
uniform mat4 view;
uniform vec4 color;

varying vec4 v_color;

void main(void) {
    v_color = vertexColor * color;
    gl_Position = perspective * view * transform * vec4(position, 1.0);
}
";

pub const COLORED_FRAGMENT_SHADER: &str = "
precision mediump float;

varying vec4 v_color;

void main(void) {
    gl_FragColor = v_color;
}
";

pub const TEXTURED_VERTEX_SHADER: &str = "
precision mediump float;

attribute vec3 position;
attribute vec2 texCoord;

uniform mat4 transform;
uniform mat4 perspective;
uniform mat4 view;
uniform vec4 color;

varying vec4 v_color;
varying vec2 v_texCoord;

void main(void) {
    v_color = color;
    v_texCoord = texCoord;
    gl_Position = perspective * view * transform * vec4(position, 1.0);
}
";

pub const TEXTURED_FRAGMENT_SHADER: &str = "
precision mediump float;

varying vec4 v_color;
varying vec2 v_texCoord;

uniform sampler2D texture;

void main(void) {
    gl_FragColor = texture2D(texture, v_texCoord) * v_color;
}
";

const PINK: Vec4 = Vec4::new(0.86, 0.34, 0.56, 1.0);
const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

fn colored_layout() -> VertexLayout {
    VertexLayout::new(vec![
        VertexAttribute::float("position", 3),
        VertexAttribute::float("vertexColor", 4),
    ])
}

fn textured_layout() -> VertexLayout {
    VertexLayout::new(vec![
        VertexAttribute::float("position", 3),
        VertexAttribute::float("texCoord", 2),
    ])
}

/// 1x1 opaque white, so untextured objects show their `color`.
pub fn white_texture() -> SharedTexture {
    Texture::solid("white", [255; 4]).into_shared()
}

pub fn colored_material(name: &str, color: Vec4) -> Material {
    Material::new(
        name,
        ShaderProgram::from_sources(COLORED_VERTEX_SHADER, COLORED_FRAGMENT_SHADER),
    )
    .with_property(MaterialProperty::vec4("color", color))
}

/// Template for imported models: a `color` tint over a `texture` sampler.
pub fn textured_material() -> Material {
    Material::new(
        "Textured Material",
        ShaderProgram::from_sources(TEXTURED_VERTEX_SHADER, TEXTURED_FRAGMENT_SHADER),
    )
    .with_property(MaterialProperty::vec4("color", PINK))
    .with_property(MaterialProperty::texture("texture", white_texture()))
}

#[rustfmt::skip]
pub fn cube() -> SceneObject {
    let vertices = vec![
         1.0f32,  1.0,  1.0,  0.86, 0.45, 0.25, 1.0,
         1.0,  1.0, -1.0,  0.86, 0.86, 0.25, 1.0,
         1.0, -1.0,  1.0,  0.25, 0.86, 0.25, 1.0,
         1.0, -1.0, -1.0,  0.45, 0.86, 0.86, 1.0,
        -1.0,  1.0,  1.0,  0.25, 0.25, 0.86, 1.0,
        -1.0,  1.0, -1.0,  0.86, 0.45, 0.86, 1.0,
        -1.0, -1.0,  1.0,  0.45, 0.25, 0.45, 1.0,
        -1.0, -1.0, -1.0,  0.86, 0.86, 0.86, 1.0,
    ];
    let indices = vec![
        1u32, 0, 2,  1, 2, 3,
        0, 4, 6,  0, 6, 2,
        4, 5, 7,  4, 7, 6,
        5, 1, 3,  5, 3, 7,
        1, 5, 4,  1, 4, 0,
        2, 6, 7,  2, 7, 3,
    ];

    SceneObject::new(
        VertexBuffer::new(vertices, colored_layout()),
        IndexBuffer::new(indices),
        colored_material("Cube Material", Vec4::ONE),
    )
    .with_name("Cube")
}

#[rustfmt::skip]
pub fn square() -> SceneObject {
    let vertices = vec![
        -1.0f32,  1.0, 0.0,  0.0, 0.0,
         1.0,  1.0, 0.0,  1.0, 0.0,
         1.0, -1.0, 0.0,  1.0, 1.0,
        -1.0, -1.0, 0.0,  0.0, 1.0,
    ];
    let mut material = textured_material();
    material.set_name("Square Material");
    material.set_property("color", PropertyValue::Vec4(RED));

    SceneObject::new(
        VertexBuffer::new(vertices, textured_layout()),
        IndexBuffer::new(vec![2u32, 1, 0, 3, 2, 0]),
        material,
    )
    .with_name("Square")
}

#[rustfmt::skip]
pub fn triangle() -> SceneObject {
    let vertices = vec![
        -1.0f32, -1.0, 0.0,  1.0, 0.0, 0.0, 1.0,
         1.0, -1.0, 0.0,  0.0, 1.0, 0.0, 1.0,
         0.0,  1.0, 0.0,  0.0, 0.0, 1.0, 1.0,
    ];

    SceneObject::new(
        VertexBuffer::new(vertices, colored_layout()),
        IndexBuffer::new(vec![2u32, 1, 0]),
        colored_material("Triangle Material", Vec4::ONE),
    )
    .with_name("Triangle")
}

/// No geometry yet; the layout matches imported models so
/// [`VertexBuffer::update_geometry`] can fill it later.
pub fn empty() -> SceneObject {
    let mut material = textured_material();
    material.set_name("Empty Material");

    SceneObject::new(
        VertexBuffer::new(Vec::<f32>::new(), obj_layout()),
        IndexBuffer::new(Vec::<u32>::new()),
        material,
    )
    .with_name("Empty Scene Object")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_twelve_triangles() {
        let cube = cube();
        assert_eq!(cube.vertex_buffer().vertex_count(), 8);
        assert_eq!(cube.index_buffer().len(), 36);
        assert!(cube.index_buffer().indices().iter().all(|&i| i < 8));
        assert_eq!(cube.vertex_buffer().layout().stride(), 28);
    }

    #[test]
    fn textured_material_starts_white() {
        let material = textured_material();
        let texture = material.textures().next().unwrap();
        assert_eq!(texture.borrow().data(), Some(&[255u8, 255, 255, 255][..]));
        assert!(material.property("color").is_some());
    }

    #[test]
    fn empty_object_has_import_layout() {
        let empty = empty();
        assert_eq!(empty.vertex_buffer().layout(), &obj_layout());
        assert!(empty.index_buffer().is_empty());
    }
}
