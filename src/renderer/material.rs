// renderer/material.rs
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::context::UniformValue;
use super::shader::ShaderProgram;
use super::texture::SharedTexture;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mat-{:x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Texture,
}

#[derive(Debug, Clone)]
pub enum PropertyValue {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Texture(SharedTexture),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Scalar(_) => PropertyType::Scalar,
            PropertyValue::Vec2(_) => PropertyType::Vec2,
            PropertyValue::Vec3(_) => PropertyType::Vec3,
            PropertyValue::Vec4(_) => PropertyType::Vec4,
            PropertyValue::Mat4(_) => PropertyType::Mat4,
            PropertyValue::Texture(_) => PropertyType::Texture,
        }
    }

    /// Uniform write for plain values; textures bind through a sampler unit.
    pub fn uniform(&self) -> Option<UniformValue> {
        match self {
            PropertyValue::Scalar(v) => Some(UniformValue::Float(*v)),
            PropertyValue::Vec2(v) => Some(UniformValue::Vec2(v.to_array())),
            PropertyValue::Vec3(v) => Some(UniformValue::Vec3(v.to_array())),
            PropertyValue::Vec4(v) => Some(UniformValue::Vec4(v.to_array())),
            PropertyValue::Mat4(m) => Some(UniformValue::Mat4(m.to_cols_array())),
            PropertyValue::Texture(_) => None,
        }
    }
}

/// A named value bound to the shader uniform of the same name.
#[derive(Debug, Clone)]
pub struct MaterialProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl MaterialProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn scalar(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, PropertyValue::Scalar(value))
    }

    pub fn vec2(name: impl Into<String>, value: Vec2) -> Self {
        Self::new(name, PropertyValue::Vec2(value))
    }

    pub fn vec3(name: impl Into<String>, value: Vec3) -> Self {
        Self::new(name, PropertyValue::Vec3(value))
    }

    pub fn vec4(name: impl Into<String>, value: Vec4) -> Self {
        Self::new(name, PropertyValue::Vec4(value))
    }

    pub fn mat4(name: impl Into<String>, value: Mat4) -> Self {
        Self::new(name, PropertyValue::Mat4(value))
    }

    pub fn texture(name: impl Into<String>, texture: SharedTexture) -> Self {
        Self::new(name, PropertyValue::Texture(texture))
    }

    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }
}

/// What a cloned material does with texture properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureSharing {
    /// Clones point at the same texture, including its upload state.
    #[default]
    Shared,
    /// Clones get their own texture with the same pixels.
    DeepCopy,
}

/// Shader program plus the ordered list of properties bound as its uniforms.
///
/// Property names are not unique. At bind time properties are written in
/// list order, so the last property with a given name wins.
pub struct Material {
    id: MaterialId,
    name: String,
    program: ShaderProgram,
    properties: Vec<MaterialProperty>,
    texture_sharing: TextureSharing,
}

impl Material {
    pub fn new(name: impl Into<String>, program: ShaderProgram) -> Self {
        Self::with_texture_sharing(name, program, TextureSharing::default())
    }

    pub fn with_texture_sharing(
        name: impl Into<String>,
        program: ShaderProgram,
        texture_sharing: TextureSharing,
    ) -> Self {
        Self {
            id: MaterialId::next(),
            name: name.into(),
            program,
            properties: Vec::new(),
            texture_sharing,
        }
    }

    pub fn with_property(mut self, property: MaterialProperty) -> Self {
        self.add_property(property);
        self
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut ShaderProgram {
        &mut self.program
    }

    pub fn texture_sharing(&self) -> TextureSharing {
        self.texture_sharing
    }

    pub fn properties(&self) -> &[MaterialProperty] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Vec<MaterialProperty> {
        &mut self.properties
    }

    /// Appends without checking for an existing property of the same name.
    pub fn add_property(&mut self, property: MaterialProperty) {
        self.properties.push(property);
    }

    /// The property that takes effect for `name` (the last one).
    pub fn property(&self, name: &str) -> Option<&MaterialProperty> {
        self.properties.iter().rev().find(|p| p.name == name)
    }

    /// Replaces the effective value for `name`, appending if absent.
    pub fn set_property(&mut self, name: &str, value: PropertyValue) {
        match self.properties.iter_mut().rev().find(|p| p.name == name) {
            Some(property) => property.value = value,
            None => self.properties.push(MaterialProperty::new(name, value)),
        }
    }

    pub fn textures(&self) -> impl Iterator<Item = &SharedTexture> {
        self.properties.iter().filter_map(|p| match &p.value {
            PropertyValue::Texture(texture) => Some(texture),
            _ => None,
        })
    }

    /// Forgets the program and every texture's GPU state. Shared textures
    /// are reset for every material using them.
    pub fn reset_created(&mut self) {
        self.program.reset_created();
        for texture in self.textures() {
            texture.borrow_mut().reset_created();
        }
    }
}

/// New identity and a fresh program from the same sources. Property values
/// are copied; textures follow [`TextureSharing`].
impl Clone for Material {
    fn clone(&self) -> Self {
        let properties = self
            .properties
            .iter()
            .map(|property| match (&property.value, self.texture_sharing) {
                (PropertyValue::Texture(texture), TextureSharing::DeepCopy) => {
                    let copy = texture.borrow().duplicate().into_shared();
                    MaterialProperty::texture(property.name.clone(), copy)
                }
                _ => property.clone(),
            })
            .collect();

        Self {
            id: MaterialId::next(),
            name: self.name.clone(),
            program: self.program.clone(),
            properties,
            texture_sharing: self.texture_sharing,
        }
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("program", &self.program)
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Result of checking a material's property names against the uniforms its
/// linked program actually exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformReport {
    pub material: MaterialId,
    pub unmatched: Vec<String>,
}

impl UniformReport {
    pub fn check(material: &Material, active_uniforms: &[String]) -> Self {
        let mut unmatched: Vec<String> = Vec::new();
        for property in material.properties() {
            let known = active_uniforms.iter().any(|u| *u == property.name);
            if !known && !unmatched.contains(&property.name) {
                unmatched.push(property.name.clone());
            }
        }

        Self {
            material: material.id(),
            unmatched,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::renderer::texture::Texture;

    fn program() -> ShaderProgram {
        ShaderProgram::from_sources("void main() {}", "void main() {}")
    }

    fn texture() -> SharedTexture {
        Texture::from_rgba8("white", vec![255u8; 4], 1, 1)
            .unwrap()
            .into_shared()
    }

    #[test]
    fn value_shape_follows_type() {
        let p = MaterialProperty::vec4("color", Vec4::new(0.86, 0.34, 0.56, 1.0));
        assert_eq!(p.property_type(), PropertyType::Vec4);
        assert_eq!(
            p.value.uniform(),
            Some(UniformValue::Vec4([0.86, 0.34, 0.56, 1.0]))
        );
        assert!(PropertyValue::Texture(texture()).uniform().is_none());
    }

    #[test]
    fn last_property_with_a_name_wins() {
        let mut material = Material::new("m", program())
            .with_property(MaterialProperty::scalar("gloss", 0.1))
            .with_property(MaterialProperty::scalar("gloss", 0.7));
        match material.property("gloss").map(|p| &p.value) {
            Some(PropertyValue::Scalar(v)) => assert_eq!(*v, 0.7),
            other => panic!("unexpected {other:?}"),
        }

        material.set_property("gloss", PropertyValue::Scalar(0.9));
        assert_eq!(material.properties().len(), 2);
        assert!(matches!(material.properties()[0].value, PropertyValue::Scalar(v) if v == 0.1));
        assert!(matches!(material.properties()[1].value, PropertyValue::Scalar(v) if v == 0.9));
    }

    #[test]
    fn clone_has_new_identity_and_shares_textures_by_default() {
        let tex = texture();
        let material =
            Material::new("m", program()).with_property(MaterialProperty::texture("tex", tex.clone()));
        let clone = material.clone();

        assert_ne!(material.id(), clone.id());
        assert_eq!(material.name(), clone.name());
        let shared = clone.textures().next().unwrap();
        assert!(Rc::ptr_eq(shared, &tex));
    }

    #[test]
    fn deep_copy_clone_owns_its_textures() {
        let tex = texture();
        let material = Material::with_texture_sharing("m", program(), TextureSharing::DeepCopy)
            .with_property(MaterialProperty::texture("tex", tex.clone()));
        let clone = material.clone();

        let copied = clone.textures().next().unwrap();
        assert!(!Rc::ptr_eq(copied, &tex));
        assert_eq!(copied.borrow().data(), tex.borrow().data());
    }

    #[test]
    fn report_lists_unmatched_names_once() {
        let material = Material::new("m", program())
            .with_property(MaterialProperty::vec4("color", Vec4::ONE))
            .with_property(MaterialProperty::scalar("typo", 1.0))
            .with_property(MaterialProperty::scalar("typo", 2.0));
        let report = UniformReport::check(&material, &["color".to_string()]);
        assert_eq!(report.unmatched, vec!["typo".to_string()]);
        assert!(!report.is_clean());
    }
}
