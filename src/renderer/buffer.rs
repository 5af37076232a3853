// renderer/buffer.rs
use std::rc::Rc;

use super::handle::{BufferHandle, ProgramHandle};
use super::resource::GpuState;

/// Host type of one vertex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Float,
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
}

impl ComponentType {
    /// Size in bytes of a single component.
    pub const fn size(self) -> usize {
        match self {
            ComponentType::Float => 4,
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub name: String,
    pub component_count: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
}

impl VertexAttribute {
    pub fn float(name: impl Into<String>, component_count: u32) -> Self {
        Self {
            name: name.into(),
            component_count,
            component_type: ComponentType::Float,
            normalized: false,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.component_type.size() * self.component_count as usize
    }
}

/// Interleaved vertex layout with offsets and stride fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    offsets: Vec<usize>,
    stride: usize,
}

impl VertexLayout {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        let mut offsets = Vec::with_capacity(attributes.len());
        let mut stride = 0;
        for attribute in &attributes {
            offsets.push(stride);
            stride += attribute.byte_size();
        }

        Self {
            attributes,
            offsets,
            stride,
        }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of `f32`s per vertex, assuming an all-float layout.
    pub fn floats_per_vertex(&self) -> usize {
        self.stride / ComponentType::Float.size()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VertexAttribute, usize)> {
        self.attributes.iter().zip(self.offsets.iter().copied())
    }
}

pub struct VertexBuffer {
    vertices: Rc<[f32]>,
    layout: VertexLayout,
    state: GpuState<BufferHandle>,
    /// Locations resolved against one program; stale once another is bound.
    attribute_locations: Option<(ProgramHandle, Vec<Option<u32>>)>,
}

impl VertexBuffer {
    pub fn new(vertices: impl Into<Rc<[f32]>>, layout: VertexLayout) -> Self {
        Self {
            vertices: vertices.into(),
            layout,
            state: GpuState::Unrealized,
            attribute_locations: None,
        }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> usize {
        match self.layout.floats_per_vertex() {
            0 => 0,
            n => self.vertices.len() / n,
        }
    }

    pub fn state(&self) -> GpuState<BufferHandle> {
        self.state
    }

    pub fn created(&self) -> bool {
        self.state.created()
    }

    pub(crate) fn set_state(&mut self, state: GpuState<BufferHandle>) {
        self.state = state;
    }

    /// Attribute locations in `program`, if they were resolved for it.
    pub(crate) fn attribute_locations(&self, program: ProgramHandle) -> Option<&[Option<u32>]> {
        match &self.attribute_locations {
            Some((resolved_for, locations)) if *resolved_for == program => Some(locations),
            _ => None,
        }
    }

    pub(crate) fn set_attribute_locations(
        &mut self,
        program: ProgramHandle,
        locations: Vec<Option<u32>>,
    ) {
        self.attribute_locations = Some((program, locations));
    }

    /// Replaces the vertex data and layout.
    ///
    /// An existing GPU buffer is kept and refilled on the next frame.
    pub fn update_geometry(&mut self, vertices: impl Into<Rc<[f32]>>, layout: VertexLayout) {
        self.vertices = vertices.into();
        if self.layout != layout {
            self.attribute_locations = None;
        }
        self.layout = layout;
        if let Some(handle) = self.state.handle() {
            self.state = GpuState::Allocated(handle);
        }
    }

    /// Forgets the GPU buffer and attribute bindings without releasing them.
    pub fn reset_created(&mut self) -> Option<BufferHandle> {
        self.attribute_locations = None;
        self.state.invalidate()
    }
}

/// Shares CPU data with the original but never the GPU buffer.
impl Clone for VertexBuffer {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.vertices), self.layout.clone())
    }
}

impl std::fmt::Debug for VertexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("floats", &self.vertices.len())
            .field("stride", &self.layout.stride())
            .field("state", &self.state)
            .finish()
    }
}

pub struct IndexBuffer {
    indices: Rc<[u32]>,
    state: GpuState<BufferHandle>,
}

impl IndexBuffer {
    pub fn new(indices: impl Into<Rc<[u32]>>) -> Self {
        Self {
            indices: indices.into(),
            state: GpuState::Unrealized,
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Element count, not byte size.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn state(&self) -> GpuState<BufferHandle> {
        self.state
    }

    pub fn created(&self) -> bool {
        self.state.created()
    }

    pub(crate) fn set_state(&mut self, state: GpuState<BufferHandle>) {
        self.state = state;
    }

    pub fn set_indices(&mut self, indices: impl Into<Rc<[u32]>>) {
        self.indices = indices.into();
        if let Some(handle) = self.state.handle() {
            self.state = GpuState::Allocated(handle);
        }
    }

    pub fn reset_created(&mut self) -> Option<BufferHandle> {
        self.state.invalidate()
    }
}

impl Clone for IndexBuffer {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.indices))
    }
}

impl std::fmt::Debug for IndexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuffer")
            .field("len", &self.indices.len())
            .field("state", &self.state)
            .finish()
    }
}
