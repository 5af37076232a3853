// renderer/context.rs
use bitflags::bitflags;

use super::buffer::VertexAttribute;
use super::error::RenderResult;
use super::handle::{BufferHandle, ProgramHandle, ShaderHandle, TextureHandle};
use super::shader::ShaderStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Vertex,
    Index,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Typed value for a uniform write. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

/// The host graphics API the [`Renderer`](super::Renderer) drives.
///
/// The surface mirrors an immediate-mode GL context: one bound program, one
/// bound buffer per target, named uniforms and attributes. Implementations
/// hand out [`Handle`](super::handle::Handle)s for the objects they create.
pub trait GraphicsContext {
    fn create_buffer(&mut self) -> RenderResult<BufferHandle>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);
    /// Fills the buffer currently bound to `target` with static data.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Compiles one stage. Failure carries the compiler's diagnostic log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderHandle>;
    fn delete_shader(&mut self, shader: ShaderHandle);
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> RenderResult<ProgramHandle>;
    fn use_program(&mut self, program: Option<ProgramHandle>);
    fn delete_program(&mut self, program: ProgramHandle);

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32>;
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        attribute: &VertexAttribute,
        stride: usize,
        offset: usize,
    );
    fn enable_vertex_attrib_array(&mut self, location: u32);

    /// Writes a uniform of the currently used program. Returns `false` when
    /// `name` is not an active uniform; nothing is written in that case.
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> bool;
    fn active_uniforms(&mut self, program: ProgramHandle) -> Vec<String>;

    fn create_texture(&mut self) -> RenderResult<TextureHandle>;
    fn active_texture_unit(&mut self, unit: u32);
    fn bind_texture(&mut self, texture: Option<TextureHandle>);
    /// Uploads RGBA8 pixels into mip level 0 and generates the mip chain.
    fn upload_texture(&mut self, texture: TextureHandle, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&mut self, texture: TextureHandle);

    fn clear_color(&mut self, color: [f32; 4]);
    fn clear(&mut self, mask: ClearMask);
    fn enable_depth_test(&mut self);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Draws `count` `u32` indices from the bound index buffer as triangles.
    fn draw_indexed_triangles(&mut self, count: usize);
}
