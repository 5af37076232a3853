// renderer/glow_context.rs
use glow::HasContext;

use super::buffer::{ComponentType, VertexAttribute};
use super::context::{BufferTarget, ClearMask, GraphicsContext, UniformValue};
use super::error::{RenderError, RenderResult};
use super::handle::{
    BufferHandle, BufferKind, HandleTable, ProgramHandle, ProgramKind, ShaderHandle, ShaderKind,
    TextureHandle, TextureKind,
};
use super::shader::ShaderStage;

/// [`GraphicsContext`] backed by `glow`: WebGL2 in the browser, desktop GL
/// natively.
pub struct GlowContext {
    gl: glow::Context,
    buffers: HandleTable<BufferKind, glow::Buffer>,
    shaders: HandleTable<ShaderKind, glow::Shader>,
    programs: HandleTable<ProgramKind, glow::Program>,
    textures: HandleTable<TextureKind, glow::Texture>,
    vertex_array: Option<glow::VertexArray>,
}

impl GlowContext {
    pub fn new(gl: glow::Context) -> Self {
        // Core profiles refuse attribute setup without a bound vertex array.
        let vertex_array = unsafe {
            match gl.create_vertex_array() {
                Ok(vao) => {
                    gl.bind_vertex_array(Some(vao));
                    Some(vao)
                }
                Err(err) => {
                    log::warn!("Could not create vertex array object: {}", err);
                    None
                }
            }
        };

        Self {
            gl,
            buffers: HandleTable::new(),
            shaders: HandleTable::new(),
            programs: HandleTable::new(),
            textures: HandleTable::new(),
            vertex_array,
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn target(target: BufferTarget) -> u32 {
        match target {
            BufferTarget::Vertex => glow::ARRAY_BUFFER,
            BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
        }
    }

    fn component_type(ty: ComponentType) -> u32 {
        match ty {
            ComponentType::Float => glow::FLOAT,
            ComponentType::Byte => glow::BYTE,
            ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
            ComponentType::Short => glow::SHORT,
            ComponentType::UnsignedShort => glow::UNSIGNED_SHORT,
        }
    }

    fn program(&self, program: ProgramHandle) -> Option<glow::Program> {
        self.programs.get(program).copied()
    }
}

impl GraphicsContext for GlowContext {
    fn create_buffer(&mut self) -> RenderResult<BufferHandle> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(|reason| {
            RenderError::ResourceCreation {
                kind: "buffer",
                reason,
            }
        })?;
        Ok(self.buffers.insert(buffer))
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let native = buffer.and_then(|handle| self.buffers.get(handle).copied());
        unsafe { self.gl.bind_buffer(Self::target(target), native) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(Self::target(target), data, glow::STATIC_DRAW)
        };
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(native) = self.buffers.remove(buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderHandle> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };

        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(|reason| RenderError::ResourceCreation {
                    kind: "shader",
                    reason,
                })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::ShaderCompile { stage, log });
            }

            Ok(self.shaders.insert(shader))
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if let Some(native) = self.shaders.remove(shader) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> RenderResult<ProgramHandle> {
        let (Some(vs), Some(fs)) = (
            self.shaders.get(vertex).copied(),
            self.shaders.get(fragment).copied(),
        ) else {
            return Err(RenderError::UnrealizedBind("shader"));
        };

        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(|reason| RenderError::ResourceCreation {
                    kind: "program",
                    reason,
                })?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(RenderError::ProgramLink { log });
            }

            Ok(self.programs.insert(program))
        }
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let native = program.and_then(|handle| self.program(handle));
        unsafe { self.gl.use_program(native) };
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(native) = self.programs.remove(program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        let native = self.program(program)?;
        unsafe { self.gl.get_attrib_location(native, name) }
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        attribute: &VertexAttribute,
        stride: usize,
        offset: usize,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                attribute.component_count as i32,
                Self::component_type(attribute.component_type),
                attribute.normalized,
                stride as i32,
                offset as i32,
            )
        };
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) };
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> bool {
        let Some(native) = self.program(program) else {
            return false;
        };
        let Some(location) = (unsafe { self.gl.get_uniform_location(native, name) }) else {
            return false;
        };

        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(location, false, &m),
            }
        }
        true
    }

    fn active_uniforms(&mut self, program: ProgramHandle) -> Vec<String> {
        let Some(native) = self.program(program) else {
            return Vec::new();
        };
        unsafe {
            let count = self.gl.get_active_uniforms(native);
            (0..count)
                .filter_map(|index| self.gl.get_active_uniform(native, index))
                .map(|uniform| {
                    // Arrays report as `name[0]`
                    uniform
                        .name
                        .strip_suffix("[0]")
                        .map(str::to_string)
                        .unwrap_or(uniform.name)
                })
                .collect()
        }
    }

    fn create_texture(&mut self) -> RenderResult<TextureHandle> {
        let texture = unsafe { self.gl.create_texture() }.map_err(|reason| {
            RenderError::ResourceCreation {
                kind: "texture",
                reason,
            }
        })?;
        Ok(self.textures.insert(texture))
    }

    fn active_texture_unit(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        let native = texture.and_then(|handle| self.textures.get(handle).copied());
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, native) };
    }

    fn upload_texture(&mut self, texture: TextureHandle, width: u32, height: u32, pixels: &[u8]) {
        let Some(native) = self.textures.get(texture).copied() else {
            log::error!("Upload to unknown texture {:?}", texture);
            return;
        };

        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.remove(texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn clear_color(&mut self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) };
    }

    fn enable_depth_test(&mut self) {
        unsafe { self.gl.enable(glow::DEPTH_TEST) };
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn draw_indexed_triangles(&mut self, count: usize) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count as i32, glow::UNSIGNED_INT, 0)
        };
    }
}

impl Drop for GlowContext {
    fn drop(&mut self) {
        if let Some(vao) = self.vertex_array.take() {
            unsafe { self.gl.delete_vertex_array(vao) };
        }
    }
}
