// renderer/headless.rs
//! A [`GraphicsContext`] without a GPU.
//!
//! Every call is recorded so callers can count what the renderer issued.
//! Shader sources are scanned for `uniform` and `attribute`/`in`
//! declarations, which makes uniform and attribute lookups behave like a
//! driver that strips nothing. A source line containing `#error` fails
//! compilation with that line as the diagnostic, and a program whose stages
//! lack `main` fails to link.

use super::buffer::VertexAttribute;
use super::context::{BufferTarget, ClearMask, GraphicsContext, UniformValue};
use super::error::{RenderError, RenderResult};
use super::handle::{
    BufferHandle, BufferKind, HandleTable, ProgramHandle, ProgramKind, ShaderHandle, ShaderKind,
    TextureHandle, TextureKind,
};
use super::shader::ShaderStage;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(BufferHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    BufferData { target: BufferTarget, bytes: usize },
    DeleteBuffer(BufferHandle),
    CompileShader(ShaderStage),
    DeleteShader(ShaderHandle),
    LinkProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    DeleteProgram(ProgramHandle),
    VertexAttribPointer { location: u32, stride: usize, offset: usize },
    EnableVertexAttribArray(u32),
    SetUniform { name: String, value: UniformValue },
    CreateTexture(TextureHandle),
    ActiveTexture(u32),
    BindTexture(Option<TextureHandle>),
    UploadTexture { texture: TextureHandle, width: u32, height: u32 },
    DeleteTexture(TextureHandle),
    ClearColor([f32; 4]),
    Clear(ClearMask),
    EnableDepthTest,
    Viewport(i32, i32, i32, i32),
    DrawIndexed(usize),
}

struct ShaderInfo {
    stage: ShaderStage,
    uniforms: Vec<String>,
    attributes: Vec<String>,
    has_main: bool,
}

struct ProgramInfo {
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

#[derive(Default)]
pub struct HeadlessContext {
    calls: Vec<Call>,
    buffers: HandleTable<BufferKind, usize>,
    shaders: HandleTable<ShaderKind, ShaderInfo>,
    programs: HandleTable<ProgramKind, ProgramInfo>,
    textures: HandleTable<TextureKind, ()>,
    bound_vertex: Option<BufferHandle>,
    bound_index: Option<BufferHandle>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Values written to `name`, in call order.
    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::SetUniform { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    fn record(&mut self, call: Call) {
        log::trace!("headless: {:?}", call);
        self.calls.push(call);
    }
}

/// Last identifier of a declaration, without array suffix or semicolon.
fn declared_name(tokens: &[&str]) -> Option<String> {
    let last = tokens.last()?.trim_end_matches(';');
    let name = last.split('[').next().unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}

fn scan_source(stage: ShaderStage, source: &str) -> ShaderInfo {
    let mut uniforms = Vec::new();
    let mut attributes = Vec::new();
    let mut has_main = false;

    for line in source.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if line.contains("main(") {
            has_main = true;
        }
        if !line.ends_with(';') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.contains(&"uniform") {
            uniforms.extend(declared_name(&tokens));
        } else if tokens.contains(&"attribute")
            || (stage == ShaderStage::Vertex && tokens.contains(&"in"))
        {
            attributes.extend(declared_name(&tokens));
        }
    }

    ShaderInfo {
        stage,
        uniforms,
        attributes,
        has_main,
    }
}

impl GraphicsContext for HeadlessContext {
    fn create_buffer(&mut self) -> RenderResult<BufferHandle> {
        let handle = self.buffers.insert(0);
        self.record(Call::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        match target {
            BufferTarget::Vertex => self.bound_vertex = buffer,
            BufferTarget::Index => self.bound_index = buffer,
        }
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        self.record(Call::BufferData {
            target,
            bytes: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(buffer);
        self.record(Call::DeleteBuffer(buffer));
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderHandle> {
        self.record(Call::CompileShader(stage));

        if let Some((number, line)) = source
            .lines()
            .enumerate()
            .find(|(_, line)| line.contains("#error"))
        {
            return Err(RenderError::ShaderCompile {
                stage,
                log: format!("ERROR: 0:{}: {}", number + 1, line.trim()),
            });
        }

        Ok(self.shaders.insert(scan_source(stage, source)))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(shader);
        self.record(Call::DeleteShader(shader));
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> RenderResult<ProgramHandle> {
        let (Some(vs), Some(fs)) = (self.shaders.get(vertex), self.shaders.get(fragment)) else {
            return Err(RenderError::UnrealizedBind("shader"));
        };

        for info in [vs, fs] {
            if !info.has_main {
                return Err(RenderError::ProgramLink {
                    log: format!("missing main() in {:?} shader", info.stage),
                });
            }
        }

        let mut uniforms = vs.uniforms.clone();
        for name in &fs.uniforms {
            if !uniforms.contains(name) {
                uniforms.push(name.clone());
            }
        }
        let program = ProgramInfo {
            uniforms,
            attributes: vs.attributes.clone(),
        };

        let handle = self.programs.insert(program);
        self.record(Call::LinkProgram(handle));
        Ok(handle)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(program);
        self.record(Call::DeleteProgram(program));
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs
            .get(program)?
            .attributes
            .iter()
            .position(|attribute| attribute == name)
            .map(|index| index as u32)
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        _attribute: &VertexAttribute,
        stride: usize,
        offset: usize,
    ) {
        self.record(Call::VertexAttribPointer {
            location,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.record(Call::EnableVertexAttribArray(location));
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> bool {
        let known = self
            .programs
            .get(program)
            .is_some_and(|info| info.uniforms.iter().any(|uniform| uniform == name));
        if known {
            self.record(Call::SetUniform {
                name: name.to_string(),
                value,
            });
        }
        known
    }

    fn active_uniforms(&mut self, program: ProgramHandle) -> Vec<String> {
        self.programs
            .get(program)
            .map(|info| info.uniforms.clone())
            .unwrap_or_default()
    }

    fn create_texture(&mut self) -> RenderResult<TextureHandle> {
        let handle = self.textures.insert(());
        self.record(Call::CreateTexture(handle));
        Ok(handle)
    }

    fn active_texture_unit(&mut self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.record(Call::BindTexture(texture));
    }

    fn upload_texture(&mut self, texture: TextureHandle, width: u32, height: u32, _pixels: &[u8]) {
        self.record(Call::UploadTexture {
            texture,
            width,
            height,
        });
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture);
        self.record(Call::DeleteTexture(texture));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.record(Call::ClearColor(color));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(Call::Clear(mask));
    }

    fn enable_depth_test(&mut self) {
        self.record(Call::EnableDepthTest);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn draw_indexed_triangles(&mut self, count: usize) {
        if self.bound_vertex.is_none() || self.bound_index.is_none() {
            log::warn!("headless: draw with no vertex or index buffer bound");
        }
        self.record(Call::DrawIndexed(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "
        attribute vec3 position;
        in vec2 texCoord;
        uniform mat4 transform;
        void main() {}
    ";
    const FS: &str = "
        uniform sampler2D texture;
        uniform vec4 lights[4];
        void main() {}
    ";

    fn linked(ctx: &mut HeadlessContext) -> ProgramHandle {
        let vs = ctx.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = ctx.compile_shader(ShaderStage::Fragment, FS).unwrap();
        ctx.link_program(vs, fs).unwrap()
    }

    #[test]
    fn reflects_declarations() {
        let mut ctx = HeadlessContext::new();
        let program = linked(&mut ctx);
        assert_eq!(
            ctx.active_uniforms(program),
            vec!["transform", "texture", "lights"]
        );
        assert_eq!(ctx.attribute_location(program, "position"), Some(0));
        assert_eq!(ctx.attribute_location(program, "texCoord"), Some(1));
        assert_eq!(ctx.attribute_location(program, "normal"), None);
    }

    #[test]
    fn unknown_uniform_is_not_written() {
        let mut ctx = HeadlessContext::new();
        let program = linked(&mut ctx);
        assert!(!ctx.set_uniform(program, "missing", UniformValue::Float(1.0)));
        assert!(ctx.set_uniform(program, "transform", UniformValue::Mat4([0.0; 16])));
        assert_eq!(ctx.uniform_writes("transform").len(), 1);
        assert!(ctx.uniform_writes("missing").is_empty());
    }

    #[test]
    fn error_directive_fails_compilation() {
        let mut ctx = HeadlessContext::new();
        let err = ctx
            .compile_shader(ShaderStage::Fragment, "void main() {}\n#error broken")
            .unwrap_err();
        match err {
            RenderError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("0:2"), "{log}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_main_fails_link() {
        let mut ctx = HeadlessContext::new();
        let vs = ctx.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = ctx
            .compile_shader(ShaderStage::Fragment, "uniform vec4 color;")
            .unwrap();
        assert!(matches!(
            ctx.link_program(vs, fs),
            Err(RenderError::ProgramLink { .. })
        ));
    }
}
