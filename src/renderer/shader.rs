// renderer/shader.rs
use std::rc::Rc;

use super::handle::{ProgramHandle, ShaderHandle};
use super::resource::GpuState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// One compile unit. Compilation happens lazily in the renderer and a
/// failure is final for this object: the diagnostic is kept and returned on
/// every later attempt.
pub struct Shader {
    source: Rc<str>,
    stage: ShaderStage,
    state: GpuState<ShaderHandle>,
    compile_error: Option<String>,
}

impl Shader {
    pub fn new(source: impl Into<Rc<str>>, stage: ShaderStage) -> Self {
        Self {
            source: source.into(),
            stage,
            state: GpuState::Unrealized,
            compile_error: None,
        }
    }

    pub fn vertex(source: impl Into<Rc<str>>) -> Self {
        Self::new(source, ShaderStage::Vertex)
    }

    pub fn fragment(source: impl Into<Rc<str>>) -> Self {
        Self::new(source, ShaderStage::Fragment)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn state(&self) -> GpuState<ShaderHandle> {
        self.state
    }

    pub fn created(&self) -> bool {
        self.state.created()
    }

    pub fn compile_error(&self) -> Option<&str> {
        self.compile_error.as_deref()
    }

    pub(crate) fn set_state(&mut self, state: GpuState<ShaderHandle>) {
        self.state = state;
    }

    pub(crate) fn set_compile_error(&mut self, log: String) {
        self.compile_error = Some(log);
    }

    pub fn reset_created(&mut self) -> Option<ShaderHandle> {
        self.state.invalidate()
    }
}

/// A fresh compile unit with the same source, so the clone can compile into
/// a separate program.
impl Clone for Shader {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.source), self.stage)
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("stage", &self.stage)
            .field("state", &self.state)
            .field("failed", &self.compile_error.is_some())
            .finish()
    }
}

/// Exactly one vertex and one fragment shader, exclusively owned.
pub struct ShaderProgram {
    vertex: Shader,
    fragment: Shader,
    state: GpuState<ProgramHandle>,
    link_error: Option<String>,
}

impl ShaderProgram {
    /// # Panics
    ///
    /// Panics if the shaders are not a vertex and a fragment shader, in that
    /// order. Mixing them up is a construction bug, not a runtime condition.
    pub fn new(vertex: Shader, fragment: Shader) -> Self {
        assert_eq!(vertex.stage(), ShaderStage::Vertex, "first shader must be a vertex shader");
        assert_eq!(
            fragment.stage(),
            ShaderStage::Fragment,
            "second shader must be a fragment shader"
        );

        Self {
            vertex,
            fragment,
            state: GpuState::Unrealized,
            link_error: None,
        }
    }

    pub fn from_sources(vertex: &str, fragment: &str) -> Self {
        Self::new(Shader::vertex(vertex), Shader::fragment(fragment))
    }

    pub fn vertex_shader(&self) -> &Shader {
        &self.vertex
    }

    pub fn fragment_shader(&self) -> &Shader {
        &self.fragment
    }

    pub(crate) fn shaders_mut(&mut self) -> (&mut Shader, &mut Shader) {
        (&mut self.vertex, &mut self.fragment)
    }

    pub fn state(&self) -> GpuState<ProgramHandle> {
        self.state
    }

    pub fn handle(&self) -> Option<ProgramHandle> {
        self.state.handle()
    }

    pub fn created(&self) -> bool {
        self.state.created()
    }

    pub fn link_error(&self) -> Option<&str> {
        self.link_error.as_deref()
    }

    pub(crate) fn set_state(&mut self, state: GpuState<ProgramHandle>) {
        self.state = state;
    }

    pub(crate) fn set_link_error(&mut self, log: String) {
        self.link_error = Some(log);
    }

    /// Forgets the program and both shader objects.
    pub fn reset_created(&mut self) {
        self.vertex.reset_created();
        self.fragment.reset_created();
        self.state.invalidate();
    }
}

impl Clone for ShaderProgram {
    fn clone(&self) -> Self {
        Self::new(self.vertex.clone(), self.fragment.clone())
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("vertex", &self.vertex)
            .field("fragment", &self.fragment)
            .field("state", &self.state)
            .finish()
    }
}
