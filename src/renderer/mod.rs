pub mod buffer;
pub mod context;
pub mod error;
pub mod frame_loop;
pub mod glow_context;
pub mod handle;
pub mod headless;
pub mod material;
pub mod primitives;
pub mod renderer;
pub mod resource;
pub mod shader;
pub mod texture;

pub use buffer::{ComponentType, IndexBuffer, VertexAttribute, VertexBuffer, VertexLayout};
pub use context::{BufferTarget, ClearMask, GraphicsContext, UniformValue};
pub use error::{RenderError, RenderResult};
pub use frame_loop::{CancelToken, FrameStats};
pub use glow_context::GlowContext;
pub use handle::{BufferHandle, Handle, ProgramHandle, ShaderHandle, TextureHandle};
pub use headless::{Call, HeadlessContext};
pub use material::{
    Material, MaterialId, MaterialProperty, PropertyType, PropertyValue, TextureSharing,
    UniformReport,
};
pub use renderer::Renderer;
pub use resource::GpuState;
pub use shader::{Shader, ShaderProgram, ShaderStage};
pub use texture::{SharedTexture, Texture};
