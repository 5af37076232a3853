// renderer/renderer.rs
use std::rc::Rc;

use glam::Mat4;

use crate::renderer::buffer::{IndexBuffer, VertexBuffer};
use crate::renderer::context::{BufferTarget, ClearMask, GraphicsContext, UniformValue};
use crate::renderer::error::{RenderError, RenderResult};
use crate::renderer::frame_loop::{CancelToken, FrameStats};
use crate::renderer::material::{Material, PropertyValue, UniformReport};
use crate::renderer::resource::GpuState;
use crate::renderer::shader::ShaderProgram;
use crate::scene::{Scene, SceneObject};
use crate::time::FrameClock;

const PERSPECTIVE_UNIFORM: &str = "perspective";
const VIEW_UNIFORM: &str = "view";
const TRANSFORM_UNIFORM: &str = "transform";

/// Draws a [`Scene`] through a [`GraphicsContext`].
///
/// The renderer keeps no per-object state of its own. Everything it realizes
/// is recorded on the scene's resources, so the same objects can be handed to
/// another renderer after [`SceneObject::reset_created`].
pub struct Renderer<C: GraphicsContext> {
    ctx: C,
    cancel: CancelToken,
    viewport: (u32, u32),
}

impl<C: GraphicsContext> Renderer<C> {
    pub fn new(ctx: C) -> Self {
        Self {
            ctx,
            cancel: CancelToken::new(),
            viewport: (0, 0),
        }
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn into_context(self) -> C {
        self.ctx
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.ctx.viewport(0, 0, width as i32, height as i32);
    }

    /// Token that ends [`run`](Self::run) once cancelled. Hand clones to
    /// whatever owns the viewport's lifetime.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ends the current or next [`run`](Self::run). A stop requested before
    /// the loop starts is honoured: that run draws nothing.
    pub fn stop_drawing_scene(&self) {
        log::info!("Render loop stop requested");
        self.cancel.cancel();
    }

    /// Draws frames as the clock delivers them until the loop is stopped or
    /// the clock runs out. The first error ends the loop.
    ///
    /// The stop flag is cleared when the loop exits, so a stop ends one run
    /// only.
    pub fn run(&mut self, scene: &mut Scene, clock: &mut impl FrameClock) -> RenderResult<FrameStats> {
        let mut stats = FrameStats::default();

        let result = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }
            let Some(timestamp) = clock.next_frame() else {
                break Ok(());
            };
            if let Err(err) = self.draw_scene(scene) {
                break Err(err);
            }
            stats.record(timestamp);
        };
        self.cancel.reset();
        result?;

        log::info!("Render loop finished after {} frames", stats.frames);
        Ok(stats)
    }

    /// One frame: update the scene, realize new resources, then draw every
    /// object in list order.
    pub fn draw_scene(&mut self, scene: &mut Scene) -> RenderResult<()> {
        self.ctx.clear(ClearMask::COLOR);
        scene.advance_frame();
        self.preprocess_scene(scene)?;

        self.ctx.clear_color(scene.background_color().to_array());
        self.ctx.enable_depth_test();
        self.ctx.clear(ClearMask::COLOR | ClearMask::DEPTH);

        let (perspective, view) = scene
            .camera()
            .map_or((Mat4::IDENTITY, Mat4::IDENTITY), |camera| {
                (camera.perspective(), camera.view_matrix())
            });

        for object in scene.objects() {
            self.bind_scene_object(object)?;
            if let Some(program) = object.material().program().handle() {
                let set = |ctx: &mut C, name: &str, m: Mat4| {
                    ctx.set_uniform(program, name, UniformValue::Mat4(m.to_cols_array()));
                };
                set(&mut self.ctx, PERSPECTIVE_UNIFORM, perspective);
                set(&mut self.ctx, VIEW_UNIFORM, view);
                set(&mut self.ctx, TRANSFORM_UNIFORM, object.transform());
            }
            self.ctx.draw_indexed_triangles(object.index_buffer().len());
            self.unbind_scene_object();
        }
        Ok(())
    }

    /// Realizes whatever is not yet on the GPU. Already realized resources
    /// issue no calls.
    pub fn preprocess_scene(&mut self, scene: &mut Scene) -> RenderResult<()> {
        for object in scene.objects_mut() {
            self.realize_object(object)?;
        }
        Ok(())
    }

    pub fn realize_object(&mut self, object: &mut SceneObject) -> RenderResult<()> {
        let (vertex_buffer, index_buffer, material) = object.parts_mut();
        self.realize_vertex_buffer(vertex_buffer)?;
        self.realize_index_buffer(index_buffer)?;
        self.realize_program(material)?;
        self.realize_attributes(vertex_buffer, material.program())?;
        self.realize_textures(material)
    }

    fn realize_vertex_buffer(&mut self, buffer: &mut VertexBuffer) -> RenderResult<()> {
        let handle = match buffer.state() {
            GpuState::Uploaded(_) => return Ok(()),
            GpuState::Allocated(handle) => handle,
            GpuState::Unrealized => {
                let handle = self.ctx.create_buffer()?;
                log::debug!("Created vertex buffer {:?}", handle);
                handle
            }
        };

        self.ctx.bind_buffer(BufferTarget::Vertex, Some(handle));
        self.ctx.buffer_data(BufferTarget::Vertex, buffer.bytes());
        buffer.set_state(GpuState::Uploaded(handle));
        Ok(())
    }

    fn realize_index_buffer(&mut self, buffer: &mut IndexBuffer) -> RenderResult<()> {
        let handle = match buffer.state() {
            GpuState::Uploaded(_) => return Ok(()),
            GpuState::Allocated(handle) => handle,
            GpuState::Unrealized => {
                let handle = self.ctx.create_buffer()?;
                log::debug!("Created index buffer {:?}", handle);
                handle
            }
        };

        self.ctx.bind_buffer(BufferTarget::Index, Some(handle));
        self.ctx.buffer_data(BufferTarget::Index, buffer.bytes());
        buffer.set_state(GpuState::Uploaded(handle));
        Ok(())
    }

    /// Compiles both stages and links. Failures are kept on the shader or
    /// program and returned again on every later frame without recompiling.
    fn realize_program(&mut self, material: &mut Material) -> RenderResult<()> {
        let program = material.program_mut();
        if program.created() {
            return Ok(());
        }
        if let Some(log) = program.link_error() {
            return Err(RenderError::ProgramLink {
                log: log.to_string(),
            });
        }

        let (vertex, fragment) = program.shaders_mut();
        for shader in [vertex, fragment] {
            if let Some(log) = shader.compile_error() {
                return Err(RenderError::ShaderCompile {
                    stage: shader.stage(),
                    log: log.to_string(),
                });
            }
            if shader.created() {
                continue;
            }
            match self.ctx.compile_shader(shader.stage(), shader.source()) {
                Ok(handle) => shader.set_state(GpuState::Uploaded(handle)),
                Err(err) => {
                    log::error!("{}", err);
                    if let RenderError::ShaderCompile { log, .. } = &err {
                        shader.set_compile_error(log.clone());
                    }
                    return Err(err);
                }
            }
        }

        let (Some(vs), Some(fs)) = (
            program.vertex_shader().state().handle(),
            program.fragment_shader().state().handle(),
        ) else {
            return Err(RenderError::UnrealizedBind("shader"));
        };

        match self.ctx.link_program(vs, fs) {
            Ok(handle) => {
                log::debug!("Linked program {:?} for material '{}'", handle, material.name());
                material.program_mut().set_state(GpuState::Uploaded(handle));
            }
            Err(err) => {
                log::error!("{}", err);
                if let RenderError::ProgramLink { log } = &err {
                    material.program_mut().set_link_error(log.clone());
                }
                return Err(err);
            }
        }

        if let Some(report) = self.validate_material(material) {
            if !report.is_clean() {
                log::warn!(
                    "Material '{}' has properties with no matching uniform: {}",
                    material.name(),
                    report.unmatched.join(", ")
                );
            }
        }
        Ok(())
    }

    /// Resolves attribute locations of the buffer's layout in `program`.
    fn realize_attributes(
        &mut self,
        buffer: &mut VertexBuffer,
        program: &ShaderProgram,
    ) -> RenderResult<()> {
        let Some(handle) = program.handle() else {
            return Err(RenderError::UnrealizedBind("shader program"));
        };
        if buffer.attribute_locations(handle).is_some() {
            return Ok(());
        }

        let locations: Vec<Option<u32>> = buffer
            .layout()
            .attributes()
            .iter()
            .map(|attribute| {
                let location = self.ctx.attribute_location(handle, &attribute.name);
                if location.is_none() {
                    log::debug!("Attribute '{}' is not used by the program", attribute.name);
                }
                location
            })
            .collect();
        buffer.set_attribute_locations(handle, locations);
        Ok(())
    }

    /// Allocates every texture, then uploads those whose pixels are present.
    /// A texture still waiting for pixels stays allocated and is retried on
    /// the next frame.
    fn realize_textures(&mut self, material: &Material) -> RenderResult<()> {
        for texture in material.textures() {
            let mut texture = texture.borrow_mut();
            if !texture.created() {
                let handle = self.ctx.create_texture()?;
                log::debug!("Created texture {:?} for '{}'", handle, texture.name());
                texture.set_state(GpuState::Allocated(handle));
            }

            let pending_upload = match texture.state() {
                GpuState::Allocated(handle) if texture.has_pixels() => Some(handle),
                _ => None,
            };
            if let Some(handle) = pending_upload {
                if let Some(pixels) = texture.data() {
                    self.ctx.active_texture_unit(0);
                    self.ctx
                        .upload_texture(handle, texture.width(), texture.height(), pixels);
                }
                log::debug!(
                    "Uploaded texture '{}' ({}x{})",
                    texture.name(),
                    texture.width(),
                    texture.height()
                );
                texture.set_state(GpuState::Uploaded(handle));
            }
        }
        Ok(())
    }

    /// Binds buffers, attribute pointers and material for one draw.
    pub fn bind_scene_object(&mut self, object: &SceneObject) -> RenderResult<()> {
        let vertex_buffer = object.vertex_buffer();
        let Some(vertex_handle) = vertex_buffer.state().handle() else {
            return Err(RenderError::UnrealizedBind("vertex buffer"));
        };
        let Some(index_handle) = object.index_buffer().state().handle() else {
            return Err(RenderError::UnrealizedBind("index buffer"));
        };
        let Some(program) = object.material().program().handle() else {
            return Err(RenderError::UnrealizedBind("shader program"));
        };
        let Some(locations) = vertex_buffer.attribute_locations(program) else {
            return Err(RenderError::UnrealizedBind("vertex attributes"));
        };

        self.ctx.bind_buffer(BufferTarget::Vertex, Some(vertex_handle));
        self.ctx.bind_buffer(BufferTarget::Index, Some(index_handle));

        let layout = vertex_buffer.layout();
        for ((attribute, offset), location) in layout.iter().zip(locations) {
            if let Some(location) = *location {
                self.ctx
                    .vertex_attrib_pointer(location, attribute, layout.stride(), offset);
                self.ctx.enable_vertex_attrib_array(location);
            }
        }

        self.set_material(object.material())
    }

    pub fn unbind_scene_object(&mut self) {
        self.ctx.bind_buffer(BufferTarget::Vertex, None);
        self.ctx.bind_buffer(BufferTarget::Index, None);
        self.ctx.bind_texture(None);
        self.ctx.use_program(None);
    }

    /// Uses the material's program and writes its properties in list order.
    /// Textures take consecutive units starting at 0; one still waiting for
    /// its pixels is left unbound. Names the program does not declare are
    /// skipped.
    pub fn set_material(&mut self, material: &Material) -> RenderResult<()> {
        let Some(program) = material.program().handle() else {
            return Err(RenderError::UnrealizedBind("shader program"));
        };
        self.ctx.use_program(Some(program));

        let mut unit = 0;
        for property in material.properties() {
            match &property.value {
                PropertyValue::Texture(texture) => {
                    let texture = texture.borrow();
                    if let GpuState::Uploaded(handle) = texture.state() {
                        self.ctx.active_texture_unit(unit);
                        self.ctx.bind_texture(Some(handle));
                        self.ctx
                            .set_uniform(program, &property.name, UniformValue::Int(unit as i32));
                        unit += 1;
                    }
                }
                value => {
                    if let Some(uniform) = value.uniform() {
                        self.ctx.set_uniform(program, &property.name, uniform);
                    }
                }
            }
        }
        Ok(())
    }

    /// Property names with no active uniform in the material's linked
    /// program. `None` until the program has been linked.
    pub fn validate_material(&mut self, material: &Material) -> Option<UniformReport> {
        let program = material.program().handle()?;
        let active = self.ctx.active_uniforms(program);
        Some(UniformReport::check(material, &active))
    }

    /// Deletes the object's GPU resources and marks them unrealized.
    ///
    /// Textures still referenced by other materials are left untouched; the
    /// last material to release a texture deletes it.
    pub fn release_object(&mut self, object: &mut SceneObject) {
        log::debug!("Releasing GPU resources of {}", object.id());
        let (vertex_buffer, index_buffer, material) = object.parts_mut();

        if let Some(handle) = vertex_buffer.reset_created() {
            self.ctx.delete_buffer(handle);
        }
        if let Some(handle) = index_buffer.reset_created() {
            self.ctx.delete_buffer(handle);
        }

        let program = material.program_mut();
        let handles = (
            program.handle(),
            program.vertex_shader().state().handle(),
            program.fragment_shader().state().handle(),
        );
        program.reset_created();
        if let Some(handle) = handles.0 {
            self.ctx.delete_program(handle);
        }
        for shader in [handles.1, handles.2].into_iter().flatten() {
            self.ctx.delete_shader(shader);
        }

        for texture in material.textures() {
            if Rc::strong_count(texture) > 1 {
                continue;
            }
            if let Some(handle) = texture.borrow_mut().reset_created() {
                self.ctx.delete_texture(handle);
            }
        }
    }
}
