//! Browser entry points: a WebGL2 context from a `<canvas>` and a render loop
//! driven by `requestAnimationFrame`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use instant::Instant;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::renderer::{
    CancelToken, FrameStats, GlowContext, GraphicsContext, RenderError, RenderResult, Renderer,
};
use crate::scene::Scene;
use crate::settings::EditorSettings;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// WebGL2 context of the canvas with element id `canvas_id`.
///
/// Any failure here is fatal for the viewport: there is nothing to draw to.
pub fn context_from_canvas(canvas_id: &str) -> RenderResult<GlowContext> {
    let missing = |what: String| RenderError::MissingContext(what);

    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| missing("no window document".into()))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| missing(format!("no element with id '{}'", canvas_id)))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| missing(format!("element '{}' is not a canvas", canvas_id)))?;
    let webgl2 = canvas
        .get_context("webgl2")
        .map_err(|err| missing(format!("get_context failed: {:?}", err)))?
        .ok_or_else(|| missing("WebGL2 is not supported".into()))?
        .dyn_into::<web_sys::WebGl2RenderingContext>()
        .map_err(|_| missing("context is not WebGL2".into()))?;

    log::info!("Acquired WebGL2 context from canvas '{}'", canvas_id);
    Ok(GlowContext::new(glow::Context::from_webgl2_context(webgl2)))
}

fn request_frame(callback: &FrameCallback) -> Option<i32> {
    let window = web_sys::window()?;
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(id) => Some(id),
        Err(err) => {
            log::error!("requestAnimationFrame failed: {:?}", err);
            None
        }
    }
}

/// Draws one frame per display refresh until stopped or a frame fails.
///
/// Frames never overlap: the next one is requested only after the current
/// one has finished drawing.
pub struct AnimationLoop {
    cancel: CancelToken,
    request_id: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<FrameCallback>>>,
    stats: Rc<Cell<FrameStats>>,
}

impl AnimationLoop {
    pub fn start<C: GraphicsContext + 'static>(
        renderer: Rc<RefCell<Renderer<C>>>,
        scene: Rc<RefCell<Scene>>,
    ) -> Self {
        let cancel = renderer.borrow().cancel_token();
        let request_id = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
        let stats = Rc::new(Cell::new(FrameStats::default()));
        let started = Instant::now();

        let frame = {
            let cancel = cancel.clone();
            let request_id = Rc::clone(&request_id);
            let callback = Rc::clone(&callback);
            let stats = Rc::clone(&stats);
            move |_timestamp: f64| {
                request_id.set(None);
                if cancel.is_cancelled() {
                    return;
                }

                let result = renderer.borrow_mut().draw_scene(&mut scene.borrow_mut());
                if let Err(err) = result {
                    log::error!("Render loop halted: {}", err);
                    cancel.cancel();
                    return;
                }

                let mut current = stats.get();
                current.record(started.elapsed().as_secs_f64());
                stats.set(current);

                if let Some(next) = callback.borrow().as_ref() {
                    request_id.set(request_frame(next));
                }
            }
        };

        let closure = Closure::wrap(Box::new(frame) as Box<dyn FnMut(f64)>);
        request_id.set(request_frame(&closure));
        *callback.borrow_mut() = Some(closure);

        Self {
            cancel,
            request_id,
            callback,
            stats,
        }
    }

    /// Cancels the pending frame request. A frame already running completes.
    pub fn stop(&self) {
        self.cancel.cancel();
        if let (Some(id), Some(window)) = (self.request_id.take(), web_sys::window()) {
            if let Err(err) = window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {:?}", err);
            }
        }
        log::info!("Animation loop stopped after {} frames", self.stats.get().frames);
    }

    pub fn stats(&self) -> FrameStats {
        self.stats.get()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
        // Breaks the closure's reference to itself
        self.callback.borrow_mut().take();
    }
}

thread_local! {
    static ACTIVE_LOOP: RefCell<Option<AnimationLoop>> = const { RefCell::new(None) };
}

/// Mounts the primitives demo on the canvas `canvas_id`, replacing any
/// viewport mounted earlier.
#[wasm_bindgen]
pub fn mount_viewport(canvas_id: &str) -> Result<(), JsValue> {
    unmount_viewport();

    let settings = EditorSettings::load();
    let ctx = context_from_canvas(canvas_id).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let mut renderer = Renderer::new(ctx);
    renderer.set_viewport(settings.viewport.width, settings.viewport.height);
    let scene = crate::demo_scenes::primitives_scene(&settings);

    let animation = AnimationLoop::start(Rc::new(RefCell::new(renderer)), Rc::new(RefCell::new(scene)));
    ACTIVE_LOOP.with(|active| *active.borrow_mut() = Some(animation));
    Ok(())
}

#[wasm_bindgen]
pub fn unmount_viewport() {
    // Dropping the loop stops it
    ACTIVE_LOOP.with(|active| drop(active.borrow_mut().take()));
}
