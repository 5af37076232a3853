// renderer/frame_loop.rs
use std::cell::Cell;
use std::rc::Rc;

/// Stop flag shared between the render loop and whoever tears the viewport
/// down. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn reset(&self) {
        self.0.set(false);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    /// Clock timestamp of the last drawn frame, in seconds.
    pub last_frame_at: f64,
}

impl FrameStats {
    pub(crate) fn record(&mut self, timestamp: f64) {
        self.frames += 1;
        self.last_frame_at = timestamp;
    }
}
