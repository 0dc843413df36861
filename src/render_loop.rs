// src/render_loop.rs
//! Self-rescheduling frame loop.
//!
//! Every tick runs the controls update, then exactly one draw, then asks for
//! the next frame. A new frame is only requested after the previous one has
//! returned, so frames never overlap. `stop` ends the cycle.

use winit::window::Window;

use crate::app::AppContext;
use crate::error::Result;

/// Requests the next display refresh.
pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

/// Draws the scene as seen through the camera, once per call.
pub trait SceneDrawer {
    fn draw(&mut self, app: &mut AppContext) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Not started yet.
    #[default]
    Idle,
    /// A frame has been requested and not yet run.
    Scheduled,
    Stopped,
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    state: LoopState,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Request the first frame. Does nothing unless the loop is idle.
    pub fn start<S: FrameScheduler + ?Sized>(&mut self, scheduler: &S) {
        if self.state == LoopState::Idle {
            self.state = LoopState::Scheduled;
            scheduler.request_frame();
            log::debug!("Frame loop started");
        }
    }

    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            log::debug!("Frame loop stopped after {} frames", self.frames);
        }
        self.state = LoopState::Stopped;
    }

    /// Run one frame. Returns `Ok(false)` when no frame was scheduled (a
    /// redraw the loop did not ask for).
    ///
    /// The next frame is requested even when drawing fails; the error is
    /// handed back to the caller.
    pub fn tick<D, S>(&mut self, app: &mut AppContext, drawer: &mut D, scheduler: &S) -> Result<bool>
    where
        D: SceneDrawer + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        if self.state != LoopState::Scheduled {
            return Ok(false);
        }
        self.frames += 1;
        app.clock.tick();

        app.update_controls();
        let drawn = drawer.draw(app);

        if self.state == LoopState::Scheduled {
            scheduler.request_frame();
        }
        drawn.map(|()| true)
    }
}
