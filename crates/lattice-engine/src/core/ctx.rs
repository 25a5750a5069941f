use winit::window::Window;

use crate::device::Gpu;
use crate::render::RenderCtx;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-frame context passed to [`super::App::on_frame`].
///
/// `'a` is the callback, `'w` the window borrow held by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Device, queue and surface format, for creating renderers.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::from_gpu(self.gpu)
    }

    /// Notifies the window system that a frame is about to be presented.
    pub fn pre_present(&self) {
        self.window.pre_present_notify();
    }
}
