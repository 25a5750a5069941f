use crate::device::{DeviceLostFlag, Gpu};

/// Device, queue and the color format the pipeline renders into.
#[derive(Copy, Clone)]
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    /// Device-lost state already watched by the owner of `device`. Renderers
    /// built without one install their own callback.
    pub lost: Option<&'a DeviceLostFlag>,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        Self { device, queue, color_format, lost: None }
    }

    #[inline]
    pub fn with_lost_flag(self, lost: &'a DeviceLostFlag) -> Self {
        Self { lost: Some(lost), ..self }
    }

    /// Context targeting the window surface.
    #[inline]
    pub fn from_gpu(gpu: &'a Gpu<'_>) -> Self {
        Self::new(gpu.device(), gpu.queue(), gpu.surface_format()).with_lost_flag(gpu.lost_flag())
    }
}

/// Color view to draw into and its size in physical pixels.
///
/// The size drives attachment sizing and the projection aspect, so it must
/// match the view's texture.
#[derive(Copy, Clone)]
pub struct RenderTarget<'a> {
    pub color_view: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(color_view: &'a wgpu::TextureView, width: u32, height: u32) -> Self {
        Self { color_view, width, height }
    }
}
