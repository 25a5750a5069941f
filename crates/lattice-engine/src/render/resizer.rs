/// Depth format of every frame attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Creates and releases the size-dependent attachments of a frame.
pub trait AttachmentAllocator {
    type Attachments;

    /// Largest width/height the device accepts.
    fn max_dimension(&self) -> u32;

    fn allocate(&self, width: u32, height: u32) -> Self::Attachments;

    fn release(&self, attachments: Self::Attachments);
}

/// Depth buffer plus the optional multisampled color target.
pub struct FrameAttachments {
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    /// Present only when `sample_count > 1`; resolves into the surface view.
    pub msaa_color: Option<(wgpu::Texture, wgpu::TextureView)>,
}

/// wgpu-backed allocator.
pub struct GpuAttachments<'a> {
    pub device: &'a wgpu::Device,
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

impl GpuAttachments<'_> {
    fn texture(&self, label: &str, format: wgpu::TextureFormat, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

impl AttachmentAllocator for GpuAttachments<'_> {
    type Attachments = FrameAttachments;

    fn max_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn allocate(&self, width: u32, height: u32) -> FrameAttachments {
        let (depth, depth_view) = self.texture("lattice depth", DEPTH_FORMAT, width, height);
        let msaa_color = (self.sample_count > 1)
            .then(|| self.texture("lattice msaa color", self.color_format, width, height));
        FrameAttachments { depth, depth_view, msaa_color }
    }

    fn release(&self, attachments: FrameAttachments) {
        attachments.depth.destroy();
        if let Some((texture, _)) = attachments.msaa_color {
            texture.destroy();
        }
    }
}

/// Owns the drawable size and the attachments sized to it.
///
/// Attachments are created lazily on the first [`ensure_size`](Self::ensure_size)
/// and recreated only when the clamped size changes.
pub struct FrameResizer<T = FrameAttachments> {
    attachments: Option<T>,
    width: u32,
    height: u32,
}

impl<T> Default for FrameResizer<T> {
    fn default() -> Self {
        Self { attachments: None, width: 0, height: 0 }
    }
}

impl<T> FrameResizer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps the requested size to `[1, max_dimension]` and (re)creates the
    /// attachments if none exist yet or the size changed.
    ///
    /// Returns true when a recreation happened. The previous attachments are
    /// released before the new ones are allocated.
    pub fn ensure_size<A>(&mut self, allocator: &A, requested_width: u32, requested_height: u32) -> bool
    where
        A: AttachmentAllocator<Attachments = T>,
    {
        let max = allocator.max_dimension().max(1);
        let width = requested_width.clamp(1, max);
        let height = requested_height.clamp(1, max);

        if self.attachments.is_some() && width == self.width && height == self.height {
            return false;
        }

        if let Some(old) = self.attachments.take() {
            allocator.release(old);
        }

        self.attachments = Some(allocator.allocate(width, height));
        self.width = width;
        self.height = height;

        log::debug!("frame attachments resized to {width}x{height}");
        true
    }

    /// Current (clamped) size; `(0, 0)` before the first `ensure_size`.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    pub fn attachments(&self) -> Option<&T> {
        self.attachments.as_ref()
    }

    /// Releases the attachments, e.g. before dropping the device.
    pub fn release<A>(&mut self, allocator: &A)
    where
        A: AttachmentAllocator<Attachments = T>,
    {
        if let Some(old) = self.attachments.take() {
            allocator.release(old);
        }
        self.width = 0;
        self.height = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct FakeDepth {
        id: u32,
        width: u32,
        height: u32,
    }

    #[derive(Default)]
    struct CountingAllocator {
        max: u32,
        allocated: Cell<u32>,
        released: RefCell<Vec<u32>>,
    }

    impl CountingAllocator {
        fn with_max(max: u32) -> Self {
            Self { max, ..Default::default() }
        }
    }

    impl AttachmentAllocator for CountingAllocator {
        type Attachments = FakeDepth;

        fn max_dimension(&self) -> u32 {
            self.max
        }

        fn allocate(&self, width: u32, height: u32) -> FakeDepth {
            let id = self.allocated.get();
            self.allocated.set(id + 1);
            FakeDepth { id, width, height }
        }

        fn release(&self, attachments: FakeDepth) {
            self.released.borrow_mut().push(attachments.id);
        }
    }

    #[test]
    fn first_call_always_allocates() {
        let alloc = CountingAllocator::with_max(8192);
        let mut resizer = FrameResizer::new();
        assert!(resizer.attachments().is_none());
        assert!(resizer.ensure_size(&alloc, 800, 600));
        assert_eq!(alloc.allocated.get(), 1);
        assert_eq!(resizer.size(), (800, 600));
    }

    #[test]
    fn resize_sequence_triggers_on_first_and_third_call() {
        let alloc = CountingAllocator::with_max(8192);
        let mut resizer = FrameResizer::new();

        assert!(resizer.ensure_size(&alloc, 800, 600));
        assert!(!resizer.ensure_size(&alloc, 800, 600));
        assert_eq!(alloc.allocated.get(), 1);

        assert!(resizer.ensure_size(&alloc, 1024, 768));
        assert_eq!(alloc.allocated.get(), 2);
        assert_eq!(*alloc.released.borrow(), vec![0]);

        let current = resizer.attachments().unwrap();
        assert_eq!(current, &FakeDepth { id: 1, width: 1024, height: 768 });
    }

    #[test]
    fn single_dimension_change_recreates() {
        let alloc = CountingAllocator::with_max(8192);
        let mut resizer = FrameResizer::new();
        resizer.ensure_size(&alloc, 640, 480);
        assert!(resizer.ensure_size(&alloc, 640, 481));
    }

    #[test]
    fn dimensions_clamped_to_device_range() {
        let alloc = CountingAllocator::with_max(4096);
        let mut resizer = FrameResizer::new();

        resizer.ensure_size(&alloc, 0, 0);
        assert_eq!(resizer.size(), (1, 1));

        resizer.ensure_size(&alloc, 10_000, 300);
        assert_eq!(resizer.size(), (4096, 300));
        assert_eq!(resizer.attachments().unwrap().width, 4096);
    }

    #[test]
    fn requests_clamping_to_current_size_do_not_allocate() {
        let alloc = CountingAllocator::with_max(2048);
        let mut resizer = FrameResizer::new();
        resizer.ensure_size(&alloc, 5000, 5000);
        assert!(!resizer.ensure_size(&alloc, 9000, 3000));
        assert_eq!(alloc.allocated.get(), 1);
    }

    #[test]
    fn release_drops_attachments_and_next_call_reallocates() {
        let alloc = CountingAllocator::with_max(8192);
        let mut resizer = FrameResizer::new();
        resizer.ensure_size(&alloc, 320, 240);
        resizer.release(&alloc);
        assert!(resizer.attachments().is_none());
        assert!(resizer.ensure_size(&alloc, 320, 240));
        assert_eq!(*alloc.released.borrow(), vec![0]);
    }

    #[test]
    fn aspect_follows_size() {
        let alloc = CountingAllocator::with_max(8192);
        let mut resizer = FrameResizer::new();
        resizer.ensure_size(&alloc, 800, 400);
        assert_eq!(resizer.aspect(), 2.0);
    }
}
