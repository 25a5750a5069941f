use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::{RenderError, Result};

use super::limits::check_storage_binding;

/// f32 values per instance in the storage buffer (two 4×4 matrices).
pub const INSTANCE_STRIDE_FLOATS: usize = 32;

/// Bytes per instance in the storage buffer.
pub const INSTANCE_STRIDE_BYTES: u64 = (INSTANCE_STRIDE_FLOATS * std::mem::size_of::<f32>()) as u64;

/// GPU layout of one instance. Column-major, matching WGSL `mat4x4<f32>`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub world_view_projection: [f32; 16],
    pub world_inverse_transpose: [f32; 16],
}

const _: () = assert!(std::mem::size_of::<InstanceRaw>() as u64 == INSTANCE_STRIDE_BYTES);

impl InstanceRaw {
    pub fn new(world_view_projection: &Mat4, world_inverse_transpose: &Mat4) -> Self {
        Self {
            world_view_projection: world_view_projection.to_cols_array(),
            world_inverse_transpose: world_inverse_transpose.to_cols_array(),
        }
    }
}

/// Destination for per-frame instance matrices.
pub trait InstanceWriter {
    /// Fixed number of instance slots.
    fn count(&self) -> usize;

    /// Writes slot `index`; fails with `IndexOutOfRange` outside `[0, count)`.
    fn write_instance(
        &mut self,
        index: usize,
        world_view_projection: &Mat4,
        world_inverse_transpose: &Mat4,
    ) -> Result<()>;
}

/// CPU staging region: `count` fixed slots, never resized.
#[derive(Debug, Clone)]
pub struct InstanceStaging {
    slots: Box<[InstanceRaw]>,
}

impl InstanceStaging {
    pub fn new(count: usize) -> Self {
        Self { slots: vec![InstanceRaw::zeroed(); count].into_boxed_slice() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InstanceRaw> {
        self.slots.get(index)
    }

    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.slots)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }
}

impl InstanceWriter for InstanceStaging {
    fn count(&self) -> usize {
        self.slots.len()
    }

    fn write_instance(
        &mut self,
        index: usize,
        world_view_projection: &Mat4,
        world_inverse_transpose: &Mat4,
    ) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(RenderError::IndexOutOfRange { index, count })?;
        *slot = InstanceRaw::new(world_view_projection, world_inverse_transpose);
        Ok(())
    }
}

/// Per-instance transforms: CPU staging plus the storage buffer it is flushed into.
///
/// The instance count is fixed at allocation; the storage buffer is exactly
/// `count * INSTANCE_STRIDE_BYTES` bytes.
pub struct InstanceTable {
    staging: InstanceStaging,
    storage: wgpu::Buffer,
}

impl InstanceTable {
    /// Sizes staging and storage for `count` instances.
    pub fn allocate(device: &wgpu::Device, count: usize) -> Result<Self> {
        const STAGE: &str = "instance table";

        if count == 0 {
            return Err(RenderError::resource(STAGE, "instance count must be at least 1"));
        }
        let size = (count as u64)
            .checked_mul(INSTANCE_STRIDE_BYTES)
            .ok_or_else(|| RenderError::resource(STAGE, format!("{count} instances overflow u64")))?;
        check_storage_binding(&device.limits(), STAGE, "instance storage", size)?;

        let storage = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lattice instance storage"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        log::debug!("instance table allocated: {count} instances, {size} bytes");

        Ok(Self { staging: InstanceStaging::new(count), storage })
    }

    /// Uploads the whole staging region in one transfer.
    ///
    /// Call after every `write_instance` of the frame and before encoding the draw.
    pub fn flush(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.storage, 0, self.staging.as_bytes());
    }

    pub fn storage_buffer(&self) -> &wgpu::Buffer {
        &self.storage
    }

    #[inline]
    pub fn byte_len(&self) -> u64 {
        self.storage.size()
    }

    pub fn staging(&self) -> &InstanceStaging {
        &self.staging
    }
}

impl InstanceWriter for InstanceTable {
    fn count(&self) -> usize {
        self.staging.count()
    }

    fn write_instance(
        &mut self,
        index: usize,
        world_view_projection: &Mat4,
        world_inverse_transpose: &Mat4,
    ) -> Result<()> {
        self.staging
            .write_instance(index, world_view_projection, world_inverse_transpose)
    }
}
