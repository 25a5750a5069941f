use wgpu::util::DeviceExt;

use crate::error::Result;

use super::limits::check_buffer;
use super::mesh::MeshData;

const STAGE: &str = "geometry store";

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const TEXCOORD_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

/// Vertex stream layouts for slots 0/1/2: position, normal, texcoord.
///
/// Each attribute lives in its own buffer (12/12/8 byte strides).
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEXCOORD_ATTRS,
        },
    ]
}

/// Immutable GPU copies of a [`MeshData`].
///
/// Buffers are created with their contents and never written again.
pub struct GeometryStore {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    texcoords: wgpu::Buffer,
    indices: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
}

impl GeometryStore {
    /// Uploads `mesh` once.
    ///
    /// Fails with `ResourceCreation` if the mesh is malformed or a stream
    /// exceeds the device's buffer limit.
    pub fn new(device: &wgpu::Device, mesh: &MeshData) -> Result<Self> {
        mesh.validate()?;

        let positions: &[u8] = bytemuck::cast_slice(&mesh.positions);
        let normals: &[u8] = bytemuck::cast_slice(&mesh.normals);
        let texcoords: &[u8] = bytemuck::cast_slice(&mesh.texcoords);
        let indices: &[u8] = bytemuck::cast_slice(&mesh.indices);

        let limits = device.limits();
        check_buffer(&limits, STAGE, "positions", positions.len() as u64)?;
        check_buffer(&limits, STAGE, "normals", normals.len() as u64)?;
        check_buffer(&limits, STAGE, "texcoords", texcoords.len() as u64)?;
        check_buffer(&limits, STAGE, "indices", indices.len() as u64)?;

        let create = |label: &str, contents: &[u8], usage: wgpu::BufferUsages| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        };

        let store = Self {
            positions: create("lattice positions vbo", positions, wgpu::BufferUsages::VERTEX),
            normals: create("lattice normals vbo", normals, wgpu::BufferUsages::VERTEX),
            texcoords: create("lattice texcoords vbo", texcoords, wgpu::BufferUsages::VERTEX),
            indices: create("lattice ibo", indices, wgpu::BufferUsages::INDEX),
            vertex_count: mesh.vertex_count() as u32,
            index_count: mesh.index_count() as u32,
        };

        log::debug!(
            "geometry uploaded: {} vertices, {} indices",
            store.vertex_count,
            store.index_count
        );

        Ok(store)
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn positions(&self) -> &wgpu::Buffer {
        &self.positions
    }

    pub fn normals(&self) -> &wgpu::Buffer {
        &self.normals
    }

    pub fn texcoords(&self) -> &wgpu::Buffer {
        &self.texcoords
    }

    pub fn indices(&self) -> &wgpu::Buffer {
        &self.indices
    }

    /// Binds the three vertex streams and the index buffer.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.positions.slice(..));
        rpass.set_vertex_buffer(1, self.normals.slice(..));
        rpass.set_vertex_buffer(2, self.texcoords.slice(..));
        rpass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
    }
}
