//! Instanced cube renderer.
//!
//! One static cube mesh, one material, one storage buffer of per-instance
//! matrices. Each frame recomputes every instance on the CPU, uploads the
//! whole table in a single transfer and issues one indexed instanced draw.
//!
//! Convention:
//! - right-handed world space, depth range 0..1
//! - matrices are column-major, matching WGSL `mat4x4<f32>`

mod ctx;
mod frame;
mod geometry;
mod instances;
pub(crate) mod limits;
mod material;
mod mesh;
mod resizer;
mod shader;
mod transform;

pub use ctx::{RenderCtx, RenderTarget};
pub use frame::{FrameOutcome, FramePhase, FrameRenderer, write_instances};
pub use geometry::{GeometryStore, vertex_layouts};
pub use instances::{
    INSTANCE_STRIDE_BYTES, INSTANCE_STRIDE_FLOATS, InstanceRaw, InstanceStaging, InstanceTable, InstanceWriter,
};
pub use material::{DEFAULT_TEXELS, LIGHT_UNIFORM_SIZE, MaterialDesc, MaterialResources, TEXTURE_SIZE};
pub use mesh::MeshData;
pub use resizer::{AttachmentAllocator, DEPTH_FORMAT, FrameAttachments, FrameResizer, GpuAttachments};
pub use shader::{CUBES_WGSL, CompiledShader, FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use transform::{Camera, GridLayout, instance_world, normal_matrix, normalize_light};
