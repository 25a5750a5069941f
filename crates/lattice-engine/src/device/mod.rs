//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain), clamped to device limits
//! - acquiring frames and tracking device loss

mod error;
mod frame;
mod gpu;
mod init;
mod lost;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use lost::DeviceLostFlag;
