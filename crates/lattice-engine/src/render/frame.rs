use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::RendererConfig;
use crate::device::{DeviceLostFlag, Gpu, SurfaceErrorAction};
use crate::error::{RenderError, Result};

use super::ctx::{RenderCtx, RenderTarget};
use super::geometry::GeometryStore;
use super::instances::{InstanceTable, InstanceWriter};
use super::material::{DEFAULT_TEXELS, LIGHT_UNIFORM_SIZE, MaterialDesc, MaterialResources};
use super::mesh::MeshData;
use super::resizer::{FrameResizer, GpuAttachments};
use super::shader::CUBES_WGSL;
use super::transform::{Camera, GridLayout, instance_world, normal_matrix, normalize_light};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct LightUniform {
    direction: [f32; 3],
    _pad: f32,
}

const _: () = assert!(std::mem::size_of::<LightUniform>() as u64 == LIGHT_UNIFORM_SIZE);

/// Where the renderer is within a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramePhase {
    /// No frame rendered yet, or the last frame was aborted.
    Idle,
    /// Recomputing matrices into the staging region.
    Updating,
    /// Recording the render pass.
    Encoding,
    /// Commands handed to the queue. Stays here until the next frame starts.
    Submitted,
}

/// Result of a windowed frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// Surface was transiently unavailable; nothing was drawn.
    Skipped,
}

/// Writes every instance's matrices for `time` into `writer`.
///
/// World matrix per [`instance_world`], normal matrix per [`normal_matrix`],
/// clip matrix `view_projection * world`.
pub fn write_instances<W: InstanceWriter>(
    writer: &mut W,
    view_projection: Mat4,
    grid: &GridLayout,
    time: f64,
) -> Result<()> {
    for index in 0..writer.count() {
        let world = instance_world(grid.translation(index), time, index);
        let world_inverse_transpose = normal_matrix(world);
        let world_view_projection = view_projection * world;
        writer.write_instance(index, &world_view_projection, &world_inverse_transpose)?;
    }
    Ok(())
}

/// Drives the instanced cube scene: one bulk upload and one draw per frame.
///
/// Host code calls [`render_frame`](Self::render_frame) (window surface) or
/// [`render_to`](Self::render_to) (any color view) once per frame; there is no
/// internal loop. Both paths check the device-lost state before doing any
/// work; after a fatal error every further call fails with `DeviceLost`.
pub struct FrameRenderer {
    camera: Camera,
    grid: GridLayout,
    light_direction: Vec3,
    clear_color: wgpu::Color,

    geometry: GeometryStore,
    material: MaterialResources,
    instances: InstanceTable,
    light_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    resizer: FrameResizer,
    phase: FramePhase,
    lost: DeviceLostFlag,
    halted: Option<String>,
}

impl FrameRenderer {
    /// Builds the renderer with the bundled shader and texture.
    pub fn new(ctx: &RenderCtx<'_>, config: &RendererConfig) -> Result<Self> {
        Self::with_material(ctx, config, CUBES_WGSL, &DEFAULT_TEXELS)
    }

    /// Builds the renderer with caller-supplied WGSL and 2×2 RGBA8 texels.
    ///
    /// Any failure here is fatal: there is no renderer without geometry,
    /// material and instance storage.
    pub fn with_material(
        ctx: &RenderCtx<'_>,
        config: &RendererConfig,
        shader_source: &str,
        texels: &[u8],
    ) -> Result<Self> {
        config.validate()?;

        let lost = match ctx.lost {
            Some(flag) => flag.clone(),
            None => DeviceLostFlag::watch(ctx.device),
        };

        let geometry = GeometryStore::new(ctx.device, &MeshData::cube())?;
        let material = MaterialResources::new(
            ctx.device,
            ctx.queue,
            &MaterialDesc {
                shader_source,
                texels,
                color_format: ctx.color_format,
                sample_count: config.sample_count,
            },
        )?;
        let instances = InstanceTable::allocate(ctx.device, config.instance_count)?;

        let light_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lattice light ubo"),
            size: LIGHT_UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = material.create_bind_group(ctx.device, instances.storage_buffer(), &light_ubo);

        let [r, g, b, a] = config.clear_color;
        let grid = GridLayout::new(config.instance_count, config.grid_spacing);

        log::info!(
            "frame renderer ready: {} instances on a {}x{} grid",
            config.instance_count,
            grid.side(),
            grid.side()
        );

        Ok(Self {
            camera: Camera::from_config(config),
            grid,
            light_direction: Vec3::from_array(config.light_direction),
            clear_color: wgpu::Color { r, g, b, a },
            geometry,
            material,
            instances,
            light_ubo,
            bind_group,
            resizer: FrameResizer::new(),
            phase: FramePhase::Idle,
            lost,
            halted: None,
        })
    }

    /// Renders one frame into the window surface and presents it.
    ///
    /// `elapsed` is monotonic seconds since the animation started.
    pub fn render_frame(&mut self, gpu: &mut Gpu<'_>, elapsed: f64) -> Result<FrameOutcome> {
        self.check_alive()?;
        if let Some(reason) = gpu.lost_reason() {
            return Err(self.halt(reason.to_owned()));
        }

        let size = gpu.size();
        if size.width == 0 || size.height == 0 {
            // Minimized; nothing to present.
            return Ok(FrameOutcome::Skipped);
        }
        self.ensure_size(gpu.device(), size.width, size.height);

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match gpu.handle_surface_error(&err) {
                    SurfaceErrorAction::Fatal => Err(self.halt(format!("surface acquisition failed: {err}"))),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        Ok(FrameOutcome::Skipped)
                    }
                };
            }
        };

        let (width, height) = self.resizer.size();
        let ctx = RenderCtx::from_gpu(gpu);
        self.update_and_encode(&ctx, &mut frame.encoder, RenderTarget::new(&frame.view, width, height), elapsed)?;

        gpu.submit(frame);
        self.phase = FramePhase::Submitted;
        Ok(FrameOutcome::Presented)
    }

    /// Renders one frame into an arbitrary color view and submits it.
    ///
    /// The view's format must be the one the renderer was created with, and
    /// its texture must have `target.width × target.height` texels.
    pub fn render_to(&mut self, ctx: &RenderCtx<'_>, target: RenderTarget<'_>, elapsed: f64) -> Result<()> {
        self.check_alive()?;
        if let Some(reason) = ctx.lost.and_then(DeviceLostFlag::reason) {
            return Err(self.halt(reason.to_owned()));
        }
        self.ensure_size(ctx.device, target.width, target.height);

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lattice offscreen encoder"),
        });
        self.update_and_encode(ctx, &mut encoder, target, elapsed)?;

        ctx.queue.submit(std::iter::once(encoder.finish()));
        self.phase = FramePhase::Submitted;
        Ok(())
    }

    /// Matches attachments to the drawable size. Returns true if they were recreated.
    pub fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let allocator = GpuAttachments {
            device,
            color_format: self.material.color_format(),
            sample_count: self.material.sample_count(),
        };
        self.resizer.ensure_size(&allocator, width, height)
    }

    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    #[inline]
    pub fn instance_count(&self) -> usize {
        self.instances.count()
    }

    /// Clamped drawable size of the last frame; `(0, 0)` before the first.
    #[inline]
    pub fn drawable_size(&self) -> (u32, u32) {
        self.resizer.size()
    }

    pub fn instances(&self) -> &InstanceTable {
        &self.instances
    }

    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    pub fn material(&self) -> &MaterialResources {
        &self.material
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    fn update_and_encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: RenderTarget<'_>,
        elapsed: f64,
    ) -> Result<()> {
        let result = self
            .update(ctx.queue, elapsed)
            .and_then(|()| self.encode(encoder, target));
        if result.is_err() {
            self.phase = FramePhase::Idle;
        }
        result
    }

    /// Camera, light and instance matrices, then the single bulk upload.
    fn update(&mut self, queue: &wgpu::Queue, elapsed: f64) -> Result<()> {
        self.phase = FramePhase::Updating;

        let view_projection = self.camera.view_projection(self.resizer.aspect());

        let light = normalize_light(self.light_direction).ok_or_else(|| {
            RenderError::resource("frame update", format!("light direction {:?} has no length", self.light_direction))
        })?;
        let uniform = LightUniform { direction: light.to_array(), _pad: 0.0 };
        queue.write_buffer(&self.light_ubo, 0, bytemuck::bytes_of(&uniform));

        write_instances(&mut self.instances, view_projection, &self.grid, elapsed)?;

        // All writes for this frame are in staging; publish them in one transfer.
        self.instances.flush(queue);
        Ok(())
    }

    fn encode(&mut self, encoder: &mut wgpu::CommandEncoder, target: RenderTarget<'_>) -> Result<()> {
        self.phase = FramePhase::Encoding;

        let attachments = self
            .resizer
            .attachments()
            .ok_or_else(|| RenderError::resource("frame encode", "no depth attachment for this frame"))?;

        let (view, resolve_target) = match &attachments.msaa_color {
            Some((_, msaa_view)) => (msaa_view, Some(target.color_view)),
            None => (target.color_view, None),
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lattice cubes pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &attachments.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(self.material.pipeline());
        self.geometry.bind(&mut rpass);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.draw_indexed(0..self.geometry.index_count(), 0, 0..self.instances.count() as u32);

        Ok(())
    }

    /// True once a fatal error stopped the renderer.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    fn check_alive(&mut self) -> Result<()> {
        if let Some(reason) = &self.halted {
            return Err(RenderError::DeviceLost { reason: format!("renderer halted: {reason}") });
        }
        if let Some(reason) = self.lost.reason() {
            let reason = reason.to_owned();
            return Err(self.halt(reason));
        }
        Ok(())
    }

    fn halt(&mut self, reason: String) -> RenderError {
        self.halted = Some(reason.clone());
        self.phase = FramePhase::Idle;
        RenderError::DeviceLost { reason }
    }
}
