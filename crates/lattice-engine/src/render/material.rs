use crate::error::{RenderError, Result};

use super::geometry::vertex_layouts;
use super::instances::INSTANCE_STRIDE_BYTES;
use super::resizer::DEPTH_FORMAT;
use super::shader::{CompiledShader, FRAGMENT_ENTRY, VERTEX_ENTRY};

const STAGE: &str = "material resources";

/// Texture edge length in texels.
pub const TEXTURE_SIZE: u32 = 2;

/// Bytes per RGBA8 texel.
const TEXEL_BYTES: u32 = 4;

/// Default 2×2 RGBA8 texture.
pub const DEFAULT_TEXELS: [u8; 16] = [
    140, 228, 255, 10, //
    254, 238, 145, 10, //
    255, 162, 57, 10, //
    255, 86, 86, 10,
];

/// Size of the light uniform: `vec3<f32>` padded to 16 bytes.
pub const LIGHT_UNIFORM_SIZE: u64 = 16;

/// Inputs for [`MaterialResources::new`].
pub struct MaterialDesc<'a> {
    /// WGSL source, treated as opaque until naga parses it.
    pub shader_source: &'a str,
    /// `TEXTURE_SIZE²` RGBA8 texels, rows tightly packed.
    pub texels: &'a [u8],
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

/// Texture, sampler, bind group layout and pipeline. Created once, never mutated.
pub struct MaterialResources {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    texture: wgpu::Texture,
    texture_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl MaterialResources {
    /// Compiles the shader, uploads the texture and builds the pipeline.
    ///
    /// A shader that fails to compile or does not expose the expected entry
    /// points and bindings aborts creation; no pipeline is built from it.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, desc: &MaterialDesc<'_>) -> Result<Self> {
        let expected = (TEXTURE_SIZE * TEXTURE_SIZE * TEXEL_BYTES) as usize;
        if desc.texels.len() != expected {
            return Err(RenderError::resource(
                STAGE,
                format!("texture data is {} bytes, expected {expected}", desc.texels.len()),
            ));
        }
        if !matches!(desc.sample_count, 1 | 4) {
            return Err(RenderError::resource(
                STAGE,
                format!("unsupported sample count {}", desc.sample_count),
            ));
        }

        let shader = CompiledShader::compile("lattice cubes shader", desc.shader_source)?
            .into_shader_module(device);

        let (texture, texture_view) = upload_texture(device, queue, desc.texels);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lattice sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lattice bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(INSTANCE_STRIDE_BYTES),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(LIGHT_UNIFORM_SIZE),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lattice pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let vertex_buffers = vertex_layouts();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lattice cubes pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: desc.sample_count,
                ..Default::default()
            },

            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "material ready: format {:?}, {}x msaa",
            desc.color_format,
            desc.sample_count
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            texture,
            texture_view,
            sampler,
            color_format: desc.color_format,
            sample_count: desc.sample_count,
        })
    }

    /// Builds the single bind group: instance storage, light uniform, sampler, texture.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        instance_storage: &wgpu::Buffer,
        light_uniform: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lattice bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: instance_storage.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.texture_view),
                },
            ],
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, texels: &[u8]) -> (wgpu::Texture, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width: TEXTURE_SIZE,
        height: TEXTURE_SIZE,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("lattice texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(TEXTURE_SIZE * TEXEL_BYTES),
            rows_per_image: Some(TEXTURE_SIZE),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
