//! WGSL front-end.
//!
//! Sources are parsed and validated with naga on the CPU, so a bad shader is
//! reported with the compiler's diagnostic text instead of reaching the device.
//! The validated IR is handed to wgpu directly (no second WGSL parse).

use std::borrow::Cow;

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, ImageClass, ImageDimension, ScalarKind, ShaderStage, StorageAccess, TypeInner};

use crate::error::{RenderError, Result};

use super::instances::INSTANCE_STRIDE_BYTES;
use super::material::LIGHT_UNIFORM_SIZE;

/// Bundled instanced-cube shader.
pub const CUBES_WGSL: &str = include_str!("shaders/cubes.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertex inputs the geometry provides: `(location, components)` for
/// position, normal and texcoord.
const VERTEX_INPUTS: [(u32, u32); 3] = [(0, 3), (1, 3), (2, 2)];

/// Group 0 bindings of the pipeline layout and the stage each is visible to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Slot {
    /// 0: read-only storage array of instances, vertex stage.
    Instances,
    /// 1: light uniform, fragment stage.
    Light,
    /// 2: filtering sampler, fragment stage.
    Sampler,
    /// 3: 2D float texture, fragment stage.
    Texture,
}

impl Slot {
    const ALL: [Slot; 4] = [Slot::Instances, Slot::Light, Slot::Sampler, Slot::Texture];

    fn binding(self) -> u32 {
        self as u32
    }

    fn stage(self) -> ShaderStage {
        match self {
            Slot::Instances => ShaderStage::Vertex,
            _ => ShaderStage::Fragment,
        }
    }

    /// Describes the mismatch, or `None` if `var` fits this slot.
    fn mismatch(self, module: &naga::Module, var: &naga::GlobalVariable) -> Option<String> {
        let inner = &module.types[var.ty].inner;
        match (self, var.space, inner) {
            (Slot::Instances, AddressSpace::Storage { access }, TypeInner::Array { stride, .. }) => {
                if access.contains(StorageAccess::STORE) {
                    Some("must be `var<storage, read>`".to_owned())
                } else if u64::from(*stride) != INSTANCE_STRIDE_BYTES {
                    Some(format!("element stride is {stride} bytes, expected {INSTANCE_STRIDE_BYTES}"))
                } else {
                    None
                }
            }
            (Slot::Instances, ..) => Some("must be a read-only storage array of instances".to_owned()),

            (Slot::Light, AddressSpace::Uniform, _) => {
                let size = inner.size(module.to_ctx());
                (u64::from(size) > LIGHT_UNIFORM_SIZE)
                    .then(|| format!("uniform is {size} bytes, the light buffer holds {LIGHT_UNIFORM_SIZE}"))
            }
            (Slot::Light, ..) => Some("must be a `var<uniform>`".to_owned()),

            (Slot::Sampler, AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => None,
            (Slot::Sampler, ..) => Some("must be a non-comparison `sampler`".to_owned()),

            (
                Slot::Texture,
                AddressSpace::Handle,
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class: ImageClass::Sampled { kind: ScalarKind::Float, multi: false },
                },
            ) => None,
            (Slot::Texture, ..) => Some("must be a `texture_2d<f32>`".to_owned()),
        }
    }
}

/// A validated shader ready to become a `wgpu::ShaderModule`.
#[derive(Debug)]
pub struct CompiledShader {
    label: String,
    module: naga::Module,
}

impl CompiledShader {
    /// Parses, validates and interface-checks `source`.
    ///
    /// - parse or validation failure: `ShaderCompile` with naga's rendered diagnostic
    /// - entry points, bindings or vertex inputs that do not match the
    ///   pipeline layout: `ShaderLink`
    pub fn compile(label: &str, source: &str) -> Result<Self> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| RenderError::ShaderCompile {
            stage: "shader parse",
            diagnostic: e.emit_to_string(source),
        })?;

        let info = Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| RenderError::ShaderCompile {
                stage: "shader validation",
                diagnostic: e.emit_to_string(source),
            })?;

        check_interface(&module, &info)?;

        Ok(Self { label: label.to_owned(), module })
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    /// Creates the device-side module from the validated IR.
    pub fn into_shader_module(self, device: &wgpu::Device) -> wgpu::ShaderModule {
        let Self { label, module } = self;
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(module)),
        })
    }
}

fn link(diagnostic: String) -> RenderError {
    RenderError::ShaderLink { stage: "shader interface", diagnostic }
}

/// Everything wgpu would otherwise reject at pipeline creation.
fn check_interface(module: &naga::Module, info: &ModuleInfo) -> Result<()> {
    if module.entry_points.is_empty() {
        return Err(link("module declares no entry points".to_owned()));
    }

    let vertex = entry_point(module, VERTEX_ENTRY, ShaderStage::Vertex)?;
    let fragment = entry_point(module, FRAGMENT_ENTRY, ShaderStage::Fragment)?;

    for slot in Slot::ALL {
        let binding = slot.binding();
        let (handle, var) = module
            .global_variables
            .iter()
            .find(|(_, var)| var.binding.as_ref().is_some_and(|rb| rb.group == 0 && rb.binding == binding))
            .ok_or_else(|| link(format!("group 0 binding {binding} is not declared")))?;

        if let Some(reason) = slot.mismatch(module, var) {
            return Err(link(format!("group 0 binding {binding}: {reason}")));
        }

        for (index, stage) in [(vertex, ShaderStage::Vertex), (fragment, ShaderStage::Fragment)] {
            if stage != slot.stage() && !info.get_entry_point(index)[handle].is_empty() {
                return Err(link(format!(
                    "group 0 binding {binding} is used by the {stage:?} stage but only visible to {:?}",
                    slot.stage()
                )));
            }
        }
    }

    for (location, kind, components) in stage_locations(module, &module.entry_points[vertex].function.arguments) {
        let provided = VERTEX_INPUTS
            .iter()
            .find(|(loc, _)| *loc == location)
            .map(|(_, n)| *n)
            .ok_or_else(|| link(format!("vertex input @location({location}) has no vertex buffer")))?;
        if kind != Some(ScalarKind::Float) || components > provided {
            return Err(link(format!(
                "vertex input @location({location}) must be f32 with at most {provided} components"
            )));
        }
    }

    if let Some(result) = &module.entry_points[fragment].function.result {
        let outputs = io_locations(module, result.ty, result.binding.as_ref());
        for (location, kind, _) in outputs {
            if location != 0 || kind != Some(ScalarKind::Float) {
                return Err(link(format!(
                    "fragment output @location({location}) does not match the single float color target"
                )));
            }
        }
    }

    Ok(())
}

fn entry_point(module: &naga::Module, name: &str, stage: ShaderStage) -> Result<usize> {
    let index = module
        .entry_points
        .iter()
        .position(|ep| ep.name == name)
        .ok_or_else(|| link(format!("missing entry point `{name}`")))?;
    let found = module.entry_points[index].stage;
    if found != stage {
        return Err(link(format!("entry point `{name}` is a {found:?} stage, expected {stage:?}")));
    }
    Ok(index)
}

fn stage_locations(module: &naga::Module, args: &[naga::FunctionArgument]) -> Vec<(u32, Option<ScalarKind>, u32)> {
    args.iter()
        .flat_map(|arg| io_locations(module, arg.ty, arg.binding.as_ref()))
        .collect()
}

/// `(location, scalar kind, component count)` of every user-defined IO value,
/// looking through one level of struct.
fn io_locations(
    module: &naga::Module,
    ty: Handle<naga::Type>,
    binding: Option<&Binding>,
) -> Vec<(u32, Option<ScalarKind>, u32)> {
    let describe = |ty: Handle<naga::Type>| {
        let inner = &module.types[ty].inner;
        let components = match inner {
            TypeInner::Vector { size, .. } => *size as u32,
            _ => 1,
        };
        (inner.scalar_kind(), components)
    };

    match (binding, &module.types[ty].inner) {
        (Some(Binding::Location { location, .. }), _) => {
            let (kind, n) = describe(ty);
            vec![(*location, kind, n)]
        }
        (None, TypeInner::Struct { members, .. }) => members
            .iter()
            .filter_map(|m| match &m.binding {
                Some(Binding::Location { location, .. }) => {
                    let (kind, n) = describe(m.ty);
                    Some((*location, kind, n))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_shader_compiles() {
        let shader = CompiledShader::compile("cubes", CUBES_WGSL).unwrap();
        assert_eq!(shader.module().entry_points.len(), 2);
    }

    #[test]
    fn syntax_error_surfaces_diagnostic() {
        let src = CUBES_WGSL.replace("fn vs_main(v: VsIn)", "fn vs_main(v: VsIn");
        match CompiledShader::compile("broken", &src) {
            Err(RenderError::ShaderCompile { diagnostic, .. }) => {
                assert!(!diagnostic.is_empty());
                assert!(diagnostic.contains("error"), "{diagnostic}");
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
    }

    #[test]
    fn type_error_is_compile_error() {
        let src = CUBES_WGSL.replace("out.texcoord = v.texcoord;", "out.texcoord = v.position;");
        assert!(matches!(
            CompiledShader::compile("mistyped", &src),
            Err(RenderError::ShaderCompile { .. })
        ));
    }

    #[test]
    fn empty_source_fails_to_link() {
        assert!(matches!(
            CompiledShader::compile("empty", ""),
            Err(RenderError::ShaderLink { .. })
        ));
    }

    #[test]
    fn missing_fragment_entry_fails_to_link() {
        let src = CUBES_WGSL.replace("fn fs_main", "fn fs_other");
        let err = CompiledShader::compile("no-fs", &src).unwrap_err();
        assert!(err.to_string().contains("missing entry point `fs_main`"), "{err}");
    }

    #[test]
    fn missing_binding_fails_to_link() {
        let src = r#"
            struct Instance {
                world_view_projection: mat4x4<f32>,
                world_inverse_transpose: mat4x4<f32>,
            };
            @group(0) @binding(0) var<storage, read> instances: array<Instance>;

            @vertex
            fn vs_main(@builtin(instance_index) i: u32) -> @builtin(position) vec4<f32> {
                return instances[i].world_view_projection[3];
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
        "#;
        let err = CompiledShader::compile("partial", src).unwrap_err();
        assert!(matches!(err, RenderError::ShaderLink { .. }));
        assert!(err.to_string().contains("binding 1"), "{err}");
    }

    // ── binding kinds ──

    fn link_error(src: &str) -> String {
        match CompiledShader::compile("mismatch", src) {
            Err(err @ RenderError::ShaderLink { .. }) => err.to_string(),
            other => panic!("expected ShaderLink, got {other:?}"),
        }
    }

    #[test]
    fn uniform_instance_array_fails_to_link() {
        let src = CUBES_WGSL.replace(
            "var<storage, read> instances: array<Instance>",
            "var<uniform> instances: array<Instance, 4>",
        );
        let msg = link_error(&src);
        assert!(msg.contains("binding 0"), "{msg}");
    }

    #[test]
    fn writable_instance_storage_fails_to_link() {
        let src = CUBES_WGSL.replace("var<storage, read> instances", "var<storage, read_write> instances");
        assert!(link_error(&src).contains("binding 0"));
    }

    #[test]
    fn instance_stride_must_be_two_matrices() {
        let src = CUBES_WGSL.replace(
            "    world_inverse_transpose: mat4x4<f32>,\n};",
            "    world_inverse_transpose: mat4x4<f32>,\n    tint: vec4<f32>,\n};",
        );
        assert_ne!(src, CUBES_WGSL);
        assert!(link_error(&src).contains("stride"));
    }

    #[test]
    fn oversized_light_uniform_fails_to_link() {
        let src = CUBES_WGSL.replace("    direction: vec3<f32>,\n", "    direction: vec3<f32>,\n    color: vec4<f32>,\n");
        assert_ne!(src, CUBES_WGSL);
        assert!(link_error(&src).contains("binding 1"));
    }

    #[test]
    fn wrong_texture_kind_fails_to_link() {
        let src = CUBES_WGSL.replace("var tex: texture_2d<f32>", "var tex: texture_2d<u32>").replace(
            "let diffuse = textureSample(tex, tex_sampler, f.texcoord);",
            "let diffuse = vec4<f32>(textureLoad(tex, vec2<i32>(0, 0), 0));",
        );
        assert!(link_error(&src).contains("binding 3"));
    }

    #[test]
    fn comparison_sampler_fails_to_link() {
        let src = r#"
            struct Instance {
                world_view_projection: mat4x4<f32>,
                world_inverse_transpose: mat4x4<f32>,
            };
            struct Light { direction: vec3<f32> };
            @group(0) @binding(0) var<storage, read> instances: array<Instance>;
            @group(0) @binding(1) var<uniform> light: Light;
            @group(0) @binding(2) var s: sampler_comparison;
            @group(0) @binding(3) var tex: texture_2d<f32>;

            @vertex
            fn vs_main(@builtin(instance_index) i: u32) -> @builtin(position) vec4<f32> {
                return instances[i].world_view_projection[3];
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(light.direction, 1.0);
            }
        "#;
        assert!(link_error(src).contains("binding 2"));
    }

    // ── stage visibility and IO ──

    #[test]
    fn light_read_in_vertex_stage_fails_to_link() {
        let src = CUBES_WGSL.replace(
            "out.texcoord = v.texcoord;",
            "out.texcoord = v.texcoord + light.direction.xy;",
        );
        let msg = link_error(&src);
        assert!(msg.contains("binding 1") && msg.contains("Vertex"), "{msg}");
    }

    #[test]
    fn unknown_vertex_location_fails_to_link() {
        let src = CUBES_WGSL.replace("@location(2) texcoord: vec2<f32>,\n    @builtin", "@location(5) texcoord: vec2<f32>,\n    @builtin");
        assert_ne!(src, CUBES_WGSL);
        assert!(link_error(&src).contains("@location(5)"));
    }

    #[test]
    fn wide_vertex_input_fails_to_link() {
        let src = CUBES_WGSL
            .replace("@location(2) texcoord: vec2<f32>,\n    @builtin", "@location(2) texcoord: vec4<f32>,\n    @builtin")
            .replace("out.texcoord = v.texcoord;", "out.texcoord = v.texcoord.xy;");
        assert!(link_error(&src).contains("@location(2)"));
    }

    #[test]
    fn extra_fragment_output_fails_to_link() {
        let src = r#"
            struct Instance {
                world_view_projection: mat4x4<f32>,
                world_inverse_transpose: mat4x4<f32>,
            };
            struct Light { direction: vec3<f32> };
            struct FsOut {
                @location(0) color: vec4<f32>,
                @location(1) extra: vec4<f32>,
            };
            @group(0) @binding(0) var<storage, read> instances: array<Instance>;
            @group(0) @binding(1) var<uniform> light: Light;
            @group(0) @binding(2) var s: sampler;
            @group(0) @binding(3) var tex: texture_2d<f32>;

            @vertex
            fn vs_main(@builtin(instance_index) i: u32) -> @builtin(position) vec4<f32> {
                return instances[i].world_view_projection[3];
            }

            @fragment
            fn fs_main() -> FsOut {
                var out: FsOut;
                out.color = vec4<f32>(light.direction, 1.0);
                out.extra = out.color;
                return out;
            }
        "#;
        assert!(link_error(src).contains("@location(1)"));
    }
}
