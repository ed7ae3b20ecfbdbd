use crate::camera::OrbitCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use shadowlock_assets::{AssetStore, MeshId};
use shadowlock_render::{DepthTest, FramePlan, LayerPass, RenderError, ToneMapping, Viewport};
use shadowlock_scene::{LayerKind, Material, PointLight, Scene, Shading, Side, Stage};
use std::collections::{BTreeMap, HashMap};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    key_light_position: [f32; 4],
    key_light_color: [f32; 4],
    fill_light_position: [f32; 4],
    fill_light_color: [f32; 4],
    camera_position: [f32; 4],
    shadow_params: [f32; 4],
    options: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    specular: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq)]
struct ShadowUniforms {
    light_view_proj: [[f32; 4]; 4],
    light_position: [f32; 4],
    range: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ShadingKind {
    Phong,
    Basic,
    ShadowCatcher,
}

/// Everything that distinguishes one colour pipeline from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    shading: ShadingKind,
    side: Side,
    blended: bool,
    depth: DepthTest,
}

impl PipelineKey {
    fn new(material: &Material, depth: DepthTest) -> Self {
        let shading = match material.shading {
            Shading::Phong { .. } => ShadingKind::Phong,
            Shading::Basic => ShadingKind::Basic,
            Shading::ShadowCatcher => ShadingKind::ShadowCatcher,
        };
        Self {
            shading,
            side: material.side,
            blended: material.is_blended(),
            depth,
        }
    }

    fn fragment_entry(&self) -> &'static str {
        match self.shading {
            ShadingKind::Phong => "fs_phong",
            ShadingKind::Basic => "fs_basic",
            ShadingKind::ShadowCatcher => "fs_shadow_catcher",
        }
    }

    fn cull_mode(&self) -> Option<wgpu::Face> {
        match self.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }

    fn depth_compare(&self) -> wgpu::CompareFunction {
        match self.depth {
            DepthTest::Less => wgpu::CompareFunction::Less,
            DepthTest::Always => wgpu::CompareFunction::Always,
        }
    }
}

/// Perspective shadow camera from the light towards its focus point.
fn shadow_view_proj(light: &PointLight) -> Mat4 {
    let eye = light.position;
    let focus = light.shadow.focus;
    let dir = (focus - eye).try_normalize().unwrap_or(Vec3::NEG_Y);
    let up = if dir.dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let projection = Mat4::perspective_rh(light.shadow.fov, 1.0, light.shadow.near, light.shadow.far);
    projection * Mat4::look_at_rh(eye, eye + dir, up)
}

fn light_slot(light: Option<&PointLight>, eye: Vec3) -> ([f32; 4], [f32; 4]) {
    match light {
        Some(light) => {
            let p = light.world_position(eye);
            let shadow = if light.renders_shadow() { 1.0 } else { 0.0 };
            let [r, g, b] = light.radiance();
            ([p.x, p.y, p.z, shadow], [r, g, b, 1.0])
        }
        None => ([0.0; 4], [0.0; 4]),
    }
}

/// Per-layer uniforms. The first light is the key light (and the only one
/// that may cast shadows), the second is the fill light.
fn frame_uniforms(
    scene: &Scene,
    eye: Vec3,
    view_proj: Mat4,
    tone_mapping: ToneMapping,
) -> (FrameUniforms, Option<ShadowUniforms>) {
    let lights = scene.lights();
    let key = lights.first();
    let (key_light_position, key_light_color) = light_slot(key, eye);
    let (fill_light_position, fill_light_color) = light_slot(lights.get(1), eye);

    let shadow = key.filter(|l| l.renders_shadow()).map(|light| {
        let p = light.position;
        ShadowUniforms {
            light_view_proj: shadow_view_proj(light).to_cols_array_2d(),
            light_position: [p.x, p.y, p.z, 1.0],
            range: [light.shadow.near, light.shadow.far, 0.0, 0.0],
        }
    });
    let settings = key.map(|l| l.shadow).unwrap_or_default();
    let options = match tone_mapping {
        ToneMapping::None => [0.0, 1.0, 0.0, 0.0],
        ToneMapping::Uncharted2 { exposure } => [1.0, exposure, 0.0, 0.0],
    };

    let uniforms = FrameUniforms {
        view_proj: view_proj.to_cols_array_2d(),
        light_view_proj: shadow
            .map(|s| s.light_view_proj)
            .unwrap_or(Mat4::IDENTITY.to_cols_array_2d()),
        key_light_position,
        key_light_color,
        fill_light_position,
        fill_light_color,
        camera_position: [eye.x, eye.y, eye.z, 1.0],
        shadow_params: [
            settings.bias,
            1.0 / settings.map_size.max(1) as f32,
            settings.near,
            settings.far,
        ],
        options,
    };
    (uniforms, shadow)
}

fn object_uniforms(model: Mat4, material: &Material, receive_shadow: bool) -> ObjectUniforms {
    let [r, g, b] = material.color.to_linear();
    let (specular, shininess) = match material.shading {
        Shading::Phong { specular, shininess } => (specular.to_linear(), shininess.max(1e-3)),
        Shading::Basic | Shading::ShadowCatcher => ([0.0; 3], 1.0),
    };
    let shininess = if receive_shadow { shininess } else { -shininess };
    ObjectUniforms {
        model: model.to_cols_array_2d(),
        normal_matrix: model.inverse().transpose().to_cols_array_2d(),
        color: [r, g, b, material.opacity],
        specular: [specular[0], specular[1], specular[2], shininess],
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct ObjectSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct DrawItem {
    mesh: MeshId,
    slot: usize,
    key: PipelineKey,
    in_color: bool,
    cast_shadow: bool,
}

/// GPU state owned by one layer.
struct LayerTargets {
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_buffer: wgpu::Buffer,
    shadow_bind_group: wgpu::BindGroup,
    shadow_view: wgpu::TextureView,
    shadow_size: u32,
    objects: Vec<ObjectSlot>,
    draws: Vec<DrawItem>,
    pass: Option<LayerPass>,
    shadow_enabled: bool,
}

struct Layouts {
    frame: wgpu::BindGroupLayout,
    shadow: wgpu::BindGroupLayout,
    object: wgpu::BindGroupLayout,
}

impl LayerTargets {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        sampler: &wgpu::Sampler,
        kind: LayerKind,
        shadow_size: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(kind.label()),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow_camera_buffer"),
            size: std::mem::size_of::<ShadowUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_camera_bind_group"),
            layout: &layouts.shadow,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_buffer.as_entire_binding(),
            }],
        });
        let shadow_view = create_depth_view(device, "shadow_map", shadow_size, shadow_size, true);
        let frame_bind_group =
            create_frame_bind_group(device, &layouts.frame, &frame_buffer, &shadow_view, sampler);

        Self {
            frame_buffer,
            frame_bind_group,
            shadow_buffer,
            shadow_bind_group,
            shadow_view,
            shadow_size,
            objects: Vec::new(),
            draws: Vec::new(),
            pass: None,
            shadow_enabled: false,
        }
    }

    /// Grows the shadow map; it never shrinks while the layer lives.
    fn resize_shadow(
        &mut self,
        device: &wgpu::Device,
        layouts: &Layouts,
        sampler: &wgpu::Sampler,
        size: u32,
    ) {
        if self.shadow_size >= size {
            return;
        }
        self.shadow_view = create_depth_view(device, "shadow_map", size, size, true);
        self.frame_bind_group = create_frame_bind_group(
            device,
            &layouts.frame,
            &self.frame_buffer,
            &self.shadow_view,
            sampler,
        );
        self.shadow_size = size;
    }

    fn object_slot(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, index: usize) {
        while self.objects.len() <= index {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("object_buffer"),
                size: std::mem::size_of::<ObjectUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("object_bind_group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.objects.push(ObjectSlot { buffer, bind_group });
        }
    }
}

fn create_frame_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    shadow_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("frame_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(shadow_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    sampled: bool,
) -> wgpu::TextureView {
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if sampled {
        usage |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn build_scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let blend = if key.blended {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(key.fragment_entry()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(key.fragment_entry()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: key.cull_mode(),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: key.depth_compare(),
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// wgpu renderer for the three puzzle layers.
///
/// Call [`prepare`](Self::prepare) once per frame to upload uniforms and
/// any newly attached meshes, then [`render`](Self::render).
pub struct WgpuRenderer {
    surface_format: wgpu::TextureFormat,
    layouts: Layouts,
    scene_layout: wgpu::PipelineLayout,
    scene_shader: wgpu::ShaderModule,
    shadow_pipeline: wgpu::RenderPipeline,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    shadow_sampler: wgpu::Sampler,
    meshes: BTreeMap<MeshId, GpuMesh>,
    layers: BTreeMap<LayerKind, LayerTargets>,
    frame_order: Vec<LayerKind>,
    depth_texture: wgpu::TextureView,
    clear_color: wgpu::Color,
    viewport: Viewport,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let fragment_and_vertex = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let layouts = Layouts {
            frame: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("frame_bind_group_layout"),
                entries: &[
                    uniform_entry(0, fragment_and_vertex),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Depth,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
            }),
            shadow: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shadow_camera_bind_group_layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
            }),
            object: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("object_bind_group_layout"),
                entries: &[uniform_entry(0, fragment_and_vertex)],
            }),
        };

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object],
            push_constant_ranges: &[],
        });
        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&layouts.shadow, &layouts.object],
            push_constant_ranges: &[],
        });

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });

        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&shadow_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            surface_format,
            layouts,
            scene_layout,
            scene_shader,
            shadow_pipeline,
            pipelines: HashMap::new(),
            shadow_sampler,
            meshes: BTreeMap::new(),
            layers: BTreeMap::new(),
            frame_order: Vec::new(),
            depth_texture: create_depth_view(device, "depth_texture", width, height, false),
            clear_color: wgpu::Color::BLACK,
            viewport: Viewport::from_window(width, height, 0),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_view(device, "depth_texture", width, height, false);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn uploaded_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Upload everything the next frame draws.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        stage: &Stage,
        assets: &AssetStore,
        plan: &FramePlan,
        camera: &OrbitCamera,
    ) -> Result<(), RenderError> {
        let [r, g, b] = stage.clear_color.to_linear();
        self.clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
        self.viewport = camera.viewport();
        self.frame_order.clear();

        let eye = camera.eye();
        let view_proj = camera.view_projection();

        for pass in &plan.passes {
            let scene = stage.layer(pass.layer);
            let (uniforms, shadow) = frame_uniforms(scene, eye, view_proj, plan.tone_mapping);
            let shadow_size = scene
                .lights()
                .first()
                .filter(|l| l.cast_shadow)
                .map(|l| l.shadow.map_size)
                .unwrap_or(1);

            let layer = self.layers.entry(pass.layer).or_insert_with(|| {
                LayerTargets::new(
                    device,
                    &self.layouts,
                    &self.shadow_sampler,
                    pass.layer,
                    shadow_size,
                )
            });
            layer.resize_shadow(device, &self.layouts, &self.shadow_sampler, shadow_size);
            queue.write_buffer(&layer.frame_buffer, 0, bytemuck::bytes_of(&uniforms));
            if let Some(shadow) = &shadow {
                queue.write_buffer(&layer.shadow_buffer, 0, bytemuck::bytes_of(shadow));
            }
            layer.shadow_enabled = shadow.is_some();
            layer.pass = Some(*pass);
            layer.draws.clear();

            for (handle, node) in scene.nodes() {
                let Some(mesh) = node.mesh else { continue };
                if !scene.is_visible(handle) {
                    continue;
                }
                if !self.meshes.contains_key(&mesh) {
                    let data = assets.get_mesh(mesh).ok_or(RenderError::MissingMesh(mesh))?;
                    let vertices: Vec<Vertex> = data
                        .positions
                        .iter()
                        .zip(&data.normals)
                        .map(|(position, normal)| Vertex {
                            position: *position,
                            normal: *normal,
                        })
                        .collect();
                    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(data.name.as_str()),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(data.name.as_str()),
                        contents: bytemuck::cast_slice(&data.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    });
                    tracing::debug!(mesh = %data.name, triangles = data.triangle_count(), "uploaded mesh");
                    self.meshes.insert(
                        mesh,
                        GpuMesh {
                            vertex_buffer,
                            index_buffer,
                            index_count: data.indices.len() as u32,
                        },
                    );
                }

                let slot = layer.draws.len();
                layer.object_slot(device, &self.layouts.object, slot);
                let model = scene.world_transform(handle);
                let object = object_uniforms(model, &node.material, node.receive_shadow);
                queue.write_buffer(&layer.objects[slot].buffer, 0, bytemuck::bytes_of(&object));

                layer.draws.push(DrawItem {
                    mesh,
                    slot,
                    key: PipelineKey::new(&node.material, pass.depth),
                    in_color: !node.material.is_invisible(),
                    cast_shadow: node.cast_shadow,
                });
            }
            layer.draws.sort_by_key(|d| d.key.blended);

            for draw in &layer.draws {
                if draw.in_color && !self.pipelines.contains_key(&draw.key) {
                    let pipeline = build_scene_pipeline(
                        device,
                        &self.scene_layout,
                        &self.scene_shader,
                        self.surface_format,
                        draw.key,
                    );
                    self.pipelines.insert(draw.key, pipeline);
                }
            }
            self.frame_order.push(pass.layer);
        }
        Ok(())
    }

    /// Draw the prepared layers onto `view` and submit.
    pub fn render(&self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        for kind in &self.frame_order {
            let Some(layer) = self.layers.get(kind) else {
                continue;
            };
            let Some(pass_info) = layer.pass else {
                continue;
            };

            if layer.shadow_enabled {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow_pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &layer.shadow_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });
                pass.set_pipeline(&self.shadow_pipeline);
                pass.set_bind_group(0, &layer.shadow_bind_group, &[]);
                for draw in layer.draws.iter().filter(|d| d.cast_shadow) {
                    self.draw_mesh(&mut pass, layer, draw);
                }
            }

            let color_load = if pass_info.clear_color {
                wgpu::LoadOp::Clear(self.clear_color)
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if pass_info.clear_depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(kind.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_viewport(
                0.0,
                0.0,
                self.viewport.width as f32,
                self.viewport.height as f32,
                0.0,
                1.0,
            );
            pass.set_bind_group(0, &layer.frame_bind_group, &[]);
            for draw in layer.draws.iter().filter(|d| d.in_color) {
                let Some(pipeline) = self.pipelines.get(&draw.key) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                self.draw_mesh(&mut pass, layer, draw);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_mesh(&self, pass: &mut wgpu::RenderPass<'_>, layer: &LayerTargets, draw: &DrawItem) {
        let (Some(mesh), Some(object)) = (self.meshes.get(&draw.mesh), layer.objects.get(draw.slot))
        else {
            return;
        };
        pass.set_bind_group(1, &object.bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowlock_common::Color;
    use shadowlock_scene::ShadowSettings;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 240);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 160);
        assert_eq!(std::mem::size_of::<ShadowUniforms>(), 96);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn side_selects_cull_mode() {
        let front = PipelineKey::new(&Material::phong(Color::WHITE), DepthTest::Less);
        assert_eq!(front.cull_mode(), Some(wgpu::Face::Back));
        let back = PipelineKey::new(
            &Material::phong(Color::WHITE).with_opacity(0.35).with_side(Side::Back),
            DepthTest::Less,
        );
        assert_eq!(back.cull_mode(), Some(wgpu::Face::Front));
        assert!(back.blended);
        let catcher = PipelineKey::new(&Material::shadow_catcher(Color::WHITE, 0.1), DepthTest::Always);
        assert_eq!(catcher.fragment_entry(), "fs_shadow_catcher");
        assert_eq!(catcher.depth_compare(), wgpu::CompareFunction::Always);
    }

    #[test]
    fn shadow_camera_centres_focus() {
        let shadow = ShadowSettings {
            focus: Vec3::new(0.0, -2.0, 0.0),
            ..ShadowSettings::default()
        };
        let light = PointLight::new(Color::WHITE, 1.0)
            .at(Vec3::new(5.43, -4.5, 5.43))
            .with_shadow(shadow);
        let clip = shadow_view_proj(&light) * Vec3::new(0.0, -2.0, 0.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }

    #[test]
    fn shadow_camera_handles_vertical_direction() {
        let shadow = ShadowSettings {
            focus: Vec3::new(0.0, -2.0, 0.0),
            ..ShadowSettings::default()
        };
        let light = PointLight::new(Color::WHITE, 1.0)
            .at(Vec3::new(0.0, -4.5, 0.0))
            .with_shadow(shadow);
        let m = shadow_view_proj(&light);
        assert!(!m.is_nan());
    }

    #[test]
    fn dark_layer_disables_shadow_flag() {
        let mut scene = Scene::new(LayerKind::Room);
        let light = scene.add_light(
            PointLight::new(Color::WHITE, 1.0)
                .at(Vec3::new(3.0, -4.5, 3.0))
                .with_shadow(ShadowSettings::default()),
        );
        let eye = Vec3::splat(20.0);
        let (uniforms, shadow) = frame_uniforms(&scene, eye, Mat4::IDENTITY, ToneMapping::None);
        assert!(shadow.is_some());
        assert_eq!(uniforms.key_light_position[3], 1.0);
        assert_eq!(uniforms.fill_light_color, [0.0; 4]);

        scene.light_mut(light).unwrap().cast_shadow = false;
        let (uniforms, shadow) = frame_uniforms(&scene, eye, Mat4::IDENTITY, ToneMapping::None);
        assert!(shadow.is_none());
        assert_eq!(uniforms.key_light_position[3], 0.0);
    }

    #[test]
    fn camera_light_uses_eye() {
        let mut scene = Scene::new(LayerKind::Pedestal);
        scene.add_light(PointLight::new(Color::WHITE, 0.4).on_camera());
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let (uniforms, _) = frame_uniforms(
            &scene,
            eye,
            Mat4::IDENTITY,
            ToneMapping::Uncharted2 { exposure: 1.0 },
        );
        assert_eq!(uniforms.key_light_position, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(uniforms.options[0], 1.0);
    }

    #[test]
    fn non_receiver_negates_shininess() {
        let material = Material::phong(Color::WHITE).with_shininess(15.0);
        assert_eq!(object_uniforms(Mat4::IDENTITY, &material, true).specular[3], 15.0);
        assert_eq!(object_uniforms(Mat4::IDENTITY, &material, false).specular[3], -15.0);
    }
}
