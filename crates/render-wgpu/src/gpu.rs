use crate::camera::FlyCamera;
use crate::mesh::{MeshData, Vertex};
use crate::shaders;
use crate::texture::{self, DEPTH_FORMAT};
use bytemuck::{Pod, Zeroable};
use tilescape_assets::{AssetLibrary, MaterialImages, TextureImage};
use tilescape_render::{
    DrawList, DrawPass, LightingSetup, MaterialSlot, MeshKind, PointLight, MAX_POINT_LIGHTS,
};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuLight {
    position: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    attenuation: [f32; 4],
}

impl From<&PointLight> for GpuLight {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            ambient: light.ambient.extend(1.0).to_array(),
            diffuse: light.diffuse.extend(1.0).to_array(),
            specular: light.specular.extend(1.0).to_array(),
            attenuation: light.attenuation.extend(0.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    sky_view_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
    counts: [u32; 4],
    material: [f32; 4],
    sun: GpuLight,
    lights: [GpuLight; MAX_POINT_LIGHTS],
}

impl FrameUniforms {
    fn new(camera: &FlyCamera, lighting: &LightingSetup) -> Self {
        let mut lights = [GpuLight::zeroed(); MAX_POINT_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&lighting.points) {
            *slot = light.into();
        }
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            sky_view_proj: camera.sky_view_projection().to_cols_array_2d(),
            view_pos: camera.position.extend(1.0).to_array(),
            counts: [lighting.points.len().min(MAX_POINT_LIGHTS) as u32, 0, 0, 0],
            material: [lighting.shininess, 0.0, 0.0, 0.0],
            sun: (&lighting.sun).into(),
            lights,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
}

impl From<&glam::Mat4> for InstanceData {
    fn from(m: &glam::Mat4) -> Self {
        let cols = m.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
        }
    }
}

const INSTANCE_SIZE: u64 = std::mem::size_of::<InstanceData>() as u64;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }

    fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    lit_pipeline: wgpu::RenderPipeline,
    lamp_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    floor_materials: Vec<wgpu::BindGroup>,
    wall_materials: Vec<wgpu::BindGroup>,
    model_material: wgpu::BindGroup,
    sky_bind_group: wgpu::BindGroup,
    cube: GpuMesh,
    floor: GpuMesh,
    door: GpuMesh,
    sky: GpuMesh,
    model: Option<GpuMesh>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        assets: &AssetLibrary,
    ) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Materials
        let material_layout = texture::material_layout(device);
        let material_sampler =
            texture::create_sampler(device, "material_sampler", wgpu::AddressMode::Repeat);
        let material = |label: &str, images: &MaterialImages| {
            texture::material_bind_group(device, queue, &material_layout, &material_sampler, label, images)
        };
        let floor_materials = assets
            .packs
            .iter()
            .enumerate()
            .map(|(i, pack)| material(&format!("floor_material_{}", i + 1), &pack.floor))
            .collect();
        let wall_materials = assets
            .packs
            .iter()
            .enumerate()
            .map(|(i, pack)| material(&format!("wall_material_{}", i + 1), &pack.wall))
            .collect();
        let model_material = material(
            "model_material",
            &MaterialImages {
                diffuse: assets
                    .model
                    .as_ref()
                    .and_then(|m| m.base_color.clone())
                    .unwrap_or_else(|| TextureImage::solid([255, 255, 255, 255])),
                specular: TextureImage::solid([0, 0, 0, 255]),
            },
        );

        // Skybox
        let sky_layout = texture::sky_layout(device);
        let sky_view = texture::upload_cubemap(device, queue, &assets.skybox);
        let sky_sampler =
            texture::create_sampler(device, "sky_sampler", wgpu::AddressMode::ClampToEdge);
        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky_bind_group"),
            layout: &sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&sky_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sky_sampler),
                },
            ],
        });

        // Pipelines
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![
                0 => Float32x3,
                1 => Float32x3,
                2 => Float32x2,
            ],
        };
        let position_only_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        };
        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: INSTANCE_SIZE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![
                3 => Float32x4,
                4 => Float32x4,
                5 => Float32x4,
                6 => Float32x4,
            ],
        };

        let lit_pipeline = create_pipeline(
            device,
            PipelineSpec {
                label: "lit",
                source: shaders::lit_shader(),
                entry_points: ("vs_main", "fs_main"),
                bind_group_layouts: &[&frame_layout, &material_layout],
                buffers: &[vertex_layout, instance_layout.clone()],
                format: surface_format,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let lamp_pipeline = create_pipeline(
            device,
            PipelineSpec {
                label: "lamp",
                source: shaders::lamp_shader(),
                entry_points: ("vs_lamp", "fs_lamp"),
                bind_group_layouts: &[&frame_layout],
                buffers: &[position_only_layout.clone(), instance_layout],
                format: surface_format,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let sky_pipeline = create_pipeline(
            device,
            PipelineSpec {
                label: "sky",
                source: shaders::sky_shader(),
                entry_points: ("vs_sky", "fs_sky"),
                bind_group_layouts: &[&frame_layout, &sky_layout],
                buffers: &[position_only_layout],
                format: surface_format,
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );

        // Meshes
        let cube = GpuMesh::upload(device, "cube", &MeshData::unit_cube());
        let floor = GpuMesh::upload(device, "floor", &MeshData::floor_tile());
        let door = GpuMesh::upload(device, "door", &MeshData::door_frame());
        let sky = GpuMesh::upload(device, "sky", &MeshData::sky_cube());
        let model = assets
            .model
            .as_ref()
            .map(MeshData::from_model)
            .filter(|mesh| !mesh.is_empty())
            .map(|mesh| GpuMesh::upload(device, "model", &mesh));

        let instance_capacity = 1024;
        let instance_buffer = create_instance_buffer(device, instance_capacity);
        let depth_texture = texture::create_depth_texture(device, width, height);

        tracing::info!(
            "renderer ready: {} texture packs, skybox {}px, model={}",
            assets.packs.len(),
            assets.skybox.size(),
            model.is_some()
        );

        Self {
            lit_pipeline,
            lamp_pipeline,
            sky_pipeline,
            frame_buffer,
            frame_bind_group,
            floor_materials,
            wall_materials,
            model_material,
            sky_bind_group,
            cube,
            floor,
            door,
            sky,
            model,
            instance_buffer,
            instance_capacity,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = texture::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Render one frame: every pass of `list`, then the skybox.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FlyCamera,
        list: &DrawList,
        lighting: &LightingSetup,
    ) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(camera, lighting)),
        );

        // All passes share one instance buffer, laid out back to back.
        let instances: Vec<InstanceData> = list
            .passes()
            .iter()
            .flat_map(|pass| pass.transforms.iter().map(InstanceData::from))
            .collect();
        if instances.len() as u64 > self.instance_capacity {
            self.instance_capacity = (instances.len() as u64).next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
            tracing::debug!("grew instance buffer to {}", self.instance_capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let mut first = 0u64;
            for draw in list.passes() {
                let count = draw.len() as u64;
                if count > 0 {
                    self.draw_pass(&mut pass, draw, first);
                }
                first += count;
            }

            pass.set_pipeline(&self.sky_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, &self.sky_bind_group, &[]);
            self.sky.bind(&mut pass);
            pass.draw_indexed(0..self.sky.index_count, 0, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_pass<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, draw: &DrawPass, first: u64) {
        let mesh = match draw.mesh {
            MeshKind::Floor => &self.floor,
            MeshKind::Wall | MeshKind::Lamp => &self.cube,
            MeshKind::Door => &self.door,
            MeshKind::Model => match &self.model {
                Some(model) => model,
                None => return,
            },
        };

        match draw.material {
            MaterialSlot::Lamp => {
                pass.set_pipeline(&self.lamp_pipeline);
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
            }
            MaterialSlot::Floor(pack) => self.bind_lit(pass, &self.floor_materials[pack.index()]),
            MaterialSlot::Wall(pack) => self.bind_lit(pass, &self.wall_materials[pack.index()]),
            MaterialSlot::Model => self.bind_lit(pass, &self.model_material),
        }

        let count = draw.len() as u64;
        mesh.bind(pass);
        pass.set_vertex_buffer(
            1,
            self.instance_buffer
                .slice(first * INSTANCE_SIZE..(first + count) * INSTANCE_SIZE),
        );
        pass.draw_indexed(0..mesh.index_count, 0, 0..count as u32);
    }

    fn bind_lit<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, material: &'a wgpu::BindGroup) {
        pass.set_pipeline(&self.lit_pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_bind_group(1, material, &[]);
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    source: String,
    entry_points: (&'a str, &'a str),
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(device: &wgpu::Device, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{}_shader", spec.label)),
        source: wgpu::ShaderSource::Wgsl(spec.source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{}_pipeline_layout", spec.label)),
        bind_group_layouts: spec.bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{}_pipeline", spec.label)),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(spec.entry_points.0),
            compilation_options: Default::default(),
            buffers: spec.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(spec.entry_points.1),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: spec.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: spec.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: capacity * INSTANCE_SIZE,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use tilescape_map::parse_lines;

    #[test]
    fn frame_uniforms_match_shader_layout() {
        // 2 matrices, 3 vec4 fields, sun + 32 lights of 5 vec4 each.
        let expected = 2 * 64 + 3 * 16 + (1 + MAX_POINT_LIGHTS) * 80;
        assert_eq!(std::mem::size_of::<FrameUniforms>(), expected);
        assert_eq!(std::mem::size_of::<GpuLight>() % 16, 0);
    }

    #[test]
    fn frame_uniforms_from_scene() {
        let scene = parse_lines(["l.l"]);
        let lighting = LightingSetup::from_scene(&scene);
        let frame = FrameUniforms::new(&FlyCamera::default(), &lighting);

        assert_eq!(frame.counts[0], 2);
        assert_eq!(frame.material[0], 64.0);
        assert_eq!(frame.view_pos, [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(frame.lights[1].position, [2.0, 0.0, 0.0, 1.0]);
        assert_eq!(frame.lights[2].position, [0.0; 4]);
        assert_eq!(frame.sun.ambient[0], 0.04);
    }

    #[test]
    fn instance_data_is_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let data = InstanceData::from(&m);
        assert_eq!(data.model_3, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(data.model_0, [1.0, 0.0, 0.0, 0.0]);
    }
}
