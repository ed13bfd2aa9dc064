use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::{CameraUniform, OrthographicCamera, PanZoomController};
use crate::config::Config;
use crate::error::{MeshError, SceneError, SnapshotError};
use crate::hexgrid::{max_vertices_for_buffer, HexMesh, MAX_VERTICES};
use crate::vertex::{Vertex, VertexColor};
use crate::world::WorldSnapshot;

const CAMERA_Z: f32 = 1.;
const ZNEAR: f32 = 0.1;
const ZFAR: f32 = 2000.;

/// Repeating "draw the next frame" task with a single cancellation point.
#[derive(Debug)]
pub struct FrameLoop {
    active: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start() -> Self {
        Self {
            active: true,
            frames: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame_presented(&mut self) {
        self.frames += 1;
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }
}

/// GPU copy of the hex mesh. The color buffer is swapped for a new one on
/// each snapshot; the position buffer lives as long as the mesh.
struct GpuMesh {
    mesh: HexMesh,
    position_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    num_vertices: u32,
}

fn create_color_buffer(device: &wgpu::Device, colors: &[VertexColor]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Hex Color Buffer"),
        contents: bytemuck::cast_slice(colors),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

pub struct SceneHost<'window> {
    surface: wgpu::Surface<'window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,

    camera: OrthographicCamera,
    controller: PanZoomController,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    grid: Option<GpuMesh>,
    frame_loop: FrameLoop,

    window: &'window Window,
}

impl<'window> SceneHost<'window> {
    // Creating some of the wgpu types requires async code
    pub async fn new(window: &'window Window, settings: &Config) -> Result<SceneHost<'window>, SceneError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(SceneError::ZeroSized);
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SceneError::NoAdapter)?;
        info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default()
                    },
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(SceneError::UnsupportedSurface)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = OrthographicCamera::new((0., 0., CAMERA_Z), settings.camera_radius, ZNEAR, ZFAR);
        let controller = PanZoomController::new(size.width, size.height, settings.zoom_speed);
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Hex Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc(), VertexColor::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Fan winding flips with the screen-style Y axis.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        info!("scene created at {}x{}", size.width, size.height);

        Ok(SceneHost {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,

            camera,
            controller,
            camera_uniform,
            camera_buffer,
            camera_bind_group,

            grid: None,
            frame_loop: FrameLoop::start(),

            window,
        })
    }

    pub fn window(&self) -> &Window {
        self.window
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn has_grid(&self) -> bool {
        self.grid.is_some()
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.controller.resize(new_size.width, new_size.height);
        }
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        self.controller.process_event(&mut self.camera, event)
    }

    /// Build the mesh for a `grid_size` world and upload it, all cells dead.
    pub fn set_grid(&mut self, grid_size: usize) -> Result<(), SceneError> {
        let max_vertices = max_vertices_for_buffer(self.device.limits().max_buffer_size);
        let mesh = HexMesh::build_within(grid_size, max_vertices)?;

        let position_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Hex Position Buffer"),
            contents: bytemuck::cast_slice(mesh.positions()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let color_buffer = create_color_buffer(&self.device, mesh.colors());
        let num_vertices = u32::try_from(mesh.vertex_count()).map_err(|_| MeshError::TooLarge {
            grid_size,
            max_vertices: max_vertices.min(MAX_VERTICES),
        })?;

        info!("hex grid {grid_size}x{grid_size} uploaded, {num_vertices} vertices");
        self.grid = Some(GpuMesh {
            mesh,
            position_buffer,
            color_buffer,
            num_vertices,
        });
        Ok(())
    }

    /// Recolor the mesh from `snapshot`. Snapshots arriving before the grid
    /// exists are dropped; the caller is expected to hold them.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
        let Some(grid) = self.grid.as_mut() else {
            warn!("snapshot arrived before the grid was built");
            return Ok(());
        };
        grid.mesh.apply_snapshot(snapshot)?;

        grid.color_buffer = create_color_buffer(&self.device, grid.mesh.colors());
        debug!("applied snapshot, {} cells alive", snapshot.alive_count());
        Ok(())
    }

    pub fn update(&mut self) {
        if self.camera.take_dirty() {
            self.camera_uniform.update_view_proj(&self.camera);
            self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(grid) = &self.grid {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, grid.position_buffer.slice(..));
                render_pass.set_vertex_buffer(1, grid.color_buffer.slice(..));
                render_pass.draw(0..grid.num_vertices, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        self.frame_loop.frame_presented();

        Ok(())
    }

    /// Stop the frame loop and release the surface before the window goes.
    pub fn teardown(mut self) {
        self.frame_loop.cancel();
        info!("scene torn down after {} frames", self.frame_loop.frames());
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_loop_runs_until_cancelled() {
        let mut frames = FrameLoop::start();
        assert!(frames.is_active());

        frames.frame_presented();
        frames.frame_presented();
        assert_eq!(frames.frames(), 2);

        frames.cancel();
        assert!(!frames.is_active());
        assert_eq!(frames.frames(), 2);
    }

    #[test]
    fn shader_validates() {
        let module = naga::front::wgsl::parse_str(include_str!("shader.wgsl")).unwrap();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap();
    }
}
