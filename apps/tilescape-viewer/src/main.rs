use anyhow::{anyhow, Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tilescape_assets::{AssetLibrary, AssetManifest};
use tilescape_input::{Action, Key, KeyBindings, MovementState, TexturePack};
use tilescape_map::{MapParser, SceneCounts, SceneStore};
use tilescape_render::{DrawList, LightingSetup};
use tilescape_render_wgpu::{FlyCamera, WgpuRenderer};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "tilescape-viewer", about = "Walk through a tilescape map")]
struct Cli {
    /// Map file, one character per cell
    #[arg(long, default_value = "resources/map.txt")]
    map: PathBuf,

    /// Asset root directory
    #[arg(long, default_value = "resources")]
    assets: PathBuf,

    /// Asset manifest (JSON). Defaults to <assets>/manifest.json when present
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Initial texture pack (1-3)
    #[arg(long, default_value = "1")]
    texture_pack: TexturePack,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Platform key to viewer key.
fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Digit1,
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Digit2,
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Digit3,
        KeyCode::Escape => Key::Escape,
        KeyCode::F1 => Key::F1,
        _ => Key::Other,
    }
}

fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        // Roughly one line per 20 logical pixels.
        MouseScrollDelta::PixelDelta(p) => (p.y / 20.0) as f32,
    }
}

/// Everything the viewer knows apart from the GPU.
struct AppState {
    map_path: PathBuf,
    scene: SceneStore,
    counts: SceneCounts,
    lighting: LightingSetup,
    draw_list: DrawList,
    camera: FlyCamera,
    bindings: KeyBindings,
    movement: MovementState,
    pack: TexturePack,
    show_hud: bool,
    /// Raw mouse motion arrives even when another window has focus.
    focused: bool,
    missing_assets: usize,
    last_frame: Instant,
    fps: f32,
}

impl AppState {
    fn new(map_path: PathBuf, scene: SceneStore, pack: TexturePack, missing_assets: usize) -> Self {
        let lighting = LightingSetup::from_scene(&scene);
        let draw_list = DrawList::build(&scene, &lighting, pack);
        Self {
            map_path,
            counts: scene.counts(),
            scene,
            lighting,
            draw_list,
            camera: FlyCamera::default(),
            bindings: KeyBindings::default(),
            movement: MovementState::new(),
            pack,
            show_hud: false,
            focused: true,
            missing_assets,
            last_frame: Instant::now(),
            fps: 0.0,
        }
    }

    fn update(&mut self, dt: f32) {
        for direction in self.movement.held() {
            self.camera.advance(direction, dt);
        }
        if dt > 0.0 {
            self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.movement.clear();
        }
    }

    /// Returns `false` when the viewer should close.
    fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Look { dx, dy } if self.focused => self.camera.rotate(dx, dy),
            Action::Zoom(delta) => self.camera.zoom_by(delta),
            Action::SelectTexturePack(pack) if pack != self.pack => {
                self.pack = pack;
                self.draw_list = DrawList::build(&self.scene, &self.lighting, pack);
                tracing::info!("switched to {pack}");
            }
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::Quit => return false,
            Action::Look { .. } | Action::SelectTexturePack(_) | Action::Move(_) | Action::Noop => {}
        }
        true
    }

    fn handle_key(&mut self, key: Key, pressed: bool) -> bool {
        match self.bindings.on_key(key, pressed, &mut self.movement) {
            Some(action) => self.apply(action),
            None => true,
        }
    }

    fn draw_hud(&self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        egui::Window::new("Tilescape")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Map: {}", self.map_path.display()));
                ui.label(format!(
                    "Walls {}  Doors {}  Floors {}",
                    self.counts.walls, self.counts.doors, self.counts.floors
                ));
                ui.label(format!(
                    "Lights {}  Models {}",
                    self.counts.lights, self.counts.models
                ));
                if self.lighting.dropped > 0 {
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("{} lights over the limit", self.lighting.dropped),
                    );
                }
                if self.missing_assets > 0 {
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("{} assets replaced by placeholders", self.missing_assets),
                    );
                }
                ui.separator();

                let p = self.camera.position;
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.label(format!(
                    "Yaw {:.0}  Pitch {:.0}  FOV {:.0}",
                    self.camera.yaw, self.camera.pitch, self.camera.zoom
                ));
                ui.label(format!("Texture {}", self.pack));
                ui.label(format!("{:.0} fps, {} instances", self.fps, self.draw_list.instance_count()));

                ui.separator();
                ui.small("WASD: Move | Mouse: Look | Scroll: Zoom | 1-3: Textures | F1: HUD | Esc: Quit");
            });
    }
}

/// Window and GPU objects, created on first resume.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        size: PhysicalSize<u32>,
        assets: &AssetLibrary,
        egui_ctx: &EguiContext,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Tilescape")
            .with_inner_size(size);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tilescape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            assets,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn grab_cursor(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("could not capture the cursor: {e}");
        }
        self.window.set_cursor_visible(false);
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw_overlay(
        &mut self,
        view: &wgpu::TextureView,
        egui_ctx: &EguiContext,
        state: &AppState,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_hud(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct ViewerApp {
    state: AppState,
    assets: AssetLibrary,
    window_size: PhysicalSize<u32>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(state: AppState, assets: AssetLibrary, window_size: PhysicalSize<u32>) -> Self {
        Self {
            state,
            assets,
            window_size,
            gpu: None,
            egui_ctx: EguiContext::default(),
            error: None,
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.draw_list,
            &self.state.lighting,
        );
        gpu.draw_overlay(&view, &self.egui_ctx, &self.state);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, self.window_size, &self.assets, &self.egui_ctx) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.state.camera.set_viewport(size.width, size.height);
                gpu.grab_cursor();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to start renderer: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state
                        .camera
                        .set_viewport(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::Focused(true) => {
                self.state.set_focused(true);
                if let Some(gpu) = &self.gpu {
                    gpu.grab_cursor();
                }
            }
            WindowEvent::Focused(false) => self.state.set_focused(false),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if !self.state.handle_key(map_key(code), pressed) {
                    tracing::info!("quit requested");
                    event_loop.exit();
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state
                    .apply(Action::zoom_from_scroll(scroll_lines(delta)));
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.apply(Action::look_from_mouse(delta.0, delta.1));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn load_manifest(explicit: Option<&Path>, asset_root: &Path) -> Result<AssetManifest> {
    if let Some(path) = explicit {
        return AssetManifest::load(path)
            .with_context(|| format!("reading manifest {}", path.display()));
    }
    let default_path = asset_root.join("manifest.json");
    if default_path.is_file() {
        tracing::info!("using manifest {}", default_path.display());
        return AssetManifest::load(&default_path)
            .with_context(|| format!("reading manifest {}", default_path.display()));
    }
    Ok(AssetManifest::default())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("tilescape-viewer starting");

    let manifest = load_manifest(cli.manifest.as_deref(), &cli.assets)?;

    let parsed = match MapParser::new(manifest.symbol_table()).load(&cli.map) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("{e}");
            return Err(e.into());
        }
    };
    if parsed.scene.is_empty() {
        tracing::warn!("map {} places nothing", cli.map.display());
    }

    let assets = AssetLibrary::load(&manifest, &cli.assets);
    let state = AppState::new(
        cli.map.clone(),
        parsed.scene,
        cli.texture_pack,
        assets.missing.len(),
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(state, assets, PhysicalSize::new(cli.width, cli.height));
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape_input::MoveDirection;
    use tilescape_map::parse_lines;

    fn state(lines: &[&str]) -> AppState {
        AppState::new(
            PathBuf::from("map.txt"),
            parse_lines(lines.iter().copied()),
            TexturePack::default(),
            0,
        )
    }

    #[test]
    fn keys_map_to_viewer_keys() {
        assert_eq!(map_key(KeyCode::KeyW), Key::W);
        assert_eq!(map_key(KeyCode::Numpad2), Key::Digit2);
        assert_eq!(map_key(KeyCode::Escape), Key::Escape);
        assert_eq!(map_key(KeyCode::KeyQ), Key::Other);
    }

    #[test]
    fn held_keys_move_camera() {
        let mut s = state(&["W"]);
        s.handle_key(Key::W, true);
        s.update(1.0);
        assert!((s.camera.position.z - 0.5).abs() < 1e-5);

        s.handle_key(Key::W, false);
        s.update(1.0);
        assert!((s.camera.position.z - 0.5).abs() < 1e-5);
        assert!(!s.movement.is_held(MoveDirection::Forward));
    }

    #[test]
    fn pack_switch_rebuilds_draw_list() {
        let mut s = state(&["WO"]);
        let before = s.draw_list.clone();
        assert!(s.handle_key(Key::Digit2, true));
        assert_eq!(s.pack.number(), 2);
        assert_ne!(s.draw_list, before);
        assert_eq!(s.draw_list.passes()[1].transforms, before.passes()[1].transforms);
    }

    #[test]
    fn escape_quits_and_f1_toggles_hud() {
        let mut s = state(&[]);
        assert!(s.handle_key(Key::F1, true));
        assert!(s.show_hud);
        assert!(s.handle_key(Key::F1, false));
        assert!(s.show_hud);
        assert!(!s.handle_key(Key::Escape, true));
    }

    #[test]
    fn mouse_and_scroll() {
        let mut s = state(&[]);
        s.apply(Action::look_from_mouse(0.0, -100.0));
        assert!((s.camera.pitch - 10.0).abs() < 1e-4);
        s.apply(Action::zoom_from_scroll(5.0));
        assert_eq!(s.camera.zoom, 40.0);
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, -2.0)), -2.0);
    }

    #[test]
    fn mouse_look_ignored_without_focus() {
        let mut s = state(&[]);
        s.handle_key(Key::W, true);
        s.set_focused(false);
        assert!(!s.movement.is_held(MoveDirection::Forward));

        s.apply(Action::look_from_mouse(300.0, 100.0));
        assert_eq!(s.camera.yaw, -90.0);
        assert_eq!(s.camera.pitch, 0.0);

        s.set_focused(true);
        s.apply(Action::look_from_mouse(0.0, -100.0));
        assert!((s.camera.pitch - 10.0).abs() < 1e-4);
    }

    #[test]
    fn explicit_missing_manifest_is_an_error() {
        let dir = std::env::temp_dir();
        assert!(load_manifest(Some(&dir.join("no-such-manifest.json")), &dir).is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["tilescape-viewer"]);
        assert_eq!(cli.map, PathBuf::from("resources/map.txt"));
        assert_eq!((cli.width, cli.height), (800, 600));
        assert_eq!(cli.texture_pack.number(), 1);
        assert!(Cli::try_parse_from(["tilescape-viewer", "--texture-pack", "4"]).is_err());
    }
}
