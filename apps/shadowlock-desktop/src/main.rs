use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use shadowlock_assets::{AssetLoader, AssetSlot, AssetStore, LoadResult};
use shadowlock_input::{Action, ActionQueue};
use shadowlock_kernel::{ConditionStatus, Puzzle, PuzzleConfig, PuzzleEvent};
use shadowlock_render::{FramePlan, Viewport};
use shadowlock_render_wgpu::{OrbitCamera, WgpuRenderer};
use shadowlock_scene::{SceneComposer, StaticMeshes};
use shadowlock_tools::PuzzleInspector;
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const SUCCESS_MESSAGE: &str = "The shadows from the dodecahedron align with carvings on the walls. \
                               The locked door at the back of the room slides open.";

#[derive(Parser)]
#[command(name = "shadowlock-desktop", about = "Align the shadow with the carvings")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding dodec.json and temple.json
    #[arg(long, default_value = "./assets")]
    assets_dir: PathBuf,

    /// Optional YAML puzzle config
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetKey {
    Shape,
    Room,
}

impl AssetKey {
    fn file_name(self) -> &'static str {
        match self {
            AssetKey::Shape => "dodec.json",
            AssetKey::Room => "temple.json",
        }
    }
}

/// Slider positions. Kept apart from puzzle state so a drag only emits an
/// action when the value actually changes.
struct Controls {
    light_x: f64,
    rotation_x: f64,
    rotation_z: f64,
}

/// Application state.
struct AppState {
    puzzle: Puzzle,
    composer: SceneComposer,
    assets: AssetStore,
    loader: AssetLoader<AssetKey>,
    shape_slot: AssetSlot,
    room_slot: AssetSlot,
    actions: ActionQueue,
    camera: OrbitCamera,
    plan: FramePlan,
    controls: Controls,
    show_progress: bool,
    success_open: bool,
    orbiting: bool,
}

impl AppState {
    fn new(config: PuzzleConfig, assets_dir: &Path) -> Result<Self> {
        let mut assets = AssetStore::new();
        let meshes = StaticMeshes::register(&mut assets);
        let composer = SceneComposer::new(&config, &meshes)?;
        let puzzle = Puzzle::new(config);

        let mut loader = AssetLoader::new();
        for key in [AssetKey::Shape, AssetKey::Room] {
            loader.request(key, assets_dir.join(key.file_name()))?;
        }

        let state = puzzle.state();
        let controls = Controls {
            light_x: state.light_x,
            rotation_x: state.shape_rotation.x,
            rotation_z: state.shape_rotation.z,
        };

        Ok(Self {
            puzzle,
            composer,
            assets,
            loader,
            shape_slot: AssetSlot::Pending,
            room_slot: AssetSlot::Pending,
            actions: ActionQueue::new(),
            camera: OrbitCamera::default(),
            plan: FramePlan::standard(),
            controls,
            show_progress: true,
            success_open: false,
            orbiting: false,
        })
    }

    /// Everything that happens before the frame is drawn.
    fn update(&mut self) {
        for done in self.loader.poll() {
            self.finish_load(done);
        }

        for action in self.actions.drain() {
            if action.is_puzzle_action() {
                self.puzzle.apply(&action);
                continue;
            }
            match action {
                Action::Orbit(delta) => self.camera.orbit(delta),
                Action::Zoom(steps) => self.camera.zoom(steps),
                _ => {}
            }
        }
        self.composer.sync(self.puzzle.state());
    }

    /// Runs after the layers have been drawn: win check, then empty the
    /// event log.
    fn after_frame(&mut self) {
        self.puzzle.check();
        for event in self.puzzle.drain_events() {
            match event {
                PuzzleEvent::Solved => self.success_open = true,
                other => tracing::debug!(?other, "puzzle event"),
            }
        }
    }

    fn finish_load(&mut self, done: LoadResult<AssetKey>) {
        let slot = match done.result {
            Ok(mesh) => {
                let id = self.assets.register_mesh(mesh);
                let attached = match done.key {
                    AssetKey::Shape => {
                        self.puzzle.attach_shape();
                        self.composer.attach_shape(id, self.puzzle.state())
                    }
                    AssetKey::Room => self.composer.attach_room(id),
                };
                match attached {
                    Ok(_) => {
                        tracing::info!("loaded {}", done.path.display());
                        AssetSlot::Ready(id)
                    }
                    Err(e) => {
                        tracing::error!("failed to attach {}: {e}", done.path.display());
                        AssetSlot::Failed(e.to_string())
                    }
                }
            }
            Err(e) => {
                tracing::error!("failed to load {}: {e}", done.path.display());
                AssetSlot::Failed(e.to_string())
            }
        };
        match done.key {
            AssetKey::Shape => self.shape_slot = slot,
            AssetKey::Room => self.room_slot = slot,
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::KeyL => self.actions.push(Action::ToggleLight),
            KeyCode::F1 => self.show_progress = !self.show_progress,
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        egui::TopBottomPanel::bottom("controls")
            .exact_height(Viewport::CONTROL_STRIP as f32)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Shadowlock");
                    let label = if self.puzzle.state().light_on {
                        "Turn light off (L)"
                    } else {
                        "Turn light on (L)"
                    };
                    if ui.button(label).clicked() {
                        self.actions.push(Action::ToggleLight);
                    }
                });
                ui.separator();

                if ui
                    .add(egui::Slider::new(&mut self.controls.light_x, 0.0..=10.0).text("Light"))
                    .changed()
                {
                    self.actions
                        .push(Action::SetLightPosition(self.controls.light_x));
                }
                if ui
                    .add(egui::Slider::new(&mut self.controls.rotation_x, 0.0..=TAU).text("Rotate X"))
                    .changed()
                {
                    self.actions
                        .push(Action::SetShapeRotationX(self.controls.rotation_x));
                }
                if ui
                    .add(egui::Slider::new(&mut self.controls.rotation_z, 0.0..=TAU).text("Rotate Z"))
                    .changed()
                {
                    self.actions
                        .push(Action::SetShapeRotationZ(self.controls.rotation_z));
                }

                if self.show_progress {
                    ui.separator();
                    ui.horizontal(|ui| {
                        for info in PuzzleInspector::conditions(&self.puzzle) {
                            let (mark, color) = match info.status {
                                ConditionStatus::Met => ("●", egui::Color32::LIGHT_GREEN),
                                ConditionStatus::Unmet { .. } => ("○", egui::Color32::GRAY),
                                ConditionStatus::Pending => ("…", egui::Color32::DARK_GRAY),
                            };
                            ui.colored_label(color, format!("{mark} {}", info.condition.label()));
                        }
                        for (name, slot) in [("shape", &self.shape_slot), ("room", &self.room_slot)] {
                            if let AssetSlot::Failed(reason) = slot {
                                ui.colored_label(
                                    egui::Color32::LIGHT_RED,
                                    format!("{name} failed: {reason}"),
                                );
                            }
                        }
                    });
                }
                ui.small("Drag: orbit | Wheel: zoom | L: light | F1: progress");
            });

        if self.success_open {
            egui::Window::new("The door opens")
                .collapsible(false)
                .resizable(false)
                .open(&mut self.success_open)
                .show(ctx, |ui| {
                    ui.label(SUCCESS_MESSAGE);
                });
        }
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Shadowlock")
            .with_inner_size(PhysicalSize::new(1280u32, 720 + Viewport::CONTROL_STRIP));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("shadowlock_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .context("surface reports no alpha modes")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.camera.apply_viewport(viewport_for(&window, config.width, config.height));
        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
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

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn redraw(&mut self) {
        self.state.update();

        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(renderer),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
            &mut self.renderer,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
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

        let prepared = renderer.prepare(
            device,
            queue,
            self.state.composer.stage(),
            &self.state.assets,
            &self.state.plan,
            &self.state.camera,
        );
        match prepared {
            Ok(()) => renderer.render(device, queue, &view),
            Err(e) => tracing::error!("frame skipped: {e}"),
        }
        self.state.after_frame();

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

/// 3D area of the window, leaving the control strip in physical pixels.
fn viewport_for(window: &Window, width: u32, height: u32) -> Viewport {
    let reserved = (Viewport::CONTROL_STRIP as f64 * window.scale_factor()).round() as u32;
    Viewport::from_window(width, height, reserved)
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize graphics: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config), Some(window)) =
                    (&self.surface, &self.device, &mut self.config, &self.window)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state
                        .camera
                        .apply_viewport(viewport_for(window, config.width, config.height));
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.orbiting = btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.state.actions.push(Action::Zoom(steps));
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
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
            if self.state.orbiting {
                self.state
                    .actions
                    .push(Action::Orbit(Vec2::new(delta.0 as f32, delta.1 as f32)));
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("shadowlock-desktop starting");

    let config = match &cli.config {
        Some(path) => PuzzleConfig::load(path)
            .with_context(|| format!("load puzzle config {}", path.display()))?,
        None => PuzzleConfig::default(),
    };
    let state = AppState::new(config, &cli.assets_dir)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppState {
        AppState::new(PuzzleConfig::default(), Path::new("/nonexistent/shadowlock")).unwrap()
    }

    #[test]
    fn controls_start_from_initial_state() {
        let state = app();
        assert_eq!(state.controls.light_x, 10.0);
        assert_eq!(state.controls.rotation_x, 0.0);
        assert!(state.show_progress);
        assert!(!state.success_open);
    }

    #[test]
    fn camera_actions_do_not_reach_puzzle() {
        let mut state = app();
        let before = state.camera.eye();
        state.actions.push(Action::Orbit(Vec2::new(40.0, 0.0)));
        state.actions.push(Action::Zoom(2.0));
        state.update();
        assert_ne!(state.camera.eye(), before);
        assert_eq!(state.puzzle.state().light_x, 10.0);
        assert!(state.actions.is_empty());
    }

    #[test]
    fn light_key_toggles_lamp() {
        let mut state = app();
        state.handle_key(KeyCode::KeyL);
        state.update();
        assert!(!state.puzzle.state().light_on);
        state.handle_key(KeyCode::F1);
        assert!(!state.show_progress);
    }

    #[test]
    fn solving_opens_success_window_once() {
        let mut state = app();
        state.puzzle.attach_shape();
        state.actions.push(Action::SetLightPosition(5.43));
        state.actions.push(Action::SetShapeRotationX(1.71));
        state.actions.push(Action::SetShapeRotationZ(2.41));
        state.update();
        state.after_frame();
        assert!(state.success_open);

        state.success_open = false;
        state.after_frame();
        assert!(!state.success_open);
    }

    #[test]
    fn event_log_emptied_every_frame() {
        let mut state = app();
        for i in 0..1000 {
            state.actions.push(Action::SetLightPosition(i as f64 / 100.0));
            state.actions.push(Action::SetShapeRotationX(0.5));
            state.update();
            state.after_frame();
            assert!(state.puzzle.events().is_empty());
        }
        assert_eq!(state.puzzle.state().light_x, 9.99);
    }

    #[test]
    fn switching_off_on_the_solution_does_not_open_the_door() {
        let mut state = app();
        state.puzzle.attach_shape();
        state.actions.push(Action::SetLightPosition(5.43));
        state.actions.push(Action::SetShapeRotationX(1.71));
        state.actions.push(Action::SetShapeRotationZ(2.41));
        state.handle_key(KeyCode::KeyL);
        state.update();
        state.after_frame();
        assert!(!state.success_open);

        state.handle_key(KeyCode::KeyL);
        state.update();
        state.after_frame();
        assert!(state.success_open);
    }

    #[test]
    fn missing_asset_marks_slot_failed() {
        let mut state = app();
        while let Some(done) = state.loader.wait(std::time::Duration::from_secs(5)) {
            state.finish_load(done);
        }
        assert!(matches!(state.shape_slot, AssetSlot::Failed(_)));
        assert!(matches!(state.room_slot, AssetSlot::Failed(_)));
        assert!(!state.puzzle.state().shape_attached);
        assert!(state.composer.shape().is_none());
    }
}
