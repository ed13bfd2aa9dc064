pub mod backend;
pub mod camera;
pub mod config;
pub mod error;
pub mod hexgrid;
pub mod scene;
pub mod vertex;
pub mod world;

use log::{debug, error, info, warn};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoopBuilder;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::backend::BackendEvent;
use crate::error::{SceneError, SnapshotError};
use crate::scene::SceneHost;
use crate::world::{WorldSnapshot, WorldView};

pub use crate::config::Config;
pub use crate::error::{log_error, Error};

/// Something a world can be drawn into: sized once, then recolored.
pub trait GridTarget {
    fn has_grid(&self) -> bool;
    fn set_grid(&mut self, grid_size: usize) -> Result<(), SceneError>;
    fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), SnapshotError>;
}

impl GridTarget for SceneHost<'_> {
    fn has_grid(&self) -> bool {
        SceneHost::has_grid(self)
    }

    fn set_grid(&mut self, grid_size: usize) -> Result<(), SceneError> {
        SceneHost::set_grid(self, grid_size)
    }

    fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
        SceneHost::apply_snapshot(self, snapshot)
    }
}

/// Route one backend event. Only a failure to build the grid is fatal;
/// bad widths and bad snapshots are logged and dropped.
pub fn handle_backend_event<T: GridTarget>(
    target: &mut T,
    view: &mut WorldView,
    event: BackendEvent,
) -> Result<(), SceneError> {
    match event {
        BackendEvent::WorldWidth(width) => match view.establish_width(width) {
            Ok(pending) => {
                if !target.has_grid() {
                    info!("world width is {width}");
                    target.set_grid(width)?;
                }
                if let Some(snapshot) = pending {
                    show(target, &snapshot);
                }
            }
            Err(err) => log_error("establish_width", err),
        },
        BackendEvent::UpdateWorld(snapshot) => match view.offer(snapshot) {
            Some(snapshot) => show(target, &snapshot),
            None => debug!("holding snapshot until the world width is known"),
        },
        BackendEvent::Closed => info!("backend closed, keeping the last world on screen"),
    }
    Ok(())
}

fn show<T: GridTarget>(target: &mut T, snapshot: &WorldSnapshot) {
    if let Err(err) = target.apply_snapshot(snapshot) {
        warn!("rejected snapshot: {err}");
    }
}

pub async fn run(config: Config) -> Result<(), Error> {
    env_logger::init();
    let event_loop = EventLoopBuilder::<BackendEvent>::with_user_event().build()?;

    let window = {
        let size = winit::dpi::LogicalSize::new(config.width, config.height);
        WindowBuilder::new()
            .with_title("Hex Life")
            .with_inner_size(size)
            .build(&event_loop)?
    };

    let mut scene = Some(SceneHost::new(&window, &config).await?);
    let mut view = WorldView::new();
    let _feed = backend::start(&config, event_loop.create_proxy())?;

    event_loop.run(move |event, elwt| {
        let Some(state) = scene.as_mut() else {
            return;
        };
        match event {
            Event::WindowEvent {
                ref event, window_id
            } if window_id == state.window().id() && !state.input(event) => match event {
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event: KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                    ..
                } => {
                    info!("close requested, stopping");
                    elwt.exit();
                }
                WindowEvent::Resized(physical_size) => {
                    state.resize(*physical_size);
                }
                WindowEvent::RedrawRequested => {
                    state.update();
                    match state.render() {
                        Ok(_) => {}
                        // Reconfigure the surface if lost
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.resize(state.size()),
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("out of GPU memory, stopping");
                            elwt.exit();
                        }
                        // Timeout should be resolved by the next frame
                        Err(e) => warn!("{e:?}"),
                    }
                }
                _ => {}
            },
            Event::UserEvent(backend_event) => {
                if let Err(err) = handle_backend_event(state, &mut view, backend_event) {
                    log_error("handle_backend_event", err);
                    elwt.exit();
                }
            }
            Event::AboutToWait => {
                if state.frame_loop().is_active() {
                    state.window().request_redraw();
                }
            }
            Event::LoopExiting => {
                if let Some(scene) = scene.take() {
                    scene.teardown();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
