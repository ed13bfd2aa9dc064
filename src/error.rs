use error_iter::ErrorIter as _;
use log::error;

/// Top-level failure returned by [`crate::run`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event loop failed")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("could not open window")]
    Window(#[from] winit::error::OsError),
    #[error("backend failed")]
    Backend(#[from] BackendError),
    #[error("scene setup failed")]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("grid size must be at least 1")]
    EmptyGrid,
    #[error("a {grid_size}x{grid_size} grid needs more than {max_vertices} vertices")]
    TooLarge { grid_size: usize, max_vertices: usize },
}

/// A snapshot whose dimensions disagree with the established grid size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },
    #[error("snapshot row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("backend reported a world width of 0")]
    ZeroWidth,
    #[error("world width already set to {established}, backend now reports {offered}")]
    WidthChanged { established: usize, offered: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no backend program given (pass one, or use --demo)")]
    MissingProgram,
    #[error("could not start backend `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("backend process has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("backend i/o failed")]
    Io(#[from] std::io::Error),
    #[error("could not seed the demo generator")]
    Seed(#[from] getrandom::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("window has a zero-sized surface")]
    ZeroSized,
    #[error("could not create a render surface")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter")]
    NoAdapter,
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
    #[error("could not open graphics device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("could not build hex mesh")]
    Mesh(#[from] MeshError),
}

/// Log an error together with every error in its `source()` chain.
pub fn log_error<E: std::error::Error + 'static>(method_name: &str, err: E) {
    error!("{method_name}() failed: {err}");
    for source in err.sources().skip(1) {
        error!("  Caused by: {source}");
    }
}
