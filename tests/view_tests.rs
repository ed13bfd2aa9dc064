//! View Tests - Mesh Coloring, Startup Ordering and Camera Gestures
//!
//! Drives the public API the way the event loop does, without a GPU.

use std::io::Cursor;
use std::sync::mpsc;

use cgmath::Vector2;
use hexlife_view::backend::{pump, BackendEvent};
use hexlife_view::camera::{OrthographicCamera, PanZoomController, ZOOM_SPEED};
use hexlife_view::error::{SceneError, SnapshotError};
use hexlife_view::hexgrid::{HexMesh, ALIVE_COLOR, DEAD_COLOR};
use hexlife_view::world::{Cell, WorldSnapshot, WorldView};
use hexlife_view::{handle_backend_event, GridTarget};

// ============================================================================
// Mesh
// ============================================================================

#[test]
fn test_two_by_two_checkerboard() {
    let mut mesh = HexMesh::build(2).unwrap();
    assert_eq!(mesh.vertex_count(), 48);

    let snapshot: WorldSnapshot =
        serde_json::from_str(r#"{"cells":[["Alive","Dead"],["Dead","Alive"]]}"#).unwrap();
    mesh.apply_snapshot(&snapshot).unwrap();

    let colors = mesh.colors();
    assert!(colors[0..12].iter().all(|c| c.color == ALIVE_COLOR));
    assert!(colors[12..36].iter().all(|c| c.color == DEAD_COLOR));
    assert!(colors[36..48].iter().all(|c| c.color == ALIVE_COLOR));
}

#[test]
fn test_uniform_snapshots() {
    let mut mesh = HexMesh::build(6).unwrap();

    mesh.apply_snapshot(&WorldSnapshot::new(vec![vec![Cell::Alive; 6]; 6])).unwrap();
    assert!(mesh.colors().iter().all(|c| c.color == [0.1, 0.1, 0.1]));

    mesh.apply_snapshot(&WorldSnapshot::all_dead(6)).unwrap();
    assert!(mesh.colors().iter().all(|c| c.color == [1., 1., 1.]));
}

#[test]
fn test_single_cell_lands_in_its_block() {
    let size = 5;
    let mut cells = vec![vec![Cell::Dead; size]; size];
    cells[3][1] = Cell::Alive;
    let mut mesh = HexMesh::build(size).unwrap();
    mesh.apply_snapshot(&WorldSnapshot::new(cells)).unwrap();

    let block = mesh.cell_vertices(3, 1);
    assert_eq!(block, (3 * size + 1) * 12..(3 * size + 1) * 12 + 12);
    for (i, color) in mesh.colors().iter().enumerate() {
        let expected = if block.contains(&i) { ALIVE_COLOR } else { DEAD_COLOR };
        assert_eq!(color.color, expected);
    }
}

#[test]
fn test_ragged_snapshot_is_rejected() {
    let mut mesh = HexMesh::build(2).unwrap();
    let ragged = WorldSnapshot::new(vec![vec![Cell::Alive; 2], vec![Cell::Alive; 3]]);
    assert_eq!(
        mesh.apply_snapshot(&ragged),
        Err(SnapshotError::RowLength { row: 1, expected: 2, found: 3 })
    );
}

// ============================================================================
// Backend stream into the view
// ============================================================================

#[derive(Default)]
struct Recorder {
    mesh: Option<HexMesh>,
}

impl GridTarget for Recorder {
    fn has_grid(&self) -> bool {
        self.mesh.is_some()
    }

    fn set_grid(&mut self, grid_size: usize) -> Result<(), SceneError> {
        self.mesh = Some(HexMesh::build(grid_size)?);
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
        self.mesh.as_mut().map_or(Ok(()), |mesh| mesh.apply_snapshot(snapshot))
    }
}

#[test]
fn test_stream_with_update_before_width() {
    let stream = concat!(
        "{\"update-world\":{\"cells\":[[\"Dead\",\"Dead\"],[\"Dead\",\"Alive\"]]}}\n",
        "{\"get_world_width\":2}\n",
    );
    let (tx, rx) = mpsc::channel();
    pump(Cursor::new(stream), &tx).unwrap();

    let mut target = Recorder::default();
    let mut view = WorldView::new();
    for event in rx.try_iter() {
        handle_backend_event(&mut target, &mut view, event).unwrap();
    }

    let mesh = target.mesh.expect("grid built from width answer");
    assert!(mesh.colors()[36..48].iter().all(|c| c.color == ALIVE_COLOR));
    assert!(mesh.colors()[0..36].iter().all(|c| c.color == DEAD_COLOR));
}

#[test]
fn test_zero_width_never_builds_a_grid() {
    let mut target = Recorder::default();
    let mut view = WorldView::new();

    handle_backend_event(&mut target, &mut view, BackendEvent::WorldWidth(0)).unwrap();
    assert!(!target.has_grid());
    assert_eq!(view.width(), None);
}

// ============================================================================
// Camera
// ============================================================================

fn new_camera() -> OrthographicCamera {
    OrthographicCamera::new((0., 0., 1.), 5., 0.1, 2000.)
}

#[test]
fn test_zoom_sequence_keeps_frustum_positive() {
    let mut camera = new_camera();
    let mut controller = PanZoomController::new(1920, 1080, ZOOM_SPEED);

    let deltas = [120., -120., 3000., -950., -999.9, 1e9, -1e9, 0., 53.5];
    for delta in deltas {
        let before = (camera.frustum_width(), camera.frustum_height());
        let changed = controller.wheel(&mut camera, delta);
        assert!(camera.frustum_width() > 0. && camera.frustum_height() > 0.);
        if changed && delta > 0. {
            assert!(camera.frustum_width() > before.0 && camera.frustum_height() > before.1);
        }
        if changed && delta < 0. {
            assert!(camera.frustum_width() < before.0 && camera.frustum_height() < before.1);
        }
    }
}

#[test]
fn test_drag_moves_a_constant_screen_fraction() {
    let mut camera = new_camera();
    let mut controller = PanZoomController::new(200, 100, ZOOM_SPEED);
    controller.wheel(&mut camera, 500.);
    let width = camera.frustum_width();

    controller.pointer_down(Vector2::new(100., 50.));
    controller.pointer_move(&mut camera, Vector2::new(150., 50.));
    controller.pointer_move(&mut camera, Vector2::new(200., 50.));
    controller.pointer_up();

    // A drag across half the viewport slides the view by half the frustum.
    assert!((camera.position().x + width / 2.).abs() < 1e-4);
    assert!(camera.position().y.abs() < 1e-6);

    // Released pointers leave the camera alone.
    controller.pointer_move(&mut camera, Vector2::new(0., 0.));
    assert!((camera.position().x + width / 2.).abs() < 1e-4);
}
