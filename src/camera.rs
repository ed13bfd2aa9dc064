use cgmath::*;
use log::debug;
use winit::dpi::PhysicalPosition;
use winit::event::*;

/// Frustum growth per unit of wheel delta.
pub const ZOOM_SPEED: f32 = 0.001;
/// Wheel delta reported for one notch of a line-based wheel.
pub const PIXELS_PER_LINE: f32 = 100.;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
	1.0, 0.0, 0.0, 0.0,
	0.0, 1.0, 0.0, 0.0,
	0.0, 0.0, 0.5, 0.0,
	0.0, 0.0, 0.5, 1.0,
);

/// Orthographic camera with screen-style bounds: `top` is above `bottom` on
/// screen but numerically smaller, so world +Y points down the window.
#[derive(Debug)]
pub struct OrthographicCamera {
	position: Point3<f32>,
	left: f32,
	right: f32,
	top: f32,
	bottom: f32,
	znear: f32,
	zfar: f32,
	dirty: bool,
}

impl OrthographicCamera {
	/// Square frustum reaching `radius` from the center in every direction.
	pub fn new<V: Into<Point3<f32>>>(position: V, radius: f32, znear: f32, zfar: f32) -> Self {
		Self {
			position: position.into(),
			left: -radius,
			right: radius,
			top: -radius,
			bottom: radius,
			znear,
			zfar,
			dirty: true,
		}
	}

	pub fn position(&self) -> Point3<f32> {
		self.position
	}

	pub fn left(&self) -> f32 {
		self.left
	}

	pub fn right(&self) -> f32 {
		self.right
	}

	pub fn top(&self) -> f32 {
		self.top
	}

	pub fn bottom(&self) -> f32 {
		self.bottom
	}

	pub fn frustum_width(&self) -> f32 {
		self.right - self.left
	}

	pub fn frustum_height(&self) -> f32 {
		self.bottom - self.top
	}

	pub fn translate(&mut self, offset: Vector3<f32>) {
		self.position += offset;
		self.dirty = true;
	}

	/// Multiply the frustum extent by `factor`, keeping it centered on zero.
	///
	/// Returns `false` and leaves the frustum alone if the result would not
	/// be a normal positive size.
	pub fn scale_frustum(&mut self, factor: f32) -> bool {
		let width = self.frustum_width() * factor;
		let height = self.frustum_height() * factor;
		if !(width.is_normal() && height.is_normal() && width > 0. && height > 0.) {
			return false;
		}

		self.left = -width / 2.;
		self.right = width / 2.;
		self.top = -height / 2.;
		self.bottom = height / 2.;
		self.dirty = true;
		true
	}

	/// Whether the view-projection changed since the last call.
	pub fn take_dirty(&mut self) -> bool {
		std::mem::take(&mut self.dirty)
	}

	pub fn calc_matrix(&self) -> Matrix4<f32> {
		let proj = ortho(
			self.left,
			self.right,
			self.bottom,
			self.top,
			self.znear,
			self.zfar,
		);
		let view = Matrix4::look_to_rh(self.position, -Vector3::unit_z(), Vector3::unit_y());

		OPENGL_TO_WGPU_MATRIX * proj * view
	}
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
	view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
	pub fn new() -> Self {
		Self {
			view_proj: Matrix4::identity().into(),
		}
	}

	pub fn update_view_proj(&mut self, camera: &OrthographicCamera) {
		self.view_proj = camera.calc_matrix().into();
	}
}

impl Default for CameraUniform {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
	#[default]
	Idle,
	Dragging { last: Vector2<f32> },
}

/// Pans the camera with a left-button drag and zooms it with the wheel.
#[derive(Debug)]
pub struct PanZoomController {
	drag: DragState,
	cursor: Option<Vector2<f32>>,
	viewport: Vector2<f32>,
	zoom_speed: f32,
}

impl PanZoomController {
	pub fn new(viewport_width: u32, viewport_height: u32, zoom_speed: f32) -> Self {
		Self {
			drag: DragState::Idle,
			cursor: None,
			viewport: Vector2::new(viewport_width.max(1) as f32, viewport_height.max(1) as f32),
			zoom_speed,
		}
	}

	pub fn drag_state(&self) -> DragState {
		self.drag
	}

	pub fn resize(&mut self, new_width: u32, new_height: u32) {
		if new_width > 0 && new_height > 0 {
			self.viewport = Vector2::new(new_width as f32, new_height as f32);
		}
	}

	pub fn pointer_down(&mut self, position: Vector2<f32>) {
		self.cursor = Some(position);
		self.drag = DragState::Dragging { last: position };
	}

	pub fn pointer_up(&mut self) {
		self.drag = DragState::Idle;
	}

	/// Pan so the drag covers the same fraction of the frustum as it does of
	/// the viewport. Returns whether the camera moved.
	pub fn pointer_move(&mut self, camera: &mut OrthographicCamera, position: Vector2<f32>) -> bool {
		self.cursor = Some(position);
		let DragState::Dragging { last } = self.drag else {
			return false;
		};

		let delta = position - last;
		camera.translate(Vector3::new(
			-delta.x * camera.frustum_width() / self.viewport.x,
			-delta.y * camera.frustum_height() / self.viewport.y,
			0.,
		));
		self.drag = DragState::Dragging { last: position };
		true
	}

	/// Positive `delta_y` (scrolling down) zooms out.
	pub fn wheel(&mut self, camera: &mut OrthographicCamera, delta_y: f32) -> bool {
		let factor = 1. + delta_y * self.zoom_speed;
		if factor <= 0. || !camera.scale_frustum(factor) {
			debug!("ignoring zoom factor {factor} at frustum {}x{}", camera.frustum_width(), camera.frustum_height());
			return false;
		}
		true
	}

	/// Feed a window event through; returns `true` when the event was used.
	pub fn process_event(&mut self, camera: &mut OrthographicCamera, event: &WindowEvent) -> bool {
		match event {
			WindowEvent::CursorMoved { position, .. } => {
				self.pointer_move(camera, Vector2::new(position.x as f32, position.y as f32))
			}
			WindowEvent::MouseInput {
				state: ElementState::Pressed,
				button: MouseButton::Left,
				..
			} => match self.cursor {
				Some(cursor) => {
					self.pointer_down(cursor);
					true
				}
				None => false,
			},
			WindowEvent::MouseInput {
				state: ElementState::Released,
				button: MouseButton::Left,
				..
			} => {
				self.pointer_up();
				true
			}
			WindowEvent::CursorLeft { .. } => {
				self.pointer_up();
				self.cursor = None;
				false
			}
			WindowEvent::MouseWheel { delta, .. } => {
				self.wheel(camera, wheel_delta_y(delta));
				true
			}
			_ => false,
		}
	}
}

/// Wheel delta in browser convention: pixels, positive when scrolling down.
pub fn wheel_delta_y(delta: &MouseScrollDelta) -> f32 {
	match delta {
		MouseScrollDelta::LineDelta(_, lines) => -lines * PIXELS_PER_LINE,
		MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => -*y as f32,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn camera() -> OrthographicCamera {
		OrthographicCamera::new((0., 0., 1.), 5., 0.1, 2000.)
	}

	fn close(a: f32, b: f32) -> bool {
		(a - b).abs() < 1e-4
	}

	#[test]
	fn new_camera_has_square_screen_style_frustum() {
		let camera = camera();
		assert_eq!((camera.left(), camera.right()), (-5., 5.));
		assert_eq!((camera.top(), camera.bottom()), (-5., 5.));
		assert_eq!(camera.frustum_width(), 10.);
		assert_eq!(camera.frustum_height(), 10.);
	}

	#[test]
	fn projection_puts_top_at_screen_top() {
		let camera = camera();
		let m = camera.calc_matrix();

		let top = m * Vector4::new(0., -5., 0., 1.);
		let right = m * Vector4::new(5., 0., 0., 1.);
		assert!(close(top.y / top.w, 1.));
		assert!(close(right.x / right.w, 1.));
		assert!((0. ..=1.).contains(&(top.z / top.w)));
	}

	#[test]
	fn grid_plane_lands_inside_clip_depth() {
		let mut camera = camera();
		camera.translate(Vector3::new(3., -2., 0.));
		assert!(camera.scale_frustum(4.));
		let m = camera.calc_matrix();

		for point in [
			Vector4::new(3., -2., 0., 1.),
			Vector4::new(-16., 17., 0., 1.),
			Vector4::new(22., -21., 0., 1.),
		] {
			let clip = m * point;
			assert!(close(clip.w, 1.), "w = {}", clip.w);
			assert!((0. ..=1.).contains(&clip.z), "z = {}", clip.z);
			assert!(clip.x.abs() <= 1. && clip.y.abs() <= 1.);
		}

		// Frustum center maps to the middle of the screen.
		let center = m * Vector4::new(3., -2., 0., 1.);
		assert!(close(center.x, 0.) && close(center.y, 0.));
	}

	#[test]
	fn wheel_down_zooms_out_and_up_zooms_in() {
		let mut camera = camera();
		let mut controller = PanZoomController::new(800, 600, ZOOM_SPEED);

		assert!(controller.wheel(&mut camera, 100.));
		assert!(camera.frustum_width() > 10.);
		assert!(camera.frustum_height() > 10.);
		assert!(close(camera.frustum_width(), 11.));

		let before = camera.frustum_width();
		assert!(controller.wheel(&mut camera, -100.));
		assert!(camera.frustum_width() < before);
		assert!(close(camera.left(), -camera.right()));
		assert!(close(camera.top(), -camera.bottom()));
	}

	#[test]
	fn frustum_stays_positive_under_extreme_zoom() {
		let mut camera = camera();
		let mut controller = PanZoomController::new(800, 600, ZOOM_SPEED);

		assert!(!controller.wheel(&mut camera, -1000.));
		assert!(!controller.wheel(&mut camera, -5000.));
		assert_eq!(camera.frustum_width(), 10.);

		for _ in 0..10_000 {
			controller.wheel(&mut camera, -999.);
			assert!(camera.frustum_width() > 0. && camera.frustum_height() > 0.);
		}
		for _ in 0..10_000 {
			controller.wheel(&mut camera, 1_000_000.);
			assert!(camera.frustum_width().is_finite() && camera.frustum_height() > 0.);
		}
	}

	#[test]
	fn drag_state_machine() {
		let mut camera = camera();
		let mut controller = PanZoomController::new(100, 100, ZOOM_SPEED);
		assert_eq!(controller.drag_state(), DragState::Idle);

		// Moving without a press never pans.
		assert!(!controller.pointer_move(&mut camera, Vector2::new(50., 50.)));
		assert_eq!(camera.position(), Point3::new(0., 0., 1.));

		controller.pointer_down(Vector2::new(10., 10.));
		assert_eq!(
			controller.drag_state(),
			DragState::Dragging { last: Vector2::new(10., 10.) }
		);

		assert!(controller.pointer_move(&mut camera, Vector2::new(20., 30.)));
		assert_eq!(
			controller.drag_state(),
			DragState::Dragging { last: Vector2::new(20., 30.) }
		);

		controller.pointer_up();
		assert_eq!(controller.drag_state(), DragState::Idle);
	}

	#[test]
	fn drag_pans_against_pointer_scaled_by_frustum() {
		let mut camera = camera();
		let mut controller = PanZoomController::new(100, 200, ZOOM_SPEED);

		controller.pointer_down(Vector2::new(0., 0.));
		controller.pointer_move(&mut camera, Vector2::new(10., 20.));
		// 10 of 100 px across a 10 wide frustum, 20 of 200 px down a 10 high one.
		assert!(close(camera.position().x, -1.));
		assert!(close(camera.position().y, -1.));
		assert_eq!(camera.position().z, 1.);
	}

	#[test]
	fn pan_distance_tracks_zoom_level() {
		let mut near = camera();
		let mut far = camera();
		let mut controller = PanZoomController::new(100, 100, ZOOM_SPEED);
		assert!(far.scale_frustum(2.));

		for camera in [&mut near, &mut far] {
			controller.pointer_down(Vector2::new(0., 0.));
			controller.pointer_move(camera, Vector2::new(10., 0.));
			controller.pointer_up();
		}

		// A zoomed-out view covers twice the world per pixel.
		assert!(close(far.position().x, 2. * near.position().x));
	}

	#[test]
	fn camera_changes_mark_it_dirty() {
		let mut camera = camera();
		assert!(camera.take_dirty());
		assert!(!camera.take_dirty());

		camera.translate(Vector3::new(1., 0., 0.));
		assert!(camera.take_dirty());

		assert!(camera.scale_frustum(0.5));
		assert!(camera.take_dirty());

		assert!(!camera.scale_frustum(0.));
		assert!(!camera.take_dirty());
	}

	#[test]
	fn zero_viewport_resize_is_ignored() {
		let mut camera = camera();
		let mut controller = PanZoomController::new(100, 100, ZOOM_SPEED);
		controller.resize(0, 0);

		controller.pointer_down(Vector2::new(0., 0.));
		controller.pointer_move(&mut camera, Vector2::new(10., 0.));
		assert!(close(camera.position().x, -1.));
	}

	#[test]
	fn wheel_deltas_use_browser_convention() {
		assert_eq!(wheel_delta_y(&MouseScrollDelta::LineDelta(0., 1.)), -100.);
		assert_eq!(wheel_delta_y(&MouseScrollDelta::LineDelta(0., -2.)), 200.);
		assert_eq!(
			wheel_delta_y(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(0., -35.))),
			35.
		);
	}
}
