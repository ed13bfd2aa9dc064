use std::f32::consts::FRAC_PI_3;

use cgmath::*;

pub const CORNERS_PER_HEX: usize = 6;
pub const VERTICES_PER_HEX: usize = 12;

/// Corner indices of the four triangles that cover one hexagon.
pub const FAN: [[usize; 3]; 4] = [[0, 1, 5], [1, 2, 5], [2, 4, 5], [2, 3, 4]];

/// A cell of the square world grid, addressed the same way as the snapshot.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Hash)]
pub struct Hex {
    pub x: usize,
    pub y: usize,
}

impl Hex {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Center of the hexagon. Stepping `y` shifts the cell half a column to
    /// the right and up a half row, which packs unit hexagons edge to edge.
    pub fn center(&self) -> Point3<f32> {
        let x = self.x as f32;
        let y = self.y as f32;
        Point3 {
            x: (3. * x) + (1.5 * y),
            y: (f32::sqrt(3.) / 2.) * y,
            z: 0.,
        }
    }

    /// Unit side vector turned `corner` sixths of a turn about -Z.
    fn corner_offset(corner: usize) -> Vector3<f32> {
        let rotation = Basis3::from_axis_angle(-Vector3::unit_z(), Rad(FRAC_PI_3 * corner as f32));
        rotation.rotate_vector(Vector3::unit_x())
    }

    pub fn polygon_corners(&self) -> [Point3<f32>; CORNERS_PER_HEX] {
        let center = self.center();
        core::array::from_fn(|i| center + Self::corner_offset(i))
    }

    /// The twelve unindexed triangle vertices of this hexagon, in [`FAN`] order.
    pub fn triangles(&self) -> [Point3<f32>; VERTICES_PER_HEX] {
        let corners = self.polygon_corners();
        core::array::from_fn(|i| corners[FAN[i / 3][i % 3]])
    }
}
