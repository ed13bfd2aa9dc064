pub mod hex;

use std::ops::Range;

use crate::error::{MeshError, SnapshotError};
use crate::hexgrid::hex::{Hex, VERTICES_PER_HEX};
use crate::vertex::{Vertex, VertexColor};
use crate::world::{Cell, WorldSnapshot};

pub const ALIVE_COLOR: [f32; 3] = [0.1, 0.1, 0.1];
pub const DEAD_COLOR: [f32; 3] = [1., 1., 1.];

impl Cell {
    pub fn color(self) -> VertexColor {
        match self {
            Cell::Alive => VertexColor { color: ALIVE_COLOR },
            Cell::Dead => VertexColor { color: DEAD_COLOR },
        }
    }
}

/// Draw calls count vertices in `u32`.
pub const MAX_VERTICES: usize = u32::MAX as usize;

/// Vertex cap for a position buffer no larger than `max_buffer_size` bytes.
pub fn max_vertices_for_buffer(max_buffer_size: u64) -> usize {
    let vertices = max_buffer_size / std::mem::size_of::<Vertex>() as u64;
    usize::try_from(vertices).map_or(MAX_VERTICES, |v| v.min(MAX_VERTICES))
}

/// Unindexed triangle mesh with one hexagon per grid cell.
///
/// Positions are fixed for the grid size. Colors are replaced wholesale on
/// every snapshot. Index `i` of both buffers is the same vertex: cell
/// `(x, y)` owns `[(x * size + y) * 12, +12)`.
#[derive(Debug, Clone)]
pub struct HexMesh {
    grid_size: usize,
    positions: Vec<Vertex>,
    colors: Vec<VertexColor>,
}

impl HexMesh {
    /// Build the mesh for a `grid_size` x `grid_size` world, all cells white.
    pub fn build(grid_size: usize) -> Result<Self, MeshError> {
        Self::build_within(grid_size, MAX_VERTICES)
    }

    /// Like [`HexMesh::build`], but refuses grids needing more than
    /// `max_vertices` vertices.
    pub fn build_within(grid_size: usize, max_vertices: usize) -> Result<Self, MeshError> {
        if grid_size == 0 {
            return Err(MeshError::EmptyGrid);
        }
        let max_vertices = max_vertices.min(MAX_VERTICES);
        let vertex_count = Self::vertex_count_for(grid_size)
            .filter(|count| *count <= max_vertices)
            .ok_or(MeshError::TooLarge {
                grid_size,
                max_vertices,
            })?;

        let mut positions = Vec::with_capacity(vertex_count);
        for x in 0..grid_size {
            for y in 0..grid_size {
                positions.extend(Hex::new(x, y).triangles().map(|p| Vertex {
                    position: p.into(),
                }));
            }
        }
        let colors = vec![Cell::Dead.color(); positions.len()];

        Ok(Self {
            grid_size,
            positions,
            colors,
        })
    }

    /// Vertices needed for a `grid_size` world, or `None` on overflow.
    pub fn vertex_count_for(grid_size: usize) -> Option<usize> {
        grid_size.checked_mul(grid_size)?.checked_mul(VERTICES_PER_HEX)
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vertex] {
        &self.positions
    }

    pub fn colors(&self) -> &[VertexColor] {
        &self.colors
    }

    /// Flat vertex indices owned by cell `(x, y)`.
    pub fn cell_vertices(&self, x: usize, y: usize) -> Range<usize> {
        let start = (x * self.grid_size + y) * VERTICES_PER_HEX;
        start..start + VERTICES_PER_HEX
    }

    /// Replace the color buffer from `snapshot`. Positions are untouched, and
    /// a snapshot of the wrong size leaves the current colors in place.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
        snapshot.validate(self.grid_size)?;

        let mut colors = Vec::with_capacity(self.positions.len());
        for cell in snapshot.iter() {
            colors.extend(std::iter::repeat(cell.color()).take(VERTICES_PER_HEX));
        }
        self.colors = colors;
        Ok(())
    }
}
