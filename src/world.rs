use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, ViewError};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Dead,
    Alive,
}

/// One full grid of cell states, indexed `cells[x][y]`.
///
/// This is also the `update-world` payload: `{"cells": [["Alive", "Dead"], ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    cells: Vec<Vec<Cell>>,
}

impl WorldSnapshot {
    pub fn new(cells: Vec<Vec<Cell>>) -> Self {
        Self { cells }
    }

    pub fn all_dead(width: usize) -> Self {
        Self {
            cells: vec![vec![Cell::Dead; width]; width],
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.cells.get(x).and_then(|row| row.get(y)).copied()
    }

    /// Check that the snapshot is a `width` x `width` grid.
    pub fn validate(&self, width: usize) -> Result<(), SnapshotError> {
        if self.cells.len() != width {
            return Err(SnapshotError::RowCount {
                expected: width,
                found: self.cells.len(),
            });
        }
        for (row, cells) in self.cells.iter().enumerate() {
            if cells.len() != width {
                return Err(SnapshotError::RowLength {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }
        Ok(())
    }

    /// Cells in row-major order, `x` outer and `y` inner.
    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }

    pub fn alive_count(&self) -> usize {
        self.iter().filter(|cell| *cell == Cell::Alive).count()
    }
}

/// What the front-end knows about the world: the grid size once the backend
/// has answered, and at most one snapshot that arrived before that.
#[derive(Debug, Default)]
pub struct WorldView {
    width: Option<usize>,
    pending: Option<WorldSnapshot>,
}

impl WorldView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> Option<usize> {
        self.width
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the grid size reported by the backend.
    ///
    /// Returns the snapshot held back while the size was unknown, if any.
    /// Repeating the same width is a no-op.
    pub fn establish_width(&mut self, width: usize) -> Result<Option<WorldSnapshot>, ViewError> {
        if width == 0 {
            return Err(ViewError::ZeroWidth);
        }
        match self.width {
            Some(established) if established == width => Ok(None),
            Some(established) => Err(ViewError::WidthChanged {
                established,
                offered: width,
            }),
            None => {
                self.width = Some(width);
                Ok(self.pending.take())
            }
        }
    }

    /// Hand a snapshot through if the grid is sized, otherwise hold it,
    /// replacing any older held snapshot.
    pub fn offer(&mut self, snapshot: WorldSnapshot) -> Option<WorldSnapshot> {
        if self.width.is_some() {
            Some(snapshot)
        } else {
            self.pending = Some(snapshot);
            None
        }
    }
}
