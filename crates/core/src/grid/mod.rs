use serde::{Deserialize, Serialize};

use crate::{LightsError, Result};

/// Width and height of the main pad grid.
pub const GRID_SIZE: i32 = 8;
/// Number of cells in the main grid.
pub const GRID_CELLS: usize = 64;
/// Main grid plus the control row (y = 8) and control column (x = 8).
pub const CELL_COUNT: usize = GRID_CELLS + 16;

/// Addressable cell. `(0, 0)` is the top-left pad; `y = 8` is the control row
/// and `x = 8` the control column. `(8, 8)` is not a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

/// Subset of cells rewritten during a bulk re-sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    All,
    Grid,
    ControlRow,
    ControlColumn,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Builds a main-grid position, rejecting anything outside 0..7.
    pub fn checked(x: i32, y: i32) -> Result<Self> {
        let pos = Self::new(x, y);
        if pos.is_main_grid() {
            Ok(pos)
        } else {
            Err(LightsError::InvalidCoordinate { x, y })
        }
    }

    pub fn is_main_grid(&self) -> bool {
        (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
    }

    pub fn is_control(&self) -> bool {
        (self.y == GRID_SIZE && (0..GRID_SIZE).contains(&self.x))
            || (self.x == GRID_SIZE && (0..GRID_SIZE).contains(&self.y))
    }

    pub fn is_valid(&self) -> bool {
        self.is_main_grid() || self.is_control()
    }

    /// Dense index into per-cell tables: grid cells first (row major), then
    /// the control row, then the control column.
    pub fn index(&self) -> Option<usize> {
        if self.is_main_grid() {
            Some((self.y * GRID_SIZE + self.x) as usize)
        } else if self.y == GRID_SIZE && (0..GRID_SIZE).contains(&self.x) {
            Some(GRID_CELLS + self.x as usize)
        } else if self.x == GRID_SIZE && (0..GRID_SIZE).contains(&self.y) {
            Some(GRID_CELLS + 8 + self.y as usize)
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            i if i < GRID_CELLS => Some(Self::new(i as i32 % GRID_SIZE, i as i32 / GRID_SIZE)),
            i if i < GRID_CELLS + 8 => Some(Self::new((i - GRID_CELLS) as i32, GRID_SIZE)),
            i if i < CELL_COUNT => Some(Self::new(GRID_SIZE, (i - GRID_CELLS - 8) as i32)),
            _ => None,
        }
    }

    pub fn in_region(&self, region: Region) -> bool {
        match region {
            Region::All => self.is_valid(),
            Region::Grid => self.is_main_grid(),
            Region::ControlRow => self.y == GRID_SIZE && (0..GRID_SIZE).contains(&self.x),
            Region::ControlColumn => self.x == GRID_SIZE && (0..GRID_SIZE).contains(&self.y),
        }
    }
}

/// Every main-grid cell in row-major order.
pub fn main_grid() -> impl Iterator<Item = GridPos> {
    (0..GRID_SIZE).flat_map(|y| (0..GRID_SIZE).map(move |x| GridPos::new(x, y)))
}

/// Every addressable cell in index order.
pub fn all_cells() -> impl Iterator<Item = GridPos> {
    (0..CELL_COUNT).filter_map(GridPos::from_index)
}
