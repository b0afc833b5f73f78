//! Single-occupancy coordinate index.
//!
//! The board maps each cell to at most one [`EntityRef`]. It is the source of
//! truth for bounds and collision checks. All writes go through
//! [`Board::place`], [`Board::clear`] and [`Board::relocate`], which refuse
//! to overwrite an occupied cell, so the table can never hold two entities in
//! one slot.

use serde::{Deserialize, Serialize};

use crate::entities::EntityRef;
use crate::error::{GameError, Result};
use crate::grid::Position;

/// Grid of optional entity references, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    width: u32,
    height: u32,
    cells: Vec<Option<EntityRef>>,
}

impl Board {
    /// Create an empty board.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a position lies on the board.
    #[must_use]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Occupant of a cell, `None` if empty or off the board.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<EntityRef> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    /// True if the cell is on the board and holds nothing.
    #[must_use]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.index(pos).is_some_and(|i| self.cells[i].is_none())
    }

    /// Put an entity on an empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] or [`GameError::CellOccupied`].
    pub fn place(&mut self, pos: Position, entity: EntityRef) -> Result<()> {
        let index = self.index(pos).ok_or(GameError::OutOfBounds(pos))?;
        if self.cells[index].is_some() {
            return Err(GameError::CellOccupied(pos));
        }
        self.cells[index] = Some(entity);
        Ok(())
    }

    /// Empty a cell, returning what was there.
    pub fn clear(&mut self, pos: Position) -> Option<EntityRef> {
        let index = self.index(pos)?;
        self.cells[index].take()
    }

    /// Move the occupant of `from` to the empty cell `to`.
    ///
    /// Leaves the board untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is empty, or `to` is off the board or
    /// occupied.
    pub fn relocate(&mut self, from: Position, to: Position) -> Result<EntityRef> {
        let to_index = self.index(to).ok_or(GameError::OutOfBounds(to))?;
        if self.cells[to_index].is_some() {
            return Err(GameError::CellOccupied(to));
        }
        let entity = self
            .clear(from)
            .ok_or_else(|| GameError::InvalidState(format!("No entity to relocate at {from}")))?;
        self.cells[to_index] = Some(entity);
        Ok(entity)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Every occupied cell with its occupant, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (Position, EntityRef)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|entity| (Position::new((i % width) as i32, (i / width) as i32), entity))
        })
    }

    /// Copy the board out as rows (`rows[y][x]`).
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Option<EntityRef>>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height as usize];
        }
        self.cells
            .chunks(self.width as usize)
            .map(<[Option<EntityRef>]>::to_vec)
            .collect()
    }
}
