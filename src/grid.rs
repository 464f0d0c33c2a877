use std::fmt;

use thiserror::Error;

/// A 0-indexed grid position, `x` fastest-varying.
///
/// Signed so that callers can freely form neighbour candidates; the grid
/// rejects anything outside `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Coordinate { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One grid cell's classification. Box occupancy is folded into the enum:
/// `Box` and `BoxOnTarget` are the only values that carry a box entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    Empty,
    Floor,
    Wall,
    Box,
    Target,
    BoxOnTarget,
}

impl TileType {
    /// Whether a box entity currently occupies this cell.
    pub fn has_box(self) -> bool {
        matches!(self, TileType::Box | TileType::BoxOnTarget)
    }

    /// The tile left behind when a box leaves this cell.
    pub(crate) fn without_box(self) -> TileType {
        match self {
            TileType::Box => TileType::Floor,
            TileType::BoxOnTarget => TileType::Target,
            other => other,
        }
    }

    /// The tile produced by a box arriving on this cell, or `None` when the
    /// cell cannot legally receive one.
    pub(crate) fn with_box(self) -> Option<TileType> {
        match self {
            TileType::Floor => Some(TileType::Box),
            TileType::Target => Some(TileType::BoxOnTarget),
            _ => None,
        }
    }
}

/// Error for grid accesses outside `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("position {position} is outside the {width}x{height} grid")]
pub struct OutOfBounds {
    pub position: Coordinate,
    pub width: i32,
    pub height: i32,
}

/// Row-major storage of one [`TileType`] per cell.
///
/// Owned by a level; reads are public, writes go through the owning level
/// only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        TileGrid {
            width,
            height,
            tiles: vec![TileType::Empty; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, position: Coordinate) -> Result<usize, OutOfBounds> {
        if position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
        {
            Ok((position.y * self.width + position.x) as usize)
        } else {
            Err(OutOfBounds {
                position,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn get(&self, position: Coordinate) -> Result<TileType, OutOfBounds> {
        Ok(self.tiles[self.index(position)?])
    }

    pub(crate) fn set(&mut self, position: Coordinate, tile: TileType) -> Result<(), OutOfBounds> {
        let index = self.index(position)?;
        self.tiles[index] = tile;
        Ok(())
    }

    /// Iterate all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coordinate, TileType)> + '_ {
        self.tiles.iter().enumerate().map(|(index, &tile)| {
            let index = index as i32;
            (Coordinate::new(index % self.width, index / self.width), tile)
        })
    }
}
