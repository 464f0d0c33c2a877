use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::boxes::{BoxId, BoxRegistry, MAX_BOXES};
use crate::grid::{Coordinate, OutOfBounds, TileGrid, TileType};

/// Largest accepted level side length.
const MAX_SIZE: i32 = 256;

/// Errors produced while parsing level text.
///
/// Each of these rejects the level as a whole; no partially-built level is
/// ever returned.
#[derive(Debug, Error)]
pub enum ParseError {
    /// First line was not two positive integers.
    #[error("level header must be `<width> <height>`, got {0:?}")]
    MalformedHeader(String),
    /// Both sides must exceed 3 for a level to be playable.
    #[error("level is too small: {width}x{height}")]
    TooSmall { width: i32, height: i32 },
    /// Side length exceeds the maximum size.
    #[error("level size {width}x{height} exceeds maximum size {max}", max = MAX_SIZE)]
    TooLarge { width: i32, height: i32 },
    /// A character outside the documented set.
    #[error("unknown character {character:?} at {position}")]
    UnknownCharacter {
        character: char,
        position: Coordinate,
    },
    /// More than one `@`/`+` cell.
    #[error("multiple starting positions: {first} and {second}")]
    MultipleStartPositions { first: Coordinate, second: Coordinate },
    /// No `@`/`+` cell at all.
    #[error("level has no starting position")]
    MissingStartPosition,
    /// Unsolvable by construction: every box needs its own target.
    #[error("level has {boxes} boxes, but {targets} targets")]
    BoxTargetMismatch { boxes: usize, targets: usize },
    /// More boxes than the registry can hold.
    #[error("level has more than {limit} boxes")]
    TooManyBoxes { limit: usize },
    /// Row or column data beyond the size declared in the header.
    #[error("level body exceeds its declared size: {0}")]
    OutOfBounds(#[from] OutOfBounds),
}

/// Errors produced by [`Level::move_box`] for destinations the engine
/// refuses to place a box on.
///
/// The *source* cell not holding a box is a caller bug, not a user-input
/// error, and panics instead; see [`Level::move_box`].
#[derive(Debug, Error)]
pub enum MoveError {
    /// Boxes may only arrive on `Floor` or `Target` cells.
    #[error("cannot move box to {position}: destination is {tile:?}")]
    IllegalDestination {
        position: Coordinate,
        tile: TileType,
    },
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

/// Parse the `<width> <height>` size header line.
pub(crate) fn parse_header(line: &str) -> Result<(i32, i32), ParseError> {
    let mut parts = line.split_whitespace();
    let width = parts.next().and_then(|part| part.parse().ok());
    let height = parts.next().and_then(|part| part.parse().ok());
    match (width, height, parts.next()) {
        (Some(width), Some(height), None) if width > 0 && height > 0 => Ok((width, height)),
        _ => Err(ParseError::MalformedHeader(line.to_string())),
    }
}

struct ParsedLevel {
    starting_position: Coordinate,
    tiles: TileGrid,
    box_positions: Vec<Coordinate>,
}

/// Parse level text into tiles plus metadata.
///
/// Pure function of the text; knows nothing about where the text came from.
fn parse(text: &str) -> Result<ParsedLevel, ParseError> {
    let (header, body) = match text.split_once('\n') {
        Some((header, body)) => (header, body),
        None => (text, ""),
    };
    let (width, height) = parse_header(header)?;
    if width <= 3 || height <= 3 {
        return Err(ParseError::TooSmall { width, height });
    }
    if width > MAX_SIZE || height > MAX_SIZE {
        return Err(ParseError::TooLarge { width, height });
    }

    let mut tiles = TileGrid::new(width, height);
    let mut starting_position = None;
    let mut box_positions = Vec::new();
    let mut target_count = 0usize;

    for (y, line) in body.lines().enumerate() {
        for (x, character) in line.chars().enumerate() {
            let position = Coordinate::new(x as i32, y as i32);

            // The starting position is an annotation recorded independently
            // of the tile assigned underneath it.
            if character == '@' || character == '+' {
                if let Some(first) = starting_position {
                    return Err(ParseError::MultipleStartPositions {
                        first,
                        second: position,
                    });
                }
                starting_position = Some(position);
            }

            let tile = match character {
                ' ' => TileType::Empty,
                '#' => TileType::Wall,
                '@' | '_' => TileType::Floor,
                '$' => TileType::Box,
                '+' | '.' => TileType::Target,
                '*' => TileType::BoxOnTarget,
                character => {
                    return Err(ParseError::UnknownCharacter {
                        character,
                        position,
                    });
                }
            };

            if tile.has_box() {
                box_positions.push(position);
            }
            if tile == TileType::Target || tile == TileType::BoxOnTarget {
                target_count += 1;
            }

            // Rows beyond the declared height, or cells beyond the declared
            // width, fail here rather than silently wrapping.
            tiles.set(position, tile)?;
        }
    }

    let starting_position = starting_position.ok_or(ParseError::MissingStartPosition)?;

    if box_positions.len() != target_count {
        return Err(ParseError::BoxTargetMismatch {
            boxes: box_positions.len(),
            targets: target_count,
        });
    }

    Ok(ParsedLevel {
        starting_position,
        tiles,
        box_positions,
    })
}

/// A validated level: tile grid, box registry and metadata.
///
/// Construction is all-or-nothing, and every mutation preserves the
/// grid/registry 1:1 invariant: each `Box`/`BoxOnTarget` cell corresponds
/// to exactly one registry entry and vice versa.
#[derive(Debug, Clone)]
pub struct Level {
    grid: TileGrid,
    boxes: BoxRegistry,
    starting_position: Coordinate,
    uncovered_targets: usize,
    moves: u32,
}

impl Level {
    /// Parse a level from text format.
    ///
    /// The first line is a `<width> <height>` size header; the remaining
    /// lines encode rows top-to-bottom:
    /// - ` ` = empty (also the default for short or missing rows)
    /// - `#` = wall
    /// - `_` = floor
    /// - `@` = starting position, on floor
    /// - `$` = box
    /// - `.` = target
    /// - `+` = starting position, on target
    /// - `*` = box on target
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        let parsed = parse(text)?;

        let mut boxes = BoxRegistry::new();
        for &position in &parsed.box_positions {
            if boxes.add(position).is_none() {
                return Err(ParseError::TooManyBoxes { limit: MAX_BOXES });
            }
        }

        let uncovered_targets = parsed
            .tiles
            .cells()
            .filter(|&(_, tile)| tile == TileType::Target)
            .count();

        let level = Level {
            grid: parsed.tiles,
            boxes,
            starting_position: parsed.starting_position,
            uncovered_targets,
            moves: 0,
        };
        debug_assert!(level.is_consistent());
        debug!(
            width = level.grid.width(),
            height = level.grid.height(),
            boxes = level.boxes.len(),
            "level loaded"
        );
        Ok(level)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.grid.width(), self.grid.height())
    }

    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    pub fn starting_position(&self) -> Coordinate {
        self.starting_position
    }

    /// Tile at `position`.
    pub fn value(&self, position: Coordinate) -> Result<TileType, OutOfBounds> {
        self.grid.get(position)
    }

    /// The box registry: boxes in parse order, with stable identities.
    pub fn boxes(&self) -> &BoxRegistry {
        &self.boxes
    }

    /// Read-only view of the tile grid.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Identity of the box at `position`, if any.
    pub fn box_at(&self, position: Coordinate) -> Option<BoxId> {
        self.boxes.find_at(position).map(|entity| entity.id())
    }

    /// Number of targets not yet covered by a box.
    pub fn remaining_targets(&self) -> usize {
        self.uncovered_targets
    }

    /// Successful moves applied so far.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Whether every box sits on a target.
    pub fn is_solved(&self) -> bool {
        self.uncovered_targets == 0
    }

    /// Move the box at `from` to `to`.
    ///
    /// The cell at `from` must currently hold a box; calling this with
    /// anything else is a caller bug and panics (in all builds). The
    /// destination is validated here: a box may only arrive on `Floor`
    /// (becoming `Box`) or `Target` (becoming `BoxOnTarget`); any other
    /// destination is rejected with [`MoveError::IllegalDestination`] and
    /// the level is left untouched.
    pub fn move_box(&mut self, from: Coordinate, to: Coordinate) -> Result<(), MoveError> {
        let source = self.grid.get(from)?;
        assert!(source.has_box(), "no box at {} to move", from);

        let destination = self.grid.get(to)?;
        let Some(occupied) = destination.with_box() else {
            warn!(%from, %to, tile = ?destination, "rejected box move");
            return Err(MoveError::IllegalDestination {
                position: to,
                tile: destination,
            });
        };

        // Both coordinates were just read, so neither write can fail.
        self.grid.set(from, source.without_box())?;
        self.grid.set(to, occupied)?;

        if self.boxes.relocate(from, to).is_none() {
            unreachable!("grid and box registry out of sync at {}", from);
        }

        if source == TileType::BoxOnTarget {
            self.uncovered_targets += 1;
        }
        if destination == TileType::Target {
            self.uncovered_targets -= 1;
        }
        self.moves += 1;

        debug_assert!(self.is_consistent());
        debug!(%from, %to, moves = self.moves, "box moved");
        Ok(())
    }

    /// Check the grid/registry 1:1 invariant.
    fn is_consistent(&self) -> bool {
        let box_cells = self.grid.cells().filter(|&(_, tile)| tile.has_box());
        let mut cell_count = 0;
        for (position, _) in box_cells {
            if self.boxes.find_at(position).is_none() {
                return false;
            }
            cell_count += 1;
        }
        cell_count == self.boxes.len()
            && self.boxes.iter().all(|entity| {
                self.grid
                    .get(entity.position())
                    .is_ok_and(|tile| tile.has_box())
            })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.grid.width(), self.grid.height())?;
        for y in 0..self.grid.height() {
            let mut line = String::new();
            for x in 0..self.grid.width() {
                let position = Coordinate::new(x, y);
                let tile = self.grid.get(position).map_err(|_| fmt::Error)?;

                let character = if position == self.starting_position && !tile.has_box() {
                    match tile {
                        TileType::Target => '+',
                        _ => '@',
                    }
                } else {
                    match tile {
                        TileType::Empty => ' ',
                        TileType::Floor => '_',
                        TileType::Wall => '#',
                        TileType::Box => '$',
                        TileType::Target => '.',
                        TileType::BoxOnTarget => '*',
                    }
                };
                line.push(character);
            }
            // Trim trailing spaces to match short-row input format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
