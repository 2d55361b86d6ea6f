//! Map dimensions, glyph classes and bounds-checked access to map buffers
//!
//! A map buffer is a flat, row-major sequence of `height * width` glyphs with
//! no row separators. The game keeps several buffers of the same shape (the
//! original terrain, the live terrain and one remembered map per observer),
//! so the [`Grid`] only stores the dimensions and every accessor takes the
//! buffer to operate on.

use crate::error::MapError;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A flat row-major map buffer.
pub type MapBuffer = Vec<char>;

pub const ROOM: char = '.';
pub const TUNNEL: char = '#';
pub const WALL_VERTICAL: char = '|';
pub const WALL_HORIZONTAL: char = '-';
pub const WALL_CORNER: char = '+';
pub const BLANK: char = ' ';
pub const GOLD: char = '*';
pub const SELF_MARKER: char = '@';

/// Solid walls; players can never enter them.
pub fn is_wall(c: char) -> bool {
    matches!(c, WALL_VERTICAL | WALL_HORIZONTAL | WALL_CORNER)
}

/// Walls plus tunnels: the glyphs that block a line of sight passing
/// between two of them.
pub fn is_wall_family(c: char) -> bool {
    is_wall(c) || c == TUNNEL
}

/// Player icons are the uppercase letters `A` to `Z`.
pub fn is_player_icon(c: char) -> bool {
    c.is_ascii_uppercase()
}

/// Out-of-range coordinates passed to [`Grid::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("({x}, {y}) is outside the grid")]
pub struct OutOfBounds {
    pub x: i32,
    pub y: i32,
}

/// Immutable dimensions of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
}

impl Grid {
    /// Returns None unless both dimensions are positive.
    pub fn new(height: usize, width: usize) -> Option<Self> {
        if height == 0 || width == 0 {
            return None;
        }
        Some(Self { height, width })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of cells in a buffer of this shape.
    pub fn area(&self) -> usize {
        self.height * self.width
    }

    /// A buffer of this shape filled with `fill`.
    pub fn buffer(&self, fill: char) -> MapBuffer {
        vec![fill; self.area()]
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.contains(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Reads the glyph at `(x, y)` of `map`.
    pub fn get(&self, map: &[char], x: i32, y: i32) -> Result<char, OutOfBounds> {
        self.index(x, y)
            .map(|index| map[index])
            .ok_or(OutOfBounds { x, y })
    }

    /// Overwrites the glyph at `(x, y)` of `map`; false if out of bounds.
    pub fn put(&self, map: &mut [char], x: i32, y: i32, c: char) -> bool {
        match self.index(x, y) {
            Some(index) => {
                map[index] = c;
                true
            }
            None => false,
        }
    }

    /// Coordinates of the cell stored at `index`.
    pub fn position(&self, index: usize) -> (i32, i32) {
        ((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Every position of `map` holding `glyph`, in row-major order.
    pub fn positions_of(&self, map: &[char], glyph: char) -> Vec<(i32, i32)> {
        map.iter()
            .enumerate()
            .filter(|(_, c)| **c == glyph)
            .map(|(index, _)| self.position(index))
            .collect()
    }

    /// Renders `map` one row per line, each row terminated by a newline.
    pub fn render(&self, map: &[char]) -> String {
        let mut out = String::with_capacity(self.area() + self.height);
        for row in map.chunks(self.width) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

/// Map text parsed into its dimensions and original terrain.
#[derive(Debug, Clone)]
pub struct MapSource {
    pub grid: Grid,
    pub terrain: MapBuffer,
}

impl MapSource {
    /// Parses map text: each line is one row, the first line fixes the
    /// width and shorter rows are padded with blanks.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let rows: Vec<Vec<char>> = text.lines().map(|line| line.chars().collect()).collect();

        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        let grid = Grid::new(rows.len(), width).ok_or(MapError::Empty)?;

        let mut terrain = Vec::with_capacity(grid.area());
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() > width {
                return Err(MapError::RowTooWide {
                    row,
                    len: cells.len(),
                    width,
                });
            }
            let padding = width - cells.len();
            terrain.extend(cells);
            terrain.extend(std::iter::repeat(BLANK).take(padding));
        }

        Ok(Self { grid, terrain })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
