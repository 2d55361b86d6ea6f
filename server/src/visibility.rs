//! Line-of-sight computation over the character grid
//!
//! Every observer keeps a remembered map. Each time the world changes the
//! remembered map is refreshed from the observer's position:
//!
//! - In a room, or on a tunnel cell touching a room (an entrance), every
//!   cell with an unobstructed line of sight shows its live glyph. Gold and
//!   players that drop out of sight fade back to bare terrain, while terrain
//!   stays remembered.
//! - Deeper in a tunnel only the eight neighbouring cells are revealed and
//!   any remembered actor is reset to bare terrain.
//!
//! Sight lines are walked over the original terrain one column (or row) at a
//! time. Positions along the line are kept as exact fractions so a line
//! that lands on a cell centre is never confused with one passing between
//! two cells.

use crate::grid::{is_player_icon, is_wall_family, Grid, BLANK, GOLD, ROOM, SELF_MARKER, TUNNEL};

/// Refreshes `observer` for someone standing at `(ox, oy)`.
///
/// `original` is the unmodified terrain, `live` the current terrain with
/// players and gold on it. The observer's own cell always ends up as `@`.
pub fn recompute_visibility(
    grid: &Grid,
    original: &[char],
    live: &[char],
    observer: &mut [char],
    ox: i32,
    oy: i32,
) {
    let on_tunnel = grid.get(original, ox, oy) == Ok(TUNNEL);

    if !on_tunnel || reveal_neighbours(grid, original, observer, ox, oy) {
        reveal_open_area(grid, original, live, observer, ox, oy);
    } else {
        resync_to_terrain(original, observer);
    }

    grid.put(observer, ox, oy, SELF_MARKER);
}

/// Copies the original terrain of the eight cells around `(ox, oy)` into
/// the observer map. Returns true when one of them is a room cell.
fn reveal_neighbours(
    grid: &Grid,
    original: &[char],
    observer: &mut [char],
    ox: i32,
    oy: i32,
) -> bool {
    let mut entrance = false;

    for y in oy - 1..=oy + 1 {
        for x in ox - 1..=ox + 1 {
            if x == ox && y == oy {
                continue;
            }
            if let Ok(c) = grid.get(original, x, y) {
                grid.put(observer, x, y, c);
                if c == ROOM {
                    entrance = true;
                }
            }
        }
    }

    entrance
}

fn reveal_open_area(
    grid: &Grid,
    original: &[char],
    live: &[char],
    observer: &mut [char],
    ox: i32,
    oy: i32,
) {
    for index in 0..grid.area() {
        let (x, y) = grid.position(index);
        let remembered = observer[index];

        if is_visible(grid, original, ox, oy, x, y) {
            observer[index] = live[index];
        } else if remembered == GOLD || is_player_icon(remembered) {
            observer[index] = original[index];
        }
    }
}

fn resync_to_terrain(original: &[char], observer: &mut [char]) {
    for (seen, &terrain) in observer.iter_mut().zip(original) {
        if *seen != BLANK && *seen != terrain {
            *seen = terrain;
        }
    }
}

/// Whether `(x, y)` can be seen from `(ox, oy)` across the original terrain.
pub fn is_visible(grid: &Grid, original: &[char], ox: i32, oy: i32, x: i32, y: i32) -> bool {
    if x == ox && y == oy {
        return true;
    }

    let terrain = |x: i32, y: i32| grid.get(original, x, y).unwrap_or(BLANK);

    if terrain(x, y) == BLANK {
        return false;
    }

    let dx = ox - x;
    let dy = oy - y;

    if dx == 0 {
        let step = dy.signum();
        let mut row = y + step;
        while row != oy {
            if terrain(x, row) != ROOM {
                return false;
            }
            row += step;
        }
        return true;
    }

    if dy.abs() < dx.abs() {
        // shallow: step through columns, the row advances by a fraction
        (1..dx.abs()).all(|k| {
            let column = x + k * dx.signum();
            match Crossing::at(y, k * dy, dx.abs()) {
                Crossing::On(row) => terrain(column, row) == ROOM,
                Crossing::Between(above, below) => {
                    see_through(terrain(column, above), terrain(column, below))
                }
            }
        })
    } else {
        // steep: step through rows; grazing past an occupant is allowed
        (1..dy.abs()).all(|k| {
            let row = y + k * dy.signum();
            match Crossing::at(x, k * dx, dy.abs()) {
                Crossing::On(column) => {
                    let c = terrain(column, row);
                    c == ROOM || c == GOLD || is_player_icon(c)
                }
                Crossing::Between(left, right) => {
                    see_through(terrain(left, row), terrain(right, row))
                }
            }
        })
    }
}

/// Where a sight line crosses one grid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crossing {
    On(i32),
    Between(i32, i32),
}

impl Crossing {
    /// The crossing at `start + travelled / steps`, with `steps > 0`.
    fn at(start: i32, travelled: i32, steps: i32) -> Self {
        let numerator = start * steps + travelled;
        let whole = numerator.div_euclid(steps);
        if numerator.rem_euclid(steps) == 0 {
            Crossing::On(whole)
        } else {
            Crossing::Between(whole, whole + 1)
        }
    }
}

/// A sight line may pass between two cells unless either is unmapped or
/// both are walls or tunnel.
fn see_through(a: char, b: char) -> bool {
    if a == BLANK || b == BLANK {
        return false;
    }
    !(is_wall_family(a) && is_wall_family(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MapSource;

    const PILLAR_ROOM: &str = "\
+-------+
|.......|
|...+...|
|.......|
+-------+";

    const TUNNEL_MAP: &str = concat!(
        "+---+     \n",
        "|...|     \n",
        "|...######\n",
        "|...|    #\n",
        "+---+    #\n",
    );

    const WALL_PAIR_ROOM: &str = "\
+-----+
|.....|
|.||..|
|.....|
|.....|
+-----+";

    fn load(text: &str) -> MapSource {
        MapSource::parse(text).unwrap()
    }

    fn cell(source: &MapSource, map: &[char], x: i32, y: i32) -> char {
        source.grid.get(map, x, y).unwrap()
    }

    #[test]
    fn test_crossing_positions() {
        assert_eq!(Crossing::at(3, -2, 6), Crossing::Between(2, 3));
        assert_eq!(Crossing::at(3, -6, 6), Crossing::On(2));
        assert_eq!(Crossing::at(0, 3, 3), Crossing::On(1));
        assert_eq!(Crossing::at(1, 1, 3), Crossing::Between(1, 2));
    }

    #[test]
    fn test_see_through_pairs() {
        assert!(see_through('.', '|'));
        assert!(see_through('.', '.'));
        assert!(see_through('*', '#'));
        assert!(!see_through('|', '-'));
        assert!(!see_through('#', '+'));
        assert!(!see_through(' ', '.'));
        assert!(!see_through('.', ' '));
    }

    #[test]
    fn test_visibility_is_reflexive() {
        let source = load(PILLAR_ROOM);
        assert!(is_visible(&source.grid, &source.terrain, 2, 2, 2, 2));
    }

    #[test]
    fn test_blank_cells_are_never_visible() {
        let source = load(TUNNEL_MAP);
        assert!(!is_visible(&source.grid, &source.terrain, 2, 2, 6, 0));
    }

    #[test]
    fn test_pillar_blocks_row_and_diagonal() {
        let source = load(PILLAR_ROOM);
        let grid = &source.grid;
        let terrain = &source.terrain;

        // straight along the row through the pillar
        assert!(is_visible(grid, terrain, 1, 2, 3, 2));
        assert!(is_visible(grid, terrain, 1, 2, 4, 2));
        assert!(!is_visible(grid, terrain, 1, 2, 5, 2));
        assert!(!is_visible(grid, terrain, 1, 2, 7, 2));

        // shallow diagonal landing exactly on the pillar
        assert!(!is_visible(grid, terrain, 1, 1, 7, 3));
        // shallow diagonal passing above it
        assert!(is_visible(grid, terrain, 1, 1, 7, 1));
    }

    #[test]
    fn test_column_walk_requires_room_between() {
        let source = load(PILLAR_ROOM);
        let grid = &source.grid;
        let terrain = &source.terrain;

        assert!(is_visible(grid, terrain, 4, 1, 4, 2));
        assert!(!is_visible(grid, terrain, 4, 1, 4, 3));
        assert!(is_visible(grid, terrain, 2, 1, 2, 4));
    }

    #[test]
    fn test_open_area_copies_live_glyphs() {
        let source = load(PILLAR_ROOM);
        let grid = &source.grid;
        let mut live = source.terrain.clone();
        grid.put(&mut live, 3, 3, 'B');
        grid.put(&mut live, 7, 1, GOLD);

        let mut observer = grid.buffer(BLANK);
        recompute_visibility(grid, &source.terrain, &live, &mut observer, 1, 1);

        assert_eq!(cell(&source, &observer, 1, 1), SELF_MARKER);
        assert_eq!(cell(&source, &observer, 3, 3), 'B');
        assert_eq!(cell(&source, &observer, 7, 1), GOLD);
        assert_eq!(cell(&source, &observer, 0, 0), '+');
        // hidden behind the pillar
        assert_eq!(cell(&source, &observer, 7, 3), BLANK);
    }

    #[test]
    fn test_out_of_sight_actors_fade_but_terrain_persists() {
        let source = load(PILLAR_ROOM);
        let grid = &source.grid;
        let live = source.terrain.clone();

        let mut observer = grid.buffer(BLANK);
        grid.put(&mut observer, 7, 2, GOLD);
        grid.put(&mut observer, 6, 2, 'C');
        grid.put(&mut observer, 5, 2, ROOM);

        recompute_visibility(grid, &source.terrain, &live, &mut observer, 1, 2);

        assert_eq!(cell(&source, &observer, 7, 2), ROOM);
        assert_eq!(cell(&source, &observer, 6, 2), ROOM);
        assert_eq!(cell(&source, &observer, 5, 2), ROOM);
        assert_eq!(cell(&source, &observer, 1, 2), SELF_MARKER);
    }

    #[test]
    fn test_tunnel_mode_reveals_only_neighbours() {
        let source = load(TUNNEL_MAP);
        let grid = &source.grid;
        let live = source.terrain.clone();

        let mut observer = grid.buffer(BLANK);
        recompute_visibility(grid, &source.terrain, &live, &mut observer, 7, 2);

        for index in 0..grid.area() {
            let (x, y) = grid.position(index);
            if (x - 7).abs() > 1 || (y - 2).abs() > 1 {
                assert_eq!(observer[index], BLANK, "({}, {}) was revealed", x, y);
            }
        }
        assert_eq!(cell(&source, &observer, 6, 2), TUNNEL);
        assert_eq!(cell(&source, &observer, 8, 2), TUNNEL);
        assert_eq!(cell(&source, &observer, 7, 2), SELF_MARKER);
    }

    #[test]
    fn test_tunnel_mode_resyncs_remembered_actors() {
        let source = load(TUNNEL_MAP);
        let grid = &source.grid;
        let live = source.terrain.clone();

        let mut observer = source.terrain.clone();
        grid.put(&mut observer, 2, 2, 'B');
        grid.put(&mut observer, 1, 1, GOLD);
        grid.put(&mut observer, 6, 0, BLANK);

        recompute_visibility(grid, &source.terrain, &live, &mut observer, 9, 4);

        assert_eq!(cell(&source, &observer, 2, 2), ROOM);
        assert_eq!(cell(&source, &observer, 1, 1), ROOM);
        assert_eq!(cell(&source, &observer, 9, 4), SELF_MARKER);
        // previously seen terrain is kept
        assert_eq!(cell(&source, &observer, 0, 0), '+');
    }

    #[test]
    fn test_tunnel_entrance_uses_open_area() {
        let source = load(TUNNEL_MAP);
        let grid = &source.grid;
        let mut live = source.terrain.clone();
        grid.put(&mut live, 1, 1, 'B');

        let mut observer = grid.buffer(BLANK);
        recompute_visibility(grid, &source.terrain, &live, &mut observer, 4, 2);

        assert_eq!(cell(&source, &observer, 4, 2), SELF_MARKER);
        assert_eq!(cell(&source, &observer, 1, 1), 'B');
        assert_eq!(cell(&source, &observer, 2, 3), ROOM);
        assert_eq!(cell(&source, &observer, 5, 2), TUNNEL);
    }

    #[test]
    fn test_steep_line_between_two_walls_is_blocked() {
        let source = load(WALL_PAIR_ROOM);
        let grid = &source.grid;
        let terrain = &source.terrain;

        // crosses row 2 between (2, 2) and (3, 2)
        assert!(!is_visible(grid, terrain, 2, 4, 3, 1));
        // crosses row 2 between the wall at (3, 2) and the room at (4, 2)
        assert!(is_visible(grid, terrain, 3, 4, 4, 1));
    }

    #[test]
    fn test_steep_line_landing_on_an_occupant() {
        let source = load(WALL_PAIR_ROOM);
        let grid = &source.grid;

        // from (5, 4) to (3, 0) the line lands on (4, 2)
        assert!(is_visible(grid, &source.terrain, 5, 4, 3, 0));

        let mut occupied = source.terrain.clone();
        grid.put(&mut occupied, 4, 2, 'B');
        assert!(is_visible(grid, &occupied, 5, 4, 3, 0));
        grid.put(&mut occupied, 4, 2, GOLD);
        assert!(is_visible(grid, &occupied, 5, 4, 3, 0));
        grid.put(&mut occupied, 4, 2, '|');
        assert!(!is_visible(grid, &occupied, 5, 4, 3, 0));
    }

    #[test]
    fn test_steep_lines_in_open_area() {
        let source = load(WALL_PAIR_ROOM);
        let grid = &source.grid;
        let mut live = source.terrain.clone();
        grid.put(&mut live, 1, 1, 'B');
        grid.put(&mut live, 4, 1, GOLD);
        grid.put(&mut live, 3, 1, GOLD);

        let mut observer = grid.buffer(BLANK);
        recompute_visibility(grid, &source.terrain, &live, &mut observer, 2, 4);

        assert_eq!(cell(&source, &observer, 1, 1), 'B');
        assert_eq!(cell(&source, &observer, 4, 1), GOLD);
        // behind the pair of walls
        assert_eq!(cell(&source, &observer, 3, 1), BLANK);
        assert_eq!(cell(&source, &observer, 2, 4), SELF_MARKER);
    }
}
