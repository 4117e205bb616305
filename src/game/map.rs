//! Tile Grid
//!
//! The level is a fixed `width × height` matrix of map tiles. Each tile has a
//! set of doors; two neighbouring tiles are connected when both have a door
//! facing the other. The shift mechanic rotates one row or column by one
//! slot: the tile pushed off the far edge re-enters at the vacated edge with
//! a freshly supplied door set.

use std::collections::{BTreeSet, VecDeque};
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;

/// Seconds a tile stays highlighted after it was moved by a shift.
pub const SHIFT_HIGHLIGHT_SECONDS: f32 = 1.5;

// =============================================================================
// DIRECTIONS & DOORS
// =============================================================================

/// Grid direction, used both for door sides and for shift directions.
///
/// Row indices grow downward, so `Down` means "toward higher row index".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Toward row 0
    Up = 0,
    /// Toward the last column
    Right = 1,
    /// Toward the last row
    Down = 2,
    /// Toward column 0
    Left = 3,
}

impl Direction {
    /// All directions, clockwise from `Up`.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Column/row step for this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// True for `Up` and `Down`, the directions that move a column.
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    #[inline]
    fn door_bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of door sides, packed as bits (clockwise from `Up`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoorDirections(u8);

/// Door string contained something other than `U`, `R`, `D`, `L`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid door character {0:?} (expected U, R, D or L)")]
pub struct DoorParseError(pub char);

impl DoorDirections {
    /// No doors
    pub const NONE: Self = Self(0);

    /// Doors on every side
    pub const ALL: Self = Self(0b1111);

    /// Create from raw bits; bits above the low four are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Create from a list of sides.
    pub fn from_directions(dirs: &[Direction]) -> Self {
        dirs.iter().fold(Self::NONE, |acc, d| acc.with(*d))
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Check for a door on `dir`.
    #[inline]
    pub fn has(self, dir: Direction) -> bool {
        self.0 & dir.door_bit() != 0
    }

    /// Copy with a door added on `dir`.
    pub fn with(self, dir: Direction) -> Self {
        Self(self.0 | dir.door_bit())
    }

    /// Number of doors.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Sides with a door, clockwise from `Up`.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.has(*d))
    }

    /// Rotate every door a quarter turn clockwise.
    pub fn rotated_cw(self) -> Self {
        Self(((self.0 << 1) | (self.0 >> 3)) & 0b1111)
    }

    /// Draw a random, non-empty door set.
    pub fn random(rng: &mut DeterministicRng) -> Self {
        Self(1 + rng.next_int(15) as u8)
    }

    /// Shape of a tile with these doors and how many clockwise quarter turns
    /// take the shape's base layout to this one.
    pub fn shape(self) -> (TileShape, u8) {
        let shape = match self.count() {
            0 => TileShape::Closed,
            1 => TileShape::DeadEnd,
            2 if self.0 == 0b0101 || self.0 == 0b1010 => TileShape::Straight,
            2 => TileShape::Corner,
            3 => TileShape::Tee,
            _ => TileShape::Cross,
        };

        let mut candidate = shape.base_doors();
        for quarter_turns in 0..4u8 {
            if candidate == self {
                return (shape, quarter_turns);
            }
            candidate = candidate.rotated_cw();
        }
        (shape, 0)
    }
}

impl TryFrom<String> for DoorDirections {
    type Error = DoorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for DoorDirections {
    type Err = DoorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut doors = Self::NONE;
        for c in s.chars() {
            let dir = match c.to_ascii_uppercase() {
                'U' | 'N' => Direction::Up,
                'R' | 'E' => Direction::Right,
                'D' | 'S' => Direction::Down,
                'L' | 'W' => Direction::Left,
                '-' | ' ' => continue,
                other => return Err(DoorParseError(other)),
            };
            doors = doors.with(dir);
        }
        Ok(doors)
    }
}

impl From<DoorDirections> for String {
    fn from(doors: DoorDirections) -> Self {
        doors.to_string()
    }
}

impl fmt::Display for DoorDirections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("-");
        }
        for dir in self.iter() {
            let c = match dir {
                Direction::Up => 'U',
                Direction::Right => 'R',
                Direction::Down => 'D',
                Direction::Left => 'L',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DoorDirections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Doors({})", self)
    }
}

/// Visual tile shape, picked from the door count and layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileShape {
    /// No doors
    Closed,
    /// One door (base: up)
    DeadEnd,
    /// Two opposite doors (base: up + down)
    Straight,
    /// Two adjacent doors (base: up + right)
    Corner,
    /// Three doors (base: up + right + down)
    Tee,
    /// Four doors
    Cross,
}

impl TileShape {
    fn base_doors(self) -> DoorDirections {
        match self {
            TileShape::Closed => DoorDirections::NONE,
            TileShape::DeadEnd => DoorDirections::from_bits(0b0001),
            TileShape::Straight => DoorDirections::from_bits(0b0101),
            TileShape::Corner => DoorDirections::from_bits(0b0011),
            TileShape::Tee => DoorDirections::from_bits(0b0111),
            TileShape::Cross => DoorDirections::ALL,
        }
    }
}

// =============================================================================
// TILES
// =============================================================================

/// Grid slot, `(col, row)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Column index
    pub col: usize,
    /// Row index
    pub row: usize,
}

impl Slot {
    /// Create a slot.
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Stable tile identity; survives shifts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// One tile of the level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapTile {
    /// Stable identity
    pub id: TileId,
    /// Door sides
    pub doors: DoorDirections,
    /// Slot currently occupied
    pub slot: Slot,
    /// Remaining post-shift highlight time (seconds)
    pub highlight: f32,
}

impl MapTile {
    /// Shape of this tile.
    pub fn shape(&self) -> TileShape {
        self.doors.shape().0
    }

    /// Rotation of the shape texture in radians (clockwise quarter turns).
    pub fn rotation(&self) -> f32 {
        self.doors.shape().1 as f32 * FRAC_PI_2
    }
}

// =============================================================================
// SHIFT REQUESTS
// =============================================================================

/// A row or column of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridLine {
    /// Row by index
    Row(usize),
    /// Column by index
    Column(usize),
}

impl GridLine {
    /// Index of the line.
    pub fn index(self) -> usize {
        match self {
            GridLine::Row(i) | GridLine::Column(i) => i,
        }
    }
}

/// A request to move one line by one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftRequest {
    /// Line to move
    pub line: GridLine,
    /// Travel direction of the tiles
    pub direction: Direction,
}

impl ShiftRequest {
    /// Request addressed by index, with the line axis implied by the
    /// direction: `Up`/`Down` move column `index`, `Left`/`Right` row `index`.
    pub fn new(index: usize, direction: Direction) -> Self {
        let line = if direction.is_vertical() {
            GridLine::Column(index)
        } else {
            GridLine::Row(index)
        };
        Self { line, direction }
    }
}

/// What a successful shift did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftOutcome {
    /// The applied request
    pub request: ShiftRequest,
    /// Tile that wrapped around to the vacated edge
    pub reentered: TileId,
    /// Slot it re-entered at
    pub reentry_slot: Slot,
    /// Its doors before the shift
    pub previous_doors: DoorDirections,
    /// Its doors after the shift
    pub new_doors: DoorDirections,
}

/// Rejected shift request. The grid is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    /// Line index outside the grid
    #[error("{line:?} is outside the grid (limit {limit})")]
    LineOutOfRange {
        /// Requested line
        line: GridLine,
        /// Number of lines of that kind
        limit: usize,
    },

    /// Rows move left/right, columns move up/down
    #[error("{line:?} cannot move {direction:?}")]
    DirectionAlongWrongAxis {
        /// Requested line
        line: GridLine,
        /// Requested direction
        direction: Direction,
    },
}

/// Grid construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or height is zero, or the tile count overflows
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// Door list does not cover the grid exactly
    #[error("expected {expected} door entries, got {actual}")]
    DoorCountMismatch {
        /// `width * height`
        expected: usize,
        /// Supplied entries
        actual: usize,
    },
}

// =============================================================================
// TILE GRID
// =============================================================================

/// The level's tile matrix. Owns every tile; exactly one tile per slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    /// Row-major by slot
    tiles: Vec<MapTile>,
    /// World-space side length of one tile
    tile_side_length: f32,
    /// Number of shifts applied so far
    shift_count: u64,
}

impl TileGrid {
    /// Build a grid from row-major door sets.
    pub fn new(
        width: usize,
        height: usize,
        doors: &[DoorDirections],
        tile_side_length: f32,
    ) -> Result<Self, GridError> {
        let expected = match width.checked_mul(height) {
            Some(count) if count > 0 => count,
            _ => return Err(GridError::InvalidDimensions { width, height }),
        };
        if doors.len() != expected {
            return Err(GridError::DoorCountMismatch {
                expected,
                actual: doors.len(),
            });
        }

        let tiles = doors
            .iter()
            .enumerate()
            .map(|(i, d)| MapTile {
                id: TileId(i as u32),
                doors: *d,
                slot: Slot::new(i % width, i / width),
                highlight: 0.0,
            })
            .collect();

        Ok(Self {
            width,
            height,
            tiles,
            tile_side_length,
            shift_count: 0,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// World-space side length of a tile.
    pub fn tile_side_length(&self) -> f32 {
        self.tile_side_length
    }

    /// Shifts applied since the level started.
    pub fn shift_count(&self) -> u64 {
        self.shift_count
    }

    /// All tiles, row-major by slot.
    pub fn tiles(&self) -> &[MapTile] {
        &self.tiles
    }

    /// Tile at `slot`.
    pub fn tile(&self, slot: Slot) -> Option<&MapTile> {
        self.index_of(slot).map(|i| &self.tiles[i])
    }

    /// Slot currently holding the tile `id`.
    pub fn slot_of(&self, id: TileId) -> Option<Slot> {
        self.tiles.iter().find(|t| t.id == id).map(|t| t.slot)
    }

    fn index_of(&self, slot: Slot) -> Option<usize> {
        (slot.col < self.width && slot.row < self.height).then(|| slot.row * self.width + slot.col)
    }

    /// Validate a request without applying it.
    pub fn validate(&self, request: ShiftRequest) -> Result<(), ShiftError> {
        let (limit, vertical) = match request.line {
            GridLine::Row(_) => (self.height, false),
            GridLine::Column(_) => (self.width, true),
        };
        if request.line.index() >= limit {
            return Err(ShiftError::LineOutOfRange { line: request.line, limit });
        }
        if request.direction.is_vertical() != vertical {
            return Err(ShiftError::DirectionAlongWrongAxis {
                line: request.line,
                direction: request.direction,
            });
        }
        Ok(())
    }

    /// Shift by index; the axis follows from the direction.
    pub fn shift_tiles(
        &mut self,
        index: usize,
        direction: Direction,
        incoming: DoorDirections,
    ) -> Result<ShiftOutcome, ShiftError> {
        self.shift(ShiftRequest::new(index, direction), incoming)
    }

    /// Move every tile of the line one slot in the request's direction.
    ///
    /// The tile pushed off the edge re-enters at the opposite end carrying
    /// `incoming`; every other tile keeps its doors. The whole line is
    /// reassigned before returning.
    pub fn shift(
        &mut self,
        request: ShiftRequest,
        incoming: DoorDirections,
    ) -> Result<ShiftOutcome, ShiftError> {
        self.validate(request)?;

        let slots: Vec<Slot> = match request.line {
            GridLine::Row(row) => (0..self.width).map(|col| Slot::new(col, row)).collect(),
            GridLine::Column(col) => (0..self.height).map(|row| Slot::new(col, row)).collect(),
        };
        let indices: Vec<usize> = slots.iter().filter_map(|s| self.index_of(*s)).collect();
        let mut line: Vec<MapTile> = indices.iter().map(|i| self.tiles[*i].clone()).collect();

        // Down/Right push toward the end of the line, Up/Left toward the start
        let reentry = match request.direction {
            Direction::Down | Direction::Right => {
                line.rotate_right(1);
                0
            }
            Direction::Up | Direction::Left => {
                line.rotate_left(1);
                line.len() - 1
            }
        };

        let previous_doors = line[reentry].doors;
        line[reentry].doors = incoming;
        let reentered = line[reentry].id;

        for ((tile, slot), index) in line.into_iter().zip(&slots).zip(&indices) {
            self.tiles[*index] = MapTile {
                slot: *slot,
                highlight: SHIFT_HIGHLIGHT_SECONDS,
                ..tile
            };
        }
        self.shift_count += 1;

        debug!(
            "Shifted {:?} {:?}: tile {} re-entered at ({}, {}) with {}",
            request.line, request.direction, reentered.0, slots[reentry].col, slots[reentry].row, incoming
        );

        Ok(ShiftOutcome {
            request,
            reentered,
            reentry_slot: slots[reentry],
            previous_doors,
            new_doors: incoming,
        })
    }

    /// Per-frame map update: fade post-shift highlights.
    pub fn update(&mut self, dt: f32) {
        for tile in &mut self.tiles {
            tile.highlight = (tile.highlight - dt).max(0.0);
        }
    }

    // -------------------------------------------------------------------------
    // Connectivity
    // -------------------------------------------------------------------------

    /// Neighbouring slot in `dir` (no wrap-around).
    pub fn neighbor(&self, slot: Slot, dir: Direction) -> Option<Slot> {
        let (dc, dr) = dir.offset();
        let col = slot.col.checked_add_signed(dc as isize)?;
        let row = slot.row.checked_add_signed(dr as isize)?;
        (col < self.width && row < self.height).then_some(Slot::new(col, row))
    }

    /// True when the tiles at `slot` and its `dir` neighbour face each other
    /// with doors.
    pub fn is_open(&self, slot: Slot, dir: Direction) -> bool {
        let (Some(here), Some(there)) = (
            self.tile(slot),
            self.neighbor(slot, dir).and_then(|n| self.tile(n)),
        ) else {
            return false;
        };
        here.doors.has(dir) && there.doors.has(dir.opposite())
    }

    /// Slots reachable from `start` through open doors (including `start`).
    pub fn reachable_from(&self, start: Slot) -> BTreeSet<Slot> {
        let mut seen = BTreeSet::new();
        if self.index_of(start).is_none() {
            return seen;
        }

        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(slot) = queue.pop_front() {
            for dir in Direction::ALL {
                if !self.is_open(slot, dir) {
                    continue;
                }
                if let Some(next) = self.neighbor(slot, dir) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    /// True when a path of open doors joins `a` and `b`.
    pub fn connected(&self, a: Slot, b: Slot) -> bool {
        self.reachable_from(a).contains(&b)
    }

    // -------------------------------------------------------------------------
    // World-space translation
    // -------------------------------------------------------------------------

    /// World-space bounds `(min, max)` covered by the grid.
    pub fn world_bounds(&self) -> (Vec2, Vec2) {
        (
            Vec2::ZERO,
            Vec2::new(
                self.width as f32 * self.tile_side_length,
                self.height as f32 * self.tile_side_length,
            ),
        )
    }

    /// World-space centre of `slot`.
    pub fn slot_center(&self, slot: Slot) -> Vec2 {
        Vec2::new(
            (slot.col as f32 + 0.5) * self.tile_side_length,
            (slot.row as f32 + 0.5) * self.tile_side_length,
        )
    }

    /// Slot containing a world-space position.
    pub fn slot_at(&self, position: Vec2) -> Option<Slot> {
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let col = (position.x / self.tile_side_length) as usize;
        let row = (position.y / self.tile_side_length) as usize;
        (col < self.width && row < self.height).then_some(Slot::new(col, row))
    }

    /// Hash the grid layout.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.width as u32);
        hasher.update_u32(self.height as u32);
        for tile in &self.tiles {
            hasher.update_u32(tile.id.0);
            hasher.update_u8(tile.doors.bits());
        }
        hasher.update_u64(self.shift_count);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid_4x4() -> TileGrid {
        let doors: Vec<DoorDirections> = (0..16u8).map(|i| DoorDirections::from_bits(i % 15 + 1)).collect();
        TileGrid::new(4, 4, &doors, 10.0).unwrap()
    }

    fn ids_by_slot(grid: &TileGrid) -> Vec<u32> {
        grid.tiles().iter().map(|t| t.id.0).collect()
    }

    fn assert_slots_consistent(grid: &TileGrid) {
        for (i, tile) in grid.tiles().iter().enumerate() {
            assert_eq!(tile.slot, Slot::new(i % grid.width(), i / grid.width()));
        }
        let unique: BTreeSet<_> = grid.tiles().iter().map(|t| t.id).collect();
        assert_eq!(unique.len(), grid.width() * grid.height());
    }

    #[test]
    fn test_door_parse_and_display() {
        let doors: DoorDirections = "UD".parse().unwrap();
        assert!(doors.has(Direction::Up));
        assert!(doors.has(Direction::Down));
        assert!(!doors.has(Direction::Left));
        assert_eq!(doors.to_string(), "UD");
        assert_eq!("nesw".parse::<DoorDirections>().unwrap(), DoorDirections::ALL);
        assert_eq!("".parse::<DoorDirections>().unwrap(), DoorDirections::NONE);
        assert_eq!("UX".parse::<DoorDirections>(), Err(DoorParseError('X')));
    }

    #[test]
    fn test_door_shapes() {
        assert_eq!(DoorDirections::NONE.shape(), (TileShape::Closed, 0));
        assert_eq!(DoorDirections::ALL.shape().0, TileShape::Cross);
        assert_eq!("U".parse::<DoorDirections>().unwrap().shape(), (TileShape::DeadEnd, 0));
        assert_eq!("L".parse::<DoorDirections>().unwrap().shape(), (TileShape::DeadEnd, 3));
        assert_eq!("RL".parse::<DoorDirections>().unwrap().shape(), (TileShape::Straight, 1));
        assert_eq!("RD".parse::<DoorDirections>().unwrap().shape(), (TileShape::Corner, 1));
        assert_eq!("URL".parse::<DoorDirections>().unwrap().shape(), (TileShape::Tee, 3));
    }

    #[test]
    fn test_random_doors_non_empty() {
        let mut rng = DeterministicRng::new(5);
        for _ in 0..200 {
            let doors = DoorDirections::random(&mut rng);
            assert!(doors.count() >= 1);
            assert!(doors.bits() <= 0b1111);
        }
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(
            TileGrid::new(0, 3, &[], 1.0).unwrap_err(),
            GridError::InvalidDimensions { width: 0, height: 3 }
        );
        assert_eq!(
            TileGrid::new(2, 2, &[DoorDirections::ALL; 3], 1.0).unwrap_err(),
            GridError::DoorCountMismatch { expected: 4, actual: 3 }
        );
    }

    #[test]
    fn test_shift_column_down_wraps_bottom_tile() {
        let mut grid = grid_4x4();
        let bottom = grid.tile(Slot::new(1, 3)).unwrap().id;
        let top = grid.tile(Slot::new(1, 0)).unwrap().clone();

        let outcome = grid
            .shift_tiles(1, Direction::Down, DoorDirections::NONE)
            .unwrap();

        assert_eq!(outcome.reentered, bottom);
        assert_eq!(outcome.reentry_slot, Slot::new(1, 0));
        assert_eq!(grid.tile(Slot::new(1, 0)).unwrap().id, bottom);
        assert_eq!(grid.tile(Slot::new(1, 0)).unwrap().doors, DoorDirections::NONE);
        // The old top tile moved down one and kept its doors
        let moved = grid.tile(Slot::new(1, 1)).unwrap();
        assert_eq!(moved.id, top.id);
        assert_eq!(moved.doors, top.doors);
        assert_slots_consistent(&grid);
    }

    #[test]
    fn test_shift_row_left_wraps_first_tile() {
        let mut grid = grid_4x4();
        let first = grid.tile(Slot::new(0, 2)).unwrap().id;

        let outcome = grid.shift_tiles(2, Direction::Left, DoorDirections::ALL).unwrap();

        assert_eq!(outcome.reentered, first);
        assert_eq!(outcome.reentry_slot, Slot::new(3, 2));
        assert_eq!(grid.slot_of(first), Some(Slot::new(3, 2)));
        // Other rows untouched
        assert_eq!(grid.tile(Slot::new(0, 1)).unwrap().id, TileId(4));
        assert_slots_consistent(&grid);
    }

    #[test]
    fn test_invalid_requests_do_not_mutate() {
        let mut grid = grid_4x4();
        let before = ids_by_slot(&grid);

        let err = grid.shift_tiles(4, Direction::Right, DoorDirections::ALL).unwrap_err();
        assert_eq!(err, ShiftError::LineOutOfRange { line: GridLine::Row(4), limit: 4 });

        let wrong_axis = ShiftRequest { line: GridLine::Row(1), direction: Direction::Up };
        let err = grid.shift(wrong_axis, DoorDirections::ALL).unwrap_err();
        assert!(matches!(err, ShiftError::DirectionAlongWrongAxis { .. }));

        assert_eq!(ids_by_slot(&grid), before);
        assert_eq!(grid.shift_count(), 0);
    }

    #[test]
    fn test_rectangular_grid_shift() {
        let doors = vec![DoorDirections::ALL; 6];
        let mut grid = TileGrid::new(3, 2, &doors, 1.0).unwrap();
        // Columns are 2 long, rows 3 long
        assert!(grid.shift_tiles(2, Direction::Up, DoorDirections::NONE).is_ok());
        assert!(grid.shift_tiles(1, Direction::Right, DoorDirections::NONE).is_ok());
        assert!(grid.shift_tiles(2, Direction::Right, DoorDirections::NONE).is_err());
        assert!(grid.shift_tiles(3, Direction::Down, DoorDirections::NONE).is_err());
        assert_slots_consistent(&grid);
    }

    #[test]
    fn test_connectivity() {
        // Row 0: U-shaped corridor   [RD][RL][LD]
        // Row 1:                      [U ][- ][U ]
        let doors: Vec<DoorDirections> = ["RD", "RL", "LD", "U", "", "U"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let mut grid = TileGrid::new(3, 2, &doors, 1.0).unwrap();

        assert!(grid.is_open(Slot::new(0, 0), Direction::Right));
        assert!(grid.is_open(Slot::new(0, 0), Direction::Down));
        assert!(!grid.is_open(Slot::new(0, 0), Direction::Up));
        assert!(grid.connected(Slot::new(0, 1), Slot::new(2, 1)));
        assert!(!grid.connected(Slot::new(0, 0), Slot::new(1, 1)));

        // Closing the middle of the top row cuts the path
        grid.shift_tiles(1, Direction::Down, DoorDirections::NONE).unwrap();
        assert!(!grid.connected(Slot::new(0, 1), Slot::new(2, 1)));
    }

    #[test]
    fn test_world_translation() {
        let grid = grid_4x4();
        assert_eq!(grid.slot_center(Slot::new(0, 0)), Vec2::new(5.0, 5.0));
        assert_eq!(grid.slot_at(Vec2::new(35.0, 12.0)), Some(Slot::new(3, 1)));
        assert_eq!(grid.slot_at(Vec2::new(40.0, 12.0)), None);
        assert_eq!(grid.slot_at(Vec2::new(-0.1, 12.0)), None);
        assert_eq!(grid.world_bounds().1, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_highlight_fades() {
        let mut grid = grid_4x4();
        grid.shift_tiles(0, Direction::Right, DoorDirections::ALL).unwrap();
        assert_eq!(grid.tile(Slot::new(2, 0)).unwrap().highlight, SHIFT_HIGHLIGHT_SECONDS);
        assert_eq!(grid.tile(Slot::new(2, 1)).unwrap().highlight, 0.0);
        grid.update(10.0);
        assert_eq!(grid.tile(Slot::new(2, 0)).unwrap().highlight, 0.0);
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_shift_keeps_one_tile_per_slot_and_changes_one_door_set(
            index in 0usize..4,
            direction in direction_strategy(),
        ) {
            let mut grid = grid_4x4();
            let before: Vec<(TileId, DoorDirections)> =
                grid.tiles().iter().map(|t| (t.id, t.doors)).collect();

            // Bits 0 never occur in grid_4x4, so the incoming set always differs
            let outcome = grid.shift_tiles(index, direction, DoorDirections::NONE).unwrap();

            prop_assert_eq!(grid.tiles().len(), 16);
            assert_slots_consistent(&grid);

            let changed: Vec<TileId> = before
                .iter()
                .filter(|(id, doors)| {
                    let slot = grid.slot_of(*id).unwrap();
                    grid.tile(slot).unwrap().doors != *doors
                })
                .map(|(id, _)| *id)
                .collect();
            prop_assert_eq!(changed, vec![outcome.reentered]);
        }

        #[test]
        fn prop_shift_then_opposite_restores_positions(
            index in 0usize..4,
            direction in direction_strategy(),
            bits in 0u8..16,
        ) {
            let mut grid = grid_4x4();
            let before = ids_by_slot(&grid);

            grid.shift_tiles(index, direction, DoorDirections::from_bits(bits)).unwrap();
            grid.shift_tiles(index, direction.opposite(), DoorDirections::from_bits(bits)).unwrap();

            prop_assert_eq!(ids_by_slot(&grid), before);
        }
    }
}
