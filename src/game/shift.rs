//! Shift Interface
//!
//! The overlay where the player rearranges the level. The grid is drawn in
//! the middle of the screen region with a ring of buttons one tile beyond
//! each edge:
//!
//! ```text
//!        v  v  v  v          top of column i    -> Down
//!     >  .  .  .  .  <       left of row j      -> Right
//!     >  .  .  .  .  <       right of row j     -> Left
//!     >  .  .  .  .  <       bottom of column i -> Up
//!     >  .  .  .  .  <
//!        ^  ^  ^  ^
//! ```
//!
//! Each button pushes its line away from itself. At most one button is
//! armed; confirming issues exactly one shift request and closes the overlay.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::input::{InputFrame, KeyInput};
use crate::game::map::{Direction, DoorDirections, ShiftOutcome, ShiftRequest, TileGrid, TileId};

// =============================================================================
// LAYOUT
// =============================================================================

/// Screen geometry inputs for the overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftLayoutConfig {
    /// Width of the screen region the overlay occupies
    pub region_width: f32,
    /// Height of the screen region
    pub region_height: f32,
    /// Empty border inside the region
    pub padding: f32,
    /// Pixel size of the tile artwork
    pub native_tile_size: f32,
}

impl Default for ShiftLayoutConfig {
    fn default() -> Self {
        Self {
            region_width: 1280.0,
            region_height: 720.0,
            padding: 50.0,
            native_tile_size: 500.0,
        }
    }
}

/// Overlay geometry that cannot hold a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Padding eats the whole region (or the region is empty)
    #[error("padding {padding} leaves no room in a {width}x{height} region")]
    NoRoom {
        /// Configured padding
        padding: f32,
        /// Region width
        width: f32,
        /// Region height
        height: f32,
    },
}

impl ShiftLayoutConfig {
    /// The padded region must keep a positive, finite extent.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let usable = self.region_width.min(self.region_height) - 2.0 * self.padding;
        if !(usable.is_finite() && usable > 0.0 && self.padding >= 0.0) {
            return Err(LayoutError::NoRoom {
                padding: self.padding,
                width: self.region_width,
                height: self.region_height,
            });
        }
        Ok(())
    }
}

/// Axis-aligned screen rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Top-left corner
    pub min: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl ScreenRect {
    /// Square with top-left corner `min`.
    pub fn square(min: Vec2, side: f32) -> Self {
        Self { min, size: Vec2::splat(side) }
    }

    /// Centre point.
    pub fn center(&self) -> Vec2 {
        self.min + self.size.scale(0.5)
    }

    /// Half-open containment test.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.x < self.min.x + self.size.x
            && point.y < self.min.y + self.size.y
    }
}

/// Derived overlay geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftLayout {
    /// On-screen side of one tile (and one button)
    pub tile_dimension: f32,
    /// `tile_dimension / native_tile_size`
    pub scaling_factor: f32,
    /// Top-left corner of the grid
    pub grid_origin: Vec2,
    /// Grid columns
    pub grid_width: usize,
    /// Grid rows
    pub grid_height: usize,
}

impl ShiftLayout {
    /// Fit a `grid_width x grid_height` grid, plus its button ring, into the
    /// region. The larger grid dimension decides the tile size.
    pub fn compute(config: &ShiftLayoutConfig, grid_width: usize, grid_height: usize) -> Self {
        let grid_dimension = grid_width.max(grid_height) as f32;
        let usable = config.region_width.min(config.region_height) - 2.0 * config.padding;
        let tile_dimension = usable / (grid_dimension + 2.0);
        let scaling_factor = if config.native_tile_size > 0.0 {
            tile_dimension / config.native_tile_size
        } else {
            1.0
        };

        let center = Vec2::new(config.region_width / 2.0, config.region_height / 2.0);
        let grid_origin = Vec2::new(
            center.x - (grid_width as f32 / 2.0) * tile_dimension,
            center.y - (grid_height as f32 / 2.0) * tile_dimension,
        );

        Self {
            tile_dimension,
            scaling_factor,
            grid_origin,
            grid_width,
            grid_height,
        }
    }

    /// Screen rectangle of the tile at `(col, row)`.
    pub fn tile_rect(&self, col: usize, row: usize) -> ScreenRect {
        ScreenRect::square(
            Vec2::new(
                self.grid_origin.x + col as f32 * self.tile_dimension,
                self.grid_origin.y + row as f32 * self.tile_dimension,
            ),
            self.tile_dimension,
        )
    }
}

// =============================================================================
// BUTTONS
// =============================================================================

/// One arrow of the button ring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftButton {
    /// Row or column index
    pub index: usize,
    /// Direction the line moves
    pub direction: Direction,
    /// Screen placement
    pub rect: ScreenRect,
    /// Sprite rotation (radians)
    pub rotation: f32,
    /// Armed?
    pub pressed: bool,
}

impl ShiftButton {
    fn new(index: usize, direction: Direction, min: Vec2, side: f32, rotation: f32) -> Self {
        Self {
            index,
            direction,
            rect: ScreenRect::square(min, side),
            rotation,
            pressed: false,
        }
    }

    /// Shift this button asks for.
    pub fn request(&self) -> ShiftRequest {
        ShiftRequest::new(self.index, self.direction)
    }

    /// Hit-test a screen point.
    pub fn contains(&self, point: Vec2) -> bool {
        self.rect.contains(point)
    }
}

fn build_buttons(layout: &ShiftLayout) -> Vec<ShiftButton> {
    let d = layout.tile_dimension;
    let start = layout.grid_origin;
    let mut buttons = Vec::with_capacity(2 * (layout.grid_width + layout.grid_height));

    for i in 0..layout.grid_width {
        let x = start.x + i as f32 * d;
        buttons.push(ShiftButton::new(i, Direction::Down, Vec2::new(x, start.y - d), d, PI));
        buttons.push(ShiftButton::new(
            i,
            Direction::Up,
            Vec2::new(x, start.y + layout.grid_height as f32 * d),
            d,
            0.0,
        ));
    }
    for j in 0..layout.grid_height {
        let y = start.y + j as f32 * d;
        buttons.push(ShiftButton::new(j, Direction::Right, Vec2::new(start.x - d, y), d, FRAC_PI_2));
        buttons.push(ShiftButton::new(
            j,
            Direction::Left,
            Vec2::new(start.x + layout.grid_width as f32 * d, y),
            d,
            -FRAC_PI_2,
        ));
    }
    buttons
}

// =============================================================================
// INTERFACE
// =============================================================================

/// Result of one overlay frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShiftInterfaceStatus {
    /// Still open
    Open,
    /// Closed this frame, with the applied shift if any
    Closed {
        /// Applied shift
        shift: Option<ShiftOutcome>,
    },
}

/// Button ring state for one grid.
#[derive(Clone, Debug)]
pub struct ShiftInterface {
    layout: ShiftLayout,
    buttons: Vec<ShiftButton>,
    armed: Option<usize>,
}

impl ShiftInterface {
    /// Lay out the overlay for `grid`.
    pub fn new(config: &ShiftLayoutConfig, grid: &TileGrid) -> Self {
        let layout = ShiftLayout::compute(config, grid.width(), grid.height());
        let buttons = build_buttons(&layout);
        Self {
            layout,
            buttons,
            armed: None,
        }
    }

    /// Overlay geometry.
    pub fn layout(&self) -> &ShiftLayout {
        &self.layout
    }

    /// Every button.
    pub fn buttons(&self) -> &[ShiftButton] {
        &self.buttons
    }

    /// Index of the button for `(index, direction)`.
    pub fn button_index(&self, index: usize, direction: Direction) -> Option<usize> {
        self.buttons
            .iter()
            .position(|b| b.index == index && b.direction == direction)
    }

    /// The armed button.
    pub fn armed(&self) -> Option<&ShiftButton> {
        self.armed.and_then(|i| self.buttons.get(i))
    }

    /// Press a button: arms it and disarms the rest, or disarms it if it was
    /// already armed. Returns false for an unknown button.
    pub fn press(&mut self, button: usize) -> bool {
        if button >= self.buttons.len() {
            return false;
        }
        let arm = self.armed != Some(button);
        for (i, b) in self.buttons.iter_mut().enumerate() {
            b.pressed = arm && i == button;
        }
        self.armed = arm.then_some(button);
        true
    }

    /// Press whichever button is under `point`.
    pub fn press_at(&mut self, point: Vec2) -> Option<usize> {
        let hit = self.buttons.iter().position(|b| b.contains(point))?;
        self.press(hit);
        Some(hit)
    }

    /// Disarm everything.
    pub fn cancel(&mut self) {
        for b in &mut self.buttons {
            b.pressed = false;
        }
        self.armed = None;
    }

    /// Take the armed button's request, clearing the armed state.
    pub fn confirm(&mut self) -> Option<ShiftRequest> {
        let request = self.armed()?.request();
        self.cancel();
        Some(request)
    }

    /// Screen rectangle of every tile, in grid order.
    pub fn tile_rects(&self, grid: &TileGrid) -> Vec<(TileId, ScreenRect)> {
        grid.tiles()
            .iter()
            .map(|t| (t.id, self.layout.tile_rect(t.slot.col, t.slot.row)))
            .collect()
    }

    /// Handle one frame of input while the overlay is open.
    ///
    /// On confirm the re-entering tile draws a fresh door set from `rng`.
    pub fn update(
        &mut self,
        input: &InputFrame,
        grid: &mut TileGrid,
        rng: &mut DeterministicRng,
    ) -> ShiftInterfaceStatus {
        if input.was_key_clicked(KeyInput::ToggleShiftMenu) {
            self.cancel();
            debug!("Shift interface closed without shifting");
            return ShiftInterfaceStatus::Closed { shift: None };
        }

        if let Some(point) = input.pointer_click {
            self.press_at(point);
        }
        if input.was_key_clicked(KeyInput::Cancel) {
            self.cancel();
        }
        if !input.was_key_clicked(KeyInput::Confirm) {
            return ShiftInterfaceStatus::Open;
        }

        let Some(request) = self.confirm() else {
            return ShiftInterfaceStatus::Open;
        };
        let incoming = DoorDirections::random(rng);
        match grid.shift(request, incoming) {
            Ok(outcome) => ShiftInterfaceStatus::Closed { shift: Some(outcome) },
            Err(err) => {
                warn!("Shift had no effect: {}", err);
                ShiftInterfaceStatus::Closed { shift: None }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::{GridLine, Slot};

    fn square_config() -> ShiftLayoutConfig {
        ShiftLayoutConfig {
            region_width: 500.0,
            region_height: 500.0,
            padding: 50.0,
            native_tile_size: 500.0,
        }
    }

    fn grid(width: usize, height: usize) -> TileGrid {
        TileGrid::new(width, height, &vec![DoorDirections::ALL; width * height], 10.0).unwrap()
    }

    #[test]
    fn test_layout_config_needs_room() {
        assert_eq!(square_config().validate(), Ok(()));

        let cramped = ShiftLayoutConfig { padding: 250.0, ..square_config() };
        assert!(matches!(cramped.validate(), Err(LayoutError::NoRoom { .. })));

        let negative = ShiftLayoutConfig { padding: -10.0, ..square_config() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_layout_for_4x4() {
        let ui = ShiftInterface::new(&square_config(), &grid(4, 4));
        let layout = ui.layout();
        assert!((layout.tile_dimension - 66.666_67).abs() < 1e-3);
        assert!((layout.scaling_factor - 0.133_333).abs() < 1e-5);
        assert_eq!(ui.buttons().len(), 16);
    }

    #[test]
    fn test_button_placement() {
        let ui = ShiftInterface::new(&square_config(), &grid(4, 4));
        let d = ui.layout().tile_dimension;
        let origin = ui.layout().grid_origin;
        assert!(origin.approx_eq(Vec2::new(250.0 - 2.0 * d, 250.0 - 2.0 * d), 1e-3));

        let top = ui.buttons()[ui.button_index(1, Direction::Down).unwrap()];
        assert!(top.rect.min.approx_eq(Vec2::new(origin.x + d, origin.y - d), 1e-3));
        assert_eq!(top.rotation, PI);

        let bottom = ui.buttons()[ui.button_index(1, Direction::Up).unwrap()];
        assert!(bottom.rect.min.approx_eq(Vec2::new(origin.x + d, origin.y + 4.0 * d), 1e-3));

        let left = ui.buttons()[ui.button_index(2, Direction::Right).unwrap()];
        assert!(left.rect.min.approx_eq(Vec2::new(origin.x - d, origin.y + 2.0 * d), 1e-3));
        assert_eq!(left.rotation, FRAC_PI_2);

        let right = ui.buttons()[ui.button_index(2, Direction::Left).unwrap()];
        assert!(right.rect.min.approx_eq(Vec2::new(origin.x + 4.0 * d, origin.y + 2.0 * d), 1e-3));
        assert_eq!(right.rotation, -FRAC_PI_2);
    }

    #[test]
    fn test_rectangular_grid_buttons() {
        let ui = ShiftInterface::new(&square_config(), &grid(3, 2));
        assert_eq!(ui.buttons().len(), 10);
        assert!((ui.layout().tile_dimension - 80.0).abs() < 1e-4);
        assert!(ui.button_index(2, Direction::Down).is_some());
        assert!(ui.button_index(2, Direction::Right).is_none());
    }

    #[test]
    fn test_confirm_with_nothing_armed() {
        let mut ui = ShiftInterface::new(&square_config(), &grid(4, 4));
        assert_eq!(ui.confirm(), None);
    }

    #[test]
    fn test_confirm_issues_one_request() {
        let mut ui = ShiftInterface::new(&square_config(), &grid(4, 4));
        let button = ui.button_index(2, Direction::Right).unwrap();
        assert!(ui.press(button));

        let request = ui.confirm().unwrap();
        assert_eq!(request.line, GridLine::Row(2));
        assert_eq!(request.direction, Direction::Right);
        assert!(ui.armed().is_none());
        assert_eq!(ui.confirm(), None);
    }

    #[test]
    fn test_arming_is_exclusive() {
        let mut ui = ShiftInterface::new(&square_config(), &grid(4, 4));
        ui.press(0);
        ui.press(5);
        assert_eq!(ui.buttons().iter().filter(|b| b.pressed).count(), 1);
        assert!(ui.buttons()[5].pressed);

        // Pressing the armed button disarms it
        ui.press(5);
        assert!(ui.armed().is_none());
        assert!(ui.buttons().iter().all(|b| !b.pressed));

        ui.press(3);
        ui.cancel();
        assert!(ui.armed().is_none());
        assert!(!ui.press(99));
    }

    #[test]
    fn test_press_at_hit_tests() {
        let mut ui = ShiftInterface::new(&square_config(), &grid(4, 4));
        let target = ui.button_index(0, Direction::Up).unwrap();
        let center = ui.buttons()[target].rect.center();
        assert_eq!(ui.press_at(center), Some(target));
        assert_eq!(ui.armed().map(|b| b.direction), Some(Direction::Up));

        // Middle of the grid is not a button
        assert_eq!(ui.press_at(Vec2::new(250.0, 250.0)), None);
    }

    #[test]
    fn test_tile_rects_follow_slots() {
        let map = grid(4, 4);
        let ui = ShiftInterface::new(&square_config(), &map);
        let rects = ui.tile_rects(&map);
        assert_eq!(rects.len(), 16);
        let (id, rect) = rects[5];
        assert_eq!(map.slot_of(id), Some(Slot::new(1, 1)));
        assert!(rect.min.approx_eq(ui.layout().tile_rect(1, 1).min, 1e-4));
    }

    #[test]
    fn test_update_confirm_applies_shift() {
        let mut map = grid(4, 4);
        let mut rng = DeterministicRng::new(5);
        let mut ui = ShiftInterface::new(&square_config(), &map);

        let click = ui.buttons()[ui.button_index(2, Direction::Right).unwrap()].rect.center();
        assert_eq!(
            ui.update(&InputFrame::with_pointer_click(click), &mut map, &mut rng),
            ShiftInterfaceStatus::Open
        );

        let status = ui.update(&InputFrame::with_click(KeyInput::Confirm), &mut map, &mut rng);
        let ShiftInterfaceStatus::Closed { shift: Some(outcome) } = status else {
            panic!("expected a shift, got {:?}", status);
        };
        assert_eq!(outcome.reentry_slot, Slot::new(0, 2));
        assert_ne!(outcome.new_doors, DoorDirections::NONE);
        assert_eq!(map.shift_count(), 1);
    }

    #[test]
    fn test_update_toggle_closes_without_shift() {
        let mut map = grid(4, 4);
        let mut rng = DeterministicRng::new(5);
        let mut ui = ShiftInterface::new(&square_config(), &map);
        ui.press(0);

        let status = ui.update(&InputFrame::with_click(KeyInput::ToggleShiftMenu), &mut map, &mut rng);
        assert_eq!(status, ShiftInterfaceStatus::Closed { shift: None });
        assert!(ui.armed().is_none());
        assert_eq!(map.shift_count(), 0);

        // Confirm with nothing armed keeps the overlay open
        let status = ui.update(&InputFrame::with_click(KeyInput::Confirm), &mut map, &mut rng);
        assert_eq!(status, ShiftInterfaceStatus::Open);
    }
}
