//! Input Snapshot
//!
//! Input is polled once per frame by the host and handed to the core as an
//! [`InputFrame`]: edge-triggered logical keys, a continuous movement axis,
//! and the pointer in both world space (aiming) and screen space (clicks on
//! the shift interface). Nothing here is buffered across frames.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;

/// Logical keys queried with [`InputFrame::was_key_clicked`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyInput {
    /// Open or close the pause menu
    TogglePauseMenu = 0,
    /// Open or close the shift interface
    ToggleShiftMenu = 1,
    /// Commit the armed shift button
    Confirm = 2,
    /// Disarm the armed shift button
    Cancel = 3,
    /// Fire a projectile toward the pointer
    Fire = 4,
}

impl KeyInput {
    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Input state for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Movement axis, each component in [-1, 1]
    pub movement: Vec2,

    /// Pointer position in world space
    pub pointer_world: Vec2,

    /// Pointer click this frame, in screen space
    pub pointer_click: Option<Vec2>,

    /// Keys clicked this frame (one bit per [`KeyInput`])
    pub clicked: u8,
}

impl InputFrame {
    /// Create an empty input frame.
    pub const fn new() -> Self {
        Self {
            movement: Vec2::ZERO,
            pointer_world: Vec2::ZERO,
            pointer_click: None,
            clicked: 0,
        }
    }

    /// Create input with a movement axis.
    pub fn with_movement(x: f32, y: f32) -> Self {
        Self {
            movement: Vec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)),
            ..Self::new()
        }
    }

    /// Create input with a single key click.
    pub fn with_click(key: KeyInput) -> Self {
        let mut frame = Self::new();
        frame.set_clicked(key, true);
        frame
    }

    /// Create input with a pointer click at a screen position.
    pub fn with_pointer_click(position: Vec2) -> Self {
        Self {
            pointer_click: Some(position),
            ..Self::new()
        }
    }

    /// Was `key` clicked this frame?
    #[inline]
    pub fn was_key_clicked(&self, key: KeyInput) -> bool {
        self.clicked & key.bit() != 0
    }

    /// Set or clear a key click.
    #[inline]
    pub fn set_clicked(&mut self, key: KeyInput, clicked: bool) {
        if clicked {
            self.clicked |= key.bit();
        } else {
            self.clicked &= !key.bit();
        }
    }

    /// Movement axis with diagonal input capped to unit length.
    #[inline]
    pub fn move_direction(&self) -> Vec2 {
        if self.movement.length_squared() > 1.0 {
            self.movement.normalize()
        } else {
            self.movement
        }
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.movement == Vec2::ZERO && self.pointer_click.is_none() && self.clicked == 0
    }
}
