//! Game Logic Module
//!
//! The frame engine and the tile-shift puzzle. Deterministic for a given
//! level, config and input sequence.
//!
//! ## Module Structure
//!
//! - `physics`: Physics boundary and reference integrator
//! - `input`: Per-frame input snapshot
//! - `object`: Object trait, ids, frame context, deferred spawns
//! - `character`: Player and enemies, movement impulse
//! - `entities`: Collectables, projectiles, particles
//! - `registry`: Object collections, update order, culling
//! - `map`: Door sets, tiles, the tile grid and its shifts
//! - `shift`: Shift interface (layout, buttons, confirm)
//! - `director`: AI director hook and wave pacing
//! - `level`: Level data and runtime tuning
//! - `state`: Game context of a running level
//! - `tick`: World update loop
//! - `flow`: Screen routing (playing, paused, shifting)
//! - `snapshot`: Read-only frame picture for presentation
//! - `events`: World events for logging and replay

pub mod physics;
pub mod input;
pub mod object;
pub mod character;
pub mod entities;
pub mod registry;
pub mod map;
pub mod shift;
pub mod director;
pub mod level;
pub mod state;
pub mod tick;
pub mod flow;
pub mod snapshot;
pub mod events;

// Re-export key types
pub use input::{InputFrame, KeyInput};
pub use map::{Direction, DoorDirections, ShiftError, ShiftRequest, TileGrid};
pub use state::{GameContext, GameError};
pub use tick::{tick, FrameError, TickResult, Transition};
pub use events::{WorldEvent, WorldEventData};
