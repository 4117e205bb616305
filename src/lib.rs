//! # Chaotic Mind
//!
//! Runtime core of a top-down action game whose level is a grid of tiles the
//! player can slide around to reconnect rooms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CHAOTIC MIND CORE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── vec2.rs      - 2D float vector                          │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for replay checks          │
//! │                                                              │
//! │  game/            - Frame engine and shift puzzle            │
//! │  ├── physics.rs   - Physics boundary + reference world       │
//! │  ├── object.rs    - Object lifecycle trait                   │
//! │  ├── character.rs - Player and enemies                       │
//! │  ├── entities.rs  - Collectables, projectiles, particles     │
//! │  ├── registry.rs  - Update order and culling                 │
//! │  ├── map.rs       - Tile grid, doors, row/column shifts      │
//! │  ├── shift.rs     - Shift interface                          │
//! │  ├── director.rs  - Enemy pacing                             │
//! │  ├── level.rs     - Level data and tuning                    │
//! │  ├── state.rs     - Game context                             │
//! │  ├── tick.rs      - World update loop                        │
//! │  ├── flow.rs      - Screen routing                           │
//! │  └── snapshot.rs  - Presentation snapshot                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same level, tuning and input sequence, a session produces the
//! same state hash:
//! - All randomness comes from the level's seeded Xorshift128+
//! - Collections are walked in insertion order, physics bodies in handle order
//! - No system time dependencies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::DeterministicRng;
pub use game::flow::{GameFlow, Screen};
pub use game::input::{InputFrame, KeyInput};
pub use game::level::{GameConfig, LevelConfig};
pub use game::state::GameContext;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal frame rate (Hz)
pub const FRAME_RATE: u32 = 60;

/// Nominal frame length in seconds
pub const FRAME_SECONDS: f32 = 1.0 / FRAME_RATE as f32;
