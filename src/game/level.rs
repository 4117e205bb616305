//! Level Data and Tuning
//!
//! [`LevelConfig`] is the immutable description of one level: grid
//! dimensions, a door string per tile, where the player starts and where the
//! collectables lie. It is loaded from JSON:
//!
//! ```json
//! {
//!   "name": "crossroads",
//!   "seed": 7,
//!   "width": 2,
//!   "height": 2,
//!   "doors": ["RD", "DL", "UR", "UL"],
//!   "player_start": { "col": 0, "row": 0 },
//!   "collectables": [{ "col": 1, "row": 1 }]
//! }
//! ```
//!
//! Door strings list the open sides with `U`, `R`, `D`, `L` (or compass
//! letters); `-` is a closed tile.
//!
//! [`GameConfig`] carries the runtime tuning and defaults for everything.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::character::CharacterType;
use crate::game::director::DirectorConfig;
use crate::game::entities::ProjectileConfig;
use crate::game::map::{Direction, DoorDirections, DoorParseError, GridError, Slot, TileGrid};
use crate::game::shift::{LayoutError, ShiftLayoutConfig};

/// Level loading failure.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Level file could not be read
    #[error("failed to read level {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("failed to parse level: {0}")]
    Parse(#[from] serde_json::Error),

    /// Width or height is zero, or the grid is too large to index
    #[error("invalid level dimensions {width}x{height}")]
    InvalidDimensions {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
    },

    /// Door list does not cover the grid
    #[error("level has {actual} door entries, expected {expected}")]
    DoorCountMismatch {
        /// `width * height`
        expected: usize,
        /// Entries present
        actual: usize,
    },

    /// A door string has an unknown letter
    #[error("invalid door spec {spec:?} for tile {index}: unknown side {}", .source.0)]
    InvalidDoorSpec {
        /// Row-major tile index
        index: usize,
        /// Offending string
        spec: String,
        /// Parse failure
        source: DoorParseError,
    },

    /// A start or collectable slot lies outside the grid
    #[error("slot ({}, {}) is outside the level", .0.col, .0.row)]
    SlotOutOfRange(Slot),
}

/// Tuning rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Shift overlay geometry unusable
    #[error("shift layout: {0}")]
    Layout(#[from] LayoutError),
}

impl From<GridError> for LevelError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidDimensions { width, height } => LevelError::InvalidDimensions { width, height },
            GridError::DoorCountMismatch { expected, actual } => {
                LevelError::DoorCountMismatch { expected, actual }
            }
        }
    }
}

/// On-disk shape of a level; doors are still raw strings.
#[derive(Deserialize)]
struct LevelFile {
    name: String,
    #[serde(default)]
    seed: u64,
    width: usize,
    height: usize,
    doors: Vec<String>,
    #[serde(default)]
    player_start: Option<Slot>,
    #[serde(default)]
    collectables: Vec<Slot>,
}

/// Immutable level description.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelConfig {
    /// Level name (also salts the level seed)
    pub name: String,
    /// RNG seed
    pub seed: u64,
    /// Grid columns
    pub width: usize,
    /// Grid rows
    pub height: usize,
    /// Door set per tile, row-major
    pub doors: Vec<DoorDirections>,
    /// Player start slot (grid centre if absent)
    pub player_start: Option<Slot>,
    /// Collectable slots
    pub collectables: Vec<Slot>,
}

impl LevelConfig {
    /// Parse and validate a level from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;

        let doors = file
            .doors
            .into_iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.parse::<DoorDirections>()
                    .map_err(|source| LevelError::InvalidDoorSpec { index, spec, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let level = Self {
            name: file.name,
            seed: file.seed,
            width: file.width,
            height: file.height,
            doors,
            player_start: file.player_start,
            collectables: file.collectables,
        };
        level.validate()?;
        Ok(level)
    }

    /// Read a level file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize back to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check dimensions, door count and slot references.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::InvalidDimensions { width: self.width, height: self.height });
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .ok_or(LevelError::InvalidDimensions { width: self.width, height: self.height })?;
        if self.doors.len() != expected {
            return Err(LevelError::DoorCountMismatch { expected, actual: self.doors.len() });
        }
        for slot in self.player_start.iter().chain(&self.collectables) {
            if slot.col >= self.width || slot.row >= self.height {
                return Err(LevelError::SlotOutOfRange(*slot));
            }
        }
        Ok(())
    }

    /// Player start slot.
    pub fn start_slot(&self) -> Slot {
        self.player_start
            .unwrap_or(Slot::new(self.width / 2, self.height / 2))
    }

    /// Build the level's tile grid.
    pub fn build_grid(&self, tile_side_length: f32) -> Result<TileGrid, LevelError> {
        Ok(TileGrid::new(self.width, self.height, &self.doors, tile_side_length)?)
    }

    /// Built-in 4x4 level used by the demo and tests.
    pub fn demo() -> Self {
        use Direction::{Down as D, Left as L, Right as R, Up as U};
        const DOORS: [&[Direction]; 16] = [
            &[R, D], &[R, L], &[D, L], &[D],
            &[U, D], &[R, D], &[U, R, D, L], &[U, L],
            &[U, R, D], &[U, L], &[U, D], &[D],
            &[U, R], &[R, L], &[U, R, L], &[U, L],
        ];
        Self {
            name: "demo".to_string(),
            seed: 7,
            width: 4,
            height: 4,
            doors: DOORS
                .iter()
                .map(|sides| DoorDirections::from_directions(sides))
                .collect(),
            player_start: Some(Slot::new(0, 0)),
            collectables: vec![Slot::new(3, 0), Slot::new(2, 2), Slot::new(0, 3)],
        }
    }
}

/// Runtime tuning for a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// World-space side of a tile
    pub tile_side_length: f32,
    /// Player tuning
    pub player: CharacterType,
    /// How far ahead of the player its movement target sits at full input
    pub player_reach: f32,
    /// Player shots
    pub projectile: ProjectileConfig,
    /// Distance at which the player picks up a collectable
    pub pickup_radius: f32,
    /// Enemy pacing
    pub director: DirectorConfig,
    /// Shift overlay geometry
    pub shift_layout: ShiftLayoutConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_side_length: 16.0,
            player: CharacterType::player(),
            player_reach: 4.0,
            projectile: ProjectileConfig::default(),
            pickup_radius: 1.5,
            director: DirectorConfig::default(),
            shift_layout: ShiftLayoutConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse tuning overrides from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tuning the level cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shift_layout.validate()?;
        Ok(())
    }
}
