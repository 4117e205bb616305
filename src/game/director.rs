//! AI Director
//!
//! The director paces the level. It is updated once per frame, after the
//! objects and before the cull, and may queue new enemies through the frame
//! context. [`WaveDirector`] is the shipped pacing: a wave every few seconds
//! at random tile centres away from the player, up to a cap.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::character::{Character, CharacterType};
use crate::game::events::WorldEvent;
use crate::game::map::Slot;
use crate::game::object::{FrameContext, ObjectCategory};

/// Per-frame pacing hook.
pub trait AiDirector {
    /// Reset for a fresh level.
    fn start_new_game(&mut self);

    /// Advance by `dt`. `enemy_count` is the number of live enemies.
    fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32, enemy_count: usize);
}

/// Wave pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Seconds before the first wave
    pub first_wave_delay: f32,
    /// Seconds between waves
    pub spawn_interval: f32,
    /// Enemies per wave
    pub wave_size: u32,
    /// Cap on live enemies
    pub max_enemies: u32,
    /// Enemy tuning
    pub enemy: CharacterType,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            first_wave_delay: 2.0,
            spawn_interval: 5.0,
            wave_size: 2,
            max_enemies: 8,
            enemy: CharacterType::enemy(),
        }
    }
}

/// Spawns waves of enemies on a timer.
#[derive(Clone, Debug)]
pub struct WaveDirector {
    config: DirectorConfig,
    until_next_wave: f32,
    waves: u32,
}

impl WaveDirector {
    /// Create a director; call `start_new_game` before the first frame.
    pub fn new(config: DirectorConfig) -> Self {
        let until_next_wave = config.first_wave_delay;
        Self {
            config,
            until_next_wave,
            waves: 0,
        }
    }

    /// Waves spawned so far.
    pub fn waves(&self) -> u32 {
        self.waves
    }

    fn spawn_wave(&mut self, ctx: &mut FrameContext<'_>, enemy_count: usize) {
        let room = (self.config.max_enemies as usize).saturating_sub(enemy_count);
        let count = (self.config.wave_size as usize).min(room);
        if count == 0 {
            return;
        }

        // Never drop an enemy on top of the player
        let player_slot = ctx.map.slot_at(ctx.player_position);
        let candidates: Vec<Slot> = ctx
            .map
            .tiles()
            .iter()
            .map(|t| t.slot)
            .filter(|s| Some(*s) != player_slot)
            .collect();

        for _ in 0..count {
            let Some(slot) = ctx.rng.choose(&candidates).copied() else {
                return;
            };
            let position = ctx.map.slot_center(slot);
            let id = ctx.spawner.next_id();
            let enemy = Character::enemy(id, self.config.enemy.clone(), ctx.physics, position);
            ctx.spawner.spawn(ObjectCategory::Enemy, Box::new(enemy));

            let frame = ctx.frame;
            ctx.emit(WorldEvent::enemy_spawned(frame, id, slot));
        }

        self.waves += 1;
        debug!("Wave {} spawned {} enemies", self.waves, count);
    }
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new(DirectorConfig::default())
    }
}

impl AiDirector for WaveDirector {
    fn start_new_game(&mut self) {
        self.until_next_wave = self.config.first_wave_delay;
        self.waves = 0;
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32, enemy_count: usize) {
        self.until_next_wave -= dt;
        if self.until_next_wave > 0.0 {
            return;
        }
        self.until_next_wave += self.config.spawn_interval.max(f32::EPSILON);
        self.spawn_wave(ctx, enemy_count);
    }
}
