//! Game Context
//!
//! Everything a running level owns, in one explicit value: physics world,
//! object registry, tile grid, director, RNG, deferred spawns and the event
//! buffer. Systems receive it (or disjoint borrows of it) as a parameter.

use thiserror::Error;
use tracing::info;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::character::{Character, PlayerController};
use crate::game::director::{AiDirector, WaveDirector};
use crate::game::entities::Collectable;
use crate::game::events::WorldEvent;
use crate::game::input::InputFrame;
use crate::game::level::{ConfigError, GameConfig, LevelConfig, LevelError};
use crate::game::map::TileGrid;
use crate::game::object::{FrameContext, GameObject, ObjectCategory, Spawner};
use crate::game::physics::{PhysicsWorld, SimplePhysics};
use crate::game::registry::ObjectRegistry;
use crate::game::tick::{tick, FrameError, Transition};

/// Failure to start or run a level.
#[derive(Debug, Error)]
pub enum GameError {
    /// Level data rejected
    #[error("level error: {0}")]
    Level(#[from] LevelError),

    /// Tuning rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A frame failed
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// State of one running level.
pub struct GameContext {
    /// Level being played
    pub level: LevelConfig,
    /// Runtime tuning
    pub config: GameConfig,
    /// Frames run so far
    pub frame: u64,
    /// Physics world
    pub physics: Box<dyn PhysicsWorld>,
    /// Live objects
    pub registry: ObjectRegistry,
    /// Tile grid
    pub map: TileGrid,
    /// Enemy pacing
    pub director: Box<dyn AiDirector>,
    /// Level RNG (spawns, door draws)
    pub rng: DeterministicRng,
    /// Objects queued during the current frame
    pub spawner: Spawner,
    /// Events generated this frame (cleared each frame)
    pub pending_events: Vec<WorldEvent>,
    /// Screen change requested by the most recent frame
    pub pending_transition: Option<Transition>,
    /// Collectables picked up so far
    pub collectables_picked: u32,
}

impl GameContext {
    /// Build a level and run its zero-length first frame.
    pub fn start_new_game(
        level: LevelConfig,
        config: GameConfig,
        mut physics: Box<dyn PhysicsWorld>,
        mut director: Box<dyn AiDirector>,
    ) -> Result<Self, GameError> {
        level.validate()?;
        config.validate()?;
        let map = level.build_grid(config.tile_side_length)?;
        let rng = DeterministicRng::for_level(&level.name, level.seed);
        let mut spawner = Spawner::new();

        let controller = PlayerController {
            reach: config.player_reach,
            projectile: config.projectile.clone(),
        };
        let player = Character::player(
            spawner.next_id(),
            config.player.clone(),
            controller,
            physics.as_mut(),
            map.slot_center(level.start_slot()),
        );
        let mut registry = ObjectRegistry::new(player);

        for slot in &level.collectables {
            let collectable = Collectable::new(
                spawner.next_id(),
                physics.as_mut(),
                map.slot_center(*slot),
                config.pickup_radius,
            );
            registry.insert(ObjectCategory::Collectable, Box::new(collectable));
        }

        director.start_new_game();

        info!(
            "Starting level '{}' ({}x{}, seed {}, {} collectables)",
            level.name,
            level.width,
            level.height,
            level.seed,
            level.collectables.len()
        );

        let mut ctx = Self {
            level,
            config,
            frame: 0,
            physics,
            registry,
            map,
            director,
            rng,
            spawner,
            pending_events: Vec::new(),
            pending_transition: None,
            collectables_picked: 0,
        };

        // Events of the start frame are handed out with the next frame's
        let start = tick(&mut ctx, &InputFrame::new(), 0.0)?;
        ctx.pending_events = start.events;
        Ok(ctx)
    }

    /// Start a level with the reference physics and the wave director.
    pub fn with_defaults(level: LevelConfig, config: GameConfig) -> Result<Self, GameError> {
        let director = WaveDirector::new(config.director.clone());
        Self::start_new_game(level, config, Box::new(SimplePhysics::new()), Box::new(director))
    }

    /// Player position, if the player's body still exists at a finite point.
    pub fn player_position(&self) -> Option<Vec2> {
        self.registry
            .player()
            .position(self.physics.as_ref())
            .filter(|position| position.is_finite())
    }

    /// Split into the frame context handed to objects, plus the registry and
    /// director that drive them.
    pub fn split_frame<'a>(
        &'a mut self,
        input: &'a InputFrame,
        player_position: Vec2,
    ) -> (FrameContext<'a>, &'a mut ObjectRegistry, &'a mut dyn AiDirector) {
        let ctx = FrameContext {
            physics: self.physics.as_mut(),
            input,
            map: &self.map,
            rng: &mut self.rng,
            spawner: &mut self.spawner,
            events: &mut self.pending_events,
            player_position,
            frame: self.frame,
        };
        (ctx, &mut self.registry, self.director.as_mut())
    }

    /// Tear the level down: every live or queued object is cleared.
    pub fn end_level(&mut self) {
        self.registry.clear_all(self.physics.as_mut());
        for (_, mut object) in self.spawner.drain() {
            object.on_cleared(self.physics.as_mut());
        }
        info!("Level '{}' ended after {} frames", self.level.name, self.frame);
    }

    /// Take the pending transition, if any.
    pub fn take_transition(&mut self) -> Option<Transition> {
        self.pending_transition.take()
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a world event.
    pub fn push_event(&mut self, event: WorldEvent) {
        self.pending_events.push(event);
    }

    /// Compute hash of the current state for determinism checks.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, self.level.seed, |hasher| {
            self.map.hash_into(hasher);

            let player = self.registry.player();
            hasher.update_u32(player.id().0);
            if let Some(position) = self.player_position() {
                hasher.update_vec2(position);
            }

            for category in ObjectCategory::UPDATE_ORDER {
                for object in self.registry.objects(category) {
                    hasher.update_u32(object.id().0);
                    if let Some(position) = self.physics.position(object.body()) {
                        hasher.update_vec2(position);
                    }
                }
            }

            hasher.update_u32(self.collectables_picked);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::Slot;

    #[test]
    fn test_start_new_game_builds_level() {
        let ctx = GameContext::with_defaults(LevelConfig::demo(), GameConfig::default()).unwrap();

        // The zero-length first frame has already run
        assert_eq!(ctx.frame, 1);
        assert_eq!(ctx.registry.count(ObjectCategory::Collectable), 3);
        assert_eq!(ctx.registry.count(ObjectCategory::Enemy), 0);
        assert_eq!(ctx.physics.body_count(), 4);

        let start = ctx.map.slot_center(Slot::new(0, 0));
        assert_eq!(ctx.player_position(), Some(start));
        assert!(ctx.pending_events.is_empty());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let mut level = LevelConfig::demo();
        level.doors.pop();
        let result = GameContext::with_defaults(level, GameConfig::default());
        assert!(matches!(
            result,
            Err(GameError::Level(LevelError::DoorCountMismatch { expected: 16, actual: 15 }))
        ));
    }

    #[test]
    fn test_unusable_layout_is_rejected() {
        let mut config = GameConfig::default();
        config.shift_layout.padding = 1000.0;
        let result = GameContext::with_defaults(LevelConfig::demo(), config);
        assert!(matches!(result, Err(GameError::Config(_))));
    }

    #[test]
    fn test_end_level_clears_bodies() {
        let mut ctx = GameContext::with_defaults(LevelConfig::demo(), GameConfig::default()).unwrap();
        ctx.end_level();
        assert_eq!(ctx.physics.body_count(), 0);
    }

    #[test]
    fn test_state_determinism() {
        let a = GameContext::with_defaults(LevelConfig::demo(), GameConfig::default()).unwrap();
        let b = GameContext::with_defaults(LevelConfig::demo(), GameConfig::default()).unwrap();
        assert_eq!(a.compute_hash(), b.compute_hash());

        let mut other = LevelConfig::demo();
        other.seed = 8;
        let c = GameContext::with_defaults(other, GameConfig::default()).unwrap();
        assert_ne!(a.compute_hash(), c.compute_hash());
    }
}
