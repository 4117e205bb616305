//! Game Object Lifecycle
//!
//! Every entity in the world implements [`GameObject`]. Lifecycle:
//!
//! 1. created by a factory (`Character::player`, `Collectable::new`, ...)
//!    and handed to the registry, or to the [`Spawner`] mid-frame;
//! 2. `update` once per frame, which may set its own kill flag but never
//!    removes the object;
//! 3. when the kill flag is set the cull phase calls `on_killed` exactly once
//!    and drops the object;
//! 4. objects still alive when a level ends get `on_cleared` instead.
//!
//! Capabilities are split out of the trait surface: [`ObjectCore`] holds the
//! bookkeeping every variant shares, drawing goes through [`DrawInfo`], and
//! minimap presence is an optional [`MinimapMarker`].

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::events::WorldEvent;
use crate::game::input::InputFrame;
use crate::game::map::TileGrid;
use crate::game::physics::{BodyHandle, PhysicsWorld};

/// Stable object identifier (monotonic counter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Culled object collections, in update order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectCategory {
    /// Shots
    Projectile,
    /// Short-lived effects
    Particle,
    /// Pickups
    Collectable,
    /// AI-driven characters
    Enemy,
}

impl ObjectCategory {
    /// Order in which categories are updated and culled.
    pub const UPDATE_ORDER: [ObjectCategory; 4] = [
        ObjectCategory::Projectile,
        ObjectCategory::Particle,
        ObjectCategory::Collectable,
        ObjectCategory::Enemy,
    ];
}

/// Per-object update failure. The object is logged and marked for removal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectError {
    /// The object's body is gone from the physics world
    #[error("object {0:?} has no physics body")]
    MissingBody(ObjectId),

    /// The object's body reported an unusable position
    #[error("object {id:?} is at non-finite position {position}")]
    NonFinitePosition {
        /// Offending object
        id: ObjectId,
        /// Reported position
        position: Vec2,
    },
}

/// What to draw for an object this frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawInfo {
    /// Sprite key
    pub sprite: String,
    /// Animation frame
    pub frame: u32,
    /// World position
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    /// Opacity in [0, 1]
    pub alpha: f32,
}

/// Minimap marker kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// The player
    Player,
    /// Enemy characters
    Enemy,
    /// Pickups
    Collectable,
}

/// Minimap presence of an object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinimapMarker {
    /// Marker kind
    pub kind: MarkerKind,
    /// World position
    pub position: Vec2,
    /// Marker size in world units
    pub size: f32,
}

/// Bookkeeping shared by every object variant.
#[derive(Clone, Debug)]
pub struct ObjectCore {
    /// Object identity
    pub id: ObjectId,
    /// Physics body
    pub body: BodyHandle,
    /// Set once the object's life is over
    pub should_be_killed: bool,
}

impl ObjectCore {
    /// Create the core for a live object.
    pub fn new(id: ObjectId, body: BodyHandle) -> Self {
        Self {
            id,
            body,
            should_be_killed: false,
        }
    }

    /// Read the body position, rejecting missing bodies and NaN positions.
    pub fn position(&self, physics: &dyn PhysicsWorld) -> Result<Vec2, ObjectError> {
        let position = physics
            .position(self.body)
            .ok_or(ObjectError::MissingBody(self.id))?;
        if !position.is_finite() {
            return Err(ObjectError::NonFinitePosition { id: self.id, position });
        }
        Ok(position)
    }
}

/// Objects queued for insertion after the cull phase.
///
/// Also hands out object ids, so every object in a level gets a unique one.
#[derive(Default)]
pub struct Spawner {
    pending: Vec<(ObjectCategory, Box<dyn GameObject>)>,
    next_id: u32,
}

impl Spawner {
    /// Create an empty spawner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next object id.
    pub fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Queue an object for insertion at the end of the frame.
    pub fn spawn(&mut self, category: ObjectCategory, object: Box<dyn GameObject>) {
        self.pending.push((category, object));
    }

    /// Number of queued objects.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Take every queued object, in spawn order.
    pub fn drain(&mut self) -> Vec<(ObjectCategory, Box<dyn GameObject>)> {
        std::mem::take(&mut self.pending)
    }
}

/// Everything an object may touch while it updates.
///
/// Built by the frame loop from disjoint parts of the game context.
pub struct FrameContext<'a> {
    /// Physics world
    pub physics: &'a mut dyn PhysicsWorld,
    /// This frame's input
    pub input: &'a InputFrame,
    /// Level grid (read-only during object updates)
    pub map: &'a TileGrid,
    /// Level RNG
    pub rng: &'a mut DeterministicRng,
    /// Deferred spawns
    pub spawner: &'a mut Spawner,
    /// Event sink
    pub events: &'a mut Vec<WorldEvent>,
    /// Player position after this frame's physics step
    pub player_position: Vec2,
    /// Frame index
    pub frame: u64,
}

impl FrameContext<'_> {
    /// Record an event for this frame.
    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }
}

/// A simulated entity.
pub trait GameObject {
    /// Object identity.
    fn id(&self) -> ObjectId;

    /// Physics body.
    fn body(&self) -> BodyHandle;

    /// Advance the object by `dt` seconds.
    fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) -> Result<(), ObjectError>;

    /// True once the object should be culled.
    fn should_be_killed(&self) -> bool;

    /// Flag the object for removal at the next cull.
    fn mark_for_removal(&mut self);

    /// Called once, by the cull phase, just before the object is dropped.
    fn on_killed(&mut self, ctx: &mut FrameContext<'_>) {
        ctx.physics.remove_body(self.body());
    }

    /// Called when the level is torn down while the object is still alive.
    fn on_cleared(&mut self, physics: &mut dyn PhysicsWorld) {
        physics.remove_body(self.body());
    }

    /// Drawing data, or `None` if there is nothing to draw.
    fn draw_info(&self, physics: &dyn PhysicsWorld) -> Option<DrawInfo>;

    /// Minimap presence.
    fn minimap_marker(&self, _physics: &dyn PhysicsWorld) -> Option<MinimapMarker> {
        None
    }
}
