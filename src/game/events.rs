//! World Events
//!
//! Events generated during a frame, collected on the context and handed back
//! in the frame result (for logging, audio cues, objective tracking).

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;
use crate::game::map::{ShiftOutcome, Slot};
use crate::game::object::{ObjectCategory, ObjectId};
use crate::game::tick::Transition;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WorldEventData {
    /// Object removed by the cull phase
    ObjectCulled {
        id: ObjectId,
        category: ObjectCategory,
    },

    /// Object update failed; the object was marked for removal
    ObjectUpdateFailed {
        id: ObjectId,
        reason: String,
    },

    /// Player picked up a collectable
    CollectablePicked {
        id: ObjectId,
        position: Vec2,
    },

    /// Director spawned an enemy
    EnemySpawned {
        id: ObjectId,
        slot: Slot,
    },

    /// Player fired a projectile
    ProjectileFired {
        id: ObjectId,
        direction: Vec2,
    },

    /// A row or column of the grid was shifted
    TilesShifted {
        outcome: ShiftOutcome,
    },

    /// The frame requested a screen transition
    TransitionRequested {
        transition: Transition,
    },
}

/// A world event stamped with its frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// Frame index when the event occurred
    pub frame: u64,

    /// Event data
    pub data: WorldEventData,
}

impl WorldEvent {
    /// Create a new event.
    pub fn new(frame: u64, data: WorldEventData) -> Self {
        Self { frame, data }
    }

    /// Object culled event.
    pub fn object_culled(frame: u64, id: ObjectId, category: ObjectCategory) -> Self {
        Self::new(frame, WorldEventData::ObjectCulled { id, category })
    }

    /// Object update failure event.
    pub fn object_update_failed(frame: u64, id: ObjectId, reason: impl Into<String>) -> Self {
        Self::new(
            frame,
            WorldEventData::ObjectUpdateFailed {
                id,
                reason: reason.into(),
            },
        )
    }

    /// Collectable picked event.
    pub fn collectable_picked(frame: u64, id: ObjectId, position: Vec2) -> Self {
        Self::new(frame, WorldEventData::CollectablePicked { id, position })
    }

    /// Enemy spawned event.
    pub fn enemy_spawned(frame: u64, id: ObjectId, slot: Slot) -> Self {
        Self::new(frame, WorldEventData::EnemySpawned { id, slot })
    }

    /// Projectile fired event.
    pub fn projectile_fired(frame: u64, id: ObjectId, direction: Vec2) -> Self {
        Self::new(frame, WorldEventData::ProjectileFired { id, direction })
    }

    /// Tiles shifted event.
    pub fn tiles_shifted(frame: u64, outcome: ShiftOutcome) -> Self {
        Self::new(frame, WorldEventData::TilesShifted { outcome })
    }

    /// Transition requested event.
    pub fn transition_requested(frame: u64, transition: Transition) -> Self {
        Self::new(frame, WorldEventData::TransitionRequested { transition })
    }
}
