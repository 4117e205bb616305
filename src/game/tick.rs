//! World Update Loop
//!
//! One call to [`tick`] advances a running level by one frame:
//!
//! 1. step physics, so every position read this frame is post-step, and
//!    reject the frame if any live body ended the step at a non-finite point;
//! 2. update objects: projectiles, particles, collectables, enemies, player;
//! 3. update the map, then the AI director;
//! 4. cull killed objects, then append objects spawned during the frame;
//! 5. record the screen transition requested this frame, if any.
//!
//! Given the same level, config and input sequence the loop produces the same
//! state hash: all randomness comes from the level RNG and collections are
//! walked in insertion order.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::game::events::{WorldEvent, WorldEventData};
use crate::game::input::{InputFrame, KeyInput};
use crate::game::object::{GameObject, ObjectCategory};
use crate::game::physics::PhysicsError;
use crate::game::state::GameContext;

/// Screen change requested by a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Open the pause menu
    PauseMenu,
    /// Open the shift interface
    ShiftInterface,
}

/// Frame failure. Nothing past the failing step ran.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// `dt` was negative or not finite; the level was not touched
    #[error("invalid frame delta {0}")]
    InvalidDelta(f32),

    /// The physics world failed to step
    #[error("physics failure: {0}")]
    Physics(#[from] PhysicsError),

    /// The player's body is gone
    #[error("player body missing from the physics world")]
    MissingPlayer,
}

/// Result of a frame.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this frame
    pub events: Vec<WorldEvent>,
    /// Transition requested this frame
    pub transition: Option<Transition>,
    /// Objects culled this frame
    pub culled: usize,
    /// Objects that joined the world at the end of this frame
    pub spawned: usize,
}

/// Run one frame of `dt` seconds.
pub fn tick(ctx: &mut GameContext, input: &InputFrame, dt: f32) -> Result<TickResult, FrameError> {
    if !dt.is_finite() || dt < 0.0 {
        error!("Rejected frame with delta {}", dt);
        return Err(FrameError::InvalidDelta(dt));
    }

    ctx.frame += 1;
    let mut result = TickResult::default();

    // 1. Physics
    if let Err(err) = ctx.physics.step(dt) {
        error!("Physics step failed on frame {}: {}", ctx.frame, err);
        return Err(err.into());
    }
    if let Err(err) = check_body_positions(ctx) {
        error!("Physics step left a body invalid on frame {}: {}", ctx.frame, err);
        return Err(err.into());
    }
    let Some(player_position) = ctx.player_position() else {
        error!("Player body missing on frame {}", ctx.frame);
        return Err(FrameError::MissingPlayer);
    };

    // 2. Objects
    {
        let (mut frame, registry, _) = ctx.split_frame(input, player_position);
        registry.update_all(&mut frame, dt);
    }

    // 3. Map, then director
    ctx.map.update(dt);
    {
        let (mut frame, registry, director) = ctx.split_frame(input, player_position);
        let enemy_count = registry.count(ObjectCategory::Enemy);
        director.update(&mut frame, dt, enemy_count);

        // 4. Cull
        result.culled = registry.cull(&mut frame);
    }
    result.spawned = ctx.registry.append_spawned(&mut ctx.spawner);

    // 5. Transitions; pause wins over the shift interface
    result.transition = if input.was_key_clicked(KeyInput::TogglePauseMenu) {
        Some(Transition::PauseMenu)
    } else if input.was_key_clicked(KeyInput::ToggleShiftMenu) {
        Some(Transition::ShiftInterface)
    } else {
        None
    };
    ctx.pending_transition = result.transition;
    if let Some(transition) = result.transition {
        debug!("Frame {} requested {:?}", ctx.frame, transition);
        let frame = ctx.frame;
        ctx.push_event(WorldEvent::transition_requested(frame, transition));
    }

    // Events carried over from the start frame were counted there
    let frame = ctx.frame;
    ctx.collectables_picked += ctx
        .pending_events
        .iter()
        .filter(|e| e.frame == frame && matches!(e.data, WorldEventData::CollectablePicked { .. }))
        .count() as u32;

    result.events = ctx.take_events();
    Ok(result)
}

/// Every live body, player first, must sit at a finite position.
fn check_body_positions(ctx: &GameContext) -> Result<(), PhysicsError> {
    let registry = &ctx.registry;
    let bodies = std::iter::once(registry.player().body()).chain(
        ObjectCategory::UPDATE_ORDER
            .into_iter()
            .flat_map(move |category| registry.objects(category).map(|object| object.body())),
    );

    for handle in bodies {
        match ctx.physics.position(handle) {
            Some(position) if !position.is_finite() => {
                return Err(PhysicsError::NonFinitePosition { handle, position });
            }
            _ => {}
        }
    }
    Ok(())
}
