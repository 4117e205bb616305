//! Object Registry
//!
//! Owns every live object, grouped by category, plus the player. The frame
//! loop drives it in two passes:
//!
//! - [`ObjectRegistry::update_all`]: projectiles, particles, collectables,
//!   enemies, then the player. A failing object is logged, reported and
//!   marked for removal; the rest of the frame carries on.
//! - [`ObjectRegistry::cull`]: every flagged object gets `on_killed` once and
//!   is dropped. Survivors keep their relative order.
//!
//! Objects spawned mid-frame wait in the [`Spawner`] and are appended after
//! the cull, so no collection changes while it is being walked.

use tracing::warn;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::game::character::Character;
use crate::game::events::WorldEvent;
use crate::game::object::{FrameContext, GameObject, ObjectCategory, ObjectId, Spawner};
use crate::game::physics::PhysicsWorld;

type Collection = Vec<Box<dyn GameObject>>;

/// Live objects of a level.
pub struct ObjectRegistry {
    projectiles: Collection,
    particles: Collection,
    collectables: Collection,
    enemies: Collection,
    player: Character,
    /// Ids culled since the last `append_spawned`
    culled: Vec<ObjectId>,
}

impl ObjectRegistry {
    /// Create a registry holding only the player.
    pub fn new(player: Character) -> Self {
        Self {
            projectiles: Vec::new(),
            particles: Vec::new(),
            collectables: Vec::new(),
            enemies: Vec::new(),
            player,
            culled: Vec::new(),
        }
    }

    /// The player.
    pub fn player(&self) -> &Character {
        &self.player
    }

    /// Objects of one category, in update order.
    pub fn objects(&self, category: ObjectCategory) -> impl Iterator<Item = &(dyn GameObject + 'static)> {
        self.collection(category).iter().map(|o| o.as_ref())
    }

    /// Number of live objects in a category.
    pub fn count(&self, category: ObjectCategory) -> usize {
        self.collection(category).len()
    }

    /// Number of live objects, player included.
    pub fn len(&self) -> usize {
        ObjectCategory::UPDATE_ORDER
            .iter()
            .map(|c| self.count(*c))
            .sum::<usize>()
            + 1
    }

    /// A registry always holds the player.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Add an object to the end of its collection.
    pub fn insert(&mut self, category: ObjectCategory, object: Box<dyn GameObject>) {
        debug_assert!(
            !self.culled.contains(&object.id()),
            "object {:?} inserted after being culled",
            object.id()
        );
        self.collection_mut(category).push(object);
    }

    /// Move every queued spawn into its collection. Returns how many.
    ///
    /// Closes the frame's cull bookkeeping.
    pub fn append_spawned(&mut self, spawner: &mut Spawner) -> usize {
        let spawned = spawner.drain();
        let count = spawned.len();
        for (category, object) in spawned {
            self.insert(category, object);
        }
        self.culled.clear();
        count
    }

    /// Update every live object once, categories first, player last.
    pub fn update_all(&mut self, ctx: &mut FrameContext<'_>, dt: f32) {
        for category in ObjectCategory::UPDATE_ORDER {
            for object in self.collection_mut(category).iter_mut() {
                update_isolated(object.as_mut(), ctx, dt);
            }
        }

        #[cfg(feature = "debug-tracing")]
        trace!("Updating player {:?}", self.player.id());

        // The player is never culled; a failed update only costs it a frame
        if let Err(err) = self.player.update(ctx, dt) {
            warn!("Player update failed: {}", err);
            let frame = ctx.frame;
            ctx.emit(WorldEvent::object_update_failed(frame, self.player.id(), err.to_string()));
        }
    }

    /// Remove every object whose kill flag is set. Returns how many went.
    pub fn cull(&mut self, ctx: &mut FrameContext<'_>) -> usize {
        let Self {
            projectiles,
            particles,
            collectables,
            enemies,
            culled: culled_ids,
            ..
        } = self;

        let collections = [
            (ObjectCategory::Projectile, projectiles),
            (ObjectCategory::Particle, particles),
            (ObjectCategory::Collectable, collectables),
            (ObjectCategory::Enemy, enemies),
        ];

        let frame = ctx.frame;
        let mut culled = 0;
        for (category, collection) in collections {
            collection.retain_mut(|object| {
                if !object.should_be_killed() {
                    return true;
                }
                let id = object.id();
                let first_time = !culled_ids.contains(&id);
                debug_assert!(first_time, "object {:?} culled twice", id);
                if first_time {
                    culled_ids.push(id);
                    object.on_killed(ctx);
                    ctx.emit(WorldEvent::object_culled(frame, id, category));
                    culled += 1;
                }
                false
            });
        }
        culled
    }

    /// Tear down the level: `on_cleared` for every live object, player included.
    pub fn clear_all(&mut self, physics: &mut dyn PhysicsWorld) {
        for category in ObjectCategory::UPDATE_ORDER {
            for mut object in self.collection_mut(category).drain(..) {
                object.on_cleared(physics);
            }
        }
        self.player.on_cleared(physics);
        self.culled.clear();
    }

    fn collection(&self, category: ObjectCategory) -> &Collection {
        match category {
            ObjectCategory::Projectile => &self.projectiles,
            ObjectCategory::Particle => &self.particles,
            ObjectCategory::Collectable => &self.collectables,
            ObjectCategory::Enemy => &self.enemies,
        }
    }

    fn collection_mut(&mut self, category: ObjectCategory) -> &mut Collection {
        match category {
            ObjectCategory::Projectile => &mut self.projectiles,
            ObjectCategory::Particle => &mut self.particles,
            ObjectCategory::Collectable => &mut self.collectables,
            ObjectCategory::Enemy => &mut self.enemies,
        }
    }
}

/// Update one object; on failure log it, report it and flag it for removal.
fn update_isolated(object: &mut dyn GameObject, ctx: &mut FrameContext<'_>, dt: f32) {
    #[cfg(feature = "debug-tracing")]
    trace!("Updating object {:?}", object.id());

    if let Err(err) = object.update(ctx, dt) {
        warn!("Object {:?} update failed, removing it: {}", object.id(), err);
        let frame = ctx.frame;
        ctx.emit(WorldEvent::object_update_failed(frame, object.id(), err.to_string()));
        object.mark_for_removal();
    }
}
