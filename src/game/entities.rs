//! Collectables, Projectiles and Particles
//!
//! The non-character objects. All three ride on kinematic bodies: they move
//! at a set velocity and are never pushed by impulses.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::events::WorldEvent;
use crate::game::object::{
    DrawInfo, FrameContext, GameObject, MarkerKind, MinimapMarker, ObjectCategory, ObjectCore,
    ObjectError, ObjectId,
};
use crate::game::physics::{BodyDesc, BodyHandle, PhysicsWorld};

/// Side length of a collectable.
pub const COLLECTABLE_SIZE: f32 = 2.0;

/// Spin rate of a collectable (radians per second).
pub const COLLECTABLE_SPIN: f32 = 5.0;

/// Particles released when a collectable is picked up.
pub const PICKUP_BURST_PARTICLES: u32 = 6;

// =============================================================================
// COLLECTABLE
// =============================================================================

/// A pickup. Picked when the player comes within `pickup_radius`.
pub struct Collectable {
    core: ObjectCore,
    pickup_radius: f32,
    picked: bool,
}

impl Collectable {
    /// Create a spinning collectable at `position`.
    pub fn new(id: ObjectId, physics: &mut dyn PhysicsWorld, position: Vec2, pickup_radius: f32) -> Self {
        let body = physics.create_body(
            BodyDesc::kinematic(position, Vec2::ZERO, COLLECTABLE_SIZE / 2.0).with_spin(COLLECTABLE_SPIN),
        );
        Self {
            core: ObjectCore::new(id, body),
            pickup_radius,
            picked: false,
        }
    }

    /// Has the player picked this up?
    pub fn is_picked(&self) -> bool {
        self.picked
    }
}

impl GameObject for Collectable {
    fn id(&self) -> ObjectId {
        self.core.id
    }

    fn body(&self) -> BodyHandle {
        self.core.body
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _dt: f32) -> Result<(), ObjectError> {
        let position = self.core.position(ctx.physics)?;
        if position.distance_squared(ctx.player_position) <= self.pickup_radius * self.pickup_radius {
            self.picked = true;
            self.core.should_be_killed = true;
        }
        Ok(())
    }

    fn should_be_killed(&self) -> bool {
        self.core.should_be_killed
    }

    fn mark_for_removal(&mut self) {
        self.core.should_be_killed = true;
    }

    fn on_killed(&mut self, ctx: &mut FrameContext<'_>) {
        if self.picked {
            if let Some(position) = ctx.physics.position(self.core.body) {
                ctx.emit(WorldEvent::collectable_picked(ctx.frame, self.core.id, position));
                spawn_particle_burst(ctx, position, PICKUP_BURST_PARTICLES);
            }
        }
        ctx.physics.remove_body(self.core.body);
    }

    fn draw_info(&self, physics: &dyn PhysicsWorld) -> Option<DrawInfo> {
        Some(DrawInfo {
            sprite: "Objects/Collectable".to_string(),
            frame: 0,
            position: physics.position(self.core.body)?,
            rotation: physics.rotation(self.core.body).unwrap_or(0.0),
            alpha: 1.0,
        })
    }

    fn minimap_marker(&self, physics: &dyn PhysicsWorld) -> Option<MinimapMarker> {
        Some(MinimapMarker {
            kind: MarkerKind::Collectable,
            position: physics.position(self.core.body)?,
            size: COLLECTABLE_SIZE,
        })
    }
}

// =============================================================================
// PROJECTILE
// =============================================================================

/// Projectile tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Travel speed
    pub speed: f32,
    /// Seconds before the shot expires
    pub lifetime: f32,
    /// Body radius
    pub radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            lifetime: 1.5,
            radius: 0.25,
        }
    }
}

/// A shot. Dies when its lifetime runs out or it leaves the level.
pub struct Projectile {
    core: ObjectCore,
    owner: ObjectId,
    remaining: f32,
}

impl Projectile {
    /// Create a projectile moving along `direction` (unit vector).
    pub fn new(
        id: ObjectId,
        owner: ObjectId,
        physics: &mut dyn PhysicsWorld,
        origin: Vec2,
        direction: Vec2,
        config: &ProjectileConfig,
    ) -> Self {
        let body = physics.create_body(BodyDesc::kinematic(
            origin,
            direction.scale(config.speed),
            config.radius,
        ));
        Self {
            core: ObjectCore::new(id, body),
            owner,
            remaining: config.lifetime,
        }
    }

    /// Object that fired this projectile.
    pub fn owner(&self) -> ObjectId {
        self.owner
    }
}

impl GameObject for Projectile {
    fn id(&self) -> ObjectId {
        self.core.id
    }

    fn body(&self) -> BodyHandle {
        self.core.body
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) -> Result<(), ObjectError> {
        let position = self.core.position(ctx.physics)?;
        self.remaining -= dt;

        let (min, max) = ctx.map.world_bounds();
        let outside = position.x < min.x || position.y < min.y || position.x > max.x || position.y > max.y;
        if self.remaining <= 0.0 || outside {
            self.core.should_be_killed = true;
        }
        Ok(())
    }

    fn should_be_killed(&self) -> bool {
        self.core.should_be_killed
    }

    fn mark_for_removal(&mut self) {
        self.core.should_be_killed = true;
    }

    fn draw_info(&self, physics: &dyn PhysicsWorld) -> Option<DrawInfo> {
        let velocity = physics.velocity(self.core.body)?;
        Some(DrawInfo {
            sprite: "Objects/Projectile".to_string(),
            frame: 0,
            position: physics.position(self.core.body)?,
            rotation: velocity.angle(),
            alpha: 1.0,
        })
    }
}

/// Fire a projectile from `origin` along `direction`; it joins the world at
/// the end of the frame.
pub fn spawn_projectile(
    ctx: &mut FrameContext<'_>,
    owner: ObjectId,
    origin: Vec2,
    direction: Vec2,
    config: &ProjectileConfig,
) -> ObjectId {
    let id = ctx.spawner.next_id();
    let projectile = Projectile::new(id, owner, ctx.physics, origin, direction, config);
    ctx.spawner.spawn(ObjectCategory::Projectile, Box::new(projectile));
    ctx.emit(WorldEvent::projectile_fired(ctx.frame, id, direction));
    id
}

// =============================================================================
// PARTICLE
// =============================================================================

/// A short-lived visual effect that fades out.
pub struct Particle {
    core: ObjectCore,
    lifetime: f32,
    remaining: f32,
}

impl Particle {
    /// Create a particle drifting with `velocity` for `lifetime` seconds.
    pub fn new(id: ObjectId, physics: &mut dyn PhysicsWorld, position: Vec2, velocity: Vec2, lifetime: f32) -> Self {
        let body = physics.create_body(BodyDesc::kinematic(position, velocity, 0.1));
        Self {
            core: ObjectCore::new(id, body),
            lifetime,
            remaining: lifetime,
        }
    }

    fn alpha(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.lifetime).clamp(0.0, 1.0)
    }
}

impl GameObject for Particle {
    fn id(&self) -> ObjectId {
        self.core.id
    }

    fn body(&self) -> BodyHandle {
        self.core.body
    }

    fn update(&mut self, _ctx: &mut FrameContext<'_>, dt: f32) -> Result<(), ObjectError> {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.core.should_be_killed = true;
        }
        Ok(())
    }

    fn should_be_killed(&self) -> bool {
        self.core.should_be_killed
    }

    fn mark_for_removal(&mut self) {
        self.core.should_be_killed = true;
    }

    fn draw_info(&self, physics: &dyn PhysicsWorld) -> Option<DrawInfo> {
        Some(DrawInfo {
            sprite: "Particles/Spark".to_string(),
            frame: 0,
            position: physics.position(self.core.body)?,
            rotation: 0.0,
            alpha: self.alpha(),
        })
    }
}

/// Queue `count` particles flying out from `position` in random directions.
pub fn spawn_particle_burst(ctx: &mut FrameContext<'_>, position: Vec2, count: u32) {
    for _ in 0..count {
        let velocity = ctx.rng.random_direction().scale(ctx.rng.next_range(2.0, 6.0));
        let lifetime = ctx.rng.next_range(0.3, 0.7);
        let id = ctx.spawner.next_id();
        let particle = Particle::new(id, ctx.physics, position, velocity, lifetime);
        ctx.spawner.spawn(ObjectCategory::Particle, Box::new(particle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::events::WorldEventData;
    use crate::game::input::InputFrame;
    use crate::game::map::{DoorDirections, TileGrid};
    use crate::game::object::Spawner;
    use crate::game::physics::SimplePhysics;

    struct Fixture {
        physics: SimplePhysics,
        map: TileGrid,
        rng: DeterministicRng,
        spawner: Spawner,
        events: Vec<WorldEvent>,
        input: InputFrame,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                physics: SimplePhysics::new(),
                map: TileGrid::new(2, 2, &[DoorDirections::ALL; 4], 10.0).unwrap(),
                rng: DeterministicRng::new(9),
                spawner: Spawner::new(),
                events: Vec::new(),
                input: InputFrame::new(),
            }
        }

        fn ctx(&mut self, player_position: Vec2) -> FrameContext<'_> {
            FrameContext {
                physics: &mut self.physics,
                input: &self.input,
                map: &self.map,
                rng: &mut self.rng,
                spawner: &mut self.spawner,
                events: &mut self.events,
                player_position,
                frame: 4,
            }
        }
    }

    #[test]
    fn test_collectable_picked_when_player_close() {
        let mut fx = Fixture::new();
        let mut item = Collectable::new(ObjectId(1), &mut fx.physics, Vec2::new(5.0, 5.0), 1.5);

        item.update(&mut fx.ctx(Vec2::new(9.0, 9.0)), 0.1).unwrap();
        assert!(!item.should_be_killed());

        item.update(&mut fx.ctx(Vec2::new(6.0, 5.0)), 0.1).unwrap();
        assert!(item.should_be_killed());
        assert!(item.is_picked());

        item.on_killed(&mut fx.ctx(Vec2::ZERO));
        assert_eq!(fx.physics.position(item.body()), None);
        assert_eq!(fx.spawner.pending_count(), PICKUP_BURST_PARTICLES as usize);
        assert!(matches!(
            fx.events[0].data,
            WorldEventData::CollectablePicked { id: ObjectId(1), .. }
        ));
    }

    #[test]
    fn test_collectable_spins() {
        let mut fx = Fixture::new();
        let item = Collectable::new(ObjectId(1), &mut fx.physics, Vec2::new(5.0, 5.0), 1.5);
        fx.physics.step(0.2).unwrap();
        let info = item.draw_info(&fx.physics).unwrap();
        assert!((info.rotation - 1.0).abs() < 1e-5);
        assert_eq!(info.position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_projectile_expires() {
        let mut fx = Fixture::new();
        let config = ProjectileConfig { speed: 1.0, lifetime: 0.25, radius: 0.1 };
        let mut shot = Projectile::new(ObjectId(2), ObjectId(0), &mut fx.physics, Vec2::new(10.0, 10.0), Vec2::RIGHT, &config);

        shot.update(&mut fx.ctx(Vec2::ZERO), 0.2).unwrap();
        assert!(!shot.should_be_killed());
        shot.update(&mut fx.ctx(Vec2::ZERO), 0.2).unwrap();
        assert!(shot.should_be_killed());
        assert_eq!(shot.owner(), ObjectId(0));
    }

    #[test]
    fn test_projectile_dies_outside_level() {
        let mut fx = Fixture::new();
        let config = ProjectileConfig { speed: 50.0, lifetime: 10.0, radius: 0.1 };
        let mut shot = Projectile::new(ObjectId(2), ObjectId(0), &mut fx.physics, Vec2::new(10.0, 10.0), Vec2::RIGHT, &config);

        fx.physics.step(0.5).unwrap();
        shot.update(&mut fx.ctx(Vec2::ZERO), 0.5).unwrap();
        assert!(shot.should_be_killed());
    }

    #[test]
    fn test_particle_fades_and_dies() {
        let mut fx = Fixture::new();
        let mut particle = Particle::new(ObjectId(3), &mut fx.physics, Vec2::ZERO, Vec2::ZERO, 1.0);
        particle.update(&mut fx.ctx(Vec2::ZERO), 0.5).unwrap();
        assert!((particle.draw_info(&fx.physics).unwrap().alpha - 0.5).abs() < 1e-6);
        particle.update(&mut fx.ctx(Vec2::ZERO), 0.6).unwrap();
        assert!(particle.should_be_killed());
    }
}
