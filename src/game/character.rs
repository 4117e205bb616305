//! Characters
//!
//! Intelligent actors: the player and enemies. A character holds a movement
//! target and a facing target in world space. Each frame its controller
//! (input for the player, AI for enemies) chooses the targets, then the
//! shared movement step pushes the body toward the movement target with an
//! impulse proportional to the remaining offset.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::entities::{spawn_projectile, ProjectileConfig};
use crate::game::input::KeyInput;
use crate::game::object::{
    DrawInfo, FrameContext, GameObject, MarkerKind, MinimapMarker, ObjectCore, ObjectError,
    ObjectId,
};
use crate::game::physics::{BodyDesc, BodyHandle, PhysicsWorld};

/// Static description of a kind of character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterType {
    /// Sprite key prefix
    pub sprite_prefix: String,
    /// Animation frame count
    pub frame_count: u32,
    /// Seconds per animation loop
    pub animation_duration: f32,
    /// Impulse gain toward the movement target
    pub max_movement_force: f32,
    /// Body radius
    pub radius: f32,
    /// Body mass
    pub mass: f32,
    /// Linear damping applied by the physics world
    pub linear_damping: f32,
}

impl CharacterType {
    /// The player character.
    pub fn player() -> Self {
        Self {
            sprite_prefix: "Characters/MainCharacter".to_string(),
            frame_count: 8,
            animation_duration: 0.8,
            max_movement_force: 40.0,
            radius: 0.9,
            mass: 1.0,
            linear_damping: 8.0,
        }
    }

    /// The basic enemy.
    pub fn enemy() -> Self {
        Self {
            sprite_prefix: "Characters/Parasite".to_string(),
            frame_count: 6,
            animation_duration: 0.6,
            max_movement_force: 12.0,
            radius: 0.8,
            mass: 1.0,
            linear_damping: 6.0,
        }
    }

    fn body_desc(&self, position: Vec2) -> BodyDesc {
        BodyDesc::dynamic(position, self.radius, self.mass).with_damping(self.linear_damping)
    }
}

/// Impulse that moves a body at `position` toward `target`.
///
/// Proportional only: overshoot near the target is left to the physics
/// world's damping.
#[inline]
pub fn movement_impulse(max_movement_force: f32, target: Vec2, position: Vec2, dt: f32) -> Vec2 {
    (target - position).scale(max_movement_force * dt)
}

/// Targets chosen by a controller for this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementTargets {
    /// Point to move toward
    pub move_to: Vec2,
    /// Point to face
    pub face: Vec2,
}

/// Chooses a character's targets each frame.
pub trait TargetController {
    /// Decide targets for a character currently at `position`.
    fn decide(&mut self, id: ObjectId, position: Vec2, ctx: &mut FrameContext<'_>) -> MovementTargets;

    /// Minimap marker kind for characters driven by this controller.
    fn marker_kind(&self) -> MarkerKind;
}

/// Input-driven controller.
#[derive(Clone, Debug)]
pub struct PlayerController {
    /// Distance ahead of the player the movement target is placed at full tilt
    pub reach: f32,
    /// Shots fired on the fire key
    pub projectile: ProjectileConfig,
}

impl TargetController for PlayerController {
    fn decide(&mut self, id: ObjectId, position: Vec2, ctx: &mut FrameContext<'_>) -> MovementTargets {
        let face = ctx.input.pointer_world;

        if ctx.input.was_key_clicked(KeyInput::Fire) {
            let aim = (face - position).normalize();
            if aim != Vec2::ZERO {
                spawn_projectile(ctx, id, position, aim, &self.projectile);
            }
        }

        MovementTargets {
            move_to: position + ctx.input.move_direction().scale(self.reach),
            face,
        }
    }

    fn marker_kind(&self) -> MarkerKind {
        MarkerKind::Player
    }
}

/// Enemy controller: walk straight at the player.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeekPlayerController;

impl TargetController for SeekPlayerController {
    fn decide(&mut self, _id: ObjectId, _position: Vec2, ctx: &mut FrameContext<'_>) -> MovementTargets {
        MovementTargets {
            move_to: ctx.player_position,
            face: ctx.player_position,
        }
    }

    fn marker_kind(&self) -> MarkerKind {
        MarkerKind::Enemy
    }
}

/// A player or enemy.
pub struct Character {
    core: ObjectCore,
    kind: CharacterType,
    controller: Box<dyn TargetController>,
    move_target: Vec2,
    face_target: Vec2,
    facing: f32,
    animation_time: f32,
}

impl Character {
    /// Create a character with its own dynamic body.
    pub fn new(
        id: ObjectId,
        kind: CharacterType,
        controller: Box<dyn TargetController>,
        physics: &mut dyn PhysicsWorld,
        position: Vec2,
    ) -> Self {
        let body = physics.create_body(kind.body_desc(position));
        Self {
            core: ObjectCore::new(id, body),
            kind,
            controller,
            move_target: position,
            face_target: position,
            facing: 0.0,
            animation_time: 0.0,
        }
    }

    /// The input-driven player.
    pub fn player(
        id: ObjectId,
        kind: CharacterType,
        controller: PlayerController,
        physics: &mut dyn PhysicsWorld,
        position: Vec2,
    ) -> Self {
        Self::new(id, kind, Box::new(controller), physics, position)
    }

    /// An enemy that seeks the player.
    pub fn enemy(id: ObjectId, kind: CharacterType, physics: &mut dyn PhysicsWorld, position: Vec2) -> Self {
        Self::new(id, kind, Box::new(SeekPlayerController), physics, position)
    }

    /// Character type.
    pub fn kind(&self) -> &CharacterType {
        &self.kind
    }

    /// Current movement target.
    pub fn move_target(&self) -> Vec2 {
        self.move_target
    }

    /// Current facing target.
    pub fn face_target(&self) -> Vec2 {
        self.face_target
    }

    /// Facing angle in radians.
    pub fn facing(&self) -> f32 {
        self.facing
    }

    /// Current position.
    pub fn position(&self, physics: &dyn PhysicsWorld) -> Option<Vec2> {
        physics.position(self.core.body)
    }

    fn animation_frame(&self) -> u32 {
        if self.kind.frame_count == 0 || self.kind.animation_duration <= 0.0 {
            return 0;
        }
        let progress = (self.animation_time / self.kind.animation_duration).fract();
        ((progress * self.kind.frame_count as f32) as u32).min(self.kind.frame_count - 1)
    }
}

impl GameObject for Character {
    fn id(&self) -> ObjectId {
        self.core.id
    }

    fn body(&self) -> BodyHandle {
        self.core.body
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) -> Result<(), ObjectError> {
        let position = self.core.position(ctx.physics)?;

        let targets = self.controller.decide(self.core.id, position, ctx);
        self.move_target = targets.move_to;
        self.face_target = targets.face;

        let impulse = movement_impulse(self.kind.max_movement_force, self.move_target, position, dt);
        ctx.physics.apply_impulse(self.core.body, impulse);

        let to_face = self.face_target - position;
        if to_face.length_squared() > 0.0 {
            self.facing = to_face.angle();
        }
        self.animation_time += dt;
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
            sprite: self.kind.sprite_prefix.clone(),
            frame: self.animation_frame(),
            position: self.position(physics)?,
            rotation: self.facing,
            alpha: 1.0,
        })
    }

    fn minimap_marker(&self, physics: &dyn PhysicsWorld) -> Option<MinimapMarker> {
        Some(MinimapMarker {
            kind: self.controller.marker_kind(),
            position: self.position(physics)?,
            size: self.kind.radius * 2.0,
        })
    }
}
