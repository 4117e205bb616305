//! Physics Boundary
//!
//! The rigid-body simulator is external: the frame loop only steps it,
//! pushes impulses into it and reads positions back. [`PhysicsWorld`] is that
//! seam. [`SimplePhysics`] is a small reference integrator (explicit Euler,
//! linear damping, no collisions) used by the demo runner and the tests.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;

/// Opaque handle to a body owned by the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How a body is driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Moved by impulses, damped by the world
    Dynamic,
    /// Moves at its set velocity; ignores impulses
    Kinematic,
}

/// Parameters for a new body.
#[derive(Clone, Copy, Debug)]
pub struct BodyDesc {
    /// Initial position
    pub position: Vec2,
    /// Initial linear velocity
    pub velocity: Vec2,
    /// Body type
    pub body_type: BodyType,
    /// Mass (dynamic bodies only)
    pub mass: f32,
    /// Collision radius, reported back to callers
    pub radius: f32,
    /// Linear damping coefficient
    pub linear_damping: f32,
    /// Spin rate in radians per second
    pub angular_velocity: f32,
}

impl BodyDesc {
    /// Dynamic body at `position`.
    pub fn dynamic(position: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            body_type: BodyType::Dynamic,
            mass,
            radius,
            linear_damping: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// Kinematic body at `position` moving with `velocity`.
    pub fn kinematic(position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity,
            body_type: BodyType::Kinematic,
            mass: 1.0,
            radius,
            linear_damping: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// Set linear damping.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set spin rate.
    pub fn with_spin(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }
}

/// Failure inside the physics world. Not recoverable locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Step length was negative or not finite
    #[error("invalid step length {0}")]
    InvalidStep(f32),

    /// A body ended the step at a NaN or infinite position
    #[error("body {handle:?} has non-finite position {position}")]
    NonFinitePosition {
        /// Offending body
        handle: BodyHandle,
        /// Its position after the step
        position: Vec2,
    },

    /// Body created with a mass that cannot be inverted
    #[error("body {0:?} is degenerate (mass must be positive and finite)")]
    DegenerateBody(BodyHandle),
}

/// The rigid-body simulator as seen by the frame loop.
pub trait PhysicsWorld {
    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32) -> Result<(), PhysicsError>;

    /// Create a body and return its handle.
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Remove a body. Returns false if it did not exist.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Apply a linear impulse to a dynamic body.
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2);

    /// Current position.
    fn position(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Current linear velocity.
    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Current rotation in radians.
    fn rotation(&self, handle: BodyHandle) -> Option<f32>;

    /// Body type.
    fn body_type(&self, handle: BodyHandle) -> Option<BodyType>;

    /// Number of live bodies.
    fn body_count(&self) -> usize;
}

#[derive(Clone, Debug)]
struct Body {
    desc: BodyDesc,
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
}

/// Reference integrator with zero gravity (top-down).
#[derive(Clone, Debug, Default)]
pub struct SimplePhysics {
    /// BTreeMap so stepping order is stable
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: u32,
}

impl SimplePhysics {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhysicsWorld for SimplePhysics {
    fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidStep(dt));
        }

        // Integrate into a scratch buffer; commit only if every body is valid
        let mut stepped = Vec::with_capacity(self.bodies.len());
        for (handle, body) in &self.bodies {
            let mut velocity = body.velocity;
            if body.desc.body_type == BodyType::Dynamic {
                if !(body.desc.mass.is_finite() && body.desc.mass > 0.0) {
                    return Err(PhysicsError::DegenerateBody(*handle));
                }
                // Same damping form as Box2D/Farseer: v *= 1 / (1 + dt * c)
                velocity = velocity.scale(1.0 / (1.0 + dt * body.desc.linear_damping));
            }

            let position = body.position + velocity.scale(dt);
            if !position.is_finite() {
                return Err(PhysicsError::NonFinitePosition {
                    handle: *handle,
                    position,
                });
            }
            stepped.push((position, velocity, body.rotation + body.desc.angular_velocity * dt));
        }

        for (body, (position, velocity, rotation)) in self.bodies.values_mut().zip(stepped) {
            body.position = position;
            body.velocity = velocity;
            body.rotation = rotation;
        }
        Ok(())
    }

    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                desc,
                position: desc.position,
                velocity: desc.velocity,
                rotation: 0.0,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(&handle).is_some()
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if body.desc.body_type == BodyType::Dynamic && body.desc.mass > 0.0 {
                body.velocity += impulse.scale(1.0 / body.desc.mass);
            }
        }
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.velocity)
    }

    fn rotation(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.rotation)
    }

    fn body_type(&self, handle: BodyHandle) -> Option<BodyType> {
        self.bodies.get(&handle).map(|b| b.desc.body_type)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_moves_dynamic_body() {
        let mut world = SimplePhysics::new();
        let body = world.create_body(BodyDesc::dynamic(Vec2::ZERO, 1.0, 2.0));

        world.apply_impulse(body, Vec2::new(4.0, 0.0));
        assert_eq!(world.velocity(body), Some(Vec2::new(2.0, 0.0)));

        world.step(0.5).unwrap();
        assert_eq!(world.position(body), Some(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_kinematic_ignores_impulse_and_spins() {
        let mut world = SimplePhysics::new();
        let body = world.create_body(
            BodyDesc::kinematic(Vec2::ZERO, Vec2::new(0.0, 2.0), 1.0).with_spin(5.0),
        );

        world.apply_impulse(body, Vec2::new(100.0, 0.0));
        world.step(1.0).unwrap();

        assert_eq!(world.position(body), Some(Vec2::new(0.0, 2.0)));
        assert_eq!(world.rotation(body), Some(5.0));
        assert_eq!(world.body_type(body), Some(BodyType::Kinematic));
    }

    #[test]
    fn test_damping_slows_body() {
        let mut world = SimplePhysics::new();
        let body = world.create_body(BodyDesc::dynamic(Vec2::ZERO, 1.0, 1.0).with_damping(1.0));
        world.apply_impulse(body, Vec2::new(2.0, 0.0));
        world.step(1.0).unwrap();
        assert_eq!(world.velocity(body), Some(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_non_finite_position_is_reported() {
        let mut world = SimplePhysics::new();
        let body = world.create_body(BodyDesc::dynamic(Vec2::ZERO, 1.0, 1.0));
        world.apply_impulse(body, Vec2::new(f32::INFINITY, 0.0));

        let err = world.step(0.1).unwrap_err();
        assert!(matches!(err, PhysicsError::NonFinitePosition { handle, .. } if handle == body));
    }

    #[test]
    fn test_failed_step_moves_nothing() {
        let mut world = SimplePhysics::new();
        let mover = world.create_body(BodyDesc::kinematic(Vec2::ZERO, Vec2::new(1.0, 0.0), 1.0));
        let broken = world.create_body(BodyDesc::dynamic(Vec2::new(5.0, 5.0), 1.0, 1.0));
        world.apply_impulse(broken, Vec2::new(f32::INFINITY, 0.0));

        assert!(world.step(1.0).is_err());
        assert_eq!(world.position(mover), Some(Vec2::ZERO));
        assert_eq!(world.position(broken), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_invalid_step_and_degenerate_body() {
        let mut world = SimplePhysics::new();
        assert_eq!(world.step(-1.0), Err(PhysicsError::InvalidStep(-1.0)));

        let body = world.create_body(BodyDesc::dynamic(Vec2::ZERO, 1.0, 0.0));
        assert_eq!(world.step(0.1), Err(PhysicsError::DegenerateBody(body)));
    }

    #[test]
    fn test_remove_body() {
        let mut world = SimplePhysics::new();
        let body = world.create_body(BodyDesc::dynamic(Vec2::ZERO, 1.0, 1.0));
        assert_eq!(world.body_count(), 1);
        assert!(world.remove_body(body));
        assert!(!world.remove_body(body));
        assert_eq!(world.position(body), None);
    }
}
