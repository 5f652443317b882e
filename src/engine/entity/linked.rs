use glam::Vec3;
use log::debug;
use rapier2d::prelude::{nalgebra, vector, Isometry, RigidBody};

use crate::engine::physics::{PhysicsWorld, Real, RigidBodyHandle, Vector};
use crate::engine::scene::{NodeId, SceneGraph};

/// Conversion factor between physics meters and scene pixels
pub const PIXELS_PER_METER: f32 = 32.0;

/// An object pairing a visual transform node with an optional rigid body
///
/// The node is exclusively owned by the entity until [`destroy`] releases
/// it. Every operation tolerates absent handles: once destroyed (or when
/// constructed without a body), synchronization and velocity operations
/// degrade to no-ops instead of failing.
///
/// [`destroy`]: LinkedEntity::destroy
pub struct LinkedEntity {
    node: Option<NodeId>,
    body: Option<RigidBodyHandle>,
}

impl LinkedEntity {
    /// Link a scene node to an optional pre-existing body
    pub fn new(node: NodeId, body: Option<RigidBodyHandle>) -> Self {
        Self {
            node: Some(node),
            body,
        }
    }

    /// The entity's transform node, if not yet destroyed
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// The entity's rigid body, if any
    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }

    /// Copy the body's position and rotation into the transform node
    ///
    /// Physics coordinates are scaled by [`PIXELS_PER_METER`]; the node's
    /// z component (draw depth) is left untouched since the simulation is
    /// planar.
    pub fn sync_transform_to_body(&self, scene: &mut SceneGraph, physics: &PhysicsWorld) {
        let (Some(node), Some(handle)) = (self.node, self.body) else {
            return;
        };
        let Some(body) = physics.get_rigid_body(handle) else {
            return;
        };

        let translation = body.translation();
        let angle = body.rotation().angle();
        let depth = scene.position(node).map(|p| p.z).unwrap_or(0.0);

        scene.set_position(
            node,
            Vec3::new(
                translation.x * PIXELS_PER_METER,
                translation.y * PIXELS_PER_METER,
                depth,
            ),
        );
        scene.set_rotation(node, angle);
    }

    /// Copy the transform node's position and rotation into the body
    ///
    /// The inverse of [`sync_transform_to_body`]: scene coordinates are
    /// divided by the scale constant and written together with the angle
    /// as a single position update.
    ///
    /// [`sync_transform_to_body`]: LinkedEntity::sync_transform_to_body
    pub fn sync_body_to_transform(&self, scene: &SceneGraph, physics: &mut PhysicsWorld) {
        let (Some(node), Some(handle)) = (self.node, self.body) else {
            return;
        };
        let Some(position) = scene.position(node) else {
            return;
        };
        let angle = scene.rotation(node).unwrap_or(0.0);
        let Some(body) = physics.get_rigid_body_mut(handle) else {
            return;
        };

        body.set_position(
            Isometry::new(
                vector![
                    position.x / PIXELS_PER_METER,
                    position.y / PIXELS_PER_METER
                ],
                angle,
            ),
            true,
        );
    }

    /// Apply an impulse at the center of mass, capping the resulting speed
    ///
    /// The cap floor is the speed the body already had: a body moving
    /// faster than `max_speed` before the impulse is never slowed down,
    /// the impulse just cannot accelerate it further. A zero impulse is a
    /// no-op.
    pub fn apply_impulse_capped(
        &self,
        physics: &mut PhysicsWorld,
        impulse: Vector<Real>,
        max_speed: Real,
    ) {
        if impulse.x == 0.0 && impulse.y == 0.0 {
            return;
        }
        let Some(handle) = self.body else {
            return;
        };
        let Some(body) = physics.get_rigid_body_mut(handle) else {
            return;
        };

        let speed_before = body.linvel().norm();
        body.apply_impulse(impulse, true);
        clamp_speed(body, max_speed.max(speed_before));
    }

    /// Rescale the body's velocity to `max_speed` if it exceeds it
    ///
    /// Direction is preserved; a zero or already-capped velocity is left
    /// unchanged.
    pub fn limit_speed(&self, physics: &mut PhysicsWorld, max_speed: Real) {
        let Some(handle) = self.body else {
            return;
        };
        let Some(body) = physics.get_rigid_body_mut(handle) else {
            return;
        };
        clamp_speed(body, max_speed);
    }

    /// Release the transform node and destroy the body
    ///
    /// Safe to call multiple times; subsequent synchronization calls
    /// become no-ops.
    pub fn destroy(&mut self, scene: &mut SceneGraph, physics: &mut PhysicsWorld) {
        if let Some(node) = self.node.take() {
            if scene.is_attached(node) {
                scene.detach(node);
            }
            scene.remove(node);
            debug!("released scene node {:?}", node);
        }
        self.destroy_body(physics);
    }

    /// Destroy the body in the physics world and clear the local handle
    ///
    /// No-op if the entity has no body.
    pub fn destroy_body(&mut self, physics: &mut PhysicsWorld) {
        if let Some(handle) = self.body.take() {
            physics.remove_rigid_body(handle);
            debug!("destroyed body {:?}", handle);
        }
    }
}

/// Rescale a body's linear velocity down to `cap`, preserving direction
fn clamp_speed(body: &mut RigidBody, cap: Real) {
    let velocity = *body.linvel();
    let speed = velocity.norm();
    if speed > cap {
        body.set_linvel(velocity * (cap / speed), true);
    }
}
