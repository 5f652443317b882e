use rapier2d::prelude::*;

use super::contact::{ContactEvent, ContactForce, ContactQueue, PreSolveFilter, PreSolveGate};

/// Handle to identify rigid bodies
pub type RigidBodyHandle = rapier2d::prelude::RigidBodyHandle;

/// Handle to identify colliders
pub type ColliderHandle = rapier2d::prelude::ColliderHandle;

/// Physics world that manages all physics simulation
pub struct PhysicsWorld {
    /// Gravity vector (default: -9.81 m/s² in y-axis)
    gravity: Vector<Real>,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Physics pipeline handles collision detection and solving
    physics_pipeline: PhysicsPipeline,

    /// Island manager for sleeping bodies
    island_manager: IslandManager,

    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,

    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,

    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver for fast-moving objects
    ccd_solver: CCDSolver,

    /// Query pipeline for raycasts and shape casts
    query_pipeline: QueryPipeline,

    /// Rigid body set
    rigid_body_set: RigidBodySet,

    /// Collider set
    collider_set: ColliderSet,

    /// Contact event sink filled during each step
    contact_queue: ContactQueue,
}

impl PhysicsWorld {
    /// Create a new physics world with default settings
    pub fn new() -> Self {
        Self::with_gravity(vector![0.0, -9.81])
    }

    /// Create a new physics world with custom gravity
    pub fn with_gravity(gravity: Vector<Real>) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        // Fixed timestep of 1/60 seconds (60 FPS)
        integration_parameters.dt = 1.0 / 60.0;

        Self {
            gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            contact_queue: ContactQueue::new(),
        }
    }

    /// Step the physics simulation forward by one timestep
    pub fn step(&mut self) {
        self.step_inner(&());
    }

    /// Step the simulation, consulting a pre-solve filter for each contact pair
    pub fn step_with_filter(&mut self, filter: &dyn PreSolveFilter) {
        let gate = PreSolveGate::new(filter);
        self.step_inner(&gate);
    }

    fn step_inner(&mut self, hooks: &dyn PhysicsHooks) {
        // Clear previous frame's contact events
        self.contact_queue.clear();

        let event_handler = &self.contact_queue;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            hooks,
            event_handler,
        );
    }

    /// Take the begin/end contact events recorded by the last step
    pub fn drain_contact_events(&self) -> Vec<ContactEvent> {
        self.contact_queue.drain_events()
    }

    /// Take the post-solve force reports recorded by the last step
    pub fn drain_contact_forces(&self) -> Vec<ContactForce> {
        self.contact_queue.drain_forces()
    }

    /// Add a rigid body to the physics world
    pub fn add_rigid_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.rigid_body_set.insert(body)
    }

    /// Add a collider attached to a rigid body
    pub fn add_collider(
        &mut self,
        collider: Collider,
        parent_handle: RigidBodyHandle,
    ) -> ColliderHandle {
        self.collider_set
            .insert_with_parent(collider, parent_handle, &mut self.rigid_body_set)
    }

    /// Remove a rigid body and all its attached colliders
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        );
    }

    /// Remove a collider from the physics world
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true, // wake up attached body
        );
    }

    /// Get a reference to a rigid body
    pub fn get_rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Get a mutable reference to a rigid body
    pub fn get_rigid_body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// Get a reference to a collider
    pub fn get_collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.collider_set.get(handle)
    }

    /// Get a mutable reference to a collider
    pub fn get_collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.collider_set.get_mut(handle)
    }

    /// The rigid body a collider is attached to, if any
    pub fn body_of_collider(&self, handle: ColliderHandle) -> Option<RigidBodyHandle> {
        self.collider_set.get(handle).and_then(|c| c.parent())
    }

    /// Whether a body handle refers to a live body
    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Set gravity for the physics world
    pub fn set_gravity(&mut self, gravity: Vector<Real>) {
        self.gravity = gravity;
    }

    /// Get current gravity
    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    /// Set the timestep for physics simulation
    pub fn set_timestep(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
    }

    /// Get the current timestep
    pub fn timestep(&self) -> Real {
        self.integration_parameters.dt
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::body::{BodyBuilder, ColliderBuilder2D};
    use super::*;

    #[test]
    fn test_add_and_remove_body() {
        let mut world = PhysicsWorld::new();
        let body = BodyBuilder::new_dynamic().position(1.0, 2.0).build();
        let handle = world.add_rigid_body(body);

        assert!(world.contains_body(handle));
        assert_eq!(world.get_rigid_body(handle).unwrap().translation().x, 1.0);

        world.remove_rigid_body(handle);
        assert!(!world.contains_body(handle));
        assert!(world.get_rigid_body(handle).is_none());
    }

    #[test]
    fn test_collider_parent_lookup() {
        let mut world = PhysicsWorld::new();
        let body = BodyBuilder::new_dynamic().build();
        let body_handle = world.add_rigid_body(body);
        let collider = ColliderBuilder2D::ball(0.5).build();
        let collider_handle = world.add_collider(collider, body_handle);

        assert_eq!(world.body_of_collider(collider_handle), Some(body_handle));

        world.remove_collider(collider_handle);
        assert_eq!(world.body_of_collider(collider_handle), None);
        // Body survives collider removal
        assert!(world.contains_body(body_handle));
    }

    #[test]
    fn test_removing_body_removes_colliders() {
        let mut world = PhysicsWorld::new();
        let body = BodyBuilder::new_dynamic().build();
        let body_handle = world.add_rigid_body(body);
        let collider_handle = world.add_collider(ColliderBuilder2D::ball(0.5).build(), body_handle);

        world.remove_rigid_body(body_handle);
        assert!(world.get_collider(collider_handle).is_none());
    }

    #[test]
    fn test_gravity_accessors() {
        let mut world = PhysicsWorld::with_gravity(vector![0.0, 0.0]);
        assert_eq!(world.gravity(), vector![0.0, 0.0]);

        world.set_gravity(vector![0.0, -9.81]);
        assert_eq!(world.gravity().y, -9.81);
    }

    #[test]
    fn test_zero_gravity_body_stays_put() {
        let mut world = PhysicsWorld::with_gravity(vector![0.0, 0.0]);
        let body = BodyBuilder::new_dynamic().position(3.0, 4.0).build();
        let handle = world.add_rigid_body(body);
        world.add_collider(ColliderBuilder2D::ball(0.5).build(), handle);

        for _ in 0..10 {
            world.step();
        }

        let body = world.get_rigid_body(handle).unwrap();
        assert!((body.translation().x - 3.0).abs() < 1e-6);
        assert!((body.translation().y - 4.0).abs() < 1e-6);
    }
}
