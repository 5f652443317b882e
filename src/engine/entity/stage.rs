use log::{debug, info};
use std::collections::HashMap;

use crate::engine::frame::{FrameClock, FIXED_TIMESTEP};
use crate::engine::physics::{
    ColliderHandle, ContactEvent, ContactPairInfo, ContactResponse, PhysicsWorld, PreSolveFilter,
    Real, RigidBodyHandle, Vector,
};
use crate::engine::scene::SceneGraph;

use super::behavior::{EntityBehavior, EntityContact, EntityContext};
use super::linked::LinkedEntity;

/// Unique identifier for a live entity
pub type EntityId = u32;

struct EntitySlot {
    id: EntityId,
    entity: LinkedEntity,
    behavior: Box<dyn EntityBehavior>,
}

/// The world context owning the scene, the physics simulation, and every
/// live entity
///
/// Replaces ambient global state: multiple stages coexist without sharing
/// anything, which keeps tests hermetic. Entities are kept in spawn order;
/// an id appears at most once. The body→entity mapping is an explicit
/// side table so the physics engine never carries opaque back-references.
pub struct Stage {
    scene: SceneGraph,
    physics: PhysicsWorld,
    entities: Vec<EntitySlot>,
    body_to_entity: HashMap<RigidBodyHandle, EntityId>,
    next_id: EntityId,
}

impl Stage {
    /// Create a stage with default gravity
    pub fn new() -> Self {
        Self::with_physics(PhysicsWorld::new())
    }

    /// Create a stage with custom gravity
    pub fn with_gravity(gravity: Vector<Real>) -> Self {
        Self::with_physics(PhysicsWorld::with_gravity(gravity))
    }

    fn with_physics(physics: PhysicsWorld) -> Self {
        Self {
            scene: SceneGraph::new(),
            physics,
            entities: Vec::new(),
            body_to_entity: HashMap::new(),
            next_id: 0,
        }
    }

    /// Spawn an entity with a fresh transform node and an optional body
    ///
    /// The node is attached under the stage root. If a body is supplied,
    /// the stage records the body→entity mapping so contact events can be
    /// routed back to the entity.
    pub fn spawn(
        &mut self,
        behavior: Box<dyn EntityBehavior>,
        body: Option<RigidBodyHandle>,
    ) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;

        let node = self.scene.create_node();
        let root = self.scene.root();
        self.scene.attach(node, root);

        if let Some(handle) = body {
            self.body_to_entity.insert(handle, id);
        }

        self.entities.push(EntitySlot {
            id,
            entity: LinkedEntity::new(node, body),
            behavior,
        });

        debug!("spawned entity {} (body: {})", id, body.is_some());
        id
    }

    /// Destroy an entity and remove it from the stage
    ///
    /// Tolerant of unknown ids and double-despawn: both are no-ops.
    pub fn despawn(&mut self, id: EntityId) {
        let Some(pos) = self.entities.iter().position(|s| s.id == id) else {
            return;
        };

        let body = self.entities[pos].entity.body();
        {
            let slot = &mut self.entities[pos];
            slot.entity.destroy(&mut self.scene, &mut self.physics);
        }
        if let Some(handle) = body {
            self.body_to_entity.remove(&handle);
        }
        self.entities.remove(pos);

        info!("despawned entity {}", id);
    }

    /// Run every entity's per-frame update, in spawn order
    pub fn update(&mut self, dt: f32) {
        for i in 0..self.entities.len() {
            let slot = &mut self.entities[i];
            let mut ctx = EntityContext {
                scene: &mut self.scene,
                physics: &mut self.physics,
            };
            slot.behavior.update(&mut slot.entity, &mut ctx, dt);
        }
    }

    /// Step the physics simulation and dispatch contact hooks
    ///
    /// Pre-solve hooks are consulted during the step; begin/end contact
    /// and post-solve hooks fire afterwards from the drained event queue,
    /// so they are free to create or destroy bodies.
    pub fn step_physics(&mut self) {
        {
            let filter = StageFilter {
                entities: &self.entities,
                body_to_entity: &self.body_to_entity,
            };
            self.physics.step_with_filter(&filter);
        }

        let events = self.physics.drain_contact_events();
        let forces = self.physics.drain_contact_forces();

        for event in events {
            let (c1, c2) = event.colliders();
            let begin = matches!(event, ContactEvent::Started { .. });
            self.dispatch_contact(c1, c2, begin);
            self.dispatch_contact(c2, c1, begin);
        }

        for force in forces {
            self.dispatch_force(force.collider1, force.collider2, force.magnitude);
            self.dispatch_force(force.collider2, force.collider1, force.magnitude);
        }
    }

    /// Advance the stage by one wall-clock frame
    ///
    /// Runs as many fixed steps as the clock has accumulated, each a
    /// physics step followed by entity updates. Returns the step count.
    pub fn advance(&mut self, clock: &mut FrameClock) -> u32 {
        let steps = clock.begin_frame();
        for _ in 0..steps {
            self.step_physics();
            self.update(FIXED_TIMESTEP);
        }
        steps
    }

    /// Look up an entity
    pub fn get(&self, id: EntityId) -> Option<&LinkedEntity> {
        self.entities.iter().find(|s| s.id == id).map(|s| &s.entity)
    }

    /// Look up an entity mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut LinkedEntity> {
        self.entities
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| &mut s.entity)
    }

    /// Whether an entity is live on this stage
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|s| s.id == id)
    }

    /// The entity owning a rigid body, if any
    pub fn entity_of_body(&self, handle: RigidBodyHandle) -> Option<EntityId> {
        self.body_to_entity.get(&handle).copied()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the stage has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The stage's scene graph
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// The stage's scene graph, mutably
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// The stage's physics world
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// The stage's physics world, mutably
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    fn entity_of_collider(&self, collider: ColliderHandle) -> Option<EntityId> {
        let body = self.physics.body_of_collider(collider)?;
        self.body_to_entity.get(&body).copied()
    }

    fn dispatch_contact(&mut self, own: ColliderHandle, other: ColliderHandle, begin: bool) {
        let Some(id) = self.entity_of_collider(own) else {
            return;
        };
        let other_entity = self.entity_of_collider(other);
        let contact = EntityContact {
            own_collider: own,
            other_collider: other,
            other_entity,
        };

        let Some(pos) = self.entities.iter().position(|s| s.id == id) else {
            return;
        };
        let slot = &mut self.entities[pos];
        let mut ctx = EntityContext {
            scene: &mut self.scene,
            physics: &mut self.physics,
        };
        if begin {
            slot.behavior.on_begin_contact(&mut slot.entity, &mut ctx, &contact);
        } else {
            slot.behavior.on_end_contact(&mut slot.entity, &mut ctx, &contact);
        }
    }

    fn dispatch_force(&mut self, own: ColliderHandle, other: ColliderHandle, magnitude: Real) {
        let Some(id) = self.entity_of_collider(own) else {
            return;
        };
        let other_entity = self.entity_of_collider(other);
        let contact = EntityContact {
            own_collider: own,
            other_collider: other,
            other_entity,
        };

        let Some(pos) = self.entities.iter().position(|s| s.id == id) else {
            return;
        };
        let slot = &mut self.entities[pos];
        let mut ctx = EntityContext {
            scene: &mut self.scene,
            physics: &mut self.physics,
        };
        slot.behavior
            .on_post_solve(&mut slot.entity, &mut ctx, &contact, magnitude);
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes rapier's pre-solve consultation to the involved entities
///
/// If either side of the pair asks for suppression, the pair is dropped
/// from the solver.
struct StageFilter<'a> {
    entities: &'a [EntitySlot],
    body_to_entity: &'a HashMap<RigidBodyHandle, EntityId>,
}

impl PreSolveFilter for StageFilter<'_> {
    fn pre_solve(&self, contact: &ContactPairInfo) -> ContactResponse {
        for body in [contact.body1, contact.body2].into_iter().flatten() {
            let Some(&id) = self.body_to_entity.get(&body) else {
                continue;
            };
            let Some(slot) = self.entities.iter().find(|s| s.id == id) else {
                continue;
            };
            if slot.behavior.on_pre_solve(contact) == ContactResponse::Suppress {
                return ContactResponse::Suppress;
            }
        }
        ContactResponse::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entity::behavior::FollowBody;
    use crate::engine::physics::{BodyBuilder, ColliderBuilder2D};
    use approx::assert_relative_eq;
    use rapier2d::prelude::{nalgebra, vector};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts the contact hooks it receives
    struct CountContacts {
        begins: Rc<Cell<u32>>,
        ends: Rc<Cell<u32>>,
        post_solves: Rc<Cell<u32>>,
    }

    impl EntityBehavior for CountContacts {
        fn on_begin_contact(
            &mut self,
            _entity: &mut LinkedEntity,
            _ctx: &mut EntityContext<'_>,
            _contact: &EntityContact,
        ) {
            self.begins.set(self.begins.get() + 1);
        }

        fn on_end_contact(
            &mut self,
            _entity: &mut LinkedEntity,
            _ctx: &mut EntityContext<'_>,
            _contact: &EntityContact,
        ) {
            self.ends.set(self.ends.get() + 1);
        }

        fn on_post_solve(
            &mut self,
            _entity: &mut LinkedEntity,
            _ctx: &mut EntityContext<'_>,
            _contact: &EntityContact,
            _force: Real,
        ) {
            self.post_solves.set(self.post_solves.get() + 1);
        }
    }

    /// Refuses every collision response
    struct Ghost;

    impl EntityBehavior for Ghost {
        fn on_pre_solve(&self, _contact: &ContactPairInfo) -> ContactResponse {
            ContactResponse::Suppress
        }
    }

    fn spawn_ball(
        stage: &mut Stage,
        behavior: Box<dyn EntityBehavior>,
        x: f32,
        y: f32,
        configure: impl Fn(ColliderBuilder2D) -> ColliderBuilder2D,
    ) -> (EntityId, RigidBodyHandle) {
        let body = BodyBuilder::new_dynamic().position(x, y).build();
        let handle = stage.physics_mut().add_rigid_body(body);
        let collider = configure(ColliderBuilder2D::ball(0.5)).build();
        stage.physics_mut().add_collider(collider, handle);
        let id = stage.spawn(behavior, Some(handle));
        (id, handle)
    }

    #[test]
    fn test_spawn_registers_entity_and_body() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let (id, handle) = spawn_ball(&mut stage, Box::new(FollowBody), 0.0, 0.0, |c| c);

        assert!(stage.contains(id));
        assert_eq!(stage.len(), 1);
        assert_eq!(stage.entity_of_body(handle), Some(id));
        assert!(stage.get(id).unwrap().node().is_some());
    }

    #[test]
    fn test_spawn_ids_are_unique() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let a = stage.spawn(Box::new(FollowBody), None);
        let b = stage.spawn(Box::new(FollowBody), None);
        let c = stage.spawn(Box::new(FollowBody), None);

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(stage.len(), 3);
    }

    #[test]
    fn test_despawn_removes_entity_and_body() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let (id, handle) = spawn_ball(&mut stage, Box::new(FollowBody), 0.0, 0.0, |c| c);

        stage.despawn(id);

        assert!(!stage.contains(id));
        assert!(stage.is_empty());
        assert_eq!(stage.entity_of_body(handle), None);
        assert!(!stage.physics().contains_body(handle));
    }

    #[test]
    fn test_despawn_is_idempotent() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let (id, _) = spawn_ball(&mut stage, Box::new(FollowBody), 0.0, 0.0, |c| c);

        stage.despawn(id);
        stage.despawn(id);
        stage.despawn(9999);

        assert!(stage.is_empty());
    }

    #[test]
    fn test_update_syncs_transform_from_body() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let body = BodyBuilder::new_dynamic()
            .position_rotation(2.0, 3.0, 0.5)
            .build();
        let handle = stage.physics_mut().add_rigid_body(body);
        let id = stage.spawn(Box::new(FollowBody), Some(handle));

        stage.update(FIXED_TIMESTEP);

        let node = stage.get(id).unwrap().node().unwrap();
        let position = stage.scene().position(node).unwrap();
        assert_relative_eq!(position.x, 64.0);
        assert_relative_eq!(position.y, 96.0);
        assert_relative_eq!(stage.scene().rotation(node).unwrap(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_begin_and_end_contact_dispatch() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let begins = Rc::new(Cell::new(0));
        let ends = Rc::new(Cell::new(0));
        let post_solves = Rc::new(Cell::new(0));

        let counter = |begins: &Rc<Cell<u32>>, ends: &Rc<Cell<u32>>, posts: &Rc<Cell<u32>>| {
            Box::new(CountContacts {
                begins: Rc::clone(begins),
                ends: Rc::clone(ends),
                post_solves: Rc::clone(posts),
            })
        };

        // Two overlapping balls touch on the first step
        let (_, handle_a) = spawn_ball(
            &mut stage,
            counter(&begins, &ends, &post_solves),
            0.0,
            0.0,
            |c| c,
        );
        spawn_ball(
            &mut stage,
            counter(&begins, &ends, &post_solves),
            0.5,
            0.0,
            |c| c,
        );

        stage.step_physics();
        assert_eq!(begins.get(), 2, "both entities see the begin contact");

        // Teleport one ball far away; the pair separates
        stage
            .physics_mut()
            .get_rigid_body_mut(handle_a)
            .unwrap()
            .set_translation(vector![100.0, 0.0], true);
        stage.step_physics();

        assert_eq!(ends.get(), 2, "both entities see the end contact");
    }

    #[test]
    fn test_post_solve_dispatch_on_resting_contact() {
        let mut stage = Stage::new();
        let begins = Rc::new(Cell::new(0));
        let ends = Rc::new(Cell::new(0));
        let post_solves = Rc::new(Cell::new(0));

        // Static floor below a falling ball
        let floor = BodyBuilder::new_fixed().position(0.0, 0.0).build();
        let floor_handle = stage.physics_mut().add_rigid_body(floor);
        stage
            .physics_mut()
            .add_collider(ColliderBuilder2D::cuboid(4.0, 0.1).build(), floor_handle);

        spawn_ball(
            &mut stage,
            Box::new(CountContacts {
                begins,
                ends,
                post_solves: Rc::clone(&post_solves),
            }),
            0.0,
            0.7,
            |c| c.contact_force_events(),
        );

        for _ in 0..60 {
            stage.step_physics();
        }

        assert!(
            post_solves.get() > 0,
            "landing produces post-solve reports"
        );
    }

    #[test]
    fn test_pre_solve_suppression_lets_body_fall_through() {
        let mut stage = Stage::new();

        let floor = BodyBuilder::new_fixed().position(0.0, 0.0).build();
        let floor_handle = stage.physics_mut().add_rigid_body(floor);
        stage.physics_mut().add_collider(
            ColliderBuilder2D::cuboid(4.0, 0.1).pre_solve_filter().build(),
            floor_handle,
        );

        let (_, ball) = spawn_ball(&mut stage, Box::new(Ghost), 0.0, 1.0, |c| {
            c.pre_solve_filter()
        });

        for _ in 0..120 {
            stage.step_physics();
        }

        let y = stage
            .physics()
            .get_rigid_body(ball)
            .unwrap()
            .translation()
            .y;
        assert!(y < -1.0, "suppressed contact should not stop the fall, y = {}", y);
    }

    #[test]
    fn test_kept_contact_stops_fall() {
        let mut stage = Stage::new();

        let floor = BodyBuilder::new_fixed().position(0.0, 0.0).build();
        let floor_handle = stage.physics_mut().add_rigid_body(floor);
        stage
            .physics_mut()
            .add_collider(ColliderBuilder2D::cuboid(4.0, 0.1).build(), floor_handle);

        let (_, ball) = spawn_ball(&mut stage, Box::new(FollowBody), 0.0, 1.0, |c| c);

        for _ in 0..120 {
            stage.step_physics();
        }

        let y = stage
            .physics()
            .get_rigid_body(ball)
            .unwrap()
            .translation()
            .y;
        assert!(y > 0.3, "ball should rest on the floor, y = {}", y);
    }

    #[test]
    fn test_advance_runs_updates() {
        let mut stage = Stage::with_gravity(vector![0.0, 0.0]);
        let body = BodyBuilder::new_dynamic().position(1.0, 1.0).build();
        let handle = stage.physics_mut().add_rigid_body(body);
        let id = stage.spawn(Box::new(FollowBody), Some(handle));

        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let steps = stage.advance(&mut clock);

        if steps > 0 {
            let node = stage.get(id).unwrap().node().unwrap();
            let position = stage.scene().position(node).unwrap();
            assert_relative_eq!(position.x, 32.0);
        }
    }
}
