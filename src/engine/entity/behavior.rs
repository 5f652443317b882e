use crate::engine::physics::{
    ColliderHandle, ContactPairInfo, ContactResponse, PhysicsWorld, Real,
};
use crate::engine::scene::SceneGraph;

use super::linked::LinkedEntity;
use super::stage::EntityId;

/// Mutable world access handed to entity hooks
///
/// Hooks run outside the physics step, so destroying bodies or reshaping
/// the scene from here is safe.
pub struct EntityContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub physics: &'a mut PhysicsWorld,
}

/// A contact notification resolved to one entity's point of view
#[derive(Debug, Clone, Copy)]
pub struct EntityContact {
    /// The collider belonging to the notified entity
    pub own_collider: ColliderHandle,
    /// The collider on the other side of the contact
    pub other_collider: ColliderHandle,
    /// The entity owning the other collider, when there is one
    pub other_entity: Option<EntityId>,
}

/// Per-entity logic: frame updates and contact hooks
///
/// Every method has a default, so implementors override only what they
/// need. The default `update` keeps the visual transform glued to the
/// body each frame.
///
/// `on_pre_solve` is the exception to the mutable-context rule: it is
/// consulted from inside the physics step, receives `&self` only, and its
/// sole power is to keep or suppress the pair's collision response.
pub trait EntityBehavior {
    /// Per-frame hook, called once per fixed update
    fn update(&mut self, entity: &mut LinkedEntity, ctx: &mut EntityContext<'_>, dt: f32) {
        let _ = dt;
        entity.sync_transform_to_body(ctx.scene, ctx.physics);
    }

    /// Two colliders started touching, one of them ours
    fn on_begin_contact(
        &mut self,
        _entity: &mut LinkedEntity,
        _ctx: &mut EntityContext<'_>,
        _contact: &EntityContact,
    ) {
    }

    /// Two colliders stopped touching, one of them ours
    fn on_end_contact(
        &mut self,
        _entity: &mut LinkedEntity,
        _ctx: &mut EntityContext<'_>,
        _contact: &EntityContact,
    ) {
    }

    /// Decide whether a contact pair reaches the solver this step
    fn on_pre_solve(&self, _contact: &ContactPairInfo) -> ContactResponse {
        ContactResponse::Keep
    }

    /// Solver finished a contact pair involving us; `force` is the total
    /// force magnitude applied across the pair's contact points
    fn on_post_solve(
        &mut self,
        _entity: &mut LinkedEntity,
        _ctx: &mut EntityContext<'_>,
        _contact: &EntityContact,
        _force: Real,
    ) {
    }
}

/// The do-nothing behavior: the entity just follows its body
pub struct FollowBody;

impl EntityBehavior for FollowBody {}
