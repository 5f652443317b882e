use rapier2d::prelude::*;
use std::sync::{Arc, Mutex};

/// A begin/end contact notification between two colliders
#[derive(Debug, Clone, Copy)]
pub enum ContactEvent {
    /// Two colliders started touching
    Started {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },

    /// Two colliders stopped touching
    Stopped {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },
}

impl ContactEvent {
    /// The colliders involved, in queue order
    pub fn colliders(&self) -> (ColliderHandle, ColliderHandle) {
        match *self {
            ContactEvent::Started {
                collider1,
                collider2,
            }
            | ContactEvent::Stopped {
                collider1,
                collider2,
            } => (collider1, collider2),
        }
    }
}

/// Solver impulse summary for a contact pair, reported after resolution
#[derive(Debug, Clone, Copy)]
pub struct ContactForce {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    /// Magnitude of the total force applied across the pair's contacts
    pub magnitude: Real,
}

/// A contact pair as seen before the solver runs
#[derive(Debug, Clone, Copy)]
pub struct ContactPairInfo {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    pub body1: Option<RigidBodyHandle>,
    pub body2: Option<RigidBodyHandle>,
}

/// Decision returned by a pre-solve hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactResponse {
    /// Let the solver resolve the contact normally
    #[default]
    Keep,
    /// Drop the pair from the solver; no collision response this step
    Suppress,
}

/// Queue for contact events recorded during a physics step
///
/// The queue is cleared at the start of each step and drained after the
/// step returns, so consumers never observe events mid-iteration.
pub struct ContactQueue {
    events: Arc<Mutex<Vec<ContactEvent>>>,
    forces: Arc<Mutex<Vec<ContactForce>>>,
}

impl ContactQueue {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::with_capacity(32))),
            forces: Arc::new(Mutex::new(Vec::with_capacity(32))),
        }
    }

    /// Clear all queued events (call at start of physics step)
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
        if let Ok(mut forces) = self.forces.lock() {
            forces.clear();
        }
    }

    /// Take all begin/end contact events recorded this step
    pub fn drain_events(&self) -> Vec<ContactEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    /// Take all post-solve force reports recorded this step
    pub fn drain_forces(&self) -> Vec<ContactForce> {
        self.forces
            .lock()
            .map(|mut forces| std::mem::take(&mut *forces))
            .unwrap_or_default()
    }

    fn push_event(&self, event: ContactEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn push_force(&self, force: ContactForce) {
        if let Ok(mut forces) = self.forces.lock() {
            forces.push(force);
        }
    }
}

impl Default for ContactQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ContactQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        match event {
            CollisionEvent::Started(h1, h2, _flags) => {
                self.push_event(ContactEvent::Started {
                    collider1: h1,
                    collider2: h2,
                });
            }
            CollisionEvent::Stopped(h1, h2, _flags) => {
                self.push_event(ContactEvent::Stopped {
                    collider1: h1,
                    collider2: h2,
                });
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        total_force_magnitude: Real,
    ) {
        self.push_force(ContactForce {
            collider1: contact_pair.collider1,
            collider2: contact_pair.collider2,
            magnitude: total_force_magnitude,
        });
    }
}

/// Pre-solve consultation, answered before the solver sees a contact pair
///
/// Implementors run inside the physics step with shared access only, so a
/// pre-solve decision can inspect state but never mutate the body set.
pub trait PreSolveFilter {
    fn pre_solve(&self, contact: &ContactPairInfo) -> ContactResponse;
}

/// Adapter wiring a [`PreSolveFilter`] into rapier's physics hooks
pub struct PreSolveGate<'a> {
    filter: &'a dyn PreSolveFilter,
}

impl<'a> PreSolveGate<'a> {
    pub fn new(filter: &'a dyn PreSolveFilter) -> Self {
        Self { filter }
    }
}

impl PhysicsHooks for PreSolveGate<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let info = ContactPairInfo {
            collider1: context.collider1,
            collider2: context.collider2,
            body1: context.rigid_body1,
            body2: context.rigid_body2,
        };
        match self.filter.pre_solve(&info) {
            ContactResponse::Keep => Some(SolverFlags::COMPUTE_IMPULSES),
            ContactResponse::Suppress => None,
        }
    }
}
