// Physics system using rapier2d

pub mod body;
mod contact;
mod world;

pub use body::{BodyBuilder, ColliderBuilder2D, ColliderHandle, RigidBodyHandle};
pub use contact::{
    ContactEvent, ContactForce, ContactPairInfo, ContactQueue, ContactResponse, PreSolveFilter,
};
pub use world::PhysicsWorld;

// Re-export commonly used rapier types for convenience
#[allow(unused_imports)]
pub use rapier2d::prelude::{nalgebra, Isometry, Real, RigidBodyType, Vector};
