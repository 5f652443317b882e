// tether2d: a 2D entity layer linking scene-graph transforms to
// rigid-body physics.
//
// The core type is `Stage`, which owns a scene graph, a rapier2d physics
// world, and the live entities pairing a transform node with an optional
// body. `SpriteAtlas` holds sprite-sheet metadata and its GPU resources.

pub mod engine;

pub use engine::assets::{AssetError, AssetLoader, AssetType, AtlasData, SpriteAtlas, SpriteRect};
pub use engine::entity::{
    EntityBehavior, EntityContact, EntityContext, EntityId, FollowBody, LinkedEntity, Stage,
    PIXELS_PER_METER,
};
pub use engine::frame::{FrameClock, FIXED_TIMESTEP};
pub use engine::physics::{
    BodyBuilder, ColliderBuilder2D, ContactPairInfo, ContactResponse, PhysicsWorld,
};
pub use engine::scene::{NodeId, SceneGraph};
