// Entities linking scene transforms to physics bodies

mod behavior;
mod linked;
mod stage;

pub use behavior::{EntityBehavior, EntityContact, EntityContext, FollowBody};
pub use linked::{LinkedEntity, PIXELS_PER_METER};
pub use stage::{EntityId, Stage};
