// GPU resources for sprite rendering

mod texture;

pub use texture::{SpriteMaterial, Texture};
