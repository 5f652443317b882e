// Engine modules: entities, scene, physics, assets, rendering resources

pub mod assets;
pub mod entity;
pub mod frame;
pub mod physics;
pub mod renderer;
pub mod scene;
