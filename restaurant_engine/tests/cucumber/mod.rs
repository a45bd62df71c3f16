mod lifecycle_world;
mod setups;
mod steps;

pub use lifecycle_world::LifecycleWorld;
