pub mod components;
pub mod entity;
pub mod picking;
pub mod query;
pub mod world;

pub use entity::*;
pub use world::*;
