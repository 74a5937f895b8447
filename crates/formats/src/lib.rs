pub mod entity_types;
pub mod error;
pub mod lenient;
pub mod manifest;
pub mod map_package;

pub use entity_types::*;
pub use error::*;
pub use manifest::*;
pub use map_package::*;
