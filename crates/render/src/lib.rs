pub mod commands;
pub mod icons;
pub mod painter;
pub mod tint;

pub use commands::*;
pub use icons::*;
pub use painter::*;
