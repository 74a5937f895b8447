pub mod icons;
pub mod svg;
