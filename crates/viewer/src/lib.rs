//! The owned viewer context: one `MapViewer` holds every piece of map state and exposes
//! the operations a UI shell drives (load, filter, pan/zoom, hover, paint).

pub mod map_viewer;
pub mod tooltip;

pub use map_viewer::*;
pub use tooltip::*;
