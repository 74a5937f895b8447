pub mod labels;
pub mod symbology;
pub mod zipline;

pub use symbology::*;
pub use zipline::*;
