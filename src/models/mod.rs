pub mod analysis;
pub mod finding;
pub mod image;

pub use analysis::*;
pub use finding::*;
pub use image::*;
