//! Report synthesis: findings classification and paginated PDF layout.
//!
//! Data flows one way: distribution → `classify` → findings → composer,
//! which interleaves cursor bookkeeping (`cursor`) with drawing primitives
//! (`blocks`) on a `Surface` and finalizes the document exactly once.

pub mod blocks;
pub mod classify;
pub mod composer;
pub mod cursor;
pub mod metrics;
pub mod pdf;
pub mod settings;
pub mod surface;

pub use blocks::*;
pub use classify::*;
pub use composer::*;
pub use cursor::*;
pub use pdf::*;
pub use settings::*;
pub use surface::*;

use thiserror::Error;

/// Fatal composition errors. Nothing here is produced by a single bad block.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot create document surface: {0}")]
    Surface(String),

    #[error("Cannot finalize document: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single block could not be drawn. Always recovered by the canvas.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockError {
    #[error("Image payload is not valid base64: {0}")]
    ImageEncoding(String),

    #[error("Image cannot be decoded: {0}")]
    ImageDecode(String),

    #[error("Surface rejected primitive: {0}")]
    Draw(String),
}
