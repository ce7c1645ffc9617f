//! Client side of the segmentation service.
//!
//! The report pipeline only needs an [`AnalysisResult`](crate::models::AnalysisResult);
//! this module is how the command-line front end obtains one.

pub mod client;
pub mod types;

pub use client::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference service is not reachable at {0}")]
    Connection(String),

    #[error("Inference service returned error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Please upload an image file (got {0})")]
    UnsupportedMedia(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
