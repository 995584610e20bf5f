//! EEG-Core: Foundation types for spectral EEG analysis
//!
//! Recordings, frequency bands, electrode montage and the shared error type.

pub mod bands;
pub mod error;
pub mod montage;
pub mod recording;

pub use bands::*;
pub use error::{EegError, EegResult};
pub use montage::*;
pub use recording::*;
