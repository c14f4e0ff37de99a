//! Utility modules: error handling and logging.

pub mod error;
pub mod logging;

pub use error::{CytoprepError, Result};
