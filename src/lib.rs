pub mod acquisition;
pub mod config;
pub mod error;
pub mod local;
pub mod processing;
pub mod utils;

pub use error::{EcgError, Result};
