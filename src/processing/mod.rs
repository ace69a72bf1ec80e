pub mod beats;
pub mod cache;
pub mod classifier;
pub mod detectors;
pub mod filters;
pub mod normalize;
pub mod pipeline;
pub mod session;
pub mod signal;
pub mod sweep;
