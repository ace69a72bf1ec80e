pub mod peak;

pub use peak::{find_peaks, PeakDetector, PeakSet, ThresholdPolicy};
