//! 行程层：数据模型、单段补全、高程剖面汇总

pub mod elevation;
pub mod enricher;
pub mod model;

pub use elevation::{summarize, ElevationProfile, ElevationRequest, ElevationStats};
pub use enricher::DetailEnricher;
pub use model::{LatLon, Stage, Steepness, Tour, UNKNOWN_LOCATION};
