pub mod record;
pub mod timestamp;
pub mod normalize;
pub mod filter;
pub mod trend;
pub mod stats;
pub mod rank;
pub mod recent;
pub mod source;
pub mod dashboard;
