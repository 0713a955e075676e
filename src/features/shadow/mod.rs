//! Shadow traffic isolation: matching statements go to shadow data sources,
//! everything else stays off them.

pub mod algorithm;
pub mod router;
pub mod rule;

pub use algorithm::{ShadowAlgorithm, ShadowOperation, SHADOW_HINT};
pub use router::{ShadowRouter, MATCHED_ANNOTATION};
pub use rule::{ShadowDataSource, ShadowRule, ShadowTable};
