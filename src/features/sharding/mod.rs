//! Horizontal sharding: logic tables spread over data nodes chosen by
//! column conditions.

pub mod algorithm;
pub mod expression;
pub mod router;
pub mod rule;

pub use algorithm::ShardingAlgorithm;
pub use router::{ShardingRouter, FULL_ROUTE_ANNOTATION};
pub use rule::{DataNode, ShardingRule, ShardingStrategy, ShardingTableRule};
