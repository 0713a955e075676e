//! Primary/replica groups: writes to the primary, reads balanced over
//! replicas.

pub mod router;
pub mod rule;

pub use router::{ReadwriteSplittingRouter, ROUTE_ANNOTATION};
pub use rule::{LoadBalancer, ReadwriteSplittingGroup, ReadwriteSplittingRule};
