//! Unsharded tables, each living on exactly one data source.

pub mod router;
pub mod rule;

pub use router::SingleTableRouter;
pub use rule::{SingleTable, SingleTableRule};
