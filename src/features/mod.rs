//! Built-in rules and the routers that apply them.

pub mod encrypt;
pub mod readwrite_splitting;
pub mod shadow;
pub mod sharding;
pub mod single;
