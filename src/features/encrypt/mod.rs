//! Column encryption. Routing only records which columns are stored as
//! ciphertext; targets are left to the other rules.

pub mod router;
pub mod rule;

pub use router::{EncryptRouter, ANNOTATION_PREFIX};
pub use rule::{EncryptColumn, EncryptRule, EncryptTable};
