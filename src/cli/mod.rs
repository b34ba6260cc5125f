//! CLI command implementations

pub mod convert;
pub mod info;
pub mod search;
pub mod validate;
