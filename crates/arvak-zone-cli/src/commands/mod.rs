//! CLI command implementations.

pub mod common;
pub mod paths;
pub mod route;
pub mod version;
