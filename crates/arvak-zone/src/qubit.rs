//! Qubit identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a logical qubit in the operation stream.
///
/// Ids are supplied by the front end; the router never checks them
/// against a device-wide range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}
