//! Error types for zone placement and routing.

use thiserror::Error;

use crate::partition::GroupSlot;
use crate::qubit::QubitId;
use crate::zone::ZoneId;

/// Fatal errors. These indicate a malformed device description or a
/// violated caller contract and are never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZoneError {
    /// Two zones that routing must connect have no path between them.
    #[error("Zone topology is disconnected: no path from {from} to {to}")]
    DisconnectedTopology {
        /// Source zone.
        from: ZoneId,
        /// Unreachable zone.
        to: ZoneId,
    },

    /// An operation touches a number of qubits placement cannot handle.
    #[error("Operation '{operation}' touches {arity} qubits, only 1 or 2 are supported")]
    UnsupportedArity {
        /// Name of the operation.
        operation: &'static str,
        /// Number of qubits it touches.
        arity: usize,
    },

    /// A zone's occupancy bounds are inverted.
    #[error("Zone {zone} has min_occupancy {min} greater than max_occupancy {max}")]
    InvalidOccupancy {
        /// The offending zone.
        zone: ZoneId,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The same zone id was declared twice.
    #[error("Zone {0} is declared more than once")]
    DuplicateZone(ZoneId),

    /// A zone id was referenced but never declared.
    #[error("Zone {0} is not part of the topology")]
    UnknownZone(ZoneId),

    /// A two-qubit operation names the same qubit twice.
    #[error("Duplicate qubit {qubit} in operation '{operation}'")]
    DuplicateQubit {
        /// The repeated qubit.
        qubit: QubitId,
        /// Name of the operation.
        operation: &'static str,
    },

    /// An operation does not fit even into an empty partition.
    #[error("Operation {index} cannot be placed on an empty device: {reason}")]
    Unplaceable {
        /// Position of the operation in the input stream.
        index: usize,
        /// Why the fresh partition rejected it.
        reason: PlacementError,
    },
}

/// Result type for fatal zone errors.
pub type ZoneResult<T> = Result<T, ZoneError>;

/// Recoverable placement failures.
///
/// A rejected placement leaves the partition untouched. The scan reacts
/// to `NoCapacity` and `CapacityExceeded` by starting a new chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// No zone has room for the qubits being placed.
    #[error("no zone has enough free capacity")]
    NoCapacity,

    /// Neither zone can absorb the other's group during a merge.
    #[error("merging the groups would exceed zone capacity")]
    CapacityExceeded,

    /// The qubit already has a placement in this partition.
    #[error("qubit {0} is already placed")]
    AlreadyPlaced(QubitId),

    /// The qubit has no placement in this partition.
    #[error("qubit {0} is not placed")]
    NotPlaced(QubitId),

    /// The slot does not name a live group.
    #[error("no group at {0}")]
    UnknownGroup(GroupSlot),
}

impl PlacementError {
    /// Whether this failure comes from exhausted capacity, as opposed to a
    /// violated precondition of the partition primitive.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::NoCapacity | Self::CapacityExceeded)
    }
}
