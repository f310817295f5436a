//! Arvak Zone Placement and Shuttle Routing
//!
//! This crate assigns a stream of multi-zone operations to the capacity
//! bounded zones of a trapped-ion style device, and decides when qubits have
//! to be shuttled between zones so that every operation finds its qubits
//! co-located.
//!
//! # Overview
//!
//! Routing runs in two stages:
//! 1. **Placement**: operations are offered one by one to a [`Partition`],
//!    which groups qubits that interact and packs the groups into zones.
//!    When a zone would overflow, the current chunk is closed and a fresh
//!    partition takes over.
//! 2. **Boundary routing**: for every qubit whose zone changes between
//!    chunks, the shortest path through the [`ZoneTopology`] becomes a
//!    sequence of [`Operation::Shuttle`]s inserted before the qubit is used.
//!
//! # Architecture
//!
//! ```text
//! Operations ──► partition_operations ──► [Chunk { range, Partition }]
//!                      │                              │
//!                      ▼                              ▼
//!                 Partition::try_accommodate     plan_moves (ZoneTopology
//!                 (singleton / pair /            shortest paths)
//!                  extend / merge)                    │
//!                                                     ▼
//!                                      Operations + inserted Shuttles
//! ```
//!
//! # Example
//!
//! ```rust
//! use arvak_zone::{Operation, QubitId, Zone, ZoneId, ZoneRouter, ZoneTopology};
//!
//! // Z0 (2 slots) -- Z1 (3 slots)
//! let topology = ZoneTopology::new(
//!     [Zone::with_capacity(ZoneId(0), 2), Zone::with_capacity(ZoneId(1), 3)],
//!     [(ZoneId(0), ZoneId(1))],
//! )
//! .unwrap();
//!
//! let ops = vec![
//!     Operation::xx_phase(QubitId(0), QubitId(1), 0.5),
//!     Operation::rx(QubitId(2), 0.5),
//! ];
//!
//! let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
//! let partition = &routed.chunks[0].partition;
//! assert_eq!(partition.zone_of(QubitId(0)), Some(ZoneId(1)));
//! assert_eq!(partition.zone_of(QubitId(2)), Some(ZoneId(0)));
//! assert_eq!(routed.operations, ops);
//! ```
//!
//! # Errors
//!
//! Capacity failures ([`PlacementError::NoCapacity`],
//! [`PlacementError::CapacityExceeded`]) are ordinary values that drive
//! chunking. Malformed devices and contract violations surface as
//! [`ZoneError`].

pub mod error;
pub mod operation;
pub mod partition;
pub mod placement;
pub mod qubit;
pub mod router;
pub mod topology;
pub mod zone;

pub use error::{PlacementError, ZoneError, ZoneResult};
pub use operation::{Operation, RotationAxis};
pub use partition::{Accommodation, GroupSlot, Partition};
pub use placement::{Chunk, partition_operations};
pub use qubit::QubitId;
pub use router::{
    GroupMove, Residency, ResidencyPolicy, RoutedProgram, RouterOptions, ZoneRouter, plan_moves,
    route_between,
};
pub use topology::{TopologyDescription, ZoneTopology};
pub use zone::{Zone, ZoneId};
