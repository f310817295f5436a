//! Cross-partition routing.
//!
//! At every chunk boundary a qubit may sit in one zone at the end of the
//! earlier chunk and be assigned a different zone by the next partition. The
//! router looks up the shortest zone path between the two and emits one
//! [`Operation::Shuttle`] per hop, immediately before the first operation of
//! the new chunk that touches the qubit.
//!
//! Qubits that share a group on both ends of a boundary move together as
//! a single multi-qubit shuttle rather than as separate single-qubit moves.
//!
//! ```
//! use arvak_zone::{Operation, QubitId, ZoneRouter, ZoneTopology};
//!
//! let topology = ZoneTopology::linear(3, 1).unwrap();
//! let ops = vec![
//!     Operation::rx(QubitId(0), 0.5),
//!     Operation::rx(QubitId(1), 0.5),
//!     Operation::rx(QubitId(2), 0.5),
//!     Operation::rx(QubitId(3), 0.5),
//! ];
//!
//! let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
//! assert_eq!(routed.chunks.len(), 2);
//! assert!(routed.operations.len() >= ops.len());
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::error::{ZoneError, ZoneResult};
use crate::operation::Operation;
use crate::partition::{GroupSlot, Partition};
use crate::placement::{Chunk, partition_operations};
use crate::qubit::QubitId;
use crate::topology::ZoneTopology;
use crate::zone::ZoneId;

/// Which earlier placements a boundary takes into account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidencyPolicy {
    /// Only qubits placed in both adjacent partitions are shuttled.
    #[default]
    Adjacent,
    /// A qubit stays where it was last placed, even across chunks that do
    /// not use it, and is shuttled from there when it reappears.
    Persistent,
}

impl FromStr for ResidencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adjacent" => Ok(Self::Adjacent),
            "persistent" => Ok(Self::Persistent),
            other => Err(format!(
                "unknown residency policy '{other}' (expected 'adjacent' or 'persistent')"
            )),
        }
    }
}

impl fmt::Display for ResidencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adjacent => write!(f, "adjacent"),
            Self::Persistent => write!(f, "persistent"),
        }
    }
}

/// Router settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterOptions {
    /// How qubit locations carry over between chunks.
    #[serde(default)]
    pub residency: ResidencyPolicy,
}

/// A group of qubits travelling along a zone path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMove {
    /// Qubits moved together.
    pub qubits: BTreeSet<QubitId>,
    /// Zones visited, source and destination included.
    pub path: Vec<ZoneId>,
}

impl GroupMove {
    /// Zone the group leaves, if the path is not empty.
    pub fn from_zone(&self) -> Option<ZoneId> {
        self.path.first().copied()
    }

    /// Zone the group arrives in, if the path is not empty.
    pub fn to_zone(&self) -> Option<ZoneId> {
        self.path.last().copied()
    }

    /// Number of shuttle hops.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// One shuttle per edge of the path.
    pub fn shuttles(&self) -> Vec<Operation> {
        self.path
            .windows(2)
            .map(|hop| Operation::shuttle(self.qubits.iter().copied(), hop[0], hop[1]))
            .collect()
    }

    fn touches(&self, operation: &Operation) -> bool {
        self.qubits.iter().any(|&q| operation.touches(q))
    }
}

#[derive(Debug, Clone, Copy)]
struct Location {
    chunk: usize,
    slot: GroupSlot,
    zone: ZoneId,
}

/// Last known location of every qubit placed so far.
#[derive(Debug, Clone, Default)]
pub struct Residency {
    located: FxHashMap<QubitId, Location>,
}

impl Residency {
    /// Locations taken from a single partition.
    pub fn from_partition(chunk: usize, partition: &Partition) -> Self {
        let mut residency = Self::default();
        residency.record(chunk, partition);
        residency
    }

    /// Overwrite locations with the placements of `partition`.
    pub fn record(&mut self, chunk: usize, partition: &Partition) {
        for qubit in partition.placed_qubits() {
            if let (Some(slot), Some(zone)) = (partition.slot_of(qubit), partition.zone_of(qubit)) {
                self.located.insert(qubit, Location { chunk, slot, zone });
            }
        }
    }

    /// Last known zone of a qubit.
    pub fn zone_of(&self, qubit: QubitId) -> Option<ZoneId> {
        self.located.get(&qubit).map(|l| l.zone)
    }

    /// Number of tracked qubits.
    pub fn len(&self) -> usize {
        self.located.len()
    }

    /// Check if no qubit is tracked.
    pub fn is_empty(&self) -> bool {
        self.located.is_empty()
    }
}

/// Moves needed to bring every tracked qubit that `incoming` places into its
/// new zone.
///
/// Qubits are batched by (origin group, destination group), so a group that
/// stays intact travels as one. Moves are ordered by their smallest qubit.
pub fn plan_moves(
    topology: &ZoneTopology,
    residency: &Residency,
    incoming: &Partition,
) -> ZoneResult<Vec<GroupMove>> {
    let mut batches: BTreeMap<(usize, GroupSlot, GroupSlot), (ZoneId, ZoneId, BTreeSet<QubitId>)> =
        BTreeMap::new();

    for qubit in incoming.placed_qubits() {
        let Some(origin) = residency.located.get(&qubit) else {
            continue;
        };
        let (Some(slot), Some(zone)) = (incoming.slot_of(qubit), incoming.zone_of(qubit)) else {
            continue;
        };
        if origin.zone == zone {
            continue;
        }
        batches
            .entry((origin.chunk, origin.slot, slot))
            .or_insert_with(|| (origin.zone, zone, BTreeSet::new()))
            .2
            .insert(qubit);
    }

    let mut moves = batches
        .into_values()
        .map(|(from, to, qubits)| {
            let path = topology
                .shortest_path(from, to)
                .ok_or(ZoneError::DisconnectedTopology { from, to })?;
            Ok(GroupMove { qubits, path })
        })
        .collect::<ZoneResult<Vec<_>>>()?;
    moves.sort_by_key(|mv| mv.qubits.first().copied());
    Ok(moves)
}

/// Moves between two partition snapshots: only qubits placed in both are
/// considered.
pub fn route_between(
    topology: &ZoneTopology,
    outgoing: &Partition,
    incoming: &Partition,
) -> ZoneResult<Vec<GroupMove>> {
    plan_moves(topology, &Residency::from_partition(0, outgoing), incoming)
}

/// Result of routing an operation stream.
#[derive(Debug, Clone)]
pub struct RoutedProgram {
    /// Input operations with shuttles inserted at chunk boundaries.
    pub operations: Vec<Operation>,
    /// The chunks the input was split into.
    pub chunks: Vec<Chunk>,
    /// Every planned group move, in emission order.
    pub moves: Vec<GroupMove>,
}

impl RoutedProgram {
    /// Number of shuttle operations inserted by the router.
    pub fn shuttle_count(&self) -> usize {
        self.moves.iter().map(GroupMove::hops).sum()
    }
}

/// End-to-end zone router: chunking followed by boundary routing.
pub struct ZoneRouter<'a> {
    topology: &'a ZoneTopology,
    options: RouterOptions,
}

impl<'a> ZoneRouter<'a> {
    /// Create a router with default options.
    pub fn new(topology: &'a ZoneTopology) -> Self {
        Self {
            topology,
            options: RouterOptions::default(),
        }
    }

    /// Replace the router options.
    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Route an operation stream.
    #[instrument(skip(self, operations), fields(operations = operations.len(), residency = %self.options.residency))]
    pub fn route(&self, operations: &[Operation]) -> ZoneResult<RoutedProgram> {
        let chunks = partition_operations(self.topology, operations)?;

        let mut output = Vec::with_capacity(operations.len());
        let mut emitted = Vec::new();
        let mut residency = Residency::default();

        for (index, chunk) in chunks.iter().enumerate() {
            let mut pending = plan_moves(self.topology, &residency, &chunk.partition)?;
            if !pending.is_empty() {
                debug!(chunk = index, moves = pending.len(), "planned boundary moves");
            }

            for operation in &operations[chunk.range.clone()] {
                pending.retain(|mv| {
                    if mv.touches(operation) {
                        debug!(qubits = ?mv.qubits, path = ?mv.path, "emitting group move");
                        output.extend(mv.shuttles());
                        emitted.push(mv.clone());
                        false
                    } else {
                        true
                    }
                });
                output.push(operation.clone());
            }
            // Every qubit of the partition was placed by an operation of
            // this chunk, so every move has been triggered.
            debug_assert!(pending.is_empty());

            match self.options.residency {
                ResidencyPolicy::Persistent => residency.record(index, &chunk.partition),
                ResidencyPolicy::Adjacent => {
                    residency = Residency::from_partition(index, &chunk.partition);
                }
            }
        }

        let program = RoutedProgram {
            operations: output,
            chunks,
            moves: emitted,
        };
        info!(
            chunks = program.chunks.len(),
            moves = program.moves.len(),
            shuttles = program.shuttle_count(),
            "zone routing complete"
        );
        Ok(program)
    }
}
