//! Greedy chunking of an operation stream into partitions.
//!
//! Operations are offered to a live [`Partition`] left to right. The first
//! one it rejects is the frontier: the current chunk ends just before it and
//! a fresh partition is opened starting with that operation. There is no
//! backtracking and no reordering.

use std::ops::Range;
use tracing::{debug, instrument};

use crate::error::{ZoneError, ZoneResult};
use crate::operation::Operation;
use crate::partition::{Accommodation, Partition};
use crate::topology::ZoneTopology;

/// A run of operations accommodated by one partition.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Indices into the input operation stream.
    pub range: Range<usize>,
    /// Zone assignment after accommodating every operation in `range`.
    pub partition: Partition,
}

impl Chunk {
    /// Number of operations in the chunk.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Check if the chunk holds no operations.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Split `operations` into chunks, each fitting one partition.
///
/// The chunk ranges are contiguous and cover the input exactly once, in
/// order. An empty input yields no chunks.
///
/// Fails with [`ZoneError::Unplaceable`] when an operation is rejected by a
/// freshly opened partition, since no amount of chunking can fit it.
#[instrument(skip_all, fields(operations = operations.len()))]
pub fn partition_operations(
    topology: &ZoneTopology,
    operations: &[Operation],
) -> ZoneResult<Vec<Chunk>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut partition = Partition::new(topology);

    for (index, operation) in operations.iter().enumerate() {
        let reason = match partition.try_accommodate(operation)? {
            Accommodation::Placed => continue,
            Accommodation::Rejected(reason) => reason,
        };

        if index == start {
            return Err(ZoneError::Unplaceable { index, reason });
        }

        debug!(frontier = index, %reason, placed = partition.len(), "closing chunk");
        log_underoccupied(&partition, start..index);
        let full = std::mem::replace(&mut partition, Partition::new(topology));
        chunks.push(Chunk {
            range: start..index,
            partition: full,
        });
        start = index;

        match partition.try_accommodate(operation)? {
            Accommodation::Placed => {}
            Accommodation::Rejected(reason) => {
                return Err(ZoneError::Unplaceable { index, reason });
            }
        }
    }

    if start < operations.len() {
        log_underoccupied(&partition, start..operations.len());
        chunks.push(Chunk {
            range: start..operations.len(),
            partition,
        });
    }

    debug!(chunks = chunks.len(), "partitioned operations");
    Ok(chunks)
}

fn log_underoccupied(partition: &Partition, range: Range<usize>) {
    let zones = partition.underoccupied_zones();
    if !zones.is_empty() {
        debug!(?range, ?zones, "chunk leaves zones below min_occupancy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlacementError;
    use crate::qubit::QubitId;
    use crate::zone::{Zone, ZoneId};

    fn q(id: u32) -> QubitId {
        QubitId(id)
    }

    fn single_zone(capacity: u32) -> ZoneTopology {
        ZoneTopology::new([Zone::with_capacity(ZoneId(0), capacity)], []).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let topo = single_zone(2);
        let chunks = partition_operations(&topo, &[]).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_single_chunk() {
        let topo = ZoneTopology::linear(2, 3).unwrap();
        let ops = vec![
            Operation::xx_phase(q(0), q(1), 0.5),
            Operation::rx(q(2), 0.5),
            Operation::xx_phase(q(1), q(2), 0.5),
        ];
        let chunks = partition_operations(&topo, &ops).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].range, 0..3);
    }

    #[test]
    fn test_frontier_starts_new_chunk() {
        let topo = single_zone(1);
        let ops = vec![Operation::rx(q(0), 0.5), Operation::rx(q(1), 0.5)];
        let chunks = partition_operations(&topo, &ops).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].range, 0..1);
        assert_eq!(chunks[1].range, 1..2);
        assert!(chunks[0].partition.contains(q(0)));
        assert!(!chunks[0].partition.contains(q(1)));
        assert!(chunks[1].partition.contains(q(1)));
        assert!(!chunks[1].partition.contains(q(0)));
    }

    #[test]
    fn test_frontier_at_first_rejection_only() {
        // q2 does not fit after the pair, but later ops that would fit are
        // not pulled forward into the first chunk.
        let topo = single_zone(2);
        let ops = vec![
            Operation::xx_phase(q(0), q(1), 0.5),
            Operation::rx(q(2), 0.5),
            Operation::rx(q(0), 0.5),
        ];
        let chunks = partition_operations(&topo, &ops).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].range, 0..1);
        assert_eq!(chunks[1].range, 1..3);
        assert_eq!(chunks[1].partition.placed_qubits(), vec![q(0), q(2)]);
    }

    #[test]
    fn test_unplaceable_operation() {
        let topo = single_zone(1);
        let ops = vec![Operation::rx(q(0), 0.5), Operation::xx_phase(q(1), q(2), 0.5)];
        let result = partition_operations(&topo, &ops);
        assert!(matches!(
            result,
            Err(ZoneError::Unplaceable {
                index: 1,
                reason: PlacementError::NoCapacity
            })
        ));
    }

    #[test]
    fn test_fatal_error_propagates() {
        let topo = single_zone(4);
        let ops = vec![
            Operation::rx(q(0), 0.5),
            Operation::shuttle([q(0), q(1), q(2)], ZoneId(0), ZoneId(0)),
        ];
        assert!(matches!(
            partition_operations(&topo, &ops),
            Err(ZoneError::UnsupportedArity { .. })
        ));
    }

    #[test]
    fn test_chunks_cover_input() {
        let topo = ZoneTopology::linear(2, 2).unwrap();
        let ops: Vec<_> = (0..9)
            .map(|i| Operation::xx_phase(q(i), q(i + 1), 0.5))
            .collect();
        let chunks = partition_operations(&topo, &ops).unwrap();

        let mut next = 0;
        for chunk in &chunks {
            assert_eq!(chunk.range.start, next);
            assert!(!chunk.is_empty());
            next = chunk.range.end;
        }
        assert_eq!(next, ops.len());
    }
}
