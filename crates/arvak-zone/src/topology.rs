//! Zone topology: the shuttling graph between zones.
//!
//! The topology is an undirected graph whose nodes are [`Zone`]s and whose
//! edges are physical adjacencies a qubit can be shuttled across in one hop.
//!
//! ## Performance
//!
//! On construction, a distance matrix is precomputed using BFS from every
//! zone, together with a next-hop matrix. `distance()` is an O(1) lookup and
//! `shortest_path()` reconstructs a route in O(path length).
//!
//! ## Determinism
//!
//! When several shortest paths exist, the next hop is always the neighbour
//! with the smallest [`ZoneId`], which yields the lexicographically smallest
//! path. Routing output is therefore reproducible across runs.

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::error::{ZoneError, ZoneResult};
use crate::zone::{Zone, ZoneId};

const UNREACHABLE: u32 = u32::MAX;

/// In-memory device description, as handed over by a device loader.
///
/// ```
/// use arvak_zone::{TopologyDescription, ZoneTopology};
///
/// let description: TopologyDescription = serde_json::from_str(r#"{
///     "zones": [
///         {"id": 0, "max_occupancy": 2},
///         {"id": 1, "max_occupancy": 3, "min_occupancy": 1}
///     ],
///     "edges": [[0, 1]]
/// }"#).unwrap();
///
/// let topology = ZoneTopology::from_description(&description).unwrap();
/// assert_eq!(topology.zone_count(), 2);
/// assert_eq!(topology.max_qubits(), 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyDescription {
    /// Device-wide qubit limit. Defaults to the sum of zone capacities.
    #[serde(default)]
    pub max_qubits: Option<u32>,
    /// Zones with their occupancy bounds.
    pub zones: Vec<Zone>,
    /// Adjacent zone pairs (undirected).
    #[serde(default)]
    pub edges: Vec<(ZoneId, ZoneId)>,
}

/// Connected graph of zones with a precomputed shortest-path table.
#[derive(Debug, Clone)]
pub struct ZoneTopology {
    graph: UnGraph<Zone, ()>,
    index: FxHashMap<ZoneId, NodeIndex>,
    max_qubits: u32,
    /// `dist[a][b]`: hop count between node indices `a` and `b`.
    dist: Vec<Vec<u32>>,
    /// `next_hop[a][b]`: node index of the first step from `a` towards `b`.
    next_hop: Vec<Vec<u32>>,
}

impl ZoneTopology {
    /// Build a topology from zones and adjacency edges.
    ///
    /// Fails if a zone is declared twice, has inverted occupancy bounds,
    /// an edge names an undeclared zone, or the graph is disconnected.
    pub fn new(
        zones: impl IntoIterator<Item = Zone>,
        edges: impl IntoIterator<Item = (ZoneId, ZoneId)>,
    ) -> ZoneResult<Self> {
        Self::build(zones, edges, None)
    }

    /// Build a topology from a loaded device description.
    pub fn from_description(description: &TopologyDescription) -> ZoneResult<Self> {
        Self::build(
            description.zones.iter().copied(),
            description.edges.iter().copied(),
            description.max_qubits,
        )
    }

    /// A chain `Z0 - Z1 - ... - Z(n-1)` of equally sized zones.
    pub fn linear(n: u32, capacity: u32) -> ZoneResult<Self> {
        let zones = (0..n).map(|i| Zone::with_capacity(ZoneId(i), capacity));
        let edges = (1..n).map(|i| (ZoneId(i - 1), ZoneId(i)));
        Self::new(zones, edges)
    }

    /// A ring of equally sized zones. Falls back to a chain below 3 zones.
    pub fn ring(n: u32, capacity: u32) -> ZoneResult<Self> {
        let zones = (0..n).map(|i| Zone::with_capacity(ZoneId(i), capacity));
        let mut edges: Vec<_> = (1..n).map(|i| (ZoneId(i - 1), ZoneId(i))).collect();
        if n > 2 {
            edges.push((ZoneId(n - 1), ZoneId(0)));
        }
        Self::new(zones, edges)
    }

    fn build(
        zones: impl IntoIterator<Item = Zone>,
        edges: impl IntoIterator<Item = (ZoneId, ZoneId)>,
        max_qubits: Option<u32>,
    ) -> ZoneResult<Self> {
        let mut graph = UnGraph::default();
        let mut index = FxHashMap::default();

        for zone in zones {
            zone.validate()?;
            if index.contains_key(&zone.id) {
                return Err(ZoneError::DuplicateZone(zone.id));
            }
            let node = graph.add_node(zone);
            index.insert(zone.id, node);
        }

        for (a, b) in edges {
            let na = *index.get(&a).ok_or(ZoneError::UnknownZone(a))?;
            let nb = *index.get(&b).ok_or(ZoneError::UnknownZone(b))?;
            // Self-loops carry no routing information.
            if na != nb {
                graph.update_edge(na, nb, ());
            }
        }

        let total = capacity_sum(graph.node_weights());
        let mut topology = Self {
            graph,
            index,
            max_qubits: max_qubits.unwrap_or(total),
            dist: vec![],
            next_hop: vec![],
        };
        topology.precompute_paths()?;

        debug!(
            zones = topology.zone_count(),
            edges = topology.graph.edge_count(),
            max_qubits = topology.max_qubits,
            "built zone topology"
        );
        Ok(topology)
    }

    /// BFS from every zone, then derive the next-hop table.
    fn precompute_paths(&mut self) -> ZoneResult<()> {
        let n = self.graph.node_count();
        self.dist = (0..n).map(|src| self.bfs_from(src)).collect();

        for a in 0..n {
            for b in 0..n {
                if self.dist[a][b] == UNREACHABLE {
                    return Err(ZoneError::DisconnectedTopology {
                        from: self.zone_id_at(a),
                        to: self.zone_id_at(b),
                    });
                }
            }
        }

        self.next_hop = vec![vec![UNREACHABLE; n]; n];
        for a in 0..n {
            for b in 0..n {
                self.next_hop[a][b] = if a == b {
                    a as u32
                } else {
                    self.smallest_step(a, b)
                };
            }
        }
        Ok(())
    }

    fn bfs_from(&self, src: usize) -> Vec<u32> {
        let mut dist = vec![UNREACHABLE; self.graph.node_count()];
        let mut queue = VecDeque::new();
        dist[src] = 0;
        queue.push_back(src);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors(NodeIndex::new(current)) {
                let nb = neighbor.index();
                if dist[nb] == UNREACHABLE {
                    dist[nb] = dist[current] + 1;
                    queue.push_back(nb);
                }
            }
        }
        dist
    }

    /// Neighbour of `a` one hop closer to `b`, smallest zone id first.
    fn smallest_step(&self, a: usize, b: usize) -> u32 {
        let want = self.dist[a][b] - 1;
        self.graph
            .neighbors(NodeIndex::new(a))
            .filter(|n| self.dist[n.index()][b] == want)
            .min_by_key(|n| self.graph[*n].id)
            .map_or(UNREACHABLE, |n| n.index() as u32)
    }

    fn zone_id_at(&self, node: usize) -> ZoneId {
        self.graph[NodeIndex::new(node)].id
    }

    fn node(&self, id: ZoneId) -> Option<usize> {
        self.index.get(&id).map(|n| n.index())
    }

    /// Number of zones.
    pub fn zone_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Zones in declaration order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> + '_ {
        self.graph.node_weights()
    }

    /// Look up a zone.
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.index.get(&id).map(|&n| &self.graph[n])
    }

    /// `(min_occupancy, max_occupancy)` of a zone.
    pub fn occupancy_bounds(&self, id: ZoneId) -> Option<(u32, u32)> {
        self.zone(id).map(Zone::bounds)
    }

    /// Adjacent zones, sorted by id.
    pub fn neighbors(&self, id: ZoneId) -> Vec<ZoneId> {
        let Some(&node) = self.index.get(&id) else {
            return vec![];
        };
        let mut out: Vec<_> = self.graph.neighbors(node).map(|n| self.graph[n].id).collect();
        out.sort();
        out
    }

    /// Check if two zones share an edge.
    pub fn is_adjacent(&self, a: ZoneId, b: ZoneId) -> bool {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&na), Some(&nb)) => self.graph.contains_edge(na, nb),
            _ => false,
        }
    }

    /// Adjacent zone pairs.
    pub fn edges(&self) -> Vec<(ZoneId, ZoneId)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].id, self.graph[b].id))
            .collect()
    }

    /// Shuttle hops between two zones, or `None` for unknown zones.
    pub fn distance(&self, from: ZoneId, to: ZoneId) -> Option<u32> {
        let (a, b) = (self.node(from)?, self.node(to)?);
        Some(self.dist[a][b])
    }

    /// Zones visited from `from` to `to`, both inclusive.
    ///
    /// `shortest_path(a, a)` is `[a]`. Returns `None` for unknown zones.
    pub fn shortest_path(&self, from: ZoneId, to: ZoneId) -> Option<Vec<ZoneId>> {
        let (mut current, target) = (self.node(from)?, self.node(to)?);
        let mut path = Vec::with_capacity(self.dist[current][target] as usize + 1);
        path.push(from);
        while current != target {
            let next = self.next_hop[current][target];
            if next == UNREACHABLE {
                return None;
            }
            current = next as usize;
            path.push(self.zone_id_at(current));
        }
        Some(path)
    }

    /// Device-wide qubit limit.
    pub fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    /// Sum of all zone capacities, saturating at `u32::MAX`.
    pub fn total_capacity(&self) -> u32 {
        capacity_sum(self.zones())
    }
}

fn capacity_sum<'a>(zones: impl Iterator<Item = &'a Zone>) -> u32 {
    zones.fold(0u32, |acc, z| acc.saturating_add(z.max_occupancy))
}
