//! End-to-end routing scenarios on small hand-checked devices.

use std::collections::BTreeSet;

use arvak_zone::{
    Operation, PlacementError, QubitId, Residency, ResidencyPolicy, RouterOptions,
    TopologyDescription, Zone, ZoneError, ZoneId, ZoneRouter, ZoneTopology, plan_moves,
};

fn q(id: u32) -> QubitId {
    QubitId(id)
}

fn z(id: u32) -> ZoneId {
    ZoneId(id)
}

/// Z0 - Z1 - Z2 - Z3 - Z4 with a two-slot zone at the end of the line.
fn tapered_line() -> ZoneTopology {
    let zones = (0..5).map(|i| Zone::with_capacity(z(i), if i == 4 { 2 } else { 1 }));
    let edges = (0..4).map(|i| (z(i), z(i + 1)));
    ZoneTopology::new(zones, edges).unwrap()
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_pair_prefers_large_zone_singleton_prefers_small() {
    let topology = ZoneTopology::new(
        [Zone::with_capacity(z(0), 2), Zone::with_capacity(z(1), 3)],
        [(z(0), z(1))],
    )
    .unwrap();
    let ops = vec![Operation::xx_phase(q(0), q(1), 0.5), Operation::rx(q(2), 0.5)];

    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    assert_eq!(routed.chunks.len(), 1);

    let partition = &routed.chunks[0].partition;
    let z0: Vec<_> = partition.zone_groups(z(0)).cloned().collect();
    let z1: Vec<_> = partition.zone_groups(z(1)).cloned().collect();
    assert_eq!(z0, vec![BTreeSet::from([q(2)])]);
    assert_eq!(z1, vec![BTreeSet::from([q(0), q(1)])]);
    assert_eq!(routed.operations, ops);
    assert_eq!(routed.shuttle_count(), 0);
}

#[test]
fn test_full_zone_opens_second_chunk() {
    let topology = ZoneTopology::new([Zone::with_capacity(z(0), 1)], []).unwrap();
    let ops = vec![Operation::rx(q(0), 0.5), Operation::ry(q(1), 0.5)];

    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    assert_eq!(routed.chunks.len(), 2);
    assert_eq!(routed.chunks[0].range, 0..1);
    assert_eq!(routed.chunks[1].range, 1..2);
    assert_eq!(routed.chunks[1].partition.placed_qubits(), vec![q(1)]);
}

#[test]
fn test_device_qubit_limit_closes_chunk() {
    // Three zones with room for six, but the device only traps four ions.
    let description: TopologyDescription = serde_json::from_str(
        r#"{
            "max_qubits": 4,
            "zones": [
                {"id": 0, "max_occupancy": 2},
                {"id": 1, "max_occupancy": 2},
                {"id": 2, "max_occupancy": 2}
            ],
            "edges": [[0, 1], [1, 2]]
        }"#,
    )
    .unwrap();
    let topology = ZoneTopology::from_description(&description).unwrap();
    assert_eq!(topology.max_qubits(), 4);
    assert_eq!(topology.total_capacity(), 6);

    let ops: Vec<_> = (0..5).map(|i| Operation::rz(q(i), 0.25)).collect();
    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    assert_eq!(routed.chunks.len(), 2);
    assert_eq!(routed.chunks[0].range, 0..4);
    assert_eq!(routed.chunks[0].partition.unused_capacity(), 0);
}

#[test]
fn test_unplaceable_pair_is_fatal() {
    let topology = ZoneTopology::linear(3, 1).unwrap();
    let ops = vec![Operation::xx_phase(q(0), q(1), 0.5)];

    let err = ZoneRouter::new(&topology).route(&ops).unwrap_err();
    assert!(matches!(
        err,
        ZoneError::Unplaceable {
            index: 0,
            reason: PlacementError::NoCapacity
        }
    ));
}

#[test]
fn test_shuttle_in_input_is_rejected() {
    let topology = ZoneTopology::linear(2, 4).unwrap();
    let ops = vec![Operation::shuttle([q(0), q(1), q(2)], z(0), z(1))];

    let err = ZoneRouter::new(&topology).route(&ops).unwrap_err();
    assert!(matches!(err, ZoneError::UnsupportedArity { arity: 3, .. }));
}

#[test]
fn test_swap_is_placed_like_a_two_qubit_gate() {
    let topology = ZoneTopology::linear(2, 2).unwrap();
    let ops = vec![Operation::swap(q(0), q(1))];

    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    let partition = &routed.chunks[0].partition;
    assert_eq!(partition.zone_of(q(0)), partition.zone_of(q(1)));
}

// ============================================================================
// Boundary routing
// ============================================================================

#[test]
fn test_multi_hop_shuttle_precedes_first_use() {
    let topology = tapered_line();
    let ops = vec![
        Operation::rx(q(0), 0.5),              // Z0
        Operation::rx(q(1), 0.5),              // Z1
        Operation::rx(q(5), 0.5),              // Z2
        Operation::xx_phase(q(6), q(7), 0.5),  // Z4
        Operation::rx(q(8), 0.5),              // Z3
        Operation::rx(q(9), 0.5),              // device full: new chunk, Z0
        Operation::xx_phase(q(5), q(10), 0.5), // Z4
    ];

    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    assert_eq!(routed.chunks.len(), 2);
    assert_eq!(routed.chunks[0].range, 0..5);
    assert_eq!(routed.chunks[0].partition.zone_of(q(5)), Some(z(2)));
    assert_eq!(routed.chunks[1].partition.zone_of(q(5)), Some(z(4)));

    assert_eq!(routed.moves.len(), 1);
    assert_eq!(routed.moves[0].path, vec![z(2), z(3), z(4)]);
    assert_eq!(routed.shuttle_count(), 2);

    let mut expected = ops[..6].to_vec();
    expected.push(Operation::shuttle([q(5)], z(2), z(3)));
    expected.push(Operation::shuttle([q(5)], z(3), z(4)));
    expected.push(ops[6].clone());
    assert_eq!(routed.operations, expected);
}

#[test]
fn test_plan_moves_against_residency() {
    let topology = tapered_line();
    let ops = vec![
        Operation::rx(q(0), 0.5),
        Operation::rx(q(1), 0.5),
        Operation::rx(q(5), 0.5),
        Operation::xx_phase(q(6), q(7), 0.5),
        Operation::rx(q(8), 0.5),
        Operation::rx(q(9), 0.5),
        Operation::xx_phase(q(5), q(10), 0.5),
    ];
    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();

    let residency = Residency::from_partition(0, &routed.chunks[0].partition);
    assert_eq!(residency.len(), 6);
    assert_eq!(residency.zone_of(q(5)), Some(z(2)));
    assert_eq!(residency.zone_of(q(10)), None);

    let moves = plan_moves(&topology, &residency, &routed.chunks[1].partition).unwrap();
    assert_eq!(moves, routed.moves);
}

#[test]
fn test_default_residency_leaves_idle_qubits() {
    // q0 sits out chunk 1 and returns in chunk 2 in another zone.
    let topology = ZoneTopology::linear(2, 1).unwrap();
    let mut ops: Vec<_> = (0..5).map(|i| Operation::rx(q(i), 0.5)).collect();
    ops.push(Operation::rx(q(0), 0.5));

    let router = ZoneRouter::new(&topology);
    assert_eq!(router.options().residency, ResidencyPolicy::Adjacent);
    let routed = router.route(&ops).unwrap();
    assert_eq!(routed.chunks.len(), 3);
    assert!(!routed.chunks[1].partition.contains(q(0)));
    assert_eq!(routed.chunks[2].partition.zone_of(q(0)), Some(z(1)));
    assert!(routed.moves.is_empty());
    assert_eq!(routed.operations, ops);

    let persistent = ZoneRouter::new(&topology)
        .with_options(RouterOptions {
            residency: ResidencyPolicy::Persistent,
        })
        .route(&ops)
        .unwrap();
    assert_eq!(persistent.moves.len(), 1);
    assert_eq!(persistent.moves[0].path, vec![z(0), z(1)]);
}

#[test]
fn test_policy_from_options() {
    let topology = ZoneTopology::linear(2, 1).unwrap();
    let options: RouterOptions =
        serde_json::from_str(r#"{"residency": "persistent"}"#).unwrap();
    let router = ZoneRouter::new(&topology).with_options(options);
    assert_eq!(router.options().residency, ResidencyPolicy::Persistent);
}

#[test]
fn test_routed_program_keeps_input_order() {
    let topology = ZoneTopology::ring(4, 2).unwrap();
    let ops: Vec<_> = (0..12)
        .map(|i| Operation::xx_phase(q(i % 7), q((i * 3 + 1) % 7), 0.1))
        .filter(|op| op.qubits()[0] != op.qubits()[1])
        .collect();

    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    let replayed: Vec<_> = routed
        .operations
        .iter()
        .filter(|op| !op.is_shuttle())
        .cloned()
        .collect();
    assert_eq!(replayed, ops);
}

#[test]
fn test_routes_on_zone_with_maximal_capacity() {
    let topology = ZoneTopology::new(
        vec![Zone::with_capacity(z(0), u32::MAX), Zone::with_capacity(z(1), 1)],
        [(z(0), z(1))],
    )
    .unwrap();
    assert_eq!(topology.max_qubits(), u32::MAX);

    let ops = vec![
        Operation::rx(q(0), 0.5),
        Operation::xx_phase(q(0), q(1), 0.5),
    ];
    let routed = ZoneRouter::new(&topology).route(&ops).unwrap();
    let replayed: Vec<_> = routed
        .operations
        .iter()
        .filter(|op| !op.is_shuttle())
        .cloned()
        .collect();
    assert_eq!(replayed, ops);
}
