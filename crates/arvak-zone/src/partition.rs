//! Partition state: which qubit groups live in which zone.
//!
//! A [`Partition`] holds, per zone, an ordered list of disjoint qubit groups
//! plus a reverse index from qubit to [`GroupSlot`]. The zone lists are the
//! source of truth; the reverse index is updated alongside every mutation.
//!
//! Every mutating primitive is atomic: it either succeeds, or returns a
//! [`PlacementError`] and leaves the partition exactly as it was. No zone
//! ever holds more than its `max_occupancy`, not even transiently.
//!
//! Group slots are never reused inside a partition. A merge empties the donor
//! group but keeps its slot, so a [`GroupSlot`] handed out earlier either
//! still names the same group or names an empty one.

use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;
use tracing::trace;

use crate::error::{PlacementError, ZoneError, ZoneResult};
use crate::operation::Operation;
use crate::qubit::QubitId;
use crate::topology::ZoneTopology;
use crate::zone::{Zone, ZoneId};

/// Handle to a group: zone position in the partition plus group position
/// within that zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupSlot {
    /// Position of the zone in the partition (declaration order).
    pub zone: usize,
    /// Position of the group within the zone.
    pub group: usize,
}

impl fmt::Display for GroupSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone slot {}, group {}", self.zone, self.group)
    }
}

/// Outcome of offering an operation to a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accommodation {
    /// The operation's qubits are co-located as required.
    Placed,
    /// The partition could not take the operation and was left unchanged.
    Rejected(PlacementError),
}

impl Accommodation {
    /// Check if the operation was accommodated.
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed)
    }
}

impl From<Result<(), PlacementError>> for Accommodation {
    fn from(result: Result<(), PlacementError>) -> Self {
        match result {
            Ok(()) => Self::Placed,
            Err(err) => Self::Rejected(err),
        }
    }
}

#[derive(Debug, Clone)]
struct ZoneGroups {
    zone: Zone,
    groups: Vec<BTreeSet<QubitId>>,
    occupied: u32,
}

impl ZoneGroups {
    fn spare(&self) -> u32 {
        self.zone.max_occupancy.saturating_sub(self.occupied)
    }
}

/// Assignment of qubit groups to zones for one chunk of operations.
#[derive(Debug, Clone)]
pub struct Partition {
    zones: Vec<ZoneGroups>,
    qubit_index: FxHashMap<QubitId, GroupSlot>,
    /// Zone positions, smallest capacity first.
    singleton_order: Vec<usize>,
    /// Zone positions, largest capacity first.
    pair_order: Vec<usize>,
    max_qubits: u32,
}

impl Partition {
    /// Create an empty partition over the zones of `topology`.
    pub fn new(topology: &ZoneTopology) -> Self {
        let zones: Vec<_> = topology
            .zones()
            .map(|&zone| ZoneGroups {
                zone,
                groups: vec![],
                occupied: 0,
            })
            .collect();

        let mut singleton_order: Vec<usize> = (0..zones.len()).collect();
        singleton_order.sort_by_key(|&i| (zones[i].zone.max_occupancy, zones[i].zone.id));
        let mut pair_order: Vec<usize> = (0..zones.len()).collect();
        pair_order.sort_by_key(|&i| (Reverse(zones[i].zone.max_occupancy), zones[i].zone.id));

        Self {
            zones,
            qubit_index: FxHashMap::default(),
            singleton_order,
            pair_order,
            max_qubits: topology.max_qubits(),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Number of placed qubits.
    pub fn len(&self) -> usize {
        self.qubit_index.len()
    }

    /// Check if no qubit has been placed.
    pub fn is_empty(&self) -> bool {
        self.qubit_index.is_empty()
    }

    /// Check if `qubit` has a placement.
    pub fn contains(&self, qubit: QubitId) -> bool {
        self.qubit_index.contains_key(&qubit)
    }

    /// Placed qubits, sorted by id.
    pub fn placed_qubits(&self) -> Vec<QubitId> {
        let mut qubits: Vec<_> = self.qubit_index.keys().copied().collect();
        qubits.sort_unstable();
        qubits
    }

    /// Group handle of a placed qubit.
    pub fn slot_of(&self, qubit: QubitId) -> Option<GroupSlot> {
        self.qubit_index.get(&qubit).copied()
    }

    /// Zone of a placed qubit.
    pub fn zone_of(&self, qubit: QubitId) -> Option<ZoneId> {
        self.slot_of(qubit).map(|slot| self.zones[slot.zone].zone.id)
    }

    /// Zone id at a partition position.
    pub fn zone_id(&self, position: usize) -> Option<ZoneId> {
        self.zones.get(position).map(|z| z.zone.id)
    }

    /// Members of a live group. Empty (merged-away) groups yield `None`.
    pub fn group(&self, slot: GroupSlot) -> Option<&BTreeSet<QubitId>> {
        self.zones
            .get(slot.zone)
            .and_then(|z| z.groups.get(slot.group))
            .filter(|g| !g.is_empty())
    }

    /// Members of the group `qubit` belongs to.
    pub fn group_of(&self, qubit: QubitId) -> Option<&BTreeSet<QubitId>> {
        self.slot_of(qubit).and_then(|slot| self.group(slot))
    }

    /// Live groups of a zone, in slot order.
    pub fn zone_groups(&self, zone: ZoneId) -> impl Iterator<Item = &BTreeSet<QubitId>> + '_ {
        self.position(zone)
            .into_iter()
            .flat_map(move |i| self.zones[i].groups.iter())
            .filter(|g| !g.is_empty())
    }

    /// Number of qubits currently in a zone.
    pub fn occupancy(&self, zone: ZoneId) -> Option<u32> {
        self.position(zone).map(|i| self.zones[i].occupied)
    }

    /// Free capacity of a zone.
    pub fn free_capacity(&self, zone: ZoneId) -> Option<u32> {
        self.position(zone).map(|i| self.zones[i].spare())
    }

    /// Remaining room under the device-wide qubit limit.
    pub fn unused_capacity(&self) -> u32 {
        let placed = u32::try_from(self.len()).unwrap_or(u32::MAX);
        self.max_qubits.saturating_sub(placed)
    }

    /// Zones holding fewer qubits than their `min_occupancy`.
    pub fn underoccupied_zones(&self) -> Vec<ZoneId> {
        self.zones
            .iter()
            .filter(|z| z.occupied < z.zone.min_occupancy)
            .map(|z| z.zone.id)
            .collect()
    }

    fn position(&self, zone: ZoneId) -> Option<usize> {
        self.zones.iter().position(|z| z.zone.id == zone)
    }

    fn has_room_for(&self, new_qubits: u32) -> bool {
        self.unused_capacity() >= new_qubits
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Place a qubit with no locality preference.
    ///
    /// Placing an already placed qubit is a no-op. Otherwise zones are tried
    /// smallest capacity first so that large zones stay free for groups that
    /// still have to grow.
    pub fn place_singleton(&mut self, qubit: QubitId) -> Result<(), PlacementError> {
        if self.contains(qubit) {
            return Ok(());
        }
        if !self.has_room_for(1) {
            return Err(PlacementError::NoCapacity);
        }
        let position = self
            .singleton_order
            .iter()
            .copied()
            .find(|&i| self.zones[i].spare() >= 1)
            .ok_or(PlacementError::NoCapacity)?;

        let slot = self.open_group(position, [qubit]);
        trace!(%qubit, zone = %self.zones[position].zone.id, group = slot.group, "placed singleton");
        Ok(())
    }

    /// Place two unplaced qubits together in a new group.
    ///
    /// Zones are tried largest capacity first, since a fresh pair is likely
    /// to grow.
    pub fn place_pair(&mut self, qubit_a: QubitId, qubit_b: QubitId) -> Result<(), PlacementError> {
        if qubit_a == qubit_b {
            return self.place_singleton(qubit_a);
        }
        for qubit in [qubit_a, qubit_b] {
            if self.contains(qubit) {
                return Err(PlacementError::AlreadyPlaced(qubit));
            }
        }
        if !self.has_room_for(2) {
            return Err(PlacementError::NoCapacity);
        }
        let position = self
            .pair_order
            .iter()
            .copied()
            .find(|&i| self.zones[i].spare() >= 2)
            .ok_or(PlacementError::NoCapacity)?;

        let slot = self.open_group(position, [qubit_a, qubit_b]);
        trace!(%qubit_a, %qubit_b, zone = %self.zones[position].zone.id, group = slot.group, "placed pair");
        Ok(())
    }

    /// Add an unplaced qubit to an existing group.
    pub fn extend_group(&mut self, qubit: QubitId, slot: GroupSlot) -> Result<(), PlacementError> {
        if self.contains(qubit) {
            return Err(PlacementError::AlreadyPlaced(qubit));
        }
        if self.group(slot).is_none() {
            return Err(PlacementError::UnknownGroup(slot));
        }
        if !self.has_room_for(1) || self.zones[slot.zone].spare() < 1 {
            return Err(PlacementError::NoCapacity);
        }

        let zone = &mut self.zones[slot.zone];
        zone.groups[slot.group].insert(qubit);
        zone.occupied += 1;
        self.qubit_index.insert(qubit, slot);
        trace!(%qubit, %slot, "extended group");
        Ok(())
    }

    /// Union the groups of two placed qubits.
    ///
    /// Within one zone the merge always succeeds (occupancy is unchanged) and
    /// the lower group slot survives. Across zones, a group moves into the
    /// other zone only if that zone's free capacity strictly exceeds the
    /// group's size, so an absorbing zone is never left completely full.
    /// When both directions fit, the smaller group moves; on equal sizes the
    /// zone with more free capacity absorbs, then the lower zone position.
    /// The outcome therefore does not depend on argument order.
    pub fn merge_groups(&mut self, qubit_a: QubitId, qubit_b: QubitId) -> Result<(), PlacementError> {
        let slot_a = self.slot_of(qubit_a).ok_or(PlacementError::NotPlaced(qubit_a))?;
        let slot_b = self.slot_of(qubit_b).ok_or(PlacementError::NotPlaced(qubit_b))?;

        if slot_a == slot_b {
            return Ok(());
        }

        if slot_a.zone == slot_b.zone {
            let (target, donor) = if slot_a < slot_b {
                (slot_a, slot_b)
            } else {
                (slot_b, slot_a)
            };
            self.absorb(target, donor);
            return Ok(());
        }

        let size_a = self.group_len(slot_a);
        let size_b = self.group_len(slot_b);
        let spare_a = self.zones[slot_a.zone].spare();
        let spare_b = self.zones[slot_b.zone].spare();

        let (target, donor) = match (spare_a > size_b, spare_b > size_a) {
            (true, true) => {
                // Rank each candidate target; the higher rank absorbs.
                let rank_a = (Reverse(size_b), spare_a, Reverse(slot_a.zone));
                let rank_b = (Reverse(size_a), spare_b, Reverse(slot_b.zone));
                if rank_a > rank_b {
                    (slot_a, slot_b)
                } else {
                    (slot_b, slot_a)
                }
            }
            (true, false) => (slot_a, slot_b),
            (false, true) => (slot_b, slot_a),
            (false, false) => return Err(PlacementError::CapacityExceeded),
        };
        self.absorb(target, donor);
        Ok(())
    }

    /// Seed an unplaced qubit into a specific zone as a new group.
    ///
    /// Used to impose an initial layout. Fails with
    /// [`ZoneError::UnknownZone`] if the zone is not part of the device.
    pub fn place_in_zone(&mut self, qubit: QubitId, zone: ZoneId) -> ZoneResult<Accommodation> {
        let position = self.position(zone).ok_or(ZoneError::UnknownZone(zone))?;
        if self.contains(qubit) {
            return Ok(Accommodation::Rejected(PlacementError::AlreadyPlaced(qubit)));
        }
        if !self.has_room_for(1) || self.zones[position].spare() < 1 {
            return Ok(Accommodation::Rejected(PlacementError::NoCapacity));
        }
        self.open_group(position, [qubit]);
        Ok(Accommodation::Placed)
    }

    /// Offer one operation to the partition.
    ///
    /// Dispatch by arity:
    /// - one qubit: [`place_singleton`](Self::place_singleton)
    /// - two unplaced qubits: [`place_pair`](Self::place_pair)
    /// - one placed, one unplaced: [`extend_group`](Self::extend_group)
    /// - two placed qubits: [`merge_groups`](Self::merge_groups)
    ///
    /// Capacity failures come back as [`Accommodation::Rejected`]. Any
    /// other arity, or a two-qubit operation naming one qubit twice, is a
    /// fatal error.
    pub fn try_accommodate(&mut self, operation: &Operation) -> ZoneResult<Accommodation> {
        let qubits = operation.qubits();
        let result = match qubits.as_slice() {
            [qubit] => self.place_singleton(*qubit),
            [a, b] if a == b => {
                return Err(ZoneError::DuplicateQubit {
                    qubit: *a,
                    operation: operation.name(),
                });
            }
            [a, b] => match (self.slot_of(*a), self.slot_of(*b)) {
                (None, None) => self.place_pair(*a, *b),
                (Some(slot), None) => self.extend_group(*b, slot),
                (None, Some(slot)) => self.extend_group(*a, slot),
                (Some(_), Some(_)) => self.merge_groups(*a, *b),
            },
            _ => {
                return Err(ZoneError::UnsupportedArity {
                    operation: operation.name(),
                    arity: qubits.len(),
                });
            }
        };
        Ok(result.into())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn group_len(&self, slot: GroupSlot) -> u32 {
        let len = self.zones[slot.zone].groups[slot.group].len();
        u32::try_from(len).unwrap_or(u32::MAX)
    }

    /// Append a new group. Capacity must already have been checked.
    fn open_group<const N: usize>(&mut self, position: usize, qubits: [QubitId; N]) -> GroupSlot {
        let zone = &mut self.zones[position];
        let slot = GroupSlot {
            zone: position,
            group: zone.groups.len(),
        };
        zone.groups.push(qubits.iter().copied().collect());
        zone.occupied += N as u32;
        for qubit in qubits {
            self.qubit_index.insert(qubit, slot);
        }
        slot
    }

    /// Move every member of `donor` into `target` and empty `donor`.
    /// Capacity must already have been checked.
    fn absorb(&mut self, target: GroupSlot, donor: GroupSlot) {
        let moved = std::mem::take(&mut self.zones[donor.zone].groups[donor.group]);
        let count = u32::try_from(moved.len()).unwrap_or(u32::MAX);
        for &qubit in &moved {
            self.qubit_index.insert(qubit, target);
        }
        self.zones[donor.zone].occupied -= count;
        self.zones[target.zone].occupied += count;
        self.zones[target.zone].groups[target.group].extend(moved);
        trace!(%target, %donor, moved = count, "merged groups");
    }
}
