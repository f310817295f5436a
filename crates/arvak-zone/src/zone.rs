//! Zones: capacity-bounded locations that hold qubits.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ZoneError, ZoneResult};

/// Identifier of a zone in the device topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z{}", self.0)
    }
}

impl From<u32> for ZoneId {
    fn from(id: u32) -> Self {
        ZoneId(id)
    }
}

/// A zone with its occupancy bounds. Immutable once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier.
    pub id: ZoneId,
    /// Maximum number of qubits the zone can hold at once.
    pub max_occupancy: u32,
    /// Minimum number of qubits the zone should hold.
    #[serde(default)]
    pub min_occupancy: u32,
}

impl Zone {
    /// Create a zone, checking `min_occupancy <= max_occupancy`.
    pub fn new(id: ZoneId, min_occupancy: u32, max_occupancy: u32) -> ZoneResult<Self> {
        let zone = Self {
            id,
            max_occupancy,
            min_occupancy,
        };
        zone.validate()?;
        Ok(zone)
    }

    /// Create a zone with no minimum occupancy.
    pub fn with_capacity(id: ZoneId, max_occupancy: u32) -> Self {
        Self {
            id,
            max_occupancy,
            min_occupancy: 0,
        }
    }

    /// Check the occupancy bounds.
    ///
    /// Deserialized zones bypass [`Zone::new`], so the topology calls this
    /// again at construction.
    pub fn validate(&self) -> ZoneResult<()> {
        if self.min_occupancy > self.max_occupancy {
            return Err(ZoneError::InvalidOccupancy {
                zone: self.id,
                min: self.min_occupancy,
                max: self.max_occupancy,
            });
        }
        Ok(())
    }

    /// `(min_occupancy, max_occupancy)`.
    pub fn bounds(&self) -> (u32, u32) {
        (self.min_occupancy, self.max_occupancy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_new_valid() {
        let zone = Zone::new(ZoneId(2), 1, 4).unwrap();
        assert_eq!(zone.id, ZoneId(2));
        assert_eq!(zone.bounds(), (1, 4));
    }

    #[test]
    fn test_zone_new_inverted_bounds() {
        let result = Zone::new(ZoneId(0), 5, 2);
        assert!(matches!(
            result,
            Err(ZoneError::InvalidOccupancy { min: 5, max: 2, .. })
        ));
    }

    #[test]
    fn test_zone_zero_capacity_is_valid() {
        assert!(Zone::new(ZoneId(0), 0, 0).is_ok());
    }

    #[test]
    fn test_zone_deserialize_default_min() {
        let zone: Zone = serde_json::from_str(r#"{"id": 3, "max_occupancy": 6}"#).unwrap();
        assert_eq!(zone, Zone::with_capacity(ZoneId(3), 6));
    }
}
