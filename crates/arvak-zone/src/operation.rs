//! Operations consumed and emitted by the zone router.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::qubit::QubitId;
use crate::zone::ZoneId;

/// Rotation axis of a single-qubit pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    /// Rotation about X.
    X,
    /// Rotation about Y.
    Y,
    /// Rotation about Z.
    Z,
}

/// A multi-zone operation.
///
/// The variant set is closed: placement only looks at [`Operation::arity`]
/// and [`Operation::qubits`], the payloads pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Single-qubit rotation.
    SingleQubitGate {
        /// Target qubit.
        qubit: QubitId,
        /// Rotation axis.
        axis: RotationAxis,
        /// Pulse area in units of pi.
        pulse_area: f64,
    },
    /// XX-phase interaction between two qubits.
    TwoQubitGate {
        /// First qubit.
        qubit_a: QubitId,
        /// Second qubit.
        qubit_b: QubitId,
        /// Pulse area in units of pi.
        pulse_area: f64,
    },
    /// Move a set of qubits from one zone to an adjacent one.
    Shuttle {
        /// Qubits moved together.
        qubits: BTreeSet<QubitId>,
        /// Zone the qubits leave.
        start_zone: ZoneId,
        /// Zone the qubits arrive in.
        target_zone: ZoneId,
    },
    /// Exchange the positions of two qubits.
    Swap {
        /// First qubit.
        qubit_a: QubitId,
        /// Second qubit.
        qubit_b: QubitId,
    },
}

impl Operation {
    /// X rotation.
    pub fn rx(qubit: QubitId, pulse_area: f64) -> Self {
        Self::rotation(qubit, RotationAxis::X, pulse_area)
    }

    /// Y rotation.
    pub fn ry(qubit: QubitId, pulse_area: f64) -> Self {
        Self::rotation(qubit, RotationAxis::Y, pulse_area)
    }

    /// Z rotation.
    pub fn rz(qubit: QubitId, pulse_area: f64) -> Self {
        Self::rotation(qubit, RotationAxis::Z, pulse_area)
    }

    fn rotation(qubit: QubitId, axis: RotationAxis, pulse_area: f64) -> Self {
        Self::SingleQubitGate {
            qubit,
            axis,
            pulse_area,
        }
    }

    /// XX-phase gate.
    pub fn xx_phase(qubit_a: QubitId, qubit_b: QubitId, pulse_area: f64) -> Self {
        Self::TwoQubitGate {
            qubit_a,
            qubit_b,
            pulse_area,
        }
    }

    /// Swap gate.
    pub fn swap(qubit_a: QubitId, qubit_b: QubitId) -> Self {
        Self::Swap { qubit_a, qubit_b }
    }

    /// Shuttle a set of qubits one hop.
    pub fn shuttle(
        qubits: impl IntoIterator<Item = QubitId>,
        start_zone: ZoneId,
        target_zone: ZoneId,
    ) -> Self {
        Self::Shuttle {
            qubits: qubits.into_iter().collect(),
            start_zone,
            target_zone,
        }
    }

    /// Short name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleQubitGate { .. } => "single_qubit_gate",
            Self::TwoQubitGate { .. } => "two_qubit_gate",
            Self::Shuttle { .. } => "shuttle",
            Self::Swap { .. } => "swap",
        }
    }

    /// Number of qubits the operation touches.
    pub fn arity(&self) -> usize {
        match self {
            Self::SingleQubitGate { .. } => 1,
            Self::TwoQubitGate { .. } | Self::Swap { .. } => 2,
            Self::Shuttle { qubits, .. } => qubits.len(),
        }
    }

    /// Qubits the operation touches, in operand order.
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Self::SingleQubitGate { qubit, .. } => vec![*qubit],
            Self::TwoQubitGate {
                qubit_a, qubit_b, ..
            }
            | Self::Swap { qubit_a, qubit_b } => vec![*qubit_a, *qubit_b],
            Self::Shuttle { qubits, .. } => qubits.iter().copied().collect(),
        }
    }

    /// Check if the operation touches `qubit`.
    pub fn touches(&self, qubit: QubitId) -> bool {
        match self {
            Self::SingleQubitGate { qubit: q, .. } => *q == qubit,
            Self::TwoQubitGate {
                qubit_a, qubit_b, ..
            }
            | Self::Swap { qubit_a, qubit_b } => *qubit_a == qubit || *qubit_b == qubit,
            Self::Shuttle { qubits, .. } => qubits.contains(&qubit),
        }
    }

    /// Check if this is a shuttle.
    pub fn is_shuttle(&self) -> bool {
        matches!(self, Self::Shuttle { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleQubitGate {
                qubit,
                axis,
                pulse_area,
            } => {
                let axis = match axis {
                    RotationAxis::X => "rx",
                    RotationAxis::Y => "ry",
                    RotationAxis::Z => "rz",
                };
                write!(f, "{axis}({pulse_area}) {qubit}")
            }
            Self::TwoQubitGate {
                qubit_a,
                qubit_b,
                pulse_area,
            } => write!(f, "xx({pulse_area}) {qubit_a}, {qubit_b}"),
            Self::Shuttle {
                qubits,
                start_zone,
                target_zone,
            } => {
                let names: Vec<_> = qubits.iter().map(ToString::to_string).collect();
                write!(f, "shuttle {{{}}} {start_zone} -> {target_zone}", names.join(", "))
            }
            Self::Swap { qubit_a, qubit_b } => write!(f, "swap {qubit_a}, {qubit_b}"),
        }
    }
}
