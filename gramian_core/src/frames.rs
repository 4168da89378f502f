// gramian_core/src/frames.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the reference frame a quantity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameId {
    /// The fixed inertial frame (x right, y forward, z up).
    World,
    /// The frame attached to the observed rigid object.
    Body,
}

/// A variable of the velocity state integrated by a dynamics model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    Vx(FrameId),
    Vy(FrameId),
    Vz(FrameId),
    Wx(FrameId),
    Wy(FrameId),
    Wz(FrameId),
}

/// The six pose degrees of freedom, in Gramian row/column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dof {
    X,
    Y,
    Z,
    RotX,
    RotY,
    RotZ,
}

impl Dof {
    pub const ALL: [Dof; 6] = [Dof::X, Dof::Y, Dof::Z, Dof::RotX, Dof::RotY, Dof::RotZ];

    /// Row/column of this degree of freedom in a Gramian.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn is_translation(self) -> bool {
        matches!(self, Dof::X | Dof::Y | Dof::Z)
    }

    /// Axis index (0 = x, 1 = y, 2 = z) shared by translations and rotations.
    pub fn axis(self) -> usize {
        self.index() % 3
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Dof::X => "x",
            Dof::Y => "y",
            Dof::Z => "z",
            Dof::RotX => "rot-x",
            Dof::RotY => "rot-y",
            Dof::RotZ => "rot-z",
        };
        write!(f, "{label}")
    }
}

/// Layout of the rigid-body velocity state integrated by the Newton-Euler model:
/// translational velocity in the world frame, angular velocity in the body frame.
pub fn rigid_body_velocity_layout() -> Vec<StateVariable> {
    vec![
        StateVariable::Vx(FrameId::World),
        StateVariable::Vy(FrameId::World),
        StateVariable::Vz(FrameId::World),
        StateVariable::Wx(FrameId::Body),
        StateVariable::Wy(FrameId::Body),
        StateVariable::Wz(FrameId::Body),
    ]
}
