//! Connection Directions
//!
//! The four cardinal directions a connector can join a neighbour at. Pieces
//! store them in their own local frame; adjacency tests work in world space
//! after turning them by the piece's yaw rounded to a quarter turn.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::world::yaw_degrees;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionDirection {
    Front,
    Back,
    Right,
    Left,
}

impl ConnectionDirection {
    /// Order in which neighbours are probed.
    pub const ALL: [ConnectionDirection; 4] = [
        ConnectionDirection::Front,
        ConnectionDirection::Back,
        ConnectionDirection::Right,
        ConnectionDirection::Left,
    ];

    pub fn vector(&self) -> Vec3 {
        match self {
            ConnectionDirection::Front => Vec3::Z,
            ConnectionDirection::Back => Vec3::NEG_Z,
            ConnectionDirection::Right => Vec3::X,
            ConnectionDirection::Left => Vec3::NEG_X,
        }
    }

    pub fn inverse(&self) -> ConnectionDirection {
        match self {
            ConnectionDirection::Front => ConnectionDirection::Back,
            ConnectionDirection::Back => ConnectionDirection::Front,
            ConnectionDirection::Right => ConnectionDirection::Left,
            ConnectionDirection::Left => ConnectionDirection::Right,
        }
    }

    /// Closest cardinal direction to a horizontal vector.
    pub fn from_vector(v: Vec3) -> ConnectionDirection {
        if v.x.abs() > v.z.abs() {
            if v.x > 0.0 {
                ConnectionDirection::Right
            } else {
                ConnectionDirection::Left
            }
        } else if v.z >= 0.0 {
            ConnectionDirection::Front
        } else {
            ConnectionDirection::Back
        }
    }

    /// This local direction turned by `rotation`'s yaw, rounded to 90°.
    pub fn rotated(&self, rotation: Quat) -> ConnectionDirection {
        let quarter = (yaw_degrees(rotation) / 90.0).round() * 90.0;
        ConnectionDirection::from_vector(Quat::from_rotation_y(quarter.to_radians()) * self.vector())
    }
}

/// Turn a list of local directions into world directions.
pub fn to_world(directions: &[ConnectionDirection], rotation: Quat) -> Vec<ConnectionDirection> {
    directions.iter().map(|d| d.rotated(rotation)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_pairs() {
        for dir in ConnectionDirection::ALL {
            assert_eq!(dir.inverse().inverse(), dir);
            assert_eq!(dir.inverse().vector(), -dir.vector());
        }
    }

    #[test]
    fn test_quarter_turn_maps_front_to_right() {
        let quarter = Quat::from_rotation_y(90f32.to_radians());
        assert_eq!(ConnectionDirection::Front.rotated(quarter), ConnectionDirection::Right);
        assert_eq!(ConnectionDirection::Right.rotated(quarter), ConnectionDirection::Back);
    }

    #[test]
    fn test_rotation_rounds_to_quarter_turns() {
        let almost = Quat::from_rotation_y(80f32.to_radians());
        assert_eq!(
            to_world(&[ConnectionDirection::Front, ConnectionDirection::Left], almost),
            vec![ConnectionDirection::Right, ConnectionDirection::Front]
        );
    }
}
