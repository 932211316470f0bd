//! Wire types shared with the message bus: commands, telemetry, and the
//! reserved sentinel values that overload a `Command` as a mode directive.

use serde::{Deserialize, Serialize};

/// Latitude value marking a `Command` as a mode directive rather than a
/// navigation target. The opcode rides in the `longitude` field.
pub const EMERGENCY_LAT: f64 = -1000.0;

/// Coordinate value meaning "no maneuver recommended" when present in all
/// three coordinate fields of an avoidance candidate.
pub const INVALID_COORDINATE: f64 = -1000.0;

/// A waypoint command: either a navigation target for a specific vehicle or,
/// flagged by [`EMERGENCY_LAT`], a mode directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Vehicle this command is addressed to
    pub target_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub param: i32,
    pub sequence_id: u32,
}

impl Command {
    /// A placeholder goal for a vehicle that has not yet been given a target:
    /// own id, no coordinates.
    pub fn empty_goal(target_id: u32) -> Self {
        Self {
            target_id,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            param: 0,
            sequence_id: 0,
        }
    }

    /// Whether this command is a mode directive (reserved latitude).
    pub fn is_meta(&self) -> bool {
        self.latitude == EMERGENCY_LAT
    }

    /// Whether this is the "no maneuver recommended" candidate.
    pub fn is_no_maneuver(&self) -> bool {
        self.latitude == INVALID_COORDINATE
            && self.longitude == INVALID_COORDINATE
            && self.altitude == INVALID_COORDINATE
    }

    /// The "no maneuver" candidate itself.
    pub fn no_maneuver(target_id: u32) -> Self {
        Self {
            target_id,
            latitude: INVALID_COORDINATE,
            longitude: INVALID_COORDINATE,
            altitude: INVALID_COORDINATE,
            param: 0,
            sequence_id: 0,
        }
    }
}

/// Mode-control opcode carried in the `longitude` field of a meta-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaOpcode {
    /// Switch to avoidance-driven emission
    StartAvoidance,
    /// Stop emitting entirely
    Stop,
    /// Switch to direct goal emission
    StartDirect,
}

impl MetaOpcode {
    /// Decode an opcode from the longitude of a meta-command.
    /// Unrecognized values yield `None`; the command is then dropped.
    pub fn decode(longitude: f64) -> Option<Self> {
        match longitude as i32 {
            0 => Some(Self::StartAvoidance),
            1 => Some(Self::Stop),
            2 => Some(Self::StartDirect),
            _ => None,
        }
    }
}

/// Telemetry sample from any vehicle on the bus (including our own).
/// Opaque to the arbiter: it is handed to the avoidance planner untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Originating vehicle
    pub vehicle_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub heading: f64,
    pub ground_speed: f64,
    pub sequence_id: u32,
}

/// Inbound message from the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    Telemetry(Telemetry),
    Command(Command),
}

/// Identity resolution response: our own id plus an initial position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub vehicle_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_opcode_decode() {
        assert_eq!(MetaOpcode::decode(0.0), Some(MetaOpcode::StartAvoidance));
        assert_eq!(MetaOpcode::decode(1.0), Some(MetaOpcode::Stop));
        assert_eq!(MetaOpcode::decode(2.0), Some(MetaOpcode::StartDirect));
        assert_eq!(MetaOpcode::decode(3.0), None);
        assert_eq!(MetaOpcode::decode(-7.0), None);
        // fractional longitudes truncate, matching the original cast
        assert_eq!(MetaOpcode::decode(1.9), Some(MetaOpcode::Stop));
    }

    #[test]
    fn meta_flag_and_no_maneuver() {
        let mut cmd = Command::empty_goal(7);
        assert!(!cmd.is_meta());
        cmd.latitude = EMERGENCY_LAT;
        assert!(cmd.is_meta());

        let none = Command::no_maneuver(7);
        assert!(none.is_no_maneuver());
        // all three coordinates must match the sentinel
        let mut partial = Command::no_maneuver(7);
        partial.altitude = 120.0;
        assert!(!partial.is_no_maneuver());
    }

    #[test]
    fn bus_message_decode() {
        let json = r#"{"type":"command","target_id":3,"latitude":10.0,
            "longitude":20.0,"altitude":30.0,"param":2,"sequence_id":5}"#;
        match serde_json::from_str::<BusMessage>(json).unwrap() {
            BusMessage::Command(c) => {
                assert_eq!(c.target_id, 3);
                assert_eq!(c.latitude, 10.0);
            }
            other => panic!("expected command, got {:?}", other),
        }

        let json = r#"{"type":"telemetry","vehicle_id":3,"latitude":1.0,
            "longitude":2.0,"altitude":3.0,"heading":90.0,
            "ground_speed":11.0,"sequence_id":1}"#;
        assert!(matches!(
            serde_json::from_str::<BusMessage>(json).unwrap(),
            BusMessage::Telemetry(_)
        ));
    }
}
