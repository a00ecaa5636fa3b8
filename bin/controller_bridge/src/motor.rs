use serde::Deserialize;
use serde_json::{json, Value};

/// Physical travel limits of motor 1.
pub const MOTOR_1_MIN: i64 = -1000;
pub const MOTOR_1_MAX: i64 = 500;

const MOTOR_2_FORWARD: i64 = 8000;
const MOTOR_2_BACKWARD: i64 = 2000;

/// Fingertip force at or above which the finger counts as closed.
pub const FSR_CLOSE_THRESHOLD_N: f64 = 2.0;
const FSR_MODE: &str = "fsr";

/// A command as it arrives from a dashboard. Every field is optional so
/// that half-formed commands are ignored instead of rejected.
#[derive(Debug, Default, Deserialize)]
pub struct IncomingCommand {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub motor: Option<i64>,
    pub action: Option<String>,
    pub dir: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    /// Drive the motor towards an end position.
    Move { id: i64, position: i64 },
    /// Hold the motor where it is.
    Hold { id: i64 },
    ModeChanged(String),
    Ignored,
}

impl BridgeAction {
    /// Payload for the motor driver, if this action targets a motor.
    pub fn motor_payload(&self) -> Option<Value> {
        match self {
            BridgeAction::Move { id, position } => {
                Some(json!({ "id": id, "mode": "move", "position": position }))
            }
            BridgeAction::Hold { id } => Some(json!({ "id": id, "mode": "stop" })),
            _ => None,
        }
    }
}

/// End position for a start command. Unknown motors get 0.
pub fn target_position(motor: i64, forward: bool) -> i64 {
    match (motor, forward) {
        (1, true) => MOTOR_1_MAX,
        (1, false) => MOTOR_1_MIN,
        (2, true) => MOTOR_2_FORWARD,
        (2, false) => MOTOR_2_BACKWARD,
        _ => 0,
    }
}

pub fn clamp_position(motor: i64, position: i64) -> i64 {
    if motor == 1 {
        position.clamp(MOTOR_1_MIN, MOTOR_1_MAX)
    } else {
        position
    }
}

pub fn translate(command: &IncomingCommand) -> BridgeAction {
    match command.kind.as_deref() {
        Some("control") => {
            let Some(id) = command.motor else {
                return BridgeAction::Ignored;
            };
            match command.action.as_deref() {
                Some("start") => {
                    // A start without a direction means forward.
                    let forward = command.dir.as_deref().unwrap_or("forward") == "forward";
                    BridgeAction::Move {
                        id,
                        position: clamp_position(id, target_position(id, forward)),
                    }
                }
                Some("stop") => BridgeAction::Hold { id },
                _ => BridgeAction::Ignored,
            }
        }
        Some("set_mode") => match &command.mode {
            Some(mode) => BridgeAction::ModeChanged(mode.clone()),
            None => BridgeAction::Ignored,
        },
        _ => BridgeAction::Ignored,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerState {
    Open,
    Close,
}

impl FingerState {
    pub fn from_force(newtons: f64) -> Self {
        if newtons >= FSR_CLOSE_THRESHOLD_N {
            FingerState::Close
        } else {
            FingerState::Open
        }
    }

    /// Motor 1 and motor 2 targets for this finger state.
    fn targets(self) -> (i64, i64) {
        match self {
            FingerState::Close => (MOTOR_1_MIN, 7000),
            FingerState::Open => (MOTOR_1_MIN, 3000),
        }
    }
}

/// Force-sensor finger control for one dashboard connection.
///
/// Active only while the dashboard is in `fsr` mode. Motor targets go out
/// only when the finger state changes; leaving `fsr` forgets the last state.
#[derive(Debug, Default)]
pub struct FsrControl {
    active: bool,
    last: Option<FingerState>,
}

impl FsrControl {
    pub fn set_mode(&mut self, mode: &str) {
        self.active = mode == FSR_MODE;
        if !self.active {
            self.last = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn on_finger(&mut self, state: FingerState) -> Option<[BridgeAction; 2]> {
        if !self.active || self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        let (m1, m2) = state.targets();
        Some([
            BridgeAction::Move { id: 1, position: clamp_position(1, m1) },
            BridgeAction::Move { id: 2, position: clamp_position(2, m2) },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ControlCommand, ControlMode, Direction, Motor};

    fn translate_wire(command: &ControlCommand) -> BridgeAction {
        let json = command.to_json().unwrap();
        translate(&serde_json::from_str(&json).unwrap())
    }

    #[test]
    fn dashboard_commands_map_to_end_positions() {
        assert_eq!(
            translate_wire(&ControlCommand::start(Motor::One, Direction::Forward)),
            BridgeAction::Move { id: 1, position: 500 }
        );
        assert_eq!(
            translate_wire(&ControlCommand::start(Motor::One, Direction::Backward)),
            BridgeAction::Move { id: 1, position: -1000 }
        );
        assert_eq!(
            translate_wire(&ControlCommand::start(Motor::Two, Direction::Forward)),
            BridgeAction::Move { id: 2, position: 8000 }
        );
        assert_eq!(
            translate_wire(&ControlCommand::start(Motor::Two, Direction::Backward)),
            BridgeAction::Move { id: 2, position: 2000 }
        );
        assert_eq!(translate_wire(&ControlCommand::stop(Motor::Two)), BridgeAction::Hold { id: 2 });
        assert_eq!(
            translate_wire(&ControlCommand::set_mode(ControlMode::Myo)),
            BridgeAction::ModeChanged("myo".to_string())
        );
    }

    #[test]
    fn loose_commands() {
        let start_without_dir: IncomingCommand =
            serde_json::from_str(r#"{"type":"control","motor":2,"action":"start"}"#).unwrap();
        assert_eq!(translate(&start_without_dir), BridgeAction::Move { id: 2, position: 8000 });

        let unknown_motor: IncomingCommand =
            serde_json::from_str(r#"{"type":"control","motor":9,"action":"start","dir":"backward"}"#).unwrap();
        assert_eq!(translate(&unknown_motor), BridgeAction::Move { id: 9, position: 0 });

        let no_motor: IncomingCommand = serde_json::from_str(r#"{"type":"control","action":"stop"}"#).unwrap();
        assert_eq!(translate(&no_motor), BridgeAction::Ignored);

        let other: IncomingCommand = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(translate(&other), BridgeAction::Ignored);
    }

    #[test]
    fn motor_one_is_clamped() {
        assert_eq!(clamp_position(1, 9000), MOTOR_1_MAX);
        assert_eq!(clamp_position(1, -5000), MOTOR_1_MIN);
        assert_eq!(clamp_position(2, 9000), 9000);
    }

    #[test]
    fn driver_payloads() {
        assert_eq!(
            BridgeAction::Move { id: 1, position: 500 }.motor_payload().unwrap().to_string(),
            r#"{"id":1,"mode":"move","position":500}"#
        );
        assert_eq!(
            BridgeAction::Hold { id: 2 }.motor_payload().unwrap().to_string(),
            r#"{"id":2,"mode":"stop"}"#
        );
        assert!(BridgeAction::Ignored.motor_payload().is_none());
    }

    fn moves(m1: i64, m2: i64) -> Option<[BridgeAction; 2]> {
        Some([
            BridgeAction::Move { id: 1, position: m1 },
            BridgeAction::Move { id: 2, position: m2 },
        ])
    }

    #[test]
    fn finger_state_follows_force() {
        assert_eq!(FingerState::from_force(0.4), FingerState::Open);
        assert_eq!(FingerState::from_force(FSR_CLOSE_THRESHOLD_N), FingerState::Close);
        assert_eq!(FingerState::from_force(3.5), FingerState::Close);
    }

    #[test]
    fn fsr_moves_only_on_state_change() {
        let mut fsr = FsrControl::default();
        assert_eq!(fsr.on_finger(FingerState::Close), None);

        fsr.set_mode("fsr");
        assert!(fsr.is_active());
        assert_eq!(fsr.on_finger(FingerState::Close), moves(-1000, 7000));
        assert_eq!(fsr.on_finger(FingerState::Close), None);
        assert_eq!(fsr.on_finger(FingerState::Open), moves(-1000, 3000));
        assert_eq!(fsr.on_finger(FingerState::Open), None);
    }

    #[test]
    fn leaving_fsr_forgets_the_last_state() {
        let mut fsr = FsrControl::default();
        fsr.set_mode("fsr");
        assert!(fsr.on_finger(FingerState::Close).is_some());

        fsr.set_mode("myo");
        assert!(!fsr.is_active());
        assert_eq!(fsr.on_finger(FingerState::Open), None);

        fsr.set_mode("fsr");
        assert_eq!(fsr.on_finger(FingerState::Close), moves(-1000, 7000));
    }

    #[test]
    fn fsr_reselect_keeps_the_last_state() {
        let mut fsr = FsrControl::default();
        fsr.set_mode("fsr");
        assert!(fsr.on_finger(FingerState::Open).is_some());
        fsr.set_mode("fsr");
        assert_eq!(fsr.on_finger(FingerState::Open), None);
    }
}
