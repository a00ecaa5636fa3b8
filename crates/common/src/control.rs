use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// Which input source drives the finger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Local keyboard control, test mode allowed.
    #[default]
    Ui,
    /// EMG band drives the controller.
    Myo,
    /// Force sensor drives the controller.
    Fsr,
}

impl ControlMode {
    pub const ALL: [ControlMode; 3] = [ControlMode::Ui, ControlMode::Myo, ControlMode::Fsr];

    pub fn as_str(self) -> &'static str {
        match self {
            ControlMode::Ui => "ui",
            ControlMode::Myo => "myo",
            ControlMode::Fsr => "fsr",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ui" => Ok(ControlMode::Ui),
            "myo" => Ok(ControlMode::Myo),
            "fsr" => Ok(ControlMode::Fsr),
            other => Err(format!("unknown control mode {other:?} (expected ui, myo or fsr)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub const ALL: [Key; 4] = [Key::Up, Key::Down, Key::Left, Key::Right];

    /// Vertical keys drive motor 1, horizontal keys drive motor 2.
    pub fn motor(self) -> Motor {
        match self {
            Key::Up | Key::Down => Motor::One,
            Key::Left | Key::Right => Motor::Two,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Key::Up | Key::Right => Direction::Forward,
            Key::Down | Key::Left => Direction::Backward,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Key::Up),
            "down" => Ok(Key::Down),
            "left" => Ok(Key::Left),
            "right" => Ok(Key::Right),
            other => Err(format!("unknown key {other:?} (expected up, down, left or right)")),
        }
    }
}

/// Currently held directional keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyState {
    pub fn is_pressed(&self, key: Key) -> bool {
        match key {
            Key::Up => self.up,
            Key::Down => self.down,
            Key::Left => self.left,
            Key::Right => self.right,
        }
    }

    pub fn set(&mut self, key: Key, pressed: bool) {
        let slot = match key {
            Key::Up => &mut self.up,
            Key::Down => &mut self.down,
            Key::Left => &mut self.left,
            Key::Right => &mut self.right,
        };
        *slot = pressed;
    }

    pub fn any_pressed(&self) -> bool {
        Key::ALL.iter().any(|k| self.is_pressed(*k))
    }

    /// Motors with at least one key held, each listed once.
    pub fn held_motors(&self) -> Vec<Motor> {
        let mut motors = Vec::with_capacity(2);
        for key in Key::ALL {
            if self.is_pressed(key) && !motors.contains(&key.motor()) {
                motors.push(key.motor());
            }
        }
        motors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Motor {
    One,
    Two,
}

impl From<Motor> for u8 {
    fn from(motor: Motor) -> u8 {
        match motor {
            Motor::One => 1,
            Motor::Two => 2,
        }
    }
}

impl TryFrom<u8> for Motor {
    type Error = String;

    fn try_from(id: u8) -> std::result::Result<Self, Self::Error> {
        match id {
            1 => Ok(Motor::One),
            2 => Ok(Motor::Two),
            other => Err(format!("unknown motor id {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorAction {
    Start,
    Stop,
}

/// Outbound intent for the controller process. Emitted once, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlCommand {
    Control {
        motor: Motor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<Direction>,
        action: MotorAction,
    },
    SetMode {
        mode: ControlMode,
    },
}

impl ControlCommand {
    pub fn start(motor: Motor, dir: Direction) -> Self {
        ControlCommand::Control {
            motor,
            dir: Some(dir),
            action: MotorAction::Start,
        }
    }

    pub fn stop(motor: Motor) -> Self {
        ControlCommand::Control {
            motor,
            dir: None,
            action: MotorAction::Stop,
        }
    }

    pub fn set_mode(mode: ControlMode) -> Self {
        ControlCommand::SetMode { mode }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(TelemetryError::Encode)
    }
}
