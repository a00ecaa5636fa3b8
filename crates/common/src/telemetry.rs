use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TelemetryError};
use crate::rolling_log::{RollingLog, DEFAULT_LOG_CAPACITY};

pub const EMG_CHANNELS: usize = 8;
pub const FLEX_MAX: u8 = 90;
pub const EMG_MAX: u8 = 100;
pub const STARTUP_LOG_ENTRY: &str = "Started...";

/// Joint angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Angles {
    pub j1: f64,
    pub j2: f64,
    pub j3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(deserialize_with = "flex_reading")]
    pub flex: u8,
    /// Newtons, always carried as a decimal string.
    #[serde(deserialize_with = "force_reading")]
    pub force: String,
}

impl Default for Sensors {
    fn default() -> Self {
        Self {
            flex: 0,
            force: format_force(0.0),
        }
    }
}

/// EMG band intensities, one per channel, 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Myo {
    #[serde(deserialize_with = "emg_channels")]
    pub emg: [u8; EMG_CHANNELS],
}

/// One inbound message. Every field is optional; absent fields leave the
/// snapshot's previous value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angles: Option<Angles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Sensors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub myo: Option<Myo>,
}

impl TelemetryFrame {
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(TelemetryError::MalformedFrame)
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_none() && self.sensors.is_none() && self.myo.is_none()
    }
}

/// Authoritative "current robot state" read by renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub angles: Angles,
    pub sensors: Sensors,
    pub myo: Myo,
    pub logs: RollingLog,
}

impl TelemetrySnapshot {
    pub fn new() -> Self {
        let mut logs = RollingLog::new(DEFAULT_LOG_CAPACITY);
        logs.push(STARTUP_LOG_ENTRY);
        Self {
            angles: Angles::default(),
            sensors: Sensors::default(),
            myo: Myo::default(),
            logs,
        }
    }

    /// Shallow merge: a present sub-object replaces the old one wholesale.
    pub fn merge(&mut self, frame: TelemetryFrame) {
        if let Some(angles) = frame.angles {
            self.angles = angles;
        }
        if let Some(sensors) = frame.sensors {
            self.sensors = sensors;
        }
        if let Some(myo) = frame.myo {
            self.myo = myo;
        }
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_force(newtons: f64) -> String {
    format!("{:.2}", newtons)
}

fn flex_reading<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(D::Error::custom("flex must be a finite number"));
    }
    Ok(raw.trunc().clamp(0.0, FLEX_MAX as f64) as u8)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ForceValue {
    Text(String),
    Number(f64),
}

fn force_reading<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = match ForceValue::deserialize(deserializer)? {
        ForceValue::Text(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("force {trimmed:?} is not a decimal")))?
        }
        ForceValue::Number(value) => value,
    };
    if !value.is_finite() {
        return Err(D::Error::custom("force must be a finite number"));
    }
    Ok(format_force(value))
}

fn emg_channels<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<[u8; EMG_CHANNELS], D::Error> {
    let raw = <[u32; EMG_CHANNELS]>::deserialize(deserializer)?;
    Ok(raw.map(|v| v.min(EMG_MAX as u32) as u8))
}
