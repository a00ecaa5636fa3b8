pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod manager;
pub mod rolling_log;
pub mod simulation;
pub mod telemetry;

pub use config::{BridgeConfig, DashboardConfig};
pub use control::{ControlCommand, ControlMode, Direction, Key, KeyState, Motor, MotorAction};
pub use diagnostics::{DiagnosticsSnapshot, SharedDiagnostics};
pub use error::{Result, TelemetryError};
pub use manager::{CommandSink, TelemetryManager};
pub use rolling_log::RollingLog;
pub use telemetry::{Angles, Myo, Sensors, TelemetryFrame, TelemetrySnapshot};
