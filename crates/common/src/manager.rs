use chrono::{Local, NaiveTime};
use rand::Rng;
use tracing::{debug, info};

use crate::control::{ControlCommand, ControlMode, Key, KeyState};
use crate::error::Result;
use crate::simulation;
use crate::telemetry::{TelemetryFrame, TelemetrySnapshot};

/// Where outbound control commands go. Sends are fire-and-forget.
pub trait CommandSink {
    fn emit(&mut self, command: ControlCommand);
}

impl CommandSink for Vec<ControlCommand> {
    fn emit(&mut self, command: ControlCommand) {
        self.push(command);
    }
}

/// Single owner of the snapshot, the control mode and the held keys.
///
/// Every mutation goes through `&mut self`, so whoever drives the manager
/// decides the order of inbound frames, key transitions and simulation ticks.
pub struct TelemetryManager<S: CommandSink> {
    snapshot: TelemetrySnapshot,
    mode: ControlMode,
    keys: KeyState,
    simulating: bool,
    simulation_ticks: u64,
    sink: S,
}

impl<S: CommandSink> TelemetryManager<S> {
    pub fn new(sink: S) -> Self {
        Self {
            snapshot: TelemetrySnapshot::new(),
            mode: ControlMode::default(),
            keys: KeyState::default(),
            simulating: false,
            simulation_ticks: 0,
            sink,
        }
    }

    /// Parses and merges one inbound payload, stamped with the local time.
    /// A malformed payload leaves the snapshot untouched.
    pub fn apply_inbound_frame(&mut self, payload: &str) -> Result<()> {
        let frame = TelemetryFrame::parse(payload)?;
        self.apply_frame_at(frame, Local::now().time());
        Ok(())
    }

    pub fn apply_frame_at(&mut self, frame: TelemetryFrame, received_at: NaiveTime) {
        // The generator owns the data fields while test mode runs.
        if self.simulating {
            debug!("test mode active, inbound data fields not merged");
        } else {
            self.snapshot.merge(frame);
        }
        self.snapshot
            .logs
            .push(format!("[{}] Data Received", received_at.format("%H:%M:%S")));
    }

    /// Stops test mode, releases held motors when leaving `ui`, then
    /// announces the mode. Always emits exactly one `set_mode`.
    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.stop_simulation();

        if self.mode == ControlMode::Ui && mode != ControlMode::Ui {
            for motor in self.keys.held_motors() {
                self.sink.emit(ControlCommand::stop(motor));
            }
            self.keys = KeyState::default();
        }

        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "control mode changed");
        }
        self.mode = mode;
        self.sink.emit(ControlCommand::set_mode(mode));
    }

    /// Returns whether test mode is running afterwards.
    pub fn start_simulation(&mut self) -> bool {
        if self.mode != ControlMode::Ui {
            debug!(mode = %self.mode, "test mode only runs under ui control");
            return false;
        }
        if !self.simulating {
            info!("test mode started");
            self.simulating = true;
        }
        true
    }

    /// Returns whether test mode was running.
    pub fn stop_simulation(&mut self) -> bool {
        let was_running = self.simulating;
        if was_running {
            info!(ticks = self.simulation_ticks, "test mode stopped");
        }
        self.simulating = false;
        was_running
    }

    /// Overwrites angles, sensors and myo with synthetic values. Ignored
    /// unless test mode is running.
    pub fn simulation_tick<R: Rng>(&mut self, wall_clock_ms: f64, rng: &mut R) -> bool {
        if !self.simulating {
            return false;
        }
        self.snapshot.merge(simulation::synthesize(wall_clock_ms, rng));
        self.simulation_ticks += 1;
        true
    }

    /// Edge-triggered key handling. Returns whether a command went out.
    pub fn on_key_transition(&mut self, key: Key, pressed: bool) -> bool {
        if self.mode != ControlMode::Ui || self.keys.is_pressed(key) == pressed {
            return false;
        }
        self.keys.set(key, pressed);

        let command = if pressed {
            ControlCommand::start(key.motor(), key.direction())
        } else {
            ControlCommand::stop(key.motor())
        };
        debug!(key = key.as_str(), pressed, "key transition");
        self.sink.emit(command);
        true
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn keys(&self) -> KeyState {
        self.keys
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    pub fn simulation_ticks(&self) -> u64 {
        self.simulation_ticks
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
