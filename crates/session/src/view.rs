use common::{CommandSink, ControlMode, KeyState, TelemetryManager, TelemetrySnapshot};

/// What a renderer reads each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    pub snapshot: TelemetrySnapshot,
    pub mode: ControlMode,
    pub keys: KeyState,
    pub simulating: bool,
    pub simulation_ticks: u64,
    pub link_up: bool,
}

impl RenderView {
    pub fn initial() -> Self {
        Self {
            snapshot: TelemetrySnapshot::new(),
            mode: ControlMode::default(),
            keys: KeyState::default(),
            simulating: false,
            simulation_ticks: 0,
            link_up: false,
        }
    }

    pub fn capture<S: CommandSink>(manager: &TelemetryManager<S>, link_up: bool) -> Self {
        Self {
            snapshot: manager.snapshot().clone(),
            mode: manager.mode(),
            keys: manager.keys(),
            simulating: manager.is_simulating(),
            simulation_ticks: manager.simulation_ticks(),
            link_up,
        }
    }

    /// The manual-control overlay only makes sense under keyboard control.
    pub fn show_manual_overlay(&self) -> bool {
        self.mode == ControlMode::Ui
    }
}
