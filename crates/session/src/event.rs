use common::{ControlMode, Key};

/// Everything that can change dashboard state, from any producer.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Raw text message from the controller socket.
    Inbound(String),
    LinkUp,
    LinkDown,
    Key { key: Key, pressed: bool },
    SelectMode(ControlMode),
    /// Turn test mode on or off.
    Simulation(bool),
    ToggleSimulation,
    Shutdown,
}
