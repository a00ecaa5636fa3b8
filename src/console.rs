use common::{ControlMode, DiagnosticsSnapshot, Key};
use session::{DashboardEvent, RenderView};

/// One line typed during a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Event(DashboardEvent),
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or("").to_ascii_lowercase();
    let arg = words.next();

    let command = match (verb.as_str(), arg) {
        ("press", Some(key)) => ConsoleCommand::Event(DashboardEvent::Key {
            key: key.parse::<Key>()?,
            pressed: true,
        }),
        ("release", Some(key)) => ConsoleCommand::Event(DashboardEvent::Key {
            key: key.parse::<Key>()?,
            pressed: false,
        }),
        ("mode", Some(mode)) => {
            ConsoleCommand::Event(DashboardEvent::SelectMode(mode.parse::<ControlMode>()?))
        }
        ("sim", Some("on")) => ConsoleCommand::Event(DashboardEvent::Simulation(true)),
        ("sim", Some("off")) => ConsoleCommand::Event(DashboardEvent::Simulation(false)),
        ("sim", None) => ConsoleCommand::Event(DashboardEvent::ToggleSimulation),
        ("status", None) | ("s", None) => ConsoleCommand::Status,
        ("help", None) | ("?", None) => ConsoleCommand::Help,
        ("quit", None) | ("exit", None) | ("q", None) => ConsoleCommand::Quit,
        ("", _) => return Err("empty command".to_string()),
        (other, _) => return Err(format!("unrecognised command {other:?}, type help")),
    };

    if words.next().is_some() {
        return Err("too many arguments".to_string());
    }
    Ok(command)
}

pub fn print_help() {
    println!("Commands:");
    println!("  press <up|down|left|right>    hold a direction key");
    println!("  release <up|down|left|right>  let go of a direction key");
    println!("  mode <ui|myo|fsr>             switch control mode");
    println!("  sim [on|off]                  test mode (toggles without argument)");
    println!("  status                        print the current snapshot");
    println!("  quit                          end the session");
}

pub fn print_status(view: &RenderView, diagnostics: &DiagnosticsSnapshot) {
    let snap = &view.snapshot;
    println!("--- mode: {} | link: {} | test mode: {} ({} ticks)",
             view.mode,
             if view.link_up { "up" } else { "down" },
             if view.simulating { "on" } else { "off" },
             view.simulation_ticks);
    println!("Angles (rad): j1={:+.3} j2={:+.3} j3={:+.3}",
             snap.angles.j1, snap.angles.j2, snap.angles.j3);
    println!("Flex: {}° | Force: {}N", snap.sensors.flex, snap.sensors.force);
    let bars: Vec<String> = snap.myo.emg.iter().map(|v| format!("{v:>3}")).collect();
    println!("EMG: [{}]", bars.join(" "));
    if view.show_manual_overlay() {
        let held: Vec<&str> = Key::ALL
            .iter()
            .filter(|k| view.keys.is_pressed(**k))
            .map(|k| k.as_str())
            .collect();
        println!("Held keys: {}", if held.is_empty() { "-".to_string() } else { held.join(", ") });
    }
    println!("Frames: {} ok, {} malformed | Commands: {} sent, {} dropped | Reconnects: {}",
             diagnostics.frames_received,
             diagnostics.malformed_frames,
             diagnostics.commands_sent,
             diagnostics.commands_dropped,
             diagnostics.reconnect_attempts);
    for entry in snap.logs.iter().take(5) {
        println!("  {entry}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_commands() {
        assert_eq!(
            parse_command("press up"),
            Ok(ConsoleCommand::Event(DashboardEvent::Key { key: Key::Up, pressed: true }))
        );
        assert_eq!(
            parse_command("  RELEASE left "),
            Ok(ConsoleCommand::Event(DashboardEvent::Key { key: Key::Left, pressed: false }))
        );
    }

    #[test]
    fn parses_mode_and_sim() {
        assert_eq!(
            parse_command("mode fsr"),
            Ok(ConsoleCommand::Event(DashboardEvent::SelectMode(ControlMode::Fsr)))
        );
        assert_eq!(parse_command("sim on"), Ok(ConsoleCommand::Event(DashboardEvent::Simulation(true))));
        assert_eq!(parse_command("sim"), Ok(ConsoleCommand::Event(DashboardEvent::ToggleSimulation)));
        assert_eq!(parse_command("q"), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("").is_err());
        assert!(parse_command("press sideways").is_err());
        assert!(parse_command("mode myo now").is_err());
        assert!(parse_command("sim maybe").is_err());
        assert!(parse_command("fly").is_err());
    }
}
