mod console;
mod menu;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use common::config::load_config;
use common::logging::init_tracing;
use common::DashboardConfig;
use session::{DashboardEvent, SessionHandle};
use tokio::runtime::Runtime;
use tracing::warn;

use console::ConsoleCommand;

const CONFIG_PATH: &str = "configs/dashboard.toml";
const TEST_MODE_SECS: u64 = 5;

fn main() -> Result<()> {
    let config = if Path::new(CONFIG_PATH).exists() {
        load_config(CONFIG_PATH).with_context(|| format!("loading {CONFIG_PATH}"))?
    } else {
        DashboardConfig::default()
    };
    init_tracing(&config.log_level);

    let rt = Runtime::new().context("failed to start tokio runtime")?;

    println!("===========================================");
    println!("Welcome to the Finger Telemetry Dashboard");
    println!("===========================================");

    loop {
        menu::show_menu()?;

        match menu::get_user_choice() {
            Ok(1) => run_live_session(&rt, &config)?,
            Ok(2) => run_test_mode(&rt, &config)?,
            Ok(3) => run_realtime_dashboard()?,
            Ok(4) => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please select 1-4."),
        }
    }
    Ok(())
}

fn run_live_session(rt: &Runtime, config: &DashboardConfig) -> Result<()> {
    println!("\n=== Live Session ===");
    println!("Controller endpoint: {}", config.endpoint);
    console::print_help();

    let handle = {
        let _guard = rt.enter();
        SessionHandle::spawn(config.clone())
    };
    let events = handle.events();

    loop {
        let line = menu::read_line()?;
        if line.is_empty() {
            // stdin closed
            break;
        }
        match console::parse_command(&line) {
            Ok(ConsoleCommand::Event(event)) => {
                if events.blocking_send(event).is_err() {
                    warn!("session ended unexpectedly");
                    break;
                }
            }
            Ok(ConsoleCommand::Status) => console::print_status(&handle.current(), &handle.diagnostics()),
            Ok(ConsoleCommand::Help) => console::print_help(),
            Ok(ConsoleCommand::Quit) => break,
            Err(e) => println!("{e}"),
        }
    }

    drop(events);
    rt.block_on(handle.shutdown());
    println!("Session closed.");
    Ok(())
}

fn run_test_mode(rt: &Runtime, config: &DashboardConfig) -> Result<()> {
    println!("\n=== Test Mode (offline) ===");
    println!("Synthetic telemetry every {} ms for {} seconds",
             config.simulation_period_ms, TEST_MODE_SECS);

    rt.block_on(async {
        let handle = SessionHandle::spawn_offline(config.clone());
        handle.send(DashboardEvent::Simulation(true));

        for _ in 0..TEST_MODE_SECS {
            tokio::time::sleep(Duration::from_secs(1)).await;
            console::print_status(&handle.current(), &handle.diagnostics());
        }
        handle.shutdown().await;
    });

    menu::wait_for_enter()?;
    Ok(())
}

fn run_realtime_dashboard() -> Result<()> {
    println!("\n=== Launching Real-Time Dashboard ===");
    println!("Note: Close the GUI window to return to menu");

    // The GUI owns its own event loop, so it runs as a separate process.
    let mut command = std::process::Command::new("cargo");
    command.args(["run", "--release", "--bin", "visualiser"]);
    if Path::new(CONFIG_PATH).exists() {
        command.arg(CONFIG_PATH);
    }
    match command.status() {
        Ok(status) if status.success() => println!("Dashboard closed successfully."),
        Ok(status) => println!("Dashboard exited with status: {}", status),
        Err(e) => {
            println!("Failed to launch dashboard: {}", e);
            println!("Make sure you have the visualiser binary available.");
        }
    }

    menu::wait_for_enter()?;
    Ok(())
}
