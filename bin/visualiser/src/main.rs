use std::collections::VecDeque;
use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use tokio::runtime::Runtime;

use common::config::load_config;
use common::logging::init_tracing;
use common::{ControlMode, DashboardConfig, Key, KeyState};
use session::{DashboardEvent, RenderView, SessionHandle};

const TRACE_LEN: usize = 300;

struct DashboardApp {
    // Keeps the session's tasks alive for the lifetime of the window.
    _runtime: Runtime,
    session: SessionHandle,
    endpoint: String,
    sent_keys: KeyState,
    trace: VecDeque<[f64; 3]>,
}

impl DashboardApp {
    fn new(config: DashboardConfig) -> Result<Self> {
        let runtime = Runtime::new().context("failed to start tokio runtime")?;
        let endpoint = config.endpoint.clone();
        let session = {
            let _guard = runtime.enter();
            SessionHandle::spawn(config)
        };
        Ok(Self {
            _runtime: runtime,
            session,
            endpoint,
            sent_keys: KeyState::default(),
            trace: VecDeque::with_capacity(TRACE_LEN),
        })
    }

    /// Turns held arrow keys into edge events for the session.
    fn forward_keys(&mut self, ctx: &egui::Context, view: &RenderView) {
        if !view.show_manual_overlay() {
            self.sent_keys = KeyState::default();
            return;
        }
        let held = ctx.input(|i| KeyState {
            up: i.key_down(egui::Key::ArrowUp),
            down: i.key_down(egui::Key::ArrowDown),
            left: i.key_down(egui::Key::ArrowLeft),
            right: i.key_down(egui::Key::ArrowRight),
        });
        for key in Key::ALL {
            let pressed = held.is_pressed(key);
            if pressed != self.sent_keys.is_pressed(key)
                && self.session.send(DashboardEvent::Key { key, pressed })
            {
                self.sent_keys.set(key, pressed);
            }
        }
    }

    fn record_trace(&mut self, view: &RenderView) {
        let a = view.snapshot.angles;
        self.trace.push_back([a.j1, a.j2, a.j3]);
        if self.trace.len() > TRACE_LEN {
            self.trace.pop_front();
        }
    }

    fn trace_line(&self, joint: usize, name: &str, color: egui::Color32) -> Line {
        let points: Vec<[f64; 2]> = self
            .trace
            .iter()
            .enumerate()
            .map(|(i, angles)| [i as f64, angles[joint]])
            .collect();
        Line::new(PlotPoints::new(points)).name(name).color(color)
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let view = self.session.current();
        let counts = self.session.diagnostics();
        self.forward_keys(ctx, &view);
        self.record_trace(&view);
        ctx.request_repaint();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🖐 FINGER MODEL");
                ui.separator();

                let sim_label = if view.simulating { "⏹ STOP SIM" } else { "▶ TEST MODE" };
                let sim_btn = ui.add_enabled(
                    view.mode == ControlMode::Ui,
                    egui::Button::new(sim_label),
                );
                if sim_btn.clicked() {
                    self.session.send(DashboardEvent::ToggleSimulation);
                }

                ui.separator();
                ui.label("Control mode:");
                for mode in ControlMode::ALL {
                    if ui
                        .selectable_label(view.mode == mode, mode.as_str().to_uppercase())
                        .clicked()
                    {
                        self.session.send(DashboardEvent::SelectMode(mode));
                    }
                }

                ui.separator();
                let link_text = if view.link_up {
                    egui::RichText::new("🟢 Linked").color(egui::Color32::GREEN)
                } else {
                    egui::RichText::new("🔴 No controller").color(egui::Color32::RED)
                };
                ui.label(link_text).on_hover_text(self.endpoint.as_str());
            });
        });

        egui::SidePanel::right("data").min_width(280.0).show(ctx, |ui| {
            ui.strong("📟 FINGER SENSORS");
            egui::Grid::new("sensor_grid").num_columns(2).striped(true).show(ui, |ui| {
                ui.label("Flex:");
                ui.label(format!("{}°", view.snapshot.sensors.flex));
                ui.end_row();
                ui.label("Force:");
                ui.label(format!("{}N", view.snapshot.sensors.force));
                ui.end_row();
            });

            ui.add_space(10.0);
            ui.strong("⚡ MYO BAND EMG");
            for (i, value) in view.snapshot.myo.emg.iter().enumerate() {
                ui.add(
                    egui::ProgressBar::new(*value as f32 / 100.0)
                        .text(format!("ch{} {}", i + 1, value)),
                );
            }

            ui.add_space(10.0);
            ui.strong("🖥 DATA LOG");
            egui::ScrollArea::vertical()
                .id_source("log_scroll")
                .max_height(260.0)
                .show(ui, |ui| {
                    for entry in view.snapshot.logs.iter() {
                        ui.monospace(entry);
                    }
                });

            ui.add_space(10.0);
            ui.separator();
            egui::Grid::new("diag_grid").num_columns(2).show(ui, |ui| {
                ui.label("Frames:");
                ui.label(format!("{} ({} malformed)", counts.frames_received, counts.malformed_frames));
                ui.end_row();
                ui.label("Commands:");
                ui.label(format!("{} sent, {} dropped", counts.commands_sent, counts.commands_dropped));
                ui.end_row();
                ui.label("Reconnects:");
                ui.label(format!("{}", counts.reconnect_attempts));
                ui.end_row();
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("📈 Joint Angles");
            let a = view.snapshot.angles;
            ui.label(format!("j1 {:+.3} rad   j2 {:+.3} rad   j3 {:+.3} rad", a.j1, a.j2, a.j3));

            Plot::new("angle_plot")
                .height(280.0)
                .legend(Legend::default())
                .include_y(-1.0)
                .include_y(1.0)
                .allow_scroll(false)
                .allow_zoom(false)
                .allow_drag(false)
                .show(ui, |plot_ui| {
                    plot_ui.line(self.trace_line(0, "j1", egui::Color32::from_rgb(96, 165, 250)));
                    plot_ui.line(self.trace_line(1, "j2", egui::Color32::from_rgb(52, 211, 153)));
                    plot_ui.line(self.trace_line(2, "j3", egui::Color32::from_rgb(251, 191, 36)));
                });

            if view.show_manual_overlay() {
                ui.add_space(10.0);
                egui::Frame::group(ui.style()).inner_margin(10.0).show(ui, |ui| {
                    ui.strong("MANUAL MOTOR CONTROL");
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.label("MOTOR 1");
                            key_indicator(ui, "⬆", view.keys.up);
                            key_indicator(ui, "⬇", view.keys.down);
                        });
                        ui.add_space(20.0);
                        ui.vertical(|ui| {
                            ui.label("MOTOR 2");
                            ui.horizontal(|ui| {
                                key_indicator(ui, "⬅", view.keys.left);
                                key_indicator(ui, "➡", view.keys.right);
                            });
                        });
                    });
                });
            }
        });
    }
}

fn key_indicator(ui: &mut egui::Ui, glyph: &str, active: bool) {
    let text = egui::RichText::new(glyph).size(20.0);
    let text = if active {
        text.color(egui::Color32::WHITE).background_color(egui::Color32::from_rgb(96, 165, 250))
    } else {
        text.color(egui::Color32::GRAY)
    };
    ui.label(text);
}

fn main() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => load_config(&path).with_context(|| format!("loading {path}"))?,
        None if Path::new("configs/dashboard.toml").exists() => load_config("configs/dashboard.toml")?,
        None => DashboardConfig::default(),
    };
    init_tracing(&config.log_level);

    let app = DashboardApp::new(config)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Finger Telemetry Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Finger Telemetry Dashboard",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow!("dashboard window failed: {e}"))
}
