use std::env;

use chrono::NaiveTime;
use common::{CommandSink, ControlCommand, ControlMode, Key, TelemetryFrame, TelemetryManager};
use criterion::{black_box, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

const FULL_FRAME: &str = r#"{"angles":{"j1":0.31,"j2":-0.12,"j3":0.05},"sensors":{"flex":45,"force":"2.10"},"myo":{"emg":[12,40,33,80,51,9,77,64]}}"#;
const SENSOR_FRAME: &str = r#"{"sensors":{"flex":45,"force":2.1}}"#;

/// Counts commands instead of storing them so long runs stay flat.
#[derive(Default)]
struct CountingSink(u64);

impl CommandSink for CountingSink {
    fn emit(&mut self, command: ControlCommand) {
        black_box(command);
        self.0 += 1;
    }
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

fn manager() -> TelemetryManager<CountingSink> {
    TelemetryManager::new(CountingSink::default())
}

fn bench_frames(c: &mut Criterion) {
    let mut m = manager();
    c.bench_function("apply_full_frame", |b| {
        b.iter(|| m.apply_inbound_frame(black_box(FULL_FRAME)))
    });

    let mut m = manager();
    c.bench_function("apply_sensor_frame", |b| {
        b.iter(|| m.apply_inbound_frame(black_box(SENSOR_FRAME)))
    });

    let mut m = manager();
    c.bench_function("reject_malformed_frame", |b| {
        b.iter(|| m.apply_inbound_frame(black_box(r#"{"myo":{"emg":[1,2,3]}}"#)))
    });

    let frame = TelemetryFrame::parse(FULL_FRAME).ok();
    let mut m = manager();
    c.bench_function("merge_parsed_frame", |b| {
        b.iter(|| {
            if let Some(frame) = &frame {
                m.apply_frame_at(frame.clone(), noon());
            }
        })
    });
}

fn bench_simulation(c: &mut Criterion) {
    let mut m = manager();
    let mut rng = StdRng::seed_from_u64(17);
    m.start_simulation();
    let mut wall_clock_ms = 0.0;
    c.bench_function("simulation_tick", |b| {
        b.iter(|| {
            wall_clock_ms += 50.0;
            m.simulation_tick(black_box(wall_clock_ms), &mut rng)
        })
    });
}

fn bench_controls(c: &mut Criterion) {
    let mut m = manager();
    c.bench_function("key_press_release", |b| {
        b.iter(|| {
            m.on_key_transition(black_box(Key::Up), true);
            m.on_key_transition(black_box(Key::Up), false);
        })
    });

    let mut m = manager();
    c.bench_function("mode_round_trip", |b| {
        b.iter(|| {
            m.set_control_mode(black_box(ControlMode::Myo));
            m.set_control_mode(black_box(ControlMode::Ui));
        })
    });
}

fn main() {
    let group = env::args().nth(1).unwrap_or_else(|| "all".to_string());

    println!("========================================");
    println!("Telemetry Manager Benchmark");
    println!("========================================");
    println!("Group: {}", group);
    println!("========================================\n");

    let mut criterion = Criterion::default().sample_size(50);

    match group.as_str() {
        "frames" => bench_frames(&mut criterion),
        "simulation" => bench_simulation(&mut criterion),
        "controls" => bench_controls(&mut criterion),
        "all" => {
            bench_frames(&mut criterion);
            bench_simulation(&mut criterion);
            bench_controls(&mut criterion);
        }
        other => {
            eprintln!("Unknown group {other:?}");
            eprintln!("Usage: benchmark_runner [frames|simulation|controls|all]");
            std::process::exit(1);
        }
    }

    criterion.final_summary();

    println!("\n========================================");
    println!("Benchmark complete!");
    println!("Check the target/criterion directory for detailed HTML reports.");
    println!("========================================");
}
