//! Synthetic telemetry used by test mode.

use rand::Rng;

use crate::telemetry::{format_force, Angles, Myo, Sensors, TelemetryFrame, EMG_CHANNELS, EMG_MAX, FLEX_MAX};

pub const SIMULATION_PERIOD_MS: u64 = 50;

const TIME_SCALE: f64 = 0.002;
const FORCE_MAX_N: f64 = 5.0;

/// Smooth periodic pose derived from wall-clock milliseconds.
pub fn synthetic_angles(wall_clock_ms: f64) -> Angles {
    let t = wall_clock_ms * TIME_SCALE;
    Angles {
        j1: t.sin() * 0.5,
        j2: (t * 0.8).sin() * 0.7,
        j3: (t * 1.2).sin() * 0.4,
    }
}

pub fn synthetic_sensors<R: Rng>(rng: &mut R) -> Sensors {
    Sensors {
        flex: rng.gen_range(0..FLEX_MAX),
        force: format_force(rng.gen::<f64>() * FORCE_MAX_N),
    }
}

pub fn synthetic_myo<R: Rng>(rng: &mut R) -> Myo {
    let mut emg = [0u8; EMG_CHANNELS];
    for channel in emg.iter_mut() {
        *channel = rng.gen_range(0..EMG_MAX);
    }
    Myo { emg }
}

/// A full frame: the generator always writes all three data fields.
pub fn synthesize<R: Rng>(wall_clock_ms: f64, rng: &mut R) -> TelemetryFrame {
    TelemetryFrame {
        angles: Some(synthetic_angles(wall_clock_ms)),
        sensors: Some(synthetic_sensors(rng)),
        myo: Some(synthetic_myo(rng)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn angles_follow_the_sine_schedule() {
        assert_eq!(synthetic_angles(0.0), Angles::default());

        // t = 1000 * 0.002 = 2.0
        let angles = synthetic_angles(1000.0);
        assert!((angles.j1 - 2.0f64.sin() * 0.5).abs() < 1e-12);
        assert!((angles.j2 - 1.6f64.sin() * 0.7).abs() < 1e-12);
        assert!((angles.j3 - 2.4f64.sin() * 0.4).abs() < 1e-12);
    }

    #[test]
    fn angles_stay_within_amplitude() {
        for ms in (0..100_000).step_by(37) {
            let a = synthetic_angles(ms as f64);
            assert!(a.j1.abs() <= 0.5 && a.j2.abs() <= 0.7 && a.j3.abs() <= 0.4);
        }
    }

    #[test]
    fn random_readings_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let frame = synthesize(12_345.0, &mut rng);
            let sensors = frame.sensors.unwrap();
            assert!(sensors.flex < FLEX_MAX);
            let force: f64 = sensors.force.parse().unwrap();
            assert!((0.0..=FORCE_MAX_N).contains(&force));
            assert_eq!(sensors.force.split('.').nth(1).map(str::len), Some(2));
            assert!(frame.myo.unwrap().emg.iter().all(|v| *v < EMG_MAX));
        }
    }
}
