use rand::Rng;
use serde_json::{json, Value};

/// Telemetry frame as the controller streams it, `t` in seconds.
pub fn synthetic_frame<R: Rng>(t: f64, rng: &mut R) -> Value {
    let emg: Vec<u32> = (0..8).map(|_| rng.gen_range(10..=90)).collect();
    json!({
        "angles": {
            "j1": (t * 1.5).sin() * 0.6,
            "j2": (t * 1.2).sin() * 0.8,
            "j3": (t * 0.9).sin() * 0.4,
        },
        "sensors": {
            "flex": (45.0 + t.sin() * 20.0) as i64,
            "force": synthetic_force(t),
        },
        "myo": { "emg": emg },
    })
}

/// Fingertip force in newtons, rounded to two decimals.
pub fn synthetic_force(t: f64) -> f64 {
    round2(2.0 + t.cos() * 1.5)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TelemetryFrame;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn frames_are_accepted_by_the_dashboard() {
        let mut rng = StdRng::seed_from_u64(42);
        for step in 0..200 {
            let t = step as f64 * 0.02;
            let frame = TelemetryFrame::parse(&synthetic_frame(t, &mut rng).to_string()).unwrap();

            let sensors = frame.sensors.unwrap();
            assert!((25..=65).contains(&sensors.flex));
            let force: f64 = sensors.force.parse().unwrap();
            assert!((0.5..=3.5).contains(&force));
            assert!(frame.myo.unwrap().emg.iter().all(|v| (10..=90).contains(v)));
            assert!(frame.angles.unwrap().j1.abs() <= 0.6);
        }
    }

    #[test]
    fn force_has_two_decimals_at_most() {
        assert_eq!(round2(2.0 + 1.234_567), 3.23);
    }
}
