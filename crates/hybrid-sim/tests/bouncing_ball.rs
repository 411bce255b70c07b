//! S2: a dropped ball, repeatedly bounced with energy loss at each impact.

use ndarray::arr1;

use hybrid_sim::{Direction, Signal, Simulator, State, StepOutcome, System, ZeroCrossEvent};

const DELTA: f64 = 0.7;
const G: f64 = 9.81;
const INITIAL_HEIGHT: f64 = 10.0;

#[test]
fn bounces_lose_energy_and_height_monotonically() {
    let system = System::new();

    let velocity = State::new(
        &system,
        "velocity",
        1,
        |_data| Ok(arr1(&[-G])),
        Some(arr1(&[0.0])),
    )
    .unwrap();

    let height = {
        let velocity = velocity.clone();
        State::new(
            &system,
            "height",
            1,
            move |data| Ok(data.state(&velocity)),
            Some(arr1(&[INITIAL_HEIGHT])),
        )
        .unwrap()
    };

    let height_signal = {
        let height = height.clone();
        Signal::computed(&system, "height_signal", 1, move |data| {
            Ok(data.state(&height))
        })
        .unwrap()
    };

    let bounce = {
        let height_signal = height_signal.clone();
        ZeroCrossEvent::new(
            &system,
            "bounce",
            move |data| Ok(data.input(&height_signal)?[0]),
            Direction::Negative,
            1e-9,
        )
    };

    bounce.register_listener(move |ctx| {
        let v = ctx.get(&velocity)[0];
        ctx.set(&velocity, &arr1(&[-DELTA * v]))
    });

    let mut sim = Simulator::builder(&system)
        .integrator_options(hybrid_sim::IntegratorOptions {
            max_step: 0.1,
            ..Default::default()
        })
        .build()
        .unwrap();

    let mut event_count = 0;
    while sim.time() < 8.0 {
        if sim.step(8.0).unwrap() == StepOutcome::EventFired {
            event_count += 1;
        }
    }
    assert!(event_count >= 4, "expected at least 4 bounces, got {event_count}");

    let result = sim.result();
    let v_idx = velocity.state_index();
    let h_idx = height.state_index();

    let mut last_peak_height = INITIAL_HEIGHT;
    let mut last_energy = None;
    for row in 0..result.len() {
        let v = result.state()[[row, v_idx]];
        let h = result.state()[[row, h_idx]];
        let energy = 0.5 * v * v + G * h;

        if let Some(prev) = last_energy {
            let tolerance = 1e-6 * prev.max(1.0);
            assert!(
                energy <= prev + tolerance,
                "energy increased between samples: {prev} -> {energy}"
            );
        }
        last_energy = Some(energy);

        // Right after a bounce (velocity just flipped to positive, height
        // near zero), the new upward energy bounds the next peak height.
        if v > 0.0 && h.abs() < 1e-3 {
            let bounded_peak = DELTA * DELTA * last_peak_height;
            assert!(
                h.abs() <= bounded_peak + 1e-6 || energy / G <= bounded_peak + 1e-6,
                "post-bounce energy implies a peak above {bounded_peak:.4} (restitution {DELTA}^2 x previous peak {last_peak_height:.4})"
            );
            last_peak_height = energy / G;
        }
    }
}
