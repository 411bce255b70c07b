//! A ball dropped from 10m, bouncing with a restitution coefficient of 0.7.
//!
//! Transliterates `original_source/examples/guide/04_bouncing_ball.py` into
//! this crate's API: one state (vertical velocity), one signal (height, the
//! running integral of velocity) and one zero-crossing event that reverses
//! velocity on impact.

use ndarray::arr1;

use hybrid_sim::{Direction, Signal, Simulator, State, System, ZeroCrossEvent};

const DELTA: f64 = 0.7;
const G: f64 = 9.81;
const INITIAL_HEIGHT: f64 = 10.0;
const INITIAL_VELOCITY: f64 = 0.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let system = System::new();

    let velocity = State::new(
        &system,
        "velocity",
        1,
        |_data| Ok(arr1(&[-G])),
        Some(arr1(&[INITIAL_VELOCITY])),
    )?;

    let height = {
        let velocity = velocity.clone();
        State::new(
            &system,
            "height",
            1,
            move |data| Ok(data.state(&velocity)),
            Some(arr1(&[INITIAL_HEIGHT])),
        )?
    };

    let height_signal = {
        let height = height.clone();
        Signal::computed(&system, "height_signal", 1, move |data| {
            Ok(data.state(&height))
        })?
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
        .build()?;
    sim.run_until(8.0)?;

    let result = sim.result();
    println!("recorded {} samples", result.len());
    println!(
        "final height: {:.4}",
        result.state()[[result.len() - 1, height.state_index()]]
    );

    Ok(())
}
