//! End-to-end simulation benchmarks: building a system and running it to
//! completion, the thing a caller actually pays for.

use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::arr1;

use hybrid_sim::{Direction, Signal, Simulator, State, System, ZeroCrossEvent};

const DELTA: f64 = 0.7;
const G: f64 = 9.81;
const INITIAL_HEIGHT: f64 = 10.0;

fn build_bouncing_ball() -> System {
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

    system
}

fn benchmark_bouncing_ball(c: &mut Criterion) {
    c.bench_function("build_bouncing_ball", |b| {
        b.iter(build_bouncing_ball);
    });

    c.bench_function("run_bouncing_ball_8s", |b| {
        b.iter(|| {
            let system = build_bouncing_ball();
            let mut sim = Simulator::builder(&system).build().unwrap();
            sim.run_until(8.0).unwrap();
        })
    });
}

criterion_group!(benches, benchmark_bouncing_ball);
criterion_main!(benches);
