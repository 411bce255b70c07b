//! Overhead of the two things that happen on every single simulator step:
//! constructing an `Evaluator` over the current state, and the `Simulator`
//! step loop that wraps it (dynamics evaluation, integration, event scan).

use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::arr1;

use hybrid_sim::{Evaluator, IntegratorOptions, Simulator, State, System};

fn build_single_state_system() -> System {
    let system = System::new();
    State::new(&system, "x", 1, |_data| Ok(arr1(&[1.0])), Some(arr1(&[0.0]))).unwrap();
    system
}

fn benchmark_simulation_overhead(c: &mut Criterion) {
    // Benchmark 1: bare Evaluator construction + derivative evaluation,
    // the unit of work the integrator repeats at every Runge-Kutta stage.
    {
        let system = build_single_state_system();
        let state = system.state_by_name("x").unwrap();

        c.bench_function("evaluator_construct_and_evaluate_x10000", |b| {
            b.iter(|| {
                for _ in 0..10000 {
                    let eval = Evaluator::new(&system, 0.0, None);
                    eval.state_derivative(&state).unwrap();
                }
            })
        });
    }

    // Benchmark 2: Simulator::step, the full hybrid-step loop (dynamics,
    // adaptive integration, event scan) amortized over many small steps.
    {
        let system = build_single_state_system();
        let mut sim = Simulator::builder(&system)
            .integrator_options(IntegratorOptions {
                max_step: 0.01,
                ..Default::default()
            })
            .build()
            .unwrap();

        c.bench_function("simulator_step_x10000", |b| {
            b.iter(|| {
                for _ in 0..10000 {
                    sim.step(f64::INFINITY).unwrap();
                }
            })
        });
    }
}

criterion_group!(benches, benchmark_simulation_overhead);
criterion_main!(benches);
