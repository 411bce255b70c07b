//! Invariants and laws from the specification's testable-properties section:
//! index contiguity, evaluator memoization, port resolution, input
//! round-tripping, initial-state round-tripping, determinism and
//! conservation of a first integral.

use ndarray::{arr1, Array1};
use proptest::prelude::*;

use hybrid_sim::{Evaluator, IntegratorOptions, Port, Signal, Simulator, State, System};

#[test]
fn state_slices_are_contiguous_gap_free_and_cover_the_state_vector() {
    let system = System::new();
    let sizes = [3usize, 1, 4, 1, 5];
    let states: Vec<_> = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            State::new(
                &system,
                &format!("s{i}"),
                size,
                move |_data| Ok(Array1::zeros(size)),
                Some(Array1::zeros(size)),
            )
            .unwrap()
        })
        .collect();

    let total: usize = sizes.iter().sum();
    assert_eq!(system.num_states(), total);

    let mut covered = vec![false; total];
    for state in &states {
        for i in state.state_slice() {
            assert!(!covered[i], "slice overlap at index {i}");
            covered[i] = true;
        }
    }
    assert!(covered.iter().all(|&c| c), "slices leave a gap in [0, num_states)");
}

#[test]
fn signals_vector_is_memoized_across_repeated_calls() {
    let system = System::new();
    Signal::computed(&system, "s", 1, |data| Ok(arr1(&[data.time() * 2.0]))).unwrap();

    let evaluator = Evaluator::new(&system, 3.5, None);
    let first = evaluator.signals_vector().unwrap();
    let second = evaluator.signals_vector().unwrap();
    assert_eq!(first, second);
}

#[test]
fn chained_ports_resolve_to_the_same_signal_value() {
    let system = System::new();
    let signal = Signal::constant(&system, "s", 1, arr1(&[42.0])).unwrap();
    let p = Port::new(&system, "p", 1);
    let q = Port::new(&system, "q", 1);
    p.connect(signal).unwrap();
    q.connect(p.clone()).unwrap();

    let evaluator = Evaluator::new(&system, 0.0, None);
    assert_eq!(evaluator.port_value(&p).unwrap(), evaluator.port_value(&q).unwrap());
}

#[test]
fn result_columns_are_projected_by_entity() {
    let system = System::new();
    let x = State::new(&system, "x", 1, |_data| Ok(arr1(&[1.0])), Some(arr1(&[5.0]))).unwrap();
    let signal = {
        let x = x.clone();
        Signal::computed(&system, "double_x", 1, move |data| Ok(data.state(&x) * 2.0)).unwrap()
    };
    let port = Port::new(&system, "p", 1);
    port.connect(signal.clone()).unwrap();

    let mut sim = Simulator::builder(&system).build().unwrap();
    sim.run_until(1.0).unwrap();

    let result = sim.result();
    assert_eq!(result.state_for(&x), result.state().slice(ndarray::s![.., x.state_slice()]));
    assert_eq!(result.signal_for(&signal), result.port_for(&port).unwrap());
}

#[test]
fn input_vector_round_trips_through_signals_vector() {
    let system = System::new();
    let input = Signal::input(&system, "u", 2, None).unwrap();

    let u = arr1(&[1.25, -3.5]);
    let evaluator = Evaluator::with_inputs(&system, 0.0, None, Some(u.clone()));
    let signals = evaluator.signals_vector().unwrap();
    let slice = input.signal_slice();
    assert_eq!(signals.slice(ndarray::s![slice]), u.view());
}

#[test]
fn initial_state_round_trips_into_first_result_row() {
    let system = System::new();
    let a = State::new(&system, "a", 1, |_data| Ok(arr1(&[0.0])), Some(arr1(&[1.0]))).unwrap();
    let b = State::new(&system, "b", 1, |_data| Ok(arr1(&[0.0])), Some(arr1(&[-2.0]))).unwrap();

    let sim = Simulator::builder(&system).build().unwrap();
    let result = sim.result();
    assert_eq!(result.len(), 1);
    assert_eq!(result.state()[[0, a.state_index()]], 1.0);
    assert_eq!(result.state()[[0, b.state_index()]], -2.0);
}

#[test]
fn state_derivative_is_idempotent_within_an_instant() {
    let system = System::new();
    let x = State::new(&system, "x", 1, |data| Ok(arr1(&[data.time() + 1.0])), Some(arr1(&[0.0]))).unwrap();

    let evaluator = Evaluator::new(&system, 2.0, None);
    let first = evaluator.state_derivative(&x).unwrap();
    let second = evaluator.state_derivative(&x).unwrap();
    assert_eq!(first, second);
}

fn build_harmonic_oscillator() -> (System, std::rc::Rc<State>, std::rc::Rc<State>) {
    let system = System::new();
    let velocity_cell: std::rc::Rc<std::cell::RefCell<Option<std::rc::Rc<State>>>> =
        std::rc::Rc::new(std::cell::RefCell::new(None));

    let position = {
        let velocity_cell = velocity_cell.clone();
        State::new(
            &system,
            "position",
            1,
            move |data| {
                let v = velocity_cell.borrow().clone().expect("velocity declared below");
                Ok(data.state(&v))
            },
            Some(arr1(&[1.0])),
        )
        .unwrap()
    };
    let velocity = {
        let position = position.clone();
        State::new(
            &system,
            "velocity",
            1,
            move |data| Ok(-data.state(&position)),
            Some(arr1(&[0.0])),
        )
        .unwrap()
    };
    *velocity_cell.borrow_mut() = Some(velocity.clone());

    (system, position, velocity)
}

#[test]
fn two_simulators_on_equal_systems_produce_identical_trajectories() {
    let (system_a, position_a, _) = build_harmonic_oscillator();
    let (system_b, position_b, _) = build_harmonic_oscillator();

    let mut sim_a = Simulator::builder(&system_a).build().unwrap();
    let mut sim_b = Simulator::builder(&system_b).build().unwrap();
    sim_a.run_until(5.0).unwrap();
    sim_b.run_until(5.0).unwrap();

    let result_a = sim_a.result();
    let result_b = sim_b.result();
    assert_eq!(result_a.len(), result_b.len());
    assert_eq!(result_a.time(), result_b.time());
    assert_eq!(
        result_a.state().column(position_a.state_index()),
        result_b.state().column(position_b.state_index())
    );
}

#[test]
fn harmonic_oscillator_conserves_energy_within_tolerance() {
    let (system, position, velocity) = build_harmonic_oscillator();
    let mut sim = Simulator::builder(&system)
        .integrator_options(IntegratorOptions {
            rtol: 1e-8,
            atol: 1e-10,
            ..Default::default()
        })
        .build()
        .unwrap();
    sim.run_until(20.0).unwrap();

    let result = sim.result();
    let initial_energy = 0.5 * (1.0f64 * 1.0 + 0.0 * 0.0);
    for row in 0..result.len() {
        let x = result.state()[[row, position.state_index()]];
        let v = result.state()[[row, velocity.state_index()]];
        let energy = 0.5 * (x * x + v * v);
        assert!(
            (energy - initial_energy).abs() < 1e-4,
            "energy drifted to {energy} at row {row} (started at {initial_energy})"
        );
    }
}

proptest! {
    #[test]
    fn state_slices_cover_arbitrary_size_combinations(sizes in proptest::collection::vec(1usize..6, 1..8)) {
        let system = System::new();
        let states: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                State::new(
                    &system,
                    &format!("s{i}"),
                    size,
                    |_data| Ok(Array1::zeros(1)),
                    Some(Array1::zeros(size)),
                )
                .unwrap()
            })
            .collect();

        let total: usize = sizes.iter().sum();
        prop_assert_eq!(system.num_states(), total);

        let mut covered = vec![false; total];
        for state in &states {
            for i in state.state_slice() {
                prop_assert!(!covered[i]);
                covered[i] = true;
            }
        }
        prop_assert!(covered.iter().all(|&c| c));
    }
}
