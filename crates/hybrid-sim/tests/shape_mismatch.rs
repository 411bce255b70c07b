//! S5: a state's derivative function returning the wrong shape is caught at
//! evaluation time rather than silently truncated or padded.

use ndarray::arr1;

use hybrid_sim::{CoreError, Evaluator, Port, Signal, State, System};

#[test]
fn vector_state_with_scalar_derivative_reports_shape_mismatch() {
    let system = System::new();
    let state = State::new(
        &system,
        "x",
        2,
        |_data| Ok(arr1(&[1.0])),
        Some(arr1(&[0.0, 0.0])),
    )
    .unwrap();

    let evaluator = Evaluator::new(&system, 0.0, None);
    let err = evaluator.state_derivative(&state).unwrap_err();
    assert_eq!(
        err,
        CoreError::ShapeMismatch {
            entity: "x".to_string(),
            declared: vec![2],
            actual: vec![1],
        }
    );
}

#[test]
fn connecting_ports_of_unequal_shape_reports_shape_mismatch() {
    let system = System::new();
    let signal = Signal::constant(&system, "s", 3, arr1(&[1.0, 2.0, 3.0])).unwrap();
    let p = Port::new(&system, "p", 2);

    let err = p.connect(signal).unwrap_err();
    assert_eq!(
        err,
        CoreError::ShapeMismatch {
            entity: "p".to_string(),
            declared: vec![2],
            actual: vec![3],
        }
    );
}
