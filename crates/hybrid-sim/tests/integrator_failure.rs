//! S6: an integrator reporting failure surfaces that failure to the caller
//! and leaves the result buffer exactly as it was before the failed step.

use ndarray::{arr1, Array1};

use hybrid_sim::{DenseOutput, DerivativeFn, Integrator, IntegratorOptions, Simulator, State, StepStatus, System};

struct AlwaysStiff {
    t: f64,
    y: Array1<f64>,
}

impl Integrator for AlwaysStiff {
    fn t(&self) -> f64 {
        self.t
    }

    fn y(&self) -> &Array1<f64> {
        &self.y
    }

    fn step(&mut self) -> Result<StepStatus, String> {
        Err("stiffness".to_string())
    }

    fn dense_output(&self) -> DenseOutput {
        unreachable!("step() always fails before dense_output is requested")
    }
}

#[test]
fn integrator_failure_surfaces_and_appends_nothing() {
    let system = System::new();
    let _x = State::new(&system, "x", 1, |_data| Ok(arr1(&[1.0])), Some(arr1(&[0.0]))).unwrap();

    let mut sim = Simulator::builder(&system)
        .integrator_factory(Box::new(
            |_f: DerivativeFn, t0: f64, y0: Array1<f64>, _t_bound: f64, _options: IntegratorOptions| {
                Box::new(AlwaysStiff { t: t0, y: y0 }) as Box<dyn Integrator>
            },
        ))
        .build()
        .unwrap();

    let samples_before = sim.result().len();
    let err = sim.step(1.0).unwrap_err();
    assert_eq!(err.to_string(), "integrator failed: stiffness");
    assert_eq!(sim.result().len(), samples_before);
}
