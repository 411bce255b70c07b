//! S1: two-body gravity, a near-circular orbit integrated over one period.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::arr1;

use hybrid_sim::{IntegratorOptions, Simulator, State, System};

const G: f64 = 6.67e-11 * (24.0 * 60.0 * 60.0) * (24.0 * 60.0 * 60.0);
const SUN_MASS: f64 = 1.989e30;
const PLANET_ORBIT: f64 = 149.6e9;
const PLANET_ORBIT_TIME: f64 = 365.256;

#[test]
fn orbit_closes_within_one_percent_after_one_period() {
    let system = System::new();

    let planet_velocity = 2.0 * std::f64::consts::PI * PLANET_ORBIT / PLANET_ORBIT_TIME;
    let angle = 20f64.to_radians();
    let x0 = arr1(&[PLANET_ORBIT, 0.0]);
    let v0 = arr1(&[angle.sin(), angle.cos()]) * (0.9 * planet_velocity);

    let velocity_cell: Rc<RefCell<Option<Rc<State>>>> = Rc::new(RefCell::new(None));

    let position = {
        let velocity_cell = velocity_cell.clone();
        State::new(
            &system,
            "position",
            2,
            move |data| {
                let velocity = velocity_cell.borrow().clone().expect("velocity declared below");
                Ok(data.state(&velocity))
            },
            Some(x0),
        )
        .unwrap()
    };

    let velocity = {
        let position = position.clone();
        State::new(
            &system,
            "velocity",
            2,
            move |data| {
                let x = data.state(&position);
                let r = (x[0] * x[0] + x[1] * x[1]).sqrt();
                Ok(&x * (-G * SUN_MASS / r.powi(3)))
            },
            Some(v0),
        )
        .unwrap()
    };
    *velocity_cell.borrow_mut() = Some(velocity);

    assert_eq!(system.num_states(), 4);

    let mut sim = Simulator::builder(&system)
        .integrator_options(IntegratorOptions {
            rtol: 1e-6,
            ..Default::default()
        })
        .build()
        .unwrap();
    sim.run_until(PLANET_ORBIT_TIME).unwrap();

    let result = sim.result();
    let last = result.len() - 1;
    let x = result.state()[[last, position.state_index()]];
    let y = result.state()[[last, position.state_index() + 1]];
    let final_radius = (x * x + y * y).sqrt();

    let relative_error = (final_radius - PLANET_ORBIT).abs() / PLANET_ORBIT;
    assert!(
        relative_error < 0.01,
        "final radius {final_radius:e} strayed {relative_error:.4} from initial {PLANET_ORBIT:e}"
    );
}
