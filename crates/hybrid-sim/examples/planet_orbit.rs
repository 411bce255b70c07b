//! A planet orbiting a sun under two-body gravity.
//!
//! Transliterates `original_source/examples/guide/03_planet_orbit.py`: two
//! vector states (position, velocity), each shape `(2,)`, integrated over
//! one orbital period. `position`'s derivative is `velocity`'s *value*
//! (not a signal, so this isn't subject to algebraic-loop detection); since
//! each state's derivative closure needs to read the other state and Rust
//! can't construct two `Rc`s that reference each other directly, `velocity`
//! is forward-declared via a `RefCell` cell that `position`'s closure reads
//! through, filled in once `velocity` itself is constructed.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::arr1;

use hybrid_sim::{IntegratorOptions, Simulator, State, System};

const G: f64 = 6.67e-11 * (24.0 * 60.0 * 60.0) * (24.0 * 60.0 * 60.0);
const SUN_MASS: f64 = 1.989e30;
const PLANET_ORBIT: f64 = 149.6e9;
const PLANET_ORBIT_TIME: f64 = 365.256;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

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
        )?
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
        )?
    };
    *velocity_cell.borrow_mut() = Some(velocity);

    let mut sim = Simulator::builder(&system)
        .integrator_options(IntegratorOptions {
            rtol: 1e-6,
            ..Default::default()
        })
        .build()?;
    sim.run_until(PLANET_ORBIT_TIME)?;

    let result = sim.result();
    let last = result.len() - 1;
    let final_position = [
        result.state()[[last, position.state_index()]],
        result.state()[[last, position.state_index() + 1]],
    ];
    let final_radius =
        (final_position[0] * final_position[0] + final_position[1] * final_position[1]).sqrt();
    println!(
        "recorded {} samples, final radius {:.3e} (initial {:.3e})",
        result.len(),
        final_radius,
        PLANET_ORBIT
    );

    Ok(())
}
