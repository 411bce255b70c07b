//! S4: two zero-cross events bracketed within the same integrator step. Only
//! the lower-declaration-order event is localized and dispatched this step;
//! the other is left for the following one.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::arr1;

use hybrid_sim::{Direction, IntegratorOptions, Simulator, State, System, ZeroCrossEvent};

#[test]
fn earlier_declared_event_fires_first_later_one_waits_a_step() {
    let system = System::new();

    // Two independent linear countdowns, crossing zero 2ms apart — well
    // outside the 1ms event epsilon, but both bracketed by a single huge
    // first step (dynamics are exactly linear, so RK45's embedded error
    // estimate is zero regardless of step size).
    let a = State::new(&system, "a", 1, |_data| Ok(arr1(&[-1.0])), Some(arr1(&[2.0]))).unwrap();
    let b = State::new(
        &system,
        "b",
        1,
        |_data| Ok(arr1(&[-1.0])),
        Some(arr1(&[2.002])),
    )
    .unwrap();

    let fired: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let event_a = {
        let a = a.clone();
        ZeroCrossEvent::new(
            &system,
            "event_a",
            move |data| Ok(data.state(&a)[0]),
            Direction::Negative,
            1e-9,
        )
    };
    {
        let fired = fired.clone();
        event_a.register_listener(move |_ctx| {
            fired.borrow_mut().push("a");
            Ok(())
        });
    }

    let event_b = {
        let b = b.clone();
        ZeroCrossEvent::new(
            &system,
            "event_b",
            move |data| Ok(data.state(&b)[0]),
            Direction::Negative,
            1e-9,
        )
    };
    {
        let fired = fired.clone();
        event_b.register_listener(move |_ctx| {
            fired.borrow_mut().push("b");
            Ok(())
        });
    }

    let mut sim = Simulator::builder(&system)
        .integrator_options(IntegratorOptions {
            first_step: Some(10.0),
            max_step: 10.0,
            ..Default::default()
        })
        .build()
        .unwrap();

    sim.step(3.0).unwrap();
    assert_eq!(
        *fired.borrow(),
        vec!["a"],
        "only the earlier-declared event fires on the step that brackets both crossings"
    );

    sim.step(3.0).unwrap();
    assert_eq!(
        *fired.borrow(),
        vec!["a", "b"],
        "the other event fires on the following step"
    );
}
