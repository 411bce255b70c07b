//! S3: a signal whose value function reads itself fails evaluation rather
//! than recursing forever.

use std::cell::RefCell;
use std::rc::Rc;

use hybrid_sim::{CoreError, Evaluator, Signal, System};

#[test]
fn self_referential_signal_reports_algebraic_loop() {
    let system = System::new();

    let self_cell: Rc<RefCell<Option<Rc<Signal>>>> = Rc::new(RefCell::new(None));

    let signal_a = {
        let self_cell = self_cell.clone();
        Signal::computed(&system, "a", 1, move |data| {
            let a = self_cell.borrow().clone().expect("set right after construction");
            data.input(&a)
        })
        .unwrap()
    };
    *self_cell.borrow_mut() = Some(signal_a.clone());

    let evaluator = Evaluator::new(&system, 0.0, None);
    let err = evaluator.signal_value(&signal_a).unwrap_err();
    assert_eq!(
        err,
        CoreError::AlgebraicLoop {
            signal: "a".to_string()
        }
    );
}
