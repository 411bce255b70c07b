//! The mutable view of the state vector handed to event listeners, plus the
//! read-only evaluator snapshot they run alongside.
//!
//! Grounded on `simtree.simulation.StateUpdater`: a thin `__setitem__`/
//! `__getitem__` wrapper over a state-vector slice, used so a listener can
//! read and write a `State`'s current value without knowing its flat-vector
//! offset.

use ndarray::{s, Array1};

use crate::error::CoreError;
use crate::eval::Evaluator;
use crate::model::State;

/// A working copy of the state vector, indexed by [`State`] rather than by
/// raw offset. Event listeners mutate this in place; the simulator commits
/// the result as the post-event state once every listener for the firing
/// event(s) has run.
pub struct StateUpdater {
    state: Array1<f64>,
}

impl StateUpdater {
    pub(crate) fn new(state: Array1<f64>) -> Self {
        StateUpdater { state }
    }

    pub fn get(&self, state: &State) -> Array1<f64> {
        self.state.slice(s![state.state_slice()]).to_owned()
    }

    /// Overwrites `state`'s slice. Returns [`CoreError::ShapeMismatch`] if
    /// `value` does not match the state's declared size.
    pub fn set(&mut self, state: &State, value: &Array1<f64>) -> Result<(), CoreError> {
        if value.len() != state.size() {
            return Err(CoreError::ShapeMismatch {
                entity: state.name().to_string(),
                declared: state.shape().dims().to_vec(),
                actual: vec![value.len()],
            });
        }
        self.state.slice_mut(s![state.state_slice()]).assign(value);
        Ok(())
    }

    pub(crate) fn into_inner(self) -> Array1<f64> {
        self.state
    }

    pub(crate) fn as_slice(&self) -> &Array1<f64> {
        &self.state
    }
}

/// What an event listener sees: the evaluator at the moment the event fired
/// (read-only — re-querying signals/derivatives at the pre-event state), and
/// a mutable [`StateUpdater`] it may write new state values into.
pub struct EventContext<'e, 'a> {
    eval: &'e Evaluator<'a>,
    updater: &'e mut StateUpdater,
}

impl<'e, 'a> EventContext<'e, 'a> {
    pub(crate) fn new(eval: &'e Evaluator<'a>, updater: &'e mut StateUpdater) -> Self {
        EventContext { eval, updater }
    }

    pub fn time(&self) -> f64 {
        self.eval.time()
    }

    pub fn evaluator(&self) -> &Evaluator<'a> {
        self.eval
    }

    pub fn get(&self, state: &State) -> Array1<f64> {
        self.updater.get(state)
    }

    pub fn set(&mut self, state: &State, value: &Array1<f64>) -> Result<(), CoreError> {
        self.updater.set(state, value)
    }
}
