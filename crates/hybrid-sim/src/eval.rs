//! Component C: the evaluator — demand-driven, memoizing resolution of
//! signals, state derivatives and event values at a single instant in time.
//!
//! Grounded on `simtree.model.evaluator.Evaluator` (the Python original this
//! crate is modeled after): a `get_x` accessor per aspect, a `valid_x` set
//! memoizing completed work, and (for signals only) an "evaluation set" that
//! detects a signal depending on its own value through a chain of ports.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{s, Array1};

use crate::error::CoreError;
use crate::model::{Port, Signal, SignalValue, State, System, ZeroCrossEvent};

struct EvalInner {
    state_derivative: Array1<f64>,
    valid_state_derivatives: Vec<bool>,
    signals: Array1<f64>,
    valid_signals: Vec<bool>,
    evaluating: Vec<bool>,
    event_values: Array1<f64>,
    valid_event_values: Vec<bool>,
}

/// Evaluates a [`System`] at a fixed `(time, state)` instant, memoizing every
/// signal, state derivative and event value it is asked to compute so that
/// no value is recomputed twice within the same instant.
pub struct Evaluator<'a> {
    system: &'a System,
    time: f64,
    state: Array1<f64>,
    inner: RefCell<EvalInner>,
}

impl<'a> Evaluator<'a> {
    /// An evaluator with no system-level inputs preloaded; any `InputSignal`
    /// read during evaluation falls back to its configured default.
    pub fn new(system: &'a System, time: f64, state: Option<Array1<f64>>) -> Self {
        Self::with_inputs(system, time, state, None)
    }

    /// An evaluator with an explicit input vector. Every `InputSignal`'s
    /// slice of `inputs` is preloaded into the signal vector and marked
    /// valid up front, so it is never recomputed from its (constant)
    /// `value_function` (§4.C: inputs "short-circuit" signal evaluation).
    pub fn with_inputs(
        system: &'a System,
        time: f64,
        state: Option<Array1<f64>>,
        inputs: Option<Array1<f64>>,
    ) -> Self {
        let num_states = system.num_states();
        let num_signals = system.num_signals();
        let num_events = system.num_events();

        let state = state.unwrap_or_else(|| Array1::zeros(num_states));

        let mut signals = Array1::zeros(num_signals);
        let mut valid_signals = vec![false; num_signals];
        if let Some(inputs) = inputs {
            for signal in system.input_signals() {
                if let Some(input_slice) = signal.input_slice() {
                    signals
                        .slice_mut(s![signal.signal_slice()])
                        .assign(&inputs.slice(s![input_slice]));
                    valid_signals[signal.id().index()] = true;
                }
            }
        }

        Evaluator {
            system,
            time,
            state,
            inner: RefCell::new(EvalInner {
                state_derivative: Array1::zeros(num_states),
                valid_state_derivatives: vec![false; num_states],
                signals,
                valid_signals,
                evaluating: vec![false; num_signals],
                event_values: Array1::zeros(num_events),
                valid_event_values: vec![false; num_events],
            }),
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> &Array1<f64> {
        &self.state
    }

    /// The value of a single state, reshaped to its declared shape (a flat
    /// vector here, since this crate only supports rank-1 shapes).
    pub fn state_value(&self, state: &State) -> Array1<f64> {
        self.state.slice(s![state.state_slice()]).to_owned()
    }

    /// Resolves `port` to its signal and returns that signal's value,
    /// computing it on demand if necessary.
    pub fn port_value(&self, port: &Port) -> Result<Array1<f64>, CoreError> {
        let signal = port.signal()?;
        self.signal_value(&signal)
    }

    /// The value of `signal`, computing it on demand if this is the first
    /// request this instant. Detects algebraic loops: if evaluating
    /// `signal` requires (transitively) evaluating `signal` again, returns
    /// [`CoreError::AlgebraicLoop`] instead of recursing forever.
    pub fn signal_value(&self, signal: &Rc<Signal>) -> Result<Array1<f64>, CoreError> {
        let idx = signal.id().index();

        {
            let inner = self.inner.borrow();
            if inner.valid_signals[idx] {
                return Ok(inner.signals.slice(s![signal.signal_slice()]).to_owned());
            }
            if inner.evaluating[idx] {
                return Err(CoreError::AlgebraicLoop {
                    signal: signal.name().to_string(),
                });
            }
        }

        self.inner.borrow_mut().evaluating[idx] = true;
        let _guard = EvaluatingGuard {
            inner: &self.inner,
            idx,
        };

        let value = match signal.value() {
            SignalValue::Const(v) => v.clone(),
            SignalValue::Computed(f) => {
                let data = DataProvider { eval: self };
                f(&data)?
            }
        };
        if value.len() != signal.size() {
            return Err(CoreError::ShapeMismatch {
                entity: signal.name().to_string(),
                declared: signal.shape().dims().to_vec(),
                actual: vec![value.len()],
            });
        }

        let mut inner = self.inner.borrow_mut();
        inner
            .signals
            .slice_mut(s![signal.signal_slice()])
            .assign(&value);
        inner.valid_signals[idx] = true;
        Ok(value)
    }

    /// The derivative of `state`, computing it on demand if this is the
    /// first request this instant.
    pub fn state_derivative(&self, state: &State) -> Result<Array1<f64>, CoreError> {
        let idx = state.id().index();
        {
            let inner = self.inner.borrow();
            if inner.valid_state_derivatives[idx] {
                return Ok(inner
                    .state_derivative
                    .slice(s![state.state_slice()])
                    .to_owned());
            }
        }

        let data = DataProvider { eval: self };
        let derivative = state.eval_derivative(&data)?;
        if derivative.len() != state.size() {
            return Err(CoreError::ShapeMismatch {
                entity: state.name().to_string(),
                declared: state.shape().dims().to_vec(),
                actual: vec![derivative.len()],
            });
        }

        let mut inner = self.inner.borrow_mut();
        inner
            .state_derivative
            .slice_mut(s![state.state_slice()])
            .assign(&derivative);
        inner.valid_state_derivatives[idx] = true;
        Ok(derivative)
    }

    /// The scalar value of `event`'s condition function, computing it on
    /// demand if this is the first request this instant.
    pub fn event_value(&self, event: &ZeroCrossEvent) -> Result<f64, CoreError> {
        let idx = event.id().index();
        {
            let inner = self.inner.borrow();
            if inner.valid_event_values[idx] {
                return Ok(inner.event_values[idx]);
            }
        }

        let data = DataProvider { eval: self };
        let value = event.eval(&data)?;

        let mut inner = self.inner.borrow_mut();
        inner.event_values[idx] = value;
        inner.valid_event_values[idx] = true;
        Ok(value)
    }

    /// The state derivative vector for the complete system, forcing
    /// evaluation of every declared state.
    pub fn state_derivative_vector(&self) -> Result<Array1<f64>, CoreError> {
        for state in self.system.states() {
            self.state_derivative(&state)?;
        }
        Ok(self.inner.borrow().state_derivative.clone())
    }

    /// The signal vector for the complete system, forcing evaluation of
    /// every declared signal.
    pub fn signals_vector(&self) -> Result<Array1<f64>, CoreError> {
        for signal in self.system.signals() {
            self.signal_value(&signal)?;
        }
        Ok(self.inner.borrow().signals.clone())
    }

    /// The event value vector for the complete system, forcing evaluation
    /// of every declared zero-crossing event.
    pub fn event_values_vector(&self) -> Result<Array1<f64>, CoreError> {
        for event in self.system.zero_cross_events() {
            self.event_value(&event)?;
        }
        Ok(self.inner.borrow().event_values.clone())
    }

    /// The input vector for the complete system, reading every declared
    /// input signal's current (possibly computed) value.
    pub fn inputs_vector(&self) -> Result<Array1<f64>, CoreError> {
        let mut out = Array1::zeros(self.system.num_inputs());
        for signal in self.system.input_signals() {
            let value = self.signal_value(&signal)?;
            if let Some(slice) = signal.input_slice() {
                out.slice_mut(s![slice]).assign(&value);
            }
        }
        Ok(out)
    }

    /// The output vector for the complete system, resolving every declared
    /// output port to its signal's value.
    pub fn outputs_vector(&self) -> Result<Array1<f64>, CoreError> {
        let mut out = Array1::zeros(self.system.num_outputs());
        for port in self.system.output_ports() {
            let value = self.port_value(&port)?;
            if let Some(id) = port.output_id() {
                let start = id.index();
                out.slice_mut(s![start..start + value.len()]).assign(&value);
            }
        }
        Ok(out)
    }
}

/// Clears the per-signal "currently evaluating" flag on both the success and
/// error-unwind paths out of [`Evaluator::signal_value`], matching the
/// original's "remove from the evaluation set on completion" wording.
struct EvaluatingGuard<'r> {
    inner: &'r RefCell<EvalInner>,
    idx: usize,
}

impl Drop for EvaluatingGuard<'_> {
    fn drop(&mut self) {
        self.inner.borrow_mut().evaluating[self.idx] = false;
    }
}

/// Read access to the current instant's data, passed to every `State`
/// derivative function, `Signal` value function and `ZeroCrossEvent`
/// condition function.
pub struct DataProvider<'e, 'a> {
    eval: &'e Evaluator<'a>,
}

impl<'e, 'a> DataProvider<'e, 'a> {
    pub fn time(&self) -> f64 {
        self.eval.time()
    }

    pub fn state(&self, state: &State) -> Array1<f64> {
        self.eval.state_value(state)
    }

    /// Reads a [`Signal`] or [`Port`] by value, computing it on demand.
    pub fn input<T: Readable>(&self, source: &T) -> Result<Array1<f64>, CoreError> {
        source.read(self.eval)
    }
}

/// Anything `DataProvider::input` can resolve to an array: a `Signal`
/// directly, or a `Port` via the signal it is connected to.
pub trait Readable {
    fn read(&self, eval: &Evaluator) -> Result<Array1<f64>, CoreError>;
}

impl Readable for Rc<Signal> {
    fn read(&self, eval: &Evaluator) -> Result<Array1<f64>, CoreError> {
        eval.signal_value(self)
    }
}

impl Readable for Rc<Port> {
    fn read(&self, eval: &Evaluator) -> Result<Array1<f64>, CoreError> {
        eval.port_value(self)
    }
}
