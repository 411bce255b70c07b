use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use ndarray::Array1;

use crate::error::CoreError;

use super::handle::{InputId, SignalId};
use super::scope::{qualify, Scope};
use super::shape::Shape;
use super::value::ValueFn;

/// `Signal.value` is either a constant array or a pure function of the
/// current instant's data (§9 Design Notes: "Model as a tagged variant
/// `Const(array) | Computed(fn)`").
pub enum SignalValue {
    Const(Array1<f64>),
    Computed(ValueFn),
}

impl fmt::Debug for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Const(v) => f.debug_tuple("Const").field(v).finish(),
            SignalValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// An algebraic (non-state) output: a shape, a flat-vector slot, and a
/// value that is either constant or computed on demand by the evaluator.
///
/// A `Signal` additionally registered as a system-level input (an
/// `InputSignal` in §3 Data Model) carries an `input_index`/`input_slice` in
/// addition to its signal slot; this crate models that as an optional
/// `input_id` field on `Signal` rather than a distinct wrapper type, since
/// every other aspect of an input signal (evaluation, memoization, shape
/// checking) is identical to a plain signal.
pub struct Signal {
    id: SignalId,
    shape: Shape,
    name: String,
    value: SignalValue,
    input_id: Option<InputId>,
}

impl Signal {
    /// A signal whose value is a fixed constant, never re-evaluated.
    pub fn constant(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        value: Array1<f64>,
    ) -> Result<Rc<Signal>, CoreError> {
        Self::build(parent, name, shape, None, SignalValue::Const(value))
    }

    /// A signal whose value is computed on demand from a pure function of
    /// the current instant's data.
    pub fn computed(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        value_function: impl Fn(&crate::eval::DataProvider) -> Result<Array1<f64>, CoreError>
            + 'static,
    ) -> Result<Rc<Signal>, CoreError> {
        Self::build(
            parent,
            name,
            shape,
            None,
            SignalValue::Computed(Box::new(value_function)),
        )
    }

    /// A signal that is also a system-level input. If no input vector is
    /// supplied when constructing an `Evaluator`, the signal falls back to
    /// `default` (or zero, if none was configured) rather than invoking a
    /// user function — matching §4.C's "by convention yield zero or a
    /// user-configured constant".
    pub fn input(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        default: Option<Array1<f64>>,
    ) -> Result<Rc<Signal>, CoreError> {
        let shape = shape.into();
        let default = default.unwrap_or_else(|| Array1::zeros(shape.size()));
        if default.len() != shape.size() {
            return Err(CoreError::ShapeMismatch {
                entity: qualify(parent, name),
                declared: shape.dims().to_vec(),
                actual: vec![default.len()],
            });
        }

        let inner = parent.system_inner();
        let input_id = inner.borrow_mut().registry.allocate_input(shape.size());
        let signal = Self::build_with_input(
            parent,
            name,
            shape,
            SignalValue::Const(default),
            Some(input_id),
        )?;
        inner.borrow_mut().input_signals.push(signal.clone());
        Ok(signal)
    }

    fn build(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        input_id: Option<InputId>,
        value: SignalValue,
    ) -> Result<Rc<Signal>, CoreError> {
        Self::build_with_input(parent, name, shape, value, input_id)
    }

    fn build_with_input(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        value: SignalValue,
        input_id: Option<InputId>,
    ) -> Result<Rc<Signal>, CoreError> {
        let shape = shape.into();
        if let SignalValue::Const(ref v) = value {
            if v.len() != shape.size() {
                return Err(CoreError::ShapeMismatch {
                    entity: qualify(parent, name),
                    declared: shape.dims().to_vec(),
                    actual: vec![v.len()],
                });
            }
        }
        let full_name = qualify(parent, name);
        let inner = parent.system_inner();
        let id = inner.borrow_mut().registry.allocate_signal(shape.size());
        log::trace!("declared signal {full_name} at {id} (size {})", shape.size());

        let signal = Rc::new(Signal {
            id,
            shape,
            name: full_name,
            value,
            input_id,
        });
        let mut inner_mut = inner.borrow_mut();
        inner_mut.signals.push(signal.clone());
        inner_mut
            .signals_by_name
            .insert(signal.name().to_string(), signal.clone());
        drop(inner_mut);
        Ok(signal)
    }

    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    pub fn signal_index(&self) -> usize {
        self.id.index()
    }

    pub fn signal_slice(&self) -> Range<usize> {
        self.signal_index()..self.signal_index() + self.size()
    }

    pub fn input_id(&self) -> Option<InputId> {
        self.input_id
    }

    pub fn input_slice(&self) -> Option<Range<usize>> {
        self.input_id.map(|id| id.index()..id.index() + self.size())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value(&self) -> &SignalValue {
        &self.value
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("input_id", &self.input_id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Signal {}
