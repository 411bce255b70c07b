use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use ndarray::Array1;

use crate::error::CoreError;

use super::handle::StateId;
use super::scope::{qualify, Scope};
use super::shape::Shape;
use super::value::ValueFn;

/// A continuous-time variable integrated by the ODE solver.
///
/// Occupies a contiguous `state_slice` of the flat state vector, fixed at
/// construction time. `derivative_function` is a pure function of the
/// current instant's data; `initial_condition` seeds the state vector
/// assembled by `System::initial_state_vector`.
pub struct State {
    id: StateId,
    shape: Shape,
    name: String,
    derivative_function: ValueFn,
    initial_condition: Array1<f64>,
}

impl State {
    /// Declares a new state under `parent`, allocating its slice of the flat
    /// state vector. `initial_condition` defaults to the zero array of the
    /// declared shape when `None` (the Python original's unenforced default,
    /// made explicit here per §9 Design Notes).
    pub fn new(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        derivative_function: impl Fn(&crate::eval::DataProvider) -> Result<Array1<f64>, CoreError>
            + 'static,
        initial_condition: Option<Array1<f64>>,
    ) -> Result<Rc<State>, CoreError> {
        let shape = shape.into();
        let full_name = qualify(parent, name);

        let initial_condition = match initial_condition {
            Some(ic) if ic.len() == shape.size() => ic,
            Some(ic) => {
                return Err(CoreError::ShapeMismatch {
                    entity: format!("{full_name}.initial_condition"),
                    declared: shape.dims().to_vec(),
                    actual: vec![ic.len()],
                })
            }
            None => Array1::zeros(shape.size()),
        };

        let inner = parent.system_inner();
        let id = inner.borrow_mut().registry.allocate_state(shape.size());
        log::trace!("declared state {full_name} at {id} (size {})", shape.size());

        let state = Rc::new(State {
            id,
            shape,
            name: full_name,
            derivative_function: Box::new(derivative_function),
            initial_condition,
        });
        let mut inner_mut = inner.borrow_mut();
        inner_mut.states.push(state.clone());
        inner_mut
            .states_by_name
            .insert(state.name().to_string(), state.clone());
        drop(inner_mut);
        Ok(state)
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    pub fn state_index(&self) -> usize {
        self.id.index()
    }

    pub fn state_slice(&self) -> Range<usize> {
        self.state_index()..self.state_index() + self.size()
    }

    pub fn initial_condition(&self) -> &Array1<f64> {
        &self.initial_condition
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn eval_derivative(
        &self,
        data: &crate::eval::DataProvider,
    ) -> Result<Array1<f64>, CoreError> {
        (self.derivative_function)(data)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for State {}
