use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{s, Array1};

use crate::registry::Registry;
use crate::HashMap;

use super::event::{Clock, ZeroCrossEvent};
use super::port::Port;
use super::scope::Scope;
use super::signal::Signal;
use super::state::State;

/// The data every entity constructor mutates: the registry plus the ordered
/// lists of declared entities. Shared via `Rc<RefCell<_>>` between `System`
/// and every `Block` built under it, since blocks are pure naming/grouping
/// constructs that route allocation straight to the root (§9 design notes).
///
/// `*_by_name` are a debugging/introspection convenience with no effect on
/// simulation semantics: the dotted hierarchical name assigned by
/// [`super::scope::qualify`] is not part of the construction protocol's
/// identity (that's the handle), so a name collision simply shadows the
/// earlier entry rather than erroring.
#[derive(Default)]
pub(crate) struct SystemInner {
    pub registry: Registry,
    pub states: Vec<Rc<State>>,
    pub signals: Vec<Rc<Signal>>,
    pub input_signals: Vec<Rc<Signal>>,
    pub zero_cross_events: Vec<Rc<ZeroCrossEvent>>,
    pub clocks: Vec<Rc<Clock>>,
    pub output_ports: Vec<Rc<Port>>,
    pub states_by_name: HashMap<String, Rc<State>>,
    pub signals_by_name: HashMap<String, Rc<Signal>>,
    pub events_by_name: HashMap<String, Rc<ZeroCrossEvent>>,
    pub clocks_by_name: HashMap<String, Rc<Clock>>,
}

/// The root container of a block diagram: owns every `State`, `Signal`,
/// `Port` and event source declared against it, and assigns them their
/// dense flat-vector indices via the embedded [`Registry`].
///
/// `System` is a cheap handle (an `Rc<RefCell<_>>` underneath) so it can be
/// cloned freely and threaded through `Block::new` calls without lifetime
/// gymnastics; the real storage lives in the shared `SystemInner`.
#[derive(Clone, Default)]
pub struct System {
    inner: Rc<RefCell<SystemInner>>,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_states(&self) -> usize {
        self.inner.borrow().registry.num_states()
    }

    pub fn num_signals(&self) -> usize {
        self.inner.borrow().registry.num_signals()
    }

    pub fn num_events(&self) -> usize {
        self.inner.borrow().registry.num_events()
    }

    pub fn num_inputs(&self) -> usize {
        self.inner.borrow().registry.num_inputs()
    }

    pub fn num_outputs(&self) -> usize {
        self.inner.borrow().registry.num_outputs()
    }

    pub fn states(&self) -> Vec<Rc<State>> {
        self.inner.borrow().states.clone()
    }

    pub fn signals(&self) -> Vec<Rc<Signal>> {
        self.inner.borrow().signals.clone()
    }

    pub fn input_signals(&self) -> Vec<Rc<Signal>> {
        self.inner.borrow().input_signals.clone()
    }

    pub fn zero_cross_events(&self) -> Vec<Rc<ZeroCrossEvent>> {
        self.inner.borrow().zero_cross_events.clone()
    }

    pub fn clocks(&self) -> Vec<Rc<Clock>> {
        self.inner.borrow().clocks.clone()
    }

    pub fn output_ports(&self) -> Vec<Rc<Port>> {
        self.inner.borrow().output_ports.clone()
    }

    /// Looks up a declared [`State`] by its dotted hierarchical name, as
    /// assembled from its declaration path (`Block` nesting joined by `.`).
    pub fn state_by_name(&self, name: &str) -> Option<Rc<State>> {
        self.inner.borrow().states_by_name.get(name).cloned()
    }

    /// Looks up a declared [`Signal`] (plain or input) by name.
    pub fn signal_by_name(&self, name: &str) -> Option<Rc<Signal>> {
        self.inner.borrow().signals_by_name.get(name).cloned()
    }

    /// Looks up a declared [`ZeroCrossEvent`] by name.
    pub fn event_by_name(&self, name: &str) -> Option<Rc<ZeroCrossEvent>> {
        self.inner.borrow().events_by_name.get(name).cloned()
    }

    /// Looks up a declared [`Clock`] by name.
    pub fn clock_by_name(&self, name: &str) -> Option<Rc<Clock>> {
        self.inner.borrow().clocks_by_name.get(name).cloned()
    }

    /// The initial state vector: the concatenation of every declared
    /// `State`'s `initial_condition` in index order (§3 Data Model).
    pub fn initial_state_vector(&self) -> Array1<f64> {
        let inner = self.inner.borrow();
        let mut out = Array1::zeros(inner.registry.num_states());
        for state in &inner.states {
            out.slice_mut(s![state.state_slice()])
                .assign(state.initial_condition());
        }
        out
    }
}

impl Scope for System {
    fn system_inner(&self) -> Rc<RefCell<SystemInner>> {
        self.inner.clone()
    }

    fn path(&self) -> String {
        String::new()
    }
}
