//! A library for simulating hierarchical, hybrid continuous/discrete
//! dynamical systems expressed as block diagrams.
//!
//! A [`model::System`] is assembled from nested [`model::Block`]s containing
//! [`model::State`]s (continuous-time variables), [`model::Signal`]s
//! (algebraic functions of state and other signals), [`model::Port`]s
//! (connection points) and event sources ([`model::ZeroCrossEvent`],
//! [`model::Clock`]). [`eval::Evaluator`] resolves the dataflow graph at a
//! single instant; [`sim::Simulator`] drives a pluggable ODE integrator
//! forward in time, detects and localizes events, dispatches their
//! listeners, and records a [`result::SimulationResult`] time series.
//!
//! The block library (linear systems, motors, sources, ...), steady-state
//! finding, linearization and plotting are out of scope — this crate is the
//! evaluation/simulation core they build on.

mod error;
mod eval;
mod model;
mod registry;
mod result;
mod sim;

pub(crate) use fxhash::FxHashMap as HashMap;
#[allow(unused_imports)]
pub(crate) use fxhash::FxHashSet as HashSet;

pub use error::CoreError;
pub use eval::{DataProvider, Evaluator, Readable};
pub use model::{
    Block, Clock, Direction, EventFn, EventId, EventListener, InputId, OutputId, Port,
    PortTarget, Scope, Shape, Signal, SignalValue, State, StateId, System, ValueFn,
    ZeroCrossEvent,
};
pub use result::SimulationResult;
pub use sim::{
    default_integrator_factory, BrentRootFinder, DenseOutput, DerivativeFn, DormandPrince45,
    EventContext, Integrator, IntegratorFactory, IntegratorOptions, RootFinder,
    RootFinderOptions, Simulator, SimulatorBuilder, SimulatorError, StateUpdater, StepOutcome,
    StepStatus,
};
