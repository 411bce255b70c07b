//! Fluent construction of a [`Simulator`], mirroring the teacher's
//! `Simulator::builder(..).build()` shape (`celox::simulator::SimulatorBuilder`)
//! while swapping its HDL-source-and-top-module inputs for this crate's
//! already-built [`System`] plus the pluggable integrator/root-finder
//! machinery named in §6 of the spec this crate implements.

use ndarray::Array1;

use crate::model::System;

use super::error::SimulatorError;
use super::integrator::{default_integrator_factory, IntegratorFactory, IntegratorOptions};
use super::rootfind::{BrentRootFinder, RootFinder, RootFinderOptions};
use super::simulator::Simulator;

/// Builds a [`Simulator`] for a given [`System`], with every knob defaulted
/// to this crate's reference numerics: an embedded Dormand-Prince RK5(4)
/// integrator and Brent's method for root-finding.
pub struct SimulatorBuilder<'a> {
    system: &'a System,
    start_time: f64,
    initial_condition: Option<Array1<f64>>,
    integrator_factory: IntegratorFactory,
    integrator_options: IntegratorOptions,
    root_finder: Box<dyn RootFinder>,
    rootfinder_options: RootFinderOptions,
}

impl<'a> SimulatorBuilder<'a> {
    pub fn new(system: &'a System) -> Self {
        SimulatorBuilder {
            system,
            start_time: 0.0,
            initial_condition: None,
            integrator_factory: default_integrator_factory(),
            integrator_options: IntegratorOptions::default(),
            root_finder: Box::new(BrentRootFinder),
            rootfinder_options: RootFinderOptions::default(),
        }
    }

    /// Overrides the simulated start time, default `0.0`.
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Overrides the initial state vector. Defaults to
    /// [`System::initial_state_vector`] — the concatenation of every
    /// declared state's `initial_condition` in index order.
    pub fn initial_condition(mut self, initial_condition: Array1<f64>) -> Self {
        self.initial_condition = Some(initial_condition);
        self
    }

    /// Swaps in a different [`super::integrator::Integrator`] implementation
    /// (§6 External Interfaces: the integrator is a pluggable capability).
    pub fn integrator_factory(mut self, factory: IntegratorFactory) -> Self {
        self.integrator_factory = factory;
        self
    }

    pub fn integrator_options(mut self, options: IntegratorOptions) -> Self {
        self.integrator_options = options;
        self
    }

    /// Swaps in a different [`RootFinder`] implementation.
    pub fn root_finder(mut self, root_finder: Box<dyn RootFinder>) -> Self {
        self.root_finder = root_finder;
        self
    }

    pub fn rootfinder_options(mut self, options: RootFinderOptions) -> Self {
        self.rootfinder_options = options;
        self
    }

    /// Builds the first [`Evaluator`](crate::eval::Evaluator) at `start_time`
    /// and appends the initial sample to the result buffer, per §4.D
    /// Simulator's construction contract.
    pub fn build(self) -> Result<Simulator<'a>, SimulatorError> {
        Simulator::new(
            self.system,
            self.start_time,
            self.initial_condition,
            self.integrator_factory,
            self.integrator_options,
            self.root_finder,
            self.rootfinder_options,
        )
    }
}
