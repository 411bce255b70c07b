//! Component D: the hybrid simulation loop, plus the pluggable numerical
//! machinery ([`integrator`], [`rootfind`]) it is built on.

mod builder;
mod error;
mod integrator;
mod rootfind;
mod simulator;
mod state_update;

pub use builder::SimulatorBuilder;
pub use error::SimulatorError;
pub use integrator::{
    default_integrator_factory, DenseOutput, DerivativeFn, DormandPrince45, Integrator,
    IntegratorFactory, IntegratorOptions, StepStatus,
};
pub use rootfind::{BrentRootFinder, RootFinder, RootFinderOptions};
pub use simulator::{Simulator, StepOutcome};
pub use state_update::{EventContext, StateUpdater};
