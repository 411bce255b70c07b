use thiserror::Error;

use crate::error::CoreError;

/// Errors raised while driving a [`crate::sim::simulator::Simulator`].
///
/// Mirrors `celox::simulator::SimulatorError`'s shape: evaluation errors
/// from the model layer are wrapped transparently, and the simulator adds
/// its own variants for the numerical machinery it owns.
#[derive(Error, Debug, Clone)]
pub enum SimulatorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The configured [`crate::sim::integrator::Integrator`] failed to
    /// advance (e.g. step size collapsed below its minimum).
    #[error("integrator failed: {0}")]
    IntegratorFailed(String),

    /// The configured [`crate::sim::rootfind::RootFinder`] failed to
    /// localize an event crossing within a step.
    #[error("root finding failed: {0}")]
    RootFindFailed(String),
}
