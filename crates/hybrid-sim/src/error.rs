use thiserror::Error;

/// Errors raised while building or evaluating a [`crate::model::System`].
///
/// Construction-time errors (shape, multiple sources) are raised at the
/// offending call; evaluation-time errors propagate to the caller of an
/// `Evaluator` method or `Simulator::step`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A declared shape does not match a produced or connected shape.
    #[error("shape mismatch for {entity}: declared {declared:?}, got {actual:?}")]
    ShapeMismatch {
        entity: String,
        declared: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A port has already been connected to a different source.
    #[error("{port} is already connected to a different source")]
    MultipleSignals { port: String },

    /// Evaluation reached a port with no resolved source signal.
    #[error("{port} is not connected to any signal")]
    PortNotConnected { port: String },

    /// A cyclic signal dependency was detected during evaluation.
    #[error("algebraic loop detected while evaluating {signal}")]
    AlgebraicLoop { signal: String },
}
