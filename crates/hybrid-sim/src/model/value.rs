use ndarray::Array1;

use crate::error::CoreError;
use crate::eval::DataProvider;

/// A pure function of the current instant's data, producing an array of the
/// declared shape. Used for `Signal::computed` values and `State` derivative
/// functions.
///
/// The Python original this crate is modeled after lets these raise
/// exceptions (e.g. on reading an unconnected port); the idiomatic Rust
/// rendition threads that through an explicit `Result` instead.
pub type ValueFn = Box<dyn Fn(&DataProvider) -> Result<Array1<f64>, CoreError>>;

/// A scalar event function, e.g. the zero-crossing condition of a
/// `ZeroCrossEvent`.
pub type EventFn = Box<dyn Fn(&DataProvider) -> Result<f64, CoreError>>;
