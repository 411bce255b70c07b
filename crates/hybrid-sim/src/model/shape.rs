use crate::error::CoreError;

/// The shape of a [`crate::model::State`], [`crate::model::Signal`] or
/// [`crate::model::Port`]: a tuple of positive integers. `size()` is the
/// product of the dimensions; the default shape (no dimensions given at
/// construction) is scalar, i.e. a single dimension of `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// The scalar shape `(1,)`.
    pub fn scalar() -> Self {
        Shape(vec![1])
    }

    /// A shape with the given dimensions. Every dimension must be positive.
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self, CoreError> {
        let dims = dims.into();
        if dims.is_empty() || dims.iter().any(|&d| d == 0) {
            return Err(CoreError::ShapeMismatch {
                entity: "shape".to_string(),
                declared: dims.clone(),
                actual: dims,
            });
        }
        Ok(Shape(dims))
    }

    /// The product of the dimensions: how many scalar slots this shape
    /// occupies in a flat vector.
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::new(vec![n]).expect("non-zero dimension")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims.to_vec()).expect("all dimensions positive")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims).expect("all dimensions positive")
    }
}
