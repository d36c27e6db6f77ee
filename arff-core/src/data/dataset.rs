//! Training data: paired real inputs and complex targets.

use nalgebra::DVector;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ArffError, ArffResult};

/// An immutable set of (x, y) pairs with x ∈ R^d and y ∈ C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataSet")]
pub struct DataSet {
    x: Vec<DVector<f64>>,
    y: DVector<Complex64>,
}

/// Serialized form; deserialization goes through [`DataSet::new`].
#[derive(Deserialize)]
struct RawDataSet {
    x: Vec<DVector<f64>>,
    y: DVector<Complex64>,
}

impl TryFrom<RawDataSet> for DataSet {
    type Error = ArffError;

    fn try_from(raw: RawDataSet) -> ArffResult<Self> {
        Self::new(raw.x, raw.y.iter().copied().collect())
    }
}

impl DataSet {
    pub fn new(x: Vec<DVector<f64>>, y: Vec<Complex64>) -> ArffResult<Self> {
        if x.len() != y.len() {
            return Err(ArffError::dataset(format!(
                "{} inputs but {} targets",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(ArffError::dataset("dataset is empty"));
        }
        let dim = x[0].len();
        if dim == 0 {
            return Err(ArffError::dataset("inputs must have at least one coordinate"));
        }
        if let Some(j) = x.iter().position(|xj| xj.len() != dim) {
            return Err(ArffError::dataset(format!(
                "input {j} has dimension {} (expected {dim})",
                x[j].len()
            )));
        }
        Ok(Self {
            x,
            y: DVector::from_vec(y),
        })
    }

    /// Build a dataset from real-valued targets.
    pub fn from_real(x: Vec<DVector<f64>>, y: Vec<f64>) -> ArffResult<Self> {
        Self::new(x, y.into_iter().map(|v| Complex64::new(v, 0.0)).collect())
    }

    pub fn x(&self) -> &[DVector<f64>] {
        &self.x
    }

    pub fn y(&self) -> &DVector<Complex64> {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Input dimension d.
    pub fn dim(&self) -> usize {
        self.x[0].len()
    }

    /// Copy of the rows at `indices`, in the given order.
    pub(crate) fn subset(&self, indices: impl IntoIterator<Item = usize>) -> Self {
        let (x, y): (Vec<_>, Vec<_>) = indices
            .into_iter()
            .map(|j| (self.x[j].clone(), self.y[j]))
            .unzip();
        Self {
            x,
            y: DVector::from_vec(y),
        }
    }

    /// Map every pair through `f`, keeping the shape.
    pub(crate) fn map(
        &self,
        mut f: impl FnMut(&DVector<f64>, Complex64) -> (DVector<f64>, Complex64),
    ) -> Self {
        let (x, y): (Vec<_>, Vec<_>) = self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(x, y)| f(x, *y))
            .unzip();
        Self {
            x,
            y: DVector::from_vec(y),
        }
    }
}
