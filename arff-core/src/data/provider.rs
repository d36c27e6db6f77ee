//! Per-epoch data feeding policies.

use std::borrow::Cow;

use rand::Rng;
use rand::seq::index;

use crate::data::DataSet;
use crate::error::{ArffError, ArffResult};

/// Supplies one dataset per epoch to the trainer.
#[derive(Debug, Clone)]
pub enum DataProvider {
    /// The same dataset every epoch.
    Fixed(DataSet),
    /// Round-robin over equally sized datasets.
    Cyclic(Vec<DataSet>),
    /// A fresh subset of `batch_size` distinct rows every epoch.
    Minibatch { data: DataSet, batch_size: usize },
}

impl DataProvider {
    pub fn fixed(data: DataSet) -> Self {
        Self::Fixed(data)
    }

    /// Cycle through `batches`; they must be non-empty, equally sized and
    /// share one input dimension.
    pub fn cyclic(batches: Vec<DataSet>) -> ArffResult<Self> {
        let first = batches
            .first()
            .ok_or_else(|| ArffError::config("cyclic data needs at least one dataset"))?;
        let (len, dim) = (first.len(), first.dim());
        for (i, batch) in batches.iter().enumerate() {
            if batch.len() != len {
                return Err(ArffError::config(format!(
                    "cyclic dataset {i} has {} points (expected {len})",
                    batch.len()
                )));
            }
            if batch.dim() != dim {
                return Err(ArffError::config(format!(
                    "cyclic dataset {i} has dimension {} (expected {dim})",
                    batch.dim()
                )));
            }
        }
        Ok(Self::Cyclic(batches))
    }

    pub fn minibatch(data: DataSet, batch_size: usize) -> ArffResult<Self> {
        if batch_size == 0 || batch_size > data.len() {
            return Err(ArffError::config(format!(
                "batch size {batch_size} must be in 1..={}",
                data.len()
            )));
        }
        Ok(Self::Minibatch { data, batch_size })
    }

    /// Input dimension of the data this provider yields.
    pub fn dim(&self) -> usize {
        match self {
            Self::Fixed(data) | Self::Minibatch { data, .. } => data.dim(),
            Self::Cyclic(batches) => batches[0].dim(),
        }
    }

    /// Number of points in every yielded dataset.
    pub fn batch_len(&self) -> usize {
        match self {
            Self::Fixed(data) => data.len(),
            Self::Cyclic(batches) => batches[0].len(),
            Self::Minibatch { batch_size, .. } => *batch_size,
        }
    }

    /// Dataset for the 1-based `epoch`.
    pub fn batch<R: Rng + ?Sized>(&self, epoch: usize, rng: &mut R) -> Cow<'_, DataSet> {
        match self {
            Self::Fixed(data) => Cow::Borrowed(data),
            Self::Cyclic(batches) => {
                Cow::Borrowed(&batches[epoch.saturating_sub(1) % batches.len()])
            }
            Self::Minibatch { data, batch_size } if *batch_size == data.len() => {
                Cow::Borrowed(data)
            }
            Self::Minibatch { data, batch_size } => {
                let mut rows = index::sample(rng, data.len(), *batch_size).into_vec();
                rows.sort_unstable();
                Cow::Owned(data.subset(rows))
            }
        }
    }
}

impl From<DataSet> for DataProvider {
    fn from(data: DataSet) -> Self {
        Self::Fixed(data)
    }
}

impl TryFrom<Vec<DataSet>> for DataProvider {
    type Error = ArffError;

    fn try_from(batches: Vec<DataSet>) -> ArffResult<Self> {
        Self::cyclic(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn ramp(n: usize, offset: f64) -> DataSet {
        let x = (0..n).map(|i| DVector::from_element(1, i as f64)).collect();
        DataSet::from_real(x, (0..n).map(|i| offset + i as f64).collect()).unwrap()
    }

    #[test]
    fn test_cyclic_round_robin() {
        let provider = DataProvider::cyclic(vec![ramp(3, 0.0), ramp(3, 100.0)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(provider.batch(1, &mut rng).y()[0].re, 0.0);
        assert_eq!(provider.batch(2, &mut rng).y()[0].re, 100.0);
        assert_eq!(provider.batch(3, &mut rng).y()[0].re, 0.0);
    }

    #[test]
    fn test_cyclic_rejects_uneven_sizes() {
        let err = DataProvider::cyclic(vec![ramp(3, 0.0), ramp(4, 0.0)]).unwrap_err();
        assert!(matches!(err, ArffError::Config(_)));
        assert!(DataProvider::cyclic(Vec::new()).is_err());
    }

    #[test]
    fn test_minibatch_size_validated_eagerly() {
        assert!(DataProvider::minibatch(ramp(5, 0.0), 6).is_err());
        assert!(DataProvider::minibatch(ramp(5, 0.0), 0).is_err());
        assert!(DataProvider::minibatch(ramp(5, 0.0), 5).is_ok());
    }

    #[test]
    fn test_minibatch_draws_distinct_rows() {
        let provider = DataProvider::minibatch(ramp(20, 0.0), 7).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for epoch in 1..=25 {
            let batch = provider.batch(epoch, &mut rng);
            assert_eq!(batch.len(), 7);
            let rows: HashSet<u64> = batch.x().iter().map(|x| x[0] as u64).collect();
            assert_eq!(rows.len(), 7);
            for (x, y) in batch.x().iter().zip(batch.y().iter()) {
                assert_eq!(x[0], y.re);
            }
        }
    }

    #[test]
    fn test_conversions() {
        let fixed: DataProvider = ramp(4, 0.0).into();
        assert!(matches!(fixed, DataProvider::Fixed(_)));
        let cyclic = DataProvider::try_from(vec![ramp(4, 0.0), ramp(4, 1.0)]).unwrap();
        assert_eq!(cyclic.batch_len(), 4);
        assert!(DataProvider::try_from(vec![ramp(4, 0.0), ramp(2, 1.0)]).is_err());
    }

    #[test]
    fn test_full_minibatch_is_whole_dataset() {
        let data = ramp(6, 0.0);
        let provider = DataProvider::minibatch(data.clone(), 6).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(*provider.batch(1, &mut rng), data);
    }
}
