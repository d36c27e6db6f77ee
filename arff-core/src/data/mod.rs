//! Training data, its scalings and the per-epoch feeding policies.

pub mod dataset;
pub mod provider;
pub mod scaling;

pub use dataset::DataSet;
pub use provider::DataProvider;
pub use scaling::DataScalings;
