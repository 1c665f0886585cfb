// Fri Jan 23 2026 - Alex

pub mod transformer;

pub use transformer::{parse_numeric, BatchTransformer, FeatureBatch};
