// Data processing pipeline: normalization and reconciliation of source observations

pub mod normalize;
pub mod reconcile;

pub use normalize::ObservationNormalizer;
pub use reconcile::Reconciler;
