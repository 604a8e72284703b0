//! Storage layer: durable persistence for the trained classifier artifact.

mod error;
pub use error::StoreError;

mod model;
pub use model::ModelStore;
