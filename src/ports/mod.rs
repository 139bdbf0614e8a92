//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the classifier and the persisted model artifacts.

mod model;

pub use model::{Regressor, Scaler};
