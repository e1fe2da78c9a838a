//! Geometry algorithms used by the configuration importers

pub mod chain;

pub use chain::{PointRecord, reconstruct_chain};
