//! Core of a desktop graph editor, stripped of its GUI shell.
//!
//! The crate owns two pieces of real logic: the generic graph-item model
//! (typed nodes and connections carrying dynamic attribute sets, with a
//! versioned binary persistence format and two-phase relinking), and the
//! polygon-chain reconstruction used when importing site geometry.
//! Rendering, hit-testing and undo wiring live in external collaborators
//! that call into this crate and get plain data back.

pub mod algo;
pub mod document;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;

pub use error::Error;

/// Arena handle for an item inside a [`model::GraphModel`].
///
/// Monotonically increasing, never reused within a model. Doubles as the
/// reference token written for connection endpoints in the document stream;
/// token `0` is reserved for "no endpoint".
pub type ItemId = u64;

/// Current binary document format version.
pub const FORMAT_VERSION: u64 = 4;
/// First format version that carries per-item attribute maps.
pub const VERSION_WITH_ATTRIBUTES: u64 = 2;
/// First format version that carries per-item string ids.
pub const VERSION_WITH_ITEM_IDS: u64 = 4;
