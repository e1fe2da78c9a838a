//! Graph item model
//!
//! Items (nodes and connections) carrying dynamic attribute sets, owned by
//! a [`GraphModel`] arena.

pub mod attribute;
pub mod connection;
pub mod graph;
pub mod item;
pub mod node;

pub use attribute::{AttrValue, ClassDefaults, Color};
pub use connection::ConnectionData;
pub use graph::GraphModel;
pub use item::{Item, ItemClass, ItemCore, ItemKind};
pub use node::NodeData;
