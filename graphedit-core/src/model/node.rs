//! Node payload: a position plus bookkeeping of incident connections

use std::io::Cursor;

use geo::Point;

use crate::document::stream;
use crate::{Error, ItemId};

/// Kind payload of a node item.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Node coordinates
    pub position: Point<f64>,
    /// Connections whose first or last endpoint is this node.
    ///
    /// Maintained exclusively by the model's endpoint setters; external code
    /// must never mutate this directly.
    pub(crate) incident: Vec<ItemId>,
    /// Whether a connection may use this node as both endpoints.
    pub allow_loops: bool,
}

impl Default for NodeData {
    fn default() -> Self {
        Self::at(Point::new(0.0, 0.0))
    }
}

impl NodeData {
    pub fn at(position: Point<f64>) -> Self {
        Self {
            position,
            incident: Vec::new(),
            allow_loops: false,
        }
    }

    /// Connections currently attached to this node.
    pub fn incident_connections(&self) -> &[ItemId] {
        &self.incident
    }

    pub(crate) fn store(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        stream::write_f64(out, self.position.x())?;
        stream::write_f64(out, self.position.y())?;
        Ok(())
    }

    pub(crate) fn restore(&mut self, input: &mut Cursor<&[u8]>) -> Result<(), Error> {
        let x = stream::read_f64(input)?;
        let y = stream::read_f64(input)?;
        self.position = Point::new(x, y);
        Ok(())
    }
}
