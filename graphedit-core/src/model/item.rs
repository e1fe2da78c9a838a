//! Base graph item: identity, dynamic attributes and the versioned codec
//! shared by every concrete item kind.

use std::io::Cursor;

use hashbrown::HashMap;
use itertools::Itertools;

use super::attribute::{AttrValue, ClassDefaults};
use super::connection::ConnectionData;
use super::node::NodeData;
use crate::document::stream;
use crate::{Error, VERSION_WITH_ATTRIBUTES, VERSION_WITH_ITEM_IDS};

/// Closed set of item classes the model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemClass {
    Node,
    Connection,
}

/// State shared by every item: the stable string id, the local attribute
/// map and the "attributes changed" flag consumed by external layers.
#[derive(Debug, Clone, Default)]
pub struct ItemCore {
    pub id: String,
    attributes: HashMap<String, AttrValue>,
    attrs_changed: bool,
}

impl ItemCore {
    pub fn local_attribute(&self, attr_id: &str) -> Option<&AttrValue> {
        self.attributes.get(attr_id)
    }

    pub fn local_attribute_ids(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Writes the base fields in version-gated order: attribute map at
    /// version 2 and above, id string at version 4 and above. Older versions
    /// omit the fields entirely, so reader and writer must agree exactly.
    pub(crate) fn store(&self, out: &mut Vec<u8>, version: u64) -> Result<(), Error> {
        if version >= VERSION_WITH_ATTRIBUTES {
            stream::write_attr_map(out, &self.attributes)?;
        }
        if version >= VERSION_WITH_ITEM_IDS {
            stream::write_string(out, &self.id)?;
        }
        Ok(())
    }

    /// Mirror of [`ItemCore::store`]. Fails with [`Error::StreamExhausted`]
    /// if the stream ends before the item's record begins.
    pub(crate) fn restore(&mut self, input: &mut Cursor<&[u8]>, version: u64) -> Result<(), Error> {
        if stream::at_end(input) {
            return Err(Error::StreamExhausted);
        }
        if version >= VERSION_WITH_ATTRIBUTES {
            self.attributes = stream::read_attr_map(input)?;
        } else {
            self.attributes.clear();
        }
        if version >= VERSION_WITH_ITEM_IDS {
            self.id = stream::read_string(input)?;
        }
        Ok(())
    }
}

/// Kind-specific payload of an item.
#[derive(Debug, Clone)]
pub enum ItemKind {
    Node(NodeData),
    Connection(ConnectionData),
}

/// A graph item: shared core plus kind payload.
///
/// The original editor modelled this as a class hierarchy with virtual
/// store/restore; here the hierarchy is flattened into a closed variant
/// dispatched by pattern matching.
#[derive(Debug, Clone)]
pub struct Item {
    pub core: ItemCore,
    pub kind: ItemKind,
}

impl Item {
    pub fn node(data: NodeData) -> Self {
        Self {
            core: ItemCore::default(),
            kind: ItemKind::Node(data),
        }
    }

    pub fn connection(data: ConnectionData) -> Self {
        Self {
            core: ItemCore::default(),
            kind: ItemKind::Connection(data),
        }
    }

    pub fn class(&self) -> ItemClass {
        match self.kind {
            ItemKind::Node(_) => ItemClass::Node,
            ItemKind::Connection(_) => ItemClass::Connection,
        }
    }

    pub fn as_node(&self) -> Option<&NodeData> {
        match &self.kind {
            ItemKind::Node(node) => Some(node),
            ItemKind::Connection(_) => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut NodeData> {
        match &mut self.kind {
            ItemKind::Node(node) => Some(node),
            ItemKind::Connection(_) => None,
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionData> {
        match &self.kind {
            ItemKind::Connection(conn) => Some(conn),
            ItemKind::Node(_) => None,
        }
    }

    pub fn as_connection_mut(&mut self) -> Option<&mut ConnectionData> {
        match &mut self.kind {
            ItemKind::Connection(conn) => Some(conn),
            ItemKind::Node(_) => None,
        }
    }

    // attributes

    /// True iff the item answers for `attr_id` without consulting class
    /// defaults. `"id"` is always present; connections additionally
    /// recognize the `"direction"` marker.
    pub fn has_local_attribute(&self, attr_id: &str) -> bool {
        if attr_id == "id" {
            return true;
        }
        if attr_id == "direction" && self.class() == ItemClass::Connection {
            return true;
        }
        self.core.attributes.contains_key(attr_id)
    }

    /// Sets a local attribute. `"id"` renames the item instead of touching
    /// the map. Returns false for ids the item kind recognizes but refuses
    /// to store (`"direction"` on connections); every successful mutation
    /// raises the attrs-changed flag.
    pub fn set_attribute(&mut self, attr_id: &str, value: AttrValue) -> bool {
        if attr_id == "id" {
            if let AttrValue::Str(new_id) | AttrValue::Enum(new_id) = value {
                self.core.id = new_id;
                self.core.attrs_changed = true;
                return true;
            }
            return false;
        }
        if attr_id == "direction" && self.class() == ItemClass::Connection {
            return false;
        }
        self.core.attributes.insert(attr_id.to_string(), value);
        self.core.attrs_changed = true;
        true
    }

    /// Removes a local attribute; true iff a value existed.
    pub fn remove_attribute(&mut self, attr_id: &str) -> bool {
        if self.core.attributes.remove(attr_id).is_some() {
            self.core.attrs_changed = true;
            true
        } else {
            false
        }
    }

    /// Resolved attribute lookup: local value first, then the class default
    /// registry, then `None`. Absence is a valid outcome, not an error.
    pub fn attribute(&self, attr_id: &str, defaults: &ClassDefaults) -> Option<AttrValue> {
        if attr_id == "id" {
            return Some(AttrValue::Str(self.core.id.clone()));
        }
        if let Some(value) = self.core.attributes.get(attr_id) {
            return Some(value.clone());
        }
        defaults.get(self.class(), attr_id).cloned()
    }

    /// Merged set of attribute ids visible on this item: local ids plus
    /// class defaults, deduplicated.
    pub fn attribute_ids(&self, defaults: &ClassDefaults) -> Vec<String> {
        std::iter::once("id")
            .chain(self.core.local_attribute_ids())
            .chain(defaults.ids_for_class(self.class()))
            .unique()
            .map(str::to_string)
            .collect()
    }

    pub fn attrs_changed(&self) -> bool {
        self.core.attrs_changed
    }

    /// The core only raises the flag; consuming layers clear it here after
    /// reacting to the change.
    pub fn clear_attrs_changed(&mut self) {
        self.core.attrs_changed = false;
    }

    // IO

    pub(crate) fn store(&self, out: &mut Vec<u8>, version: u64) -> Result<(), Error> {
        self.core.store(out, version)?;
        match &self.kind {
            ItemKind::Node(node) => node.store(out),
            ItemKind::Connection(conn) => conn.store(out),
        }
    }

    pub(crate) fn restore(&mut self, input: &mut Cursor<&[u8]>, version: u64) -> Result<(), Error> {
        self.core.restore(input, version)?;
        match &mut self.kind {
            ItemKind::Node(node) => node.restore(input),
            ItemKind::Connection(conn) => conn.restore(input),
        }
    }
}
