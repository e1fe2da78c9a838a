//! Owning container for graph items
//!
//! All items live in one indexed arena; connections hold [`ItemId`]s into
//! it rather than references. The model performs every endpoint mutation
//! itself so the per-node incident sets never diverge from the endpoints
//! the connections actually reference.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use super::attribute::{AttrValue, ClassDefaults};
use super::connection::{ConnectionData, resolve_token};
use super::item::{Item, ItemClass};
use super::node::NodeData;
use crate::ItemId;

/// The graph model: item arena, class-default registry and per-class id
/// counters. This is the original editor scene with everything visual
/// stripped away.
///
/// Single-threaded by design; all mutation happens synchronously on the
/// caller's thread.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    /// BTreeMap so iteration (and thus document output) is deterministic.
    items: BTreeMap<ItemId, Item>,
    defaults: ClassDefaults,
    next_id: ItemId,
    node_seq: u64,
    conn_seq: u64,
}

impl GraphModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // item access

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn node(&self, id: ItemId) -> Option<&NodeData> {
        self.items.get(&id).and_then(Item::as_node)
    }

    pub fn node_mut(&mut self, id: ItemId) -> Option<&mut NodeData> {
        self.items.get_mut(&id).and_then(Item::as_node_mut)
    }

    pub fn connection(&self, id: ItemId) -> Option<&ConnectionData> {
        self.items.get(&id).and_then(Item::as_connection)
    }

    pub fn connection_mut(&mut self, id: ItemId) -> Option<&mut ConnectionData> {
        self.items.get_mut(&id).and_then(Item::as_connection_mut)
    }

    /// Iterate over all items in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    // insertion

    pub fn add_node(&mut self, data: NodeData) -> ItemId {
        self.add_item(Item::node(data))
    }

    pub fn add_connection(&mut self, data: ConnectionData) -> ItemId {
        self.add_item(Item::connection(data))
    }

    /// Inserts an item into the arena, assigning a fresh [`ItemId`] and a
    /// default string id (`N1`, `C1`, ...) when the item arrives without one.
    pub fn add_item(&mut self, mut item: Item) -> ItemId {
        if item.core.id.is_empty() {
            item.core.id = match item.class() {
                ItemClass::Node => {
                    self.node_seq += 1;
                    format!("N{}", self.node_seq)
                }
                ItemClass::Connection => {
                    self.conn_seq += 1;
                    format!("C{}", self.conn_seq)
                }
            };
        }
        // id 0 stays reserved as the "no endpoint" stream token
        self.next_id += 1;
        let id = self.next_id;
        self.items.insert(id, item);
        id
    }

    // endpoints

    /// Sets the first endpoint of `conn_id`, detaching the previous node and
    /// attaching the new one. Targets that are not nodes are treated as no
    /// endpoint.
    pub fn set_first(&mut self, conn_id: ItemId, node_id: Option<ItemId>) {
        let node_id = node_id.filter(|id| self.node(*id).is_some());
        let Some(conn) = self.items.get_mut(&conn_id).and_then(Item::as_connection_mut) else {
            return;
        };
        let old = conn.first;
        conn.first = node_id;
        self.sync_incident(old, conn_id);
        self.sync_incident(node_id, conn_id);
    }

    /// Sets the last endpoint of `conn_id`; see [`GraphModel::set_first`].
    pub fn set_last(&mut self, conn_id: ItemId, node_id: Option<ItemId>) {
        let node_id = node_id.filter(|id| self.node(*id).is_some());
        let Some(conn) = self.items.get_mut(&conn_id).and_then(Item::as_connection_mut) else {
            return;
        };
        let old = conn.last;
        conn.last = node_id;
        self.sync_incident(old, conn_id);
        self.sync_incident(node_id, conn_id);
    }

    /// Swaps the endpoints of `conn_id`. Incident sets are unaffected;
    /// validity is unchanged by reversal alone.
    pub fn reverse(&mut self, conn_id: ItemId) {
        if let Some(conn) = self.items.get_mut(&conn_id).and_then(Item::as_connection_mut) {
            std::mem::swap(&mut conn.first, &mut conn.last);
        }
    }

    /// Moves every endpoint of `conn_id` that references `old` over to
    /// `new`. No-op when old and new are the same node and its policy
    /// disallows self-loops.
    pub fn reattach(&mut self, conn_id: ItemId, old: ItemId, new: ItemId) {
        if old == new && !self.node(new).is_some_and(|n| n.allow_loops) {
            return;
        }
        let Some(conn) = self.connection(conn_id) else {
            return;
        };
        let (first, last) = (conn.first, conn.last);
        if first == Some(old) {
            self.set_first(conn_id, Some(new));
        }
        if last == Some(old) {
            self.set_last(conn_id, Some(new));
        }
    }

    /// Re-establishes the incident-set invariant for one (node, connection)
    /// pair after an endpoint changed.
    fn sync_incident(&mut self, node_id: Option<ItemId>, conn_id: ItemId) {
        let Some(node_id) = node_id else { return };
        let references = self
            .connection(conn_id)
            .is_some_and(|c| c.first == Some(node_id) || c.last == Some(node_id));
        let Some(node) = self.node_mut(node_id) else {
            return;
        };
        let present = node.incident.contains(&conn_id);
        if references && !present {
            node.incident.push(conn_id);
        } else if !references && present {
            node.incident.retain(|&c| c != conn_id);
        }
    }

    // removal

    /// Removes a connection, detaching both endpoints first.
    pub fn remove_connection(&mut self, conn_id: ItemId) {
        if self.connection(conn_id).is_none() {
            return;
        }
        self.set_first(conn_id, None);
        self.set_last(conn_id, None);
        self.items.remove(&conn_id);
    }

    /// Removes a node and every connection incident to it.
    ///
    /// Explicit two-step removal by the container: collect the incident
    /// connections, remove them, then remove the node. No item destroys
    /// another.
    pub fn remove_node(&mut self, node_id: ItemId) {
        let Some(node) = self.node(node_id) else {
            return;
        };
        let incident = node.incident.clone();
        for conn_id in incident {
            self.remove_connection(conn_id);
        }
        self.items.remove(&node_id);
    }

    // deferred linking

    /// Second-phase resolution after a bulk restore: converts the reference
    /// tokens recorded during deserialization into live endpoints via the
    /// caller-supplied token map. Tokens that resolve to a missing item or
    /// to a non-node yield an empty endpoint, not an error. Idempotent: a
    /// repeated call with the tokens already consumed keeps the current
    /// endpoints.
    pub fn link_after_restore(&mut self, conn_id: ItemId, token_map: &HashMap<u64, ItemId>) {
        let Some(conn) = self.items.get_mut(&conn_id).and_then(Item::as_connection_mut) else {
            return;
        };
        let first = match conn.temp_first.take() {
            Some(token) => resolve_token(token_map, Some(token)),
            None => conn.first,
        };
        let last = match conn.temp_last.take() {
            Some(token) => resolve_token(token_map, Some(token)),
            None => conn.last,
        };
        self.set_first(conn_id, first);
        self.set_last(conn_id, last);
    }

    /// Paste-flavoured linking: same resolution, but the connection must end
    /// up valid. Callers reject dangling pasted connections on `false`.
    pub fn link_after_paste(&mut self, conn_id: ItemId, token_map: &HashMap<u64, ItemId>) -> bool {
        self.link_after_restore(conn_id, token_map);
        self.connection(conn_id).is_some_and(ConnectionData::is_valid)
    }

    // attributes

    pub fn class_defaults(&self) -> &ClassDefaults {
        &self.defaults
    }

    pub fn class_defaults_mut(&mut self) -> &mut ClassDefaults {
        &mut self.defaults
    }

    /// Resolved attribute lookup: item-local value, then class default,
    /// then `None`.
    pub fn attribute(&self, item_id: ItemId, attr_id: &str) -> Option<AttrValue> {
        self.items
            .get(&item_id)
            .and_then(|item| item.attribute(attr_id, &self.defaults))
    }

    pub fn set_attribute(&mut self, item_id: ItemId, attr_id: &str, value: AttrValue) -> bool {
        self.items
            .get_mut(&item_id)
            .is_some_and(|item| item.set_attribute(attr_id, value))
    }

    pub fn remove_attribute(&mut self, item_id: ItemId, attr_id: &str) -> bool {
        self.items
            .get_mut(&item_id)
            .is_some_and(|item| item.remove_attribute(attr_id))
    }

    pub fn has_local_attribute(&self, item_id: ItemId, attr_id: &str) -> bool {
        self.items
            .get(&item_id)
            .is_some_and(|item| item.has_local_attribute(attr_id))
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;

    fn model_with_edge() -> (GraphModel, ItemId, ItemId, ItemId) {
        let mut model = GraphModel::new();
        let a = model.add_node(NodeData::at(Point::new(0.0, 0.0)));
        let b = model.add_node(NodeData::at(Point::new(1.0, 0.0)));
        let conn = model.add_connection(ConnectionData::default());
        model.set_first(conn, Some(a));
        model.set_last(conn, Some(b));
        (model, a, b, conn)
    }

    fn incident(model: &GraphModel, node: ItemId) -> Vec<ItemId> {
        model.node(node).map(|n| n.incident.clone()).unwrap_or_default()
    }

    #[test]
    fn default_string_ids_count_per_class() {
        let mut model = GraphModel::new();
        let n1 = model.add_node(NodeData::default());
        let n2 = model.add_node(NodeData::default());
        let c1 = model.add_connection(ConnectionData::default());

        assert_eq!(model.item(n1).unwrap().core.id, "N1");
        assert_eq!(model.item(n2).unwrap().core.id, "N2");
        assert_eq!(model.item(c1).unwrap().core.id, "C1");
    }

    #[test]
    fn endpoint_setters_maintain_incident_sets() {
        let (mut model, a, b, conn) = model_with_edge();
        assert_eq!(incident(&model, a), vec![conn]);
        assert_eq!(incident(&model, b), vec![conn]);

        let c = model.add_node(NodeData::at(Point::new(2.0, 0.0)));
        model.set_last(conn, Some(c));

        assert_eq!(incident(&model, a), vec![conn]);
        assert!(incident(&model, b).is_empty());
        assert_eq!(incident(&model, c), vec![conn]);

        model.set_first(conn, None);
        assert!(incident(&model, a).is_empty());
    }

    #[test]
    fn non_node_endpoint_targets_are_rejected() {
        let (mut model, _, _, conn) = model_with_edge();
        let other_conn = model.add_connection(ConnectionData::default());

        model.set_first(conn, Some(other_conn));
        assert_eq!(model.connection(conn).unwrap().first(), None);
    }

    #[test]
    fn reverse_swaps_endpoints_and_preserves_validity() {
        let (mut model, a, b, conn) = model_with_edge();
        assert!(model.connection(conn).unwrap().is_valid());

        model.reverse(conn);
        let reversed = model.connection(conn).unwrap();
        assert_eq!(reversed.first(), Some(b));
        assert_eq!(reversed.last(), Some(a));
        assert!(reversed.is_valid());

        assert_eq!(incident(&model, a), vec![conn]);
        assert_eq!(incident(&model, b), vec![conn]);
    }

    #[test]
    fn reattach_to_same_node_requires_loop_policy() {
        let (mut model, a, b, conn) = model_with_edge();

        model.reattach(conn, b, b);
        assert_eq!(model.connection(conn).unwrap().last(), Some(b));

        model.node_mut(b).unwrap().allow_loops = true;
        model.reattach(conn, a, b);
        let looped = model.connection(conn).unwrap();
        assert_eq!(looped.first(), Some(b));
        assert_eq!(looped.last(), Some(b));
        assert_eq!(incident(&model, b), vec![conn]);
        assert!(incident(&model, a).is_empty());
    }

    #[test]
    fn removing_a_node_cascades_to_incident_connections() {
        let (mut model, a, b, conn) = model_with_edge();
        let c = model.add_node(NodeData::at(Point::new(0.0, 1.0)));
        let conn2 = model.add_connection(ConnectionData::default());
        model.set_first(conn2, Some(a));
        model.set_last(conn2, Some(c));
        let unrelated = model.add_connection(ConnectionData::default());
        model.set_first(unrelated, Some(b));
        model.set_last(unrelated, Some(c));

        model.remove_node(a);

        assert!(!model.contains(a));
        assert!(!model.contains(conn));
        assert!(!model.contains(conn2));
        assert!(model.contains(unrelated));
        assert_eq!(incident(&model, b), vec![unrelated]);
        assert_eq!(incident(&model, c), vec![unrelated]);
    }

    #[test]
    fn removing_a_connection_detaches_both_nodes() {
        let (mut model, a, b, conn) = model_with_edge();
        model.remove_connection(conn);

        assert!(!model.contains(conn));
        assert!(incident(&model, a).is_empty());
        assert!(incident(&model, b).is_empty());
    }

    #[test]
    fn linking_twice_is_idempotent() {
        let (mut model, a, b, _) = model_with_edge();
        let conn = model.add_connection(ConnectionData {
            temp_first: Some(100),
            temp_last: Some(200),
            ..Default::default()
        });

        let mut token_map = HashMap::new();
        token_map.insert(100_u64, a);
        token_map.insert(200_u64, b);

        model.link_after_restore(conn, &token_map);
        let linked = model.connection(conn).unwrap();
        assert_eq!((linked.first(), linked.last()), (Some(a), Some(b)));

        model.link_after_restore(conn, &token_map);
        let relinked = model.connection(conn).unwrap();
        assert_eq!((relinked.first(), relinked.last()), (Some(a), Some(b)));
        assert_eq!(incident(&model, a).iter().filter(|&&c| c == conn).count(), 1);
    }

    #[test]
    fn linking_with_missing_token_leaves_one_empty_endpoint() {
        let (mut model, a, _, _) = model_with_edge();
        let conn = model.add_connection(ConnectionData {
            temp_first: Some(100),
            temp_last: Some(999),
            ..Default::default()
        });

        let mut token_map = HashMap::new();
        token_map.insert(100_u64, a);

        assert!(!model.link_after_paste(conn, &token_map));
        let dangling = model.connection(conn).unwrap();
        assert_eq!(dangling.first(), Some(a));
        assert_eq!(dangling.last(), None);
        assert!(!dangling.is_valid());
    }

    #[test]
    fn model_attribute_falls_back_to_class_defaults() {
        let mut model = GraphModel::new();
        let node = model.add_node(NodeData::default());
        model
            .class_defaults_mut()
            .set(ItemClass::Node, "color", AttrValue::from("red"));

        assert_eq!(model.attribute(node, "color"), Some(AttrValue::from("red")));
        assert!(!model.has_local_attribute(node, "color"));

        assert!(model.set_attribute(node, "color", AttrValue::from("blue")));
        assert_eq!(model.attribute(node, "color"), Some(AttrValue::from("blue")));

        assert!(model.remove_attribute(node, "color"));
        assert_eq!(model.attribute(node, "color"), Some(AttrValue::from("red")));
    }
}
