//! Whole-document save/load/paste over the binary item stream
//!
//! A document is a magic header, a format version, and a flat list of item
//! records. Connections reference their endpoint nodes through opaque
//! tokens, so items can appear in any order; loading streams every item in
//! first, then runs the link-resolution pass over the completed token map.

pub(crate) mod stream;

use std::io::Cursor;

use hashbrown::HashMap;
use log::{debug, info, warn};

use crate::model::{ConnectionData, GraphModel, Item, ItemClass, NodeData};
use crate::{Error, FORMAT_VERSION, ItemId};

/// Document magic, first four bytes of every saved stream.
pub const MAGIC: &[u8; 4] = b"GRED";

const CLASS_NODE: u8 = 0;
const CLASS_CONNECTION: u8 = 1;

fn class_tag(item: &Item) -> u8 {
    match item.class() {
        ItemClass::Node => CLASS_NODE,
        ItemClass::Connection => CLASS_CONNECTION,
    }
}

fn blank_item(tag: u8) -> Result<Item, Error> {
    match tag {
        CLASS_NODE => Ok(Item::node(NodeData::default())),
        CLASS_CONNECTION => Ok(Item::connection(ConnectionData::default())),
        other => Err(Error::UnknownClassTag(other)),
    }
}

fn write_header(out: &mut Vec<u8>, version: u64, count: u32) -> Result<(), Error> {
    out.extend_from_slice(MAGIC);
    stream::write_u64(out, version)?;
    stream::write_u32(out, count)?;
    Ok(())
}

fn read_header(input: &mut Cursor<&[u8]>) -> Result<(u64, u32), Error> {
    let mut magic = [0_u8; 4];
    for byte in &mut magic {
        *byte = stream::read_u8(input)?;
    }
    if &magic != MAGIC {
        return Err(Error::BadMagic);
    }
    let version = stream::read_u64(input)?;
    if version > FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let count = stream::read_u32(input)?;
    Ok((version, count))
}

/// Serializes the whole model at the given format version.
///
/// Versions below [`FORMAT_VERSION`] write the reduced field set of that
/// version, which older readers consume unchanged.
///
/// # Errors
///
/// Fails on a version newer than [`FORMAT_VERSION`].
pub fn save_document(model: &GraphModel, version: u64) -> Result<Vec<u8>, Error> {
    let ids: Vec<ItemId> = model.iter().map(|(id, _)| id).collect();
    save_items(model, &ids, version)
}

/// Serializes a selection of items, the copy half of the copy/paste flow.
/// Endpoint tokens are the source model's item ids; whether they resolve is
/// decided at paste time.
///
/// # Errors
///
/// Fails on a version newer than [`FORMAT_VERSION`].
pub fn save_items(model: &GraphModel, ids: &[ItemId], version: u64) -> Result<Vec<u8>, Error> {
    if version > FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let items: Vec<(ItemId, &Item)> = ids
        .iter()
        .filter_map(|&id| match model.item(id) {
            Some(item) => Some((id, item)),
            None => {
                warn!("Skipping unknown item {id} in selection save");
                None
            }
        })
        .collect();

    let mut out = Vec::new();
    write_header(&mut out, version, items.len() as u32)?;
    let count = items.len();
    for (id, item) in items {
        stream::write_u64(&mut out, id)?;
        stream::write_u8(&mut out, class_tag(item))?;
        item.store(&mut out, version)?;
    }

    debug!("Saved {count} items at format version {version}");
    Ok(out)
}

/// Reads every item record into a fresh model, keyed by its stream token.
/// Shared first phase of load and paste.
fn restore_items(
    model: &mut GraphModel,
    input: &mut Cursor<&[u8]>,
    version: u64,
    count: u32,
) -> Result<(HashMap<u64, ItemId>, Vec<ItemId>), Error> {
    let mut token_map = HashMap::with_capacity(count as usize);
    let mut order = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let token = stream::read_u64(input)?;
        let tag = stream::read_u8(input)?;
        let mut item = blank_item(tag)?;
        item.restore(input, version)?;
        let id = model.add_item(item);
        token_map.insert(token, id);
        order.push(id);
    }

    Ok((token_map, order))
}

/// Loads a full document into a fresh model.
///
/// Two phases: stream all items in (connections keep raw endpoint tokens),
/// then resolve every connection against the completed token map. A failed
/// item restore aborts the whole load; the partially built model is dropped.
///
/// # Errors
///
/// Fails on bad magic, an unsupported version, an unknown class or value
/// tag, or a stream that ends mid-record.
pub fn load_document(bytes: &[u8]) -> Result<GraphModel, Error> {
    let mut input = Cursor::new(bytes);
    let (version, count) = read_header(&mut input)?;

    let mut model = GraphModel::new();
    let (token_map, order) = restore_items(&mut model, &mut input, version, count)?;

    let connections: Vec<ItemId> = order
        .into_iter()
        .filter(|&id| model.connection(id).is_some())
        .collect();
    for conn_id in &connections {
        model.link_after_restore(*conn_id, &token_map);
    }

    info!(
        "Loaded document: {} items ({} connections), format version {version}",
        model.len(),
        connections.len()
    );
    Ok(model)
}

/// Pastes a saved fragment into an existing model and returns the ids of
/// the items that survived. Connections whose endpoints do not both resolve
/// within the fragment are dropped.
///
/// # Errors
///
/// Same failure modes as [`load_document`].
pub fn paste_document(model: &mut GraphModel, bytes: &[u8]) -> Result<Vec<ItemId>, Error> {
    let mut input = Cursor::new(bytes);
    let (version, count) = read_header(&mut input)?;

    let (token_map, order) = restore_items(model, &mut input, version, count)?;

    let mut pasted = Vec::with_capacity(order.len());
    let mut dropped = 0_usize;
    for id in order {
        if model.connection(id).is_some() && !model.link_after_paste(id, &token_map) {
            model.remove_connection(id);
            dropped += 1;
            continue;
        }
        pasted.push(id);
    }

    if dropped > 0 {
        warn!("Dropped {dropped} dangling connections while pasting");
    }
    debug!("Pasted {} items at format version {version}", pasted.len());
    Ok(pasted)
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::model::AttrValue;
    use crate::VERSION_WITH_ATTRIBUTES;

    fn sample_model() -> GraphModel {
        let mut model = GraphModel::new();
        let a = model.add_node(NodeData::at(Point::new(0.0, 0.0)));
        let b = model.add_node(NodeData::at(Point::new(3.0, 4.0)));
        let conn = model.add_connection(ConnectionData::default());
        model.set_first(conn, Some(a));
        model.set_last(conn, Some(b));
        model.set_attribute(a, "color", AttrValue::from("blue"));
        model.set_attribute(conn, "weight", AttrValue::from(2.5));
        model.set_attribute(b, "id", AttrValue::from("exit"));
        model
    }

    fn single_valid_connection(model: &GraphModel) -> ItemId {
        let mut conns = model
            .iter()
            .filter(|(_, item)| item.as_connection().is_some_and(ConnectionData::is_valid));
        let (id, _) = conns.next().expect("a valid connection");
        assert!(conns.next().is_none());
        id
    }

    #[test]
    fn round_trip_preserves_attributes_and_ids() {
        let saved = save_document(&sample_model(), FORMAT_VERSION).unwrap();
        let loaded = load_document(&saved).unwrap();

        assert_eq!(loaded.len(), 3);
        let exit = loaded
            .iter()
            .find(|(_, item)| item.core.id == "exit")
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(
            loaded.node(exit).unwrap().position,
            Point::new(3.0, 4.0)
        );

        let conn_id = single_valid_connection(&loaded);
        assert_eq!(loaded.attribute(conn_id, "weight"), Some(AttrValue::from(2.5)));
        assert_eq!(loaded.item(conn_id).unwrap().core.id, "C1");
    }

    #[test]
    fn old_versions_omit_ids_but_keep_attributes() {
        let saved = save_document(&sample_model(), VERSION_WITH_ATTRIBUTES).unwrap();
        let loaded = load_document(&saved).unwrap();

        // string ids were not written, so fresh defaults are assigned
        assert!(loaded.iter().all(|(_, item)| item.core.id != "exit"));
        let recolored = loaded
            .iter()
            .find(|(id, _)| loaded.attribute(*id, "color").is_some())
            .unwrap()
            .0;
        assert_eq!(loaded.attribute(recolored, "color"), Some(AttrValue::from("blue")));
    }

    #[test]
    fn version_one_strips_attributes_too() {
        let saved = save_document(&sample_model(), 1).unwrap();
        let loaded = load_document(&saved).unwrap();

        assert_eq!(loaded.len(), 3);
        assert!(loaded.iter().all(|(id, _)| loaded.attribute(id, "color").is_none()));
        assert!(single_valid_connection(&loaded) > 0);
    }

    #[test]
    fn forward_references_link_after_the_full_pass() {
        // connection record precedes both node records in the stream
        let mut model = GraphModel::new();
        let conn = model.add_connection(ConnectionData::default());
        let a = model.add_node(NodeData::at(Point::new(0.0, 0.0)));
        let b = model.add_node(NodeData::at(Point::new(1.0, 1.0)));
        model.set_first(conn, Some(a));
        model.set_last(conn, Some(b));

        let loaded = load_document(&save_document(&model, FORMAT_VERSION).unwrap()).unwrap();
        let conn_id = single_valid_connection(&loaded);
        let linked = loaded.connection(conn_id).unwrap();
        let first = linked.first().unwrap();
        let last = linked.last().unwrap();
        assert_eq!(loaded.node(first).unwrap().position, Point::new(0.0, 0.0));
        assert_eq!(loaded.node(last).unwrap().position, Point::new(1.0, 1.0));
    }

    #[test]
    fn paste_drops_dangling_connections() {
        let model = sample_model();
        let node_a = model
            .iter()
            .find(|(_, item)| item.as_node().is_some())
            .unwrap()
            .0;
        let conn = single_valid_connection(&model);

        // fragment holds the connection and only one of its endpoints
        let fragment = save_items(&model, &[node_a, conn], FORMAT_VERSION).unwrap();

        let mut target = GraphModel::new();
        let pasted = paste_document(&mut target, &fragment).unwrap();

        assert_eq!(pasted.len(), 1);
        assert!(target.node(pasted[0]).is_some());
        assert!(target.iter().all(|(_, item)| item.as_connection().is_none()));
    }

    #[test]
    fn paste_keeps_connections_that_resolve() {
        let model = sample_model();
        let ids: Vec<ItemId> = model.iter().map(|(id, _)| id).collect();
        let fragment = save_items(&model, &ids, FORMAT_VERSION).unwrap();

        let mut target = sample_model();
        let before = target.len();
        let pasted = paste_document(&mut target, &fragment).unwrap();

        assert_eq!(pasted.len(), 3);
        assert_eq!(target.len(), before + 3);
        let pasted_conn = pasted
            .iter()
            .find(|&&id| target.connection(id).is_some())
            .unwrap();
        assert!(target.connection(*pasted_conn).unwrap().is_valid());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut saved = save_document(&sample_model(), FORMAT_VERSION).unwrap();
        saved[0] = b'X';
        assert!(matches!(load_document(&saved), Err(Error::BadMagic)));
    }

    #[test]
    fn newer_versions_are_rejected() {
        assert!(matches!(
            save_document(&sample_model(), FORMAT_VERSION + 1),
            Err(Error::UnsupportedVersion(_))
        ));

        let mut saved = save_document(&sample_model(), FORMAT_VERSION).unwrap();
        saved[11] = 99; // low byte of the big-endian version field
        assert!(matches!(
            load_document(&saved),
            Err(Error::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn truncated_stream_aborts_the_load() {
        let saved = save_document(&sample_model(), FORMAT_VERSION).unwrap();
        let truncated = &saved[..saved.len() - 5];
        assert!(matches!(
            load_document(truncated),
            Err(Error::StreamExhausted)
        ));
    }
}
