//! Connection payload: two optional node endpoints with deferred linking

use std::io::Cursor;

use hashbrown::HashMap;

use crate::document::stream;
use crate::{Error, ItemId};

/// Endpoint token written to the stream when a connection end is unset.
pub(crate) const NO_ENDPOINT: u64 = 0;

/// Kind payload of a connection item.
///
/// During deserialization the endpoints stay `None` while the raw reference
/// tokens read from the stream sit in `temp_first`/`temp_last`; a second
/// pass over the completed token map resolves them (see
/// [`crate::model::GraphModel::link_after_restore`]).
#[derive(Debug, Clone, Default)]
pub struct ConnectionData {
    pub(crate) first: Option<ItemId>,
    pub(crate) last: Option<ItemId>,
    pub(crate) temp_first: Option<u64>,
    pub(crate) temp_last: Option<u64>,
}

impl ConnectionData {
    pub fn first(&self) -> Option<ItemId> {
        self.first
    }

    pub fn last(&self) -> Option<ItemId> {
        self.last
    }

    /// True iff both endpoints are resolved and present.
    pub fn is_valid(&self) -> bool {
        self.first.is_some() && self.last.is_some()
    }

    pub(crate) fn store(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        stream::write_u64(out, self.first.unwrap_or(NO_ENDPOINT))?;
        stream::write_u64(out, self.last.unwrap_or(NO_ENDPOINT))?;
        Ok(())
    }

    /// Reads the two endpoint reference tokens without resolving them; the
    /// referenced nodes may not have been read yet.
    pub(crate) fn restore(&mut self, input: &mut Cursor<&[u8]>) -> Result<(), Error> {
        self.first = None;
        self.last = None;
        self.temp_first = Some(stream::read_u64(input)?);
        self.temp_last = Some(stream::read_u64(input)?);
        Ok(())
    }
}

/// Maps one recorded reference token back to a live arena id.
///
/// Pure: a missing or unset token yields `None`, never an error. Whether the
/// target is actually a node is checked by the model during linking.
pub(crate) fn resolve_token(token_map: &HashMap<u64, ItemId>, token: Option<u64>) -> Option<ItemId> {
    token_map.get(&token?).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_requires_both_endpoints() {
        let mut conn = ConnectionData::default();
        assert!(!conn.is_valid());

        conn.first = Some(1);
        assert!(!conn.is_valid());

        conn.last = Some(2);
        assert!(conn.is_valid());
    }

    #[test]
    fn resolve_token_handles_missing_entries() {
        let mut map = HashMap::new();
        map.insert(7_u64, 3 as ItemId);

        assert_eq!(resolve_token(&map, Some(7)), Some(3));
        assert_eq!(resolve_token(&map, Some(8)), None);
        assert_eq!(resolve_token(&map, None), None);
    }
}
