//! Polygon-chain reconstruction
//!
//! Rebuilds an ordered open-or-closed point sequence from an unordered set
//! of point records connected only by prev/next coordinate references, as
//! produced by boundary-geometry exports.

use geo::{Coord, LineString};
use log::warn;

/// One unordered input point with the coordinates of its neighbours along
/// the boundary. Keyed by its own coordinate; not persisted anywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    pub point: Coord<f64>,
    pub prev: Coord<f64>,
    pub next: Coord<f64>,
}

/// Reconstructs the ordered chain seeded at `seed`.
///
/// Repeatedly scans the unconsumed records: a record whose `prev` equals the
/// chain's current tail is appended, one whose `next` equals the current
/// head is prepended (the tail match wins when both apply). The scan
/// restarts until a full pass matches nothing; records still unconsumed then
/// do not connect to the seed and are dropped.
///
/// Coordinate comparison is exact. Records produced by lossy geometry
/// operations must be quantized by the caller before this step, or they will
/// fail to match and fall off the chain.
pub fn reconstruct_chain(records: Vec<PointRecord>, seed: Coord<f64>) -> LineString<f64> {
    let mut chain = vec![seed];
    let mut remaining: Vec<PointRecord> =
        records.into_iter().filter(|r| r.point != seed).collect();

    loop {
        let mut matched = false;
        let mut i = 0;
        while i < remaining.len() {
            let head = chain[0];
            let tail = chain[chain.len() - 1];
            let record = remaining[i];
            if record.prev == tail {
                chain.push(record.point);
                remaining.remove(i);
                matched = true;
            } else if record.next == head {
                chain.insert(0, record.point);
                remaining.remove(i);
                matched = true;
            } else {
                i += 1;
            }
        }
        if !matched {
            break;
        }
    }

    if !remaining.is_empty() {
        warn!(
            "{} point records did not connect to the chain and were dropped",
            remaining.len()
        );
    }

    LineString::from(chain)
}
