//! Site-plan configuration parsing
//!
//! The configuration document is JSON produced by an external geometry
//! pipeline. Raw structs mirror the document shape with every field
//! defaulting to empty; conversion into [`SitePlan`] validates the parts
//! that have closed value ranges. Config files are build-time artifacts,
//! not untrusted input, so violations abort instead of bubbling up.

use std::path::Path;

use geo::{Coord, LineString, Point, Polygon};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::algo::{PointRecord, reconstruct_chain};

/// Raw document shape. Any missing field is an empty collection.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawSitePlan {
    pub shell: Vec<[f64; 2]>,
    pub buildings: Vec<Vec<[f64; 2]>>,
    pub climbing_space: Vec<Vec<[f64; 2]>>,
    pub entries: Vec<Vec<[f64; 2]>>,
    pub turning_space: Vec<Vec<[f64; 2]>>,
    pub obstacles: Vec<Vec<[f64; 2]>>,
    pub edges: Vec<[usize; 2]>,
    pub nodes: Vec<[f64; 2]>,
    pub node_labels: Vec<i64>,
}

/// Role of a road-graph node within the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel {
    Entrance = 0,
    FreePoint = 1,
    TouchShellPoint = 2,
    TouchObstaclePoint = 3,
    Intersection = 4,
    Inflection = 5,
}

impl NodeLabel {
    /// Decodes a raw config integer.
    ///
    /// # Panics
    ///
    /// On any value outside `0..=5`. The label set is closed; an unknown
    /// value means the producing pipeline is broken.
    #[must_use]
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => Self::Entrance,
            1 => Self::FreePoint,
            2 => Self::TouchShellPoint,
            3 => Self::TouchObstaclePoint,
            4 => Self::Intersection,
            5 => Self::Inflection,
            other => panic!("node label {other} outside the supported range 0..=5"),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entrance => "Entrance",
            Self::FreePoint => "FreePoint",
            Self::TouchShellPoint => "TouchShellPoint",
            Self::TouchObstaclePoint => "TouchObstaclePoint",
            Self::Intersection => "Intersection",
            Self::Inflection => "Inflection",
        }
    }
}

/// Validated form of the configuration document. Built once at load time,
/// immutable afterward.
#[derive(Debug, Clone)]
pub struct SitePlan {
    pub shell: Polygon<f64>,
    pub buildings: Vec<Polygon<f64>>,
    pub climbing_space: Vec<Polygon<f64>>,
    pub entries: Vec<Polygon<f64>>,
    pub turning_space: Vec<Polygon<f64>>,
    pub obstacles: Vec<Polygon<f64>>,
    pub road_edges: Vec<(usize, usize)>,
    pub road_nodes: Vec<Point<f64>>,
    pub node_labels: Vec<NodeLabel>,
}

fn to_polygon(points: &[[f64; 2]]) -> Polygon<f64> {
    let ring: LineString<f64> = points
        .iter()
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect();
    Polygon::new(ring, vec![])
}

fn to_polygons(polygons: &[Vec<[f64; 2]>]) -> Vec<Polygon<f64>> {
    polygons.iter().map(|p| to_polygon(p)).collect()
}

impl From<RawSitePlan> for SitePlan {
    fn from(raw: RawSitePlan) -> Self {
        let node_labels = raw.node_labels.iter().copied().map(NodeLabel::from_raw).collect();
        Self {
            shell: to_polygon(&raw.shell),
            buildings: to_polygons(&raw.buildings),
            climbing_space: to_polygons(&raw.climbing_space),
            entries: to_polygons(&raw.entries),
            turning_space: to_polygons(&raw.turning_space),
            obstacles: to_polygons(&raw.obstacles),
            road_edges: raw.edges.iter().map(|e| (e[0], e[1])).collect(),
            road_nodes: raw.nodes.iter().map(|n| Point::new(n[0], n[1])).collect(),
            node_labels,
        }
    }
}

/// Parses a configuration document from its JSON text.
///
/// # Panics
///
/// On malformed JSON or an out-of-range `node_labels` entry.
#[must_use]
pub fn parse_site_plan(text: &str) -> SitePlan {
    let raw: RawSitePlan = serde_json::from_str(text)
        .unwrap_or_else(|e| panic!("malformed site plan document: {e}"));
    raw.into()
}

/// Reads and parses a configuration document from disk.
///
/// # Panics
///
/// On an unreadable file, malformed JSON, or an out-of-range `node_labels`
/// entry.
#[must_use]
pub fn load_site_plan(path: &Path) -> SitePlan {
    info!("Loading site plan: {}", path.display());
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("can't open site plan {}: {e}", path.display()));
    parse_site_plan(&text)
}

fn parse_coord(text: &str) -> Option<Coord<f64>> {
    let (x, y) = text.split_once(',')?;
    Some(Coord {
        x: x.trim().parse().ok()?,
        y: y.trim().parse().ok()?,
    })
}

/// Parses the linked-points object form of a boundary polygon: `"x,y"`
/// keys mapping to `{ "prev": "x,y", "next": "x,y" }`, connected only by
/// those coordinate references. The chain is seeded with the first key in
/// the map's iteration order (sorted by key); entries that fail to parse
/// are skipped.
#[must_use]
pub fn linked_points_polygon(object: &serde_json::Map<String, Value>) -> LineString<f64> {
    let mut seed = None;
    let mut records = Vec::with_capacity(object.len());

    for (key, value) in object {
        let Some(point) = parse_coord(key) else {
            warn!("Skipping linked point with unparseable key {key:?}");
            continue;
        };
        let neighbour = |field: &str| {
            value.get(field).and_then(Value::as_str).and_then(parse_coord)
        };
        let (Some(prev), Some(next)) = (neighbour("prev"), neighbour("next")) else {
            warn!("Skipping linked point {key:?} with unparseable neighbours");
            continue;
        };
        seed.get_or_insert(point);
        records.push(PointRecord { point, prev, next });
    }

    match seed {
        Some(seed) => reconstruct_chain(records, seed),
        None => LineString::new(Vec::new()),
    }
}
