//! Loading of site-plan configuration documents and the road graphs they
//! describe.

pub mod config;
pub mod road;

pub use config::{NodeLabel, SitePlan, linked_points_polygon, load_site_plan, parse_site_plan};
pub use road::{RoadNetwork, RoadNode, RoadSegment, populate_model};
