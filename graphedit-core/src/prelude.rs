// Re-export of key components
pub use crate::algo::{PointRecord, reconstruct_chain};
pub use crate::document::{load_document, paste_document, save_document, save_items};
pub use crate::loading::{
    NodeLabel, RoadNetwork, SitePlan, linked_points_polygon, load_site_plan, parse_site_plan,
    populate_model,
};
pub use crate::model::{
    AttrValue, ClassDefaults, Color, ConnectionData, GraphModel, Item, ItemClass, ItemKind,
    NodeData,
};

// Core types and format constants
pub use crate::ItemId;
pub use crate::{Error, FORMAT_VERSION, VERSION_WITH_ATTRIBUTES, VERSION_WITH_ITEM_IDS};
