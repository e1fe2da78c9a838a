//! Dynamic attribute values and the class-level default registry

use hashbrown::HashMap;

use super::item::ItemClass;

/// RGBA color attribute payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Tagged union over the attribute types an item can carry.
///
/// Absence of an attribute is expressed as `Option::None` at the lookup
/// sites, never as a dedicated variant.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Number(f64),
    Bool(bool),
    Color(Color),
    Enum(String),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Class-level attribute defaults, the fallback behind every item's local
/// attribute map.
///
/// Owned by the model; items themselves never see this registry directly,
/// resolved lookups go through [`crate::model::GraphModel::attribute`].
#[derive(Debug, Clone, Default)]
pub struct ClassDefaults {
    values: HashMap<(ItemClass, String), AttrValue>,
}

impl ClassDefaults {
    pub fn get(&self, class: ItemClass, attr_id: &str) -> Option<&AttrValue> {
        self.values.get(&(class, attr_id.to_string()))
    }

    pub fn set(&mut self, class: ItemClass, attr_id: &str, value: AttrValue) {
        self.values.insert((class, attr_id.to_string()), value);
    }

    pub fn remove(&mut self, class: ItemClass, attr_id: &str) -> bool {
        self.values.remove(&(class, attr_id.to_string())).is_some()
    }

    /// Ids of all defaults registered for `class`.
    pub fn ids_for_class(&self, class: ItemClass) -> impl Iterator<Item = &str> {
        self.values
            .keys()
            .filter(move |(c, _)| *c == class)
            .map(|(_, id)| id.as_str())
    }
}
