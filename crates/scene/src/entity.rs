use std::borrow::Cow;

use foundation::math::Vec2;

use crate::components::Properties;

/// One placed game object. Immutable once created; loads replace whole datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub x: f64,
    pub y: f64,
    /// Height (world z).
    pub h: f64,
    pub props: Properties,
}

impl Entity {
    pub fn new(x: f64, y: f64, h: f64, props: Properties) -> Self {
        Self { x, y, h, props }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Text of `key`, with a missing key reading as the empty string.
    pub fn field_text(&self, key: &str) -> Cow<'_, str> {
        self.props.text(key).unwrap_or(Cow::Borrowed(""))
    }
}

/// Position of an entity inside a `World`: dataset slot, then collection index.
///
/// The derived ordering is the iteration order used by painting and picking.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    pub dataset: u32,
    pub index: u32,
}

impl EntityId {
    pub fn new(dataset: u32, index: u32) -> Self {
        Self { dataset, index }
    }
}

#[cfg(test)]
mod tests {
    use super::{Entity, EntityId};
    use crate::components::Properties;

    #[test]
    fn ids_order_by_dataset_then_index() {
        let mut ids = vec![EntityId::new(1, 0), EntityId::new(0, 5), EntityId::new(0, 2)];
        ids.sort();
        assert_eq!(
            ids,
            vec![EntityId::new(0, 2), EntityId::new(0, 5), EntityId::new(1, 0)]
        );
    }

    #[test]
    fn missing_field_reads_empty() {
        let props: Properties = [("classname", "zipline")].into_iter().collect();
        let e = Entity::new(1.0, 2.0, 3.0, props);
        assert_eq!(e.field_text("classname"), "zipline");
        assert_eq!(e.field_text("model"), "");
    }
}
