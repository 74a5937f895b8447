use foundation::math::Vec2;
use scene::entity::{Entity, EntityId};

/// Screen offset from the pointer to the tooltip's top-left corner.
pub const TOOLTIP_OFFSET_PX: Vec2 = Vec2 { x: 10.0, y: 10.0 };

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipLine {
    pub key: String,
    pub text: String,
}

/// Hover tooltip content for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub entity: EntityId,
    /// One line per property, in property order.
    pub lines: Vec<TooltipLine>,
    pub anchor: Vec2,
}

impl Tooltip {
    pub fn for_entity(id: EntityId, entity: &Entity, pointer: Vec2) -> Self {
        let lines = entity
            .props
            .iter()
            .map(|(key, value)| TooltipLine {
                key: key.to_string(),
                text: value.to_string(),
            })
            .collect();
        Self {
            entity: id,
            lines,
            anchor: pointer + TOOLTIP_OFFSET_PX,
        }
    }

    pub fn line(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Tooltip;
    use foundation::math::Vec2;
    use scene::components::Properties;
    use scene::entity::{Entity, EntityId};

    #[test]
    fn lines_follow_property_order() {
        let mut props = Properties::new();
        props.insert("classname", "zipline");
        props.insert("model", "");
        props.insert("x", 12.0);
        let e = Entity::new(12.0, 0.0, 0.0, props);

        let tip = Tooltip::for_entity(EntityId::new(0, 3), &e, Vec2::new(100.0, 40.0));
        let keys: Vec<&str> = tip.lines.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["classname", "model", "x"]);
        assert_eq!(tip.line("x"), Some("12"));
        assert_eq!(tip.line("model"), Some(""));
        assert_eq!(tip.anchor, Vec2::new(110.0, 50.0));
    }
}
