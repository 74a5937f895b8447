use foundation::math::{CanvasProjection, Vec2, ViewTransform};

use crate::World;
use crate::entity::EntityId;
use crate::query::EntityPredicate;

/// Default hover radius in screen pixels.
pub const DEFAULT_HIT_RADIUS_PX: f64 = 5.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    /// Hit radius in screen pixels; divided by the zoom before testing in canvas space.
    pub radius_px: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            radius_px: DEFAULT_HIT_RADIUS_PX,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    /// Projected canvas position of the hit entity.
    pub canvas: Vec2,
}

/// Canvas-space hit test.
///
/// Ordering contract:
/// - Enabled datasets are scanned in order, entities in collection order.
/// - The first admitted entity with squared distance `< radius²` wins, even if a later
///   one is closer.
pub fn pick_canvas(
    world: &World,
    predicate: &EntityPredicate<'_>,
    projection: &CanvasProjection,
    point: Vec2,
    radius: f64,
) -> Option<PickHit> {
    let r2 = radius * radius;
    world
        .active_entities()
        .filter(|(_, e)| predicate.admits(e))
        .map(|(id, e)| (id, projection.world_to_canvas(e.position())))
        .find(|(_, c)| c.distance_squared(point) < r2)
        .map(|(entity, canvas)| PickHit { entity, canvas })
}

/// Screen-space hit test: inverts the view transform, then scales the radius by
/// `1 / zoom` so the hit region stays constant on screen.
pub fn pick_screen(
    world: &World,
    predicate: &EntityPredicate<'_>,
    projection: &CanvasProjection,
    view: &ViewTransform,
    screen: Vec2,
    opts: PickOptions,
) -> Option<PickHit> {
    let point = view.screen_to_canvas(screen)?;
    pick_canvas(world, predicate, projection, point, opts.radius_px / view.scale)
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, pick_canvas, pick_screen};
    use crate::components::Properties;
    use crate::entity::{Entity, EntityId};
    use crate::query::{EntityPredicate, PropertyFilters, RangeGate};
    use crate::world::{EntityDataset, World};
    use foundation::bounds::WorldBounds;
    use foundation::math::{CanvasProjection, CanvasSize, Vec2, ViewTransform};

    fn projection() -> CanvasProjection {
        CanvasProjection::new(
            WorldBounds::new(0.0, 100.0, 0.0, 100.0),
            CanvasSize::new(100.0, 100.0),
        )
        .expect("projection")
    }

    fn at(x: f64, y: f64, model: &str) -> Entity {
        let props: Properties = [("model", model)].into_iter().collect();
        Entity::new(x, y, 0.0, props)
    }

    #[test]
    fn earlier_entity_wins_at_same_point() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new("a", "red", vec![at(10.0, 90.0, "first")]));
        world.push_dataset(EntityDataset::new("b", "red", vec![at(10.0, 90.0, "second")]));
        let filters = PropertyFilters::new(["model"]);
        let pred = EntityPredicate::new(&filters, RangeGate::default());

        let hit = pick_canvas(&world, &pred, &projection(), Vec2::new(10.0, 10.0), 5.0)
            .expect("hit");
        assert_eq!(hit.entity, EntityId::new(0, 0));
    }

    #[test]
    fn first_in_order_beats_nearer() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new(
            "a",
            "red",
            vec![at(13.0, 90.0, "far"), at(10.0, 90.0, "exact")],
        ));
        let filters = PropertyFilters::new(["model"]);
        let pred = EntityPredicate::new(&filters, RangeGate::default());
        let hit = pick_canvas(&world, &pred, &projection(), Vec2::new(10.0, 10.0), 5.0)
            .expect("hit");
        assert_eq!(hit.entity, EntityId::new(0, 0));
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new("a", "red", vec![at(15.0, 90.0, "m")]));
        let filters = PropertyFilters::new(["model"]);
        let pred = EntityPredicate::new(&filters, RangeGate::default());
        assert!(pick_canvas(&world, &pred, &projection(), Vec2::new(10.0, 10.0), 5.0).is_none());
        assert!(pick_canvas(&world, &pred, &projection(), Vec2::new(10.5, 10.0), 5.0).is_some());
    }

    #[test]
    fn filtered_and_disabled_entities_are_skipped() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new("a", "red", vec![at(10.0, 90.0, "hidden")]));
        let b = world.push_dataset(EntityDataset::new("b", "red", vec![at(10.0, 90.0, "shown")]));
        let mut filters = PropertyFilters::new(["model"]);
        filters.get_mut("model").expect("tracked").include_all(["shown"]);
        let pred = EntityPredicate::new(&filters, RangeGate::default());

        let hit = pick_canvas(&world, &pred, &projection(), Vec2::new(10.0, 10.0), 5.0)
            .expect("hit");
        assert_eq!(hit.entity, EntityId::new(1, 0));

        world.set_enabled(b, false);
        assert!(pick_canvas(&world, &pred, &projection(), Vec2::new(10.0, 10.0), 5.0).is_none());
    }

    #[test]
    fn screen_radius_shrinks_with_zoom() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new("a", "red", vec![at(10.0, 90.0, "m")]));
        let filters = PropertyFilters::new(["model"]);
        let pred = EntityPredicate::new(&filters, RangeGate::default());
        let view = ViewTransform::new(4.0, 0.0, 0.0);

        // Canvas (10,10) sits at screen (40,40); 4 px away on screen is 1 canvas px.
        let near = pick_screen(&world, &pred, &projection(), &view, Vec2::new(44.0, 40.0), PickOptions::default());
        assert!(near.is_some());
        let far = pick_screen(&world, &pred, &projection(), &view, Vec2::new(46.0, 40.0), PickOptions::default());
        assert!(far.is_none());
    }
}
