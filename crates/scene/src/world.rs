use foundation::bounds::HeightRange;

use crate::entity::{Entity, EntityId};

/// Entities from one loaded source file.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDataset {
    pub ents: Vec<Entity>,
    /// Legend swatch colour (CSS).
    pub color: String,
    pub file_name: String,
    /// Gates both painting and hit-testing.
    pub enabled: bool,
}

impl EntityDataset {
    pub fn new(file_name: impl Into<String>, color: impl Into<String>, ents: Vec<Entity>) -> Self {
        Self {
            ents,
            color: color.into(),
            file_name: file_name.into(),
            enabled: true,
        }
    }
}

/// Summary row for legend widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub slot: u32,
    pub file_name: String,
    pub color: String,
    pub enabled: bool,
    pub entity_count: usize,
}

/// All loaded datasets.
///
/// Ordering contract:
/// - Datasets iterate in load order; entities iterate in collection order within a dataset.
/// - Every entity iterator yields ascending `EntityId`s.
#[derive(Debug, Default)]
pub struct World {
    datasets: Vec<EntityDataset>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every dataset at once.
    pub fn replace(&mut self, datasets: Vec<EntityDataset>) {
        self.datasets = datasets;
    }

    pub fn push_dataset(&mut self, dataset: EntityDataset) -> u32 {
        self.datasets.push(dataset);
        (self.datasets.len() - 1) as u32
    }

    pub fn datasets(&self) -> &[EntityDataset] {
        &self.datasets
    }

    pub fn dataset(&self, slot: u32) -> Option<&EntityDataset> {
        self.datasets.get(slot as usize)
    }

    /// Returns `true` if the flag changed.
    pub fn set_enabled(&mut self, slot: u32, enabled: bool) -> bool {
        match self.datasets.get_mut(slot as usize) {
            Some(ds) if ds.enabled != enabled => {
                ds.enabled = enabled;
                true
            }
            _ => false,
        }
    }

    pub fn dataset_infos(&self) -> Vec<DatasetInfo> {
        self.datasets
            .iter()
            .enumerate()
            .map(|(slot, ds)| DatasetInfo {
                slot: slot as u32,
                file_name: ds.file_name.clone(),
                color: ds.color.clone(),
                enabled: ds.enabled,
                entity_count: ds.ents.len(),
            })
            .collect()
    }

    /// Entities of enabled datasets only.
    pub fn active_entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities_where(|ds| ds.enabled)
    }

    /// Entities of every dataset, enabled or not.
    pub fn all_entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities_where(|_| true)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.dataset(id.dataset)?.ents.get(id.index as usize)
    }

    /// Integer-aligned height range over all datasets, or `None` when empty.
    pub fn height_range(&self) -> Option<HeightRange> {
        HeightRange::covering(self.all_entities().map(|(_, e)| e.h))
    }

    fn entities_where<F>(&self, keep: F) -> impl Iterator<Item = (EntityId, &Entity)>
    where
        F: Fn(&EntityDataset) -> bool,
    {
        self.datasets
            .iter()
            .enumerate()
            .filter(move |(_, ds)| keep(*ds))
            .flat_map(|(slot, ds)| {
                ds.ents
                    .iter()
                    .enumerate()
                    .map(move |(i, e)| (EntityId::new(slot as u32, i as u32), e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityDataset, World};
    use crate::components::Properties;
    use crate::entity::{Entity, EntityId};
    use foundation::bounds::HeightRange;

    fn ent(x: f64, h: f64) -> Entity {
        Entity::new(x, 0.0, h, Properties::new())
    }

    #[test]
    fn disabled_datasets_are_not_active() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new("a.json", "#e6194b", vec![ent(0.0, 0.0)]));
        let b = world.push_dataset(EntityDataset::new("b.json", "#3cb44b", vec![ent(1.0, 0.0)]));

        assert!(world.set_enabled(b, false));
        assert!(!world.set_enabled(b, false));
        let active: Vec<EntityId> = world.active_entities().map(|(id, _)| id).collect();
        assert_eq!(active, vec![EntityId::new(0, 0)]);
        assert_eq!(world.all_entities().count(), 2);
    }

    #[test]
    fn iteration_is_dataset_then_entity_order() {
        let mut world = World::new();
        world.push_dataset(EntityDataset::new("a", "red", vec![ent(0.0, 0.0), ent(1.0, 0.0)]));
        world.push_dataset(EntityDataset::new("b", "blue", vec![ent(2.0, 0.0)]));
        let xs: Vec<f64> = world.active_entities().map(|(_, e)| e.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert_eq!(world.entity(EntityId::new(1, 0)).map(|e| e.x), Some(2.0));
        assert!(world.entity(EntityId::new(1, 1)).is_none());
    }

    #[test]
    fn height_range_covers_all_datasets() {
        let mut world = World::new();
        assert!(world.height_range().is_none());
        world.push_dataset(EntityDataset::new("a", "red", vec![ent(0.0, -1.2), ent(0.0, 3.4)]));
        assert_eq!(world.height_range(), Some(HeightRange::new(-2.0, 4.0)));
    }
}
