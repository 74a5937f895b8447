use std::collections::BTreeSet;

use foundation::bounds::HeightRange;

use crate::entity::Entity;

/// Property keys tracked by the filter panel unless configured otherwise.
pub const DEFAULT_PROPERTY_KEYS: [&str; 6] = [
    "model",
    "editorclass",
    "classname",
    "environment",
    "instance_name",
    "script_name",
];

/// Visibility state for one tracked key.
///
/// An empty include set with `missing_allowed == false` imposes no constraint at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    include: BTreeSet<String>,
    missing_allowed: bool,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.include.is_empty() && !self.missing_allowed
    }

    /// `value` is the entity's text for this key; `None` or `""` means missing.
    pub fn excludes(&self, value: Option<&str>) -> bool {
        if self.is_unconstrained() {
            return false;
        }
        match value {
            Some(v) if !v.is_empty() => !self.include.contains(v),
            _ => !self.missing_allowed,
        }
    }

    pub fn includes(&self, value: &str) -> bool {
        self.include.contains(value)
    }

    pub fn included(&self) -> impl Iterator<Item = &str> {
        self.include.iter().map(String::as_str)
    }

    /// Returns `true` if the set changed.
    pub fn set_included(&mut self, value: &str, included: bool) -> bool {
        if included {
            self.include.insert(value.to_string())
        } else {
            self.include.remove(value)
        }
    }

    /// Flips `value`'s membership and returns the new state.
    pub fn toggle(&mut self, value: &str) -> bool {
        let now = !self.includes(value);
        self.set_included(value, now);
        now
    }

    pub fn include_all<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) {
        self.include.extend(values.into_iter().map(str::to_string));
    }

    pub fn clear(&mut self) {
        self.include.clear();
    }

    pub fn missing_allowed(&self) -> bool {
        self.missing_allowed
    }

    pub fn set_missing_allowed(&mut self, allowed: bool) {
        self.missing_allowed = allowed;
    }
}

/// Distinct non-empty values per tracked key, scanned once per dataset load.
///
/// Ordering contract:
/// - Keys keep the tracked-key order; values are sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableValues {
    by_key: Vec<(String, Vec<String>)>,
}

impl AvailableValues {
    pub fn scan<'a>(keys: &[String], entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut sets: Vec<BTreeSet<String>> = vec![BTreeSet::new(); keys.len()];
        for entity in entities {
            for (key, set) in keys.iter().zip(sets.iter_mut()) {
                if let Some(v) = entity.props.non_empty_text(key)
                    && !set.contains(&*v)
                {
                    set.insert(v.into_owned());
                }
            }
        }
        Self {
            by_key: keys
                .iter()
                .cloned()
                .zip(sets.into_iter().map(|s| s.into_iter().collect()))
                .collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.by_key
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Case-insensitive substring search over one key's values.
    pub fn search(&self, key: &str, needle: &str) -> Vec<&str> {
        let needle = needle.to_lowercase();
        self.values(key)
            .iter()
            .filter(|v| v.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }
}

/// Per-key filters over the tracked property keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFilters {
    keys: Vec<(String, KeyFilter)>,
}

impl PropertyFilters {
    pub fn new<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        let mut out = Self::default();
        for key in keys {
            let key = key.into();
            if out.get(&key).is_none() {
                out.keys.push((key, KeyFilter::new()));
            }
        }
        out
    }

    pub fn tracked_keys(&self) -> Vec<String> {
        self.keys.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&KeyFilter> {
        self.keys.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut KeyFilter> {
        self.keys.iter_mut().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    /// Clears every key, then (when `include_values`) includes all available values.
    pub fn reset(&mut self, available: &AvailableValues, include_values: bool) {
        for (key, filter) in &mut self.keys {
            *filter = KeyFilter::new();
            if include_values {
                filter.include_all(available.values(key).iter().map(String::as_str));
            }
        }
    }

    /// An entity is filtered out when any tracked key excludes it.
    pub fn is_filtered_out(&self, entity: &Entity) -> bool {
        self.keys.iter().any(|(key, filter)| {
            !filter.is_unconstrained() && filter.excludes(entity.props.text(key).as_deref())
        })
    }
}

/// Height gate shared by the height-dot layer and hit-testing.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct RangeGate {
    pub hide_out_of_range: bool,
    pub range: HeightRange,
}

impl RangeGate {
    pub fn admits(&self, h: f64) -> bool {
        !self.hide_out_of_range || self.range.contains(h)
    }
}

/// The single predicate used by both painting and picking.
#[derive(Debug, Copy, Clone)]
pub struct EntityPredicate<'a> {
    pub filters: &'a PropertyFilters,
    pub range: RangeGate,
}

impl<'a> EntityPredicate<'a> {
    pub fn new(filters: &'a PropertyFilters, range: RangeGate) -> Self {
        Self { filters, range }
    }

    pub fn admits(&self, entity: &Entity) -> bool {
        !self.filters.is_filtered_out(entity) && self.range.admits(entity.h)
    }
}
