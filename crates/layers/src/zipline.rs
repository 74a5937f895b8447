use std::collections::HashMap;

use foundation::math::Vec2;
use once_cell::sync::Lazy;
use regex::Regex;
use scene::World;
use scene::entity::Entity;

static REST_POINT_KEY: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"_zipline_rest_point_(\d+)"));

/// Property names that identify zipline endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZiplineKeys {
    pub class_field: String,
    pub start_marker: String,
    pub end_marker: String,
    pub link_field: String,
}

impl Default for ZiplineKeys {
    fn default() -> Self {
        Self {
            class_field: "classname".to_string(),
            start_marker: "zipline".to_string(),
            end_marker: "zipline_end".to_string(),
            link_field: "link_guid".to_string(),
        }
    }
}

/// One drawable zipline path in world coordinates; always at least two points.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipSegment {
    pub points: Vec<Vec2>,
}

/// Indexed rest points embedded in a start entity's properties, sorted by index.
///
/// Values that are not a whitespace-separated number pair are skipped.
pub fn rest_points(start: &Entity) -> Vec<Vec2> {
    let Ok(key_re) = REST_POINT_KEY.as_ref() else {
        return Vec::new();
    };
    let mut indexed: Vec<(u64, Vec2)> = start
        .props
        .iter()
        .filter_map(|(key, value)| {
            let idx = key_re.captures(key)?.get(1)?.as_str().parse::<u64>().ok()?;
            let text = value.as_text();
            let mut nums = text.split_whitespace().map(str::parse::<f64>);
            let x = nums.next()?.ok()?;
            let y = nums.next()?.ok()?;
            Some((idx, Vec2::new(x, y)))
        })
        .collect();
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, p)| p).collect()
}

/// Rebuilds every zipline path from scratch.
///
/// Ordering contract:
/// - Segments follow the order in which each link id first appeared as a start.
/// - A later start with the same link id replaces the earlier one in place; likewise for ends.
/// - Entities without a link id are ignored.
pub fn reconstruct_segments<'a>(
    entities: impl IntoIterator<Item = &'a Entity> + Clone,
    keys: &ZiplineKeys,
) -> Vec<ZipSegment> {
    let mut order: Vec<String> = Vec::new();
    let mut pairs: HashMap<String, (&'a Entity, Option<&'a Entity>)> = HashMap::new();

    for e in entities.clone() {
        if e.field_text(&keys.class_field) != keys.start_marker.as_str() {
            continue;
        }
        let Some(link) = e.props.non_empty_text(&keys.link_field) else {
            continue;
        };
        let link = link.into_owned();
        if !pairs.contains_key(&link) {
            order.push(link.clone());
        }
        pairs.insert(link, (e, None));
    }

    for e in entities {
        if e.field_text(&keys.class_field) != keys.end_marker.as_str() {
            continue;
        }
        let Some(link) = e.props.non_empty_text(&keys.link_field) else {
            continue;
        };
        if let Some(pair) = pairs.get_mut(&*link) {
            pair.1 = Some(e);
        }
    }

    order
        .iter()
        .filter_map(|link| pairs.get(link))
        .filter_map(|(start, end)| {
            let mut points = vec![start.position()];
            points.extend(rest_points(start));
            if let Some(end) = end {
                points.push(end.position());
            }
            (points.len() >= 2).then_some(ZipSegment { points })
        })
        .collect()
}

/// Cached zipline paths over all datasets, enabled or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ZiplineLayer {
    keys: ZiplineKeys,
    segments: Vec<ZipSegment>,
}

impl ZiplineLayer {
    pub fn new(keys: ZiplineKeys) -> Self {
        Self {
            keys,
            segments: Vec::new(),
        }
    }

    /// Full rebuild; call whenever the entity set changes.
    pub fn rebuild(&mut self, world: &World) {
        let all: Vec<&Entity> = world.all_entities().map(|(_, e)| e).collect();
        self.segments = reconstruct_segments(all.iter().copied(), &self.keys);
        tracing::debug!(segments = self.segments.len(), "zipline layer rebuilt");
    }

    pub fn segments(&self) -> &[ZipSegment] {
        &self.segments
    }
}
