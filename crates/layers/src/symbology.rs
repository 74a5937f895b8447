//! Compiled entity-type rules.
//!
//! Each raw `EntityTypeRecord` compiles into one `EntityTypeRule` carrying a `RenderKind`
//! variant with exactly the parameters that kind needs. Compilation failures are kept per
//! entry so one bad rule never disables the rest.

use formats::EntityTypeRecord;
use regex::Regex;
use scene::entity::Entity;
use thiserror::Error;

use crate::labels::{ReplaceTemplate, TextCase};

pub const DEFAULT_ICON_SIZE_PX: f64 = 24.0;
pub const DEFAULT_CIRCLE_FILL: &str = "rgba(255,0,0,0.25)";
pub const DEFAULT_CIRCLE_STROKE: &str = "#ff4444";
pub const DEFAULT_CIRCLE_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_DOT_OUTER_RADIUS_PX: f64 = 8.0;
pub const DEFAULT_DOT_INNER_RADIUS_PX: f64 = 4.0;
pub const DEFAULT_DOT_OUTER_COLOR: &str = "lime";
pub const DEFAULT_FONT_SIZE_PX: f64 = 14.0;
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_TEXT_COLOR: &str = "#fff";
pub const DEFAULT_TEXT_ALIGN: &str = "center";
pub const DEFAULT_TEXT_BASELINE: &str = "middle";
pub const DEFAULT_ZIPLINE_COLOR: &str = "orange";
pub const DEFAULT_ZIPLINE_WIDTH_PX: f64 = 2.0;

#[derive(Debug, Error)]
pub enum SymbologyError {
    #[error("unknown render type `{0}`")]
    UnknownRenderType(String),
    #[error("invalid {what} pattern `{pattern}`: {source}")]
    InvalidRegex {
        what: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{render_type} rule is missing `{parameter}`")]
    MissingParameter {
        render_type: &'static str,
        parameter: &'static str,
    },
}

/// Entity selection for one rule.
#[derive(Debug, Clone)]
pub enum Matcher {
    Any,
    Equals { field: String, value: String },
    Pattern { field: String, regex: Regex },
}

impl Matcher {
    /// A missing field reads as the empty string.
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Equals { field, value } => entity.field_text(field) == value.as_str(),
            Matcher::Pattern { field, regex } => regex.is_match(&entity.field_text(field)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconStyle {
    pub source: String,
    pub tint: Option<String>,
    pub size_px: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RadiusSource {
    /// World units.
    Literal(f64),
    /// Per-entity world radius read from this property.
    Field(String),
}

impl RadiusSource {
    /// Positive finite world radius for `entity`, or `None` to skip it.
    pub fn radius_for(&self, entity: &Entity) -> Option<f64> {
        let r = match self {
            RadiusSource::Literal(r) => Some(*r),
            RadiusSource::Field(f) => entity.props.get(f).and_then(|v| v.as_number()),
        }?;
        (r.is_finite() && r > 0.0).then_some(r)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub radius: RadiusSource,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerDot {
    pub radius_px: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DotStyle {
    pub outer_radius_px: f64,
    pub outer_color: String,
    pub inner: Option<InnerDot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextSource {
    Literal(String),
    Field(String),
}

#[derive(Debug, Clone)]
pub struct TextRewrite {
    pub find: Regex,
    pub replace: ReplaceTemplate,
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub source: TextSource,
    pub rewrite: Option<TextRewrite>,
    pub replace_underscores: bool,
    pub case: Option<TextCase>,
    pub font_size_px: f64,
    pub scale_with_zoom: bool,
    pub font_family: String,
    pub color: String,
    pub align: String,
    pub baseline: String,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl TextStyle {
    pub fn font_size_at(&self, zoom: f64) -> f64 {
        if self.scale_with_zoom {
            self.font_size_px * zoom
        } else {
            self.font_size_px
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZiplineStyle {
    pub color: String,
    pub line_width_px: f64,
}

#[derive(Debug, Clone)]
pub enum RenderKind {
    Icon(IconStyle),
    Circle(CircleStyle),
    Dot(DotStyle),
    Text(TextStyle),
    Zipline(ZiplineStyle),
}

#[derive(Debug, Clone)]
pub struct EntityTypeRule {
    pub nickname: String,
    pub matcher: Matcher,
    pub kind: RenderKind,
}

impl EntityTypeRule {
    pub fn compile(record: &EntityTypeRecord) -> Result<Self, SymbologyError> {
        Ok(Self {
            nickname: record.nickname.clone(),
            matcher: compile_matcher(record)?,
            kind: compile_kind(record)?,
        })
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

/// Size-like parameters treat zero, negative and non-finite values as unset.
fn positive_or(v: Option<f64>, default: f64) -> f64 {
    v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

fn text_or(v: &Option<String>, default: &str) -> String {
    non_empty(v).unwrap_or(default).to_string()
}

fn compile_regex(what: &'static str, pattern: &str) -> Result<Regex, SymbologyError> {
    Regex::new(pattern).map_err(|source| SymbologyError::InvalidRegex {
        what,
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_matcher(record: &EntityTypeRecord) -> Result<Matcher, SymbologyError> {
    let field = record.field.clone().unwrap_or_default();
    if let Some(pattern) = non_empty(&record.value_regex) {
        return Ok(Matcher::Pattern {
            field,
            regex: compile_regex("valueRegex", pattern)?,
        });
    }
    Ok(match &record.value {
        Some(value) => Matcher::Equals {
            field,
            value: value.clone(),
        },
        None => Matcher::Any,
    })
}

fn compile_kind(r: &EntityTypeRecord) -> Result<RenderKind, SymbologyError> {
    let kind = match r.render_type.as_str() {
        "icon" => RenderKind::Icon(IconStyle {
            source: non_empty(&r.icon)
                .ok_or(SymbologyError::MissingParameter {
                    render_type: "icon",
                    parameter: "icon",
                })?
                .to_string(),
            tint: non_empty(&r.tint_color).map(str::to_string),
            size_px: positive_or(r.size, DEFAULT_ICON_SIZE_PX),
        }),
        "circle" => {
            let radius = match (non_empty(&r.radius_field), r.radius) {
                (Some(field), _) => RadiusSource::Field(field.to_string()),
                (None, Some(v)) if v.is_finite() && v > 0.0 => RadiusSource::Literal(v),
                _ => {
                    return Err(SymbologyError::MissingParameter {
                        render_type: "circle",
                        parameter: "radius",
                    });
                }
            };
            RenderKind::Circle(CircleStyle {
                radius,
                fill: text_or(&r.fill_color, DEFAULT_CIRCLE_FILL),
                stroke: text_or(&r.stroke_color, DEFAULT_CIRCLE_STROKE),
                stroke_width: positive_or(r.stroke_width, DEFAULT_CIRCLE_STROKE_WIDTH),
            })
        }
        "dot" => RenderKind::Dot(DotStyle {
            outer_radius_px: positive_or(r.outer_radius, DEFAULT_DOT_OUTER_RADIUS_PX),
            outer_color: text_or(&r.outer_color, DEFAULT_DOT_OUTER_COLOR),
            inner: non_empty(&r.inner_color).map(|color| InnerDot {
                radius_px: positive_or(r.inner_radius, DEFAULT_DOT_INNER_RADIUS_PX),
                color: color.to_string(),
            }),
        }),
        "text" => {
            let source = match non_empty(&r.text_field) {
                Some(field) => TextSource::Field(field.to_string()),
                None => TextSource::Literal(r.text.clone().unwrap_or_default()),
            };
            let rewrite = match non_empty(&r.regex_find) {
                Some(find) => {
                    let find = compile_regex("regexFind", find)?;
                    let replace =
                        ReplaceTemplate::parse(r.regex_replace.as_deref().unwrap_or(""), &find);
                    Some(TextRewrite { find, replace })
                }
                None => None,
            };
            RenderKind::Text(TextStyle {
                source,
                rewrite,
                replace_underscores: r.replace_underscores,
                case: r.case.as_deref().and_then(TextCase::parse),
                font_size_px: positive_or(r.font_size, DEFAULT_FONT_SIZE_PX),
                scale_with_zoom: r.scale_with_zoom,
                font_family: text_or(&r.font_family, DEFAULT_FONT_FAMILY),
                color: text_or(&r.text_color, DEFAULT_TEXT_COLOR),
                align: text_or(&r.text_align, DEFAULT_TEXT_ALIGN),
                baseline: text_or(&r.text_baseline, DEFAULT_TEXT_BASELINE),
                offset_x: r.offset_x.unwrap_or(0.0),
                offset_y: r.offset_y.unwrap_or(0.0),
            })
        }
        "zipline" => RenderKind::Zipline(ZiplineStyle {
            color: text_or(&r.color, DEFAULT_ZIPLINE_COLOR),
            line_width_px: positive_or(r.line_width, DEFAULT_ZIPLINE_WIDTH_PX),
        }),
        other => return Err(SymbologyError::UnknownRenderType(other.to_string())),
    };
    Ok(kind)
}

/// One configured rule plus its visibility toggle.
#[derive(Debug)]
pub struct EntityTypeEntry {
    pub nickname: String,
    pub render_type: String,
    pub rule: Result<EntityTypeRule, SymbologyError>,
    pub enabled: bool,
}

impl EntityTypeEntry {
    pub fn error(&self) -> Option<&SymbologyError> {
        self.rule.as_ref().err()
    }
}

/// The ordered rule list. Index order is overlay z-order.
#[derive(Debug, Default)]
pub struct EntityTypeSet {
    entries: Vec<EntityTypeEntry>,
}

impl EntityTypeSet {
    pub fn from_records(records: &[EntityTypeRecord]) -> Self {
        let entries = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let rule = EntityTypeRule::compile(record);
                if let Err(err) = &rule {
                    tracing::warn!(index, nickname = %record.nickname, error = %err, "entity-type rule disabled");
                }
                EntityTypeEntry {
                    nickname: record.nickname.clone(),
                    render_type: record.render_type.clone(),
                    rule,
                    enabled: record.default_enabled,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[EntityTypeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the flag changed.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(e) if e.enabled != enabled => {
                e.enabled = enabled;
                true
            }
            _ => false,
        }
    }

    /// Index of the first `zipline` entry; later zipline entries never draw.
    pub fn zipline_index(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.render_type == "zipline")
    }

    /// Style of the first zipline entry when it is enabled.
    pub fn active_zipline(&self) -> Option<&ZiplineStyle> {
        let entry = self.entries.get(self.zipline_index()?)?;
        if !entry.enabled {
            return None;
        }
        match &entry.rule {
            Ok(EntityTypeRule {
                kind: RenderKind::Zipline(style),
                ..
            }) => Some(style),
            _ => None,
        }
    }

    /// Enabled, compiled, entity-driven rules in z-order.
    pub fn overlays(&self) -> impl Iterator<Item = (usize, &EntityTypeRule)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.enabled)
            .filter_map(|(i, e)| e.rule.as_ref().ok().map(|r| (i, r)))
            .filter(|(_, r)| !matches!(r.kind, RenderKind::Zipline(_)))
    }

    /// Icon sources to load, by entry index, regardless of enabled state.
    pub fn icon_sources(&self) -> impl Iterator<Item = (usize, &IconStyle)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| match &e.rule {
            Ok(EntityTypeRule {
                kind: RenderKind::Icon(style),
                ..
            }) => Some((i, style)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EntityTypeSet, Matcher, RadiusSource, RenderKind, SymbologyError, DEFAULT_ICON_SIZE_PX,
    };
    use formats::EntityTypeRecord;
    use scene::components::Properties;
    use scene::entity::Entity;

    fn rec(render_type: &str) -> EntityTypeRecord {
        EntityTypeRecord {
            nickname: render_type.to_string(),
            render_type: render_type.to_string(),
            default_enabled: true,
            ..EntityTypeRecord::default()
        }
    }

    fn ent(pairs: &[(&str, &str)]) -> Entity {
        Entity::new(0.0, 0.0, 0.0, pairs.iter().copied().collect::<Properties>())
    }

    #[test]
    fn matcher_precedence_regex_then_value_then_any() {
        let mut r = rec("dot");
        r.field = Some("classname".into());
        r.value = Some("exact".into());
        r.value_regex = Some("^prop_".into());
        let set = EntityTypeSet::from_records(&[r.clone()]);
        let rule = set.entries()[0].rule.as_ref().expect("compiled");
        assert!(matches!(rule.matcher, Matcher::Pattern { .. }));
        assert!(rule.matcher.matches(&ent(&[("classname", "prop_dynamic")])));
        assert!(!rule.matcher.matches(&ent(&[("classname", "exact")])));

        r.value_regex = Some(String::new());
        let set = EntityTypeSet::from_records(&[r.clone()]);
        let rule = set.entries()[0].rule.as_ref().expect("compiled");
        assert!(rule.matcher.matches(&ent(&[("classname", "exact")])));
        assert!(!rule.matcher.matches(&ent(&[])));

        r.value = None;
        let set = EntityTypeSet::from_records(&[r]);
        let rule = set.entries()[0].rule.as_ref().expect("compiled");
        assert!(rule.matcher.matches(&ent(&[])));
    }

    #[test]
    fn empty_value_matches_missing_field() {
        let mut r = rec("dot");
        r.field = Some("model".into());
        r.value = Some(String::new());
        let set = EntityTypeSet::from_records(&[r]);
        let rule = set.entries()[0].rule.as_ref().expect("compiled");
        assert!(rule.matcher.matches(&ent(&[])));
        assert!(!rule.matcher.matches(&ent(&[("model", "x")])));
    }

    #[test]
    fn bad_regex_only_breaks_its_own_rule() {
        let mut bad = rec("dot");
        bad.field = Some("classname".into());
        bad.value_regex = Some("(unclosed".into());
        let set = EntityTypeSet::from_records(&[bad, rec("dot")]);

        assert!(matches!(
            set.entries()[0].error(),
            Some(SymbologyError::InvalidRegex { .. })
        ));
        let overlays: Vec<usize> = set.overlays().map(|(i, _)| i).collect();
        assert_eq!(overlays, vec![1]);
    }

    #[test]
    fn unknown_and_incomplete_rules_are_errors() {
        let set = EntityTypeSet::from_records(&[rec("hexagon"), rec("icon"), rec("circle")]);
        assert!(matches!(
            set.entries()[0].error(),
            Some(SymbologyError::UnknownRenderType(t)) if t == "hexagon"
        ));
        assert!(matches!(
            set.entries()[1].error(),
            Some(SymbologyError::MissingParameter { parameter: "icon", .. })
        ));
        assert!(matches!(
            set.entries()[2].error(),
            Some(SymbologyError::MissingParameter { parameter: "radius", .. })
        ));
    }

    #[test]
    fn defaults_fill_unset_parameters() {
        let mut icon = rec("icon");
        icon.icon = Some("a.png".into());
        icon.size = Some(0.0);
        let mut dot = rec("dot");
        dot.inner_color = Some("black".into());
        let set = EntityTypeSet::from_records(&[icon, dot]);

        match &set.entries()[0].rule.as_ref().expect("icon").kind {
            RenderKind::Icon(style) => {
                assert_eq!(style.size_px, DEFAULT_ICON_SIZE_PX);
                assert_eq!(style.tint, None);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match &set.entries()[1].rule.as_ref().expect("dot").kind {
            RenderKind::Dot(style) => {
                assert_eq!(style.outer_radius_px, 8.0);
                assert_eq!(style.outer_color, "lime");
                assert_eq!(style.inner.as_ref().map(|i| i.radius_px), Some(4.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn negative_sizes_fall_back_to_defaults() {
        let mut icon = rec("icon");
        icon.icon = Some("a.png".into());
        icon.size = Some(-16.0);
        let mut dot = rec("dot");
        dot.outer_radius = Some(-3.0);
        dot.inner_color = Some("black".into());
        dot.inner_radius = Some(f64::NAN);
        let mut circle = rec("circle");
        circle.radius = Some(-50.0);
        let set = EntityTypeSet::from_records(&[icon, dot, circle]);

        match &set.entries()[0].rule.as_ref().expect("icon").kind {
            RenderKind::Icon(style) => assert_eq!(style.size_px, DEFAULT_ICON_SIZE_PX),
            other => panic!("unexpected kind {other:?}"),
        }
        match &set.entries()[1].rule.as_ref().expect("dot").kind {
            RenderKind::Dot(style) => {
                assert_eq!(style.outer_radius_px, 8.0);
                assert_eq!(style.inner.as_ref().map(|i| i.radius_px), Some(4.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(matches!(
            set.entries()[2].error(),
            Some(SymbologyError::MissingParameter { parameter: "radius", .. })
        ));
    }

    #[test]
    fn circle_radius_from_field() {
        let mut r = rec("circle");
        r.radius = Some(10.0);
        r.radius_field = Some("range".into());
        let set = EntityTypeSet::from_records(&[r]);
        let RenderKind::Circle(style) = &set.entries()[0].rule.as_ref().expect("circle").kind else {
            panic!("expected circle");
        };
        assert_eq!(style.radius, RadiusSource::Field("range".into()));
        assert_eq!(style.radius.radius_for(&ent(&[("range", "256")])), Some(256.0));
        assert_eq!(style.radius.radius_for(&ent(&[("range", "0")])), None);
        assert_eq!(style.radius.radius_for(&ent(&[])), None);
    }

    #[test]
    fn only_first_zipline_is_active() {
        let mut first = rec("zipline");
        first.color = Some("cyan".into());
        let second = rec("zipline");
        let mut set = EntityTypeSet::from_records(&[rec("dot"), first, second]);

        assert_eq!(set.zipline_index(), Some(1));
        assert_eq!(set.active_zipline().map(|z| z.color.as_str()), Some("cyan"));
        assert_eq!(set.overlays().map(|(i, _)| i).collect::<Vec<_>>(), vec![0]);

        assert!(set.set_enabled(1, false));
        assert!(set.active_zipline().is_none());
    }

    #[test]
    fn icon_sources_include_disabled_entries() {
        let mut icon = rec("icon");
        icon.icon = Some("bin.png".into());
        icon.default_enabled = false;
        let set = EntityTypeSet::from_records(&[rec("dot"), icon]);
        let sources: Vec<(usize, &str)> = set
            .icon_sources()
            .map(|(i, s)| (i, s.source.as_str()))
            .collect();
        assert_eq!(sources, vec![(1, "bin.png")]);
        assert_eq!(set.overlays().count(), 1);
    }
}
