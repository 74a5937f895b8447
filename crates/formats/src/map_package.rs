use std::io::Cursor;

use base64::Engine as _;
use foundation::bounds::{HeightRange, ImageSize, MapDefinition, WorldBounds};
use scene::components::Properties;
use scene::entity::Entity;
use serde_json::{Map, Value};

use crate::error::FormatError;
use crate::lenient;

/// Decoded background image bytes plus the natural size read from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub bytes: Vec<u8>,
    pub size: ImageSize,
}

impl BackgroundImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FormatError> {
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Self {
            bytes,
            size: ImageSize::new(width, height),
        })
    }

    pub fn from_base64(encoded: &str) -> Result<Self, FormatError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Self::from_bytes(bytes)
    }
}

/// A combined map file: background image, placement, and one entity list.
///
/// Wire shape:
/// `{ "background_image": <base64>, "config": { "pos_x", "pos_y", "scale" }, "entities": [...] }`
#[derive(Debug, Clone, PartialEq)]
pub struct MapPackage {
    pub source_name: String,
    pub definition: MapDefinition,
    pub background: BackgroundImage,
    pub entities: Vec<Entity>,
    /// Records skipped for a missing or malformed `origin`.
    pub dropped: usize,
}

impl MapPackage {
    pub fn from_json_str(payload: &str, source_name: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_json_value(&value, source_name)
    }

    pub fn from_json_value(value: &Value, source_name: &str) -> Result<Self, FormatError> {
        let obj = value
            .as_object()
            .ok_or(FormatError::Shape("a map package object"))?;

        let encoded = obj
            .get("background_image")
            .and_then(Value::as_str)
            .ok_or(FormatError::MissingField("background_image"))?;
        let background = BackgroundImage::from_base64(encoded)?;

        let config = obj
            .get("config")
            .and_then(Value::as_object)
            .ok_or(FormatError::MissingField("config"))?;
        let definition = MapDefinition::new(
            config_number(config, "pos_x")?,
            config_number(config, "pos_y")?,
            config_number(config, "scale")?,
        );

        let records = obj
            .get("entities")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let entities: Vec<Entity> = records.iter().filter_map(parse_entity).collect();
        let dropped = records.len() - entities.len();
        if dropped > 0 {
            tracing::debug!(source = source_name, dropped, "skipped malformed entity records");
        }

        Ok(Self {
            source_name: source_name.to_string(),
            definition,
            background,
            entities,
            dropped,
        })
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::from_map(self.definition, self.background.size)
    }

    /// `floor(min h)..=ceil(max h)`; `0..=0` for a package without entities.
    pub fn height_range(&self) -> HeightRange {
        HeightRange::covering(self.entities.iter().map(|e| e.h)).unwrap_or_default()
    }
}

fn config_number(config: &Map<String, Value>, field: &'static str) -> Result<f64, FormatError> {
    let raw = config.get(field).ok_or(FormatError::MissingField(field))?;
    lenient::coerce_f64(raw)
        .filter(|v| v.is_finite())
        .ok_or_else(|| FormatError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Splits `"x y [z]"` on whitespace; `z` defaults to 0. Non-finite components
/// (`inf`, `NaN`) reject the whole origin.
pub fn parse_origin(origin: &str) -> Option<(f64, f64, f64)> {
    let mut parts = origin
        .split_whitespace()
        .map(|p| p.parse::<f64>().ok().filter(|v| v.is_finite()));
    let x = parts.next()??;
    let y = parts.next()??;
    let z = match parts.next() {
        Some(z) => z?,
        None => 0.0,
    };
    Some((x, y, z))
}

/// Builds an entity from one raw record, or `None` when `origin` is not a parseable string.
///
/// Props carry every non-null record field in record order, then `x`, `y` and `height`.
pub fn parse_entity(record: &Value) -> Option<Entity> {
    let obj = record.as_object()?;
    let (x, y, h) = parse_origin(obj.get("origin")?.as_str()?)?;

    let mut props = Properties::new();
    for (key, value) in obj {
        if let Some(v) = lenient::property_value(value) {
            props.insert(key.as_str(), v);
        }
    }
    props.insert("x", x);
    props.insert("y", y);
    props.insert("height", h);
    Some(Entity::new(x, y, h, props))
}

#[cfg(test)]
mod tests {
    use super::{BackgroundImage, MapPackage, parse_entity, parse_origin};
    use crate::error::FormatError;
    use base64::Engine as _;
    use foundation::bounds::{HeightRange, ImageSize, WorldBounds};
    use serde_json::json;
    use std::io::Cursor;

    fn png_base64(w: u32, h: u32) -> String {
        let img = image::RgbaImage::new(w, h);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode png");
        base64::engine::general_purpose::STANDARD.encode(buf)
    }

    #[test]
    fn origin_parsing() {
        assert_eq!(parse_origin("1 2 3"), Some((1.0, 2.0, 3.0)));
        assert_eq!(parse_origin("  -1.5\t2  "), Some((-1.5, 2.0, 0.0)));
        assert_eq!(parse_origin("1"), None);
        assert_eq!(parse_origin("1 two 3"), None);
    }

    #[test]
    fn non_finite_origins_are_rejected() {
        assert_eq!(parse_origin("inf 0 0"), None);
        assert_eq!(parse_origin("NaN 5 5"), None);
        assert_eq!(parse_origin("1 2 -infinity"), None);
        assert!(parse_entity(&json!({ "origin": "0 NaN" })).is_none());
    }

    #[test]
    fn entity_props_include_position_fields() {
        let e = parse_entity(&json!({
            "origin": "10 20 5",
            "classname": "info_target",
            "spawnflags": 3,
            "comment": null
        }))
        .expect("entity");
        assert_eq!((e.x, e.y, e.h), (10.0, 20.0, 5.0));
        let keys: Vec<&str> = e.props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["origin", "classname", "spawnflags", "x", "y", "height"]);
        assert_eq!(e.props.text("spawnflags").as_deref(), Some("3"));
        assert!(e.props.get("comment").is_none());
    }

    #[test]
    fn non_string_origin_is_dropped() {
        assert!(parse_entity(&json!({"origin": [1, 2, 3]})).is_none());
        assert!(parse_entity(&json!({"classname": "x"})).is_none());
        assert!(parse_entity(&json!("origin")).is_none());
    }

    #[test]
    fn package_reads_image_size_and_coerces_config() {
        let payload = json!({
            "background_image": png_base64(40, 20),
            "config": {"pos_x": "-100", "pos_y": 50, "scale": "2.5"},
            "entities": [
                {"origin": "0 0 1.2"},
                {"origin": 7},
                {"origin": "5 5 -3.5", "model": "crate"}
            ]
        });
        let pkg = MapPackage::from_json_value(&payload, "demo.json").expect("package");

        assert_eq!(pkg.background.size, ImageSize::new(40, 20));
        assert_eq!(pkg.entities.len(), 2);
        assert_eq!(pkg.dropped, 1);
        assert_eq!(pkg.bounds(), WorldBounds::new(-100.0, 0.0, 0.0, 50.0));
        assert_eq!(pkg.height_range(), HeightRange::new(-4.0, 2.0));
    }

    #[test]
    fn missing_entities_yield_flat_height_range() {
        let payload = json!({
            "background_image": png_base64(4, 4),
            "config": {"pos_x": 0, "pos_y": 0, "scale": 1}
        });
        let pkg = MapPackage::from_json_value(&payload, "empty").expect("package");
        assert!(pkg.entities.is_empty());
        assert_eq!(pkg.height_range(), HeightRange::new(0.0, 0.0));
    }

    #[test]
    fn broken_inputs_are_reported() {
        let no_image = json!({"config": {"pos_x": 0, "pos_y": 0, "scale": 1}});
        assert!(matches!(
            MapPackage::from_json_value(&no_image, "x"),
            Err(FormatError::MissingField("background_image"))
        ));

        let bad_scale = json!({
            "background_image": png_base64(2, 2),
            "config": {"pos_x": 0, "pos_y": 0, "scale": "big"}
        });
        assert!(matches!(
            MapPackage::from_json_value(&bad_scale, "x"),
            Err(FormatError::InvalidNumber { field: "scale", .. })
        ));

        assert!(matches!(
            BackgroundImage::from_base64("not base64!"),
            Err(FormatError::Base64(_))
        ));
        assert!(MapPackage::from_json_str("{", "x").is_err());
    }
}
