use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormatError;
use crate::lenient::{de_opt_f64, de_opt_text, de_truthy};

/// One raw entity-type record as authored in `entity-types.json`.
///
/// Every field is optional on the wire; `layers::symbology` decides which ones a given
/// `render_type` requires. Numeric style fields accept numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityTypeRecord {
    pub nickname: String,
    pub render_type: String,
    pub field: Option<String>,
    #[serde(deserialize_with = "de_opt_text")]
    pub value: Option<String>,
    pub value_regex: Option<String>,

    pub icon: Option<String>,
    pub tint_color: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub size: Option<f64>,

    #[serde(deserialize_with = "de_opt_f64")]
    pub radius: Option<f64>,
    pub radius_field: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub stroke_width: Option<f64>,

    #[serde(deserialize_with = "de_opt_f64")]
    pub outer_radius: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub inner_radius: Option<f64>,
    pub outer_color: Option<String>,
    pub inner_color: Option<String>,

    #[serde(deserialize_with = "de_opt_text")]
    pub text: Option<String>,
    pub text_field: Option<String>,
    pub regex_find: Option<String>,
    #[serde(deserialize_with = "de_opt_text")]
    pub regex_replace: Option<String>,
    #[serde(deserialize_with = "de_truthy")]
    pub replace_underscores: bool,
    pub case: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub font_size: Option<f64>,
    #[serde(deserialize_with = "de_truthy")]
    pub scale_with_zoom: bool,
    pub font_family: Option<String>,
    pub text_color: Option<String>,
    pub text_align: Option<String>,
    pub text_baseline: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub offset_x: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub offset_y: Option<f64>,

    pub color: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub line_width: Option<f64>,

    #[serde(deserialize_with = "de_truthy")]
    pub default_enabled: bool,
}

/// Parses an `entity-types.json` payload: a top-level array of records.
///
/// A record that is not an object fails the whole load; prior configuration stays in place
/// at the caller.
pub fn parse_entity_types(payload: &str) -> Result<Vec<EntityTypeRecord>, FormatError> {
    let value: Value = serde_json::from_str(payload)?;
    let Value::Array(items) = value else {
        return Err(FormatError::Shape("a JSON array of entity-type records"));
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(FormatError::from))
        .collect()
}
