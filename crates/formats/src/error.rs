use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {0}")]
    Shape(&'static str),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("background image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to read background image header: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported background image: {0}")]
    Image(#[from] image::ImageError),
}
