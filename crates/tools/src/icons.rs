//! Resolves icon load requests from disk into data URIs for the SVG backend.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use image::ImageFormat;
use render::IconRequest;
use render::tint::{parse_hex_colour, tint_icon};

/// Loaded icon as a self-contained `data:` URI.
pub type IconHref = String;

pub fn data_uri(bytes: &[u8]) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        _ => "application/octet-stream",
    };
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Loads one icon relative to `root`, plus its tinted variant when the request has a
/// tint in `#rgb`/`#rrggbb` form.
pub fn load_icon(root: &Path, request: &IconRequest) -> Result<(IconHref, Option<IconHref>), String> {
    let path = root.join(&request.source);
    let bytes = fs::read(&path).map_err(|e| format!("read {path:?}: {e}"))?;
    let base = data_uri(&bytes);

    let Some(tint) = request.tint.as_deref() else {
        return Ok((base, None));
    };
    let Some(rgb) = parse_hex_colour(tint) else {
        tracing::warn!(icon = %request.source, tint, "unsupported tint colour; using base icon");
        return Ok((base, None));
    };
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| format!("decode {path:?}: {e}"))?
        .to_rgba8();
    let mut png = Vec::new();
    tint_icon(&decoded, rgb)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| format!("encode tinted {path:?}: {e}"))?;
    Ok((base, Some(data_uri(&png))))
}

#[cfg(test)]
mod tests {
    use super::{data_uri, load_icon};
    use foundation::handles::Handle;
    use image::{ImageFormat, Rgba, RgbaImage};
    use render::IconRequest;
    use std::io::Cursor;

    fn write_png(dir: &std::path::Path, name: &str) {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        std::fs::write(dir.join(name), buf).expect("write png");
    }

    fn request(source: &str, tint: Option<&str>) -> IconRequest {
        IconRequest {
            ticket: Handle::new(0, 1),
            source: source.into(),
            tint: tint.map(str::to_string),
        }
    }

    #[test]
    fn png_bytes_get_png_mime() {
        assert!(data_uri(b"\x89PNG\r\n\x1a\n....").starts_with("data:image/png;base64,"));
        assert!(data_uri(b"nope").starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn tinted_variant_only_for_hex_tints() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dir = tmp.path();
        write_png(dir, "bin.png");

        let (base, tinted) = load_icon(dir, &request("bin.png", Some("#f00"))).expect("load");
        assert!(base.starts_with("data:image/png"));
        assert!(tinted.is_some_and(|t| t != base));

        let (_, tinted) = load_icon(dir, &request("bin.png", Some("orange"))).expect("load");
        assert!(tinted.is_none());

        assert!(load_icon(dir, &request("missing.png", None)).is_err());
    }
}
