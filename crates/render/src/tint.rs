//! Icon tinting: screen-blend a flat colour over the icon, then keep the icon's own alpha.

use image::{Rgba, RgbaImage};

/// Parses `#rgb` or `#rrggbb`. Other CSS colour forms are not tintable.
pub fn parse_hex_colour(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().strip_prefix('#')?;
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    match hex.as_bytes() {
        [r, g, b] => Some([nibble(*r)? * 17, nibble(*g)? * 17, nibble(*b)? * 17]),
        [r1, r2, g1, g2, b1, b2] => Some([
            nibble(*r1)? << 4 | nibble(*r2)?,
            nibble(*g1)? << 4 | nibble(*g2)?,
            nibble(*b1)? << 4 | nibble(*b2)?,
        ]),
        _ => None,
    }
}

fn screen(a: u8, b: u8) -> u8 {
    let inv = (255 - a as u16) * (255 - b as u16) / 255;
    (255 - inv) as u8
}

pub fn tint_icon(base: &RgbaImage, tint: [u8; 3]) -> RgbaImage {
    let mut out = base.clone();
    for px in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *px;
        *px = Rgba([screen(r, tint[0]), screen(g, tint[1]), screen(b, tint[2]), a]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_hex_colour, tint_icon};
    use image::{Rgba, RgbaImage};

    #[test]
    fn hex_forms() {
        assert_eq!(parse_hex_colour("#f80"), Some([255, 136, 0]));
        assert_eq!(parse_hex_colour("#1a2B3c"), Some([0x1a, 0x2b, 0x3c]));
        assert_eq!(parse_hex_colour("orange"), None);
        assert_eq!(parse_hex_colour("#12345"), None);
        assert_eq!(parse_hex_colour("#zzz"), None);
    }

    #[test]
    fn tint_keeps_alpha_and_lightens() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([100, 100, 100, 0]));
        let out = tint_icon(&img, [255, 0, 128]);

        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 128, 255]));
        let Rgba([r, g, _, a]) = *out.get_pixel(1, 0);
        assert_eq!((r, g, a), (255, 100, 0));
    }
}
