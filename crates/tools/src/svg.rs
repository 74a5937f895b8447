//! Headless SVG backend for `RenderFrame`s.

use std::fmt::Write as _;

use foundation::math::CanvasSize;
use render::{DrawCommand, RenderFrame, Stroke};

/// Image references the frame's `Background` and `Icon` commands resolve to.
pub trait SvgImages {
    fn background_href(&self) -> Option<&str>;
    fn icon_href(&self, slot: usize, tinted: bool) -> Option<&str>;
}

pub fn frame_to_svg(frame: &RenderFrame, canvas: CanvasSize, images: &impl SvgImages) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        canvas.width, canvas.height, canvas.width, canvas.height
    );
    for cmd in &frame.commands {
        write_command(&mut out, cmd, images);
    }
    out.push_str("</svg>\n");
    out
}

fn write_command(out: &mut String, cmd: &DrawCommand, images: &impl SvgImages) {
    match cmd {
        DrawCommand::Clear { width, height } => {
            let _ = writeln!(out, r#"<rect width="{width}" height="{height}" fill="none"/>"#);
        }
        DrawCommand::Background {
            origin,
            width,
            height,
        } => {
            if let Some(href) = images.background_href() {
                let _ = writeln!(
                    out,
                    r#"<image x="{}" y="{}" width="{width}" height="{height}" preserveAspectRatio="none" href="{}"/>"#,
                    origin.x,
                    origin.y,
                    escape(href)
                );
            }
        }
        DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        } => {
            let _ = writeln!(
                out,
                r#"<circle cx="{}" cy="{}" r="{radius}" fill="{}"{}/>"#,
                center.x,
                center.y,
                escape(fill.as_deref().unwrap_or("none")),
                stroke_attrs(stroke.as_ref())
            );
        }
        DrawCommand::Polyline { points, stroke } => {
            let pts: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
            let _ = writeln!(
                out,
                r#"<polyline points="{}" fill="none"{}/>"#,
                pts.join(" "),
                stroke_attrs(Some(stroke))
            );
        }
        DrawCommand::Icon {
            slot,
            tinted,
            origin,
            size,
        } => {
            let href = images
                .icon_href(*slot, *tinted)
                .or_else(|| images.icon_href(*slot, false));
            if let Some(href) = href {
                let _ = writeln!(
                    out,
                    r#"<image x="{}" y="{}" width="{size}" height="{size}" href="{}"/>"#,
                    origin.x,
                    origin.y,
                    escape(href)
                );
            }
        }
        DrawCommand::Text {
            text,
            position,
            font_size,
            font_family,
            color,
            align,
            baseline,
        } => {
            let _ = writeln!(
                out,
                r#"<text x="{}" y="{}" font-size="{font_size}" font-family="{}" fill="{}" text-anchor="{}" dominant-baseline="{}">{}</text>"#,
                position.x,
                position.y,
                escape(font_family),
                escape(color),
                text_anchor(align),
                dominant_baseline(baseline),
                escape(text)
            );
        }
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    match stroke {
        Some(s) => format!(r#" stroke="{}" stroke-width="{}""#, escape(&s.color), s.width),
        None => String::new(),
    }
}

/// Canvas `textAlign` to SVG `text-anchor`.
fn text_anchor(align: &str) -> &'static str {
    match align {
        "left" | "start" => "start",
        "right" | "end" => "end",
        _ => "middle",
    }
}

/// Canvas `textBaseline` to SVG `dominant-baseline`.
fn dominant_baseline(baseline: &str) -> &'static str {
    match baseline {
        "top" | "hanging" => "hanging",
        "bottom" | "ideographic" => "text-after-edge",
        "alphabetic" => "alphabetic",
        _ => "middle",
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{SvgImages, frame_to_svg};
    use foundation::math::{CanvasSize, Vec2};
    use pretty_assertions::assert_eq;
    use render::{DrawCommand, RenderFrame, Stroke};
    use runtime::Frame;

    struct Images;

    impl SvgImages for Images {
        fn background_href(&self) -> Option<&str> {
            Some("data:image/png;base64,AAAA")
        }

        fn icon_href(&self, slot: usize, tinted: bool) -> Option<&str> {
            match (slot, tinted) {
                (0, false) => Some("bin.png"),
                _ => None,
            }
        }
    }

    #[test]
    fn commands_become_svg_elements_in_order() {
        let mut frame = RenderFrame::new(Frame::new(0));
        frame.push(DrawCommand::Clear {
            width: 10.0,
            height: 5.0,
        });
        frame.push(DrawCommand::Background {
            origin: Vec2::new(0.0, 0.0),
            width: 10.0,
            height: 5.0,
        });
        frame.push(DrawCommand::Circle {
            center: Vec2::new(1.0, 2.0),
            radius: 5.0,
            fill: Some("hsl(240,100%,50%)".into()),
            stroke: None,
        });
        frame.push(DrawCommand::Polyline {
            points: vec![Vec2::new(0.0, 0.0), Vec2::new(3.5, 4.0)],
            stroke: Stroke::new("orange", 2.0),
        });
        frame.push(DrawCommand::Icon {
            slot: 0,
            tinted: true,
            origin: Vec2::new(-2.0, -2.0),
            size: 4.0,
        });
        frame.push(DrawCommand::Text {
            text: "A & B".into(),
            position: Vec2::new(1.0, 1.0),
            font_size: 14.0,
            font_family: "Arial".into(),
            color: "#fff".into(),
            align: "center".into(),
            baseline: "middle".into(),
        });

        let svg = frame_to_svg(&frame, CanvasSize::new(10.0, 5.0), &Images);
        let lines: Vec<&str> = svg.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5" viewBox="0 0 10 5">"#,
                r#"<rect width="10" height="5" fill="none"/>"#,
                r#"<image x="0" y="0" width="10" height="5" preserveAspectRatio="none" href="data:image/png;base64,AAAA"/>"#,
                r#"<circle cx="1" cy="2" r="5" fill="hsl(240,100%,50%)"/>"#,
                r#"<polyline points="0,0 3.5,4" fill="none" stroke="orange" stroke-width="2"/>"#,
                r#"<image x="-2" y="-2" width="4" height="4" href="bin.png"/>"#,
                r##"<text x="1" y="1" font-size="14" font-family="Arial" fill="#fff" text-anchor="middle" dominant-baseline="middle">A &amp; B</text>"##,
                "</svg>",
            ]
        );
    }
}
