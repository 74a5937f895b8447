//! Frame painter: turns the current viewer state into a `RenderFrame`.
//!
//! Paint order (back to front):
//! 1. clear + background image
//! 2. height-coloured dots (every admitted entity of an enabled dataset)
//! 3. zipline paths (first zipline rule, when enabled)
//! 4. entity-type overlays, in rule order

use foundation::bounds::{ImageSize, MapDefinition, WorldBounds};
use foundation::color::HeightColourMap;
use foundation::math::{CanvasProjection, CanvasSize, Vec2, ViewTransform};
use layers::labels::resolve_label;
use layers::symbology::{EntityTypeSet, RenderKind};
use layers::zipline::ZipSegment;
use runtime::Frame;
use scene::World;
use scene::entity::Entity;
use scene::query::EntityPredicate;
use thiserror::Error;

use crate::commands::{DrawCommand, RenderFrame, Stroke};
use crate::icons::IconCache;

pub const DEFAULT_HEIGHT_DOT_RADIUS_PX: f64 = 5.0;

/// Why a frame produced no commands. Not a failure: the caller just waits for more state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no map definition loaded")]
    NoMap,
    #[error("no background image loaded")]
    NoImage,
    #[error("map bounds have zero or non-finite extent")]
    DegenerateBounds,
    #[error("canvas has no area")]
    EmptyCanvas,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaintOptions {
    /// Height-dot radius in screen pixels.
    pub height_dot_radius_px: f64,
    /// Apply the filter/range predicate to entity-type overlays too.
    pub overlay_gating: bool,
}

impl Default for PaintOptions {
    fn default() -> Self {
        Self {
            height_dot_radius_px: DEFAULT_HEIGHT_DOT_RADIUS_PX,
            overlay_gating: false,
        }
    }
}

/// Everything one paint reads. Nothing here is mutated.
pub struct PaintInputs<'a, I> {
    pub map: Option<MapDefinition>,
    pub image: Option<ImageSize>,
    pub canvas: CanvasSize,
    pub view: ViewTransform,
    pub world: &'a World,
    pub predicate: EntityPredicate<'a>,
    pub colours: &'a HeightColourMap,
    pub types: &'a EntityTypeSet,
    pub ziplines: &'a [ZipSegment],
    pub icons: &'a IconCache<I>,
    pub options: PaintOptions,
}

/// Screen-space projection for one frame: world → canvas from fresh bounds, then the
/// live view transform.
struct FrameProjection {
    canvas: CanvasProjection,
    view: ViewTransform,
}

impl FrameProjection {
    fn to_screen(&self, world: Vec2) -> Vec2 {
        self.view.canvas_to_screen(self.canvas.world_to_canvas(world))
    }
}

pub fn paint_frame<I>(inputs: &PaintInputs<'_, I>, frame: Frame) -> Result<RenderFrame, SkipReason> {
    let map = inputs.map.ok_or(SkipReason::NoMap)?;
    let image = inputs.image.ok_or(SkipReason::NoImage)?;
    if inputs.canvas.is_empty() {
        return Err(SkipReason::EmptyCanvas);
    }
    let bounds = WorldBounds::from_map(map, image);
    let canvas =
        CanvasProjection::new(bounds, inputs.canvas).ok_or(SkipReason::DegenerateBounds)?;
    let proj = FrameProjection {
        canvas,
        view: inputs.view,
    };

    let mut out = RenderFrame::new(frame);
    out.push(DrawCommand::Clear {
        width: inputs.canvas.width,
        height: inputs.canvas.height,
    });
    out.push(DrawCommand::Background {
        origin: proj.view.canvas_to_screen(Vec2::default()),
        width: inputs.canvas.width * proj.view.scale,
        height: inputs.canvas.height * proj.view.scale,
    });

    paint_height_dots(inputs, &proj, &mut out);
    paint_ziplines(inputs, &proj, &mut out);
    paint_overlays(inputs, &proj, &mut out);

    tracing::trace!(frame = frame.index, commands = out.commands.len(), "frame painted");
    Ok(out)
}

fn paint_height_dots<I>(inputs: &PaintInputs<'_, I>, proj: &FrameProjection, out: &mut RenderFrame) {
    for (_, e) in inputs.world.active_entities() {
        if !inputs.predicate.admits(e) {
            continue;
        }
        out.push(DrawCommand::Circle {
            center: proj.to_screen(e.position()),
            radius: inputs.options.height_dot_radius_px,
            fill: Some(inputs.colours.colour_at(e.h).to_string()),
            stroke: None,
        });
    }
}

fn paint_ziplines<I>(inputs: &PaintInputs<'_, I>, proj: &FrameProjection, out: &mut RenderFrame) {
    let Some(style) = inputs.types.active_zipline() else {
        return;
    };
    for seg in inputs.ziplines {
        out.push(DrawCommand::Polyline {
            points: seg.points.iter().map(|p| proj.to_screen(*p)).collect(),
            stroke: Stroke::new(style.color.clone(), style.line_width_px),
        });
    }
}

fn paint_overlays<I>(inputs: &PaintInputs<'_, I>, proj: &FrameProjection, out: &mut RenderFrame) {
    let zoom = proj.view.scale;
    for (slot, rule) in inputs.types.overlays() {
        for (_, e) in inputs.world.active_entities() {
            if inputs.options.overlay_gating && !inputs.predicate.admits(e) {
                continue;
            }
            if !rule.matcher.matches(e) {
                continue;
            }
            let at = proj.to_screen(e.position());
            if let Some(cmd) = overlay_command(inputs, proj, slot, &rule.kind, e, at, zoom) {
                out.push(cmd);
                if let RenderKind::Dot(dot) = &rule.kind
                    && let Some(inner) = &dot.inner
                {
                    out.push(DrawCommand::Circle {
                        center: at,
                        radius: inner.radius_px,
                        fill: Some(inner.color.clone()),
                        stroke: None,
                    });
                }
            }
        }
    }
}

fn overlay_command<I>(
    inputs: &PaintInputs<'_, I>,
    proj: &FrameProjection,
    slot: usize,
    kind: &RenderKind,
    e: &Entity,
    at: Vec2,
    zoom: f64,
) -> Option<DrawCommand> {
    match kind {
        RenderKind::Icon(style) => {
            let images = inputs.icons.ready(slot)?;
            let tinted = style.tint.is_some() && images.tinted.is_some();
            let half = style.size_px / 2.0;
            Some(DrawCommand::Icon {
                slot,
                tinted,
                origin: Vec2::new(at.x - half, at.y - half),
                size: style.size_px,
            })
        }
        RenderKind::Circle(style) => {
            let world_r = style.radius.radius_for(e)?;
            Some(DrawCommand::Circle {
                center: at,
                radius: proj.canvas.world_len_to_canvas(world_r) * zoom,
                fill: Some(style.fill.clone()),
                // Stroke width shrinks with zoom, matching the established map look.
                stroke: Some(Stroke::new(style.stroke.clone(), style.stroke_width / zoom)),
            })
        }
        RenderKind::Dot(style) => Some(DrawCommand::Circle {
            center: at,
            radius: style.outer_radius_px,
            fill: Some(style.outer_color.clone()),
            stroke: None,
        }),
        RenderKind::Text(style) => {
            let text = resolve_label(style, e)?;
            Some(DrawCommand::Text {
                text,
                position: Vec2::new(at.x + style.offset_x, at.y + style.offset_y),
                font_size: style.font_size_at(zoom),
                font_family: style.font_family.clone(),
                color: style.color.clone(),
                align: style.align.clone(),
                baseline: style.baseline.clone(),
            })
        }
        RenderKind::Zipline(_) => None,
    }
}
