use foundation::math::Vec2;
use runtime::Frame;

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
        }
    }
}

/// Backend-neutral 2D drawing operation. All coordinates and sizes are screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        width: f64,
        height: f64,
    },
    /// The background image stretched over this screen rectangle.
    Background {
        origin: Vec2,
        width: f64,
        height: f64,
    },
    Circle {
        center: Vec2,
        radius: f64,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    Polyline {
        points: Vec<Vec2>,
        stroke: Stroke,
    },
    /// Square icon for entity-type entry `slot`, top-left at `origin`.
    Icon {
        slot: usize,
        tinted: bool,
        origin: Vec2,
        size: f64,
    },
    Text {
        text: String,
        position: Vec2,
        font_size: f64,
        font_family: String,
        color: String,
        align: String,
        baseline: String,
    },
}

/// Commands for one paint, in back-to-front order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub frame: Frame,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }
}
