//! Colours and the height colour ramp.
//!
//! Colours stay symbolic (`hsl(...)` or a CSS string) so any 2D backend that speaks
//! CSS colour syntax can consume them unchanged.

use std::fmt;

use crate::bounds::HeightRange;

pub const DEFAULT_BELOW_COLOUR: &str = "#00ffff";
pub const DEFAULT_ABOVE_COLOUR: &str = "#ff00ff";

/// Hue at the bottom of the ramp (blue).
pub const RAMP_HUE_LOW_DEG: f64 = 240.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hsl {
    pub hue_deg: f64,
    pub saturation_pct: f64,
    pub lightness_pct: f64,
}

impl Hsl {
    pub fn new(hue_deg: f64, saturation_pct: f64, lightness_pct: f64) -> Self {
        Self {
            hue_deg,
            saturation_pct,
            lightness_pct,
        }
    }

    /// Fully saturated, mid-lightness hue.
    pub fn vivid(hue_deg: f64) -> Self {
        Self::new(hue_deg, 100.0, 50.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Colour {
    Hsl(Hsl),
    /// Any CSS colour literal, passed through verbatim.
    Css(String),
}

impl Colour {
    pub fn css(value: impl Into<String>) -> Self {
        Colour::Css(value.into())
    }

    pub fn hue(&self) -> Option<f64> {
        match self {
            Colour::Hsl(hsl) => Some(hsl.hue_deg),
            Colour::Css(_) => None,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colour::Hsl(c) => write!(
                f,
                "hsl({},{}%,{}%)",
                c.hue_deg, c.saturation_pct, c.lightness_pct
            ),
            Colour::Css(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Colour {
    fn from(value: &str) -> Self {
        Colour::Css(value.to_string())
    }
}

/// Maps heights onto a blue→red hue ramp with fixed colours outside the range.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightColourMap {
    pub range: HeightRange,
    pub below: Colour,
    pub above: Colour,
}

impl HeightColourMap {
    pub fn new(range: HeightRange, below: Colour, above: Colour) -> Self {
        Self {
            range,
            below,
            above,
        }
    }

    pub fn colour_at(&self, h: f64) -> Colour {
        let HeightRange { min, max } = self.range;
        if h < min {
            return self.below.clone();
        }
        if h > max {
            return self.above.clone();
        }
        let span = max - min;
        let t = if span == 0.0 { 0.0 } else { (h - min) / span };
        Colour::Hsl(Hsl::vivid(RAMP_HUE_LOW_DEG * (1.0 - t)))
    }

    /// Four stops: hard edges at 0% and 100% flank the continuous ramp.
    pub fn legend_stops(&self) -> [GradientStop; 4] {
        [
            GradientStop::new(0.0, self.below.clone()),
            GradientStop::new(0.0, self.colour_at(self.range.min)),
            GradientStop::new(1.0, self.colour_at(self.range.max)),
            GradientStop::new(1.0, self.above.clone()),
        ]
    }

    pub fn legend_css(&self) -> String {
        css_linear_gradient(&self.legend_stops())
    }
}

impl Default for HeightColourMap {
    fn default() -> Self {
        Self::new(
            HeightRange::default(),
            Colour::from(DEFAULT_BELOW_COLOUR),
            Colour::from(DEFAULT_ABOVE_COLOUR),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// 0.0..=1.0 along the gradient axis.
    pub offset: f64,
    pub colour: Colour,
}

impl GradientStop {
    pub fn new(offset: f64, colour: Colour) -> Self {
        Self { offset, colour }
    }
}

pub fn css_linear_gradient(stops: &[GradientStop]) -> String {
    let parts: Vec<String> = stops
        .iter()
        .map(|s| format!("{} {}%", s.colour, s.offset * 100.0))
        .collect();
    format!("linear-gradient(to right, {})", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::{Colour, HeightColourMap, Hsl};
    use crate::bounds::HeightRange;

    fn ramp(min: f64, max: f64) -> HeightColourMap {
        HeightColourMap::new(
            HeightRange::new(min, max),
            Colour::from("#00ffff"),
            Colour::from("#ff00ff"),
        )
    }

    #[test]
    fn endpoints_are_blue_and_red() {
        let m = ramp(0.0, 10.0);
        assert_eq!(m.colour_at(0.0).hue(), Some(240.0));
        assert_eq!(m.colour_at(10.0).hue(), Some(0.0));
        assert_eq!(m.colour_at(5.0).hue(), Some(120.0));
    }

    #[test]
    fn outside_range_uses_fixed_colours() {
        let m = ramp(0.0, 10.0);
        assert_eq!(m.colour_at(-0.5), Colour::from("#00ffff"));
        assert_eq!(m.colour_at(10.5), Colour::from("#ff00ff"));
    }

    #[test]
    fn hue_is_monotonic_over_range() {
        let m = ramp(-20.0, 30.0);
        let mut last = f64::INFINITY;
        for i in 0..=50 {
            let hue = m.colour_at(-20.0 + i as f64).hue().expect("in range");
            assert!(hue <= last);
            last = hue;
        }
    }

    #[test]
    fn flat_range_does_not_divide_by_zero() {
        let m = ramp(4.0, 4.0);
        let c = m.colour_at(4.0);
        assert_eq!(c, Colour::Hsl(Hsl::vivid(240.0)));
        assert_eq!(c.to_string(), "hsl(240,100%,50%)");
    }

    #[test]
    fn legend_has_hard_stops_at_edges() {
        let css = ramp(0.0, 10.0).legend_css();
        assert_eq!(
            css,
            "linear-gradient(to right, #00ffff 0%, hsl(240,100%,50%) 0%, hsl(0,100%,50%) 100%, #ff00ff 100%)"
        );
    }
}
