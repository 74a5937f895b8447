/// World-space placement of the background image.
///
/// `pos_x`/`pos_y` locate the image's top-left corner in world units and `scale`
/// is the number of world units per image pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapDefinition {
    pub pos_x: f64,
    pub pos_y: f64,
    pub scale: f64,
}

impl MapDefinition {
    pub fn new(pos_x: f64, pos_y: f64, scale: f64) -> Self {
        Self { pos_x, pos_y, scale }
    }
}

/// Natural pixel size of a decoded image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height over width, or `None` for an empty image.
    pub fn aspect(&self) -> Option<f64> {
        if self.width == 0 {
            return None;
        }
        Some(self.height as f64 / self.width as f64)
    }
}

/// Axis-aligned world rectangle covered by the background image.
///
/// World Y grows upward, so `max_y` is the image's top edge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl WorldBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn from_map(map: MapDefinition, image: ImageSize) -> Self {
        Self {
            min_x: map.pos_x,
            max_x: map.pos_x + image.width as f64 * map.scale,
            min_y: map.pos_y - image.height as f64 * map.scale,
            max_y: map.pos_y,
        }
    }

    pub fn span_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn span_y(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when either span is zero or not finite; such bounds cannot project.
    pub fn is_degenerate(&self) -> bool {
        let (sx, sy) = (self.span_x(), self.span_y());
        !sx.is_finite() || !sy.is_finite() || sx == 0.0 || sy == 0.0
    }
}

/// Inclusive height interval used by the colour ramp and the range gate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeightRange {
    pub min: f64,
    pub max: f64,
}

impl HeightRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, h: f64) -> bool {
        h >= self.min && h <= self.max
    }

    /// Integer-aligned range covering all `heights`: `floor(min)..=ceil(max)`.
    ///
    /// Returns `None` when the iterator yields no finite value.
    pub fn covering(heights: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for h in heights.into_iter().filter(|h| h.is_finite()) {
            lo = lo.min(h);
            hi = hi.max(h);
        }
        if lo > hi {
            return None;
        }
        Some(Self::new(lo.floor(), hi.ceil()))
    }
}

impl Default for HeightRange {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{HeightRange, ImageSize, MapDefinition, WorldBounds};

    #[test]
    fn bounds_follow_map_definition() {
        let map = MapDefinition::new(-100.0, 50.0, 2.0);
        let b = WorldBounds::from_map(map, ImageSize::new(10, 20));
        assert_eq!(b, WorldBounds::new(-100.0, -80.0, 10.0, 50.0));
        assert!(!b.is_degenerate());
    }

    #[test]
    fn zero_scale_is_degenerate() {
        let map = MapDefinition::new(0.0, 0.0, 0.0);
        let b = WorldBounds::from_map(map, ImageSize::new(10, 10));
        assert!(b.is_degenerate());

        let nan = WorldBounds::new(0.0, f64::NAN, 0.0, 1.0);
        assert!(nan.is_degenerate());
    }

    #[test]
    fn covering_range_is_integer_aligned() {
        let r = HeightRange::covering([1.5, -2.25, 7.1]).expect("range");
        assert_eq!(r, HeightRange::new(-3.0, 8.0));
        assert!(HeightRange::covering(std::iter::empty()).is_none());
        assert!(r.contains(-3.0) && r.contains(8.0) && !r.contains(8.01));
    }

    #[test]
    fn image_aspect() {
        assert_eq!(ImageSize::new(200, 100).aspect(), Some(0.5));
        assert_eq!(ImageSize::new(0, 100).aspect(), None);
    }
}
