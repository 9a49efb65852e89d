//! User-drawn guide strokes that locally bend the sampled flow.

/// Strokes kept before the oldest is evicted.
pub const MAX_SHAPES: usize = 8;
/// Distance (px) within which a stroke steers the flow.
pub const INFLUENCE_RADIUS: f64 = 36.0;
/// Blend factor toward the stroke tangent at zero distance.
pub const STRENGTH: f64 = 0.5;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicShape {
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
}

/// Bounded history of strokes, oldest first.
#[derive(Clone, Debug, Default)]
pub struct ShapeHistory {
    shapes: Vec<DynamicShape>,
}

impl ShapeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new stroke at (x, y).
    pub fn start(&mut self, x: f64, y: f64) {
        self.shapes.push(DynamicShape {
            points: vec![(x, y)],
            closed: false,
        });
        self.evict();
    }

    /// Extend the most recent stroke. No-op without one.
    pub fn append(&mut self, x: f64, y: f64) {
        if let Some(cur) = self.shapes.last_mut() {
            cur.points.push((x, y));
        }
    }

    /// Close the most recent stroke. No-op without one.
    pub fn end(&mut self) {
        if let Some(cur) = self.shapes.last_mut() {
            cur.closed = true;
        }
        self.evict();
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn shapes(&self) -> &[DynamicShape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn evict(&mut self) {
        if self.shapes.len() > MAX_SHAPES {
            let excess = self.shapes.len() - MAX_SHAPES;
            self.shapes.drain(..excess);
        }
    }

    /// Bend `v` toward the tangent of the nearest qualifying segment.
    ///
    /// Strokes are visited newest first and the first segment within
    /// [`INFLUENCE_RADIUS`] wins; later strokes never stack.
    pub fn steer(&self, x: f64, y: f64, v: (f64, f64)) -> (f64, f64) {
        for shape in self.shapes.iter().rev() {
            for seg in shape.points.windows(2) {
                let ((ax, ay), (bx, by)) = (seg[0], seg[1]);
                let (dx, dy) = (bx - ax, by - ay);
                let len2 = dx * dx + dy * dy;
                if len2 < 1e-6 {
                    continue;
                }
                let t = (((x - ax) * dx + (y - ay) * dy) / len2).clamp(0.0, 1.0);
                let (px, py) = (ax + t * dx, ay + t * dy);
                let dist = (x - px).hypot(y - py);
                if dist < INFLUENCE_RADIUS {
                    let frac = (1.0 - dist / INFLUENCE_RADIUS) * STRENGTH;
                    let tl = len2.sqrt() + 1e-6;
                    let (tx, ty) = (dx / tl, dy / tl);
                    let speed = v.0.hypot(v.1) + 1e-6;
                    return (
                        v.0 * (1.0 - frac) + tx * speed * frac,
                        v.1 * (1.0 - frac) + ty * speed * frac,
                    );
                }
            }
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_append_end() {
        let mut h = ShapeHistory::new();
        h.start(1.0, 2.0);
        h.append(3.0, 4.0);
        assert!(!h.shapes()[0].closed);
        h.end();
        assert_eq!(h.shapes()[0].points, vec![(1.0, 2.0), (3.0, 4.0)]);
        assert!(h.shapes()[0].closed);
    }

    #[test]
    fn test_append_without_stroke_is_noop() {
        let mut h = ShapeHistory::new();
        h.append(1.0, 1.0);
        h.end();
        assert!(h.is_empty());
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut h = ShapeHistory::new();
        for i in 0..9 {
            h.start(i as f64, 0.0);
        }
        assert_eq!(h.len(), MAX_SHAPES);
        // Index 0 is the second-oldest stroke started.
        assert_eq!(h.shapes()[0].points[0], (1.0, 0.0));
        assert_eq!(h.shapes()[7].points[0], (8.0, 0.0));
    }

    #[test]
    fn test_steer_far_is_identity() {
        let mut h = ShapeHistory::new();
        h.start(0.0, 0.0);
        h.append(100.0, 0.0);
        assert_eq!(h.steer(50.0, 80.0, (10.0, 5.0)), (10.0, 5.0));
    }

    #[test]
    fn test_steer_on_stroke_bends_half_way() {
        let mut h = ShapeHistory::new();
        h.start(0.0, 0.0);
        h.append(0.0, 100.0); // tangent +y
        let (vx, vy) = h.steer(0.0, 50.0, (10.0, 0.0));
        assert!((vx - 5.0).abs() < 1e-6, "vx={}", vx);
        assert!((vy - 5.0).abs() < 1e-4, "vy={}", vy);
    }

    #[test]
    fn test_newest_stroke_wins() {
        let mut h = ShapeHistory::new();
        h.start(0.0, 0.0);
        h.append(0.0, 100.0); // +y
        h.end();
        h.start(0.0, 100.0);
        h.append(0.0, 0.0); // -y, same place
        h.end();
        let (_, vy) = h.steer(0.0, 50.0, (10.0, 0.0));
        assert!(vy < 0.0, "most recent stroke should dominate, vy={}", vy);
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let mut h = ShapeHistory::new();
        h.start(5.0, 5.0);
        h.append(5.0, 5.0);
        assert_eq!(h.steer(5.0, 5.0, (3.0, 4.0)), (3.0, 4.0));
    }
}
