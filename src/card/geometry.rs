//! Points and the client → surface coordinate mapping.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen placement of a canvas (CSS pixels), as reported by
/// `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Map a client-space pointer position into backing-store pixels.
///
/// The canvas may be rendered at a different size than its backing resolution
/// (CSS scaling, device pixel ratio), so the offset is rescaled per axis. A
/// collapsed rect (zero width or height) leaves that axis unscaled.
pub fn to_surface(client: Point, rect: &ScreenRect, backing: (f64, f64)) -> Point {
    let sx = if rect.width > 0.0 { backing.0 / rect.width } else { 1.0 };
    let sy = if rect.height > 0.0 { backing.1 / rect.height } else { 1.0 };
    Point::new((client.x - rect.left) * sx, (client.y - rect.top) * sy)
}

/// Normalize a rect's center against the viewport (0..1 per axis), the origin
/// format particle libraries expect.
pub fn viewport_origin(rect: &ScreenRect, viewport: (f64, f64)) -> Point {
    let c = rect.center();
    let nx = if viewport.0 > 0.0 { c.x / viewport.0 } else { 0.5 };
    let ny = if viewport.1 > 0.0 { c.y / viewport.1 } else { 0.5 };
    Point::new(nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
}
