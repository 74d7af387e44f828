//! Erasable surface abstraction and its `<canvas>` implementation.

use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use super::geometry::Point;
use crate::error::CardError;

/// Subtractive drawing target. Every operation removes pixels (makes them fully
/// transparent); nothing is ever painted over the cover once it is up.
pub trait Surface {
    fn erase_disc(&mut self, center: Point, radius: f64) -> Result<(), CardError>;
    /// Round-capped segment between two points.
    fn erase_segment(&mut self, from: Point, to: Point, width: f64) -> Result<(), CardError>;
    fn clear(&mut self) -> Result<(), CardError>;
}

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        Self { ctx, width, height }
    }

    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    /// Run `draw` under a destination-out composite, restoring the previous
    /// context state whatever happens.
    fn subtractive<F>(&self, draw: F) -> Result<(), CardError>
    where
        F: FnOnce(&CanvasRenderingContext2d) -> Result<(), CardError>,
    {
        self.ctx.save();
        let res = self
            .ctx
            .set_global_composite_operation("destination-out")
            .map_err(CardError::from)
            .and_then(|_| draw(&self.ctx));
        self.ctx.restore();
        res
    }
}

impl Surface for CanvasSurface {
    fn erase_disc(&mut self, center: Point, radius: f64) -> Result<(), CardError> {
        self.subtractive(|ctx| {
            ctx.begin_path();
            ctx.arc(center.x, center.y, radius, 0.0, TAU)
                .map_err(|e| CardError::Draw(format!("arc: {:?}", e)))?;
            ctx.fill();
            Ok(())
        })
    }

    fn erase_segment(&mut self, from: Point, to: Point, width: f64) -> Result<(), CardError> {
        self.subtractive(|ctx| {
            ctx.set_line_width(width);
            ctx.set_line_cap("round");
            ctx.begin_path();
            ctx.move_to(from.x, from.y);
            ctx.line_to(to.x, to.y);
            ctx.stroke();
            Ok(())
        })
    }

    fn clear(&mut self) -> Result<(), CardError> {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
        Ok(())
    }
}
