use anyhow::{anyhow, Context};
use nalgebra::Point2;
use std::path::Path;
use tiny_skia::{ColorU8, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::{Canvas, StrokeStyle};
use crate::io::input::FrameImage;

/// Pixel canvas holding one displayed frame, optionally upscaled by an integer factor.
pub struct RasterCanvas {
    pixmap: Pixmap,
    scale: u32,
    stroked: usize,
}

impl RasterCanvas {
    /// Black canvas, used in place of a frame that does not exist.
    pub fn blank(cols: usize, rows: usize, scale: u32) -> anyhow::Result<Self> {
        let scale = scale.max(1);
        let (w, h) = (cols as u32 * scale, rows as u32 * scale);
        let mut pixmap =
            Pixmap::new(w, h).ok_or_else(|| anyhow!("cannot allocate a {}x{} canvas", w, h))?;
        pixmap.fill(tiny_skia::Color::BLACK);
        Ok(Self {
            pixmap,
            scale,
            stroked: 0,
        })
    }

    /// Greyscale frame stretched between its minimum and maximum intensities.
    pub fn from_frame(frame: &FrameImage, scale: u32) -> anyhow::Result<Self> {
        let mut canvas = Self::blank(frame.cols(), frame.rows(), scale)?;
        let grey = frame.to_grey_u8();
        let scale = canvas.scale as usize;
        let width = canvas.pixmap.width() as usize;
        let pixels = canvas.pixmap.pixels_mut();
        for (i, px) in pixels.iter_mut().enumerate() {
            let (x, y) = (i % width, i / width);
            let v = grey[(y / scale) * frame.cols() + x / scale];
            *px = ColorU8::from_rgba(v, v, v, 255).premultiply();
        }
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Number of paths stroked so far.
    pub fn stroked_paths(&self) -> usize {
        self.stroked
    }

    /// RGBA value at canvas pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    pub fn to_image(&self) -> anyhow::Result<image::RgbaImage> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image::RgbaImage::from_raw(self.width(), self.height(), data)
            .ok_or_else(|| anyhow!("canvas buffer does not match its dimensions"))
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        self.to_image()?
            .save(path.as_ref())
            .with_context(|| format!("failed to write {}", path.as_ref().display()))
    }

    /// Image coordinate to canvas coordinate: pixel `(c, r)` covers `[c, c+1) x [r, r+1)`.
    fn to_canvas(&self, p: &Point2<f64>) -> (f32, f32) {
        let s = self.scale as f64;
        (((p.x + 0.5) * s) as f32, ((p.y + 0.5) * s) as f32)
    }
}

impl Canvas for RasterCanvas {
    fn stroke_polyline(&mut self, points: &[Point2<f64>], style: &StrokeStyle) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut pb = PathBuilder::new();
        let (x, y) = self.to_canvas(first);
        pb.move_to(x, y);
        for p in rest {
            let (x, y) = self.to_canvas(p);
            pb.line_to(x, y);
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        let [r, g, b] = style.color;
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: style.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        self.stroked += 1;
    }
}
