//! Rasterizer for certificate draw lists.

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use super::fonts::FontSet;
use super::layout::{Bounds, DrawOp, Stroke, HEIGHT, WIDTH};

/// Watermark layer padding around the measured text, and its fixed height.
const WATERMARK_PAD_X: i32 = 20;
const WATERMARK_PAD_Y: i32 = 10;
const WATERMARK_LAYER_HEIGHT: u32 = 80;

/// Execute `ops` in order on a fresh white canvas.
pub fn rasterize(fonts: &FontSet, ops: &[DrawOp]) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255]));

    for op in ops {
        match op {
            DrawOp::Gradient { top, bottom } => fill_gradient(&mut canvas, *top, *bottom),
            DrawOp::Rect {
                bounds,
                fill,
                outline,
            } => draw_rect(&mut canvas, *bounds, *fill, *outline),
            DrawOp::Circle {
                cx,
                cy,
                radius,
                outline,
            } => draw_ring(&mut canvas, *cx, *cy, *radius, *outline),
            DrawOp::Text {
                x,
                y,
                text,
                size,
                color,
            } => draw_text(&mut canvas, fonts, *x, *y, text, *size, *color),
            DrawOp::Watermark {
                text,
                size,
                color,
                angle_degrees,
            } => {
                let layer = watermark_layer(fonts, text, *size, *color);
                let rotated = rotate_expand(&layer, *angle_degrees);
                let x = WIDTH as i32 / 2 - rotated.width() as i32 / 2;
                let y = HEIGHT as i32 / 2 - rotated.height() as i32 / 2;
                composite(&mut canvas, &rotated, x, y);
            }
        }
    }

    canvas
}

fn fill_gradient(canvas: &mut RgbImage, top: Rgb<u8>, bottom: Rgb<u8>) {
    let height = canvas.height();
    for y in 0..height {
        let ratio = y as f64 / height as f64;
        let channel = |i: usize| {
            let start = top.0[i] as f64;
            let end = bottom.0[i] as f64;
            (start + (end - start) * ratio) as u8
        };
        let color = Rgb([channel(0), channel(1), channel(2)]);
        for x in 0..canvas.width() {
            canvas.put_pixel(x, y, color);
        }
    }
}

fn put_clipped(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, color);
}

fn blend_clipped(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, alpha: f32) {
    if alpha <= 0.0 || x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32
    {
        return;
    }
    let alpha = alpha.min(1.0);
    let inv = 1.0 - alpha;
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        dst.0[i] = (color.0[i] as f32 * alpha + dst.0[i] as f32 * inv) as u8;
    }
}

/// Fill the inclusive rectangle, then stroke its outline inward.
fn draw_rect(canvas: &mut RgbImage, b: Bounds, fill: Option<Rgb<u8>>, outline: Option<Stroke>) {
    if let Some(color) = fill {
        for y in b.y0..=b.y1 {
            for x in b.x0..=b.x1 {
                put_clipped(canvas, x, y, color);
            }
        }
    }

    if let Some(Stroke { color, width }) = outline {
        let w = width as i32;
        for y in b.y0..=b.y1 {
            for x in b.x0..=b.x1 {
                let on_edge = x < b.x0 + w || x > b.x1 - w || y < b.y0 + w || y > b.y1 - w;
                if on_edge {
                    put_clipped(canvas, x, y, color);
                }
            }
        }
    }
}

/// Ring of `outline.width` pixels inside the circle of `radius`.
fn draw_ring(canvas: &mut RgbImage, cx: i32, cy: i32, radius: i32, outline: Stroke) {
    let outer = radius as f64;
    let inner = (radius - outline.width as i32) as f64;

    for y in cy - radius..=cy + radius {
        for x in cx - radius..=cx + radius {
            let dx = (x - cx) as f64;
            let dy = (y - cy) as f64;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= outer && distance > inner {
                put_clipped(canvas, x, y, outline.color);
            }
        }
    }
}

fn draw_text(
    canvas: &mut RgbImage,
    fonts: &FontSet,
    x: i32,
    y: i32,
    text: &str,
    size: f32,
    color: Rgb<u8>,
) {
    fonts.for_each_pixel(text, size, |dx, dy, coverage| {
        blend_clipped(canvas, x + dx, y + dy, color, coverage);
    });
}

/// Transparent layer holding the watermark text.
fn watermark_layer(fonts: &FontSet, text: &str, size: f32, color: Rgba<u8>) -> RgbaImage {
    let width = (fonts.measure(text, size).width() + 2 * WATERMARK_PAD_X).max(1) as u32;
    let mut layer = RgbaImage::new(width, WATERMARK_LAYER_HEIGHT);

    fonts.for_each_pixel(text, size, |dx, dy, coverage| {
        let x = WATERMARK_PAD_X + dx;
        let y = WATERMARK_PAD_Y + dy;
        if x < 0 || y < 0 || x >= layer.width() as i32 || y >= layer.height() as i32 {
            return;
        }
        let alpha = (color.0[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
        let dst = layer.get_pixel_mut(x as u32, y as u32);
        if alpha > dst.0[3] {
            *dst = Rgba([color.0[0], color.0[1], color.0[2], alpha]);
        }
    });

    layer
}

/// Rotate counter-clockwise around the center, growing the canvas to fit.
/// Sampling is nearest-neighbour; uncovered pixels stay transparent.
pub fn rotate_expand(layer: &RgbaImage, degrees: f32) -> RgbaImage {
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let (w, h) = (layer.width() as f64, layer.height() as f64);
    let new_w = expanded_side(w * cos.abs() + h * sin.abs());
    let new_h = expanded_side(w * sin.abs() + h * cos.abs());
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);

    let mut out = RgbaImage::new(new_w, new_h);
    for y in 0..new_h {
        for x in 0..new_w {
            let dx = x as f64 + 0.5 - ncx;
            let dy = y as f64 + 0.5 - ncy;
            let sx = dx * cos - dy * sin + cx;
            let sy = dx * sin + dy * cos + cy;
            if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                out.put_pixel(x, y, *layer.get_pixel(sx as u32, sy as u32));
            }
        }
    }

    out
}

/// Round a rotated extent up to whole pixels, ignoring float noise from
/// `sin`/`cos` at right angles.
fn expanded_side(extent: f64) -> u32 {
    (extent - 1e-6).ceil().max(1.0) as u32
}

/// Alpha-composite `over` onto the canvas with its top-left at `(x, y)`.
fn composite(canvas: &mut RgbImage, over: &RgbaImage, x: i32, y: i32) {
    for (ox, oy, pixel) in over.enumerate_pixels() {
        let alpha = pixel.0[3] as f32 / 255.0;
        let color = Rgb([pixel.0[0], pixel.0[1], pixel.0[2]]);
        blend_clipped(canvas, x + ox as i32, y + oy as i32, color, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLD: Rgb<u8> = Rgb([0xFF, 0xD7, 0x00]);

    fn blank() -> RgbImage {
        RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_gradient_interpolates_per_scanline() {
        let canvas = rasterize(
            &FontSet::builtin(),
            &[DrawOp::Gradient {
                top: Rgb([0, 0, 0]),
                bottom: Rgb([240, 120, 60]),
            }],
        );

        assert_eq!(*canvas.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(900, 600), Rgb([120, 60, 30]));
        assert_eq!(*canvas.get_pixel(5, 600), *canvas.get_pixel(1795, 600));
        // last scanline stops just short of the bottom color
        assert_eq!(*canvas.get_pixel(0, 1199), Rgb([239, 119, 59]));
    }

    #[test]
    fn test_rect_outline_is_drawn_inward() {
        let mut canvas = blank();
        draw_rect(
            &mut canvas,
            Bounds::new(100, 100, 200, 200),
            None,
            Some(Stroke {
                color: GOLD,
                width: 4,
            }),
        );

        assert_eq!(*canvas.get_pixel(100, 150), GOLD);
        assert_eq!(*canvas.get_pixel(103, 150), GOLD);
        assert_eq!(*canvas.get_pixel(104, 150), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(200, 200), GOLD);
        assert_eq!(*canvas.get_pixel(99, 150), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_rect_outside_canvas_is_clipped() {
        let mut canvas = blank();
        draw_rect(
            &mut canvas,
            Bounds::new(0, 0, WIDTH as i32, HEIGHT as i32),
            None,
            Some(Stroke {
                color: GOLD,
                width: 20,
            }),
        );
        assert_eq!(*canvas.get_pixel(1799, 600), GOLD);
        assert_eq!(*canvas.get_pixel(1780, 600), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(1781, 600), GOLD);
    }

    #[test]
    fn test_filled_rect_with_outline() {
        let mut canvas = blank();
        let fill = Rgb([10, 20, 30]);
        draw_rect(
            &mut canvas,
            Bounds::new(10, 10, 30, 30),
            Some(fill),
            Some(Stroke {
                color: GOLD,
                width: 2,
            }),
        );
        assert_eq!(*canvas.get_pixel(20, 20), fill);
        assert_eq!(*canvas.get_pixel(11, 20), GOLD);
    }

    #[test]
    fn test_ring_leaves_center_untouched() {
        let mut canvas = blank();
        draw_ring(
            &mut canvas,
            500,
            500,
            80,
            Stroke {
                color: GOLD,
                width: 6,
            },
        );
        assert_eq!(*canvas.get_pixel(500, 500), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(580, 500), GOLD);
        assert_eq!(*canvas.get_pixel(575, 500), GOLD);
        assert_eq!(*canvas.get_pixel(574, 500), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_text_is_painted() {
        let mut canvas = blank();
        draw_text(
            &mut canvas,
            &FontSet::builtin(),
            100,
            100,
            "I",
            20.0,
            Rgb([0, 0, 0]),
        );
        // builtin 'I' has a full-height middle column (column 2) at scale 2
        assert_eq!(*canvas.get_pixel(104, 100), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(100, 104), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_rotate_expand_square_bounds() {
        let layer = RgbaImage::from_pixel(100, 20, Rgba([1, 2, 3, 255]));
        let rotated = rotate_expand(&layer, 45.0);
        // (100 + 20) * cos(45)
        assert_eq!(rotated.width(), 85);
        assert_eq!(rotated.height(), 85);
        // corners are outside the rotated strip
        assert_eq!(rotated.get_pixel(0, 0).0[3], 0);
        assert_eq!(*rotated.get_pixel(42, 42), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_rotate_is_counter_clockwise() {
        // mark the right end of a horizontal strip
        let mut layer = RgbaImage::new(100, 10);
        for y in 0..10 {
            for x in 90..100 {
                layer.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let rotated = rotate_expand(&layer, 90.0);
        assert_eq!((rotated.width(), rotated.height()), (10, 100));
        // after a quarter turn counter-clockwise the right end points up
        assert_eq!(rotated.get_pixel(5, 2).0[3], 255);
        assert_eq!(rotated.get_pixel(5, 97).0[3], 0);
    }

    #[test]
    fn test_watermark_is_translucent() {
        let fonts = FontSet::builtin();
        let mut canvas = blank();
        let layer = watermark_layer(&fonts, "W", 60.0, Rgba([0, 0, 0, 50]));
        composite(&mut canvas, &layer, 0, 0);

        let darkest = canvas.pixels().map(|p| p.0[0]).min().unwrap();
        // 255 * (1 - 50/255) = 205, give or take float rounding
        assert!((204..=205).contains(&darkest));
    }
}
