//! Font loading, text measurement and glyph coverage.
//!
//! A TrueType face is picked from an ordered list of paths. When none of them load,
//! a builtin 5x7 bitmap face is scaled to the requested size instead.

use std::path::Path;

use rusttype::{point, Font, Scale};

/// Default search list for the certificate face.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/System/Library/Fonts/Times.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
    "arial.ttf",
    "times.ttf",
];

/// Horizontal extent of a string as drawn from origin `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub left: i32,
    pub right: i32,
}

impl TextExtent {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

enum Face {
    TrueType(Font<'static>),
    Builtin,
}

/// The face every certificate is rendered with.
pub struct FontSet {
    face: Face,
}

impl FontSet {
    /// Use the first path that holds a loadable font, or the builtin face.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Self {
        for path in paths {
            let path = path.as_ref();
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            match Font::try_from_vec(bytes) {
                Some(font) => {
                    tracing::info!("Using certificate font {:?}", path);
                    return Self {
                        face: Face::TrueType(font),
                    };
                }
                None => tracing::debug!("Skipping unreadable font {:?}", path),
            }
        }

        Self::builtin()
    }

    /// The builtin bitmap face. Rendering with it is independent of the host.
    pub fn builtin() -> Self {
        Self {
            face: Face::Builtin,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, Face::Builtin)
    }

    /// Measure the inked extent of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> TextExtent {
        match &self.face {
            Face::TrueType(font) => {
                let scale = Scale::uniform(size);
                let ascent = font.v_metrics(scale).ascent;
                let mut extent: Option<TextExtent> = None;

                for glyph in font.layout(text, scale, point(0.0, ascent)) {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        extent = Some(match extent {
                            Some(e) => TextExtent {
                                left: e.left.min(bb.min.x),
                                right: e.right.max(bb.max.x),
                            },
                            None => TextExtent {
                                left: bb.min.x,
                                right: bb.max.x,
                            },
                        });
                    }
                }

                extent.unwrap_or_default()
            }
            Face::Builtin => {
                let count = text.chars().count() as i32;
                if count == 0 {
                    return TextExtent::default();
                }
                let scale = builtin_scale(size);
                TextExtent {
                    left: 0,
                    right: (count * BUILTIN_ADVANCE - 1) * scale,
                }
            }
        }
    }

    /// Visit every covered pixel of `text` drawn with its top-left at `(0, 0)`.
    ///
    /// `plot` receives the pixel offset and a coverage in `0.0..=1.0`.
    pub fn for_each_pixel<F>(&self, text: &str, size: f32, mut plot: F)
    where
        F: FnMut(i32, i32, f32),
    {
        match &self.face {
            Face::TrueType(font) => {
                let scale = Scale::uniform(size);
                let ascent = font.v_metrics(scale).ascent;

                for glyph in font.layout(text, scale, point(0.0, ascent)) {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        glyph.draw(|gx, gy, v| {
                            plot(bb.min.x + gx as i32, bb.min.y + gy as i32, v);
                        });
                    }
                }
            }
            Face::Builtin => {
                let scale = builtin_scale(size);

                for (index, ch) in text.chars().enumerate() {
                    let columns = builtin_glyph(ch);
                    let origin_x = index as i32 * BUILTIN_ADVANCE * scale;

                    for (col, bits) in columns.iter().enumerate() {
                        for row in 0..8 {
                            if bits & (1 << row) == 0 {
                                continue;
                            }
                            for dy in 0..scale {
                                for dx in 0..scale {
                                    plot(
                                        origin_x + col as i32 * scale + dx,
                                        row * scale + dy,
                                        1.0,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Cell advance of the builtin face in unscaled pixels (5 columns + 1 gap).
const BUILTIN_ADVANCE: i32 = 6;

fn builtin_scale(size: f32) -> i32 {
    ((size / 10.0).round() as i32).max(1)
}

fn builtin_glyph(ch: char) -> &'static [u8; 5] {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        &BUILTIN_GLYPHS[(code - 0x20) as usize]
    } else {
        &BUILTIN_GLYPHS[('?' as u32 - 0x20) as usize]
    }
}

/// Column-major 5x7 glyphs for printable ASCII, least significant bit at the top.
#[rustfmt::skip]
const BUILTIN_GLYPHS: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x56, 0x20, 0x50], // &
    [0x00, 0x08, 0x07, 0x03, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x2A, 0x1C, 0x7F, 0x1C, 0x2A], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x80, 0x70, 0x30, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x00, 0x60, 0x60, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x72, 0x49, 0x49, 0x49, 0x46], // 2
    [0x21, 0x41, 0x49, 0x4D, 0x33], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x31], // 6
    [0x41, 0x21, 0x11, 0x09, 0x07], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x46, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x00, 0x14, 0x00, 0x00], // :
    [0x00, 0x40, 0x34, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x59, 0x09, 0x06], // ?
    [0x3E, 0x41, 0x5D, 0x59, 0x4E], // @
    [0x7C, 0x12, 0x11, 0x12, 0x7C], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x41, 0x3E], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x73], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x1C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x26, 0x49, 0x49, 0x49, 0x32], // S
    [0x03, 0x01, 0x7F, 0x01, 0x03], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x59, 0x49, 0x4D, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x41, 0x7F], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x03, 0x07, 0x08, 0x00], // `
    [0x20, 0x54, 0x54, 0x78, 0x40], // a
    [0x7F, 0x28, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x28], // c
    [0x38, 0x44, 0x44, 0x28, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x00, 0x08, 0x7E, 0x09, 0x02], // f
    [0x18, 0xA4, 0xA4, 0x9C, 0x78], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x40, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x78, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0xFC, 0x18, 0x24, 0x24, 0x18], // p
    [0x18, 0x24, 0x24, 0x18, 0xFC], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x24], // s
    [0x04, 0x04, 0x3F, 0x44, 0x24], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x4C, 0x90, 0x90, 0x90, 0x7C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x77, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02], // ~
];
