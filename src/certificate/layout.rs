//! Certificate layout as an ordered list of draw instructions.
//!
//! Later instructions paint over earlier ones. Text is centered from the measured
//! extent of the exact string, so the layout depends on the font set in use.

use chrono::NaiveDate;
use image::{Rgb, Rgba};

use super::fonts::FontSet;
use super::palette::Palette;
use crate::grade::GradeReport;

pub const WIDTH: u32 = 1800;
pub const HEIGHT: u32 = 1200;

const W: i32 = WIDTH as i32;
const H: i32 = HEIGHT as i32;

const TITLE_SIZE: f32 = 72.0;
const SUBTITLE_SIZE: f32 = 36.0;
const HEADER_SIZE: f32 = 28.0;
const BODY_SIZE: f32 = 24.0;
const NAME_SIZE: f32 = 48.0;
const SMALL_SIZE: f32 = 20.0;
const WATERMARK_SIZE: f32 = 60.0;

const BORDER_WIDTH: u32 = 20;
const INNER_MARGIN: i32 = 40;
const CORNER_SIZE: i32 = 80;
const CORNER_INSET: i32 = 15;
const DETAIL_COLUMNS: usize = 2;
const DETAIL_COLUMN_WIDTH: i32 = 400;
const SEAL_RADIUS: i32 = 80;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const WATERMARK_TEXT: &str = "TrustPaper Certified";
const WATERMARK_COLOR: Rgba<u8> = Rgba([200, 200, 200, 50]);
const WATERMARK_ANGLE: f32 = 45.0;

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Bounds {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// Outline color and width, drawn inward from the shape's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: Rgb<u8>,
    pub width: u32,
}

const fn stroke(color: Rgb<u8>, width: u32) -> Option<Stroke> {
    Some(Stroke { color, width })
}

/// One immutable drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Whole-canvas vertical gradient, interpolated per scanline.
    Gradient { top: Rgb<u8>, bottom: Rgb<u8> },
    Rect {
        bounds: Bounds,
        fill: Option<Rgb<u8>>,
        outline: Option<Stroke>,
    },
    Circle {
        cx: i32,
        cy: i32,
        radius: i32,
        outline: Stroke,
    },
    /// Text with its top-left at `(x, y)`.
    Text {
        x: i32,
        y: i32,
        text: String,
        size: f32,
        color: Rgb<u8>,
    },
    /// Text drawn into its own transparent layer, rotated counter-clockwise and
    /// composited over the center of the canvas.
    Watermark {
        text: String,
        size: f32,
        color: Rgba<u8>,
        angle_degrees: f32,
    },
}

/// Everything the certificate says about the student.
#[derive(Debug, Clone, Copy)]
pub struct CertificateText<'a> {
    pub student_name: &'a str,
    pub school_name: &'a str,
    pub class_name: &'a str,
    pub report: &'a GradeReport,
    pub awarded_on: NaiveDate,
}

struct LayoutBuilder<'f> {
    fonts: &'f FontSet,
    ops: Vec<DrawOp>,
}

impl<'f> LayoutBuilder<'f> {
    fn rect(&mut self, bounds: Bounds, fill: Option<Rgb<u8>>, outline: Option<Stroke>) {
        self.ops.push(DrawOp::Rect {
            bounds,
            fill,
            outline,
        });
    }

    fn text(&mut self, x: i32, y: i32, text: impl Into<String>, size: f32, color: Rgb<u8>) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            size,
            color,
        });
    }

    fn width_of(&self, text: &str, size: f32) -> i32 {
        self.fonts.measure(text, size).width()
    }

    /// Left edge that centers `text` horizontally on the canvas.
    fn centered_x(&self, text: &str, size: f32) -> i32 {
        (W - self.width_of(text, size)).div_euclid(2)
    }

    fn centered_text(&mut self, y: i32, text: &str, size: f32, color: Rgb<u8>) {
        let x = self.centered_x(text, size);
        self.text(x, y, text, size, color);
    }
}

/// Build the full draw list for one certificate.
pub fn build_layout(
    fonts: &FontSet,
    palette: &Palette,
    content: &CertificateText<'_>,
) -> Vec<DrawOp> {
    let mut l = LayoutBuilder {
        fonts,
        ops: Vec::with_capacity(64),
    };

    // Background
    l.ops.push(DrawOp::Gradient {
        top: palette.gradient_top,
        bottom: palette.gradient_bottom,
    });

    // Borders
    l.rect(Bounds::new(0, 0, W, H), None, stroke(palette.gold, BORDER_WIDTH));
    l.rect(
        Bounds::new(INNER_MARGIN, INNER_MARGIN, W - INNER_MARGIN, H - INNER_MARGIN),
        None,
        stroke(palette.dark_gold, 8),
    );

    // Corner ornaments
    let far_x = W - INNER_MARGIN - CORNER_SIZE;
    let far_y = H - INNER_MARGIN - CORNER_SIZE;
    for (cx, cy) in [
        (INNER_MARGIN, INNER_MARGIN),
        (far_x, INNER_MARGIN),
        (INNER_MARGIN, far_y),
        (far_x, far_y),
    ] {
        l.rect(
            Bounds::new(cx, cy, cx + CORNER_SIZE, cy + CORNER_SIZE),
            None,
            stroke(palette.gold, 4),
        );
        l.rect(
            Bounds::new(
                cx + CORNER_INSET,
                cy + CORNER_INSET,
                cx + CORNER_SIZE - CORNER_INSET,
                cy + CORNER_SIZE - CORNER_INSET,
            ),
            None,
            stroke(palette.dark_gold, 2),
        );
    }

    // Logo block
    l.rect(
        Bounds::new(60, 60, 400, 140),
        Some(palette.royal_blue),
        stroke(palette.gold, 3),
    );
    l.text(80, 85, "TRUST PAPER", HEADER_SIZE, WHITE);
    l.text(80, 115, "Certificate Authority", SMALL_SIZE, palette.light_gray);

    // Title, shadow first
    let title = "CERTIFICATE";
    let title_x = l.centered_x(title, TITLE_SIZE);
    l.text(title_x + 3, 183, title, TITLE_SIZE, palette.gray);
    l.text(title_x, 180, title, TITLE_SIZE, palette.royal_blue);

    // Subtitle and its underline
    let subtitle = "OF ACADEMIC EXCELLENCE";
    let subtitle_x = l.centered_x(subtitle, SUBTITLE_SIZE);
    let subtitle_width = l.width_of(subtitle, SUBTITLE_SIZE);
    l.text(subtitle_x, 260, subtitle, SUBTITLE_SIZE, palette.accent);
    l.rect(
        Bounds::new(subtitle_x, 310, subtitle_x + subtitle_width, 314),
        Some(palette.gold),
        None,
    );

    l.centered_text(
        360,
        "THIS CERTIFICATE IS PROUDLY PRESENTED TO",
        BODY_SIZE,
        palette.gray,
    );

    // Name banner
    let name = content.student_name.to_uppercase();
    let name_x = l.centered_x(&name, NAME_SIZE);
    let name_width = l.width_of(&name, NAME_SIZE);
    l.rect(
        Bounds::new(name_x - 20, 405, name_x + name_width + 20, 465),
        Some(palette.light_gray),
        stroke(palette.gold, 2),
    );
    l.text(name_x, 415, name, NAME_SIZE, palette.navy);

    // Achievement lines
    let report = content.report;
    let achievement_lines = [
        (
            "In recognition of exceptional academic performance and dedication".to_string(),
            palette.gray,
        ),
        (
            format!(
                "in {} studies at {}",
                content.class_name, content.school_name
            ),
            palette.gray,
        ),
        (
            format!(
                "Achieving an overall average of {:.1}% with grade: {}",
                report.average,
                report.grade.as_str()
            ),
            palette.grade_color(report.grade),
        ),
        (
            format!("Awarded on {}", content.awarded_on.format("%B %d, %Y")),
            palette.gray,
        ),
    ];
    for (i, (line, color)) in achievement_lines.iter().enumerate() {
        l.centered_text(520 + i as i32 * 35, line, BODY_SIZE, *color);
    }

    // Marks breakdown
    let marks_y = 680;
    l.centered_text(marks_y, "DETAILED PERFORMANCE:", HEADER_SIZE, palette.royal_blue);
    let start_x = (W - DETAIL_COLUMNS as i32 * DETAIL_COLUMN_WIDTH) / 2;
    for (i, detail) in report.details.iter().enumerate() {
        let col = (i % DETAIL_COLUMNS) as i32;
        let row = (i / DETAIL_COLUMNS) as i32;
        l.text(
            start_x + col * DETAIL_COLUMN_WIDTH,
            marks_y + 50 + row * 30,
            detail.as_str(),
            SMALL_SIZE,
            palette.gray,
        );
    }

    // Signature block
    let sig_y = H - 200;
    l.rect(
        Bounds::new(W - 350, sig_y, W - 50, sig_y + 120),
        None,
        stroke(palette.gold, 2),
    );
    l.text(W - 330, sig_y + 20, "Authorized Signature", SMALL_SIZE, palette.gray);
    l.rect(
        Bounds::new(W - 330, sig_y + 50, W - 120, sig_y + 53),
        Some(palette.gray),
        None,
    );
    l.text(W - 330, sig_y + 65, "ADMIN", HEADER_SIZE, palette.royal_blue);
    l.text(W - 330, sig_y + 95, "Trust Paper Academy", SMALL_SIZE, palette.gray);

    // Seal
    let seal_x = W - 200;
    let seal_y = 280;
    for (i, radius) in [SEAL_RADIUS, SEAL_RADIUS - 15, SEAL_RADIUS - 30]
        .into_iter()
        .enumerate()
    {
        let color = if i % 2 == 0 {
            palette.gold
        } else {
            palette.dark_gold
        };
        l.ops.push(DrawOp::Circle {
            cx: seal_x,
            cy: seal_y,
            radius,
            outline: Stroke {
                color,
                width: 6 - i as u32 * 2,
            },
        });
    }
    for (label, y) in [("OFFICIAL", seal_y - 15), ("SEAL", seal_y + 5)] {
        let x = seal_x - l.width_of(label, SMALL_SIZE) / 2;
        l.text(x, y, label, SMALL_SIZE, palette.gold);
    }

    l.ops.push(DrawOp::Watermark {
        text: WATERMARK_TEXT.to_string(),
        size: WATERMARK_SIZE,
        color: WATERMARK_COLOR,
        angle_degrees: WATERMARK_ANGLE,
    });

    l.ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::palette::Template;
    use crate::grade::compute_grade;
    use crate::models::UnitMarks;

    fn report(pairs: &[(&str, &str)]) -> GradeReport {
        let marks: UnitMarks = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        compute_grade(&marks)
    }

    fn layout_for(report: &GradeReport, palette: &Palette) -> Vec<DrawOp> {
        let content = CertificateText {
            student_name: "Ada Lovelace",
            school_name: "North High School",
            class_name: "Grade 10",
            report,
            awarded_on: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        };
        build_layout(&FontSet::builtin(), palette, &content)
    }

    fn texts(ops: &[DrawOp]) -> Vec<(&str, i32, i32, Rgb<u8>)> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text {
                    x, y, text, color, ..
                } => Some((text.as_str(), *x, *y, *color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_gradient_first_watermark_last() {
        let palette = Palette::builtin(Template::Classic);
        let ops = layout_for(&report(&[("unit_1", "80")]), &palette);

        assert_eq!(
            ops.first(),
            Some(&DrawOp::Gradient {
                top: Rgb([255, 255, 255]),
                bottom: Rgb([240, 245, 255]),
            })
        );
        assert!(matches!(ops.last(), Some(DrawOp::Watermark { angle_degrees, .. }) if *angle_degrees == 45.0));
    }

    #[test]
    fn test_borders_and_corners() {
        let palette = Palette::builtin(Template::Classic);
        let ops = layout_for(&report(&[]), &palette);

        assert_eq!(
            ops[1],
            DrawOp::Rect {
                bounds: Bounds::new(0, 0, 1800, 1200),
                fill: None,
                outline: stroke(palette.gold, 20),
            }
        );
        assert_eq!(
            ops[2],
            DrawOp::Rect {
                bounds: Bounds::new(40, 40, 1760, 1160),
                fill: None,
                outline: stroke(palette.dark_gold, 8),
            }
        );
        // four corners, two rects each
        let corner_rects = ops[3..11]
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { .. }))
            .count();
        assert_eq!(corner_rects, 8);
        assert_eq!(
            ops[9],
            DrawOp::Rect {
                bounds: Bounds::new(1680, 1080, 1760, 1160),
                fill: None,
                outline: stroke(palette.gold, 4),
            }
        );
    }

    #[test]
    fn test_title_shadow_precedes_title() {
        let palette = Palette::builtin(Template::Modern);
        let ops = layout_for(&report(&[]), &palette);
        let texts = texts(&ops);

        let shadow = texts.iter().position(|t| t.0 == "CERTIFICATE").unwrap();
        let (_, shadow_x, shadow_y, shadow_color) = texts[shadow];
        let (_, title_x, title_y, title_color) = texts[shadow + 1];

        assert_eq!(shadow_color, palette.gray);
        assert_eq!(title_color, palette.royal_blue);
        assert_eq!(shadow_x, title_x + 3);
        assert_eq!((shadow_y, title_y), (183, 180));

        let width = FontSet::builtin().measure("CERTIFICATE", 72.0).width();
        assert_eq!(title_x, (1800 - width) / 2);
    }

    #[test]
    fn test_name_is_uppercased_and_framed() {
        let palette = Palette::builtin(Template::Elegant);
        let ops = layout_for(&report(&[]), &palette);

        let name_index = ops
            .iter()
            .position(|op| matches!(op, DrawOp::Text { text, .. } if text == "ADA LOVELACE"))
            .unwrap();
        let DrawOp::Text { x, .. } = &ops[name_index] else {
            unreachable!()
        };
        let width = FontSet::builtin().measure("ADA LOVELACE", 48.0).width();

        assert_eq!(
            ops[name_index - 1],
            DrawOp::Rect {
                bounds: Bounds::new(x - 20, 405, x + width + 20, 465),
                fill: Some(palette.light_gray),
                outline: stroke(palette.gold, 2),
            }
        );
    }

    #[test]
    fn test_grade_line_uses_grade_color() {
        let palette = Palette::builtin(Template::Vibrant);
        let ops = layout_for(&report(&[("unit_1", "95"), ("unit_2", "85")]), &palette);
        let texts = texts(&ops);

        let line = texts
            .iter()
            .find(|t| t.0.starts_with("Achieving"))
            .unwrap();
        assert_eq!(
            line.0,
            "Achieving an overall average of 90.0% with grade: OUTSTANDING"
        );
        assert_eq!(line.2, 520 + 2 * 35);
        assert_eq!(line.3, palette.gold);

        let awarded = texts.iter().find(|t| t.0.starts_with("Awarded")).unwrap();
        assert_eq!(awarded.0, "Awarded on March 09, 2024");
        assert_eq!(awarded.3, palette.gray);

        assert!(texts
            .iter()
            .any(|t| t.0 == "in Grade 10 studies at North High School"));
    }

    #[test]
    fn test_details_in_two_columns_in_input_order() {
        let palette = Palette::builtin(Template::Classic);
        let ops = layout_for(
            &report(&[
                ("unit_3", "70"),
                ("unit_1", "80"),
                ("unit_2", "oops"),
                ("unit_4", "90"),
            ]),
            &palette,
        );
        let details: Vec<_> = texts(&ops)
            .into_iter()
            .filter(|t| t.0.starts_with("Unit "))
            .collect();

        assert_eq!(
            details,
            vec![
                ("Unit 3: 70.0%", 500, 730, palette.gray),
                ("Unit 1: 80.0%", 900, 730, palette.gray),
                ("Unit 4: 90.0%", 500, 760, palette.gray),
            ]
        );
    }

    #[test]
    fn test_seal_circles() {
        let palette = Palette::builtin(Template::Classic);
        let ops = layout_for(&report(&[]), &palette);
        let circles: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Circle {
                    cx,
                    cy,
                    radius,
                    outline,
                } => Some((*cx, *cy, *radius, outline.color, outline.width)),
                _ => None,
            })
            .collect();

        assert_eq!(
            circles,
            vec![
                (1600, 280, 80, palette.gold, 6),
                (1600, 280, 65, palette.dark_gold, 4),
                (1600, 280, 50, palette.gold, 2),
            ]
        );
    }

    #[test]
    fn test_custom_palette_flows_into_layout() {
        let palette = Palette::custom(&["#112233".to_string()]);
        let ops = layout_for(&report(&[]), &palette);

        assert_eq!(
            ops[0],
            DrawOp::Gradient {
                top: Rgb([0x11 + 100, 0x22 + 100, 0x33 + 100]),
                bottom: Rgb([238, 195, 255]),
            }
        );
    }
}
