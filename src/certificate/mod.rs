//! Certificate rendering.
//!
//! A render grades the unit marks, lays the certificate out as a list of draw
//! instructions and rasterizes that list onto a fixed 1800x1200 RGB canvas.
//! Rendering is pure and never fails; only PNG encoding can.

mod fonts;
mod layout;
mod palette;
mod raster;

pub use fonts::{FontSet, DEFAULT_FONT_PATHS};
pub use layout::{build_layout, CertificateText, DrawOp};
pub use palette::{Palette, Template};
pub use raster::rasterize;

use std::io::Cursor;

use chrono::NaiveDate;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::errors::AppError;
use crate::grade::{compute_grade, GradeReport};
use crate::models::{CustomDesign, UnitMarks};

/// Inputs of a single certificate render.
#[derive(Debug, Clone, Copy)]
pub struct CertificateRequest<'a> {
    pub student_name: &'a str,
    pub school_name: &'a str,
    pub class_name: &'a str,
    pub unit_marks: &'a UnitMarks,
    pub template: Template,
    pub custom_design: Option<&'a CustomDesign>,
    pub awarded_on: NaiveDate,
}

/// A rendered certificate with the template actually used and the grading behind it.
pub struct RenderedCertificate {
    pub template: Template,
    pub report: GradeReport,
    pub image: RgbImage,
}

/// Lay out a certificate without rasterizing it.
pub fn layout(
    fonts: &FontSet,
    request: &CertificateRequest<'_>,
) -> (Template, GradeReport, Vec<DrawOp>) {
    let (template, palette) = Palette::resolve(request.template, request.custom_design);
    let report = compute_grade(request.unit_marks);
    let ops = build_layout(
        fonts,
        &palette,
        &CertificateText {
            student_name: request.student_name,
            school_name: request.school_name,
            class_name: request.class_name,
            report: &report,
            awarded_on: request.awarded_on,
        },
    );
    (template, report, ops)
}

/// Render a certificate.
pub fn render(fonts: &FontSet, request: &CertificateRequest<'_>) -> RenderedCertificate {
    let (template, report, ops) = layout(fonts, request);
    tracing::debug!(
        "Rendering {} certificate with {} draw operations",
        template.as_str(),
        ops.len()
    );
    RenderedCertificate {
        template,
        report,
        image: rasterize(fonts, &ops),
    }
}

/// Encode a rendered certificate as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, AppError> {
    let mut bytes = Cursor::new(Vec::new());
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| AppError::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes.into_inner())
}

/// `certificate_<name with spaces as underscores>_<template>_<YYYYMMDD>.png`
pub fn certificate_filename(student_name: &str, template: Template, date: NaiveDate) -> String {
    format!(
        "certificate_{}_{}_{}.png",
        student_name.replace(' ', "_"),
        template.as_str(),
        date.format("%Y%m%d")
    )
}
