//! Certificate preview and download endpoints.
//!
//! Rendering is CPU-bound, so it runs on the blocking pool with the shared font set.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::CurrentStudent;
use crate::certificate::{
    certificate_filename, encode_png, render, CertificateRequest, FontSet, Template,
};
use crate::errors::AppError;
use crate::grade::GradeReport;
use crate::models::{StudentRecord, DESIGN_NAME_PREFIX};
use crate::AppState;

const DEFAULT_TEMPLATE: &str = "classic";

/// Request body shared by preview and download.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateOptions {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub custom_design: Option<String>,
}

/// Response body of a certificate preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePreview {
    /// Base64-encoded PNG.
    pub certificate_data: String,
    pub template: Template,
    pub filename: String,
    pub report: GradeReport,
}

struct EncodedCertificate {
    png: Vec<u8>,
    template: Template,
    filename: String,
    report: GradeReport,
}

async fn produce(
    state: &AppState,
    student: StudentRecord,
    options: CertificateOptions,
) -> Result<EncodedCertificate, AppError> {
    if student.unit_marks.is_empty() {
        return Err(AppError::Validation(
            "Please add your unit marks before generating a certificate.".to_string(),
        ));
    }

    // Only the student's own generated designs select the custom palette
    let design_name = options.custom_design.filter(|name| {
        name.starts_with(DESIGN_NAME_PREFIX) && student.find_design(name).is_some()
    });
    let template =
        Template::parse_builtin(options.template.as_deref().unwrap_or(DEFAULT_TEMPLATE));
    let awarded_on = chrono::Local::now().date_naive();

    let fonts = state.fonts.clone();
    tokio::task::spawn_blocking(move || {
        render_student(&fonts, &student, template, design_name.as_deref(), awarded_on)
    })
    .await?
}

fn render_student(
    fonts: &FontSet,
    student: &StudentRecord,
    template: Template,
    design_name: Option<&str>,
    awarded_on: NaiveDate,
) -> Result<EncodedCertificate, AppError> {
    let rendered = render(
        fonts,
        &CertificateRequest {
            student_name: &student.name,
            school_name: &student.school,
            class_name: &student.class_name,
            unit_marks: &student.unit_marks,
            template,
            custom_design: design_name.and_then(|name| student.find_design(name)),
            awarded_on,
        },
    );

    Ok(EncodedCertificate {
        png: encode_png(&rendered.image)?,
        filename: certificate_filename(&student.name, rendered.template, awarded_on),
        template: rendered.template,
        report: rendered.report,
    })
}

/// Builds an attachment `Content-Disposition` that survives any student name.
///
/// The quoted `filename` keeps printable ASCII only; `filename*` carries the
/// exact name percent-encoded as UTF-8.
fn attachment_disposition(filename: &str) -> Result<HeaderValue, AppError> {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len());
    for byte in filename.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    ))
    .map_err(|e| AppError::Internal(format!("Invalid Content-Disposition: {}", e)))
}

/// POST /api/me/certificate/preview - Render and return the certificate inline.
pub async fn preview_certificate(
    State(state): State<AppState>,
    current: CurrentStudent,
    Json(options): Json<CertificateOptions>,
) -> ApiResult<CertificatePreview> {
    let certificate = produce(&state, current.student, options).await?;

    success(CertificatePreview {
        certificate_data: STANDARD.encode(&certificate.png),
        template: certificate.template,
        filename: certificate.filename,
        report: certificate.report,
    })
}

/// POST /api/me/certificate/download - Render and return the certificate as a PNG attachment.
pub async fn download_certificate(
    State(state): State<AppState>,
    current: CurrentStudent,
    Json(options): Json<CertificateOptions>,
) -> Result<Response, AppError> {
    let certificate = produce(&state, current.student, options).await?;

    tracing::info!("Certificate downloaded: {}", certificate.filename);

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&certificate.filename)?,
            ),
        ],
        certificate.png,
    )
        .into_response())
}
