mod blocks;
mod layout;
mod table;
mod writer;

use crate::config::ReportConfig;
use crate::error::{Error, ValidationError};
use crate::model::{MAX_PHOTOS_PER_OBSERVATION, Report, ReportInput, report_file_name};
use crate::sanitize::sanitize_text;

use blocks::{
    render_header_footer, render_main_photo, render_observation, render_section_banner,
    render_signature,
};
use layout::DrawingContext;
use table::render_field_table;
use writer::{DocumentInfo, PdfWriter};

const FIELD_TABLE_GAP: f32 = 10.0;

/// Reject input the layout cannot produce a complete report from. Runs before
/// any image is decoded or drawn.
fn validate(input: &ReportInput) -> Result<&[u8], ValidationError> {
    let visit = &input.visit;
    if visit.address.trim().is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    if visit.building_code.trim().is_empty() {
        return Err(ValidationError::MissingBuildingCode);
    }
    for (idx, obs) in input.observations.iter().enumerate() {
        if obs.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription { observation: idx });
        }
        if obs.photos.len() > MAX_PHOTOS_PER_OBSERVATION {
            return Err(ValidationError::TooManyPhotos {
                observation: idx,
                count: obs.photos.len(),
            });
        }
    }
    match &input.signature {
        Some(sig) if !sig.data.is_empty() => Ok(&sig.data),
        _ => Err(ValidationError::MissingSignature),
    }
}

/// Lay out and serialize a complete report in one forward pass.
///
/// Any failure aborts the whole report; nothing is returned on error.
pub fn compose_report(input: &ReportInput, config: &ReportConfig) -> Result<Report, Error> {
    let t0 = std::time::Instant::now();
    let signature = validate(input)?;

    let visit = &input.visit;
    let geometry = &config.geometry;
    let mut out = PdfWriter::new();
    let mut ctx = DrawingContext::new(geometry);

    // Page 1: visit information and main photo
    ctx.skip(FIELD_TABLE_GAP);
    render_field_table(&mut ctx, visit);
    if let Some(photo) = &input.main_photo {
        render_main_photo(&mut ctx, &mut out, config, &photo.data)?;
    }
    let t_info = t0.elapsed();

    ctx.page_break();
    render_section_banner(&mut ctx, "OBSERVATIONS", config.branding.accent_color);
    for (idx, obs) in input.observations.iter().enumerate() {
        render_observation(&mut ctx, &mut out, config, idx, obs)?;
    }
    let t_observations = t0.elapsed();

    ctx.page_break();
    render_signature(&mut ctx, &mut out, visit, &config.branding, signature)?;

    let mut pages = ctx.finish();

    // Headers and footers need the final page count
    let total_pages = pages.len();
    for (idx, page) in pages.iter_mut().enumerate() {
        render_header_footer(page, geometry, &config.branding, idx + 1, total_pages);
    }
    let t_layout = t0.elapsed();

    let info = DocumentInfo {
        title: format!("Rapport de visite - {}", sanitize_text(visit.address.trim())),
        author: sanitize_text(&visit.author),
    };
    let bytes = out.finish(&pages, geometry, &info)?;
    let t_total = t0.elapsed();

    log::info!(
        "Compose phases: info={:.1}ms, observations={:.1}ms, \
         signature+footers={:.1}ms, serialize={:.1}ms ({} pages, {} bytes)",
        t_info.as_secs_f64() * 1000.0,
        (t_observations - t_info).as_secs_f64() * 1000.0,
        (t_layout - t_observations).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        total_pages,
        bytes.len(),
    );

    Ok(Report {
        bytes,
        pages,
        file_name: report_file_name(visit.date),
    })
}
