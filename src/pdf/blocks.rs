use crate::config::{Branding, PageGeometry, ReportConfig};
use crate::error::{BlockKind, Error};
use crate::model::{Align, FontStyle, ImagePosition, Observation, PageLayout, VisitRecord};
use crate::photo::{normalize_image, prepare_signature};

use super::layout::{DrawingContext, TextStyle, draw_cell, push_text, render_lines, wrap_text};
use super::writer::PdfWriter;

const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

const OBSERVATION_GAP: f32 = 20.0;
const OBSERVATION_FRAME_H: f32 = 10.0;
const OBSERVATION_SHADE: [u8; 3] = [245, 245, 245];
const HEADING_H: f32 = 8.0;
const BODY_LINE_H: f32 = 7.0;
const PHOTO_HEADING_H: f32 = 10.0;
const PHOTO_GAP: f32 = 20.0;
const SIGNATURE_WIDTH: f32 = 90.0;

const HEADING: TextStyle = TextStyle::new(FontStyle::Bold, 11.0);
const BODY: TextStyle = TextStyle::new(FontStyle::Regular, 10.0);

/// Where an image lands on the page, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Placement {
    pub(super) x: f32,
    pub(super) width: f32,
    pub(super) height: f32,
}

/// Scale a `px_w`×`px_h` image to `target_width`, keeping its aspect ratio.
/// Images taller than `max_height` shrink uniformly until they fit; the
/// result is centred in the content area. `None` for degenerate sizes.
pub(super) fn fit_image(
    geometry: &PageGeometry,
    px_w: u32,
    px_h: u32,
    target_width: f32,
    max_height: f32,
) -> Option<Placement> {
    if px_w == 0 || px_h == 0 {
        return None;
    }
    let ratio = px_h as f32 / px_w as f32;
    let (mut width, mut height) = (target_width, target_width * ratio);
    if height > max_height {
        height = max_height;
        width = max_height / ratio;
    }
    let x = geometry.margin_left + (geometry.content_width() - width) / 2.0;
    Some(Placement { x, width, height })
}

fn degenerate(block: BlockKind) -> Error {
    Error::Render {
        block,
        reason: "image has a zero dimension".into(),
    }
}

/// Organization mark and document title at the top, `Page n/N` at the
/// bottom. Drawn once the total page count is known.
pub(super) fn render_header_footer(
    page: &mut PageLayout,
    geometry: &PageGeometry,
    branding: &Branding,
    page_num: usize,
    total_pages: usize,
) {
    let ops = &mut page.ops;
    let mark_top = 10.0;
    ops.push(crate::model::DrawOp::FillRect {
        x: geometry.margin_left,
        y: mark_top,
        width: 40.0,
        height: 15.0,
        color: branding.accent_color,
    });
    push_text(
        ops,
        geometry.margin_left + 2.0,
        mark_top + 10.0,
        &branding.organization,
        TextStyle::new(FontStyle::Bold, 12.0).colored(WHITE),
    );
    draw_cell(
        ops,
        geometry.margin_left,
        mark_top,
        geometry.content_width(),
        10.0,
        &branding.title,
        TextStyle::new(FontStyle::Bold, 16.0),
        Align::Center,
    );

    draw_cell(
        ops,
        geometry.margin_left,
        geometry.page_height - 15.0,
        geometry.content_width(),
        10.0,
        &format!("Page {page_num}/{total_pages}"),
        TextStyle::new(FontStyle::Italic, 8.0).colored([128, 128, 128]),
        Align::Center,
    );
}

/// Full-width photo below the information table.
pub(super) fn render_main_photo(
    ctx: &mut DrawingContext<'_>,
    out: &mut PdfWriter,
    config: &ReportConfig,
    data: &[u8],
) -> Result<(), Error> {
    let photo = normalize_image(data, config.jpeg_quality).map_err(|e| Error::ImageDecode {
        position: ImagePosition::MainPhoto,
        reason: e.to_string(),
    })?;
    let g = ctx.geometry;
    let place = fit_image(g, photo.width, photo.height, g.content_width(), g.content_height())
        .ok_or_else(|| degenerate(BlockKind::MainPhoto))?;
    let id = out
        .embed_jpeg(&photo)
        .map_err(|reason| Error::Render {
            block: BlockKind::MainPhoto,
            reason,
        })?;
    drop(photo);

    ctx.skip(10.0);
    let y = ctx.reserve(place.height);
    ctx.image(id, place.x, y, place.width, place.height);
    ctx.advance(place.height);
    Ok(())
}

pub(super) fn render_section_banner(ctx: &mut DrawingContext<'_>, title: &str, color: [u8; 3]) {
    let g = ctx.geometry;
    let y = ctx.reserve(10.0);
    ctx.fill_rect(g.margin_left, y, g.content_width(), 10.0, color);
    ctx.stroke_rect(g.margin_left, y, g.content_width(), 10.0, BLACK);
    ctx.cell(
        g.margin_left,
        g.content_width(),
        10.0,
        title,
        TextStyle::new(FontStyle::Bold, 14.0).colored(WHITE),
        Align::Center,
    );
    ctx.advance(10.0);
}

/// One observation: colored header, description, optional action and up to
/// three photos. The header and texts stay together on one page; photos may
/// continue on following pages without repeating the header.
pub(super) fn render_observation(
    ctx: &mut DrawingContext<'_>,
    out: &mut PdfWriter,
    config: &ReportConfig,
    index: usize,
    obs: &Observation,
) -> Result<(), Error> {
    let g = ctx.geometry;
    let left = g.margin_left;
    let width = g.content_width();
    let text_w = width - 2.0 * super::layout::CELL_PADDING;

    let description = wrap_text(&obs.description, BODY.style, BODY.size, text_w);
    let action = obs
        .action()
        .map(|a| wrap_text(a, BODY.style, BODY.size, text_w));

    let mut text_h = OBSERVATION_FRAME_H + 2.0 * HEADING_H + description.len() as f32 * BODY_LINE_H;
    if let Some(lines) = &action {
        text_h += 2.0 * HEADING_H + lines.len() as f32 * BODY_LINE_H;
    }

    ctx.skip(OBSERVATION_GAP);
    let top = ctx.reserve(text_h);
    log::debug!(
        "Observation {} on page {} at y={top:.1}mm ({text_h:.1}mm of text)",
        index + 1,
        ctx.cursor().page()
    );

    ctx.fill_rect(left, top, width, OBSERVATION_FRAME_H, OBSERVATION_SHADE);
    ctx.set_y(top + 2.0);
    let label = format!("Observation {} - {}", index + 1, obs.classification.label());
    ctx.cell(
        left + 5.0,
        width - 5.0,
        HEADING_H,
        &label,
        TextStyle::new(FontStyle::Bold, 12.0).colored(obs.classification.color()),
        Align::Left,
    );
    ctx.set_y(top + OBSERVATION_FRAME_H);

    ctx.advance(HEADING_H);
    ctx.cell(left, width, HEADING_H, "Description :", HEADING, Align::Left);
    ctx.advance(HEADING_H);
    render_lines(ctx, &description, left, width, BODY_LINE_H, BODY);

    if let Some(lines) = &action {
        ctx.advance(HEADING_H);
        ctx.cell(left, width, HEADING_H, "Action à mener :", HEADING, Align::Left);
        ctx.advance(HEADING_H);
        render_lines(ctx, lines, left, width, BODY_LINE_H, BODY);
    }

    ctx.skip(HEADING_H);

    for (photo_idx, asset) in obs.photos.iter().enumerate() {
        let photo = normalize_image(&asset.data, config.jpeg_quality).map_err(|e| {
            Error::ImageDecode {
                position: ImagePosition::Observation {
                    observation: index,
                    photo: photo_idx,
                },
                reason: e.to_string(),
            }
        })?;
        let place = fit_image(
            g,
            photo.width,
            photo.height,
            width,
            g.content_height() - PHOTO_HEADING_H,
        )
        .ok_or_else(|| degenerate(BlockKind::Observation(index)))?;
        let id = out.embed_jpeg(&photo).map_err(|reason| Error::Render {
            block: BlockKind::Observation(index),
            reason,
        })?;
        drop(photo);

        ctx.ensure_remaining(config.photo_min_remaining);
        if photo_idx == 0 {
            // keep the heading with the first photo
            ctx.reserve(PHOTO_HEADING_H + place.height);
            ctx.cell(left, width, HEADING_H, "Photos :", HEADING, Align::Left);
            ctx.advance(PHOTO_HEADING_H);
        } else {
            ctx.reserve(place.height);
        }
        let y = ctx.y();
        ctx.image(id, place.x, y, place.width, place.height);
        ctx.advance(place.height);
        ctx.skip(PHOTO_GAP);
    }

    ctx.ensure_remaining(config.observation_min_remaining);
    Ok(())
}

/// Closing block: validation title, author identity and the signature.
pub(super) fn render_signature(
    ctx: &mut DrawingContext<'_>,
    out: &mut PdfWriter,
    visit: &VisitRecord,
    branding: &Branding,
    data: &[u8],
) -> Result<(), Error> {
    let signature = prepare_signature(data).map_err(|e| Error::ImageDecode {
        position: ImagePosition::Signature,
        reason: e.to_string(),
    })?;
    let (px_w, px_h) = signature.rgba.dimensions();
    let id = out.embed_rgba(&signature.rgba).map_err(|reason| Error::Render {
        block: BlockKind::Signature,
        reason,
    })?;
    drop(signature);

    let g = ctx.geometry;
    let (left, width) = (g.margin_left, g.content_width());
    ctx.cell(
        left,
        width,
        10.0,
        "VALIDATION DU RAPPORT",
        TextStyle::new(FontStyle::Bold, 12.0),
        Align::Center,
    );
    ctx.advance(10.0);
    ctx.skip(5.0);
    ctx.cell(left, width, 10.0, &visit.author, HEADING, Align::Center);
    ctx.advance(10.0);
    ctx.cell(left, width, 5.0, &branding.author_role, BODY, Align::Center);
    ctx.advance(5.0);
    ctx.skip(10.0);

    let max_height = g.content_bottom() - ctx.y();
    let place = fit_image(g, px_w, px_h, SIGNATURE_WIDTH, max_height)
        .ok_or_else(|| degenerate(BlockKind::Signature))?;
    let y = ctx.reserve(place.height);
    ctx.image(id, place.x, y, place.width, place.height);
    ctx.advance(place.height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio_at_full_width() {
        let g = PageGeometry::default();
        let p = fit_image(&g, 400, 300, 190.0, 247.0).unwrap();
        assert_eq!(p.width, 190.0);
        assert!((p.height - 142.5).abs() < 0.01);
        assert_eq!(p.x, 10.0);
    }

    #[test]
    fn fit_shrinks_tall_images_to_the_page() {
        let g = PageGeometry::default();
        let p = fit_image(&g, 300, 900, 190.0, 247.0).unwrap();
        assert!((p.height - 247.0).abs() < 0.01);
        assert!((p.width - 247.0 / 3.0).abs() < 0.01);
        assert!((p.x - (10.0 + (190.0 - p.width) / 2.0)).abs() < 0.01);
    }

    #[test]
    fn fit_rejects_empty_images() {
        let g = PageGeometry::default();
        assert!(fit_image(&g, 0, 10, 190.0, 247.0).is_none());
    }
}
