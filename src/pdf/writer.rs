use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::config::PageGeometry;
use crate::error::{BlockKind, Error};
use crate::fonts::{FontEntry, PT_TO_MM, register_fonts, to_winansi_bytes};
use crate::model::{DrawOp, FontStyle, ImageId, PageLayout};
use crate::photo::NormalizedImage;

/// Metadata written to the document information dictionary.
pub(super) struct DocumentInfo {
    pub(super) title: String,
    pub(super) author: String,
}

/// Output document under construction. Images are written as XObjects the
/// moment they are embedded so their encoded bytes can be dropped right away;
/// pages are written last, once the layout is complete.
pub(super) struct PdfWriter {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: Vec<(FontStyle, FontEntry)>,
    image_xobjects: Vec<(String, Ref)>,
}

fn dimension(px: u32) -> Result<i32, String> {
    i32::try_from(px).map_err(|_| format!("image dimension {px} is too large"))
}

fn rgb_f32(c: [u8; 3]) -> (f32, f32, f32) {
    (c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0)
}

fn mm(v: f32) -> f32 {
    v / PT_TO_MM
}

impl PdfWriter {
    pub(super) fn new() -> Self {
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let fonts = register_fonts(&mut pdf, &mut alloc);
        Self {
            pdf,
            next_id,
            catalog_id,
            pages_id,
            fonts,
            image_xobjects: Vec::new(),
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    fn push_xobject(&mut self, xobj_ref: Ref) -> ImageId {
        let id = ImageId(self.image_xobjects.len());
        self.image_xobjects
            .push((format!("Im{}", self.image_xobjects.len() + 1), xobj_ref));
        id
    }

    /// Embed a normalized photo as a DCT-encoded XObject.
    pub(super) fn embed_jpeg(&mut self, img: &NormalizedImage) -> Result<ImageId, String> {
        let (w, h) = (dimension(img.width)?, dimension(img.height)?);
        let xobj_ref = self.alloc();
        {
            let mut xobj = self.pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        Ok(self.push_xobject(xobj_ref))
    }

    /// Embed raw RGBA pixels losslessly; transparency becomes a soft mask.
    pub(super) fn embed_rgba(&mut self, rgba: &image::RgbaImage) -> Result<ImageId, String> {
        let (w, h) = (dimension(rgba.width())?, dimension(rgba.height())?);
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

        let rgb_data: Vec<u8> = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

        let smask_ref = if has_alpha {
            let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
            let mask_ref = self.alloc();
            {
                let mut mask = self.pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
            }
            Some(mask_ref)
        } else {
            None
        };

        let xobj_ref = self.alloc();
        {
            let mut xobj = self.pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
        Ok(self.push_xobject(xobj_ref))
    }

    fn font_name(&self, style: FontStyle) -> &str {
        self.fonts
            .iter()
            .find(|(s, _)| *s == style)
            .map(|(_, e)| e.pdf_name.as_str())
            .unwrap_or("F1")
    }

    fn page_content(&self, page: &PageLayout, geometry: &PageGeometry) -> Result<Content, Error> {
        let page_h = geometry.page_height;
        let mut content = Content::new();
        for op in page.ops() {
            match op {
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let (r, g, b) = rgb_f32(*color);
                    content.save_state();
                    content.set_fill_rgb(r, g, b);
                    content.rect(mm(*x), mm(page_h - y - height), mm(*width), mm(*height));
                    content.fill_nonzero();
                    content.restore_state();
                }
                DrawOp::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let (r, g, b) = rgb_f32(*color);
                    content.save_state();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(mm(0.2));
                    content.rect(mm(*x), mm(page_h - y - height), mm(*width), mm(*height));
                    content.stroke();
                    content.restore_state();
                }
                DrawOp::Text {
                    x,
                    y,
                    text,
                    style,
                    size,
                    color,
                } => {
                    let (r, g, b) = rgb_f32(*color);
                    let bytes = to_winansi_bytes(text);
                    content.begin_text();
                    content.set_fill_rgb(r, g, b);
                    content.set_font(Name(self.font_name(*style).as_bytes()), *size);
                    content.next_line(mm(*x), mm(page_h - y));
                    content.show(Str(&bytes));
                    content.end_text();
                }
                DrawOp::Image {
                    id,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let (name, _) = self.image_xobjects.get(id.0).ok_or_else(|| Error::Render {
                        block: BlockKind::Document,
                        reason: format!("unknown image {}", id.0),
                    })?;
                    content.save_state();
                    content.transform([
                        mm(*width),
                        0.0,
                        0.0,
                        mm(*height),
                        mm(*x),
                        mm(page_h - y - height),
                    ]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
            }
        }
        Ok(content)
    }

    /// Write pages, page tree, catalog and info, and return the file bytes.
    pub(super) fn finish(
        mut self,
        pages: &[PageLayout],
        geometry: &PageGeometry,
        info: &DocumentInfo,
    ) -> Result<Vec<u8>, Error> {
        let n = pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let info_id = self.alloc();

        for (i, page) in pages.iter().enumerate() {
            let raw = self.page_content(page, geometry)?.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            self.pdf
                .stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        }

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        let media_box = Rect::new(0.0, 0.0, mm(geometry.page_width), mm(geometry.page_height));
        for i in 0..n {
            let mut page = self.pdf.page(page_ids[i]);
            page.media_box(media_box)
                .parent(self.pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for (_, entry) in &self.fonts {
                    fonts.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
                }
            }
            if !self.image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &self.image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        self.pdf
            .document_info(info_id)
            .title(TextStr(&info.title))
            .author(TextStr(&info.author))
            .creator(TextStr(concat!("visit-report ", env!("CARGO_PKG_VERSION"))));

        Ok(self.pdf.finish())
    }
}
