use crate::config::PageGeometry;
use crate::fonts::{size_mm, text_width};
use crate::model::{Align, DrawOp, FontStyle, ImageId, PageLayout};
use crate::sanitize::sanitize_text;

/// Horizontal padding inside a text cell.
pub(super) const CELL_PADDING: f32 = 1.0;

/// Position of the layout engine: 1-based page number and vertical offset
/// (mm from the top edge) on that page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Cursor {
    page: usize,
    y: f32,
    top: f32,
    bottom: f32,
}

impl Cursor {
    pub(super) fn new(geometry: &PageGeometry) -> Self {
        Self {
            page: 1,
            y: geometry.content_top,
            top: geometry.content_top,
            bottom: geometry.content_bottom(),
        }
    }

    pub(super) fn page(&self) -> usize {
        self.page
    }

    pub(super) fn remaining(&self) -> f32 {
        self.bottom - self.y
    }

    pub(super) fn fits(&self, height: f32) -> bool {
        self.y + height <= self.bottom + 0.01
    }

    pub(super) fn at_top(&self) -> bool {
        (self.y - self.top).abs() < 0.01
    }

    fn next_page(&mut self) {
        self.page += 1;
        self.y = self.top;
    }
}

/// Per-report drawing state: the cursor plus every page laid out so far.
/// Renderers receive it explicitly and push draw commands onto the current
/// page.
pub(super) struct DrawingContext<'a> {
    pub(super) geometry: &'a PageGeometry,
    cursor: Cursor,
    pages: Vec<PageLayout>,
    current: PageLayout,
}

impl<'a> DrawingContext<'a> {
    pub(super) fn new(geometry: &'a PageGeometry) -> Self {
        Self {
            geometry,
            cursor: Cursor::new(geometry),
            pages: Vec::new(),
            current: PageLayout::default(),
        }
    }

    pub(super) fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub(super) fn y(&self) -> f32 {
        self.cursor.y
    }

    /// Finish the current page and continue at the top of a new one.
    pub(super) fn page_break(&mut self) {
        log::debug!(
            "Page break after page {} at y={:.1}mm",
            self.cursor.page,
            self.cursor.y
        );
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor.next_page();
    }

    /// Make room for a block of `height` mm, breaking first when it would cross
    /// the bottom limit. A fresh page is never broken again, so an oversized
    /// block starts at the top instead of producing blank pages. Returns the
    /// block's top y.
    pub(super) fn reserve(&mut self, height: f32) -> f32 {
        if !self.cursor.fits(height) && !self.cursor.at_top() {
            self.page_break();
        }
        self.cursor.y
    }

    /// Move down without a break check; callers reserve first.
    pub(super) fn advance(&mut self, height: f32) {
        self.cursor.y += height;
    }

    /// Vertical spacing between blocks. Spacing that would run past the
    /// bottom limit is swallowed by a page break.
    pub(super) fn skip(&mut self, height: f32) {
        if self.cursor.fits(height) {
            self.cursor.y += height;
        } else if !self.cursor.at_top() {
            self.page_break();
        }
    }

    /// Break unless at least `budget` mm remain below the cursor.
    pub(super) fn ensure_remaining(&mut self, budget: f32) {
        if self.cursor.remaining() < budget && !self.cursor.at_top() {
            self.page_break();
        }
    }

    pub(super) fn set_y(&mut self, y: f32) {
        self.cursor.y = y;
    }

    pub(super) fn draw(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }

    pub(super) fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        self.draw(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    pub(super) fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        self.draw(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    /// Single-line cell of `height` mm at the cursor. The cursor is not moved.
    pub(super) fn cell(
        &mut self,
        x: f32,
        width: f32,
        height: f32,
        text: &str,
        font: TextStyle,
        align: Align,
    ) {
        let y = self.cursor.y;
        draw_cell(&mut self.current.ops, x, y, width, height, text, font, align);
    }

    pub(super) fn image(&mut self, id: ImageId, x: f32, y: f32, width: f32, height: f32) {
        self.draw(DrawOp::Image {
            id,
            x,
            y,
            width,
            height,
        });
    }

    pub(super) fn finish(mut self) -> Vec<PageLayout> {
        self.pages.push(self.current);
        self.pages
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct TextStyle {
    pub(super) style: FontStyle,
    pub(super) size: f32,
    pub(super) color: [u8; 3],
}

impl TextStyle {
    pub(super) const fn new(style: FontStyle, size: f32) -> Self {
        Self {
            style,
            size,
            color: [0, 0, 0],
        }
    }

    pub(super) const fn colored(self, color: [u8; 3]) -> Self {
        Self { color, ..self }
    }
}

pub(super) fn push_text(ops: &mut Vec<DrawOp>, x: f32, y: f32, text: &str, font: TextStyle) {
    let text = sanitize_text(text);
    if text.trim().is_empty() {
        return;
    }
    ops.push(DrawOp::Text {
        x,
        y,
        text,
        style: font.style,
        size: font.size,
        color: font.color,
    });
}

/// Text vertically centred in a cell of `height`, padded horizontally.
pub(super) fn draw_cell(
    ops: &mut Vec<DrawOp>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    text: &str,
    font: TextStyle,
    align: Align,
) {
    let clean = sanitize_text(text);
    let baseline = y + 0.5 * height + 0.3 * size_mm(font.size);
    let tx = match align {
        Align::Left => x + CELL_PADDING,
        Align::Center => x + (width - text_width(&clean, font.style, font.size)) / 2.0,
    };
    push_text(ops, tx, baseline, &clean, font);
}

/// Break sanitized text into lines no wider than `max_width` mm. Explicit
/// line breaks are kept; words longer than a line are split by character.
pub(super) fn wrap_text(text: &str, style: FontStyle, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in crate::sanitize::sanitize_lines(text) {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, style, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, style, size) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if text_width(&current, style, size) > max_width && current.len() > 1 {
                        current.pop();
                        lines.push(std::mem::replace(&mut current, ch.to_string()));
                    }
                }
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Render pre-wrapped lines top-down from the cursor, one `line_h` row each.
/// The caller has reserved the space; lines that still cross the bottom
/// limit (a paragraph taller than a whole page) continue on the next page.
pub(super) fn render_lines(
    ctx: &mut DrawingContext<'_>,
    lines: &[String],
    x: f32,
    width: f32,
    line_h: f32,
    font: TextStyle,
) {
    for line in lines {
        ctx.reserve(line_h);
        ctx.cell(x, width, line_h, line, font, Align::Left);
        ctx.advance(line_h);
    }
}
