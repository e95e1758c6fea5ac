use crate::model::{Align, DrawOp, FontStyle, VisitRecord};

use super::layout::{DrawingContext, TextStyle, draw_cell, wrap_text};

const ROW_HEIGHT: f32 = 8.0;
const FRAME_PADDING: f32 = 5.0;
const FRAME_SHADE: [u8; 3] = [240, 240, 240];
const LABEL: TextStyle = TextStyle::new(FontStyle::Bold, 10.0);
const VALUE: TextStyle = TextStyle::new(FontStyle::Regular, 10.0);

/// One labeled value in the information grid. A `value_width` of `None`
/// wraps the value over the rest of the row.
struct FieldCell {
    label: &'static str,
    label_width: f32,
    value: String,
    value_width: Option<f32>,
}

impl FieldCell {
    fn fixed(label: &'static str, label_width: f32, value: String, value_width: f32) -> Self {
        Self {
            label,
            label_width,
            value,
            value_width: Some(value_width),
        }
    }
}

struct RowLayout {
    // wrapped value lines per cell
    cell_lines: Vec<Vec<String>>,
    // value column (x, width) per cell
    value_columns: Vec<(f32, f32)>,
}

impl RowLayout {
    fn line_count(&self) -> usize {
        self.cell_lines.iter().map(Vec::len).max().unwrap_or(1).max(1)
    }
}

/// Rows for the visit record; optional fields that are unset produce no row.
fn field_rows(visit: &VisitRecord) -> Vec<Vec<FieldCell>> {
    let mut rows = vec![
        vec![
            FieldCell::fixed("Date:", 25.0, visit.display_date(), 65.0),
            FieldCell::fixed("Rédacteur:", 35.0, visit.author.clone(), 55.0),
        ],
        vec![FieldCell::fixed("Adresse:", 25.0, visit.address.clone(), 150.0)],
    ];
    if let Some(t) = visit.arrival_time {
        rows.push(vec![FieldCell::fixed(
            "Heure d'arrivée:",
            35.0,
            t.format("%H:%M").to_string(),
            65.0,
        )]);
    }
    if let Some(t) = visit.departure_time {
        rows.push(vec![FieldCell::fixed(
            "Heure de départ:",
            35.0,
            t.format("%H:%M").to_string(),
            65.0,
        )]);
    }
    rows.push(vec![FieldCell::fixed(
        "Code:",
        25.0,
        visit.building_code.clone(),
        65.0,
    )]);
    if let Some(persons) = visit.persons_present() {
        rows.push(vec![FieldCell {
            label: "Personnes présentes:",
            label_width: 45.0,
            value: persons.to_string(),
            value_width: None,
        }]);
    }
    rows
}

fn compute_row_layouts(rows: &[Vec<FieldCell>], row_x: f32, row_right: f32) -> Vec<RowLayout> {
    rows.iter()
        .map(|cells| {
            let mut x = row_x;
            let mut value_columns = Vec::with_capacity(cells.len());
            let cell_lines = cells
                .iter()
                .map(|cell| {
                    x += cell.label_width;
                    let width = cell.value_width.unwrap_or(row_right - x);
                    value_columns.push((x, width));
                    x += width;
                    match cell.value_width {
                        Some(_) => vec![cell.value.clone()],
                        None => wrap_text(
                            &cell.value,
                            VALUE.style,
                            VALUE.size,
                            width - 2.0 * super::layout::CELL_PADDING,
                        ),
                    }
                })
                .collect();
            RowLayout {
                cell_lines,
                value_columns,
            }
        })
        .collect()
}

/// Part of the shaded frame that sits on one page. Cell text is buffered so
/// the shade can be painted underneath it when the part is closed.
struct FrameSegment {
    top: f32,
    ops: Vec<DrawOp>,
}

impl FrameSegment {
    fn open(top: f32) -> Self {
        Self {
            top,
            ops: Vec::new(),
        }
    }

    fn close(&mut self, ctx: &mut DrawingContext<'_>, bottom: f32) {
        let g = ctx.geometry;
        let (x, width) = (g.margin_left, g.content_width());
        ctx.fill_rect(x, self.top, width, bottom - self.top, FRAME_SHADE);
        for op in std::mem::take(&mut self.ops) {
            ctx.draw(op);
        }
    }
}

/// Draw the information grid at the cursor and leave the cursor just below
/// the frame.
///
/// The first line of every row is kept together in one frame. Continuation
/// lines of a wrapped value flow onto following pages when the frame would
/// cross the bottom limit; each page then gets its own part of the frame.
pub(super) fn render_field_table(ctx: &mut DrawingContext<'_>, visit: &VisitRecord) {
    let g = ctx.geometry;
    let row_x = g.margin_left + FRAME_PADDING;
    let row_right = g.page_width - g.margin_right;
    let rows = field_rows(visit);
    let layouts = compute_row_layouts(&rows, row_x, row_right);

    let lines: usize = layouts.iter().map(RowLayout::line_count).sum();
    let full_h = 2.0 * FRAME_PADDING + lines as f32 * ROW_HEIGHT;
    let head_h = 2.0 * FRAME_PADDING + layouts.len() as f32 * ROW_HEIGHT;
    let top = if ctx.cursor().fits(full_h) {
        ctx.reserve(full_h)
    } else {
        ctx.reserve(head_h)
    };

    let mut segment = FrameSegment::open(top);
    ctx.set_y(top + FRAME_PADDING);
    for (cells, layout) in rows.iter().zip(&layouts) {
        let row_y = ctx.y();
        for (cell, &(value_x, _)) in cells.iter().zip(&layout.value_columns) {
            let label_x = value_x - cell.label_width;
            draw_cell(
                &mut segment.ops,
                label_x,
                row_y,
                cell.label_width,
                ROW_HEIGHT,
                cell.label,
                LABEL,
                Align::Left,
            );
        }
        draw_row_line(&mut segment.ops, layout, 0, row_y);
        ctx.advance(ROW_HEIGHT);

        for i in 1..layout.line_count() {
            if !ctx.cursor().fits(ROW_HEIGHT + FRAME_PADDING) {
                let bottom = ctx.y() + FRAME_PADDING;
                segment.close(ctx, bottom);
                ctx.page_break();
                segment = FrameSegment::open(ctx.y());
                ctx.advance(FRAME_PADDING);
            }
            draw_row_line(&mut segment.ops, layout, i, ctx.y());
            ctx.advance(ROW_HEIGHT);
        }
    }
    ctx.advance(FRAME_PADDING);
    let bottom = ctx.y();
    segment.close(ctx, bottom);
}

/// Value text of line `i` of a row, for every cell that has that many lines.
fn draw_row_line(ops: &mut Vec<DrawOp>, layout: &RowLayout, i: usize, y: f32) {
    for (lines, &(x, width)) in layout.cell_lines.iter().zip(&layout.value_columns) {
        if let Some(line) = lines.get(i) {
            draw_cell(ops, x, y, width, ROW_HEIGHT, line, VALUE, Align::Left);
        }
    }
}
