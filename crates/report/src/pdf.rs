//! A4 PDF rendering of a `ReportTable`.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::ReportError;
use crate::table::ReportTable;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 12.0;
const ROW_HEIGHT: f32 = 6.0;
const TITLE_SIZE: f32 = 16.0;
const CELL_SIZE: f32 = 9.0;
/// Rough Helvetica advance at `CELL_SIZE`, used to clip cells to their column.
const CHAR_WIDTH: f32 = 1.9;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

pub fn render_pdf(table: &ReportTable, generated_at: DateTime<Utc>) -> Result<Vec<u8>, ReportError> {
    let (doc, page, layer) =
        PdfDocument::new(table.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    let columns = table.headers.len().max(1);
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
    let max_chars = ((column_width / CHAR_WIDTH) as usize).max(3);

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text(
        table.title.as_str(),
        TITLE_SIZE,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - MARGIN - 4.0),
        &fonts.bold,
    );
    let mut y = PAGE_HEIGHT - MARGIN - 16.0;
    draw_row(&current, &fonts.bold, &table.headers, y, column_width, max_chars);
    y -= ROW_HEIGHT;

    for row in &table.rows {
        if y < MARGIN + 2.0 * ROW_HEIGHT {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT - MARGIN - 4.0;
            draw_row(&current, &fonts.bold, &table.headers, y, column_width, max_chars);
            y -= ROW_HEIGHT;
        }
        draw_row(&current, &fonts.regular, row, y, column_width, max_chars);
        y -= ROW_HEIGHT;
    }

    if table.is_empty() {
        current.use_text("No rows.", CELL_SIZE, Mm(MARGIN), Mm(y), &fonts.regular);
    }

    current.use_text(
        format!("Generated at {}", generated_at.format("%d/%m/%Y %H:%M UTC")),
        CELL_SIZE,
        Mm(MARGIN),
        Mm(MARGIN),
        &fonts.regular,
    );

    doc.save_to_bytes().map_err(pdf_error)
}

fn draw_row<S: AsRef<str>>(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    cells: &[S],
    y: f32,
    column_width: f32,
    max_chars: usize,
) {
    for (i, cell) in cells.iter().enumerate() {
        let x = MARGIN + i as f32 * column_width;
        layer.use_text(clip(cell.as_ref(), max_chars), CELL_SIZE, Mm(x), Mm(y), font);
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn pdf_error(e: printpdf::Error) -> ReportError {
    ReportError::Pdf(e.to_string())
}
