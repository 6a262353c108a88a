//! Minimal PDF 1.4 writer for laid-out [`Document`]s. Text only, using the
//! base-14 Helvetica font so nothing has to be embedded.

use std::fmt::Write;

use crate::layout::{Document, Page, PAGE_HEIGHT, PAGE_WIDTH};

const PT_PER_MM: f64 = 72.0 / 25.4;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;
const FIRST_PAGE_ID: usize = 4;

struct PdfWriter {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut writer = PdfWriter {
            buffer: Vec::new(),
            offsets: Vec::new(),
        };
        writer.buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        writer
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, id: usize, body: &str) {
        debug_assert_eq!(self.offsets.len() + 1, id);
        self.offsets.push(self.buffer.len());
        self.buffer
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, id: usize, content: &str) {
        let body = format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        );
        self.object(id, &body);
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buffer.len();
        let mut trailer = String::new();
        let _ = writeln!(trailer, "xref");
        let _ = writeln!(trailer, "0 {}", self.offsets.len() + 1);
        let _ = writeln!(trailer, "0000000000 65535 f ");
        for offset in &self.offsets {
            let _ = writeln!(trailer, "{offset:010} 00000 n ");
        }
        let _ = writeln!(trailer, "trailer");
        let _ = writeln!(
            trailer,
            "<< /Size {} /Root {CATALOG_ID} 0 R >>",
            self.offsets.len() + 1
        );
        let _ = writeln!(trailer, "startxref");
        let _ = writeln!(trailer, "{xref_offset}");
        trailer.push_str("%%EOF\n");
        self.buffer.extend_from_slice(trailer.as_bytes());
        self.buffer
    }
}

pub fn to_bytes(document: &Document) -> Vec<u8> {
    let mut writer = PdfWriter::new();
    let page_ids: Vec<usize> = (0..document.pages.len())
        .map(|index| FIRST_PAGE_ID + index * 2)
        .collect();

    writer.object(CATALOG_ID, &format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"));
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(
        PAGES_ID,
        &format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            page_ids.len()
        ),
    );
    writer.object(
        FONT_ID,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    let media_box = format!(
        "[0 0 {:.2} {:.2}]",
        PAGE_WIDTH * PT_PER_MM,
        PAGE_HEIGHT * PT_PER_MM
    );
    for (page, id) in document.pages.iter().zip(&page_ids) {
        writer.object(
            *id,
            &format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox {media_box} \
                 /Resources << /Font << /F1 {FONT_ID} 0 R >> >> /Contents {} 0 R >>",
                id + 1
            ),
        );
        writer.stream(id + 1, &content_stream(page));
    }

    writer.finish()
}

fn content_stream(page: &Page) -> String {
    let mut content = String::new();
    for run in &page.runs {
        let _ = writeln!(
            content,
            "BT /F1 {:.1} Tf {:.3} {:.3} {:.3} rg {:.2} {:.2} Td ({}) Tj ET",
            run.size,
            f64::from(run.color.0) / 255.0,
            f64::from(run.color.1) / 255.0,
            f64::from(run.color.2) / 255.0,
            run.x * PT_PER_MM,
            (PAGE_HEIGHT - run.y) * PT_PER_MM,
            escape_text(&run.text)
        );
    }
    content
}

/// PDF literal-string escaping. Latin-1 characters are written as octal
/// WinAnsi codes; anything outside that range becomes '?'.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' | '\t' => escaped.push(' '),
            ' '..='~' => escaped.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}
