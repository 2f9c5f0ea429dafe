use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::core::error::{AppError, Result};

const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;
const FONT_SIZE: f32 = 10.0;
const BOTTOM_MARGIN_PT: f32 = 40.0;
const TOP_PT: f32 = 750.0;

const LINE_HEIGHT_PT: f32 = 12.0;

/// PDF coordinates are points from the bottom-left corner; printpdf wants mm
fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn pdf_error(e: printpdf::Error) -> AppError {
    tracing::error!("PDF rendering failed: {:?}", e);
    AppError::Internal("Failed to render PDF".to_string())
}

/// Greedy word wrap to at most `width` characters per line.
/// Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }

            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }

    lines
}

/// Single-font document written top to bottom, one line at a time
pub struct CourierDocument {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    layer: PdfLayerReference,
    cursor: f32,
    pages: usize,
}

impl CourierDocument {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Page 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            font,
            layer,
            cursor: TOP_PT,
            pages: 1,
        })
    }

    /// Draw text at an absolute position on the current page
    pub fn text_at(&self, x: f32, y: f32, text: &str) {
        self.layer
            .use_text(text, FONT_SIZE, mm(x), mm(y), &self.font);
    }

    /// Continue writing lines at `y` on the current page
    pub fn move_to(&mut self, y: f32) {
        self.cursor = y;
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            mm(PAGE_WIDTH_PT),
            mm(PAGE_HEIGHT_PT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = TOP_PT;
    }

    /// Write one line at the cursor, starting a new page when the current one is full
    pub fn line(&mut self, x: f32, text: &str) {
        if self.cursor < BOTTOM_MARGIN_PT {
            self.new_page();
        }
        self.text_at(x, self.cursor, text);
        self.cursor -= LINE_HEIGHT_PT;
    }

    pub fn blank(&mut self) {
        self.cursor -= LINE_HEIGHT_PT;
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap("abcdefghijkl", 5), vec!["abcde", "fghij", "kl"]);
        assert_eq!(wrap("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn test_document_renders_and_paginates() {
        let mut doc = CourierDocument::new("test").unwrap();
        doc.text_at(15.0, 750.0, "Print Date:");
        doc.move_to(720.0);
        for i in 0..80 {
            doc.line(15.0, &format!("line {}", i));
        }
        assert_eq!(doc.page_count(), 2);

        let bytes = doc.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
