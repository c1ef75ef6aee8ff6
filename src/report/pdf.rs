//! A minimal text-only PDF writer.
//!
//! Reports only need lines of Helvetica text on A4 pages, so rather than a
//! layout engine this keeps a vertical cursor, measured from the top of the
//! page, and emits one text operation per line.

use lopdf::{
    Document, Object, Stream, StringFormat,
    content::{Content, Operation},
    dictionary,
};

use crate::Error;

/// The width of an A4 page in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// The height of an A4 page in points.
pub const PAGE_HEIGHT: f32 = 841.89;
/// The margin on every side of the page in points.
pub const MARGIN: f32 = 50.0;

/// Line height as a multiple of the font size.
const LEADING: f32 = 1.2;

/// The fonts available to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    /// Approximate advance width of `c` in thousandths of the font size.
    ///
    /// The standard 14 fonts are not embedded, so exact metrics are not
    /// needed; these are close enough to centre a heading.
    fn char_width(&self, c: char) -> f32 {
        let width = match c {
            ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | 'i' | 'j' | 'l' | 'I' | '|' => 278.0,
            '(' | ')' | '-' | 'f' | 't' | 'r' => 333.0,
            '0'..='9' | '$' => 556.0,
            'm' | 'M' | 'W' => 833.0,
            'w' => 722.0,
            c if c.is_ascii_uppercase() => 667.0,
            _ => 556.0,
        };

        match self {
            Font::Regular => width,
            Font::Bold => width * 1.05,
        }
    }
}

/// Horizontal alignment of a line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Start at the left margin.
    Left,
    /// Centre between the margins.
    Center,
}

/// Writes lines of text onto A4 pages.
pub struct PdfWriter {
    pages: Vec<Vec<Operation>>,
    /// Distance from the top of the current page to the top of the next line.
    cursor: f32,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    /// Create a writer with one empty page.
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: MARGIN,
        }
    }

    /// The distance from the top of the current page to where the next line
    /// will be written.
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// The number of pages written so far, including the current one.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a new page and move the cursor to its top margin.
    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = MARGIN;
    }

    /// Write a line of text at the cursor and move the cursor below it.
    ///
    /// A new page is started first if the line would cross the bottom margin.
    pub fn text(&mut self, text: &str, font: Font, size: f32, align: Align) {
        let line_height = size * LEADING;
        if self.cursor + line_height > PAGE_HEIGHT - MARGIN {
            self.add_page();
        }

        let baseline = PAGE_HEIGHT - self.cursor - size;
        self.draw(text, font, size, align, baseline);
        self.cursor += line_height;
    }

    /// Move the cursor down by `lines` lines of text of the given `size`.
    pub fn move_down(&mut self, lines: f32, size: f32) {
        self.cursor += lines * size * LEADING;
    }

    /// Write a line of text just above the bottom margin of the current page,
    /// without moving the cursor.
    pub fn text_at_bottom(&mut self, text: &str, font: Font, size: f32, align: Align) {
        self.draw(text, font, size, align, MARGIN);
    }

    fn draw(&mut self, text: &str, font: Font, size: f32, align: Align, baseline: f32) {
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => {
                let width: f32 = text.chars().map(|c| font.char_width(c)).sum::<f32>() * size
                    / 1000.0;
                ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
            }
        };

        let operations = [
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource_name().into(), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];

        if let Some(page) = self.pages.last_mut() {
            page.extend(operations);
        }
    }

    /// Encode the pages as a standalone PDF document.
    ///
    /// # Errors
    /// Returns [Error::RenderError] if a content stream or the document cannot
    /// be encoded.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for font in [Font::Regular, Font::Bold] {
            let font_id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }
        let resources_id = document.add_object(dictionary! { "Font" => fonts });

        let mut kids = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations }
                .encode()
                .map_err(|error| Error::RenderError(error.to_string()))?;
            let content_id = document.add_object(Stream::new(dictionary! {}, content));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }
            .into(),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(|error| Error::RenderError(error.to_string()))?;

        Ok(bytes)
    }
}

/// Encode `text` for a font using WinAnsiEncoding.
///
/// Characters outside Latin-1 are replaced with '?' and logged at the `debug`
/// level.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut replaced = 0;
    let bytes = text
        .chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => {
                replaced += 1;
                b'?'
            }
        })
        .collect();

    if replaced > 0 {
        tracing::debug!("replaced {replaced} character(s) outside Latin-1 in {text:?} with '?'");
    }

    bytes
}

#[cfg(test)]
mod pdf_writer_tests {
    use crate::{
        report::pdf::{Align, Font, MARGIN, PdfWriter, encode_win_ansi},
        test_utils::page_texts,
    };

    #[test]
    fn writes_lines_in_order() {
        let mut writer = PdfWriter::new();
        writer.text("Title", Font::Bold, 24.0, Align::Center);
        writer.text("first", Font::Regular, 10.0, Align::Left);
        writer.text("second", Font::Regular, 10.0, Align::Left);

        let pages = page_texts(&writer.finish().unwrap());

        assert_eq!(pages, vec![vec!["Title", "first", "second"]]);
    }

    #[test]
    fn overflowing_lines_start_a_new_page() {
        let mut writer = PdfWriter::new();
        for i in 0..100 {
            writer.text(&format!("line {i}"), Font::Regular, 10.0, Align::Left);
        }

        assert!(writer.page_count() > 1);
        let pages = page_texts(&writer.finish().unwrap());
        let lines: Vec<String> = pages.into_iter().flatten().collect();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[99], "line 99");
    }

    #[test]
    fn add_page_resets_cursor() {
        let mut writer = PdfWriter::new();
        writer.text("a", Font::Regular, 10.0, Align::Left);
        assert!(writer.cursor() > MARGIN);

        writer.add_page();

        assert_eq!(writer.cursor(), MARGIN);
        assert_eq!(writer.page_count(), 2);
    }

    #[test]
    fn non_latin_characters_are_replaced() {
        assert_eq!(encode_win_ansi("café €5"), b"caf\xe9 ?5".to_vec());
    }
}
