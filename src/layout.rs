//! Fixed-size page layout: a vertical cursor that breaks to a new page when
//! the space left above the bottom threshold runs out, plus text measurement
//! for the Helvetica base-14 font. All positions are millimetres from the
//! top-left corner of an A4 page; font sizes are points.

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 20.0;
/// Cursor position at the top of every page.
pub const TOP: f64 = 30.0;
/// Deepest position an item may start at.
pub const BOTTOM_LIMIT: f64 = 270.0;
pub const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

const MM_PER_PT: f64 = 25.4 / 72.0;

/// Helvetica advance widths (1/1000 em) for ' '..='~'.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];
const DEFAULT_WIDTH: u16 = 556;

fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - ' ' as usize],
        _ => DEFAULT_WIDTH,
    }
}

/// Rendered width of `text` in millimetres.
pub fn text_width(text: &str, size: f64) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    f64::from(units) / 1000.0 * size * MM_PER_PT
}

/// Greedy word wrap to `max_width` mm. Leading whitespace is kept on the
/// first line only; words wider than a line are split between characters.
pub fn wrap_text(text: &str, max_width: f64, size: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let indent = paragraph.len() - paragraph.trim_start().len();
        let mut line = paragraph[..indent].to_string();
        let mut has_word = false;

        for word in paragraph.split_whitespace() {
            let candidate = if has_word {
                format!("{line} {word}")
            } else {
                format!("{line}{word}")
            };
            if text_width(&candidate, size) <= max_width {
                line = candidate;
                has_word = true;
                continue;
            }

            if has_word {
                lines.push(std::mem::take(&mut line));
            }
            let mut rest = format!("{line}{word}");
            while text_width(&rest, size) > max_width {
                let split = fitting_prefix(&rest, max_width, size);
                lines.push(rest[..split].to_string());
                rest = rest[split..].to_string();
            }
            line = rest;
            has_word = true;
        }

        lines.push(line);
    }

    lines
}

/// Byte length of the longest prefix that fits, never less than one char.
fn fitting_prefix(text: &str, max_width: f64, size: f64) -> usize {
    let mut width = 0.0;
    for (index, c) in text.char_indices() {
        width += f64::from(char_width(c)) / 1000.0 * size * MM_PER_PT;
        if width > max_width {
            return if index == 0 { c.len_utf8() } else { index };
        }
    }
    text.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    /// Baseline, measured from the top edge.
    pub y: f64,
    pub size: f64,
    pub color: Rgb,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    /// Writes one line at `y` on every page; `label` gets the 1-based page
    /// number and the page count.
    pub fn stamp_pages<F>(&mut self, y: f64, size: f64, color: Rgb, label: F)
    where
        F: Fn(usize, usize) -> String,
    {
        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            page.runs.push(TextRun {
                x: MARGIN,
                y,
                size,
                color,
                text: label(index + 1, total),
            });
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.runs.iter().map(|run| run.text.as_str()))
    }
}

/// Layout state: current page and vertical position.
#[derive(Debug, Clone)]
pub struct PageCursor {
    y: f64,
    document: Document,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    pub fn new() -> Self {
        PageCursor {
            y: TOP,
            document: Document {
                pages: vec![Page::default()],
            },
        }
    }

    pub fn page_index(&self) -> usize {
        self.document.pages.len() - 1
    }

    pub fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    /// Starts a new page when `reserve` mm below the cursor would cross
    /// [`BOTTOM_LIMIT`]. Returns whether a break happened.
    pub fn ensure_space(&mut self, reserve: f64) -> bool {
        if self.y + reserve <= BOTTOM_LIMIT {
            return false;
        }
        self.document.pages.push(Page::default());
        tracing::debug!(
            page = self.page_index() + 1,
            overflow_at = self.y,
            "page break"
        );
        self.y = TOP;
        true
    }

    /// Writes one line at the cursor without moving it.
    pub fn text(&mut self, size: f64, color: Rgb, text: impl Into<String>) {
        let y = self.y;
        self.current_page().runs.push(TextRun {
            x: MARGIN,
            y,
            size,
            color,
            text: text.into(),
        });
    }

    /// Wraps `text` to the content width and writes it from the cursor
    /// down, `line_height` apart. Returns the number of lines; the cursor
    /// is left on the first line.
    pub fn wrapped(&mut self, size: f64, color: Rgb, text: &str, line_height: f64) -> usize {
        let lines = wrap_text(text, CONTENT_WIDTH, size);
        let top = self.y;
        for (index, line) in lines.iter().enumerate() {
            self.current_page().runs.push(TextRun {
                x: MARGIN,
                y: top + index as f64 * line_height,
                size,
                color,
                text: line.clone(),
            });
        }
        lines.len()
    }

    pub fn finish(self) -> Document {
        self.document
    }

    fn current_page(&mut self) -> &mut Page {
        let last = self.document.pages.len() - 1;
        &mut self.document.pages[last]
    }
}
