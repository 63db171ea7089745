/// Embedded page view and its raster snapshot
use std::io::Cursor;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cubedeck_core::SnapshotError;
use image::{GrayImage, ImageFormat, Luma};

/// Tags whose content is never shown
const HIDDEN_TAGS: &[&str] = &["script", "style", "head", "noscript", "svg"];

/// Tags that start a new line
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "ul", "ol", "table", "pre", "blockquote", "title",
];

/// Pixels per character cell in a snapshot
const CELL_WIDTH: u32 = 2;
const CELL_HEIGHT: u32 = 4;

/// Readable text lines of an HTML document.
///
/// Deliberately small: tags are dropped, block tags break lines and the
/// common entities are decoded. No scripts run.
pub fn html_to_text(html: &str) -> Vec<String> {
    let mut text = String::new();
    let mut rest = html;
    let mut hidden: Option<String> = None;

    while let Some(open) = tag_start(rest) {
        if hidden.is_none() {
            text.push_str(&rest[..open]);
        }
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = after[..close].trim();
        rest = &after[close + 1..];

        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match &hidden {
            Some(open_tag) if closing && *open_tag == name => hidden = None,
            Some(_) => {}
            None if !closing && !tag.ends_with('/') && HIDDEN_TAGS.contains(&name.as_str()) => {
                hidden = Some(name)
            }
            None if BLOCK_TAGS.contains(&name.as_str()) => text.push('\n'),
            None => {}
        }
    }
    if hidden.is_none() {
        text.push_str(rest);
    }

    decode_entities(&text)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Byte offset of the next `<` that opens a tag, comment or doctype
fn tag_start(html: &str) -> Option<usize> {
    html.match_indices('<').map(|(at, _)| at).find(|&at| {
        html[at + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
    })
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Fetched page shown full screen until the user closes it
#[derive(Debug, Clone)]
pub struct EmbeddedView {
    lines: Vec<String>,
    shown_at: Instant,
    ready_sent: bool,
}

impl EmbeddedView {
    pub fn new(html: &str, now: Instant) -> Self {
        Self {
            lines: html_to_text(html),
            shown_at: now,
            ready_sent: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True exactly once, after the page has been visible for `dwell`
    pub fn take_ready(&mut self, now: Instant, dwell: Duration) -> bool {
        if self.ready_sent || now.saturating_duration_since(self.shown_at) < dwell {
            return false;
        }
        self.ready_sent = true;
        true
    }

    /// Rasterize the first `columns` x `rows` cells as a PNG data URL
    pub fn snapshot(&self, columns: u32, rows: u32) -> Result<String, SnapshotError> {
        if columns == 0 || rows == 0 {
            return Err(SnapshotError(format!("empty viewport {columns}x{rows}")));
        }
        let mut image = GrayImage::from_pixel(columns * CELL_WIDTH, rows * CELL_HEIGHT, Luma([255]));
        for (row, line) in self.lines.iter().take(rows as usize).enumerate() {
            for (column, c) in line.chars().take(columns as usize).enumerate() {
                if c.is_whitespace() {
                    continue;
                }
                let (x0, y0) = (column as u32 * CELL_WIDTH, row as u32 * CELL_HEIGHT);
                // Ink the middle of the cell, leaving line spacing
                for y in y0 + 1..y0 + CELL_HEIGHT - 1 {
                    for x in x0..x0 + CELL_WIDTH {
                        image.put_pixel(x, y, Luma([32]));
                    }
                }
            }
        }

        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|err| SnapshotError(err.to_string()))?;
        Ok(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(out.into_inner())
        ))
    }
}
