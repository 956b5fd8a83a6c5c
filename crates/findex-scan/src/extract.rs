//! Plain-text extraction from indexed files.
//!
//! Extraction never fails: any file that cannot be read, is too large,
//! or is in a binary format we do not parse contributes its display
//! name instead, so the record still matches on its name.

use findex_core::{FileCategory, FileDescriptor};
use std::path::Path;
use tracing::warn;

/// Turns file descriptors into searchable text.
pub struct ContentExtractor {
    /// Files larger than this are not read; their name stands in.
    max_size: u64,
}

impl ContentExtractor {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Extract text for one file, degrading to its name on any failure.
    pub async fn extract(&self, descriptor: &FileDescriptor) -> String {
        if descriptor.size > self.max_size {
            warn!(path = ?descriptor.path, size = descriptor.size, "File exceeds extraction limit");
            return descriptor.name.clone();
        }

        let text = match descriptor.category {
            FileCategory::Text => read_text(&descriptor.path).await,
            FileCategory::Document => {
                extract_document(&descriptor.path, &descriptor.extension).await
            }
            FileCategory::Image => Some(format!("Image file: {}", descriptor.path.display())),
            FileCategory::Audio | FileCategory::Video => {
                Some(format!("Media file: {}", descriptor.path.display()))
            }
            _ => None,
        };

        match text {
            Some(text) => text,
            None => descriptor.name.clone(),
        }
    }
}

async fn extract_document(path: &Path, extension: &str) -> Option<String> {
    match extension {
        ".html" | ".htm" => {
            let html = read_text(path).await?;
            Some(strip_html(&html))
        }
        ".rtf" => {
            let rtf = read_text(path).await?;
            Some(strip_rtf(&rtf))
        }
        // Binary office formats are not parsed; the name stands in
        ".pdf" | ".doc" | ".docx" | ".xls" | ".xlsx" | ".ppt" | ".pptx" | ".odt" | ".ods"
        | ".odp" => None,
        _ => read_text(path).await,
    }
}

async fn read_text(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path = ?path, error = %e, "Content unreadable, falling back to name");
            None
        }
    }
}

/// Drop script/style elements and all tags, collapsing whitespace.
fn strip_html(html: &str) -> String {
    let without_blocks = strip_element(&strip_element(html, "script"), "style");

    let mut text = String::with_capacity(without_blocks.len());
    let mut in_tag = false;
    for c in without_blocks.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    collapse_whitespace(&text)
}

/// Remove `<name ...>...</name>` blocks, case-insensitively.
fn strip_element(html: &str, name: &str) -> String {
    // ASCII-only fold keeps byte offsets aligned with the original
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", name);
    let close = format!("</{}>", name);

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open) {
        let start = pos + start;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => {
                // Unterminated block, drop the rest
                return out;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Strip RTF control words and group braces.
fn strip_rtf(rtf: &str) -> String {
    let mut text = String::with_capacity(rtf.len());
    let mut chars = rtf.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => {}
            '\\' => {
                // Control word: letters, optional digits, optional one space
                while chars.peek().is_some_and(|c| c.is_ascii_lowercase()) {
                    chars.next();
                }
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    chars.next();
                }
                if chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            _ => text.push(c),
        }
    }

    collapse_whitespace(&text)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
