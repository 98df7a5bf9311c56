//! UI utilities for qrbeam CLI.

use std::time::Duration;

const BOX_WIDTH: usize = 37;
const BAR_WIDTH: usize = 24;

/// A formatted box summarising the file being transferred.
pub struct FileBox<'a> {
    name: &'a str,
    lines: Vec<String>,
}

impl<'a> FileBox<'a> {
    /// Create a new file box.
    #[must_use]
    pub const fn new(name: &'a str) -> Self {
        Self {
            name,
            lines: Vec::new(),
        }
    }

    /// Add a detail line below the file name.
    #[must_use]
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Display the box to stdout.
    pub fn display(&self) {
        println!("  ┌{}┐", "─".repeat(BOX_WIDTH));
        println!("  │{}│", " ".repeat(BOX_WIDTH));
        println!("  │{}│", center_in_box(&truncate(self.name, BOX_WIDTH - 2), BOX_WIDTH));
        println!("  │{}│", " ".repeat(BOX_WIDTH));

        for line in &self.lines {
            println!("  │{}│", center_in_box(line, BOX_WIDTH));
        }
        if !self.lines.is_empty() {
            println!("  │{}│", " ".repeat(BOX_WIDTH));
        }

        println!("  └{}┘", "─".repeat(BOX_WIDTH));
    }
}

fn center_in_box(content: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(content_len);
    let left = padding / 2;
    let right = padding - left;
    format!("{}{}{}", " ".repeat(left), content, " ".repeat(right))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Render `received / total` as a fixed-width bar.
pub fn progress_bar(received: u32, total: u32) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (received.min(total) as usize * BAR_WIDTH) / total as usize
    };
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// List missing indices, eliding after `max_shown` entries.
///
/// `missing` may be lazy: only the entries shown are pulled from it.
/// `missing_count` is the full number of absent indices.
pub fn format_missing(
    missing: impl IntoIterator<Item = u32>,
    missing_count: u32,
    max_shown: usize,
) -> String {
    if missing_count == 0 {
        return "none".to_string();
    }

    let shown: Vec<String> = missing
        .into_iter()
        .take(max_shown)
        .map(|index| index.to_string())
        .collect();
    let hidden = (missing_count as usize).saturating_sub(shown.len());

    if hidden > 0 {
        format!("{} (+{} more)", shown.join(", "), hidden)
    } else {
        shown.join(", ")
    }
}

/// Format elapsed time as "M:SS".
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{}:{:02}", mins, secs)
}
