use colored::{ColoredString, Colorize};
use std::env;

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxStyle {
    Info,
    Success,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemStatus {
    Created,
    Unchanged,
    Skipped,
    Failed,
    Info,
    Pass,
    Fail,
}

impl ItemStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ItemStatus::Created => "✨",
            ItemStatus::Unchanged => "➖",
            ItemStatus::Skipped => "⏭",
            ItemStatus::Failed => "💥",
            ItemStatus::Info => "💡",
            ItemStatus::Pass => "✅",
            ItemStatus::Fail => "❌",
        }
    }

    fn paint(&self, s: &str) -> ColoredString {
        match self {
            ItemStatus::Created | ItemStatus::Pass => s.bright_green(),
            ItemStatus::Unchanged | ItemStatus::Skipped => s.bright_black(),
            ItemStatus::Failed | ItemStatus::Fail => s.bright_red(),
            ItemStatus::Info => s.cyan(),
        }
    }
}

pub fn terminal_width() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(80)
}

fn box_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

fn box_row(content: &str, width: usize) -> String {
    let padding = width.saturating_sub(2).saturating_sub(content.chars().count());
    let left = padding / 2;
    format!("║{}{}{}║", " ".repeat(left), content, " ".repeat(padding - left))
}

pub fn render_box(title: &str, subtitle: &str, style: BoxStyle) {
    let width = box_width();
    let paint = |s: String| match style {
        BoxStyle::Info => s.bright_cyan(),
        BoxStyle::Success => s.bright_green(),
        BoxStyle::Warning => s.bright_yellow(),
    };
    println!("{}", paint(format!("╔{}╗", "═".repeat(width - 2))));
    println!("{}", paint(box_row(title, width)).bold());
    if !subtitle.is_empty() {
        println!("{}", paint(box_row(subtitle, width)));
    }
    println!("{}", paint(format!("╚{}╝", "═".repeat(width - 2))));
}

pub fn print_section(title: &str) {
    println!();
    println!("  {}", title.bold());
}

pub fn print_status_line(message: &str, status: ItemStatus) {
    println!("  {} {}", status.paint(status.icon()), message.bright_white());
}

/// Collapses whitespace and caps length for single-line display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}
