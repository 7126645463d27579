//! Text rendering of the history and the aspect-ratio picker.

use crate::history::History;
use crate::models::{AspectRatio, GeneratedImage, GenerationSettings};
use std::fmt::Write as _;

const ID_WIDTH: usize = 8;
const PROMPT_WIDTH: usize = 60;

pub const EMPTY_GALLERY: &str = "No images generated yet\nStart by entering a prompt above";

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

fn render_entry(image: &GeneratedImage) -> String {
    let created = image
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let id = image.id.to_string();

    format!(
        "{}  {:>5}  {}  \"{}\"",
        &id[..ID_WIDTH],
        image.aspect_ratio.as_str(),
        created,
        truncate(&image.prompt, PROMPT_WIDTH)
    )
}

/// One line per record, newest first.
pub fn render_history(history: &History) -> String {
    if history.is_empty() {
        return EMPTY_GALLERY.to_string();
    }

    let mut out = format!("History ({})\n", history.len());
    for image in history.iter() {
        let _ = writeln!(out, "{}", render_entry(image));
    }
    out.trim_end().to_string()
}

/// The aspect-ratio choices, marking the current selection.
pub fn render_aspect_ratios(settings: GenerationSettings) -> String {
    AspectRatio::ALL
        .iter()
        .map(|ratio| {
            let marker = if *ratio == settings.aspect_ratio { '*' } else { ' ' };
            format!("{} {:>5}  {}", marker, ratio.as_str(), ratio.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
