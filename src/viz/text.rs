//! Text measurement for layout decisions (legend hit areas, tooltip boxes).
//! Plotters cannot measure text without a loaded font, so widths are estimated.

/// Average glyph advance as a fraction of the font size.
const ADVANCE: f64 = 0.6;

/// Estimated pixel width of a single line.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> f64 {
    (text.chars().count() as f64 * font_px as f64 * ADVANCE).ceil()
}

/// Width and height of a block of lines at `line_h` spacing.
pub fn estimate_block_size_px(lines: &[String], font_px: u32, line_h: f64) -> (f64, f64) {
    let w = lines
        .iter()
        .map(|l| estimate_text_width_px(l, font_px))
        .fold(0.0, f64::max);
    (w, lines.len() as f64 * line_h)
}

/// Cut `text` to at most `max_px`, marking the cut with an ellipsis.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: f64) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let per_char = font_px as f64 * ADVANCE;
    let keep = ((max_px / per_char).floor() as usize).saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}
