//! Utility functions for visualization: colors, label formatting, font setup.

use crate::view::Rgb;
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Plotters color for a config color.
#[inline]
pub fn to_rgba(c: Rgb, opacity: f64) -> RGBAColor {
    RGBColor(c.0, c.1, c.2).mix(opacity)
}

/// Tick label with thousands separators and as many decimals as the tick
/// step needs (`step = 0.2` -> one decimal, `step >= 1` -> none).
pub fn format_tick(v: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10()).ceil() as usize
    } else {
        0
    };
    let fixed = format!("{:.*}", decimals, v.abs());
    let (int_part, frac) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = int_part
        .parse::<u64>()
        .map(|n| n.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| int_part.to_string());
    // no "-0" for values that round to zero
    let negative = v < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `"Avg Temp: 15.00°C"`, `"Precipitation: 150.00 mm"`. Degree and percent
/// units attach to the number, others are spaced.
pub fn format_reading(label: &str, value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(u) if u.starts_with('°') || u == "%" => format!("{label}: {value:.2}{u}"),
        Some(u) => format!("{label}: {value:.2} {u}"),
        None => format!("{label}: {value:.2}"),
    }
}

const FONT_CANDIDATES: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Register a "sans-serif" font for the `ab_glyph` text path, once.
///
/// `ab_glyph` does not discover OS fonts, so the file comes from
/// `CLIMATE_VIZ_FONT` or a few well-known locations. Returns whether a font is
/// available; bitmap output without one is drawn without text.
pub fn ensure_fonts_registered() -> bool {
    *FONT_READY.get_or_init(|| {
        let env_path = std::env::var_os("CLIMATE_VIZ_FONT").map(PathBuf::from);
        let candidates = env_path
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if plotters::style::register_font("sans-serif", plotters::style::FontStyle::Normal, bytes).is_ok() {
                log::debug!("registered chart font {}", path.display());
                return true;
            }
        }
        log::warn!("no TTF font found (set CLIMATE_VIZ_FONT); bitmap charts will have no text");
        false
    })
}
