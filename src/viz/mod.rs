//! Chart rendering: paint a [`ChartLayout`] onto any plotters backend.
//!
//! - **SVG** to a string ([`render_svg`]) or a file ([`render_to_file`])
//! - **PNG** to a file, or into an RGB buffer for the desktop viewer ([`ChartSurface`])
//! - Zoom moves marks only; axes, gridlines and the legend stay put
//! - Marks are clipped to the plot area by hand
//!
//! Text goes through the `ab_glyph` path. When no font could be registered
//! the bitmap backends skip text instead of failing the whole chart.

pub mod layout;
pub mod text;
pub mod util;

use anyhow::{Result, anyhow};
use plotters_backend::DrawingErrorKind;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontFamily, FontTransform};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

use crate::interact::{Tooltip, ZoomTransform};
use crate::view::ViewState;
use layout::{AxisLayout, AxisSide, ChartLayout, LEGEND_FONT_PX, MarkShape, Rect};
use text::estimate_block_size_px;
use util::{ensure_fonts_registered, to_rgba};

const TICK_FONT_PX: u32 = 10;
const TITLE_FONT_PX: u32 = 12;
const TICK_LEN: i32 = 6;
const GRID: RGBColor = RGBColor(232, 232, 232);
const LINE_WIDTH: u32 = 2;
const TOOLTIP_FONT_PX: u32 = 12;
const TOOLTIP_LINE_H: f64 = 15.0;
const TOOLTIP_PAD: f64 = 5.0;
/// Swatch opacity of a hidden series in the legend.
const HIDDEN_SWATCH: f64 = 0.3;

type Pt = (f64, f64);

/// Plot-local to surface pixels.
#[derive(Clone, Copy)]
struct Origin(f64, f64);

impl Origin {
    fn px(self, p: Pt) -> (i32, i32) {
        ((p.0 + self.0).round() as i32, (p.1 + self.1).round() as i32)
    }
}

/// Font errors only cost the text; anything else fails the render.
fn soft<E>(r: std::result::Result<(), DrawingAreaErrorKind<E>>) -> Result<()>
where
    E: std::error::Error + Send + Sync,
{
    match r {
        Err(DrawingAreaErrorKind::BackendError(DrawingErrorKind::FontError(e))) => {
            log::trace!("text skipped: {e}");
            Ok(())
        }
        other => other.map_err(|e| anyhow!("{:?}", e)),
    }
}

fn hard<E>(r: std::result::Result<(), DrawingAreaErrorKind<E>>) -> Result<()>
where
    E: std::error::Error + Send + Sync,
{
    r.map_err(|e| anyhow!("{:?}", e))
}

fn label_style(px: u32, h: HPos, v: VPos) -> TextStyle<'static> {
    TextStyle::from((FontFamily::SansSerif, px)).pos(Pos::new(h, v))
}

/// Paint one chart. `root` must be sized to `layout.frame.outer_size()`.
pub fn draw_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    state: &ViewState,
    tooltip: Option<&Tooltip>,
) -> Result<()>
where
    DB: DrawingBackend,
{
    ensure_fonts_registered();
    hard(root.fill(&WHITE))?;

    let m = layout.frame.margin;
    let origin = Origin(m.left as f64, m.top as f64);

    draw_grid(root, layout, origin)?;
    draw_marks(root, layout, state, origin)?;
    draw_x_axis(root, layout, origin)?;
    for axis in &layout.y_axes {
        draw_y_axis(root, layout, axis, origin)?;
    }
    draw_legend(root, layout, state, origin)?;
    if let Some(t) = tooltip.filter(|t| t.visible) {
        draw_tooltip(root, t, layout.frame.outer_size())?;
    }

    hard(root.present())
}

fn draw_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    o: Origin,
) -> Result<()> {
    let Some(left) = layout.y_axes.first() else {
        return Ok(());
    };
    for t in &left.ticks {
        let a = o.px((layout.plot.x, t.pos));
        let b = o.px((layout.plot.right(), t.pos));
        hard(root.draw(&PathElement::new(vec![a, b], GRID.stroke_width(1))))?;
    }
    Ok(())
}

fn draw_marks<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    state: &ViewState,
    o: Origin,
) -> Result<()> {
    let zoom = state.zoom;
    let clip = layout.plot;
    for s in &layout.series {
        let opacity = state.visibility.opacity(s.series);
        if opacity <= 0.0 {
            continue;
        }
        let color = to_rgba(s.color, opacity);

        for run in &s.path {
            for pair in run.windows(2) {
                let (a, b) = (zoom.apply(pair[0]), zoom.apply(pair[1]));
                if let Some((a, b)) = clip_segment(a, b, &clip) {
                    hard(root.draw(&PathElement::new(
                        vec![o.px(a), o.px(b)],
                        color.stroke_width(LINE_WIDTH),
                    )))?;
                }
            }
        }

        for mark in &s.marks {
            draw_mark(root, &mark.shape, zoom, &clip, color, o)?;
        }
    }
    Ok(())
}

fn draw_mark<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    shape: &MarkShape,
    zoom: ZoomTransform,
    clip: &Rect,
    color: RGBAColor,
    o: Origin,
) -> Result<()> {
    match *shape {
        MarkShape::Bar(r) => {
            let Some(r) = zoom.apply_rect(r).intersect(clip) else {
                return Ok(());
            };
            hard(root.draw(&Rectangle::new(
                [o.px((r.x, r.y)), o.px((r.right(), r.bottom()))],
                color.filled(),
            )))
        }
        MarkShape::Dot { cx, cy, r } => {
            let c = zoom.apply((cx, cy));
            if !clip.contains(c) {
                return Ok(());
            }
            let radius = (r * zoom.k).round().max(1.0) as i32;
            hard(root.draw(&Circle::new(o.px(c), radius, color.filled())))
        }
    }
}

fn draw_x_axis<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    o: Origin,
) -> Result<()> {
    let plot = layout.plot;
    let y = plot.bottom();
    hard(root.draw(&PathElement::new(
        vec![o.px((plot.x, y)), o.px((plot.right(), y))],
        BLACK.stroke_width(1),
    )))?;

    let style = label_style(TICK_FONT_PX, HPos::Center, VPos::Top);
    for t in &layout.x_axis.ticks {
        let (x, y) = o.px((t.pos, y));
        hard(root.draw(&PathElement::new(
            vec![(x, y), (x, y + TICK_LEN)],
            BLACK.stroke_width(1),
        )))?;
        soft(root.draw(&Text::new(t.label.as_str(), (x, y + TICK_LEN + 2), style.clone())))?;
    }

    if !layout.x_axis.title.is_empty() {
        let below = layout.frame.margin.bottom as f64;
        let at = o.px((plot.x + plot.w / 2.0, y + below - 6.0));
        let style = label_style(TITLE_FONT_PX, HPos::Center, VPos::Bottom);
        soft(root.draw(&Text::new(layout.x_axis.title.as_str(), at, style)))?;
    }
    Ok(())
}

fn draw_y_axis<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    axis: &AxisLayout,
    o: Origin,
) -> Result<()> {
    let plot = layout.plot;
    let m = layout.frame.margin;
    let (x, dir, anchor, title_x) = match axis.side {
        AxisSide::Right => (plot.right(), 1, HPos::Left, plot.right() + m.right as f64 - 14.0),
        _ => (plot.x, -1, HPos::Right, plot.x - m.left as f64 + 14.0),
    };

    hard(root.draw(&PathElement::new(
        vec![o.px((x, plot.y)), o.px((x, plot.bottom()))],
        BLACK.stroke_width(1),
    )))?;

    let style = label_style(TICK_FONT_PX, anchor, VPos::Center);
    for t in &axis.ticks {
        let (px, py) = o.px((x, t.pos));
        let end = px + dir * TICK_LEN;
        hard(root.draw(&PathElement::new(vec![(px, py), (end, py)], BLACK.stroke_width(1))))?;
        soft(root.draw(&Text::new(t.label.as_str(), (end + dir * 2, py), style.clone())))?;
    }

    if !axis.title.is_empty() {
        let style = label_style(TITLE_FONT_PX, HPos::Center, VPos::Center)
            .transform(FontTransform::Rotate270);
        let at = o.px((title_x, plot.y + plot.h / 2.0));
        soft(root.draw(&Text::new(axis.title.as_str(), at, style)))?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    state: &ViewState,
    o: Origin,
) -> Result<()> {
    let style = label_style(LEGEND_FONT_PX, HPos::Right, VPos::Center);
    for entry in &layout.legend {
        let sw = entry.swatch;
        let opacity = if state.visibility.is_visible(entry.series) {
            1.0
        } else {
            HIDDEN_SWATCH
        };
        hard(root.draw(&Rectangle::new(
            [o.px((sw.x, sw.y)), o.px((sw.right(), sw.bottom()))],
            to_rgba(entry.color, opacity).filled(),
        )))?;
        let at = o.px((sw.x - 5.0, sw.y + sw.h / 2.0));
        soft(root.draw(&Text::new(entry.label.as_str(), at, style.clone())))?;
    }
    Ok(())
}

fn draw_tooltip<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    tooltip: &Tooltip,
    surface: (u32, u32),
) -> Result<()> {
    let (w, h) = estimate_block_size_px(&tooltip.lines, TOOLTIP_FONT_PX, TOOLTIP_LINE_H);
    let (w, h) = (w + 2.0 * TOOLTIP_PAD, h + 2.0 * TOOLTIP_PAD);
    // keep the box on the surface
    let x = tooltip.anchor.0.min(surface.0 as f64 - w).max(0.0);
    let y = tooltip.anchor.1.min(surface.1 as f64 - h).max(0.0);
    let o = Origin(0.0, 0.0);

    hard(root.draw(&Rectangle::new(
        [o.px((x, y)), o.px((x + w, y + h))],
        WHITE.mix(0.9).filled(),
    )))?;
    hard(root.draw(&Rectangle::new(
        [o.px((x, y)), o.px((x + w, y + h))],
        BLACK.stroke_width(1),
    )))?;

    let style = label_style(TOOLTIP_FONT_PX, HPos::Left, VPos::Top);
    for (i, line) in tooltip.lines.iter().enumerate() {
        let at = o.px((x + TOOLTIP_PAD, y + TOOLTIP_PAD + i as f64 * TOOLTIP_LINE_H));
        soft(root.draw(&Text::new(line.as_str(), at, style.clone())))?;
    }
    Ok(())
}

/// Liang-Barsky: the part of segment `a -> b` inside `r`, if any.
fn clip_segment(a: Pt, b: Pt, r: &Rect) -> Option<(Pt, Pt)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    let edges = [
        (-dx, a.0 - r.x),
        (dx, r.right() - a.0),
        (-dy, a.1 - r.y),
        (dy, r.bottom() - a.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Render a chart to an SVG document.
pub fn render_svg(layout: &ChartLayout, state: &ViewState, tooltip: Option<&Tooltip>) -> Result<String> {
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, layout.frame.outer_size()).into_drawing_area();
        draw_chart(&root, layout, state, tooltip)?;
    }
    Ok(out)
}

/// Render a chart to `path`: SVG for a `.svg` extension, PNG otherwise.
pub fn render_to_file<P: AsRef<Path>>(
    path: P,
    layout: &ChartLayout,
    state: &ViewState,
    tooltip: Option<&Tooltip>,
) -> Result<()> {
    let path = path.as_ref();
    let size = layout.frame.outer_size();
    let is_svg = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_chart(&root, layout, state, tooltip)?;
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw_chart(&root, layout, state, tooltip)?;
    }
    log::info!("wrote {}", path.display());
    Ok(())
}

/// An RGB pixel buffer the desktop viewer uploads as a texture.
#[derive(Debug, Clone)]
pub struct ChartSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ChartSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![255; width as usize * height as usize * 3],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Tightly packed RGB rows.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Repaint the whole buffer, resizing it to the chart first if needed.
    pub fn redraw(&mut self, layout: &ChartLayout, state: &ViewState, tooltip: Option<&Tooltip>) -> Result<()> {
        let size = layout.frame.outer_size();
        if size != (self.width, self.height) {
            *self = ChartSurface::new(size.0, size.1);
        }
        let root = BitMapBackend::with_buffer(&mut self.pixels, size).into_drawing_area();
        draw_chart(&root, layout, state, tooltip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_clipped_to_the_plot() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        let (a, b) = clip_segment((-50.0, 50.0), (50.0, 50.0), &r).unwrap();
        assert_eq!(a, (0.0, 50.0));
        assert_eq!(b, (50.0, 50.0));
        assert!(clip_segment((-10.0, -10.0), (-5.0, 200.0), &r).is_none());
        let inside = clip_segment((10.0, 10.0), (20.0, 30.0), &r).unwrap();
        assert_eq!(inside, ((10.0, 10.0), (20.0, 30.0)));
    }
}
