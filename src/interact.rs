//! Interaction layer: tooltip, zoom/pan and legend toggles.
//!
//! Handlers are plain functions over explicit state. They receive the current
//! [`ChartLayout`] on every call instead of capturing scales, so a handler can
//! never act on geometry from an earlier render.

use crate::view::{ViewConfig, ViewState};
use crate::viz::layout::{ChartLayout, Rect};
use serde::{Deserialize, Serialize};

/// Tooltip offset from the pointer, in pixels.
pub const TOOLTIP_OFFSET: (f64, f64) = (5.0, -28.0);

/// Zoom behaviour of a view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// Allowed scale factors, `[min, max]`.
    pub scale_extent: (f64, f64),
    /// Wheel delta -> exponent of two.
    #[serde(default = "default_wheel_step")]
    pub wheel_step: f64,
}

fn default_wheel_step() -> f64 {
    0.002
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            scale_extent: (1.0, 5.0),
            wheel_step: default_wheel_step(),
        }
    }
}

/// Affine transform `p -> k * p + (x, y)` applied to the mark group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn apply(&self, p: (f64, f64)) -> (f64, f64) {
        (p.0 * self.k + self.x, p.1 * self.k + self.y)
    }

    pub fn invert(&self, p: (f64, f64)) -> (f64, f64) {
        ((p.0 - self.x) / self.k, (p.1 - self.y) / self.k)
    }

    pub fn apply_rect(&self, r: Rect) -> Rect {
        let (x, y) = self.apply((r.x, r.y));
        Rect::new(x, y, r.w * self.k, r.h * self.k)
    }

    /// Set the scale factor, clamped into the configured extent, keeping the
    /// point under `center` in place.
    pub fn scaled_to(&self, k: f64, center: (f64, f64), config: &ZoomConfig, viewport: Rect) -> Self {
        let (lo, hi) = config.scale_extent;
        let k = if k.is_finite() { k.clamp(lo, hi) } else { self.k };
        if k == self.k {
            return self.constrained(viewport, viewport);
        }
        let p = self.invert(center);
        let moved = ZoomTransform {
            k,
            x: center.0 - p.0 * k,
            y: center.1 - p.1 * k,
        };
        moved.constrained(viewport, viewport)
    }

    /// Multiply the scale factor by `factor` about `center`.
    pub fn scaled_by(&self, factor: f64, center: (f64, f64), config: &ZoomConfig, viewport: Rect) -> Self {
        self.scaled_to(self.k * factor, center, config, viewport)
    }

    /// One wheel notch: `deltaY` pixels, positive meaning zoom out.
    pub fn wheeled(&self, delta_y: f64, center: (f64, f64), config: &ZoomConfig, viewport: Rect) -> Self {
        let factor = 2f64.powf(-delta_y * config.wheel_step);
        self.scaled_by(factor, center, config, viewport)
    }

    /// Pan by a screen-space delta.
    pub fn translated(&self, dx: f64, dy: f64, viewport: Rect) -> Self {
        let dx = if dx.is_finite() { dx } else { 0.0 };
        let dy = if dy.is_finite() { dy } else { 0.0 };
        ZoomTransform {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
        .constrained(viewport, viewport)
    }

    /// Shift the transform so `extent` stays covered by `translate_extent`.
    /// When the content is smaller than the viewport it is centred.
    pub fn constrained(&self, viewport: Rect, translate_extent: Rect) -> Self {
        let (vx0, vy0) = self.invert((viewport.x, viewport.y));
        let (vx1, vy1) = self.invert((viewport.right(), viewport.bottom()));
        let dx0 = vx0 - translate_extent.x;
        let dx1 = vx1 - translate_extent.right();
        let dy0 = vy0 - translate_extent.y;
        let dy1 = vy1 - translate_extent.bottom();

        let shift = |d0: f64, d1: f64| {
            if d1 > d0 {
                (d0 + d1) / 2.0
            } else if d0 < 0.0 {
                d0
            } else {
                d1.max(0.0)
            }
        };
        let tx = shift(dx0, dx1);
        let ty = shift(dy0, dy1);
        ZoomTransform {
            k: self.k,
            x: self.x + self.k * tx,
            y: self.y + self.k * ty,
        }
    }
}

/// Per-series visibility flags, all visible at first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    flags: Vec<bool>,
}

impl Visibility {
    pub fn new(series: usize) -> Self {
        Self {
            flags: vec![true; series],
        }
    }

    /// Unknown series count as visible.
    pub fn is_visible(&self, series: usize) -> bool {
        self.flags.get(series).copied().unwrap_or(true)
    }

    pub fn opacity(&self, series: usize) -> f64 {
        if self.is_visible(series) { 1.0 } else { 0.0 }
    }

    /// Flip one series; returns its new flag, `None` for an unknown series.
    pub fn toggle(&mut self, series: usize) -> Option<bool> {
        let flag = self.flags.get_mut(series)?;
        *flag = !*flag;
        Some(*flag)
    }
}

/// Floating label shown while the pointer is over a mark. Purely presentational.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    pub visible: bool,
    /// Top-left corner in surface pixels.
    pub anchor: (f64, f64),
    pub lines: Vec<String>,
}

impl Tooltip {
    pub fn show(&mut self, pointer: (f64, f64), lines: Vec<String>) {
        self.visible = true;
        self.anchor = (pointer.0 + TOOLTIP_OFFSET.0, pointer.1 + TOOLTIP_OFFSET.1);
        self.lines = lines;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.lines.clear();
    }
}

/// Pointer input in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { x: f64, y: f64 },
    Leave,
    Drag { dx: f64, dy: f64 },
    Wheel { x: f64, y: f64, delta_y: f64 },
    Click { x: f64, y: f64 },
}

/// Apply one pointer event. Returns `true` when the chart must be redrawn.
pub fn handle_event(
    config: &ViewConfig,
    layout: &ChartLayout,
    state: &mut ViewState,
    tooltip: &mut Tooltip,
    event: PointerEvent,
) -> bool {
    let frame = layout.frame;
    let viewport = layout.plot;
    match event {
        PointerEvent::Move { x, y } => {
            if !config.interaction.tooltip {
                return false;
            }
            let before = tooltip.clone();
            let local = frame.to_plot((x, y));
            let hit = if viewport.contains(local) {
                layout.hit_mark(state.zoom.invert(local), &state.visibility)
            } else {
                None
            };
            match hit {
                Some(mark) => tooltip.show((x, y), mark.tooltip.clone()),
                None => tooltip.hide(),
            }
            *tooltip != before
        }
        PointerEvent::Leave => {
            let was_visible = tooltip.visible;
            tooltip.hide();
            was_visible
        }
        PointerEvent::Drag { dx, dy } => {
            if config.interaction.zoom.is_none() {
                return false;
            }
            let next = state.zoom.translated(dx, dy, viewport);
            let changed = next != state.zoom;
            state.zoom = next;
            changed
        }
        PointerEvent::Wheel { x, y, delta_y } => {
            let Some(zoom) = config.interaction.zoom.as_ref() else {
                return false;
            };
            let next = state.zoom.wheeled(delta_y, frame.to_plot((x, y)), zoom, viewport);
            let changed = next != state.zoom;
            state.zoom = next;
            changed
        }
        PointerEvent::Click { x, y } => {
            if !config.interaction.legend {
                return false;
            }
            match layout.hit_legend(frame.to_plot((x, y))) {
                Some(series) => {
                    state.visibility.toggle(series);
                    // a hidden series must not keep its tooltip
                    tooltip.hide();
                    true
                }
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 420.0)
    }

    #[test]
    fn pan_cannot_expose_outside_extent() {
        let t = ZoomTransform::IDENTITY.translated(50.0, -20.0, viewport());
        assert_eq!(t, ZoomTransform::IDENTITY);
    }

    #[test]
    fn zoom_keeps_pointer_fixed_when_room_allows() {
        let cfg = ZoomConfig::default();
        let c = (400.0, 210.0);
        let t = ZoomTransform::IDENTITY.scaled_to(2.0, c, &cfg, viewport());
        assert_eq!(t.k, 2.0);
        assert_eq!(t.apply(c), c);
    }

    #[test]
    fn constraint_is_idempotent() {
        let t = ZoomTransform { k: 3.0, x: 100.0, y: -5000.0 };
        let once = t.constrained(viewport(), viewport());
        let twice = once.constrained(viewport(), viewport());
        assert!((once.x - twice.x).abs() < 1e-9 && (once.y - twice.y).abs() < 1e-9);
        assert!(once.x.abs() < 1e-9);
        assert!((once.y - (420.0 - 3.0 * 420.0)).abs() < 1e-9);
    }
}
