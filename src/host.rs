//! View lifecycle: mount, asynchronous load, re-render, unmount.
//!
//! One view is mounted at a time. Mounting spawns a loader thread tagged with
//! a generation number; completions that arrive for an older generation are
//! dropped, so a view that was navigated away from never receives data.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::controller::ViewController;
use crate::error::LoadError;
use crate::ingest::DataSource;
use crate::interact::{PointerEvent, Tooltip, handle_event};
use crate::models::RawRow;
use crate::pipeline::{self, ChartModel};
use crate::view::{ViewConfig, ViewState};
use crate::viz::layout::{ChartLayout, layout_chart};
use crate::viz::{self, ChartSurface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Ready,
    Failed(String),
}

struct Completion {
    generation: u64,
    result: Result<Vec<RawRow>, LoadError>,
}

/// The mounted view: its config, loaded rows and all view-local state.
#[derive(Debug)]
pub struct MountedView {
    config: ViewConfig,
    generation: u64,
    status: LoadStatus,
    rows: Vec<RawRow>,
    state: ViewState,
    model: Option<ChartModel>,
    layout: Option<ChartLayout>,
    tooltip: Tooltip,
}

impl MountedView {
    fn pending(config: ViewConfig, generation: u64) -> Self {
        let state = ViewState::new(&config);
        Self {
            config,
            generation,
            status: LoadStatus::Pending,
            rows: Vec::new(),
            state,
            model: None,
            layout: None,
            tooltip: Tooltip::default(),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn model(&self) -> Option<&ChartModel> {
        self.model.as_ref()
    }

    /// `None` until data has loaded; a failed view never gets one.
    pub fn layout(&self) -> Option<&ChartLayout> {
        self.layout.as_ref()
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    fn loaded(&mut self, rows: Vec<RawRow>) {
        self.rows = rows;
        self.status = LoadStatus::Ready;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let model = pipeline::run(&self.config, &self.rows, self.state.selection);
        self.state.data = model.points.clone();
        self.layout = Some(layout_chart(&self.config, &model));
        self.model = Some(model);
        self.tooltip.hide();
    }

    /// Switch the plotted series. Re-runs the pipeline when it changes.
    pub fn select(&mut self, series: usize) -> bool {
        if series >= self.config.series.len() || series == self.state.selection {
            return false;
        }
        self.state.selection = series;
        if self.status == LoadStatus::Ready {
            self.rebuild();
        }
        true
    }

    /// Switch series by selector label (`"Minimum Temp"`) or series label (`"Min Temp"`).
    pub fn select_metric(&mut self, label: &str) -> bool {
        let found = self
            .config
            .selectors
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(label))
            .map(|s| s.series)
            .or_else(|| {
                self.config
                    .series
                    .iter()
                    .position(|s| s.label.eq_ignore_ascii_case(label))
            });
        match found {
            Some(series) => self.select(series),
            None => false,
        }
    }

    /// Forward a pointer event. Returns whether the chart must be redrawn.
    pub fn handle(&mut self, event: PointerEvent) -> bool {
        let Some(layout) = self.layout.as_ref() else {
            return false;
        };
        handle_event(&self.config, layout, &mut self.state, &mut self.tooltip, event)
    }

    /// Set the zoom factor about the plot centre. Views without zoom ignore it.
    pub fn zoom_to(&mut self, k: f64) -> bool {
        let (Some(zoom), Some(layout)) = (self.config.interaction.zoom.as_ref(), self.layout.as_ref())
        else {
            return false;
        };
        let plot = layout.plot;
        let center = (plot.x + plot.w / 2.0, plot.y + plot.h / 2.0);
        let next = self.state.zoom.scaled_to(k, center, zoom, plot);
        let changed = next != self.state.zoom;
        self.state.zoom = next;
        changed
    }

    /// Click the legend entry whose label matches `label`.
    pub fn toggle_legend(&mut self, label: &str) -> bool {
        let Some(layout) = self.layout.as_ref() else {
            return false;
        };
        let Some(hit) = layout
            .legend
            .iter()
            .find(|e| e.label.eq_ignore_ascii_case(label))
            .map(|e| e.hit)
        else {
            return false;
        };
        let m = layout.frame.margin;
        self.handle(PointerEvent::Click {
            x: hit.x + hit.w / 2.0 + m.left as f64,
            y: hit.y + hit.h / 2.0 + m.top as f64,
        })
    }

    fn visible_tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.visible.then_some(&self.tooltip)
    }

    /// SVG of the current chart, `None` while there is nothing to draw.
    pub fn render_svg(&self) -> Result<Option<String>> {
        match &self.layout {
            Some(layout) => viz::render_svg(layout, &self.state, self.visible_tooltip()).map(Some),
            None => Ok(None),
        }
    }

    /// Write the chart to `path`. Returns `false` when there is nothing to draw.
    pub fn render_to_file(&self, path: &Path) -> Result<bool> {
        match &self.layout {
            Some(layout) => {
                viz::render_to_file(path, layout, &self.state, self.visible_tooltip())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Repaint `surface`. Returns `false` when there is nothing to draw.
    pub fn redraw(&self, surface: &mut ChartSurface) -> Result<bool> {
        match &self.layout {
            Some(layout) => {
                surface.redraw(layout, &self.state, self.visible_tooltip())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Owns the navigation, the data source and the mounted view.
pub struct ViewHost {
    source: Arc<dyn DataSource>,
    controller: ViewController,
    generation: u64,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    mounted: Option<MountedView>,
}

impl ViewHost {
    pub fn new(source: Arc<dyn DataSource>, controller: ViewController) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            controller,
            generation: 0,
            tx,
            rx,
            mounted: None,
        }
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    pub fn view(&self) -> Option<&MountedView> {
        self.mounted.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut MountedView> {
        self.mounted.as_mut()
    }

    pub fn is_loading(&self) -> bool {
        self.mounted
            .as_ref()
            .is_some_and(|v| v.status == LoadStatus::Pending)
    }

    /// Mount the controller's current view and start loading its data.
    pub fn mount(&mut self) {
        self.unmount();
        let Some(config) = self.controller.current().cloned() else {
            return;
        };
        self.generation += 1;
        let generation = self.generation;
        log::info!(
            "mounting '{}' (generation {generation}) from {}",
            config.title,
            self.source.describe()
        );

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.fetch();
            // the host may already be gone
            let _ = tx.send(Completion { generation, result });
        });

        self.mounted = Some(MountedView::pending(config, generation));
    }

    /// Tear down the mounted view and all of its state.
    pub fn unmount(&mut self) {
        if let Some(view) = self.mounted.take() {
            log::debug!("unmounting '{}'", view.config.title);
        }
    }

    pub fn advance(&mut self) -> bool {
        if !self.controller.advance() {
            return false;
        }
        self.mount();
        true
    }

    pub fn retreat(&mut self) -> bool {
        if !self.controller.retreat() {
            return false;
        }
        self.mount();
        true
    }

    pub fn jump(&mut self, index: usize) -> bool {
        if !self.controller.jump(index) {
            return false;
        }
        self.mount();
        true
    }

    /// Swap the data source and remount the current view.
    pub fn set_source(&mut self, source: Arc<dyn DataSource>) {
        self.source = source;
        self.mount();
    }

    /// Apply finished loads without blocking. Returns `true` if the mounted
    /// view changed status.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(done) = self.rx.try_recv() {
            changed |= self.apply(done);
        }
        changed
    }

    /// Block until the mounted view leaves `Pending` or `timeout` passes.
    /// Returns `true` if it resolved in time.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(done) => {
                    self.apply(done);
                }
                Err(_) => return false,
            }
        }
        self.mounted.is_some()
    }

    fn apply(&mut self, done: Completion) -> bool {
        let Some(view) = self
            .mounted
            .as_mut()
            .filter(|v| v.generation == done.generation)
        else {
            log::debug!("discarding stale load (generation {})", done.generation);
            return false;
        };
        match done.result {
            Ok(rows) => {
                log::info!("'{}': loaded {} rows", view.config.title, rows.len());
                view.loaded(rows);
            }
            Err(e) => {
                log::error!("'{}': load failed: {e}", view.config.title);
                view.status = LoadStatus::Failed(e.to_string());
            }
        }
        true
    }
}
