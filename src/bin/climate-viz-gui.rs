/*!
 * Desktop viewer for climate-viz
 *
 * Shows the climate views as a slideshow:
 * - Back / Next navigation (no wraparound)
 * - Series selector buttons where a view has them
 * - Hover tooltips, drag/wheel zoom and legend toggles on the chart itself
 * - Open another CSV, save the current chart as PNG or SVG
 *
 * The dataset defaults to `$CLIMATE_VIZ_DATA`, then the first argument,
 * then `climate_change_dataset.csv` in the working directory.
 */

use eframe::egui;
use std::path::PathBuf;

use climate_viz::ingest::{CsvFile, open_source};
use climate_viz::viz::ChartSurface;
use climate_viz::{LoadStatus, PointerEvent, ViewController, ViewHost};
use std::sync::Arc;

const DEFAULT_DATA: &str = "climate_change_dataset.csv";

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let data = std::env::var("CLIMATE_VIZ_DATA")
        .ok()
        .or_else(|| std::env::args().nth(1))
        .unwrap_or_else(|| DEFAULT_DATA.to_string());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 680.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Climate Change Visualization"),
        ..Default::default()
    };

    eframe::run_native(
        "Climate Change Visualization",
        options,
        Box::new(move |_cc| Ok(Box::new(ClimateApp::new(&data)))),
    )
}

struct ClimateApp {
    host: ViewHost,
    surface: ChartSurface,
    texture: Option<egui::TextureHandle>,
    /// Chart must be repainted into `surface` before the next frame.
    dirty: bool,
    hovered: bool,
    status_message: String,
    error_message: String,
}

impl ClimateApp {
    fn new(data: &str) -> Self {
        let mut host = ViewHost::new(open_source(data), ViewController::climate());
        host.mount();
        Self {
            host,
            surface: ChartSurface::new(1, 1),
            texture: None,
            dirty: true,
            hovered: false,
            status_message: String::new(),
            error_message: String::new(),
        }
    }

    fn navigated(&mut self, moved: bool) {
        if moved {
            self.texture = None;
            self.dirty = true;
            self.hovered = false;
            self.error_message.clear();
        }
    }

    fn open_csv(&mut self) {
        let start = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_directory(start)
            .pick_file()
        {
            self.status_message = format!("Loading {}", path.display());
            self.host.set_source(Arc::new(CsvFile::new(path)));
            self.navigated(true);
        }
    }

    fn save_chart(&mut self) {
        let Some(view) = self.host.view() else {
            return;
        };
        let start = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = format!("{}.png", view.config().title.to_lowercase().replace(' ', "_"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("SVG", &["svg"])
            .set_directory(start)
            .set_file_name(name)
            .save_file()
        else {
            return;
        };
        match view.render_to_file(&path) {
            Ok(true) => {
                self.status_message = format!("Saved {}", path.display());
                self.error_message.clear();
            }
            Ok(false) => self.error_message = "Nothing to save yet".to_string(),
            Err(e) => self.error_message = format!("Save failed: {e}"),
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.dirty {
            return;
        }
        let Some(view) = self.host.view() else {
            return;
        };
        match view.redraw(&mut self.surface) {
            Ok(true) => {
                let (w, h) = self.surface.size();
                let image =
                    egui::ColorImage::from_rgb([w as usize, h as usize], self.surface.pixels());
                match self.texture.as_mut() {
                    Some(t) => t.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("chart", image, egui::TextureOptions::LINEAR))
                    }
                }
                self.dirty = false;
            }
            Ok(false) => {}
            Err(e) => {
                log::error!("redraw failed: {e:?}");
                self.error_message = format!("Render failed: {e}");
                self.dirty = false;
            }
        }
    }

    fn chart(&mut self, ui: &mut egui::Ui) {
        let Some(texture) = self.texture.as_ref() else {
            return;
        };
        let size = texture.size_vec2();
        let response = ui.add(
            egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                .fit_to_exact_size(size)
                .sense(egui::Sense::click_and_drag()),
        );
        let origin = response.rect.min;
        let to_chart = |p: egui::Pos2| ((p.x - origin.x) as f64, (p.y - origin.y) as f64);

        let mut events = Vec::new();
        if let Some(p) = response.hover_pos() {
            self.hovered = true;
            events.push(PointerEvent::Move {
                x: to_chart(p).0,
                y: to_chart(p).1,
            });
            let scroll = ui.input(|i| i.raw_scroll_delta);
            if scroll.y != 0.0 {
                let (x, y) = to_chart(p);
                // egui scrolls up with positive y, wheel deltas grow downwards
                events.push(PointerEvent::Wheel {
                    x,
                    y,
                    delta_y: -scroll.y as f64,
                });
            }
        } else if self.hovered {
            self.hovered = false;
            events.push(PointerEvent::Leave);
        }
        if response.dragged() {
            let d = response.drag_delta();
            if d != egui::Vec2::ZERO {
                events.push(PointerEvent::Drag {
                    dx: d.x as f64,
                    dy: d.y as f64,
                });
            }
        }
        if response.clicked()
            && let Some(p) = response.interact_pointer_pos()
        {
            let (x, y) = to_chart(p);
            events.push(PointerEvent::Click { x, y });
        }

        if let Some(view) = self.host.view_mut() {
            for event in events {
                self.dirty |= view.handle(event);
            }
        }
    }
}

impl eframe::App for ClimateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.host.poll() {
            self.dirty = true;
            self.status_message.clear();
        }
        if self.host.is_loading() {
            ctx.request_repaint();
        }
        self.refresh_texture(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open CSV…").clicked() {
                    self.open_csv();
                }
                if ui.button("Save chart…").clicked() {
                    self.save_chart();
                }
                ui.label(self.host.source().describe());
            });
            if let Some(view) = self.host.view() {
                ui.heading(&view.config().title);
                ui.label(&view.config().subtitle);
            }
        });

        egui::TopBottomPanel::bottom("navigation").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let controller = self.host.controller();
                let (back, next) = (controller.can_retreat(), controller.can_advance());
                ui.label(format!("{} / {}", controller.index() + 1, controller.len()));
                if back && ui.button("◀ Back").clicked() {
                    let moved = self.host.retreat();
                    self.navigated(moved);
                }
                if next && ui.button("Next ▶").clicked() {
                    let moved = self.host.advance();
                    self.navigated(moved);
                }
                if !self.status_message.is_empty() {
                    ui.label(&self.status_message);
                }
                if !self.error_message.is_empty() {
                    ui.colored_label(egui::Color32::RED, &self.error_message);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let selectors: Vec<(String, usize)> = self
                .host
                .view()
                .map(|v| {
                    v.config()
                        .selectors
                        .iter()
                        .map(|s| (s.label.clone(), s.series))
                        .collect()
                })
                .unwrap_or_default();
            if !selectors.is_empty() {
                ui.horizontal(|ui| {
                    for (label, series) in selectors {
                        let current = self.host.view().map(|v| v.state().selection) == Some(series);
                        if ui.selectable_label(current, label).clicked()
                            && let Some(view) = self.host.view_mut()
                        {
                            self.dirty |= view.select(series);
                        }
                    }
                });
                ui.add_space(6.0);
            }

            match self.host.view().map(|v| v.status().clone()) {
                Some(LoadStatus::Pending) => {
                    ui.spinner();
                }
                Some(LoadStatus::Failed(reason)) => {
                    ui.colored_label(egui::Color32::RED, format!("Could not load data: {reason}"));
                }
                Some(LoadStatus::Ready) => self.chart(ui),
                None => {}
            }
        });

        if self.dirty {
            ctx.request_repaint();
        }
    }
}
