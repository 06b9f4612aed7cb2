// src/gui.rs
use crate::config::DisplayConfig;
use crate::drivers::{SpectrumSnapshot, SweepStore};
use crate::types::*;
use crate::visualizer;
use eframe::egui;
use egui::{Color32, TextureHandle, TextureOptions, Vec2};
use egui_plot::{Line, Plot, PlotImage, PlotPoint, PlotPoints};
use log::error;
use once_cell::sync::OnceCell;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

// Messages handled per frame before the rest wait for the next one
const MAX_MESSAGES_PER_FRAME: usize = 256;
const REDRAW_TICK: Duration = Duration::from_millis(100);

pub struct SweepfallApp {
    store: SweepStore,
    rx: Receiver<SweepMessage>,
    events: Receiver<ShutdownReason>,
    exit: Arc<OnceCell<ShutdownReason>>,
    display: DisplayConfig,

    // copy of the shared spectrum, refreshed when the worker says it changed
    spectrum: SpectrumSnapshot,
    spectrum_dirty: bool,

    waterfall: Option<TextureHandle>,
    waterfall_dirty: bool,
    waterfall_rows: usize,
    waterfall_depth: usize,
    status: String,
}

impl SweepfallApp {
    pub fn new(
        store: SweepStore,
        rx: Receiver<SweepMessage>,
        events: Receiver<ShutdownReason>,
        exit: Arc<OnceCell<ShutdownReason>>,
        display: DisplayConfig,
    ) -> Self {
        Self {
            store,
            rx,
            events,
            exit,
            display,
            spectrum: SpectrumSnapshot::new(),
            spectrum_dirty: false,
            waterfall: None,
            waterfall_dirty: false,
            waterfall_rows: 0,
            waterfall_depth: 0,
            status: "Waiting for sweeps...".to_owned(),
        }
    }

    fn drain_messages(&mut self) {
        for msg in self.rx.try_iter().take(MAX_MESSAGES_PER_FRAME) {
            match msg {
                SweepMessage::SpectrumUpdated => self.spectrum_dirty = true,
                SweepMessage::WaterfallUpdated => self.waterfall_dirty = true,
            }
        }
    }

    fn refresh_spectrum(&mut self) {
        if !self.spectrum_dirty {
            return;
        }
        self.spectrum_dirty = false;
        match self.store.spectrum.latest() {
            Ok(latest) => self.spectrum = latest,
            Err(err) => error!("{err}"),
        }
    }

    fn handle_events(&mut self, ctx: &egui::Context) {
        while let Ok(reason) = self.events.try_recv() {
            self.status = match &reason {
                ShutdownReason::StreamEnded => "Sweep tool closed its output.".to_owned(),
                ShutdownReason::Sentinel => "Sweep tool reported no usable bins.".to_owned(),
                ShutdownReason::Interrupted => "Interrupted.".to_owned(),
                ShutdownReason::Failed(err) => format!("Ingestion failed: {err}"),
            };
            if reason.closes_window() {
                self.exit.set(reason).ok();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn refresh_waterfall(&mut self, ctx: &egui::Context) {
        if !self.waterfall_dirty {
            return;
        }
        self.waterfall_dirty = false;
        match self.store.waterfall.len() {
            Ok(rows) => self.waterfall_rows = rows,
            Err(err) => error!("{err}"),
        }
        let snapshot = match self.store.waterfall.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!("{err}");
                return;
            }
        };
        self.waterfall_depth = snapshot.nrows();
        let Some(image) = visualizer::waterfall_image(&snapshot, &self.display) else {
            return;
        };
        match &mut self.waterfall {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                let texture = ctx.load_texture("waterfall", image, TextureOptions::NEAREST);
                self.waterfall = Some(texture);
            }
        }
    }

    // Frequency extent of the waterfall columns; falls back to bin indices
    fn waterfall_extent(&self, columns: usize) -> (f64, f64) {
        match self.spectrum.freqs_ghz() {
            [first, second, ..] => (*first, (second - first) * columns as f64),
            _ => (0.0, columns as f64),
        }
    }

    fn draw_spectrum(&self, ui: &mut egui::Ui, height: f32) {
        let points: Vec<[f64; 2]> = self
            .spectrum
            .freqs_ghz()
            .iter()
            .zip(self.spectrum.power_db())
            .map(|(f, p)| [*f, *p])
            .collect();
        Plot::new("spectrum")
            .height(height)
            .include_y(self.display.power_min_db)
            .include_y(self.display.power_max_db)
            .auto_bounds_x()
            .show(ui, |plot_ui| {
                if !points.is_empty() {
                    let line = Line::new(PlotPoints::new(points))
                        .color(Color32::YELLOW)
                        .name("Power (dB)");
                    plot_ui.line(line);
                }
            });
    }

    fn draw_waterfall(&self, ui: &mut egui::Ui) {
        Plot::new("waterfall")
            .allow_drag(false)
            .show_y(false)
            .show(ui, |plot_ui| {
                if let Some(texture) = &self.waterfall {
                    let [columns, rows] = texture.size();
                    let (left, width) = self.waterfall_extent(columns);
                    let height = rows as f64;
                    // Newest row sits at y = 0, older rows below it
                    let center = PlotPoint::new(left + width / 2.0, -height / 2.0);
                    let size = Vec2::new(width as f32, height as f32);
                    plot_ui.image(PlotImage::new(texture, center, size));
                }
            });
    }
}

impl eframe::App for SweepfallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        self.handle_events(ctx);
        self.refresh_spectrum();
        self.refresh_waterfall(ctx);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Sweeps: {}", self.spectrum.updates()));
                ui.separator();
                if let Some((lo, hi)) = self.spectrum.span_ghz() {
                    ui.label(format!("{lo:.4} - {hi:.4} GHz"));
                    ui.separator();
                }
                ui.label(format!(
                    "Waterfall: {}/{} rows",
                    self.waterfall_rows, self.waterfall_depth
                ));
                ui.separator();
                ui.label(&self.status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let half = ui.available_height() / 2.0 - 24.0;
            ui.label("Spectrum Analyzer: Power (dB) vs Frequency (GHz)");
            self.draw_spectrum(ui, half.max(80.0));
            ui.label("Waterfall View");
            self.draw_waterfall(ui);
        });

        ctx.request_repaint_after(REDRAW_TICK);
    }
}
