// src/main.rs
mod cli;
mod config;
mod drivers;
mod engine;
mod gui;
mod types;
mod visualizer;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use eframe::egui;
use log::{error, info};
use once_cell::sync::OnceCell;
use std::process::ExitCode;
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender};
use std::sync::Arc;
use crate::cli::Cli;
use crate::config::AppConfig;
use crate::drivers::{ChannelSink, LogSink};
use crate::engine::{watch_interrupt, SweepEngine};
use crate::types::ShutdownReason;
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
// Tears the engine down and folds any late failure into the exit reason
fn finish(mut engine: SweepEngine, reason: ShutdownReason) -> ShutdownReason {
    match engine.shutdown() {
        Ok(outcome) => {
            info!("worker stopped: {outcome:?}");
            reason
        }
        Err(err) => {
            error!("shutdown failed: {err}");
            ShutdownReason::Failed(err.to_string())
        }
    }
}
fn run_headless(
    config: &AppConfig,
    events_tx: Sender<ShutdownReason>,
    events_rx: Receiver<ShutdownReason>,
) -> Result<ShutdownReason> {
    let engine = SweepEngine::start(config, LogSink::default(), events_tx.clone())
        .with_context(|| format!("cannot start `{}`", config.command))?;
    watch_interrupt(events_tx, || {})?;
    let reason = events_rx.recv().unwrap_or(ShutdownReason::StreamEnded);
    Ok(finish(engine, reason))
}
fn run_gui(
    config: &AppConfig,
    events_tx: Sender<ShutdownReason>,
    events_rx: Receiver<ShutdownReason>,
) -> Result<ShutdownReason> {
    // Filled in once the window exists; lets background threads request a repaint
    let repaint: Arc<OnceCell<egui::Context>> = Arc::default();
    let wake = {
        let repaint = repaint.clone();
        move || {
            if let Some(ctx) = repaint.get() {
                ctx.request_repaint();
            }
        }
    };
    let (msg_tx, msg_rx) = sync_channel(config.notify_capacity);
    let sink = ChannelSink::new(msg_tx).with_wake(wake.clone());
    let engine = SweepEngine::start(config, sink, events_tx.clone())
        .with_context(|| format!("cannot start `{}`", config.command))?;
    watch_interrupt(events_tx, wake)?;
    let exit: Arc<OnceCell<ShutdownReason>> = Arc::default();
    let app = gui::SweepfallApp::new(
        engine.store().clone(),
        msg_rx,
        events_rx,
        exit.clone(),
        config.display,
    );
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("sweepfall"),
        ..Default::default()
    };
    let shown = eframe::run_native(
        "sweepfall",
        options,
        Box::new(move |cc| {
            repaint.set(cc.egui_ctx.clone()).ok();
            Box::new(app)
        }),
    );
    // Closing the window is a user stop
    let reason = exit.get().cloned().unwrap_or(ShutdownReason::Interrupted);
    let reason = finish(engine, reason);
    shown.map_err(|err| anyhow!("window failed: {err}"))?;
    Ok(reason)
}
fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    init_logging(&args.log_level);
    let config = args.resolve()?;
    info!("sweep command: `{}`", config.command);
    let (events_tx, events_rx) = channel();
    let reason = if args.headless {
        run_headless(&config, events_tx, events_rx)?
    } else {
        run_gui(&config, events_tx, events_rx)?
    };
    info!("exiting: {reason:?}");
    Ok(ExitCode::from(reason.exit_code()))
}
