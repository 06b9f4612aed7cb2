// src/engine.rs
use crate::config::AppConfig;
use crate::drivers::*;
use crate::types::ShutdownReason;
use log::{error, info, warn};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

type WorkerResult = Result<IngestOutcome, SweepError>;

/// Owns the sweep tool process and the ingestion worker.
///
/// `shutdown` runs the whole cancellation sequence: raise the ingestion stop
/// flag, raise the supervisor stop flag, terminate and reap the tool, join the
/// worker. It is idempotent and also runs on drop.
pub struct SweepEngine {
    process: Option<SweepProcess>,
    ingest_stop: StopFlag,
    worker: Option<JoinHandle<WorkerResult>>,
    store: SweepStore,
}

impl SweepEngine {
    /// Spawns the configured sweep tool and starts ingesting its output.
    pub fn start<K>(
        config: &AppConfig,
        sink: K,
        events: Sender<ShutdownReason>,
    ) -> Result<Self, SweepError>
    where
        K: SweepSink + Send + 'static,
    {
        let mut process = SweepProcess::start(&config.shell_command(), config.grace())?;
        let lines = process.lines().ok_or(SweepError::MissingStdout)?;
        let parser = LineParser::new(config.sentinel_width);
        info!("sentinel width: {:?}", parser.sentinel_width());
        Self::spawn(Some(process), lines, parser, config.waterfall_depth, sink, events)
    }

    /// Runs ingestion over any line source; `process` is terminated on shutdown if given.
    pub fn spawn<S, K>(
        process: Option<SweepProcess>,
        source: S,
        parser: LineParser,
        waterfall_depth: usize,
        sink: K,
        events: Sender<ShutdownReason>,
    ) -> Result<Self, SweepError>
    where
        S: LineSource + Send + 'static,
        K: SweepSink + Send + 'static,
    {
        let store = SweepStore::new(waterfall_depth);
        let ingest_stop = StopFlag::new();
        let ingest = IngestionLoop::new(source, parser, store.clone(), sink, ingest_stop.clone());
        let worker = thread::Builder::new()
            .name("sweep-ingest".into())
            .spawn(move || {
                let result = ingest.run();
                let reason = match &result {
                    Ok(IngestOutcome::Terminated) => Some(ShutdownReason::Sentinel),
                    Ok(IngestOutcome::EndOfStream) => Some(ShutdownReason::StreamEnded),
                    Ok(IngestOutcome::Stopped) => None,
                    Err(err) => Some(ShutdownReason::Failed(err.to_string())),
                };
                if let Some(reason) = reason {
                    events.send(reason).ok();
                }
                result
            })?;
        Ok(Self {
            process,
            ingest_stop,
            worker: Some(worker),
            store,
        })
    }

    pub fn store(&self) -> &SweepStore {
        &self.store
    }

    /// Returns how the worker ended, or `None` if it was already shut down.
    pub fn shutdown(&mut self) -> Result<Option<IngestOutcome>, SweepError> {
        self.ingest_stop.request_stop();
        let stopped = match self.process.take() {
            Some(mut process) => {
                process.stop_flag().request_stop();
                process.stop().map(|_| ())
            }
            None => Ok(()),
        };
        let joined = match self.worker.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SweepError::WorkerPanicked)?
                .map(Some),
            None => Ok(None),
        };
        stopped?;
        joined
    }
}

impl Drop for SweepEngine {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!("engine shutdown failed: {err}");
        }
    }
}

/// Watches for Ctrl-C on a dedicated thread.
///
/// The first interrupt reports `ShutdownReason::Interrupted` and calls
/// `on_interrupt`; a second one exits the process immediately.
pub fn watch_interrupt(
    events: Sender<ShutdownReason>,
    on_interrupt: impl Fn() + Send + 'static,
) -> Result<(), SweepError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("sweep-signal".into())
        .spawn(move || {
            runtime.block_on(async {
                let mut seen = 0;
                loop {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        error!("cannot listen for Ctrl-C: {err}");
                        return;
                    }
                    seen += 1;
                    if seen == 1 {
                        info!("interrupt received, shutting down (press Ctrl-C again to force)");
                        events.send(ShutdownReason::Interrupted).ok();
                        on_interrupt();
                    } else {
                        warn!("second interrupt, exiting immediately");
                        std::process::exit(130);
                    }
                }
            })
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{channel, sync_channel};
    use std::time::{Duration, Instant};
    use crate::types::SweepMessage;

    const GOOD: &str =
        "2024-01-01, 00:00:00, 2400000000, 2480000000, 1000000, 4, -60.0, -55.0, -58.0, -62.0";

    #[test]
    fn sentinel_reports_shutdown_and_keeps_state() {
        let (events_tx, events_rx) = channel();
        let (msg_tx, msg_rx) = sync_channel(16);
        let sentinel = "2024-01-01, 00:00:00, 1, 2, 3, 6, 0, 0, 0, 0, 0, 0";
        let source = ManualSource::new([GOOD, sentinel, GOOD]);
        let mut engine = SweepEngine::spawn(
            None,
            source,
            LineParser::default(),
            100,
            ChannelSink::new(msg_tx),
            events_tx,
        )
        .unwrap();
        let reason = events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reason, ShutdownReason::Sentinel);
        assert_eq!(engine.shutdown().unwrap(), Some(IngestOutcome::Terminated));
        assert_eq!(engine.shutdown().unwrap(), None);
        assert_eq!(engine.store().waterfall.len().unwrap(), 1);
        assert_eq!(msg_rx.recv().unwrap(), SweepMessage::SpectrumUpdated);
        assert_eq!(msg_rx.recv().unwrap(), SweepMessage::WaterfallUpdated);
        assert!(msg_rx.try_recv().is_err());
        let (_, power) = engine.store().spectrum.read().unwrap();
        assert_eq!(power, vec![-60.0, -55.0, -58.0, -62.0]);
    }

    #[test]
    fn end_of_stream_is_reported() {
        let (events_tx, events_rx) = channel();
        let mut engine = SweepEngine::spawn(
            None,
            ManualSource::new(["garbage", GOOD]),
            LineParser::default(),
            10,
            LogSink::default(),
            events_tx,
        )
        .unwrap();
        let reason = events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reason, ShutdownReason::StreamEnded);
        assert_eq!(engine.shutdown().unwrap(), Some(IngestOutcome::EndOfStream));
    }

    #[test]
    fn spawn_failure_prevents_startup() {
        let (events_tx, _events_rx) = channel();
        let mut config = AppConfig::default();
        config.shell = Some("/definitely/not/a/shell".into());
        let started = SweepEngine::start(&config, LogSink::default(), events_tx);
        assert!(matches!(started, Err(SweepError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn shutdown_stops_a_live_tool() {
        let (events_tx, events_rx) = channel();
        let (msg_tx, msg_rx) = sync_channel(16);
        let mut config = AppConfig::default();
        config.command = format!("echo '{GOOD}'; sleep 30");
        let mut engine = SweepEngine::start(&config, ChannelSink::new(msg_tx), events_tx).unwrap();
        let first = msg_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, SweepMessage::SpectrumUpdated);
        let outcome = engine.shutdown().unwrap();
        assert!(matches!(outcome, Some(IngestOutcome::Stopped | IngestOutcome::EndOfStream)));
        // Stopping never looks like the sentinel.
        assert!(!matches!(events_rx.try_recv(), Ok(ShutdownReason::Sentinel)));
    }

    #[cfg(unix)]
    #[test]
    fn shutdown_is_bounded_when_the_shell_leaves_children_behind() {
        let (events_tx, _events_rx) = channel();
        let (msg_tx, msg_rx) = sync_channel(16);
        let mut config = AppConfig::default();
        config.command = format!("sleep 30 & echo '{GOOD}'");
        config.shutdown_grace_ms = 200;
        let mut engine = SweepEngine::start(&config, ChannelSink::new(msg_tx), events_tx).unwrap();
        msg_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // the worker is now blocked on a pipe only `sleep` holds open
        std::thread::sleep(Duration::from_millis(100));
        let started = Instant::now();
        engine.shutdown().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
