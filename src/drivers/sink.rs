use std::sync::mpsc::{SyncSender, TrySendError};
use log::{debug, info};
use crate::types::SweepMessage;
/// Renderer side of the pipeline; called once per valid segment, on the worker thread.
pub trait SweepSink {
    fn on_spectrum_update(&mut self, freqs_ghz: &[f64], power_db: &[f64]);
    fn on_waterfall_update(&mut self, power_db_row: &[f64]);
}
/// Notifies the renderer over a bounded channel without ever blocking the worker.
///
/// When the receiver falls behind, notifications are dropped and counted. The
/// renderer reads the shared store on whatever gets through, so a dropped
/// notification never hides the latest data.
pub struct ChannelSink {
    tx: SyncSender<SweepMessage>,
    wake: Option<Box<dyn Fn() + Send>>,
    dropped: u64,
    disconnected: bool,
}
impl ChannelSink {
    pub fn new(tx: SyncSender<SweepMessage>) -> Self {
        Self {
            tx,
            wake: None,
            dropped: 0,
            disconnected: false,
        }
    }
    /// Called after every delivered message, e.g. to request a repaint.
    pub fn with_wake(mut self, wake: impl Fn() + Send + 'static) -> Self {
        self.wake = Some(Box::new(wake));
        self
    }
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
    fn send(&mut self, msg: SweepMessage) {
        if self.disconnected {
            return;
        }
        match self.tx.try_send(msg) {
            Ok(()) => {
                if let Some(wake) = &self.wake {
                    wake();
                }
            }
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!("renderer busy, dropped update ({} so far)", self.dropped);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.disconnected = true;
                debug!("renderer gone, no further updates forwarded");
            }
        }
    }
}
impl SweepSink for ChannelSink {
    fn on_spectrum_update(&mut self, _freqs_ghz: &[f64], _power_db: &[f64]) {
        self.send(SweepMessage::SpectrumUpdated);
    }
    fn on_waterfall_update(&mut self, _power_db_row: &[f64]) {
        self.send(SweepMessage::WaterfallUpdated);
    }
}
impl Drop for ChannelSink {
    fn drop(&mut self) {
        if self.dropped() > 0 {
            info!("{} renderer updates dropped while it was busy", self.dropped());
        }
    }
}
/// Headless renderer: summarizes each sweep in the log.
#[derive(Default)]
pub struct LogSink {
    sweeps: u64,
}
impl SweepSink for LogSink {
    fn on_spectrum_update(&mut self, freqs_ghz: &[f64], power_db: &[f64]) {
        self.sweeps += 1;
        let peak = freqs_ghz
            .iter()
            .zip(power_db)
            .max_by(|a, b| a.1.total_cmp(b.1));
        match (freqs_ghz.first(), freqs_ghz.last(), peak) {
            (Some(lo), Some(hi), Some((f, p))) => info!(
                "sweep #{}: {:.4}-{:.4} GHz, {} bins, peak {:.2} dB @ {:.4} GHz",
                self.sweeps,
                lo,
                hi,
                power_db.len(),
                p,
                f
            ),
            _ => info!("sweep #{}: empty spectrum", self.sweeps),
        }
    }
    fn on_waterfall_update(&mut self, power_db_row: &[f64]) {
        debug!("waterfall row with {} cells", power_db_row.len());
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::sync_channel;
    use std::sync::Arc;
    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (tx, rx) = sync_channel(2);
        let woken = Arc::new(AtomicUsize::new(0));
        let counter = woken.clone();
        let mut sink = ChannelSink::new(tx).with_wake(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sink.on_spectrum_update(&[1.0], &[-1.0]);
        sink.on_waterfall_update(&[-1.0]);
        sink.on_waterfall_update(&[-2.0]);
        assert_eq!(sink.dropped(), 1);
        assert_eq!(woken.load(Ordering::SeqCst), 2);
        assert_eq!(rx.recv().unwrap(), SweepMessage::SpectrumUpdated);
        assert_eq!(rx.recv().unwrap(), SweepMessage::WaterfallUpdated);
        assert!(rx.try_recv().is_err());
    }
    #[test]
    fn disconnected_receiver_is_tolerated() {
        let (tx, rx) = sync_channel(1);
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.on_spectrum_update(&[1.0], &[-1.0]);
        sink.on_spectrum_update(&[1.0], &[-1.0]);
        assert_eq!(sink.dropped(), 0);
    }
}
