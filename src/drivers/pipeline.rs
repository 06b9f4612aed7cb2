use log::{debug, info};
use crate::drivers::error::SweepError;
use crate::drivers::parser::{LineParser, ParsedLine, SweepSegment};
use crate::drivers::sink::SweepSink;
use crate::drivers::source::{LineSource, StopFlag};
use crate::drivers::{SharedSpectrum, SharedWaterfall};
/// The two derived views, written by the ingestion worker and read by the renderer.
#[derive(Clone, Debug)]
pub struct SweepStore {
    pub waterfall: SharedWaterfall,
    pub spectrum: SharedSpectrum,
}
impl SweepStore {
    pub fn new(waterfall_depth: usize) -> Self {
        Self {
            waterfall: SharedWaterfall::new(waterfall_depth),
            spectrum: SharedSpectrum::new(),
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The stop flag was raised between reads.
    Stopped,
    /// The source closed.
    EndOfStream,
    /// The parser saw the terminal sentinel.
    Terminated,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    pub segments: u64,
    pub malformed: u64,
}
/// Drives a line source through the parser into the store and the sink.
pub struct IngestionLoop<S: LineSource, K: SweepSink> {
    source: S,
    parser: LineParser,
    store: SweepStore,
    sink: K,
    stop: StopFlag,
    stats: IngestStats,
}
impl<S: LineSource, K: SweepSink> IngestionLoop<S, K> {
    pub fn new(source: S, parser: LineParser, store: SweepStore, sink: K, stop: StopFlag) -> Self {
        Self {
            source,
            parser,
            store,
            sink,
            stop,
            stats: IngestStats::default(),
        }
    }
    pub fn stats(&self) -> IngestStats {
        self.stats
    }
    pub fn run(mut self) -> Result<IngestOutcome, SweepError> {
        let outcome = self.pump();
        let stats = self.stats();
        match &outcome {
            Ok(end) => info!(
                "ingestion finished ({end:?}): {} lines, {} sweeps, {} malformed",
                stats.lines, stats.segments, stats.malformed
            ),
            Err(err) => info!(
                "ingestion aborted: {err} after {} lines, {} sweeps",
                stats.lines, stats.segments
            ),
        }
        outcome
    }
    fn pump(&mut self) -> Result<IngestOutcome, SweepError> {
        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }
    /// Handles at most one line; `Some` when the loop has to end.
    pub fn step(&mut self) -> Result<Option<IngestOutcome>, SweepError> {
        if self.stop.is_stopped() {
            return Ok(Some(IngestOutcome::Stopped));
        }
        let Some(line) = self.source.next_line()? else {
            return Ok(Some(IngestOutcome::EndOfStream));
        };
        self.stats.lines += 1;
        match self.parser.parse(&line) {
            Ok(ParsedLine::Segment(segment)) => {
                self.forward(segment)?;
                Ok(None)
            }
            Ok(ParsedLine::Terminate) => {
                info!("sweep tool reported no usable bins, stopping");
                Ok(Some(IngestOutcome::Terminated))
            }
            Err(err) => {
                self.stats.malformed += 1;
                debug!("skipping malformed line ({err}): {line:?}");
                Ok(None)
            }
        }
    }
    fn forward(&mut self, segment: SweepSegment) -> Result<(), SweepError> {
        debug!(
            "{}: {:.4}-{:.4} GHz, {} bins",
            segment.timestamp,
            segment.start_freq_ghz,
            segment.stop_freq_ghz,
            segment.power_db.len()
        );
        self.store.spectrum.update(&segment)?;
        self.store.waterfall.push(segment.power_db.clone())?;
        let (freqs_ghz, power_db) = self.store.spectrum.read()?;
        self.sink.on_spectrum_update(&freqs_ghz, &power_db);
        self.sink.on_waterfall_update(&segment.power_db);
        self.stats.segments += 1;
        Ok(())
    }
}
