// src/drivers/mod.rs
// Ingestion building blocks: parse, supervise, buffer, forward
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod spectrum;
pub mod supervisor;
pub mod waterfall;
pub use error::{ParseError, SweepError};
pub use parser::{LineParser, ParsedLine, SweepSegment, DEFAULT_SENTINEL_WIDTH};
pub use pipeline::{IngestOutcome, IngestStats, IngestionLoop, SweepStore};
pub use sink::{ChannelSink, LogSink, SweepSink};
pub use source::{LineSource, ManualSource, StopFlag};
pub use spectrum::{SharedSpectrum, SpectrumSnapshot};
pub use supervisor::{ShellCommand, SweepLines, SweepProcess, DEFAULT_GRACE, DEFAULT_SWEEP_COMMAND};
pub use waterfall::{SharedWaterfall, WaterfallBuffer, DEFAULT_WATERFALL_DEPTH};
